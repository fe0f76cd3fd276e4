//! Grouping with count and sum accumulators.

use std::collections::HashMap;

use document_store::{Document, ID_FIELD};
use serde_json::{Number, Value};

/// A per-group reduction.
#[derive(Debug, Clone, PartialEq)]
pub enum Accumulator {
    /// Number of documents in the group.
    Count { output: String },
    /// Sum of a numeric field; missing and non-numeric values count as 0.
    Sum { output: String, field: String },
}

impl Accumulator {
    fn output(&self) -> &str {
        match self {
            Accumulator::Count { output } | Accumulator::Sum { output, .. } => output,
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct Tally {
    int: i64,
    float: f64,
    is_float: bool,
}

impl Tally {
    fn add(&mut self, value: Option<&Value>) {
        let Some(Value::Number(n)) = value else {
            return;
        };
        if let Some(i) = n.as_i64()
            && !self.is_float
        {
            self.int = self.int.saturating_add(i);
            return;
        }
        if !self.is_float {
            self.is_float = true;
            self.float = self.int as f64;
        }
        self.float += n.as_f64().unwrap_or(0.0);
    }

    fn into_value(self) -> Value {
        if self.is_float {
            Number::from_f64(self.float).map_or(Value::from(0), Value::Number)
        } else {
            Value::from(self.int)
        }
    }
}

/// Groups documents by a key path and reduces each group.
///
/// Without a key the whole input forms one group, and an empty input
/// still yields one document with every accumulator at zero.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Group {
    pub key: Option<String>,
    pub accumulators: Vec<Accumulator>,
}

impl Group {
    /// Reduces the whole input to a single document.
    pub fn global() -> Self {
        Self::default()
    }

    /// Groups by the value at `key`; the key lands in the output's `_id`.
    pub fn by(key: impl Into<String>) -> Self {
        Self {
            key: Some(key.into()),
            accumulators: Vec::new(),
        }
    }

    pub fn count(mut self, output: impl Into<String>) -> Self {
        self.accumulators.push(Accumulator::Count {
            output: output.into(),
        });
        self
    }

    pub fn sum(mut self, output: impl Into<String>, field: impl Into<String>) -> Self {
        self.accumulators.push(Accumulator::Sum {
            output: output.into(),
            field: field.into(),
        });
        self
    }

    /// Runs the grouping. Keyed groups come out in first-seen order.
    pub fn apply(&self, docs: &[Document]) -> Vec<Document> {
        let Some(key) = &self.key else {
            let mut tallies = vec![Tally::default(); self.accumulators.len()];
            for doc in docs {
                self.accumulate(&mut tallies, doc);
            }
            return vec![self.emit(Value::Null, tallies)];
        };

        let mut order: Vec<Value> = Vec::new();
        let mut groups: HashMap<String, Vec<Tally>> = HashMap::new();
        for doc in docs {
            let value = doc.get(key).cloned().unwrap_or(Value::Null);
            let tallies = groups.entry(value.to_string()).or_insert_with(|| {
                order.push(value.clone());
                vec![Tally::default(); self.accumulators.len()]
            });
            self.accumulate(tallies, doc);
        }

        order
            .into_iter()
            .filter_map(|value| {
                let tallies = groups.remove(&value.to_string())?;
                Some(self.emit(value, tallies))
            })
            .collect()
    }

    fn accumulate(&self, tallies: &mut [Tally], doc: &Document) {
        for (acc, tally) in self.accumulators.iter().zip(tallies.iter_mut()) {
            match acc {
                Accumulator::Count { .. } => tally.int += 1,
                Accumulator::Sum { field, .. } => tally.add(doc.get(field)),
            }
        }
    }

    fn emit(&self, key: Value, tallies: Vec<Tally>) -> Document {
        let mut out = Document::new();
        out.set(ID_FIELD, key);
        for (acc, tally) in self.accumulators.iter().zip(tallies) {
            out.set(acc.output(), tally.into_value());
        }
        out
    }
}
