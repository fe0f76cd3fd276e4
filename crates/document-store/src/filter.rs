use serde_json::Value;

use crate::{Document, DocumentId, ID_FIELD};

/// A single predicate over a document field.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// The field equals the value, or is an array containing it.
    /// A `null` value matches missing and null fields.
    Eq { path: String, value: Value },

    /// The field matches any of the values (same semantics as `Eq`).
    AnyOf { path: String, values: Vec<Value> },

    /// Case-insensitive substring match over any of the listed string fields.
    TextSearch { paths: Vec<String>, needle: String },

    /// The field is present and not null.
    Exists { path: String },
}

impl Condition {
    /// Evaluates the condition against a document.
    pub fn matches(&self, doc: &Document) -> bool {
        match self {
            Condition::Eq { path, value } => value_matches(doc.get(path), value),
            Condition::AnyOf { path, values } => {
                let field = doc.get(path);
                values.iter().any(|v| value_matches(field, v))
            }
            Condition::TextSearch { paths, needle } => {
                let needle = needle.to_lowercase();
                paths.iter().any(|p| {
                    doc.get_str(p)
                        .is_some_and(|s| s.to_lowercase().contains(&needle))
                })
            }
            Condition::Exists { path } => doc.contains(path),
        }
    }
}

fn value_matches(field: Option<&Value>, expected: &Value) -> bool {
    match (field, expected) {
        (None, Value::Null) | (Some(Value::Null), Value::Null) => true,
        (None, _) => false,
        (Some(Value::Array(items)), expected) if !expected.is_array() => {
            items.iter().any(|item| item == expected)
        }
        (Some(actual), expected) => actual == expected,
    }
}

/// Builder for document filters.
///
/// A filter is a conjunction of conditions; the empty filter matches
/// every document in a collection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    /// Conditions that must all hold.
    pub conditions: Vec<Condition>,
}

impl Filter {
    /// Creates a filter matching every document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a filter matching one document by ID.
    pub fn by_id(id: DocumentId) -> Self {
        Self::new().eq(ID_FIELD, id.to_string())
    }

    /// Requires the field to equal the value.
    pub fn eq(mut self, path: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.push(Condition::Eq {
            path: path.into(),
            value: value.into(),
        });
        self
    }

    /// Requires the field to match any of the values.
    pub fn any_of(mut self, path: impl Into<String>, values: Vec<Value>) -> Self {
        self.conditions.push(Condition::AnyOf {
            path: path.into(),
            values,
        });
        self
    }

    /// Requires any of the fields to contain the needle, ignoring case.
    pub fn text_search<P: Into<String>>(
        mut self,
        paths: impl IntoIterator<Item = P>,
        needle: impl Into<String>,
    ) -> Self {
        self.conditions.push(Condition::TextSearch {
            paths: paths.into_iter().map(Into::into).collect(),
            needle: needle.into(),
        });
        self
    }

    /// Requires the field to be present and non-null.
    pub fn exists(mut self, path: impl Into<String>) -> Self {
        self.conditions.push(Condition::Exists { path: path.into() });
        self
    }

    /// Appends every condition of another filter.
    pub fn and(mut self, other: Filter) -> Self {
        self.conditions.extend(other.conditions);
        self
    }

    /// Returns true if this filter has no conditions.
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Evaluates the filter against a document.
    pub fn matches(&self, doc: &Document) -> bool {
        self.conditions.iter().all(|c| c.matches(doc))
    }
}
