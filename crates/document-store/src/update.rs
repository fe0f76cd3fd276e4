use serde_json::Value;

use crate::Document;

/// One field-level change applied by [`crate::DocumentStore::update_one`].
#[derive(Debug, Clone, PartialEq)]
pub enum FieldUpdate {
    /// Overwrites the field.
    Set { path: String, value: Value },

    /// Moves the value to the front of an array field, dropping any other
    /// occurrence. A missing or non-array field becomes `[value]`.
    PushFront { path: String, value: Value },
}

/// A set of field changes applied atomically to a single document.
///
/// Fields not named here are left as they are in the stored document, so
/// concurrent updates to disjoint fields never overwrite each other.
/// Each path should appear at most once.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Update {
    pub changes: Vec<FieldUpdate>,
}

impl Update {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrites the field with the value.
    pub fn set(mut self, path: impl Into<String>, value: impl Into<Value>) -> Self {
        self.changes.push(FieldUpdate::Set {
            path: path.into(),
            value: value.into(),
        });
        self
    }

    /// Sets the field only when a value is given.
    pub fn set_some(self, path: impl Into<String>, value: Option<impl Into<Value>>) -> Self {
        match value {
            Some(value) => self.set(path, value),
            None => self,
        }
    }

    /// Moves the value to the front of the array field.
    pub fn push_front(mut self, path: impl Into<String>, value: impl Into<Value>) -> Self {
        self.changes.push(FieldUpdate::PushFront {
            path: path.into(),
            value: value.into(),
        });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Applies every change to an in-memory document.
    pub fn apply(&self, doc: &mut Document) {
        for change in &self.changes {
            match change {
                FieldUpdate::Set { path, value } => doc.set(path, value.clone()),
                FieldUpdate::PushFront { path, value } => {
                    let mut items = match doc.get(path) {
                        Some(Value::Array(items)) => items.clone(),
                        _ => Vec::new(),
                    };
                    items.retain(|item| item != value);
                    items.insert(0, value.clone());
                    doc.set(path, Value::Array(items));
                }
            }
        }
    }
}
