use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{DocumentId, Result, StoreError};

/// Reserved key holding the document's identifier.
pub const ID_FIELD: &str = "_id";

/// Reserved key holding the creation timestamp (RFC 3339).
pub const CREATED_AT_FIELD: &str = "createdAt";

/// Reserved key holding the last-modification timestamp (RFC 3339).
pub const UPDATED_AT_FIELD: &str = "updatedAt";

/// A schemaless JSON object stored in a collection.
///
/// Fields are addressed by dotted paths (`owner.username`). Typed entities
/// convert in and out with [`Document::from_entity`] and
/// [`Document::into_entity`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document(Map<String, Value>);

impl Document {
    /// Creates an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Serializes an entity into a document. The entity must serialize to a JSON object.
    pub fn from_entity<T: Serialize>(entity: &T) -> Result<Self> {
        Self::from_value(serde_json::to_value(entity)?)
    }

    /// Wraps a JSON value, rejecting anything that is not an object.
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(StoreError::InvalidDocument(format!(
                "expected a JSON object, got {other}"
            ))),
        }
    }

    /// Deserializes the document into a typed entity.
    pub fn into_entity<T: DeserializeOwned>(self) -> Result<T> {
        Ok(serde_json::from_value(Value::Object(self.0))?)
    }

    /// Returns the document as a JSON value.
    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    /// Borrows the underlying JSON object.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Returns the document ID, if present and well formed.
    pub fn id(&self) -> Option<DocumentId> {
        self.get_str(ID_FIELD)
            .and_then(|s| DocumentId::parse(s).ok())
    }

    /// Returns the creation timestamp, if present and well formed.
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.get_str(CREATED_AT_FIELD)
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|ts| ts.with_timezone(&Utc))
    }

    /// Reads a value by dotted path.
    pub fn get(&self, path: &str) -> Option<&Value> {
        let (head, rest) = split_path(path);
        let first = self.0.get(head)?;
        match rest {
            Some(rest) => lookup_path(first, rest),
            None => Some(first),
        }
    }

    /// Reads a string by dotted path.
    pub fn get_str(&self, path: &str) -> Option<&str> {
        self.get(path).and_then(Value::as_str)
    }

    /// Reads an integer by dotted path.
    pub fn get_i64(&self, path: &str) -> Option<i64> {
        self.get(path).and_then(Value::as_i64)
    }

    /// Returns true if the path resolves to a non-null value.
    pub fn contains(&self, path: &str) -> bool {
        self.get(path).is_some_and(|v| !v.is_null())
    }

    /// Writes a value at a dotted path, creating intermediate objects as needed.
    pub fn set(&mut self, path: &str, value: Value) {
        let segments: Vec<&str> = path.split('.').collect();
        let Some((last, parents)) = segments.split_last() else {
            return;
        };

        let mut current = &mut self.0;
        for segment in parents {
            let entry = current
                .entry((*segment).to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !entry.is_object() {
                *entry = Value::Object(Map::new());
            }
            current = match entry {
                Value::Object(map) => map,
                _ => return,
            };
        }
        current.insert((*last).to_string(), value);
    }

    /// Removes the value at a dotted path, returning it.
    pub fn remove(&mut self, path: &str) -> Option<Value> {
        let segments: Vec<&str> = path.split('.').collect();
        let (last, parents) = segments.split_last()?;

        let mut current = &mut self.0;
        for segment in parents {
            current = match current.get_mut(*segment)? {
                Value::Object(map) => map,
                _ => return None,
            };
        }
        current.remove(*last)
    }

    /// Assigns an ID and timestamps if they are missing.
    pub fn stamp_new(&mut self, now: DateTime<Utc>) -> DocumentId {
        let id = match self.id() {
            Some(id) => id,
            None => {
                let id = DocumentId::new();
                self.0
                    .insert(ID_FIELD.to_string(), Value::String(id.to_string()));
                id
            }
        };
        if self.created_at().is_none() {
            self.0.insert(
                CREATED_AT_FIELD.to_string(),
                Value::String(now.to_rfc3339()),
            );
        }
        if !self.contains(UPDATED_AT_FIELD) {
            self.0.insert(
                UPDATED_AT_FIELD.to_string(),
                Value::String(now.to_rfc3339()),
            );
        }
        id
    }

    /// Sets the modification timestamp.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.0.insert(
            UPDATED_AT_FIELD.to_string(),
            Value::String(now.to_rfc3339()),
        );
    }

    /// Returns the document ID, failing if it is missing.
    pub fn require_id(&self) -> Result<DocumentId> {
        self.id()
            .ok_or_else(|| StoreError::InvalidDocument("missing or malformed _id".to_string()))
    }
}

impl From<Map<String, Value>> for Document {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl From<Document> for Value {
    fn from(doc: Document) -> Self {
        doc.into_value()
    }
}

fn split_path(path: &str) -> (&str, Option<&str>) {
    match path.split_once('.') {
        Some((head, rest)) => (head, Some(rest)),
        None => (path, None),
    }
}

/// Resolves a dotted path inside an arbitrary JSON value.
///
/// Only objects are traversed; a path that crosses an array or a scalar
/// resolves to `None`.
pub fn lookup_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(value, |current, segment| current.as_object()?.get(segment))
}
