//! Field projection and the sensitive-field policy for user documents.

use document_store::{Document, ID_FIELD};
use serde_json::Value;

/// Fields holding credentials. Never returned by any read-model query.
pub const CREDENTIAL_FIELDS: &[&str] = &["password", "refreshToken"];

/// Raw contact fields, visible only on the owner's own profile.
pub const CONTACT_FIELDS: &[&str] = &["email"];

/// Visibility policy applied to every document loaded from the users collection.
///
/// The engine strips these fields when a user document enters a pipeline,
/// whether as the source or as a join target, so no later stage (and no
/// call site) can reintroduce them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Redaction {
    /// Another user's view: credentials and contact fields are removed.
    #[default]
    Public,
    /// The authenticated user's own profile: credentials are removed, contact fields kept.
    SelfProfile,
}

impl Redaction {
    /// Returns true if the field is hidden under this policy.
    pub fn hides(&self, field: &str) -> bool {
        CREDENTIAL_FIELDS.contains(&field)
            || (*self == Redaction::Public && CONTACT_FIELDS.contains(&field))
    }

    /// Strips every hidden top-level field from a user document.
    pub fn apply(&self, doc: &mut Document) {
        for field in CREDENTIAL_FIELDS.iter().chain(CONTACT_FIELDS) {
            if self.hides(field) {
                doc.remove(field);
            }
        }
    }
}

/// One output field of a projection or an `AddFields` stage.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldSpec {
    /// Copies a field under its own path.
    Include(String),
    /// Copies `source` under the name `output` (e.g. `fullName` from `ownerDetails.fullName`).
    Rename { output: String, source: String },
    /// Length of the array at `source`; 0 when missing.
    Size { output: String, source: String },
    /// Whether any value reachable at `source` equals `value` (arrays are traversed).
    Contains {
        output: String,
        source: String,
        value: Value,
    },
    /// A constant.
    Literal { output: String, value: Value },
}

impl FieldSpec {
    pub fn include(path: impl Into<String>) -> Self {
        FieldSpec::Include(path.into())
    }

    pub fn rename(output: impl Into<String>, source: impl Into<String>) -> Self {
        FieldSpec::Rename {
            output: output.into(),
            source: source.into(),
        }
    }

    pub fn size(output: impl Into<String>, source: impl Into<String>) -> Self {
        FieldSpec::Size {
            output: output.into(),
            source: source.into(),
        }
    }

    pub fn contains(
        output: impl Into<String>,
        source: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        FieldSpec::Contains {
            output: output.into(),
            source: source.into(),
            value: value.into(),
        }
    }

    pub fn literal(output: impl Into<String>, value: impl Into<Value>) -> Self {
        FieldSpec::Literal {
            output: output.into(),
            value: value.into(),
        }
    }

    /// Evaluates the field against `input`, writing the result into `output`.
    ///
    /// Missing sources are skipped rather than written as null.
    pub fn write(&self, input: &Document, output: &mut Document) {
        match self {
            FieldSpec::Include(path) => {
                if let Some(v) = input.get(path) {
                    output.set(path, v.clone());
                }
            }
            FieldSpec::Rename { output: name, source } => {
                if let Some(v) = input.get(source) {
                    output.set(name, v.clone());
                }
            }
            FieldSpec::Size { output: name, source } => {
                let len = input
                    .get(source)
                    .and_then(Value::as_array)
                    .map_or(0, Vec::len);
                output.set(name, Value::from(len as u64));
            }
            FieldSpec::Contains {
                output: name,
                source,
                value,
            } => {
                let found = collect_document_path(input, source)
                    .iter()
                    .any(|v| v == value);
                output.set(name, Value::Bool(found));
            }
            FieldSpec::Literal { output: name, value } => {
                output.set(name, value.clone());
            }
        }
    }
}

/// Collects every value reachable at a dotted path, descending into arrays.
///
/// `subscribers.subscriber` over `{"subscribers": [{"subscriber": "a"}, {"subscriber": "b"}]}`
/// yields `["a", "b"]`. Arrays found at the end of the path are flattened too.
pub fn collect_path(value: &Value, path: &str) -> Vec<Value> {
    let mut out = Vec::new();
    let segments: Vec<&str> = path.split('.').collect();
    collect_into(value, &segments, &mut out);
    out
}

/// Like [`collect_path`], starting from a document's top-level fields.
pub fn collect_document_path(doc: &Document, path: &str) -> Vec<Value> {
    let mut out = Vec::new();
    let segments: Vec<&str> = path.split('.').collect();
    if let Some((head, rest)) = segments.split_first()
        && let Some(first) = doc.as_map().get(*head)
    {
        collect_into(first, rest, &mut out);
    }
    out
}

fn collect_into(value: &Value, segments: &[&str], out: &mut Vec<Value>) {
    match (value, segments.split_first()) {
        (Value::Array(items), _) => {
            for item in items {
                collect_into(item, segments, out);
            }
        }
        (v, None) => out.push(v.clone()),
        (Value::Object(map), Some((head, rest))) => {
            if let Some(next) = map.get(*head) {
                collect_into(next, rest, out);
            }
        }
        _ => {}
    }
}

/// Shapes a document's output fields.
///
/// With no `fields` the document passes through whole; otherwise only `_id`
/// and the listed fields survive. `exclude` is applied last in both modes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Projection {
    pub fields: Vec<FieldSpec>,
    pub exclude: Vec<String>,
}

impl Projection {
    /// Creates a pass-through projection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an inclusion projection over plain field paths.
    pub fn including<P: Into<String>>(paths: impl IntoIterator<Item = P>) -> Self {
        Self {
            fields: paths.into_iter().map(FieldSpec::include).collect(),
            exclude: Vec::new(),
        }
    }

    /// Adds an output field.
    pub fn field(mut self, spec: FieldSpec) -> Self {
        self.fields.push(spec);
        self
    }

    /// Removes a path from the output.
    pub fn without(mut self, path: impl Into<String>) -> Self {
        self.exclude.push(path.into());
        self
    }

    /// Applies the projection to a document.
    pub fn apply(&self, input: &Document) -> Document {
        let mut output = if self.fields.is_empty() {
            input.clone()
        } else {
            let mut out = Document::new();
            if let Some(id) = input.get(ID_FIELD) {
                out.set(ID_FIELD, id.clone());
            }
            for spec in &self.fields {
                spec.write(input, &mut out);
            }
            out
        };
        for path in &self.exclude {
            output.remove(path);
        }
        output
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn doc(value: Value) -> Document {
        Document::from_value(value).unwrap()
    }

    #[test]
    fn public_redaction_strips_credentials_and_contact() {
        let mut d = doc(json!({
            "username": "alice",
            "email": "a@example.com",
            "password": "$argon2id$...",
            "refreshToken": "tok"
        }));
        Redaction::Public.apply(&mut d);
        assert_eq!(d.get_str("username"), Some("alice"));
        assert!(d.get("email").is_none());
        assert!(d.get("password").is_none());
        assert!(d.get("refreshToken").is_none());
    }

    #[test]
    fn self_profile_keeps_email_only() {
        let mut d = doc(json!({
            "email": "a@example.com",
            "password": "hash",
            "refreshToken": "tok"
        }));
        Redaction::SelfProfile.apply(&mut d);
        assert_eq!(d.get_str("email"), Some("a@example.com"));
        assert!(d.get("password").is_none());
        assert!(d.get("refreshToken").is_none());
    }

    #[test]
    fn inclusion_keeps_id_and_listed_fields() {
        let d = doc(json!({"_id": "x", "title": "t", "description": "d", "views": 4}));
        let out = Projection::including(["title", "views"]).apply(&d);
        assert_eq!(
            out.into_value(),
            json!({"_id": "x", "title": "t", "views": 4})
        );
    }

    #[test]
    fn rename_flattens_nested_source() {
        let d = doc(json!({"_id": "c1", "ownerDetails": {"fullName": "Alice"}}));
        let out = Projection::new()
            .field(FieldSpec::rename("fullName", "ownerDetails.fullName"))
            .apply(&d);
        assert_eq!(out.get_str("fullName"), Some("Alice"));
        assert!(out.get("ownerDetails").is_none());
    }

    #[test]
    fn exclusion_mode_passes_other_fields() {
        let d = doc(json!({"_id": "v", "title": "t", "videoFile": "f"}));
        let out = Projection::new().without("videoFile").apply(&d);
        assert_eq!(out.get_str("title"), Some("t"));
        assert!(out.get("videoFile").is_none());
    }

    #[test]
    fn size_and_contains() {
        let d = doc(json!({
            "subscribers": [{"subscriber": "a"}, {"subscriber": "b"}]
        }));
        let mut out = Document::new();
        FieldSpec::size("subscribersCount", "subscribers").write(&d, &mut out);
        FieldSpec::contains("isSubscribed", "subscribers.subscriber", "b").write(&d, &mut out);
        FieldSpec::size("missingCount", "nothing").write(&d, &mut out);

        assert_eq!(out.get_i64("subscribersCount"), Some(2));
        assert_eq!(out.get("isSubscribed"), Some(&json!(true)));
        assert_eq!(out.get_i64("missingCount"), Some(0));
    }

    #[test]
    fn collect_path_traverses_arrays() {
        let v = json!({"a": [{"b": 1}, {"b": [2, 3]}, {"c": 4}]});
        assert_eq!(collect_path(&v, "a.b"), vec![json!(1), json!(2), json!(3)]);
        assert!(collect_path(&v, "x.y").is_empty());
    }
}
