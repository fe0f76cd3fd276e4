//! Lookup stages: attaching related documents from another collection.

use document_store::{Collection, ID_FIELD};

use crate::pipeline::Stage;

/// How many matches a lookup attaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    /// The first match as an object, or `null`.
    One,
    /// Every match as an array, possibly empty.
    Many,
}

/// Attaches documents from `from` whose `foreign_field` equals the value at
/// `local_field` on each input document.
///
/// When `local_field` holds an array, a document matches if its
/// `foreign_field` equals any element, and `Many` results follow the
/// array's order. References to missing documents are dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct Lookup {
    pub from: Collection,
    pub local_field: String,
    pub foreign_field: String,
    pub as_field: String,
    pub cardinality: Cardinality,
    /// Stages run over the matched documents before they are attached.
    pub pipeline: Vec<Stage>,
}

impl Lookup {
    /// A to-one join, e.g. a video's `owner` against `users._id`.
    pub fn one(
        from: Collection,
        local_field: impl Into<String>,
        foreign_field: impl Into<String>,
        as_field: impl Into<String>,
    ) -> Self {
        Self {
            from,
            local_field: local_field.into(),
            foreign_field: foreign_field.into(),
            as_field: as_field.into(),
            cardinality: Cardinality::One,
            pipeline: Vec::new(),
        }
    }

    /// A to-many join, e.g. a channel's `_id` against `subscriptions.channel`.
    pub fn many(
        from: Collection,
        local_field: impl Into<String>,
        foreign_field: impl Into<String>,
        as_field: impl Into<String>,
    ) -> Self {
        Self {
            cardinality: Cardinality::Many,
            ..Self::one(from, local_field, foreign_field, as_field)
        }
    }

    /// Joins a reference field against the target's `_id`.
    pub fn reference(
        from: Collection,
        local_field: impl Into<String>,
        as_field: impl Into<String>,
    ) -> Self {
        Self::one(from, local_field, ID_FIELD, as_field)
    }

    /// Adds a stage to the nested pipeline.
    pub fn with_stage(mut self, stage: Stage) -> Self {
        self.pipeline.push(stage);
        self
    }
}
