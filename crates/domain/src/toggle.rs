//! Present/absent relations toggled by a single actor.

use document_store::{Collection, Document, DocumentStore, Filter, StoreError};
use serde::Serialize;

use crate::error::Result;

/// State of an (actor, target) relation after a toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToggleOutcome {
    Present,
    Absent,
}

impl ToggleOutcome {
    pub fn is_present(&self) -> bool {
        matches!(self, ToggleOutcome::Present)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ToggleOutcome::Present => "present",
            ToggleOutcome::Absent => "absent",
        }
    }
}

/// Flips the relation identified by `pair`.
///
/// The delete is a single-document atomic operation; if nothing was removed
/// the relation is created. Creation relies on the collection's unique index
/// over the pair: a concurrent toggle that created it first makes this one
/// fail with `DuplicateKey`, which is reported as `Present` since the
/// relation exists either way.
pub async fn toggle<S: DocumentStore + ?Sized>(
    store: &S,
    collection: Collection,
    pair: &Filter,
    create: Document,
) -> Result<ToggleOutcome> {
    if store.delete_one(collection, pair).await?.is_some() {
        return Ok(ToggleOutcome::Absent);
    }
    match store.insert(collection, create).await {
        Ok(_) => Ok(ToggleOutcome::Present),
        Err(StoreError::DuplicateKey { index, .. }) => {
            tracing::debug!(%collection, index, "concurrent toggle already created the relation");
            Ok(ToggleOutcome::Present)
        }
        Err(e) => Err(e.into()),
    }
}
