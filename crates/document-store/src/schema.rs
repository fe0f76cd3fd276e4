//! Schema-level invariants shared by every store backend.

use serde_json::Value;

use crate::{Collection, Document};

/// A uniqueness constraint over one or more document fields.
///
/// Documents missing any indexed field are not constrained (sparse index).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UniqueIndex {
    /// Constraint name, also used for the PostgreSQL index.
    pub name: &'static str,
    /// Collection the index applies to.
    pub collection: Collection,
    /// Dotted field paths forming the key.
    pub fields: &'static [&'static str],
}

impl UniqueIndex {
    /// Extracts the key of a document, or `None` if any field is missing.
    pub fn key_of(&self, doc: &Document) -> Option<Vec<Value>> {
        self.fields
            .iter()
            .map(|path| doc.get(path).filter(|v| !v.is_null()).cloned())
            .collect()
    }
}

/// Every unique index of the platform.
pub const UNIQUE_INDEXES: &[UniqueIndex] = &[
    UniqueIndex {
        name: "users_username_unique",
        collection: Collection::Users,
        fields: &["username"],
    },
    UniqueIndex {
        name: "users_email_unique",
        collection: Collection::Users,
        fields: &["email"],
    },
    UniqueIndex {
        name: "likes_actor_target_unique",
        collection: Collection::Likes,
        fields: &["likedBy", "target.kind", "target.id"],
    },
    UniqueIndex {
        name: "subscriptions_subscriber_channel_unique",
        collection: Collection::Subscriptions,
        fields: &["subscriber", "channel"],
    },
];

/// Returns the unique indexes declared on a collection.
pub fn indexes_for(collection: Collection) -> impl Iterator<Item = &'static UniqueIndex> {
    UNIQUE_INDEXES
        .iter()
        .filter(move |idx| idx.collection == collection)
}

/// Finds an index by constraint name.
pub fn index_named(name: &str) -> Option<&'static UniqueIndex> {
    UNIQUE_INDEXES.iter().find(|idx| idx.name == name)
}
