use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::{
    Collection, Document, DocumentId, Filter, Result, StoreError, Update, schema,
    store::DocumentStore,
};

/// In-memory document store implementation for testing and local runs.
///
/// This implementation keeps every collection in memory and provides
/// the same interface and unique-index guarantees as the PostgreSQL
/// implementation. Uniqueness checks and writes happen under one lock.
#[derive(Clone, Default)]
pub struct InMemoryDocumentStore {
    collections: Arc<RwLock<HashMap<Collection, Vec<Document>>>>,
}

impl InMemoryDocumentStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of documents in a collection.
    pub async fn len(&self, collection: Collection) -> usize {
        self.collections
            .read()
            .await
            .get(&collection)
            .map_or(0, Vec::len)
    }

    /// Clears all collections.
    pub async fn clear(&self) {
        self.collections.write().await.clear();
    }
}

fn check_unique(
    collection: Collection,
    docs: &[Document],
    candidate: &Document,
    candidate_id: DocumentId,
) -> Result<()> {
    for index in schema::indexes_for(collection) {
        let Some(key) = index.key_of(candidate) else {
            continue;
        };
        let clash = docs
            .iter()
            .filter(|d| d.id() != Some(candidate_id))
            .any(|d| index.key_of(d).as_ref() == Some(&key));
        if clash {
            return Err(StoreError::DuplicateKey {
                collection,
                index: index.name,
            });
        }
    }
    Ok(())
}

/// Position of the oldest document matching the filter.
fn first_match(docs: &[Document], filter: &Filter) -> Option<usize> {
    docs.iter()
        .enumerate()
        .filter(|(_, d)| filter.matches(d))
        .min_by(|(_, a), (_, b)| {
            a.created_at()
                .cmp(&b.created_at())
                .then_with(|| a.id().cmp(&b.id()))
        })
        .map(|(position, _)| position)
}

fn sort_documents(docs: &mut [Document]) {
    docs.sort_by(|a, b| {
        a.created_at()
            .cmp(&b.created_at())
            .then_with(|| a.id().cmp(&b.id()))
    });
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn insert(&self, collection: Collection, mut document: Document) -> Result<Document> {
        let id = document.stamp_new(Utc::now());

        let mut store = self.collections.write().await;
        let docs = store.entry(collection).or_default();

        if docs.iter().any(|d| d.id() == Some(id)) {
            return Err(StoreError::DuplicateKey {
                collection,
                index: "_id",
            });
        }
        check_unique(collection, docs, &document, id)?;

        docs.push(document.clone());
        Ok(document)
    }

    async fn find_by_id(
        &self,
        collection: Collection,
        id: DocumentId,
    ) -> Result<Option<Document>> {
        let store = self.collections.read().await;
        Ok(store
            .get(&collection)
            .and_then(|docs| docs.iter().find(|d| d.id() == Some(id)))
            .cloned())
    }

    async fn find(&self, collection: Collection, filter: &Filter) -> Result<Vec<Document>> {
        let store = self.collections.read().await;
        let mut docs: Vec<_> = store
            .get(&collection)
            .map(|docs| docs.iter().filter(|d| filter.matches(d)).cloned().collect())
            .unwrap_or_default();
        sort_documents(&mut docs);
        Ok(docs)
    }

    async fn count(&self, collection: Collection, filter: &Filter) -> Result<u64> {
        let store = self.collections.read().await;
        let count = store
            .get(&collection)
            .map_or(0, |docs| docs.iter().filter(|d| filter.matches(d)).count());
        Ok(count as u64)
    }

    async fn replace(&self, collection: Collection, mut document: Document) -> Result<Document> {
        let id = document.require_id()?;
        document.touch(Utc::now());

        let mut store = self.collections.write().await;
        let docs = store.entry(collection).or_default();

        let Some(position) = docs.iter().position(|d| d.id() == Some(id)) else {
            return Err(StoreError::NotFound { collection, id });
        };
        check_unique(collection, docs, &document, id)?;

        docs[position] = document.clone();
        Ok(document)
    }

    async fn delete(&self, collection: Collection, id: DocumentId) -> Result<bool> {
        let mut store = self.collections.write().await;
        let Some(docs) = store.get_mut(&collection) else {
            return Ok(false);
        };
        let before = docs.len();
        docs.retain(|d| d.id() != Some(id));
        Ok(docs.len() != before)
    }

    async fn delete_one(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<Option<Document>> {
        let mut store = self.collections.write().await;
        let Some(docs) = store.get_mut(&collection) else {
            return Ok(None);
        };

        Ok(first_match(docs, filter).map(|p| docs.remove(p)))
    }

    async fn increment(
        &self,
        collection: Collection,
        id: DocumentId,
        field: &str,
        by: i64,
    ) -> Result<Option<Document>> {
        let mut store = self.collections.write().await;
        let Some(doc) = store
            .get_mut(&collection)
            .and_then(|docs| docs.iter_mut().find(|d| d.id() == Some(id)))
        else {
            return Ok(None);
        };

        let current = doc.get_i64(field).unwrap_or(0);
        doc.set(field, Value::from(current + by));
        doc.touch(Utc::now());
        Ok(Some(doc.clone()))
    }

    async fn update_one(
        &self,
        collection: Collection,
        filter: &Filter,
        update: &Update,
    ) -> Result<Option<Document>> {
        let mut store = self.collections.write().await;
        let Some(docs) = store.get_mut(&collection) else {
            return Ok(None);
        };
        let Some(position) = first_match(docs, filter) else {
            return Ok(None);
        };

        let mut updated = docs[position].clone();
        let id = updated.require_id()?;
        update.apply(&mut updated);
        updated.touch(Utc::now());
        check_unique(collection, docs, &updated, id)?;

        docs[position] = updated.clone();
        Ok(Some(updated))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::DocumentStoreExt;

    fn user(username: &str, email: &str) -> Document {
        Document::from_value(json!({
            "username": username,
            "email": email,
            "fullName": "Test User",
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn insert_assigns_reserved_fields() {
        let store = InMemoryDocumentStore::new();
        let doc = store
            .insert(Collection::Users, user("alice", "a@example.com"))
            .await
            .unwrap();

        assert!(doc.id().is_some());
        assert!(doc.created_at().is_some());
        assert_eq!(store.len(Collection::Users).await, 1);
    }

    #[tokio::test]
    async fn insert_rejects_duplicate_username() {
        let store = InMemoryDocumentStore::new();
        store
            .insert(Collection::Users, user("alice", "a@example.com"))
            .await
            .unwrap();

        let result = store
            .insert(Collection::Users, user("alice", "other@example.com"))
            .await;
        assert!(matches!(
            result,
            Err(StoreError::DuplicateKey {
                index: "users_username_unique",
                ..
            })
        ));
        assert_eq!(store.len(Collection::Users).await, 1);
    }

    #[tokio::test]
    async fn replace_may_keep_its_own_unique_key() {
        let store = InMemoryDocumentStore::new();
        let mut doc = store
            .insert(Collection::Users, user("alice", "a@example.com"))
            .await
            .unwrap();

        doc.set("fullName", json!("Alice Liddell"));
        let updated = store.replace(Collection::Users, doc).await.unwrap();
        assert_eq!(updated.get_str("fullName"), Some("Alice Liddell"));
    }

    #[tokio::test]
    async fn replace_rejects_taking_another_users_email() {
        let store = InMemoryDocumentStore::new();
        store
            .insert(Collection::Users, user("alice", "a@example.com"))
            .await
            .unwrap();
        let mut bob = store
            .insert(Collection::Users, user("bob", "b@example.com"))
            .await
            .unwrap();

        bob.set("email", json!("a@example.com"));
        let result = store.replace(Collection::Users, bob).await;
        assert!(matches!(result, Err(StoreError::DuplicateKey { .. })));
    }

    #[tokio::test]
    async fn replace_missing_document_fails() {
        let store = InMemoryDocumentStore::new();
        let mut doc = user("ghost", "g@example.com");
        doc.stamp_new(Utc::now());

        let result = store.replace(Collection::Users, doc).await;
        assert!(matches!(result, Err(StoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn find_filters_and_orders_by_creation() {
        let store = InMemoryDocumentStore::new();
        for title in ["first", "second", "third"] {
            store
                .insert(
                    Collection::Videos,
                    Document::from_value(json!({"title": title, "owner": "u1"})).unwrap(),
                )
                .await
                .unwrap();
        }
        store
            .insert(
                Collection::Videos,
                Document::from_value(json!({"title": "other", "owner": "u2"})).unwrap(),
            )
            .await
            .unwrap();

        let docs = store
            .find(Collection::Videos, &Filter::new().eq("owner", "u1"))
            .await
            .unwrap();
        let titles: Vec<_> = docs.iter().filter_map(|d| d.get_str("title")).collect();
        assert_eq!(titles, vec!["first", "second", "third"]);

        let count = store
            .count(Collection::Videos, &Filter::new())
            .await
            .unwrap();
        assert_eq!(count, 4);
    }

    #[tokio::test]
    async fn delete_one_removes_single_match() {
        let store = InMemoryDocumentStore::new();
        let like = json!({"likedBy": "u1", "target": {"kind": "video", "id": "v1"}});
        store
            .insert(Collection::Likes, Document::from_value(like).unwrap())
            .await
            .unwrap();

        let filter = Filter::new().eq("likedBy", "u1").eq("target.id", "v1");
        let removed = store.delete_one(Collection::Likes, &filter).await.unwrap();
        assert!(removed.is_some());
        assert_eq!(store.len(Collection::Likes).await, 0);

        let removed = store.delete_one(Collection::Likes, &filter).await.unwrap();
        assert!(removed.is_none());
    }

    #[tokio::test]
    async fn duplicate_like_is_rejected_by_index() {
        let store = InMemoryDocumentStore::new();
        let like = json!({"likedBy": "u1", "target": {"kind": "comment", "id": "c1"}});
        store
            .insert(Collection::Likes, Document::from_value(like.clone()).unwrap())
            .await
            .unwrap();

        let result = store
            .insert(Collection::Likes, Document::from_value(like).unwrap())
            .await;
        assert!(matches!(result, Err(StoreError::DuplicateKey { .. })));
    }

    #[tokio::test]
    async fn increment_treats_missing_as_zero() {
        let store = InMemoryDocumentStore::new();
        let doc = store
            .insert(
                Collection::Videos,
                Document::from_value(json!({"title": "t"})).unwrap(),
            )
            .await
            .unwrap();
        let id = doc.id().unwrap();

        let updated = store
            .increment(Collection::Videos, id, "views", 1)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.get_i64("views"), Some(1));

        let updated = store
            .increment(Collection::Videos, id, "views", 1)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.get_i64("views"), Some(2));

        let missing = store
            .increment(Collection::Videos, DocumentId::new(), "views", 1)
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn update_keeps_fields_written_since_a_stale_read() {
        let store = InMemoryDocumentStore::new();
        let stale = store
            .insert(Collection::Users, user("alice", "a@example.com"))
            .await
            .unwrap();
        let id = stale.id().unwrap();

        store
            .update_by_id(Collection::Users, id, &Update::new().set("refreshToken", "r1"))
            .await
            .unwrap();
        let updated = store
            .update_by_id(
                Collection::Users,
                id,
                &Update::new().push_front("watchHistory", "v1"),
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.get_str("refreshToken"), Some("r1"));
        assert_eq!(updated.get("watchHistory"), Some(&json!(["v1"])));
        assert_eq!(updated.get_str("fullName"), Some("Test User"));
    }

    #[tokio::test]
    async fn update_only_applies_when_the_filter_still_matches() {
        let store = InMemoryDocumentStore::new();
        let doc = store
            .insert(Collection::Users, user("alice", "a@example.com"))
            .await
            .unwrap();
        let id = doc.id().unwrap();
        store
            .update_by_id(Collection::Users, id, &Update::new().set("refreshToken", "r1"))
            .await
            .unwrap();

        let rotate = Update::new().set("refreshToken", "r2");
        let guard = Filter::by_id(id).eq("refreshToken", "r1");
        let first = store
            .update_one(Collection::Users, &guard, &rotate)
            .await
            .unwrap();
        let second = store
            .update_one(Collection::Users, &guard, &rotate)
            .await
            .unwrap();

        assert!(first.is_some());
        assert!(second.is_none());
    }

    #[tokio::test]
    async fn update_rejects_taking_another_users_email() {
        let store = InMemoryDocumentStore::new();
        store
            .insert(Collection::Users, user("alice", "a@example.com"))
            .await
            .unwrap();
        let bob = store
            .insert(Collection::Users, user("bob", "b@example.com"))
            .await
            .unwrap();

        let result = store
            .update_by_id(
                Collection::Users,
                bob.id().unwrap(),
                &Update::new().set("email", "a@example.com"),
            )
            .await;
        assert!(matches!(
            result,
            Err(StoreError::DuplicateKey {
                index: "users_email_unique",
                ..
            })
        ));

        let bob = store
            .find_by_id(Collection::Users, bob.id().unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(bob.get_str("email"), Some("b@example.com"));
    }

    #[tokio::test]
    async fn delete_by_id() {
        let store = InMemoryDocumentStore::new();
        let doc = store
            .insert(
                Collection::Tweets,
                Document::from_value(json!({"content": "hi"})).unwrap(),
            )
            .await
            .unwrap();

        assert!(store
            .delete(Collection::Tweets, doc.id().unwrap())
            .await
            .unwrap());
        assert!(!store
            .delete(Collection::Tweets, doc.id().unwrap())
            .await
            .unwrap());
    }
}
