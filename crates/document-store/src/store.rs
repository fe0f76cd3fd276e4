use async_trait::async_trait;

use crate::{Collection, Document, DocumentId, Filter, Result, Update};

/// Core trait for document store implementations.
///
/// Every write is atomic at the single-document level, and the unique
/// indexes in [`crate::schema::UNIQUE_INDEXES`] are enforced by the store
/// itself. All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Inserts a document, assigning `_id`, `createdAt` and `updatedAt` when missing.
    ///
    /// Fails with `DuplicateKey` if a unique index would be violated.
    async fn insert(&self, collection: Collection, document: Document) -> Result<Document>;

    /// Retrieves a document by ID.
    async fn find_by_id(&self, collection: Collection, id: DocumentId)
    -> Result<Option<Document>>;

    /// Retrieves every document matching the filter.
    ///
    /// Results are ordered by `createdAt` ascending, then by `_id`.
    async fn find(&self, collection: Collection, filter: &Filter) -> Result<Vec<Document>>;

    /// Counts the documents matching the filter.
    async fn count(&self, collection: Collection, filter: &Filter) -> Result<u64>;

    /// Replaces a stored document (matched by `_id`) and bumps `updatedAt`.
    ///
    /// Fails with `NotFound` if the document does not exist, or with
    /// `DuplicateKey` if a unique index would be violated.
    async fn replace(&self, collection: Collection, document: Document) -> Result<Document>;

    /// Deletes a document by ID. Returns true if a document was removed.
    async fn delete(&self, collection: Collection, id: DocumentId) -> Result<bool>;

    /// Deletes the first document matching the filter, returning it.
    async fn delete_one(&self, collection: Collection, filter: &Filter)
    -> Result<Option<Document>>;

    /// Atomically adds `by` to an integer field (missing counts as 0).
    ///
    /// Returns the updated document, or None if it does not exist.
    async fn increment(
        &self,
        collection: Collection,
        id: DocumentId,
        field: &str,
        by: i64,
    ) -> Result<Option<Document>>;

    /// Atomically applies field changes to the oldest document matching the
    /// filter and bumps its `updatedAt`. Fields the update does not name keep
    /// their stored values.
    ///
    /// Returns the updated document, or None if nothing matched. Fails with
    /// `DuplicateKey` if a unique index would be violated.
    async fn update_one(
        &self,
        collection: Collection,
        filter: &Filter,
        update: &Update,
    ) -> Result<Option<Document>>;
}

/// Extension trait providing convenience methods for document stores.
#[async_trait]
pub trait DocumentStoreExt: DocumentStore {
    /// Retrieves the first document matching the filter.
    async fn find_one(&self, collection: Collection, filter: &Filter) -> Result<Option<Document>> {
        Ok(self.find(collection, filter).await?.into_iter().next())
    }

    /// Checks whether a document with the given ID exists.
    async fn exists(&self, collection: Collection, id: DocumentId) -> Result<bool> {
        Ok(self.find_by_id(collection, id).await?.is_some())
    }

    /// Atomically applies field changes to the document with the given ID.
    async fn update_by_id(
        &self,
        collection: Collection,
        id: DocumentId,
        update: &Update,
    ) -> Result<Option<Document>> {
        self.update_one(collection, &Filter::by_id(id), update).await
    }
}

// Blanket implementation for all DocumentStore implementations
impl<T: DocumentStore + ?Sized> DocumentStoreExt for T {}
