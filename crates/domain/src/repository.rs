//! Typed access to entity collections.

use document_store::{Document, DocumentId, DocumentStore, DocumentStoreExt, Filter, Update};

use crate::error::{DomainError, Result};
use crate::model::Entity;

/// Loads and stores typed entities in their collections.
#[derive(Clone)]
pub struct Repository<S: DocumentStore> {
    store: S,
}

impl<S: DocumentStore> Repository<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns the underlying document store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Loads an entity, returning None if it doesn't exist.
    pub async fn load<T: Entity>(&self, id: DocumentId) -> Result<Option<T>> {
        match self.store.find_by_id(T::COLLECTION, id).await? {
            Some(doc) => Ok(Some(doc.into_entity()?)),
            None => Ok(None),
        }
    }

    /// Loads an entity, failing with `NotFound` if it doesn't exist.
    pub async fn require<T: Entity>(&self, id: DocumentId) -> Result<T> {
        self.load(id)
            .await?
            .ok_or_else(|| DomainError::not_found(T::NAME))
    }

    /// Loads the first entity matching the filter.
    pub async fn find_one<T: Entity>(&self, filter: &Filter) -> Result<Option<T>> {
        match self.store.find_one(T::COLLECTION, filter).await? {
            Some(doc) => Ok(Some(doc.into_entity()?)),
            None => Ok(None),
        }
    }

    /// Fails with `NotFound` unless an entity with the id exists.
    pub async fn ensure_exists<T: Entity>(&self, id: DocumentId) -> Result<()> {
        if self.store.exists(T::COLLECTION, id).await? {
            Ok(())
        } else {
            Err(DomainError::not_found(T::NAME))
        }
    }

    /// Inserts a new entity and returns it as stored.
    pub async fn insert<T: Entity>(&self, entity: &T) -> Result<T> {
        let doc = self
            .store
            .insert(T::COLLECTION, Document::from_entity(entity)?)
            .await?;
        Ok(doc.into_entity()?)
    }

    /// Writes back a modified entity, bumping `updatedAt`.
    pub async fn save<T: Entity>(&self, entity: &T) -> Result<T> {
        let doc = Document::from_entity(entity)?;
        let stored = self.store.replace(T::COLLECTION, doc).await?;
        Ok(stored.into_entity()?)
    }

    /// Applies field changes in place without rewriting the rest of the
    /// entity, failing with `NotFound` if it doesn't exist.
    pub async fn update<T: Entity>(&self, id: DocumentId, update: &Update) -> Result<T> {
        self.update_where(&Filter::by_id(id), update)
            .await?
            .ok_or_else(|| DomainError::not_found(T::NAME))
    }

    /// Applies field changes to the first entity matching the filter.
    pub async fn update_where<T: Entity>(
        &self,
        filter: &Filter,
        update: &Update,
    ) -> Result<Option<T>> {
        match self.store.update_one(T::COLLECTION, filter, update).await? {
            Some(doc) => Ok(Some(doc.into_entity()?)),
            None => Ok(None),
        }
    }

    /// Deletes an entity. Returns true if it existed.
    pub async fn delete<T: Entity>(&self, id: DocumentId) -> Result<bool> {
        Ok(self.store.delete(T::COLLECTION, id).await?)
    }
}
