pub mod collection;
pub mod document;
pub mod error;
pub mod filter;
pub mod memory;
pub mod postgres;
pub mod schema;
pub mod store;
pub mod update;

pub use collection::Collection;
pub use common::DocumentId;
pub use document::{CREATED_AT_FIELD, Document, ID_FIELD, UPDATED_AT_FIELD, lookup_path};
pub use error::{Result, StoreError};
pub use filter::{Condition, Filter};
pub use memory::InMemoryDocumentStore;
pub use postgres::PostgresDocumentStore;
pub use schema::UniqueIndex;
pub use store::{DocumentStore, DocumentStoreExt};
pub use update::{FieldUpdate, Update};
