//! Storage collaborator.
//!
//! The browser only needs name listings, a forward cursor over a
//! collection, identity lookups, and whole-document replacement. Any
//! backend that can answer those implements [`Store`].

mod memory;
#[cfg(feature = "mongo")]
mod mongo;

pub use memory::MemoryStore;
#[cfg(feature = "mongo")]
pub use mongo::MongoStore;

use std::fmt;

use crate::value::{Document, Value};

/// One-shot forward cursor over a collection.
pub type DocumentCursor = Box<dyn Iterator<Item = Result<Document, StoreError>>>;

/// A collection addressed by database and collection name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CollectionRef {
    pub database: String,
    pub name: String,
}

impl CollectionRef {
    pub fn new(database: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for CollectionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.database, self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("unknown database `{0}`")]
    UnknownDatabase(String),
    #[error("unknown collection `{0}`")]
    UnknownCollection(String),
    #[error("document has no `_id` field")]
    MissingIdentifier,
    #[error("cannot convert value: {0}")]
    Conversion(String),
}

/// Blocking access to a document store.
pub trait Store {
    /// Names of every database on the server.
    ///
    /// # Errors
    ///
    /// Fails when the server cannot be reached.
    fn list_databases(&self) -> Result<Vec<String>, StoreError>;

    /// Names of the collections in `database`.
    ///
    /// # Errors
    ///
    /// Fails when the server cannot be reached or the database is unknown.
    fn list_collections(&self, database: &str) -> Result<Vec<String>, StoreError>;

    /// Start a forward cursor over every document in `collection`.
    ///
    /// # Errors
    ///
    /// Fails when the query cannot be started.
    fn open_cursor(&self, collection: &CollectionRef) -> Result<DocumentCursor, StoreError>;

    /// Point lookup by `_id`. A miss is `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Fails when the server cannot be reached.
    fn find_by_identifier(
        &self,
        collection: &CollectionRef,
        id: &Value,
    ) -> Result<Option<Document>, StoreError>;

    /// Replace (or insert) the document with the same `_id` as `document`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::MissingIdentifier`] when `document` has no
    /// `_id`, or a store failure.
    fn replace_whole(&self, collection: &CollectionRef, document: &Document)
    -> Result<(), StoreError>;
}
