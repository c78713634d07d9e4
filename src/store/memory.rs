use std::cell::{Cell, RefCell};
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde_json::Value as Json;

use super::{CollectionRef, DocumentCursor, Store, StoreError};
use crate::codec;
use crate::value::{Document, Value};

#[derive(Debug, Clone, Default)]
struct Collection {
    name: String,
    documents: Vec<Document>,
}

#[derive(Debug, Clone, Default)]
struct Database {
    name: String,
    collections: Vec<Collection>,
}

/// In-process store, loadable from a JSON fixture.
///
/// Databases and collections keep the order they were added in. Cursors
/// iterate a snapshot taken when they are opened.
#[derive(Debug, Default)]
pub struct MemoryStore {
    databases: RefCell<Vec<Database>>,
    unavailable: Cell<bool>,
    replaced: RefCell<Vec<(CollectionRef, Document)>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an empty database.
    #[must_use]
    pub fn with_database(self, database: &str) -> Self {
        self.database_mut(database, |_| ());
        self
    }

    /// Add a collection holding `documents`, creating the database if needed.
    #[must_use]
    pub fn with_collection(self, database: &str, name: &str, documents: Vec<Document>) -> Self {
        self.database_mut(database, |db| {
            collection_mut(db, name).documents = documents;
        });
        self
    }

    /// Parse a fixture of the form `{"db": {"collection": [documents]}}`.
    ///
    /// String values may use the extended-value tags, e.g.
    /// `"_id": "ObjectId('507f191e810c19729de860ea')"`.
    ///
    /// # Errors
    ///
    /// Fails on invalid JSON, on a shape other than the one above, or on a
    /// malformed tagged value.
    pub fn from_json_str(text: &str) -> Result<Self> {
        let json: Json = serde_json::from_str(text).context("fixture is not valid JSON")?;
        let Json::Object(databases) = json else {
            bail!("fixture must be an object of databases");
        };
        let mut store = Self::new();
        for (db_name, collections) in databases {
            let Json::Object(collections) = collections else {
                bail!("database `{db_name}` must be an object of collections");
            };
            store = store.with_database(&db_name);
            for (coll_name, documents) in collections {
                let Json::Array(documents) = documents else {
                    bail!("collection `{db_name}.{coll_name}` must be an array of documents");
                };
                let documents = documents
                    .into_iter()
                    .enumerate()
                    .map(|(idx, doc)| match doc {
                        Json::Object(map) => codec::object_hook(map)
                            .with_context(|| format!("{db_name}.{coll_name}[{idx}]")),
                        _ => bail!("{db_name}.{coll_name}[{idx}] is not a document"),
                    })
                    .collect::<Result<Vec<_>>>()?;
                store = store.with_collection(&db_name, &coll_name, documents);
            }
        }
        Ok(store)
    }

    /// Load a fixture file, see [`MemoryStore::from_json_str`].
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read or parsed.
    pub fn from_fixture(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read fixture {}", path.display()))?;
        Self::from_json_str(&text).with_context(|| format!("invalid fixture {}", path.display()))
    }

    /// Make every subsequent call fail with [`StoreError::Unavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.set(unavailable);
    }

    /// Every document passed to `replace_whole`, in call order.
    pub fn replaced(&self) -> Vec<(CollectionRef, Document)> {
        self.replaced.borrow().clone()
    }

    /// Current contents of a collection.
    pub fn documents(&self, collection: &CollectionRef) -> Option<Vec<Document>> {
        let databases = self.databases.borrow();
        find_collection(&databases, collection).map(|coll| coll.documents.clone())
    }

    fn database_mut(&self, database: &str, f: impl FnOnce(&mut Database)) {
        let mut databases = self.databases.borrow_mut();
        let idx = databases
            .iter()
            .position(|db| db.name == database)
            .unwrap_or_else(|| {
                databases.push(Database {
                    name: database.to_string(),
                    collections: Vec::new(),
                });
                databases.len() - 1
            });
        f(&mut databases[idx]);
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.get() {
            return Err(StoreError::Unavailable("store is offline".to_string()));
        }
        Ok(())
    }
}

fn collection_mut<'a>(db: &'a mut Database, name: &str) -> &'a mut Collection {
    let idx = db
        .collections
        .iter()
        .position(|coll| coll.name == name)
        .unwrap_or_else(|| {
            db.collections.push(Collection {
                name: name.to_string(),
                documents: Vec::new(),
            });
            db.collections.len() - 1
        });
    &mut db.collections[idx]
}

fn find_collection<'a>(databases: &'a [Database], collection: &CollectionRef) -> Option<&'a Collection> {
    databases
        .iter()
        .find(|db| db.name == collection.database)?
        .collections
        .iter()
        .find(|coll| coll.name == collection.name)
}

impl Store for MemoryStore {
    fn list_databases(&self) -> Result<Vec<String>, StoreError> {
        self.check_available()?;
        Ok(self.databases.borrow().iter().map(|db| db.name.clone()).collect())
    }

    fn list_collections(&self, database: &str) -> Result<Vec<String>, StoreError> {
        self.check_available()?;
        self.databases
            .borrow()
            .iter()
            .find(|db| db.name == database)
            .map(|db| db.collections.iter().map(|c| c.name.clone()).collect())
            .ok_or_else(|| StoreError::UnknownDatabase(database.to_string()))
    }

    fn open_cursor(&self, collection: &CollectionRef) -> Result<DocumentCursor, StoreError> {
        self.check_available()?;
        let databases = self.databases.borrow();
        let documents = find_collection(&databases, collection)
            .ok_or_else(|| StoreError::UnknownCollection(collection.to_string()))?
            .documents
            .clone();
        Ok(Box::new(documents.into_iter().map(Ok)))
    }

    fn find_by_identifier(
        &self,
        collection: &CollectionRef,
        id: &Value,
    ) -> Result<Option<Document>, StoreError> {
        self.check_available()?;
        let databases = self.databases.borrow();
        Ok(find_collection(&databases, collection)
            .and_then(|coll| coll.documents.iter().find(|doc| doc.id() == Some(id)))
            .cloned())
    }

    fn replace_whole(&self, collection: &CollectionRef, document: &Document) -> Result<(), StoreError> {
        self.check_available()?;
        let id = document.id().ok_or(StoreError::MissingIdentifier)?;
        self.database_mut(&collection.database, |db| {
            let documents = &mut collection_mut(db, &collection.name).documents;
            match documents.iter_mut().find(|doc| doc.id() == Some(id)) {
                Some(slot) => *slot = document.clone(),
                None => documents.push(document.clone()),
            }
        });
        self.replaced
            .borrow_mut()
            .push((collection.clone(), document.clone()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"{
        "shop": {
            "orders": [
                {"_id": "ObjectId('507f191e810c19729de860ea')", "total": 12.5},
                {"_id": 2, "total": 3}
            ],
            "users": [{"_id": "alice", "name": "Alice"}]
        },
        "empty": {}
    }"#;

    fn orders() -> CollectionRef {
        CollectionRef::new("shop", "orders")
    }

    #[test]
    fn test_fixture_keeps_declared_order() {
        let store = MemoryStore::from_json_str(FIXTURE).unwrap();
        assert_eq!(store.list_databases().unwrap(), ["shop", "empty"]);
        assert_eq!(store.list_collections("shop").unwrap(), ["orders", "users"]);
        assert!(store.list_collections("empty").unwrap().is_empty());
    }

    #[test]
    fn test_fixture_decodes_tagged_identifiers() {
        let store = MemoryStore::from_json_str(FIXTURE).unwrap();
        let docs: Vec<_> = store
            .open_cursor(&orders())
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert!(matches!(docs[0].id(), Some(Value::ObjectId(_))));
        assert_eq!(docs[1].id(), Some(&Value::Int(2)));
    }

    #[test]
    fn test_fixture_rejects_bad_shapes() {
        assert!(MemoryStore::from_json_str("[]").is_err());
        assert!(MemoryStore::from_json_str(r#"{"db": []}"#).is_err());
        assert!(MemoryStore::from_json_str(r#"{"db": {"c": [1]}}"#).is_err());
        let err = MemoryStore::from_json_str(r#"{"db": {"c": [{"_id": "ObjectId('zz')"}]}}"#)
            .unwrap_err();
        assert!(format!("{err:#}").contains("db.c[0]"));
    }

    #[test]
    fn test_unknown_names() {
        let store = MemoryStore::from_json_str(FIXTURE).unwrap();
        assert_eq!(
            store.list_collections("nope"),
            Err(StoreError::UnknownDatabase("nope".to_string()))
        );
        assert!(matches!(
            store.open_cursor(&CollectionRef::new("shop", "nope")),
            Err(StoreError::UnknownCollection(_))
        ));
    }

    #[test]
    fn test_find_by_identifier_hit_and_miss() {
        let store = MemoryStore::from_json_str(FIXTURE).unwrap();
        let found = store.find_by_identifier(&orders(), &Value::Int(2)).unwrap();
        assert_eq!(found.unwrap().get("total"), Some(&Value::Int(3)));
        assert_eq!(store.find_by_identifier(&orders(), &Value::Int(9)).unwrap(), None);
    }

    #[test]
    fn test_replace_whole_updates_in_place_and_records() {
        let store = MemoryStore::from_json_str(FIXTURE).unwrap();
        let mut doc = Document::new();
        doc.insert("_id", 2);
        doc.insert("total", 4);
        store.replace_whole(&orders(), &doc).unwrap();

        let docs = store.documents(&orders()).unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[1], doc);
        assert_eq!(store.replaced(), vec![(orders(), doc)]);
    }

    #[test]
    fn test_replace_whole_inserts_unknown_identifier() {
        let store = MemoryStore::new();
        let mut doc = Document::new();
        doc.insert("_id", "new");
        store.replace_whole(&orders(), &doc).unwrap();
        assert_eq!(store.documents(&orders()).unwrap(), vec![doc]);
    }

    #[test]
    fn test_replace_whole_requires_identifier() {
        let store = MemoryStore::new();
        assert_eq!(
            store.replace_whole(&orders(), &Document::new()),
            Err(StoreError::MissingIdentifier)
        );
        assert!(store.replaced().is_empty());
    }

    #[test]
    fn test_unavailable_store_fails_every_call() {
        let store = MemoryStore::from_json_str(FIXTURE).unwrap();
        store.set_unavailable(true);
        assert!(matches!(store.list_databases(), Err(StoreError::Unavailable(_))));
        assert!(store.open_cursor(&orders()).is_err());
        store.set_unavailable(false);
        assert!(store.list_databases().is_ok());
    }

    #[test]
    fn test_cursor_is_a_snapshot() {
        let store = MemoryStore::from_json_str(FIXTURE).unwrap();
        let cursor = store.open_cursor(&orders()).unwrap();
        let mut doc = Document::new();
        doc.insert("_id", 3);
        store.replace_whole(&orders(), &doc).unwrap();
        assert_eq!(cursor.count(), 2);
    }
}
