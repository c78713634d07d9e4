use chrono::Datelike;
use mongodb::bson::{self, Bson, doc};
use mongodb::options::ReplaceOptions;
use mongodb::sync::{Client, Collection};

use super::{CollectionRef, DocumentCursor, Store, StoreError};
use crate::perf;
use crate::value::{DbRef, Document, ID_FIELD, ObjectId, Value};

/// Server-backed store using the blocking driver.
#[derive(Debug, Clone)]
pub struct MongoStore {
    client: Client,
}

impl MongoStore {
    /// Create a client for `host:port`.
    ///
    /// The driver connects lazily; the first listing call is what proves
    /// the server is reachable.
    ///
    /// # Errors
    ///
    /// Fails if the connection string is rejected by the driver.
    pub fn connect(host: &str, port: u16) -> Result<Self, StoreError> {
        let uri = format!("mongodb://{host}:{port}/?appName=docnav&serverSelectionTimeoutMS=5000");
        let client = Client::with_uri_str(&uri).map_err(unavailable)?;
        tracing::debug!(%host, port, "created store client");
        Ok(Self { client })
    }

    fn collection(&self, collection: &CollectionRef) -> Collection<bson::Document> {
        self.client
            .database(&collection.database)
            .collection(&collection.name)
    }
}

#[allow(clippy::needless_pass_by_value)]
fn unavailable(err: mongodb::error::Error) -> StoreError {
    StoreError::Unavailable(err.to_string())
}

impl Store for MongoStore {
    fn list_databases(&self) -> Result<Vec<String>, StoreError> {
        let _scope = perf::scope("store.list_databases");
        self.client
            .list_database_names(None, None)
            .map_err(unavailable)
    }

    fn list_collections(&self, database: &str) -> Result<Vec<String>, StoreError> {
        let _scope = perf::scope("store.list_collections");
        self.client
            .database(database)
            .list_collection_names(None)
            .map_err(unavailable)
    }

    fn open_cursor(&self, collection: &CollectionRef) -> Result<DocumentCursor, StoreError> {
        let _scope = perf::scope("store.open_cursor");
        let cursor = self
            .collection(collection)
            .find(None, None)
            .map_err(unavailable)?;
        Ok(Box::new(
            cursor.map(|item| item.map_err(unavailable).and_then(from_stored_document)),
        ))
    }

    fn find_by_identifier(
        &self,
        collection: &CollectionRef,
        id: &Value,
    ) -> Result<Option<Document>, StoreError> {
        let _scope = perf::scope("store.find_by_identifier");
        self.collection(collection)
            .find_one(doc! { ID_FIELD: to_bson(id) }, None)
            .map_err(unavailable)?
            .map(from_stored_document)
            .transpose()
    }

    fn replace_whole(&self, collection: &CollectionRef, document: &Document) -> Result<(), StoreError> {
        let _scope = perf::scope("store.replace_whole");
        let id = document.id().ok_or(StoreError::MissingIdentifier)?;
        let filter = doc! { ID_FIELD: to_bson(id) };
        let mut outgoing = to_bson_document(document);
        if let Some(current) = self
            .collection(collection)
            .find_one(filter.clone(), None)
            .map_err(unavailable)?
        {
            match_integer_widths(&mut outgoing, &current);
        }
        let options = ReplaceOptions::builder().upsert(true).build();
        let result = self
            .collection(collection)
            .replace_one(filter, outgoing, options)
            .map_err(unavailable)?;
        tracing::debug!(
            %collection,
            matched = result.matched_count,
            upserted = result.upserted_id.is_some(),
            "replaced document"
        );
        Ok(())
    }
}

/// Convert a top-level document, naming its `_id` when a field has no value form.
fn from_stored_document(doc: bson::Document) -> Result<Document, StoreError> {
    let id = doc.get(ID_FIELD).map(ToString::to_string);
    from_bson_document(doc).map_err(|err| match (err, id) {
        (StoreError::Conversion(reason), Some(id)) => {
            tracing::warn!(%id, %reason, "skipping document that cannot be shown");
            StoreError::Conversion(format!("document {id}: {reason}"))
        }
        (err, _) => err,
    })
}

fn from_bson_document(doc: bson::Document) -> Result<Document, StoreError> {
    doc.into_iter()
        .map(|(key, value)| Ok::<_, StoreError>((key, from_bson(value)?)))
        .collect()
}

fn from_bson(value: Bson) -> Result<Value, StoreError> {
    Ok(match value {
        Bson::Null | Bson::Undefined => Value::Null,
        Bson::Boolean(b) => Value::Bool(b),
        Bson::Int32(n) => Value::Int(i64::from(n)),
        Bson::Int64(n) => Value::Int(n),
        Bson::Double(f) => Value::Float(f),
        Bson::String(s) => Value::String(s),
        Bson::ObjectId(oid) => Value::ObjectId(ObjectId::from_bytes(oid.bytes())),
        Bson::DateTime(dt) => {
            let millis = dt.timestamp_millis();
            // Years outside 0..=9999 have no RFC 3339 text form.
            let ts = chrono::DateTime::from_timestamp_millis(millis)
                .filter(|ts| (0..=9999).contains(&ts.year()))
                .ok_or_else(|| StoreError::Conversion(format!("datetime out of range: {millis}")))?;
            Value::Timestamp(ts)
        }
        Bson::Array(items) => Value::List(
            items
                .into_iter()
                .map(from_bson)
                .collect::<Result<Vec<_>, _>>()?,
        ),
        Bson::Document(doc) => match reference_parts(&doc) {
            Some((collection, id)) => Value::Reference(DbRef::new(collection, from_bson(id.clone())?)),
            None => Value::Document(from_bson_document(doc)?),
        },
        other => {
            return Err(StoreError::Conversion(format!(
                "unsupported BSON type {:?}",
                other.element_type()
            )));
        }
    })
}

/// `{"$ref": collection, "$id": id}` and nothing else.
fn reference_parts(doc: &bson::Document) -> Option<(&str, &Bson)> {
    if doc.len() != 2 {
        return None;
    }
    let collection = doc.get_str("$ref").ok()?;
    let id = doc.get("$id")?;
    Some((collection, id))
}

/// Keep integers 64-bit wherever the stored copy holds them as 64-bit.
///
/// [`Value::Int`] does not carry a width, so without this a save would
/// narrow every small `Int64` the user never touched.
fn match_integer_widths(outgoing: &mut bson::Document, stored: &bson::Document) {
    for (key, value) in outgoing.iter_mut() {
        if let Some(previous) = stored.get(key) {
            match_width(value, previous);
        }
    }
}

fn match_width(value: &mut Bson, stored: &Bson) {
    match stored {
        Bson::Int64(_) => {
            if let Bson::Int32(n) = *value {
                *value = Bson::Int64(i64::from(n));
            }
        }
        Bson::Array(previous) => {
            if let Bson::Array(items) = value {
                for (item, prev) in items.iter_mut().zip(previous) {
                    match_width(item, prev);
                }
            }
        }
        Bson::Document(previous) => {
            if let Bson::Document(fields) = value {
                match_integer_widths(fields, previous);
            }
        }
        _ => {}
    }
}

fn to_bson_document(doc: &Document) -> bson::Document {
    doc.iter()
        .map(|(key, value)| (key.to_string(), to_bson(value)))
        .collect()
}

fn to_bson(value: &Value) -> Bson {
    match value {
        Value::Null => Bson::Null,
        Value::Bool(b) => Bson::Boolean(*b),
        Value::Int(n) => i32::try_from(*n).map_or(Bson::Int64(*n), Bson::Int32),
        Value::Float(f) => Bson::Double(*f),
        Value::String(s) => Bson::String(s.clone()),
        Value::Timestamp(ts) => Bson::DateTime(bson::DateTime::from_millis(ts.timestamp_millis())),
        Value::Reference(dbref) => Bson::Document(doc! {
            "$ref": dbref.collection.clone(),
            "$id": to_bson(&dbref.id),
        }),
        Value::ObjectId(oid) => Bson::ObjectId(bson::oid::ObjectId::from_bytes(oid.bytes())),
        Value::List(items) => Bson::Array(items.iter().map(to_bson).collect()),
        Value::Document(doc) => Bson::Document(to_bson_document(doc)),
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    fn sample() -> Document {
        let mut address = Document::new();
        address.insert("city", "Oslo");
        let mut doc = Document::new();
        doc.insert("_id", ObjectId::parse_str("507f191e810c19729de860ea").unwrap());
        doc.insert("small", 7);
        doc.insert("big", 5_000_000_000_i64);
        doc.insert("ratio", 0.25);
        doc.insert(
            "when",
            Value::Timestamp(Utc.with_ymd_and_hms(2012, 1, 1, 8, 30, 0).unwrap()),
        );
        doc.insert("author", Value::Reference(DbRef::new("users", "alice")));
        doc.insert("tags", vec![Value::from("a"), Value::Null]);
        doc.insert("address", address);
        doc
    }

    #[test]
    fn test_conversion_round_trip() {
        let doc = sample();
        assert_eq!(from_bson_document(to_bson_document(&doc)).unwrap(), doc);
    }

    #[test]
    fn test_small_ints_are_stored_as_int32() {
        let bson = to_bson_document(&sample());
        assert_eq!(bson.get("small"), Some(&Bson::Int32(7)));
        assert_eq!(bson.get("big"), Some(&Bson::Int64(5_000_000_000)));
    }

    #[test]
    fn test_reference_uses_dbref_fields() {
        let bson = to_bson_document(&sample());
        let author = bson.get_document("author").unwrap();
        assert_eq!(author.get_str("$ref").unwrap(), "users");
        assert_eq!(author.get_str("$id").unwrap(), "alice");
    }

    #[test]
    fn test_dbref_with_extra_fields_stays_a_document() {
        let bson = doc! { "$ref": "users", "$id": 1, "$db": "other" };
        assert!(matches!(from_bson(Bson::Document(bson)).unwrap(), Value::Document(_)));
    }

    #[test]
    fn test_unedited_save_keeps_stored_integer_widths() {
        let stored = doc! {
            "_id": 1_i32,
            "count": 7_i64,
            "small": 3_i32,
            "history": [1_i64, 2_i32],
            "nested": { "total": 9_i64, "ref": { "$ref": "users", "$id": 4_i64 } },
        };
        let loaded = from_stored_document(stored.clone()).unwrap();
        let mut outgoing = to_bson_document(&loaded);
        assert_eq!(outgoing.get("count"), Some(&Bson::Int32(7)));
        match_integer_widths(&mut outgoing, &stored);
        assert_eq!(outgoing, stored);
    }

    #[test]
    fn test_edited_field_of_another_type_is_written_as_is() {
        let stored = doc! { "_id": 1, "count": 7_i64 };
        let mut outgoing = doc! { "_id": 1, "count": "seven" };
        match_integer_widths(&mut outgoing, &stored);
        assert_eq!(outgoing.get_str("count").unwrap(), "seven");
    }

    #[test]
    fn test_unconvertible_document_names_its_identifier() {
        let stored = doc! { "_id": 42, "code": Bson::JavaScriptCode("f()".to_string()) };
        let Err(StoreError::Conversion(reason)) = from_stored_document(stored) else {
            panic!("expected a conversion error");
        };
        assert!(reason.starts_with("document 42: "), "{reason}");
    }

    #[test]
    fn test_datetime_beyond_year_9999_is_rejected() {
        let far = bson::DateTime::from_millis(253_402_300_800_000);
        assert!(matches!(from_bson(Bson::DateTime(far)), Err(StoreError::Conversion(_))));
        let last = bson::DateTime::from_millis(253_402_300_799_999);
        assert!(matches!(from_bson(Bson::DateTime(last)), Ok(Value::Timestamp(_))));
    }

    #[test]
    fn test_unsupported_type_is_a_conversion_error() {
        let value = Bson::JavaScriptCode("function() {}".to_string());
        assert!(matches!(from_bson(value), Err(StoreError::Conversion(_))));
    }
}
