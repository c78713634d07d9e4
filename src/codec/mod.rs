//! Extended-value text codec.
//!
//! Values are shown and edited as JSON text. Types JSON has no notation for
//! (object ids, references, timestamps) travel as constructor-style strings,
//! see [`tagged`]. [`decode`] is the inverse of [`encode`]: for every value
//! `decode(&encode(&v)) == Ok(v)`, floats aside.
//!
//! A plain string whose content itself starts with a tag prefix cannot be
//! told apart from the tagged value and is decoded as the tagged type.

mod tagged;

pub use tagged::{
    DATETIME_TAG, DBREF_TAG, OBJECT_ID_TAG, TAG_PREFIXES, decode_tagged, encode_tagged, is_tagged,
};

use serde_json::{Map, Number, Value as Json};

use crate::value::{Document, Value};

/// Edited or stored text that does not decode to a value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("empty value")]
    Empty,
    #[error("invalid value `{token}`: {message}")]
    Syntax { token: String, message: String },
    #[error("malformed {tag} `{token}`: {reason}")]
    MalformedTag {
        tag: &'static str,
        token: String,
        reason: String,
    },
}

impl DecodeError {
    pub(crate) fn malformed(tag: &'static str, token: &str, reason: impl Into<String>) -> Self {
        Self::MalformedTag {
            tag,
            token: token.to_string(),
            reason: reason.into(),
        }
    }

    /// The text that failed to decode.
    pub fn token(&self) -> &str {
        match self {
            Self::Empty => "",
            Self::Syntax { token, .. } | Self::MalformedTag { token, .. } => token,
        }
    }
}

/// Render a value as editable text.
///
/// Tagged types are written bare at the top level (`ObjectId('…')`) and as
/// JSON strings inside lists and documents.
pub fn encode(value: &Value) -> String {
    encode_tagged(value).unwrap_or_else(|| to_json(value).to_string())
}

/// Parse edited text back into a value.
///
/// # Errors
///
/// Returns [`DecodeError`] for empty text, invalid JSON, or a malformed
/// tagged token anywhere in the structure.
pub fn decode(text: &str) -> Result<Value, DecodeError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(DecodeError::Empty);
    }
    if is_tagged(trimmed) {
        return decode_tagged(trimmed);
    }
    let json: Json = serde_json::from_str(trimmed).map_err(|err| DecodeError::Syntax {
        token: trimmed.to_string(),
        message: err.to_string(),
    })?;
    from_json(json)
}

/// Structured-text form of a value.
pub fn to_json(value: &Value) -> Json {
    if let Some(text) = encode_tagged(value) {
        return Json::String(text);
    }
    match value {
        Value::Null => Json::Null,
        Value::Bool(b) => Json::Bool(*b),
        Value::Int(n) => Json::Number(Number::from(*n)),
        Value::Float(f) => Number::from_f64(*f).map_or(Json::Null, Json::Number),
        Value::String(s) => Json::String(s.clone()),
        Value::List(items) => Json::Array(items.iter().map(to_json).collect()),
        Value::Document(doc) => Json::Object(
            doc.iter()
                .map(|(key, value)| (key.to_string(), to_json(value)))
                .collect(),
        ),
        Value::Timestamp(_) | Value::Reference(_) | Value::ObjectId(_) => Json::Null,
    }
}

/// Convert parsed structured text into a value, re-reading tagged strings.
///
/// # Errors
///
/// Fails when any string in the tree is a malformed tagged token.
pub fn from_json(json: Json) -> Result<Value, DecodeError> {
    Ok(match json {
        Json::Null => Value::Null,
        Json::Bool(b) => Value::Bool(b),
        Json::Number(n) => number_value(&n),
        Json::String(s) => decode_tagged(&s)?,
        Json::Array(items) => Value::List(
            items
                .into_iter()
                .map(from_json)
                .collect::<Result<Vec<_>, _>>()?,
        ),
        Json::Object(map) => Value::Document(object_hook(map)?),
    })
}

/// Decode one level of a JSON object.
///
/// Every string-valued field goes through [`decode_tagged`]; nested lists
/// and objects are handed back to [`from_json`].
///
/// # Errors
///
/// Fails on the first malformed tagged field.
pub fn object_hook(map: Map<String, Json>) -> Result<Document, DecodeError> {
    map.into_iter()
        .map(|(key, json)| {
            let value = match json {
                Json::String(s) => decode_tagged(&s)?,
                other => from_json(other)?,
            };
            Ok::<_, DecodeError>((key, value))
        })
        .collect()
}

// Integers past i64::MAX fall back to the nearest float.
fn number_value(n: &Number) -> Value {
    n.as_i64().map_or_else(
        || n.as_f64().map_or(Value::Null, Value::Float),
        Value::Int,
    )
}
