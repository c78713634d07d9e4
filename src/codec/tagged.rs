//! Constructor-style text for values plain JSON cannot carry.
//!
//! `ObjectId('…')`, `datetime('…')` and `DBRef('collection', id)` are the
//! only recognized forms. A string is treated as tagged only when it begins
//! with one of the full prefixes below, opening parenthesis included.
//! Inside a quoted argument `\\` and `\'` stand for a backslash and a quote.

use std::borrow::Cow;

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};

use super::DecodeError;
use crate::value::{DbRef, ObjectId, Value};

pub const OBJECT_ID_TAG: &str = "ObjectId(";
pub const DATETIME_TAG: &str = "datetime(";
pub const DBREF_TAG: &str = "DBRef(";

/// Every prefix that makes a string a tagged token.
pub const TAG_PREFIXES: [&str; 3] = [OBJECT_ID_TAG, DATETIME_TAG, DBREF_TAG];

pub fn is_tagged(text: &str) -> bool {
    TAG_PREFIXES.iter().any(|prefix| text.starts_with(prefix))
}

/// Tagged form of an `ObjectId`, `Timestamp` or `Reference`; `None` for anything else.
pub fn encode_tagged(value: &Value) -> Option<String> {
    match value {
        Value::ObjectId(oid) => Some(format!("ObjectId('{oid}')")),
        Value::Timestamp(ts) => Some(format!(
            "datetime('{}')",
            ts.to_rfc3339_opts(SecondsFormat::Millis, true)
        )),
        Value::Reference(dbref) => Some(format!(
            "DBRef('{}', {})",
            escape_quoted(&dbref.collection),
            super::encode(&dbref.id)
        )),
        _ => None,
    }
}

/// Decode a string that may hold a tagged token.
///
/// Strings without a recognized prefix come back unchanged as
/// [`Value::String`].
///
/// # Errors
///
/// Returns [`DecodeError::MalformedTag`] when the prefix matches but the
/// rest of the token does not parse.
pub fn decode_tagged(text: &str) -> Result<Value, DecodeError> {
    if text.starts_with(OBJECT_ID_TAG) {
        decode_object_id(text)
    } else if text.starts_with(DATETIME_TAG) {
        decode_datetime(text)
    } else if text.starts_with(DBREF_TAG) {
        decode_dbref(text)
    } else {
        Ok(Value::String(text.to_string()))
    }
}

fn decode_object_id(token: &str) -> Result<Value, DecodeError> {
    let tag = "ObjectId";
    let args = call_args(token, OBJECT_ID_TAG, tag)?;
    let hex = single_quoted_arg(token, args, tag)?;
    ObjectId::parse_str(&hex)
        .map(Value::ObjectId)
        .map_err(|err| DecodeError::malformed(tag, token, err.to_string()))
}

fn decode_datetime(token: &str) -> Result<Value, DecodeError> {
    let tag = "datetime";
    let args = call_args(token, DATETIME_TAG, tag)?;
    let text = single_quoted_arg(token, args, tag)?;
    DateTime::parse_from_rfc3339(&text)
        .map(|ts| Value::Timestamp(ts.with_timezone(&Utc).trunc_subsecs(3)))
        .map_err(|err| DecodeError::malformed(tag, token, err.to_string()))
}

fn decode_dbref(token: &str) -> Result<Value, DecodeError> {
    let tag = "DBRef";
    let args = call_args(token, DBREF_TAG, tag)?;
    let (collection, rest) = quoted(args.trim_start())
        .ok_or_else(|| DecodeError::malformed(tag, token, "expected a quoted collection name"))?;
    if collection.is_empty() {
        return Err(DecodeError::malformed(tag, token, "empty collection name"));
    }
    let id_text = rest
        .trim_start()
        .strip_prefix(',')
        .ok_or_else(|| DecodeError::malformed(tag, token, "expected `,` after the collection"))?
        .trim();
    let id = super::decode(id_text)
        .map_err(|err| DecodeError::malformed(tag, token, format!("bad id: {err}")))?;
    Ok(Value::Reference(DbRef::new(collection, id)))
}

/// Text between the opening prefix and the final `)`.
fn call_args<'a>(token: &'a str, prefix: &str, tag: &'static str) -> Result<&'a str, DecodeError> {
    token
        .strip_prefix(prefix)
        .and_then(|rest| rest.trim_end().strip_suffix(')'))
        .ok_or_else(|| DecodeError::malformed(tag, token, "missing closing `)`"))
}

fn single_quoted_arg<'a>(
    token: &str,
    args: &'a str,
    tag: &'static str,
) -> Result<Cow<'a, str>, DecodeError> {
    match quoted(args.trim()) {
        Some((inner, rest)) if rest.trim().is_empty() => Ok(inner),
        _ => Err(DecodeError::malformed(tag, token, "expected one quoted argument")),
    }
}

fn escape_quoted(text: &str) -> Cow<'_, str> {
    if text.contains(['\\', '\'']) {
        Cow::Owned(text.replace('\\', "\\\\").replace('\'', "\\'"))
    } else {
        Cow::Borrowed(text)
    }
}

/// Split a leading `'…'` or `"…"` literal off `text`, resolving `\` escapes.
fn quoted(text: &str) -> Option<(Cow<'_, str>, &str)> {
    let quote = text.chars().next().filter(|c| *c == '\'' || *c == '"')?;
    let body = &text[1..];
    let mut unescaped: Option<String> = None;
    let mut chars = body.char_indices();
    while let Some((idx, ch)) = chars.next() {
        if ch == quote {
            let inner = unescaped.map_or(Cow::Borrowed(&body[..idx]), Cow::Owned);
            return Some((inner, &body[idx + 1..]));
        }
        if ch == '\\' {
            let (_, escaped) = chars.next()?;
            unescaped
                .get_or_insert_with(|| body[..idx].to_string())
                .push(escaped);
        } else if let Some(buf) = unescaped.as_mut() {
            buf.push(ch);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike};

    #[test]
    fn test_is_tagged_requires_opening_paren() {
        assert!(is_tagged("ObjectId('x')"));
        assert!(is_tagged("DBRef("));
        assert!(!is_tagged("ObjectIdentifier"));
        assert!(!is_tagged("datetime"));
        assert!(!is_tagged(" ObjectId('x')"));
    }

    #[test]
    fn test_plain_string_passes_through() {
        assert_eq!(
            decode_tagged("ObjectIdentifier").unwrap(),
            Value::from("ObjectIdentifier")
        );
        assert_eq!(decode_tagged("").unwrap(), Value::from(""));
    }

    #[test]
    fn test_object_id_accepts_either_quote() {
        let single = decode_tagged("ObjectId('507f191e810c19729de860ea')").unwrap();
        let double = decode_tagged("ObjectId(\"507f191e810c19729de860ea\")").unwrap();
        assert_eq!(single, double);
        assert!(matches!(single, Value::ObjectId(_)));
    }

    #[test]
    fn test_object_id_without_close_fails_with_token() {
        let err = decode_tagged("ObjectId('507f191e810c19729de860ea'").unwrap_err();
        assert_eq!(err.token(), "ObjectId('507f191e810c19729de860ea'");
        assert!(err.to_string().contains("missing closing"));
    }

    #[test]
    fn test_object_id_bad_hex_fails() {
        assert!(decode_tagged("ObjectId('nothex')").is_err());
        assert!(decode_tagged("ObjectId()").is_err());
    }

    #[test]
    fn test_datetime_round_trip_text() {
        let ts = Utc.with_ymd_and_hms(2012, 1, 1, 8, 30, 0).unwrap();
        let text = encode_tagged(&Value::Timestamp(ts)).unwrap();
        assert_eq!(text, "datetime('2012-01-01T08:30:00.000Z')");
        assert_eq!(decode_tagged(&text).unwrap(), Value::Timestamp(ts));
    }

    #[test]
    fn test_datetime_accepts_offsets() {
        let value = decode_tagged("datetime('2012-01-01T10:30:00+02:00')").unwrap();
        let expected = Utc.with_ymd_and_hms(2012, 1, 1, 8, 30, 0).unwrap();
        assert_eq!(value, Value::Timestamp(expected));
    }

    #[test]
    fn test_datetime_garbage_fails() {
        assert!(decode_tagged("datetime('yesterday')").is_err());
    }

    #[test]
    fn test_dbref_with_object_id() {
        let text = "DBRef('users', ObjectId('507f191e810c19729de860ea'))";
        let value = decode_tagged(text).unwrap();
        let Value::Reference(dbref) = &value else {
            panic!("expected a reference, got {value:?}");
        };
        assert_eq!(dbref.collection, "users");
        assert!(matches!(*dbref.id, Value::ObjectId(_)));
        assert_eq!(encode_tagged(&value).unwrap(), text);
    }

    #[test]
    fn test_dbref_with_plain_ids() {
        assert_eq!(
            decode_tagged("DBRef('users', 42)").unwrap(),
            Value::Reference(DbRef::new("users", 42))
        );
        assert_eq!(
            decode_tagged("DBRef(\"users\", \"alice\")").unwrap(),
            Value::Reference(DbRef::new("users", "alice"))
        );
    }

    #[test]
    fn test_dbref_collection_with_quotes_round_trips() {
        for name in ["o'brien", "back\\slash", "say \"hi\"", "'"] {
            let value = Value::Reference(DbRef::new(name, 1));
            let text = encode_tagged(&value).unwrap();
            assert_eq!(decode_tagged(&text).unwrap(), value, "{text}");
        }
        assert_eq!(
            encode_tagged(&Value::Reference(DbRef::new("o'brien", 1))).unwrap(),
            "DBRef('o\\'brien', 1)"
        );
    }

    #[test]
    fn test_dangling_escape_is_malformed() {
        assert!(decode_tagged("DBRef('users\\").is_err());
        assert!(decode_tagged("DBRef('users\\', 1)").is_err());
    }

    #[test]
    fn test_datetime_truncates_to_milliseconds() {
        let value = decode_tagged("datetime('2012-01-01T00:00:00.123456Z')").unwrap();
        let expected = Utc
            .with_ymd_and_hms(2012, 1, 1, 0, 0, 0)
            .unwrap()
            .with_nanosecond(123_000_000)
            .unwrap();
        assert_eq!(value, Value::Timestamp(expected));
        let text = encode_tagged(&value).unwrap();
        assert_eq!(text, "datetime('2012-01-01T00:00:00.123Z')");
        assert_eq!(decode_tagged(&text).unwrap(), value);
    }

    #[test]
    fn test_dbref_malformed() {
        assert!(decode_tagged("DBRef(users, 42)").is_err());
        assert!(decode_tagged("DBRef('users' 42)").is_err());
        assert!(decode_tagged("DBRef('', 42)").is_err());
        assert!(decode_tagged("DBRef('users', )").is_err());
    }
}
