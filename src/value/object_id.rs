use std::fmt;
use std::str::FromStr;

/// Opaque 12-byte document identity assigned by the store.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId([u8; 12]);

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ObjectIdError {
    #[error("expected 24 hex characters, got {0}")]
    Length(usize),
    #[error("invalid hex: {0}")]
    Hex(#[from] hex::FromHexError),
}

impl ObjectId {
    pub const fn from_bytes(bytes: [u8; 12]) -> Self {
        Self(bytes)
    }

    pub const fn bytes(&self) -> [u8; 12] {
        self.0
    }

    /// Parse the 24-character hex form.
    ///
    /// # Errors
    ///
    /// Returns an error if `text` is not exactly 24 hex digits.
    pub fn parse_str(text: &str) -> Result<Self, ObjectIdError> {
        if text.len() != 24 {
            return Err(ObjectIdError::Length(text.len()));
        }
        let mut bytes = [0u8; 12];
        hex::decode_to_slice(text, &mut bytes)?;
        Ok(Self(bytes))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl FromStr for ObjectId {
    type Err = ObjectIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_str(s)
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({})", self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display_hex() {
        let oid = ObjectId::parse_str("507f191e810c19729de860ea").unwrap();
        assert_eq!(oid.to_string(), "507f191e810c19729de860ea");
        assert_eq!(oid.bytes()[0], 0x50);
    }

    #[test]
    fn test_parse_accepts_uppercase_hex() {
        let oid: ObjectId = "507F191E810C19729DE860EA".parse().unwrap();
        assert_eq!(oid.to_hex(), "507f191e810c19729de860ea");
    }

    #[test]
    fn test_parse_rejects_wrong_length() {
        assert_eq!(
            ObjectId::parse_str("507f"),
            Err(ObjectIdError::Length(4))
        );
    }

    #[test]
    fn test_parse_rejects_non_hex() {
        assert!(matches!(
            ObjectId::parse_str("zz7f191e810c19729de860ea"),
            Err(ObjectIdError::Hex(_))
        ));
    }
}
