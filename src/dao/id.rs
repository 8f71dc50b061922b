//! Opaque entity identifiers shared by every storage backend.

use std::{
    fmt,
    str::FromStr,
    time::{SystemTime, UNIX_EPOCH},
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of hexadecimal characters in a well-formed identifier.
pub const ENTITY_ID_LENGTH: usize = 24;

/// Identifier of a game, review or user document.
///
/// The textual form is 24 lowercase hexadecimal characters, which is also the
/// canonical form of a MongoDB `ObjectId`, so ids round-trip between backends.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EntityId(String);

/// Raised when a client-supplied identifier is not 24 hexadecimal characters.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("`{0}` is not a valid identifier (expected 24 hexadecimal characters)")]
pub struct InvalidEntityId(pub String);

impl EntityId {
    /// Parse and normalise an identifier.
    pub fn parse(raw: &str) -> Result<Self, InvalidEntityId> {
        let trimmed = raw.trim();
        if trimmed.len() != ENTITY_ID_LENGTH || !trimmed.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(InvalidEntityId(raw.to_owned()));
        }
        Ok(Self(trimmed.to_ascii_lowercase()))
    }

    /// Generate a fresh identifier: 4 bytes of big-endian unix seconds followed by
    /// 8 random bytes, so ids sort roughly by creation time.
    pub fn generate() -> Self {
        let seconds = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs() as u32)
            .unwrap_or_default();
        let random: [u8; 8] = rand::random();

        let mut hex = String::with_capacity(ENTITY_ID_LENGTH);
        for byte in seconds.to_be_bytes().iter().chain(random.iter()) {
            hex.push_str(&format!("{byte:02x}"));
        }
        Self(hex)
    }

    /// Borrow the textual form.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Decode into the 12 raw bytes the hex form encodes.
    pub fn to_bytes(&self) -> [u8; 12] {
        let mut bytes = [0u8; 12];
        for (index, byte) in bytes.iter_mut().enumerate() {
            let pair = &self.0[index * 2..index * 2 + 2];
            *byte = u8::from_str_radix(pair, 16).unwrap_or_default();
        }
        bytes
    }
}

#[cfg(feature = "mongo-store")]
impl From<mongodb::bson::oid::ObjectId> for EntityId {
    fn from(value: mongodb::bson::oid::ObjectId) -> Self {
        Self(value.to_hex())
    }
}

#[cfg(feature = "mongo-store")]
impl From<&EntityId> for mongodb::bson::oid::ObjectId {
    fn from(value: &EntityId) -> Self {
        mongodb::bson::oid::ObjectId::from_bytes(value.to_bytes())
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for EntityId {
    type Err = InvalidEntityId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for EntityId {
    type Error = InvalidEntityId;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<EntityId> for String {
    fn from(value: EntityId) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_object_id_format() {
        let id = EntityId::parse("64B7F0C2A1D3E4F5A6B7C8D9").unwrap();
        assert_eq!(id.as_str(), "64b7f0c2a1d3e4f5a6b7c8d9");
    }

    #[test]
    fn parse_rejects_malformed_ids() {
        assert!(EntityId::parse("").is_err());
        assert!(EntityId::parse("64b7f0c2a1d3e4f5a6b7c8d").is_err()); // too short
        assert!(EntityId::parse("64b7f0c2a1d3e4f5a6b7c8d9a").is_err()); // too long
        assert!(EntityId::parse("64b7f0c2a1d3e4f5a6b7c8zz").is_err()); // not hex
    }

    #[test]
    fn generated_ids_are_valid_and_distinct() {
        let first = EntityId::generate();
        let second = EntityId::generate();
        assert_ne!(first, second);
        assert_eq!(EntityId::parse(first.as_str()).unwrap(), first);
    }

    #[test]
    fn bytes_match_hex_form() {
        let id = EntityId::parse("000102030405060708090aff").unwrap();
        assert_eq!(id.to_bytes(), [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 255]);
    }

    #[test]
    fn deserialization_validates() {
        let ok: Result<EntityId, _> = serde_json::from_str("\"64b7f0c2a1d3e4f5a6b7c8d9\"");
        assert!(ok.is_ok());
        let bad: Result<EntityId, _> = serde_json::from_str("\"nope\"");
        assert!(bad.is_err());
    }
}
