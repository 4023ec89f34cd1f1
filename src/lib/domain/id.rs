use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};
use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("token is not a valid todo identifier")]
pub struct ParseIdError;

/// A store-specific todo identifier, parsed from a path token through `FromStr`.
pub trait TodoKey:
    FromStr<Err = ParseIdError>
    + fmt::Display
    + fmt::Debug
    + Clone
    + PartialEq
    + Serialize
    + Send
    + Sync
    + 'static
{
}

/// Document identifier: a BSON object id, rendered as 24 lowercase hex
/// characters on the wire.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectId(bson::oid::ObjectId);

impl ObjectId {
    pub fn new() -> Self {
        Self(bson::oid::ObjectId::new())
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<bson::oid::ObjectId> for ObjectId {
    fn from(oid: bson::oid::ObjectId) -> Self {
        Self(oid)
    }
}

impl From<ObjectId> for bson::oid::ObjectId {
    fn from(id: ObjectId) -> Self {
        id.0
    }
}

impl FromStr for ObjectId {
    type Err = ParseIdError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        bson::oid::ObjectId::parse_str(token)
            .map(Self)
            .map_err(|_| ParseIdError)
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.to_hex())
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({self})")
    }
}

impl Serialize for ObjectId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl TodoKey for ObjectId {}

/// Positive integer key handed out by a relational sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct SeqId(i64);

impl SeqId {
    pub fn new(value: i64) -> Option<Self> {
        (value > 0).then_some(Self(value))
    }

    pub fn get(&self) -> i64 {
        self.0
    }
}

impl FromStr for SeqId {
    type Err = ParseIdError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ParseIdError);
        }
        token
            .parse::<i64>()
            .ok()
            .and_then(SeqId::new)
            .ok_or(ParseIdError)
    }
}

impl fmt::Display for SeqId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TodoKey for SeqId {}

/// A parsed key along with the exact token the caller sent. `Display`
/// renders the token, so messages echo the id as it appeared in the path.
#[derive(Debug, Clone, PartialEq)]
pub struct TodoId<K> {
    key: K,
    token: String,
}

impl<K: TodoKey> TodoId<K> {
    pub fn key(&self) -> &K {
        &self.key
    }
}

impl<K: TodoKey> From<K> for TodoId<K> {
    fn from(key: K) -> Self {
        let token = key.to_string();
        Self { key, token }
    }
}

impl<K: TodoKey> FromStr for TodoId<K> {
    type Err = ParseIdError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        Ok(Self {
            key: token.parse()?,
            token: token.to_owned(),
        })
    }
}

impl<K> fmt::Display for TodoId<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_id_round_trips_through_its_hex_form() {
        let id = ObjectId::new();
        let hex = id.to_string();
        assert_eq!(hex.len(), 24);
        assert!(hex.bytes().all(|b| b.is_ascii_hexdigit() && !b.is_ascii_uppercase()));
        assert_eq!(hex.parse::<ObjectId>(), Ok(id));
    }

    #[test]
    fn object_ids_are_unique_within_a_process() {
        let ids: Vec<_> = (0..16).map(|_| ObjectId::new()).collect();
        for (i, id) in ids.iter().enumerate() {
            assert!(!ids[i + 1..].contains(id), "{id} generated twice");
        }
    }

    #[test]
    fn object_id_accepts_uppercase_hex() {
        let id: ObjectId = "507F1F77BCF86CD799439011".parse().unwrap();
        assert_eq!(id.to_string(), "507f1f77bcf86cd799439011");
    }

    #[test]
    fn object_id_rejects_malformed_tokens() {
        for token in [
            "",
            "dog",
            "true",
            "507f1f77bcf86cd79943901",
            "507f1f77bcf86cd7994390111",
            "507f1f77bcf86cd79943901g",
            "+07f1f77bcf86cd799439011",
        ] {
            assert_eq!(token.parse::<ObjectId>(), Err(ParseIdError), "{token}");
        }
    }

    #[test]
    fn object_id_serializes_as_a_string() {
        let id: ObjectId = "65f0c0ffee0000000000beef".parse().unwrap();
        assert_eq!(
            serde_json::to_value(id).unwrap(),
            serde_json::json!("65f0c0ffee0000000000beef")
        );
    }

    #[test]
    fn object_id_converts_to_and_from_bson() {
        let oid = bson::oid::ObjectId::new();
        let id = ObjectId::from(oid);
        assert_eq!(id.to_string(), oid.to_hex());
        assert_eq!(bson::oid::ObjectId::from(id), oid);
    }

    #[test]
    fn seq_id_accepts_positive_integers_only() {
        assert_eq!("1".parse::<SeqId>().map(|id| id.get()), Ok(1));
        assert_eq!("2000".parse::<SeqId>().map(|id| id.get()), Ok(2000));
        assert_eq!("0042".parse::<SeqId>().map(|id| id.get()), Ok(42));
        for token in ["0", "-1", "+1", "1.5", "dog", "true", "", "99999999999999999999"] {
            assert_eq!(token.parse::<SeqId>(), Err(ParseIdError), "{token}");
        }
    }

    #[test]
    fn seq_id_serializes_as_a_number() {
        let id = SeqId::new(3).unwrap();
        assert_eq!(serde_json::to_value(id).unwrap(), serde_json::json!(3));
    }

    #[test]
    fn todo_id_keeps_the_token_as_sent() {
        let id: TodoId<ObjectId> = "65F0C0FFEE0000000000BEEF".parse().unwrap();
        assert_eq!(id.to_string(), "65F0C0FFEE0000000000BEEF");
        assert_eq!(id.key().to_string(), "65f0c0ffee0000000000beef");

        let id: TodoId<SeqId> = "0042".parse().unwrap();
        assert_eq!(id.to_string(), "0042");
        assert_eq!(id.key().get(), 42);

        let id = TodoId::from(SeqId::new(7).unwrap());
        assert_eq!(id.to_string(), "7");
    }
}
