use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

const MAX_USER_ID_LEN: usize = 128;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid user id: {0:?}")]
pub struct InvalidUserId(pub String);

/// A Supabase auth user identifier.
///
/// Wraps String as Supabase issues UUIDs, but the profile tables only ever
/// compare them as opaque text. Ids end up in storage keys, so anything coming
/// from outside goes through [`UserId::parse`]; deserializing does too.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub struct UserId(String);

impl UserId {
    /// Wrap an id that is already known to be well formed.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Accepts UUIDs and other ids made of ASCII letters, digits, `-` and `_`.
    pub fn parse(id: impl Into<String>) -> Result<Self, InvalidUserId> {
        let id = id.into();
        let well_formed = !id.is_empty()
            && id.len() <= MAX_USER_ID_LEN
            && id
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');

        if well_formed {
            Ok(Self(id))
        } else {
            Err(InvalidUserId(id))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for UserId {
    type Error = InvalidUserId;

    fn try_from(id: String) -> Result<Self, Self::Error> {
        Self::parse(id)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for UserId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_uuids_and_plain_ids() {
        for id in ["3f0e1c9a-8d4b-4c1e-9a57-2b6d0f1e7c42", "u1", "user_42-a"] {
            assert_eq!(UserId::parse(id).unwrap().as_str(), id);
        }
    }

    #[test]
    fn rejects_ids_that_could_escape_a_storage_key() {
        for id in ["", "u2/../u1", "..", "a?b", "a#b", "a b", "ü"] {
            assert_eq!(UserId::parse(id), Err(InvalidUserId(id.to_string())));
        }
        assert!(UserId::parse("a".repeat(MAX_USER_ID_LEN + 1)).is_err());
    }

    #[test]
    fn deserializing_validates() {
        let id: UserId = serde_json::from_str(r#""u1""#).unwrap();
        assert_eq!(id, UserId::new("u1"));

        assert!(serde_json::from_str::<UserId>(r#""u2/../u1""#).is_err());
    }
}
