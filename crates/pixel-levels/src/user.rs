//! User identifiers and the persisted progression record.

use crate::outcome::InvalidInput;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Length of a community user identifier in decimal digits.
pub const USER_ID_LEN: usize = 18;

/// A validated 18-digit numeric user identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(String);

impl UserId {
    /// Validate a raw identifier.
    ///
    /// ```
    /// use pixel_levels::UserId;
    ///
    /// assert!(UserId::parse("123456789012345678").is_ok());
    /// assert!(UserId::parse("12345").is_err());
    /// assert!(UserId::parse("12345678901234567x").is_err());
    /// ```
    pub fn parse(raw: &str) -> Result<Self, InvalidInput> {
        if raw.len() == USER_ID_LEN && raw.bytes().all(|b| b.is_ascii_digit()) {
            Ok(Self(raw.to_string()))
        } else {
            Err(InvalidInput::MalformedUserId)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for UserId {
    type Error = InvalidInput;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        Self::parse(&raw)
    }
}

impl From<UserId> for String {
    fn from(id: UserId) -> Self {
        id.0
    }
}

/// Experience and level of one user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progression {
    pub exp: i64,
    pub level: i64,
}

impl Progression {
    pub fn new(exp: i64, level: i64) -> Self {
        Self { exp, level }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_wrong_length_and_non_digits() {
        assert_eq!(UserId::parse(""), Err(InvalidInput::MalformedUserId));
        assert_eq!(
            UserId::parse("1234567890123456789"),
            Err(InvalidInput::MalformedUserId)
        );
        assert_eq!(
            UserId::parse("-23456789012345678"),
            Err(InvalidInput::MalformedUserId)
        );
        assert_eq!(
            UserId::parse("１２３"),
            Err(InvalidInput::MalformedUserId)
        );
    }

    #[test]
    fn serde_goes_through_validation() {
        let id: UserId = serde_json::from_str("\"123456789012345678\"").unwrap();
        assert_eq!(id.as_str(), "123456789012345678");
        assert!(serde_json::from_str::<UserId>("\"nope\"").is_err());
    }

    #[test]
    fn new_record_starts_empty() {
        assert_eq!(Progression::default(), Progression::new(0, 0));
    }
}
