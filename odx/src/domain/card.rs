//! Fare card identifiers.

use std::fmt;

use serde::Serialize;

/// Error returned when parsing an invalid card id.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid card id: {reason}")]
pub struct InvalidCardId {
    reason: &'static str,
}

/// An opaque fare card identifier.
///
/// The value is never interpreted; it only groups the taps made with one
/// rider credential. Surrounding whitespace is stripped and the empty
/// string is rejected.
///
/// # Examples
///
/// ```
/// use odx::domain::CardId;
///
/// let card = CardId::parse(" 4411 ").unwrap();
/// assert_eq!(card.as_str(), "4411");
///
/// assert!(CardId::parse("").is_err());
/// assert!(CardId::parse("   ").is_err());
/// ```
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct CardId(String);

impl CardId {
    /// Parse a card id from a string.
    pub fn parse(s: &str) -> Result<Self, InvalidCardId> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(InvalidCardId {
                reason: "must not be empty",
            });
        }
        Ok(CardId(trimmed.to_string()))
    }

    /// Returns the card id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CardId({})", self.0)
    }
}

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
