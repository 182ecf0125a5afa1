//! Bet parsing and validation errors.

use thiserror::Error;

/// Result type for bet construction and parsing.
pub type BetResult<T> = Result<T, BetError>;

/// A bet record that failed validation or could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BetError {
    /// A field without a `=` separator.
    #[error("field without key/value separator: {0:?}")]
    MissingSeparator(String),

    /// A key outside the record vocabulary.
    #[error("unknown field: {0}")]
    UnknownField(String),

    /// The same key appeared twice.
    #[error("duplicate field: {0}")]
    DuplicateField(&'static str),

    /// A required key is absent.
    #[error("missing field: {0}")]
    MissingField(&'static str),

    /// A field value is empty.
    #[error("empty value for field {0}")]
    EmptyField(&'static str),

    /// A field value starts or ends with whitespace.
    #[error("field {0} has leading or trailing whitespace")]
    SurroundingWhitespace(&'static str),

    /// A field value contains a character reserved by the wire format.
    #[error("field {field} contains reserved character {ch:?}")]
    ReservedCharacter { field: &'static str, ch: char },

    /// `NUMBER` is not an integer.
    #[error("invalid number: {0:?}")]
    InvalidNumber(String),

    /// `BIRTH_DATE` is not a `YYYY-MM-DD` date.
    #[error("invalid birth date: {0:?}")]
    InvalidBirthDate(String),
}
