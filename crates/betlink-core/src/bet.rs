//! The bet record and its canonical wire text.
//!
//! A bet serializes to six `KEY=value` fields joined by `,`:
//!
//! ```text
//! AGENCY=1,FIRST_NAME=Ana,LAST_NAME=Paz,NUMBER=7574,BIRTH_DATE=1999-03-17,DNI=30904465
//! ```
//!
//! Values are never escaped, so construction rejects any value containing a
//! character the wire format reserves (see [`RESERVED_CHARS`]). Parsing
//! tokenizes on the separators instead of relying on field positions, so the
//! keys may arrive in any order.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;

use crate::error::{BetError, BetResult};

/// Separator between the fields of one bet.
pub const FIELD_SEPARATOR: char = ',';

/// Separator between a field key and its value.
pub const VALUE_SEPARATOR: char = '=';

/// Separator between bets inside a batch payload.
pub const RECORD_SEPARATOR: char = ';';

/// Characters that may not appear inside a field value.
pub const RESERVED_CHARS: [char; 4] = [FIELD_SEPARATOR, VALUE_SEPARATOR, RECORD_SEPARATOR, '\n'];

/// Format of `BIRTH_DATE` on the wire.
pub const BIRTH_DATE_FORMAT: &str = "%Y-%m-%d";

const AGENCY: &str = "AGENCY";
const FIRST_NAME: &str = "FIRST_NAME";
const LAST_NAME: &str = "LAST_NAME";
const NUMBER: &str = "NUMBER";
const BIRTH_DATE: &str = "BIRTH_DATE";
const DNI: &str = "DNI";

/// One bet placed at an agency.
///
/// Bets are immutable once built; every constructor validates the fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bet {
    agency: String,
    first_name: String,
    last_name: String,
    number: i64,
    birth_date: NaiveDate,
    dni: String,
    encoded_len: usize,
}

impl Bet {
    /// Builds a bet, validating that no text field is empty or contains a
    /// reserved wire character.
    pub fn new(
        agency: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        number: i64,
        birth_date: NaiveDate,
        dni: impl Into<String>,
    ) -> BetResult<Self> {
        let agency = checked_value(AGENCY, agency.into())?;
        let first_name = checked_value(FIRST_NAME, first_name.into())?;
        let last_name = checked_value(LAST_NAME, last_name.into())?;
        let dni = checked_value(DNI, dni.into())?;

        let mut bet = Self {
            agency,
            first_name,
            last_name,
            number,
            birth_date,
            dni,
            encoded_len: 0,
        };
        bet.encoded_len = bet.serialize().len();
        Ok(bet)
    }

    /// Builds a bet from raw text values, as read from a CSV row.
    pub fn from_text(
        agency: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        number: &str,
        birth_date: &str,
        dni: impl Into<String>,
    ) -> BetResult<Self> {
        Self::new(
            agency,
            first_name,
            last_name,
            parse_number(number)?,
            parse_birth_date(birth_date)?,
            dni,
        )
    }

    /// Parses the canonical `KEY=value,...` form.
    ///
    /// Every known key must appear exactly once; unknown keys are rejected.
    /// A record with too few fields fails on the first missing key.
    pub fn parse(text: &str) -> BetResult<Self> {
        let mut agency = None;
        let mut first_name = None;
        let mut last_name = None;
        let mut number = None;
        let mut birth_date = None;
        let mut dni = None;

        for field in text.split(FIELD_SEPARATOR) {
            let (key, value) = field
                .split_once(VALUE_SEPARATOR)
                .ok_or_else(|| BetError::MissingSeparator(field.to_string()))?;

            let (name, slot) = match key {
                AGENCY => (AGENCY, &mut agency),
                FIRST_NAME => (FIRST_NAME, &mut first_name),
                LAST_NAME => (LAST_NAME, &mut last_name),
                NUMBER => (NUMBER, &mut number),
                BIRTH_DATE => (BIRTH_DATE, &mut birth_date),
                DNI => (DNI, &mut dni),
                other => return Err(BetError::UnknownField(other.to_string())),
            };

            if slot.replace(value).is_some() {
                return Err(BetError::DuplicateField(name));
            }
        }

        Self::from_text(
            agency.ok_or(BetError::MissingField(AGENCY))?,
            first_name.ok_or(BetError::MissingField(FIRST_NAME))?,
            last_name.ok_or(BetError::MissingField(LAST_NAME))?,
            number.ok_or(BetError::MissingField(NUMBER))?,
            birth_date.ok_or(BetError::MissingField(BIRTH_DATE))?,
            dni.ok_or(BetError::MissingField(DNI))?,
        )
    }

    /// Returns the canonical wire text of this bet.
    pub fn serialize(&self) -> String {
        self.to_string()
    }

    /// Byte length of [`Bet::serialize`].
    pub fn serialized_len(&self) -> usize {
        self.encoded_len
    }

    pub fn agency(&self) -> &str {
        &self.agency
    }

    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    pub fn last_name(&self) -> &str {
        &self.last_name
    }

    pub fn number(&self) -> i64 {
        self.number
    }

    pub fn birth_date(&self) -> NaiveDate {
        self.birth_date
    }

    /// National identity document number.
    pub fn dni(&self) -> &str {
        &self.dni
    }
}

impl fmt::Display for Bet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{AGENCY}={},{FIRST_NAME}={},{LAST_NAME}={},{NUMBER}={},{BIRTH_DATE}={},{DNI}={}",
            self.agency,
            self.first_name,
            self.last_name,
            self.number,
            self.birth_date.format(BIRTH_DATE_FORMAT),
            self.dni,
        )
    }
}

impl FromStr for Bet {
    type Err = BetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Parses a `NUMBER` value.
pub fn parse_number(value: &str) -> BetResult<i64> {
    value
        .trim()
        .parse()
        .map_err(|_| BetError::InvalidNumber(value.to_string()))
}

/// Parses a `BIRTH_DATE` value in `YYYY-MM-DD` form.
pub fn parse_birth_date(value: &str) -> BetResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), BIRTH_DATE_FORMAT)
        .map_err(|_| BetError::InvalidBirthDate(value.to_string()))
}

fn checked_value(field: &'static str, value: String) -> BetResult<String> {
    if value.is_empty() {
        return Err(BetError::EmptyField(field));
    }
    if let Some(ch) = value.chars().find(|c| RESERVED_CHARS.contains(c)) {
        return Err(BetError::ReservedCharacter { field, ch });
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sample() -> Bet {
        Bet::new("1", "Santiago Lionel", "Lorca", 7574, date(1999, 3, 17), "30904465").unwrap()
    }

    #[test]
    fn serialize_uses_fixed_field_order() {
        insta::assert_snapshot!(
            sample().serialize(),
            @"AGENCY=1,FIRST_NAME=Santiago Lionel,LAST_NAME=Lorca,NUMBER=7574,BIRTH_DATE=1999-03-17,DNI=30904465"
        );
    }

    #[test]
    fn serialized_len_matches_text() {
        let bet = sample();
        assert_eq!(bet.serialized_len(), bet.serialize().len());
    }

    #[test]
    fn parse_roundtrip() {
        let bet = sample();
        assert_eq!(Bet::parse(&bet.serialize()).unwrap(), bet);
        assert_eq!(bet.serialize().parse::<Bet>().unwrap(), bet);
    }

    #[test]
    fn parse_accepts_reordered_fields() {
        let text = "DNI=30904465,NUMBER=7574,AGENCY=1,LAST_NAME=Lorca,BIRTH_DATE=1999-03-17,FIRST_NAME=Santiago Lionel";
        assert_eq!(Bet::parse(text).unwrap(), sample());
    }

    #[test]
    fn parse_rejects_unknown_key() {
        let text = "AGENCY=1,FIRST_NAME=A,LAST_NAME=B,NUMBER=1,BIRTH_DATE=2000-01-01,PASSPORT=2";
        assert_eq!(
            Bet::parse(text),
            Err(BetError::UnknownField("PASSPORT".to_string()))
        );
    }

    #[test]
    fn parse_rejects_duplicate_key() {
        let text = "AGENCY=1,AGENCY=2,LAST_NAME=B,NUMBER=1,BIRTH_DATE=2000-01-01,DNI=2";
        assert_eq!(Bet::parse(text), Err(BetError::DuplicateField("AGENCY")));
    }

    #[test]
    fn parse_rejects_missing_field() {
        let text = "AGENCY=1,FIRST_NAME=A,LAST_NAME=B,NUMBER=1,BIRTH_DATE=2000-01-01";
        assert_eq!(Bet::parse(text), Err(BetError::MissingField("DNI")));

        let text = "NUMBER=1,DNI=2";
        assert_eq!(Bet::parse(text), Err(BetError::MissingField("AGENCY")));
    }

    #[test]
    fn parse_rejects_extra_field() {
        let text = "AGENCY=1,FIRST_NAME=A,LAST_NAME=B,NUMBER=1,BIRTH_DATE=2000-01-01,DNI=2,DNI=3";
        assert_eq!(Bet::parse(text), Err(BetError::DuplicateField("DNI")));
    }

    #[test]
    fn parse_rejects_field_without_separator() {
        let text = "AGENCY=1,FIRST_NAME=A,LAST_NAME=B,NUMBER,BIRTH_DATE=2000-01-01,DNI=2";
        assert!(matches!(
            Bet::parse(text),
            Err(BetError::MissingSeparator(_))
        ));
    }

    #[test]
    fn parse_rejects_bad_number() {
        let text = "AGENCY=1,FIRST_NAME=A,LAST_NAME=B,NUMBER=seven,BIRTH_DATE=2000-01-01,DNI=2";
        assert_eq!(
            Bet::parse(text),
            Err(BetError::InvalidNumber("seven".to_string()))
        );
    }

    #[test]
    fn parse_rejects_bad_date() {
        let text = "AGENCY=1,FIRST_NAME=A,LAST_NAME=B,NUMBER=1,BIRTH_DATE=2000-13-01,DNI=2";
        assert!(matches!(
            Bet::parse(text),
            Err(BetError::InvalidBirthDate(_))
        ));
    }

    #[test]
    fn parse_rejects_empty_value() {
        let text = "AGENCY=1,FIRST_NAME=,LAST_NAME=B,NUMBER=1,BIRTH_DATE=2000-01-01,DNI=2";
        assert_eq!(Bet::parse(text), Err(BetError::EmptyField("FIRST_NAME")));
    }

    #[test]
    fn new_rejects_reserved_characters() {
        let err = Bet::new("1", "Ana;Maria", "Paz", 1, date(2000, 1, 1), "2").unwrap_err();
        assert_eq!(
            err,
            BetError::ReservedCharacter {
                field: "FIRST_NAME",
                ch: ';'
            }
        );

        let err = Bet::new("1", "Ana", "Paz", 1, date(2000, 1, 1), "2=3").unwrap_err();
        assert!(matches!(err, BetError::ReservedCharacter { field: "DNI", .. }));
    }

    #[test]
    fn from_text_parses_number_and_date() {
        let bet = Bet::from_text("3", "Ana", "Paz", " 42 ", "1980-07-02", "123").unwrap();
        assert_eq!(bet.number(), 42);
        assert_eq!(bet.birth_date(), date(1980, 7, 2));
        assert_eq!(bet.agency(), "3");
        assert_eq!(bet.dni(), "123");
    }

    #[test]
    fn negative_number_roundtrips() {
        let bet = Bet::new("1", "A", "B", -5, date(2000, 1, 1), "2").unwrap();
        assert_eq!(Bet::parse(&bet.serialize()).unwrap(), bet);
    }
}
