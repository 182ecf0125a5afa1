//! Winners returned by the server after the draw.

use crate::bet::RESERVED_CHARS;
use crate::error::{BetError, BetResult};

/// Separator between the message prefix and the DNI list.
const PREFIX_SEPARATOR: char = ':';

/// Separator between DNIs.
const DNI_SEPARATOR: char = ',';

const DNI: &str = "DNI";

/// DNIs of the winning bets for one agency, in server order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Winners {
    dnis: Vec<String>,
}

impl Winners {
    pub fn new(dnis: Vec<String>) -> Self {
        Self { dnis }
    }

    /// Builds a list whose wire form parses back to the same DNIs.
    ///
    /// Rejects empty DNIs, DNIs with surrounding whitespace, and DNIs
    /// containing a separator.
    pub fn try_from_dnis<I, T>(dnis: I) -> BetResult<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        dnis.into_iter()
            .map(|dni| checked_dni(dni.into()))
            .collect::<BetResult<Vec<_>>>()
            .map(Self::new)
    }

    /// Parses a `PREFIX:dni1,dni2,...` payload.
    ///
    /// A payload without `:`, or with nothing but whitespace after it,
    /// yields no winners. Order and duplicates are preserved.
    pub fn parse(payload: &str) -> Self {
        let Some((_, rest)) = payload.split_once(PREFIX_SEPARATOR) else {
            return Self::default();
        };

        let rest = rest.trim();
        if rest.is_empty() {
            return Self::default();
        }

        Self {
            dnis: rest.split(DNI_SEPARATOR).map(str::to_string).collect(),
        }
    }

    /// Number of winners.
    pub fn len(&self) -> usize {
        self.dnis.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dnis.is_empty()
    }

    pub fn contains(&self, dni: &str) -> bool {
        self.dnis.iter().any(|d| d == dni)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.dnis.iter()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.dnis
    }

    pub fn into_vec(self) -> Vec<String> {
        self.dnis
    }
}

fn checked_dni(dni: String) -> BetResult<String> {
    if dni.is_empty() {
        return Err(BetError::EmptyField(DNI));
    }
    if dni.trim() != dni {
        return Err(BetError::SurroundingWhitespace(DNI));
    }
    if let Some(ch) = dni.chars().find(|c| RESERVED_CHARS.contains(c)) {
        return Err(BetError::ReservedCharacter { field: DNI, ch });
    }
    Ok(dni)
}

impl FromIterator<String> for Winners {
    fn from_iter<T: IntoIterator<Item = String>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Winners {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.dnis.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_list_yields_no_winners() {
        let winners = Winners::parse("WINNERS:");
        assert_eq!(winners.len(), 0);
        assert!(winners.is_empty());
    }

    #[test]
    fn whitespace_only_list_yields_no_winners() {
        assert!(Winners::parse("WINNERS:  \n").is_empty());
    }

    #[test]
    fn parses_list_in_order() {
        let winners = Winners::parse("WINNERS:111,222");
        assert_eq!(winners.len(), 2);
        assert_eq!(winners.as_slice(), ["111", "222"]);
    }

    #[test]
    fn missing_prefix_yields_no_winners() {
        assert!(Winners::parse("NOPREFIX").is_empty());
    }

    #[test]
    fn keeps_duplicates() {
        let winners = Winners::parse("WINNERS:5,5,6");
        assert_eq!(winners.into_vec(), vec!["5", "5", "6"]);
    }

    #[test]
    fn checked_list_rejects_unencodable_dnis() {
        assert_eq!(
            Winners::try_from_dnis([""]),
            Err(BetError::EmptyField("DNI"))
        );
        assert_eq!(
            Winners::try_from_dnis(["1 "]),
            Err(BetError::SurroundingWhitespace("DNI"))
        );
        assert_eq!(
            Winners::try_from_dnis(["a,b"]),
            Err(BetError::ReservedCharacter { field: "DNI", ch: ',' })
        );

        let winners = Winners::try_from_dnis(["111", "222"]).unwrap();
        assert_eq!(winners.as_slice(), ["111", "222"]);
    }

    #[test]
    fn splits_on_first_colon_only() {
        let winners = Winners::parse("WINNERS:a:b,c");
        assert_eq!(winners.as_slice(), ["a:b", "c"]);
        assert!(winners.contains("c"));
    }
}
