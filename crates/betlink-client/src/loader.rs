//! Reading an agency's bets from CSV.
//!
//! Each non-blank line holds one bet:
//!
//! ```text
//! first_name,last_name,dni,birth_date,number
//! Santiago Lionel,Lorca,30904465,1999-03-17,7574
//! ```
//!
//! The agency id is not part of the file; it comes from configuration and
//! is stamped on every bet. Values are not quoted or escaped.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::warn;

use betlink_core::{Bet, BetError};

/// Errors raised while loading bets.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The file could not be opened.
    #[error("failed to open {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Reading failed partway through the file.
    #[error("failed to read line {line}: {source}")]
    Read {
        line: usize,
        #[source]
        source: io::Error,
    },

    /// A line is not valid UTF-8.
    #[error("line {line}: not valid UTF-8")]
    Encoding { line: usize },

    /// A line has the wrong number of columns.
    #[error("line {line}: expected 5 columns, found {found}")]
    Columns { line: usize, found: usize },

    /// A line's values do not form a valid bet.
    #[error("line {line}: {source}")]
    Bet {
        line: usize,
        #[source]
        source: BetError,
    },
}

impl LoadError {
    /// Whether the rest of the file is unreadable, as opposed to one bad line.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Open { .. } | Self::Read { .. })
    }
}

/// Iterator over the bets in a CSV source.
pub struct BetReader<R> {
    reader: R,
    buf: Vec<u8>,
    agency: String,
    line: usize,
    failed: bool,
}

impl<R: BufRead> BetReader<R> {
    pub fn new(reader: R, agency: impl Into<String>) -> Self {
        Self {
            reader,
            buf: Vec::new(),
            agency: agency.into(),
            line: 0,
            failed: false,
        }
    }

    /// Yields only valid bets, logging and skipping malformed lines.
    ///
    /// Stops at the first read failure and stores it in `error`.
    pub fn valid_bets<'a>(
        &'a mut self,
        error: &'a mut Option<LoadError>,
    ) -> impl Iterator<Item = Bet> + 'a {
        self.by_ref().map_while(move |result| match result {
            Ok(bet) => Some(Some(bet)),
            Err(e) if e.is_fatal() => {
                *error = Some(e);
                None
            }
            Err(e) => {
                warn!(action = "load_bet", result = "skip", error = %e);
                Some(None)
            }
        })
        .flatten()
    }

    fn parse_line(&self, text: &str) -> Result<Bet, LoadError> {
        let columns: Vec<&str> = text.split(',').map(str::trim).collect();
        let &[first_name, last_name, dni, birth_date, number] = columns.as_slice() else {
            return Err(LoadError::Columns {
                line: self.line,
                found: columns.len(),
            });
        };

        Bet::from_text(
            self.agency.as_str(),
            first_name,
            last_name,
            number,
            birth_date,
            dni,
        )
        .map_err(|source| LoadError::Bet {
            line: self.line,
            source,
        })
    }
}

impl<R: BufRead> Iterator for BetReader<R> {
    type Item = Result<Bet, LoadError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        loop {
            self.line += 1;
            self.buf.clear();
            match self.reader.read_until(b'\n', &mut self.buf) {
                Ok(0) => return None,
                Ok(_) => {}
                Err(source) => {
                    self.failed = true;
                    return Some(Err(LoadError::Read {
                        line: self.line,
                        source,
                    }));
                }
            }

            // The bad line is already consumed, so the next one is still readable.
            let Ok(text) = std::str::from_utf8(&self.buf) else {
                return Some(Err(LoadError::Encoding { line: self.line }));
            };
            let text = text.trim_end_matches(['\n', '\r']);
            if text.trim().is_empty() {
                continue;
            }
            return Some(self.parse_line(text));
        }
    }
}

/// Opens a CSV file of bets for `agency`.
pub fn load_bets(
    path: impl AsRef<Path>,
    agency: impl Into<String>,
) -> Result<BetReader<BufReader<File>>, LoadError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| LoadError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(BetReader::new(BufReader::new(file), agency))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Read, Write};

    fn reader(text: &str) -> BetReader<Cursor<Vec<u8>>> {
        BetReader::new(Cursor::new(text.as_bytes().to_vec()), "7")
    }

    #[test]
    fn reads_bets_in_order() {
        let bets: Vec<Bet> = reader(
            "Santiago Lionel,Lorca,30904465,1999-03-17,7574\nJoaquin,Diaz,12345678,2000-01-02,13\n",
        )
        .collect::<Result<_, _>>()
        .unwrap();

        assert_eq!(bets.len(), 2);
        assert_eq!(bets[0].agency(), "7");
        assert_eq!(bets[0].first_name(), "Santiago Lionel");
        assert_eq!(bets[0].dni(), "30904465");
        assert_eq!(bets[0].number(), 7574);
        assert_eq!(bets[1].last_name(), "Diaz");
    }

    #[test]
    fn skips_blank_lines_and_carriage_returns() {
        let bets: Vec<Bet> = reader("\r\nAna,Paz,1,1990-05-05,2\r\n\n   \nLuz,Sol,3,1991-06-06,4")
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(bets.len(), 2);
        assert_eq!(bets[0].number(), 2);
        assert_eq!(bets[1].dni(), "3");
    }

    #[test]
    fn reports_line_numbers() {
        let results: Vec<_> = reader("Ana,Paz,1,1990-05-05,2\nAna,Paz,1\n\nAna,Paz,1,1990-05-05,x\n").collect();
        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        assert!(matches!(
            results[1],
            Err(LoadError::Columns { line: 2, found: 3 })
        ));
        assert!(matches!(
            results[2],
            Err(LoadError::Bet {
                line: 4,
                source: BetError::InvalidNumber(_)
            })
        ));
    }

    #[test]
    fn valid_bets_skips_malformed_lines() {
        let mut reader = reader("Ana,Paz,1,1990-05-05,2\nbroken\nLuz,Sol,3,1991-06-06,4\n");
        let mut error = None;
        let bets: Vec<Bet> = reader.valid_bets(&mut error).collect();
        assert_eq!(bets.len(), 2);
        assert!(error.is_none());
    }

    #[test]
    fn badly_encoded_line_is_skipped() {
        let mut data = b"Ana,Paz,1,1990-05-05,2\n".to_vec();
        data.extend_from_slice(b"Mu\xf1oz,Paz,2,1990-05-05,3\n");
        data.extend_from_slice(b"Luz,Sol,3,1991-06-06,4\n");

        let results: Vec<_> = BetReader::new(Cursor::new(data.clone()), "7").collect();
        assert_eq!(results.len(), 3);
        assert!(matches!(results[1], Err(LoadError::Encoding { line: 2 })));
        assert!(!results[1].as_ref().unwrap_err().is_fatal());

        let mut reader = BetReader::new(Cursor::new(data), "7");
        let mut error = None;
        let bets: Vec<Bet> = reader.valid_bets(&mut error).collect();
        assert!(error.is_none());
        assert_eq!(bets.len(), 2);
        assert_eq!(bets[1].first_name(), "Luz");
    }

    struct FailAfter {
        inner: Cursor<Vec<u8>>,
    }

    impl Read for FailAfter {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.inner.read(buf)? {
                0 => Err(io::Error::other("disk gone")),
                n => Ok(n),
            }
        }
    }

    #[test]
    fn read_failure_stops_iteration() {
        let source = FailAfter {
            inner: Cursor::new(b"Ana,Paz,1,1990-05-05,2\n".to_vec()),
        };
        let mut reader = BetReader::new(BufReader::new(source), "1");
        let mut error = None;
        let bets: Vec<Bet> = reader.valid_bets(&mut error).collect();

        assert_eq!(bets.len(), 1);
        assert!(matches!(error, Some(LoadError::Read { line: 2, .. })));
        assert!(reader.next().is_none());
    }

    #[test]
    fn load_bets_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "Ana,Paz,1,1990-05-05,2").unwrap();
        writeln!(file, "Luz,Sol,3,1991-06-06,4").unwrap();

        let bets: Vec<Bet> = load_bets(file.path(), "5")
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(bets.len(), 2);
        assert!(bets.iter().all(|b| b.agency() == "5"));
    }

    #[test]
    fn load_bets_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_bets(dir.path().join("agency-9.csv"), "9").err().unwrap();
        assert!(err.is_fatal());
        assert!(err.to_string().contains("agency-9.csv"));
    }
}
