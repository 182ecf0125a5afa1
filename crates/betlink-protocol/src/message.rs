//! Control messages exchanged between agency and server.

use std::fmt;

use betlink_core::{BetResult, Winners};

const SUCCESS: &str = "SUCCESS";
const FAIL: &str = "FAIL";
const SERVER_SHUTDOWN: &str = "SERVER_SHUTDOWN";
const CLIENT_SHUTDOWN: &str = "CLIENT_SHUTDOWN";
const BETS_SENT: &str = "BETS_SENT";
const GET_WINNERS: &str = "GET_WINNERS";
const UNKNOWN: &str = "UNKNOWN";

/// Prefix of a winners response; the DNI list follows it.
pub const WINNERS_PREFIX: &str = "WINNERS:";

/// The closed vocabulary of control messages.
///
/// Tokens are case-sensitive. Decoding is total: text outside the
/// vocabulary becomes [`Message::Unknown`] rather than an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// The server stored the last batch.
    Success,
    /// The server rejected the last batch.
    Fail,
    /// The server is going away.
    ServerShutdown,
    /// The client is going away.
    ClientShutdown,
    /// The client has no more batches.
    BetsSent,
    /// The client asks for its agency's winners.
    GetWinners,
    /// The winners' DNIs.
    Winners(Winners),
    /// Anything that is not a known token.
    Unknown,
}

impl Message {
    /// Builds a winners response, refusing DNIs that would not decode
    /// back unchanged.
    pub fn winners<I, T>(dnis: I) -> BetResult<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Winners::try_from_dnis(dnis).map(Self::Winners)
    }

    /// Returns the wire token for this message.
    pub fn encode(&self) -> String {
        match self {
            Self::Winners(winners) => {
                let mut out = String::from(WINNERS_PREFIX);
                for (i, dni) in winners.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    out.push_str(dni);
                }
                out
            }
            other => other.token().to_string(),
        }
    }

    /// Decodes a wire token.
    pub fn decode(text: &str) -> Self {
        if text.starts_with(WINNERS_PREFIX) {
            return Self::Winners(Winners::parse(text));
        }

        match text {
            SUCCESS => Self::Success,
            FAIL => Self::Fail,
            SERVER_SHUTDOWN => Self::ServerShutdown,
            CLIENT_SHUTDOWN => Self::ClientShutdown,
            BETS_SENT => Self::BetsSent,
            GET_WINNERS => Self::GetWinners,
            _ => Self::Unknown,
        }
    }

    /// Returns true for either side's shutdown notice.
    pub fn is_shutdown(&self) -> bool {
        matches!(self, Self::ServerShutdown | Self::ClientShutdown)
    }

    fn token(&self) -> &'static str {
        match self {
            Self::Success => SUCCESS,
            Self::Fail => FAIL,
            Self::ServerShutdown => SERVER_SHUTDOWN,
            Self::ClientShutdown => CLIENT_SHUTDOWN,
            Self::BetsSent => BETS_SENT,
            Self::GetWinners => GET_WINNERS,
            Self::Winners(_) => WINNERS_PREFIX,
            Self::Unknown => UNKNOWN,
        }
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Winners(_) => f.write_str(&self.encode()),
            other => f.write_str(other.token()),
        }
    }
}

impl From<&str> for Message {
    fn from(text: &str) -> Self {
        Self::decode(text)
    }
}
