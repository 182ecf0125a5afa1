//! Core types: bets, batching, winners, tracing setup
//!
//! A [`Bet`] is the unit of data an agency submits. Bets are grouped into
//! size-bounded [`Batch`]es before they go on the wire, and the server
//! answers a winners query with a list of DNIs parsed into [`Winners`].

pub mod batch;
pub mod bet;
pub mod error;
pub mod tracing;
pub mod winners;

pub use batch::{make_batches, Batch, BatchLimits, Batches};
pub use bet::Bet;
pub use error::{BetError, BetResult};
pub use tracing::{init_tracing, TracingConfig, TracingError, TracingOutputFormat};
pub use winners::Winners;

/// Soft ceiling, in bytes, for the serialized form of one batch.
pub const MAX_PACKET_SIZE: usize = 8192;

/// Default maximum number of bets per batch.
pub const DEFAULT_MAX_BATCH_AMOUNT: usize = 100;
