//! Grouping bets into size-bounded batches.
//!
//! A batch goes on the wire as its bets joined by `;`. Batching honors two
//! ceilings: the number of bets, and the byte length of that joined text.
//! The byte ceiling is a packet-size hint rather than a validity rule, so a
//! bet that is larger than the ceiling on its own still ships, alone.

use std::vec;

use crate::bet::{Bet, RECORD_SEPARATOR};
use crate::error::BetResult;
use crate::{DEFAULT_MAX_BATCH_AMOUNT, MAX_PACKET_SIZE};

/// Ceilings applied while batching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchLimits {
    /// Maximum number of bets per batch. Never less than one.
    pub max_count: usize,
    /// Maximum byte length of a batch's joined serialization.
    pub max_bytes: usize,
}

impl BatchLimits {
    /// Creates limits; a `max_count` of zero is raised to one.
    pub fn new(max_count: usize, max_bytes: usize) -> Self {
        Self {
            max_count: max_count.max(1),
            max_bytes,
        }
    }
}

impl Default for BatchLimits {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_BATCH_AMOUNT, MAX_PACKET_SIZE)
    }
}

/// An ordered group of bets sent as one message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Batch {
    bets: Vec<Bet>,
    /// Sum of the bets' serialized lengths, separators excluded.
    record_bytes: usize,
}

impl Batch {
    /// Creates an empty batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a `;`-joined batch payload, failing on the first malformed bet.
    pub fn parse(text: &str) -> BetResult<Self> {
        let mut batch = Self::new();
        for record in text.split(RECORD_SEPARATOR) {
            batch.push(Bet::parse(record)?);
        }
        Ok(batch)
    }

    /// Number of bets in the batch.
    pub fn len(&self) -> usize {
        self.bets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bets.is_empty()
    }

    /// Byte length of [`Batch::serialize`].
    pub fn byte_len(&self) -> usize {
        self.record_bytes + self.bets.len().saturating_sub(1)
    }

    pub fn bets(&self) -> &[Bet] {
        &self.bets
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Bet> {
        self.bets.iter()
    }

    pub fn into_bets(self) -> Vec<Bet> {
        self.bets
    }

    /// Joins the serialized bets with `;`.
    pub fn serialize(&self) -> String {
        let mut out = String::with_capacity(self.byte_len());
        for (i, bet) in self.bets.iter().enumerate() {
            if i > 0 {
                out.push(RECORD_SEPARATOR);
            }
            out.push_str(&bet.serialize());
        }
        out
    }

    /// Byte length the batch would have with `bet` appended.
    ///
    /// One separator is added per bet already present.
    fn projected_len(&self, bet: &Bet) -> usize {
        self.record_bytes + bet.serialized_len() + self.bets.len()
    }

    fn admits(&self, bet: &Bet, limits: &BatchLimits) -> bool {
        if self.bets.is_empty() {
            return true;
        }
        self.bets.len() < limits.max_count && self.projected_len(bet) <= limits.max_bytes
    }

    fn push(&mut self, bet: Bet) {
        self.record_bytes += bet.serialized_len();
        self.bets.push(bet);
    }
}

impl IntoIterator for Batch {
    type Item = Bet;
    type IntoIter = vec::IntoIter<Bet>;

    fn into_iter(self) -> Self::IntoIter {
        self.bets.into_iter()
    }
}

impl<'a> IntoIterator for &'a Batch {
    type Item = &'a Bet;
    type IntoIter = std::slice::Iter<'a, Bet>;

    fn into_iter(self) -> Self::IntoIter {
        self.bets.iter()
    }
}

/// Lazily groups an iterator of bets into batches.
///
/// Pulls only as many bets as needed to close the next batch, so a large
/// input file never has to be held in memory at once.
pub struct Batches<I> {
    bets: I,
    limits: BatchLimits,
    carry: Option<Bet>,
}

impl<I: Iterator<Item = Bet>> Batches<I> {
    pub fn new(bets: impl IntoIterator<IntoIter = I>, limits: BatchLimits) -> Self {
        Self {
            bets: bets.into_iter(),
            limits,
            carry: None,
        }
    }
}

impl<I: Iterator<Item = Bet>> Iterator for Batches<I> {
    type Item = Batch;

    fn next(&mut self) -> Option<Batch> {
        let mut batch = Batch::new();
        if let Some(bet) = self.carry.take() {
            batch.push(bet);
        }

        for bet in self.bets.by_ref() {
            if batch.admits(&bet, &self.limits) {
                batch.push(bet);
            } else {
                self.carry = Some(bet);
                return Some(batch);
            }
        }

        (!batch.is_empty()).then_some(batch)
    }
}

/// Groups `bets` into batches of at most `max_count` bets and, unless a
/// single bet is larger on its own, at most `max_bytes` serialized bytes.
pub fn make_batches(
    bets: impl IntoIterator<Item = Bet>,
    max_count: usize,
    max_bytes: usize,
) -> Vec<Batch> {
    Batches::new(bets, BatchLimits::new(max_count, max_bytes)).collect()
}
