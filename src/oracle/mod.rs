//! Interface to the cycle-accurate memory-timing model the bridge drives.
//!
//! The oracle is opaque: the bridge only sees admission capacity, opaque transaction handles,
//! and the events an advance produces.  Events are pollable rather than pushed through
//! callbacks, but they are only ever produced inside `advance_one_cycle`, so draining them right
//! after the advance returns observes them in the same order a callback would.

pub mod dram;
#[cfg(test)]
pub(crate) mod scripted;

use std::fmt;

use crate::timeq::Cycle;

pub use dram::{DramOracle, DramSystem, DramTiming};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Read,
    Write,
}

impl Direction {
    pub fn from_is_write(is_write: bool) -> Self {
        if is_write {
            Self::Write
        } else {
            Self::Read
        }
    }
}

/// Opaque token the oracle returns on admission.  Only the oracle mints these; the bridge
/// compares them with each other and nothing else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransactionHandle(u64);

impl TransactionHandle {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TransactionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "txn#{}", self.0)
    }
}

/// One power reading, in mW, split into the four modelled contributors.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PowerSample {
    pub background: f64,
    pub burst: f64,
    pub refresh: f64,
    pub act_pre: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum OracleEvent {
    ReadComplete { handle: TransactionHandle, cycle: Cycle },
    WriteComplete { handle: TransactionHandle, cycle: Cycle },
    PowerSample(PowerSample),
}

pub trait TimingOracle {
    /// Number of internal oracle cycles per PE cycle.  Called once, at setup.
    fn set_clock_ratio(&mut self, ratio: u32);

    /// Whether `submit` may be called now.
    fn can_accept(&self) -> bool;

    /// Enqueue a transaction.  Callers must check `can_accept` first.
    fn submit(&mut self, address: u64, direction: Direction) -> TransactionHandle;

    /// Advance by one PE cycle.  Completions and power samples produced during the advance
    /// become visible through `poll_event`.
    fn advance_one_cycle(&mut self);

    /// Current internal oracle cycle.
    fn current_cycle(&self) -> Cycle;

    /// Take the oldest undelivered event.
    fn poll_event(&mut self) -> Option<OracleEvent>;
}
