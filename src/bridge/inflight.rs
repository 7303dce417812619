use std::collections::HashMap;

use super::error::ProtocolViolation;
use super::request::MemoryOperation;
use crate::oracle::TransactionHandle;
use crate::timeq::Cycle;

/// A read waiting for its completion.
#[derive(Debug)]
pub struct InFlightEntry {
    pub operation: MemoryOperation,
    /// Oracle cycle at which the transaction was submitted.
    pub submitted_at: Cycle,
}

/// Live handles and the reads they stand for.  Each handle is inserted once on admission and
/// taken once on completion.
#[derive(Debug, Default)]
pub struct InFlightRegistry {
    entries: HashMap<TransactionHandle, InFlightEntry>,
    peak: usize,
}

impl InFlightRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(
        &mut self,
        handle: TransactionHandle,
        entry: InFlightEntry,
    ) -> Result<(), ProtocolViolation> {
        if self.entries.contains_key(&handle) {
            return Err(ProtocolViolation::DuplicateHandle(handle));
        }
        self.entries.insert(handle, entry);
        self.peak = self.peak.max(self.entries.len());
        Ok(())
    }

    pub fn take(&mut self, handle: TransactionHandle) -> Result<InFlightEntry, ProtocolViolation> {
        self.entries
            .remove(&handle)
            .ok_or(ProtocolViolation::UnknownHandle(handle))
    }

    pub fn contains(&self, handle: TransactionHandle) -> bool {
        self.entries.contains_key(&handle)
    }

    pub fn get(&self, handle: TransactionHandle) -> Option<&InFlightEntry> {
        self.entries.get(&handle)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Largest number of reads tracked at once.
    pub fn peak(&self) -> usize {
        self.peak
    }
}
