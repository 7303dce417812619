use std::collections::HashMap;

use anyhow::bail;

use super::request::{MemoryOperation, OriginId};
use crate::builtin::queue::QueueRef;

/// Egress queue per origin.  Filled during setup, sealed before the first cycle runs.
#[derive(Debug, Default)]
pub struct OriginRegistry {
    queues: HashMap<OriginId, QueueRef<MemoryOperation>>,
    sealed: bool,
}

impl OriginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, origin: OriginId, queue: QueueRef<MemoryOperation>) -> anyhow::Result<()> {
        if self.sealed {
            bail!("cannot register origin {} after the simulation started", origin);
        }
        if self.queues.contains_key(&origin) {
            bail!("origin {} already has a response queue", origin);
        }
        self.queues.insert(origin, queue);
        Ok(())
    }

    pub fn seal(&mut self) {
        self.sealed = true;
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    pub fn resolve(&self, origin: OriginId) -> Option<&QueueRef<MemoryOperation>> {
        self.queues.get(&origin)
    }

    pub fn len(&self) -> usize {
        self.queues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queues.is_empty()
    }

    pub fn origins(&self) -> Vec<OriginId> {
        let mut ids: Vec<OriginId> = self.queues.keys().copied().collect();
        ids.sort_unstable();
        ids
    }
}
