use crate::oracle::Direction;

pub type OriginId = usize;

/// A memory access issued by an origin.  Ownership moves origin -> ingress queue -> bridge ->
/// egress queue -> origin; the bridge drops writes once they are submitted.
#[derive(Debug, PartialEq, Eq)]
pub struct MemoryOperation {
    /// Origin-assigned tag, carried unchanged through the bridge.
    pub id: u64,
    pub origin: OriginId,
    pub address: u64,
    pub is_write: bool,
    pub is_response: bool,
    /// Request-to-response latency in time units, filled in on completion.
    pub latency: Option<u64>,
}

impl MemoryOperation {
    pub fn new(origin: OriginId, address: u64, is_write: bool) -> Self {
        Self {
            id: 0,
            origin,
            address,
            is_write,
            is_response: false,
            latency: None,
        }
    }

    pub fn read(origin: OriginId, address: u64) -> Self {
        Self::new(origin, address, false)
    }

    pub fn write(origin: OriginId, address: u64) -> Self {
        Self::new(origin, address, true)
    }

    pub fn with_id(mut self, id: u64) -> Self {
        self.id = id;
        self
    }

    pub fn direction(&self) -> Direction {
        Direction::from_is_write(self.is_write)
    }
}
