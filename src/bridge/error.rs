use std::fmt;

use super::request::{MemoryOperation, OriginId};
use crate::oracle::TransactionHandle;
use crate::timeq::Cycle;

/// Broken bookkeeping between the bridge and its oracle.  Never recoverable: the registries can
/// no longer be trusted once one of these has been seen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtocolViolation {
    /// A completion for a handle that was never admitted or has already completed.
    UnknownHandle(TransactionHandle),
    /// The oracle returned a handle that is still live.
    DuplicateHandle(TransactionHandle),
    /// A completed operation names an origin with no egress queue.
    UnknownOrigin {
        origin: OriginId,
        handle: TransactionHandle,
    },
    CompletionBeforeSubmit {
        handle: TransactionHandle,
        submitted_at: Cycle,
        completed_at: Cycle,
    },
    /// Elapsed cycles times the cycle duration does not fit a latency.
    LatencyOverflow {
        handle: TransactionHandle,
        cycles: Cycle,
        cycle_duration: u64,
    },
}

impl fmt::Display for ProtocolViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownHandle(handle) => {
                write!(f, "completion for {} has no matching memory operation", handle)
            }
            Self::DuplicateHandle(handle) => {
                write!(f, "oracle returned {} while it is still in flight", handle)
            }
            Self::UnknownOrigin { origin, handle } => write!(
                f,
                "cannot find response queue for origin {} (completing {})",
                origin, handle
            ),
            Self::CompletionBeforeSubmit {
                handle,
                submitted_at,
                completed_at,
            } => write!(
                f,
                "{} completed at cycle {} before its submission at cycle {}",
                handle, completed_at, submitted_at
            ),
            Self::LatencyOverflow {
                handle,
                cycles,
                cycle_duration,
            } => write!(
                f,
                "latency of {} overflows: {} cycles of {} units",
                handle, cycles, cycle_duration
            ),
        }
    }
}

/// Fatal conditions raised while the bridge runs.
#[derive(Debug)]
pub enum BridgeError {
    ProtocolViolation(ProtocolViolation),
    /// The origin's egress queue was full when its response was ready.  The response is handed
    /// back so the caller can inspect it.
    ResourceExhaustion {
        origin: OriginId,
        operation: MemoryOperation,
    },
}

impl BridgeError {
    pub fn is_protocol_violation(&self) -> bool {
        matches!(self, Self::ProtocolViolation(_))
    }

    pub fn is_resource_exhaustion(&self) -> bool {
        matches!(self, Self::ResourceExhaustion { .. })
    }

    pub fn violation(&self) -> Option<&ProtocolViolation> {
        match self {
            Self::ProtocolViolation(violation) => Some(violation),
            Self::ResourceExhaustion { .. } => None,
        }
    }
}

impl fmt::Display for BridgeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ProtocolViolation(violation) => write!(f, "protocol violation: {}", violation),
            Self::ResourceExhaustion { origin, operation } => write!(
                f,
                "response queue is full for origin {} (operation {} @ {:#x})",
                origin, operation.id, operation.address
            ),
        }
    }
}

impl std::error::Error for BridgeError {}

impl From<ProtocolViolation> for BridgeError {
    fn from(violation: ProtocolViolation) -> Self {
        Self::ProtocolViolation(violation)
    }
}
