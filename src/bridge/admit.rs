use crate::debug;
use crate::oracle::TimingOracle;

use super::{BridgeError, InFlightEntry, MemoryBridge};

impl<O: TimingOracle> MemoryBridge<O> {
    /// Move operations from the ingress queue into the oracle until either runs dry.  Reads are
    /// registered under the handle the oracle returns; writes are fire-and-forget.  Runs the
    /// whole batch without yielding and returns how many operations were admitted.
    pub fn admit_pending(&mut self) -> Result<usize, BridgeError> {
        let now = self.base.cycle;
        let mut admitted = 0;
        while self.ingress.available() > 0 && self.oracle.can_accept() {
            let Some(operation) = self.ingress.pop() else {
                break;
            };
            let submitted_at = self.oracle.current_cycle();
            let handle = self.oracle.submit(operation.address, operation.direction());
            admitted += 1;

            if operation.is_write {
                self.base.state.counters.writes_admitted += 1;
                debug!(
                    self.logger,
                    now,
                    "[admit] origin {} write {:#x} as {} (untracked)",
                    operation.origin,
                    operation.address,
                    handle
                );
                continue;
            }

            debug!(
                self.logger,
                now,
                "[admit] origin {} read {:#x} as {} @oracle {}",
                operation.origin,
                operation.address,
                handle,
                submitted_at
            );
            self.base.state.inflight.insert(
                handle,
                InFlightEntry {
                    operation,
                    submitted_at,
                },
            )?;
            self.base.state.counters.reads_admitted += 1;
        }
        Ok(admitted)
    }
}
