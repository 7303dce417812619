use crate::base::behavior::Parameterizable;
use crate::debug;
use crate::oracle::{OracleEvent, PowerSample, TimingOracle, TransactionHandle};
use crate::timeq::{cycles_to_time, Cycle};

use super::{BridgeError, InFlightEntry, MemoryBridge, OriginId, ProtocolViolation, TickReport};

impl<O: TimingOracle> MemoryBridge<O> {
    /// Resolve a read completion back to its operation, record its latency, and hand it to the
    /// origin's egress queue.  Returns the origin the response went to.
    pub fn on_read_complete(
        &mut self,
        handle: TransactionHandle,
        completed_at: Cycle,
    ) -> Result<OriginId, BridgeError> {
        let InFlightEntry {
            mut operation,
            submitted_at,
        } = self.base.state.inflight.take(handle)?;
        operation.is_response = true;

        let cycle_duration = self.conf().cycle_duration;
        let Some(latency) = cycles_to_time(submitted_at, completed_at, cycle_duration) else {
            let violation = if completed_at < submitted_at {
                ProtocolViolation::CompletionBeforeSubmit {
                    handle,
                    submitted_at,
                    completed_at,
                }
            } else {
                ProtocolViolation::LatencyOverflow {
                    handle,
                    cycles: completed_at - submitted_at,
                    cycle_duration,
                }
            };
            return Err(violation.into());
        };
        operation.latency = Some(latency);
        self.base.state.stats.record_latency(latency);

        let origin = operation.origin;
        let Some(egress) = self.base.state.origins.resolve(origin) else {
            return Err(ProtocolViolation::UnknownOrigin { origin, handle }.into());
        };
        debug!(
            self.logger,
            self.base.cycle,
            "[route] {} -> origin {} ({:#x}, latency {})",
            handle,
            origin,
            operation.address,
            latency
        );
        egress
            .try_push(operation)
            .map_err(|operation| BridgeError::ResourceExhaustion { origin, operation })?;
        self.base.state.counters.reads_routed += 1;
        Ok(origin)
    }

    /// Write completions are not correlated with operations: writes were never registered.
    pub fn on_write_complete(&mut self, handle: TransactionHandle, completed_at: Cycle) {
        self.base.state.counters.write_completions_ignored += 1;
        debug!(
            self.logger,
            self.base.cycle,
            "[route] ignoring write completion {} @oracle {}",
            handle,
            completed_at
        );
    }

    pub fn on_power_sample(&mut self, sample: PowerSample) {
        self.base.state.stats.record_power(&sample);
    }

    pub(super) fn drain_oracle_events(&mut self, report: &mut TickReport) -> Result<(), BridgeError> {
        while let Some(event) = self.oracle.poll_event() {
            match event {
                OracleEvent::ReadComplete { handle, cycle } => {
                    self.on_read_complete(handle, cycle)?;
                    report.reads_routed += 1;
                }
                OracleEvent::WriteComplete { handle, cycle } => {
                    self.on_write_complete(handle, cycle);
                }
                OracleEvent::PowerSample(sample) => {
                    self.on_power_sample(sample);
                    report.power_samples += 1;
                }
            }
        }
        Ok(())
    }
}
