//! Bridge between the PE-side request queues and a cycle-accurate timing oracle.
//!
//! `MemoryBridge` is a cooperative task.  Each `resume` runs until its single yield point,
//! "wait one PE clock":
//!
//! ```text
//!   first resume:  admit pending -> yield
//!   later resumes: advance oracle -> route its events -> admit pending -> yield
//! ```
//!
//! Everything runs on the caller's thread.  Oracle events are produced inside the advance and
//! drained before the next admission batch, so admission and completion routing never
//! interleave.  The registries and the statistics are plain fields and need no locking.

mod admit;
mod completions;
pub mod error;
pub mod inflight;
pub mod origin;
pub mod request;
pub mod stats;

#[cfg(test)]
mod unit_tests;

use std::sync::Arc;

use serde::Serialize;

use crate::base::behavior::*;
use crate::base::module::{IsModule, ModuleBase};
use crate::builtin::queue::QueueRef;
use crate::info;
use crate::oracle::TimingOracle;
use crate::sim::log::Logger;
use crate::timeq::Cycle;

pub use error::{BridgeError, ProtocolViolation};
pub use inflight::{InFlightEntry, InFlightRegistry};
pub use origin::OriginRegistry;
pub use request::{MemoryOperation, OriginId};
pub use stats::{PowerComponent, PowerSummary, StatisticsAccumulator, StatsSummary};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BridgeConfig {
    /// Oracle cycles per PE cycle.
    pub clock_ratio: u32,
    /// Duration of one oracle cycle in time units.
    pub cycle_duration: u64,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            clock_ratio: 1,
            cycle_duration: 3000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClockPhase {
    /// Never resumed.
    #[default]
    Idle,
    /// Parked at the yield point after an admission batch.
    WaitingForClock,
}

/// Bookkeeping counters beyond the latency/power statistics.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct BridgeCounters {
    pub reads_admitted: u64,
    pub writes_admitted: u64,
    pub reads_routed: u64,
    pub write_completions_ignored: u64,
    pub peak_inflight: u64,
}

/// What one `resume` did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub admitted: usize,
    pub reads_routed: usize,
    pub power_samples: usize,
}

#[derive(Debug, Default)]
pub struct BridgeState {
    phase: ClockPhase,
    inflight: InFlightRegistry,
    origins: OriginRegistry,
    stats: StatisticsAccumulator,
    counters: BridgeCounters,
}

pub struct MemoryBridge<O: TimingOracle> {
    base: ModuleBase<BridgeState, BridgeConfig>,
    oracle: O,
    ingress: QueueRef<MemoryOperation>,
    logger: Arc<Logger>,
}

impl<O: TimingOracle> MemoryBridge<O> {
    pub fn new(
        config: Arc<BridgeConfig>,
        mut oracle: O,
        ingress: QueueRef<MemoryOperation>,
        logger: &Arc<Logger>,
    ) -> Self {
        assert!(config.clock_ratio > 0, "clock_ratio must be > 0");
        oracle.set_clock_ratio(config.clock_ratio);
        let mut me = Self {
            base: ModuleBase::default(),
            oracle,
            ingress,
            logger: Arc::clone(logger),
        };
        me.init_conf(config);
        me
    }

    /// Attach the egress queue of `origin`.  Only valid before the first `resume`.
    pub fn connect_origin(
        &mut self,
        origin: OriginId,
        egress: QueueRef<MemoryOperation>,
    ) -> anyhow::Result<()> {
        self.base.state.origins.register(origin, egress)
    }

    /// Run until the next yield point.
    pub fn resume(&mut self) -> Result<TickReport, BridgeError> {
        let mut report = TickReport::default();
        match self.base.state.phase {
            ClockPhase::Idle => {
                self.base.state.origins.seal();
                info!(
                    self.logger,
                    self.base.cycle,
                    "bridge started with {} origin(s), clock ratio {}",
                    self.base.state.origins.len(),
                    self.conf().clock_ratio
                );
            }
            ClockPhase::WaitingForClock => {
                self.base.advance_cycle();
                self.oracle.advance_one_cycle();
                self.drain_oracle_events(&mut report)?;
            }
        }
        report.admitted = self.admit_pending()?;
        self.base.state.phase = ClockPhase::WaitingForClock;
        Ok(report)
    }

    pub fn phase(&self) -> ClockPhase {
        self.base.state.phase
    }

    pub fn stats(&self) -> &StatisticsAccumulator {
        &self.base.state.stats
    }

    pub fn counters(&self) -> BridgeCounters {
        let mut counters = self.base.state.counters;
        counters.peak_inflight = self.base.state.inflight.peak() as u64;
        counters
    }

    /// Reads admitted but not yet completed.
    pub fn inflight(&self) -> usize {
        self.base.state.inflight.len()
    }

    pub fn inflight_registry(&self) -> &InFlightRegistry {
        &self.base.state.inflight
    }

    pub fn origins(&self) -> &OriginRegistry {
        &self.base.state.origins
    }

    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    pub fn oracle_mut(&mut self) -> &mut O {
        &mut self.oracle
    }

    pub fn ingress(&self) -> &QueueRef<MemoryOperation> {
        &self.ingress
    }

    pub fn cycle(&self) -> Cycle {
        self.base.cycle
    }
}

impl<O: TimingOracle> IsModule for MemoryBridge<O> {
    type StateType = BridgeState;
    type ConfigType = BridgeConfig;

    fn base(&mut self) -> &mut ModuleBase<BridgeState, BridgeConfig> {
        &mut self.base
    }

    fn base_ref(&self) -> &ModuleBase<BridgeState, BridgeConfig> {
        &self.base
    }
}

impl<O: TimingOracle> ModuleBehaviors for MemoryBridge<O> {
    fn tick_one(&mut self) -> Result<(), BridgeError> {
        self.resume().map(|_| ())
    }

    /// Start a fresh statistics window.  Reads still in flight keep their submit cycle and are
    /// counted in the new window when they complete.
    fn reset(&mut self) {
        self.base.state.stats = StatisticsAccumulator::default();
        self.base.state.counters = BridgeCounters::default();
    }
}
