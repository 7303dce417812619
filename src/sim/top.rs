use std::sync::Arc;

use anyhow::bail;
use log::{info, warn};

use crate::base::behavior::*;
use crate::bridge::{BridgeError, MemoryBridge};
use crate::builtin::queue::QueueRef;
use crate::oracle::DramOracle;
use crate::sim::config::{MemConfig, SimConfig};
use crate::sim::log::Logger;
use crate::sim::perf_log::RunSummary;
use crate::timeq::Cycle;
use crate::traffic::{TrafficConfig, TrafficOrigin};

/// Synthetic origins feeding one bridge in front of the DRAM oracle, clocked in PE cycles.
pub struct Sim {
    config: SimConfig,
    bridge: MemoryBridge<DramOracle>,
    origins: Vec<TrafficOrigin>,
    cycle: Cycle,
}

impl Sim {
    pub fn new(
        sim_config: SimConfig,
        mem_config: MemConfig,
        traffic_config: TrafficConfig,
    ) -> anyhow::Result<Sim> {
        traffic_config.validate()?;
        if sim_config.ingress_capacity == 0 {
            bail!("ingress_capacity must be > 0");
        }
        if traffic_config.egress_capacity < traffic_config.max_outstanding {
            warn!(
                "egress_capacity {} < max_outstanding {}: responses may overflow",
                traffic_config.egress_capacity, traffic_config.max_outstanding
            );
        }

        let logger = Arc::new(Logger::new(sim_config.log_level));
        let oracle = DramOracle::from_config(&mem_config)?;
        let bridge_config = mem_config.bridge_config(oracle.timing().t_ck_ps)?;
        let ingress = QueueRef::bounded(sim_config.ingress_capacity);
        let mut bridge =
            MemoryBridge::new(Arc::new(bridge_config), oracle, ingress.clone(), &logger);

        let traffic = Arc::new(traffic_config);
        let origins: Vec<TrafficOrigin> = (0..traffic.num_origins)
            .map(|id| TrafficOrigin::new(Arc::clone(&traffic), id, ingress.clone(), &logger))
            .collect();
        for origin in &origins {
            bridge.connect_origin(origin.id(), origin.egress().clone())?;
        }

        Ok(Sim {
            config: sim_config,
            bridge,
            origins,
            cycle: 0,
        })
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn bridge(&self) -> &MemoryBridge<DramOracle> {
        &self.bridge
    }

    pub fn origins(&self) -> &[TrafficOrigin] {
        &self.origins
    }

    pub fn cycle(&self) -> Cycle {
        self.cycle
    }

    /// Every origin drained its budget and nothing is queued or in flight.
    pub fn finished(&self) -> bool {
        self.origins.iter().all(TrafficOrigin::is_done)
            && self.bridge.inflight() == 0
            && self.bridge.ingress().available() == 0
    }

    /// Run until finished or the timeout.  A bridge error aborts the run.
    pub fn simulate(&mut self) -> Result<RunSummary, BridgeError> {
        while self.cycle < self.config.timeout && !self.finished() {
            if self.config.warmup > 0 && self.cycle == self.config.warmup {
                info!("warmup done at cycle {}, statistics restart", self.cycle);
                self.reset();
            }
            self.tick_one()?;
        }
        let summary = self.summary();
        if summary.finished {
            info!("simulation finished in {} cycles", self.cycle);
        } else {
            warn!(
                "simulation timed out after {} cycles with {} read(s) in flight",
                self.cycle,
                self.bridge.inflight()
            );
        }
        Ok(summary)
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            cycles: self.cycle,
            finished: self.finished(),
            cycle_duration: self.bridge.conf().cycle_duration,
            bridge: self.bridge.stats().summary(),
            counters: self.bridge.counters(),
            origins: self.origins.iter().map(TrafficOrigin::summary).collect(),
        }
    }
}

impl ModuleBehaviors for Sim {
    fn tick_one(&mut self) -> Result<(), BridgeError> {
        for origin in self.origins.iter_mut() {
            origin.tick_one()?;
        }
        self.bridge.tick_one()?;
        self.cycle += 1;
        Ok(())
    }

    fn reset(&mut self) {
        self.origins.iter_mut().for_each(TrafficOrigin::reset);
        self.bridge.reset();
    }
}
