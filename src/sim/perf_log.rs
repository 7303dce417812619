use std::fmt;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::Context;
use serde::Serialize;

use crate::bridge::{BridgeCounters, PowerComponent, StatsSummary};
use crate::timeq::Cycle;
use crate::traffic::OriginSummary;

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    /// PE cycles simulated.
    pub cycles: Cycle,
    /// Whether every origin drained before the timeout.
    pub finished: bool,
    /// Oracle cycle length.  Latencies are reported in the same unit.
    pub cycle_duration: u64,
    pub bridge: StatsSummary,
    pub counters: BridgeCounters,
    pub origins: Vec<OriginSummary>,
}

impl RunSummary {
    pub fn write_json(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .with_context(|| format!("cannot create {}", dir.display()))?;
        }
        let file =
            File::create(path).with_context(|| format!("cannot create {}", path.display()))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writeln!(writer)?;
        writer.flush()?;
        Ok(())
    }
}

fn fmt_avg(value: Option<f64>) -> String {
    value.map_or_else(|| "undefined".to_string(), |v| format!("{v:.3}"))
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "cycles={} finished={} reads={} writes={} peak_inflight={}",
            self.cycles,
            self.finished,
            self.counters.reads_admitted,
            self.counters.writes_admitted,
            self.counters.peak_inflight
        )?;
        writeln!(
            f,
            "average latency: {} over {} read(s)",
            fmt_avg(self.bridge.average_latency),
            self.bridge.latency_samples
        )?;
        let power = &self.bridge.average_power;
        for (component, avg) in PowerComponent::ALL
            .iter()
            .zip([power.background, power.burst, power.refresh, power.act_pre])
        {
            writeln!(
                f,
                "average {} power: {} over {} sample(s)",
                component.name(),
                fmt_avg(avg),
                self.bridge.power_samples
            )?;
        }
        for origin in &self.origins {
            writeln!(
                f,
                "origin {}: reads={} writes={} responses={} avg_latency={} max_latency={}",
                origin.origin,
                origin.reads_issued,
                origin.writes_issued,
                origin.responses,
                fmt_avg(origin.average_latency),
                origin.max_latency
            )?;
        }
        Ok(())
    }
}
