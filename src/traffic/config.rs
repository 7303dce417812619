use anyhow::bail;
use serde::Deserialize;

use crate::sim::config::Config;
use crate::traffic::patterns::PatternKind;

/// Synthetic PEs driving the bridge.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct TrafficConfig {
    pub num_origins: usize,
    pub requests_per_origin: u64,
    /// Fraction of requests that are reads.
    pub read_ratio: f64,
    /// Reads an origin may have in flight at once.
    pub max_outstanding: usize,
    pub egress_capacity: usize,
    pub pattern: PatternKind,
    pub base_address: u64,
    pub stride: u64,
    /// Size of each origin's address window.
    pub span_bytes: u64,
    pub seed: u64,
}

impl Config for TrafficConfig {}

impl Default for TrafficConfig {
    fn default() -> Self {
        Self {
            num_origins: 2,
            requests_per_origin: 1024,
            read_ratio: 0.75,
            max_outstanding: 8,
            egress_capacity: 8,
            pattern: PatternKind::Sequential,
            base_address: 0,
            stride: 64,
            span_bytes: 1 << 20,
            seed: 0,
        }
    }
}

impl TrafficConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if !(0.0..=1.0).contains(&self.read_ratio) {
            bail!("read_ratio must be within [0, 1], got {}", self.read_ratio);
        }
        if self.max_outstanding == 0 || self.egress_capacity == 0 {
            bail!("max_outstanding and egress_capacity must be > 0");
        }
        if self.span_bytes < 64 {
            bail!("span_bytes must cover at least one 64-byte line");
        }
        Ok(())
    }
}
