use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::bail;
use log::warn;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use toml::*;

use crate::bridge::BridgeConfig;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SimConfig {
    pub log_level: u64,
    /// Hard stop, in PE cycles.
    pub timeout: u64,
    /// PE cycles after which statistics restart.
    pub warmup: u64,
    pub ingress_capacity: usize,
    pub results_json: Option<PathBuf>,
}

pub trait Config: DeserializeOwned + Default {
    fn from_section(section: Option<&Value>) -> anyhow::Result<Self> {
        match section {
            Some(value) => Ok(value.clone().try_into()?),
            None => {
                warn!("config section not found");
                Ok(Self::default())
            }
        }
    }
}

impl Config for SimConfig {}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            log_level: 0,
            timeout: 1_000_000,
            warmup: 0,
            ingress_capacity: 32,
            results_json: None,
        }
    }
}

/// Memory-side settings: which DRAM part and controller the oracle models, and how its clock
/// relates to the PEs.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct MemConfig {
    pub timing_profile: String,
    pub system_profile: String,
    pub memory_size_mb: u64,
    /// Oracle cycles per PE cycle.
    pub clock_ratio: u32,
    /// Duration of one oracle cycle in time units (ps).  Defaults to the part's tCK.
    pub cycle_duration: Option<u64>,
    /// Ad hoc parameter overrides, ini-style keys.
    pub overrides: BTreeMap<String, String>,
}

impl Config for MemConfig {}

impl Default for MemConfig {
    fn default() -> Self {
        Self {
            timing_profile: "DDR2_micron_16M_8b_x8_sg3E".to_string(),
            system_profile: "system".to_string(),
            memory_size_mb: 512,
            clock_ratio: 1,
            cycle_duration: None,
            overrides: BTreeMap::new(),
        }
    }
}

impl MemConfig {
    /// Bridge-side view of this section.  `part_cycle_ps` is used when no explicit
    /// `cycle_duration` is configured.
    pub fn bridge_config(&self, part_cycle_ps: u64) -> anyhow::Result<BridgeConfig> {
        if self.clock_ratio == 0 {
            bail!("clock_ratio must be > 0");
        }
        let cycle_duration = self.cycle_duration.unwrap_or(part_cycle_ps);
        if cycle_duration == 0 {
            bail!("cycle_duration must be > 0");
        }
        Ok(BridgeConfig {
            clock_ratio: self.clock_ratio,
            cycle_duration,
        })
    }
}
