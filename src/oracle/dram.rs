//! Reference DRAM timing oracle.
//!
//! Models one rank of a DRAM channel at its own clock: a bounded transaction queue in front of
//! a set of banks with one open row each, periodic refresh, and a coarse power model sampled
//! once per epoch.  Latencies follow the usual row-buffer cases:
//!
//! * **Row hit:** `cl + burst`
//! * **Row closed:** `t_rcd + cl + burst`
//! * **Row conflict:** `t_rp + t_rcd + cl + burst`
//!
//! Part and controller parameters come from named profiles, optionally patched with
//! string overrides using the usual ini key names.

use std::collections::{BTreeMap, VecDeque};

use anyhow::{anyhow, bail, Context};
use log::{debug, info};
use phf::phf_map;
use smallvec::SmallVec;

use super::{Direction, OracleEvent, PowerSample, TimingOracle, TransactionHandle};
use crate::sim::config::MemConfig;
use crate::timeq::Cycle;

/// Device timing and power parameters of a DRAM part, in memory-clock cycles and mW.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DramTiming {
    pub t_ck_ps: u64,
    pub cl: Cycle,
    pub t_rcd: Cycle,
    pub t_rp: Cycle,
    pub t_rfc: Cycle,
    pub t_refi: Cycle,
    pub burst_cycles: Cycle,
    pub num_banks: usize,
    pub row_bytes: u64,
    pub background_mw: f64,
    pub burst_mw: f64,
    pub refresh_mw: f64,
    pub act_pre_mw: f64,
}

/// Controller-level parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DramSystem {
    pub trans_queue_depth: usize,
    pub epoch_length: Cycle,
}

static TIMING_PROFILES: phf::Map<&'static str, DramTiming> = phf_map! {
    "DDR2_micron_16M_8b_x8_sg3E" => DramTiming {
        t_ck_ps: 3000,
        cl: 5,
        t_rcd: 5,
        t_rp: 5,
        t_rfc: 43,
        t_refi: 2600,
        burst_cycles: 2,
        num_banks: 8,
        row_bytes: 8192,
        background_mw: 243.0,
        burst_mw: 405.0,
        refresh_mw: 1134.0,
        act_pre_mw: 297.0,
    },
    "DDR2_micron_32M_4B_x4_sg3E" => DramTiming {
        t_ck_ps: 3000,
        cl: 5,
        t_rcd: 5,
        t_rp: 5,
        t_rfc: 43,
        t_refi: 2600,
        burst_cycles: 2,
        num_banks: 4,
        row_bytes: 8192,
        background_mw: 216.0,
        burst_mw: 378.0,
        refresh_mw: 1080.0,
        act_pre_mw: 270.0,
    },
    "DDR3_micron_32M_8B_x8_sg15" => DramTiming {
        t_ck_ps: 1500,
        cl: 10,
        t_rcd: 10,
        t_rp: 10,
        t_rfc: 74,
        t_refi: 5200,
        burst_cycles: 4,
        num_banks: 8,
        row_bytes: 8192,
        background_mw: 180.0,
        burst_mw: 390.0,
        refresh_mw: 1020.0,
        act_pre_mw: 255.0,
    },
};

static SYSTEM_PROFILES: phf::Map<&'static str, DramSystem> = phf_map! {
    "system" => DramSystem { trans_queue_depth: 32, epoch_length: 1000 },
    "shallow_queue" => DramSystem { trans_queue_depth: 8, epoch_length: 1000 },
    "deep_queue" => DramSystem { trans_queue_depth: 64, epoch_length: 1000 },
};

impl DramTiming {
    pub fn lookup(name: &str) -> anyhow::Result<Self> {
        TIMING_PROFILES.get(name).copied().ok_or_else(|| {
            anyhow!(
                "unknown timing profile '{}', expected one of: {}",
                name,
                known_names(&TIMING_PROFILES)
            )
        })
    }
}

impl DramSystem {
    pub fn lookup(name: &str) -> anyhow::Result<Self> {
        SYSTEM_PROFILES.get(name).copied().ok_or_else(|| {
            anyhow!(
                "unknown system profile '{}', expected one of: {}",
                name,
                known_names(&SYSTEM_PROFILES)
            )
        })
    }
}

fn known_names<V>(map: &phf::Map<&'static str, V>) -> String {
    let mut names: Vec<&str> = map.keys().copied().collect();
    names.sort_unstable();
    names.join(", ")
}

fn parse_value<T: std::str::FromStr>(key: &str, value: &str) -> anyhow::Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value
        .trim()
        .parse::<T>()
        .with_context(|| format!("invalid value '{}' for override {}", value, key))
}

/// Patch a profile pair with one `key = value` override.
pub fn apply_override(
    timing: &mut DramTiming,
    system: &mut DramSystem,
    key: &str,
    value: &str,
) -> anyhow::Result<()> {
    match key {
        "tCK" => timing.t_ck_ps = parse_value(key, value)?,
        "CL" => timing.cl = parse_value(key, value)?,
        "tRCD" => timing.t_rcd = parse_value(key, value)?,
        "tRP" => timing.t_rp = parse_value(key, value)?,
        "tRFC" => timing.t_rfc = parse_value(key, value)?,
        "REFRESH_PERIOD" => timing.t_refi = parse_value(key, value)?,
        "BL_CYCLES" => timing.burst_cycles = parse_value(key, value)?,
        "NUM_BANKS" => timing.num_banks = parse_value(key, value)?,
        "ROW_BYTES" => timing.row_bytes = parse_value(key, value)?,
        "TRANS_QUEUE_DEPTH" => system.trans_queue_depth = parse_value(key, value)?,
        "EPOCH_LENGTH" => system.epoch_length = parse_value(key, value)?,
        _ => bail!("unknown override key '{}'", key),
    }
    Ok(())
}

/// Resolve the named profiles and apply every override on top.
pub fn resolve_profiles(
    timing_profile: &str,
    system_profile: &str,
    overrides: &BTreeMap<String, String>,
) -> anyhow::Result<(DramTiming, DramSystem)> {
    let mut timing = DramTiming::lookup(timing_profile)?;
    let mut system = DramSystem::lookup(system_profile)?;
    for (key, value) in overrides {
        apply_override(&mut timing, &mut system, key, value)?;
    }
    Ok((timing, system))
}

#[derive(Debug, Clone, Copy, Default)]
struct Bank {
    open_row: Option<u64>,
    busy_until: Cycle,
}

#[derive(Debug, Clone, Copy)]
struct QueuedTransaction {
    handle: TransactionHandle,
    address: u64,
    direction: Direction,
}

#[derive(Debug, Clone, Copy)]
struct InService {
    handle: TransactionHandle,
    direction: Direction,
    done_at: Cycle,
}

#[derive(Debug, Clone, Copy, Default)]
struct EpochCounters {
    burst_cycles: u64,
    activates: u64,
    refresh_cycles: u64,
}

#[derive(Debug)]
pub struct DramOracle {
    timing: DramTiming,
    system: DramSystem,
    memory_bytes: u64,
    clock_ratio: u32,
    cycle: Cycle,
    next_handle: u64,
    queue: VecDeque<QueuedTransaction>,
    in_service: SmallVec<[InService; 8]>,
    banks: Vec<Bank>,
    next_refresh: Cycle,
    epoch: EpochCounters,
    events: VecDeque<OracleEvent>,
}

impl DramOracle {
    pub fn new(timing: DramTiming, system: DramSystem, memory_size_mb: u64) -> anyhow::Result<Self> {
        if memory_size_mb == 0 {
            bail!("memory_size_mb must be > 0");
        }
        let Some(memory_bytes) = memory_size_mb.checked_mul(1 << 20) else {
            bail!("memory_size_mb {} overflows the address space", memory_size_mb);
        };
        if timing.num_banks == 0 || timing.row_bytes == 0 {
            bail!("num_banks and row_bytes must be > 0");
        }
        if timing.t_refi <= timing.t_rfc {
            bail!(
                "refresh period ({}) must exceed tRFC ({})",
                timing.t_refi,
                timing.t_rfc
            );
        }
        if system.trans_queue_depth == 0 || system.epoch_length == 0 {
            bail!("trans_queue_depth and epoch_length must be > 0");
        }
        Ok(Self {
            timing,
            system,
            memory_bytes,
            clock_ratio: 1,
            cycle: 0,
            next_handle: 1,
            queue: VecDeque::with_capacity(system.trans_queue_depth),
            in_service: SmallVec::new(),
            banks: vec![Bank::default(); timing.num_banks],
            next_refresh: timing.t_refi,
            epoch: EpochCounters::default(),
            events: VecDeque::new(),
        })
    }

    pub fn from_config(config: &MemConfig) -> anyhow::Result<Self> {
        let (timing, system) = resolve_profiles(
            &config.timing_profile,
            &config.system_profile,
            &config.overrides,
        )
        .context("cannot resolve DRAM profiles")?;
        info!(
            "dram: {} / {} ({} MiB, {} banks, queue depth {})",
            config.timing_profile,
            config.system_profile,
            config.memory_size_mb,
            timing.num_banks,
            system.trans_queue_depth
        );
        Self::new(timing, system, config.memory_size_mb)
    }

    pub fn timing(&self) -> &DramTiming {
        &self.timing
    }

    pub fn system(&self) -> &DramSystem {
        &self.system
    }

    pub fn clock_ratio(&self) -> u32 {
        self.clock_ratio
    }

    /// Transactions accepted but not yet completed.
    pub fn outstanding(&self) -> usize {
        self.queue.len() + self.in_service.len()
    }

    fn decode(&self, address: u64) -> (usize, u64) {
        let addr = address % self.memory_bytes;
        let row_index = addr / self.timing.row_bytes;
        let bank = (row_index % self.timing.num_banks as u64) as usize;
        let row = row_index / self.timing.num_banks as u64;
        (bank, row)
    }

    fn access_latency(&self, bank: usize, row: u64) -> (Cycle, bool) {
        let t = &self.timing;
        match self.banks[bank].open_row {
            Some(open_row) if open_row == row => (t.cl + t.burst_cycles, false),
            Some(_) => (t.t_rp + t.t_rcd + t.cl + t.burst_cycles, true),
            None => (t.t_rcd + t.cl + t.burst_cycles, true),
        }
    }

    fn retire(&mut self, now: Cycle) {
        let mut done: SmallVec<[InService; 8]> = SmallVec::new();
        self.in_service.retain(|entry| {
            if entry.done_at <= now {
                done.push(*entry);
                false
            } else {
                true
            }
        });
        done.sort_by_key(|entry| (entry.done_at, entry.handle));
        for entry in done {
            self.events.push_back(match entry.direction {
                Direction::Read => OracleEvent::ReadComplete {
                    handle: entry.handle,
                    cycle: now,
                },
                Direction::Write => OracleEvent::WriteComplete {
                    handle: entry.handle,
                    cycle: now,
                },
            });
        }
    }

    fn refresh_due(&self, now: Cycle) -> bool {
        now >= self.next_refresh
    }

    fn try_refresh(&mut self, now: Cycle) {
        // wait for in-flight bursts to drain before closing rows
        if self.banks.iter().any(|bank| bank.busy_until > now) {
            return;
        }
        let until = now + self.timing.t_rfc;
        for bank in self.banks.iter_mut() {
            bank.open_row = None;
            bank.busy_until = until;
        }
        self.next_refresh = self.next_refresh.saturating_add(self.timing.t_refi);
        self.epoch.refresh_cycles += self.timing.t_rfc;
        debug!("dram: refresh @{} until {}", now, until);
    }

    fn schedule(&mut self, now: Cycle) {
        let Some(pos) = self.queue.iter().position(|txn| {
            let (bank, _) = self.decode(txn.address);
            self.banks[bank].busy_until <= now
        }) else {
            return;
        };
        let Some(txn) = self.queue.remove(pos) else {
            return;
        };
        let (bank, row) = self.decode(txn.address);
        let (latency, activated) = self.access_latency(bank, row);
        let done_at = now + latency;
        self.banks[bank] = Bank {
            open_row: Some(row),
            busy_until: done_at,
        };
        self.in_service.push(InService {
            handle: txn.handle,
            direction: txn.direction,
            done_at,
        });
        self.epoch.burst_cycles += self.timing.burst_cycles;
        if activated {
            self.epoch.activates += 1;
        }
    }

    fn sample_power(&mut self) {
        let t = &self.timing;
        let epoch = self.system.epoch_length as f64;
        let counters = std::mem::take(&mut self.epoch);
        let act_pre_cycles = counters.activates * (t.t_rcd + t.t_rp);
        let sample = PowerSample {
            background: t.background_mw,
            burst: t.burst_mw * counters.burst_cycles as f64 / epoch,
            refresh: t.refresh_mw * counters.refresh_cycles as f64 / epoch,
            act_pre: t.act_pre_mw * act_pre_cycles as f64 / epoch,
        };
        self.events.push_back(OracleEvent::PowerSample(sample));
    }

    fn step_internal(&mut self) {
        self.cycle += 1;
        let now = self.cycle;
        self.retire(now);
        // no new activates while a refresh is pending
        if self.refresh_due(now) {
            self.try_refresh(now);
        } else {
            self.schedule(now);
        }
        if now % self.system.epoch_length == 0 {
            self.sample_power();
        }
    }
}

impl TimingOracle for DramOracle {
    fn set_clock_ratio(&mut self, ratio: u32) {
        self.clock_ratio = ratio.max(1);
    }

    fn can_accept(&self) -> bool {
        self.queue.len() < self.system.trans_queue_depth
    }

    fn submit(&mut self, address: u64, direction: Direction) -> TransactionHandle {
        debug_assert!(self.can_accept(), "transaction queue overflow");
        let handle = TransactionHandle::new(self.next_handle);
        self.next_handle += 1;
        self.queue.push_back(QueuedTransaction {
            handle,
            address,
            direction,
        });
        handle
    }

    fn advance_one_cycle(&mut self) {
        for _ in 0..self.clock_ratio {
            self.step_internal();
        }
    }

    fn current_cycle(&self) -> Cycle {
        self.cycle
    }

    fn poll_event(&mut self) -> Option<OracleEvent> {
        self.events.pop_front()
    }
}

#[cfg(test)]
mod tests;
