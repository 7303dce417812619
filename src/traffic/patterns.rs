use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;

use crate::bridge::OriginId;
use crate::traffic::config::TrafficConfig;

const LINE_BYTES: u64 = 64;

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum PatternKind {
    /// Consecutive lines.
    #[default]
    Sequential,
    /// Every `stride` bytes.
    Strided,
    /// Uniform over the origin's window, line aligned.
    Random,
}

/// Address and direction stream for one origin.  Each origin owns the window
/// `[base_address + origin * span_bytes, +span_bytes)`.
#[derive(Debug, Clone)]
pub struct AddressPattern {
    kind: PatternKind,
    window_base: u64,
    span: u64,
    stride: u64,
    read_ratio: f64,
    next_index: u64,
    rng: StdRng,
}

impl AddressPattern {
    pub fn new(config: &TrafficConfig, origin: OriginId) -> Self {
        let span = (config.span_bytes / LINE_BYTES).max(1) * LINE_BYTES;
        let window_base = config
            .base_address
            .saturating_add((origin as u64).saturating_mul(span));
        Self {
            kind: config.pattern,
            window_base,
            span,
            stride: config.stride.max(1),
            read_ratio: config.read_ratio.clamp(0.0, 1.0),
            next_index: 0,
            rng: StdRng::seed_from_u64(mix64(config.seed ^ ((origin as u64) << 32))),
        }
    }

    pub fn window(&self) -> (u64, u64) {
        (self.window_base, self.window_base.saturating_add(self.span))
    }

    /// Next `(address, is_write)`.
    pub fn next_access(&mut self) -> (u64, bool) {
        let offset = match self.kind {
            PatternKind::Sequential => self.next_index.wrapping_mul(LINE_BYTES) % self.span,
            PatternKind::Strided => self.next_index.wrapping_mul(self.stride) % self.span,
            PatternKind::Random => self.rng.gen_range(0..self.span / LINE_BYTES) * LINE_BYTES,
        };
        self.next_index = self.next_index.wrapping_add(1);
        let is_write = !self.rng.gen_bool(self.read_ratio);
        (self.window_base + offset, is_write)
    }
}

fn mix64(mut x: u64) -> u64 {
    x ^= x >> 30;
    x = x.wrapping_mul(0xbf58_476d_1ce4_e5b9);
    x ^= x >> 27;
    x = x.wrapping_mul(0x94d0_49bb_1331_11eb);
    x ^ (x >> 31)
}
