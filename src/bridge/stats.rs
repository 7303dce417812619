use serde::Serialize;
use std::ops::AddAssign;

use crate::oracle::PowerSample;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PowerComponent {
    Background,
    Burst,
    Refresh,
    ActivatePrecharge,
}

impl PowerComponent {
    pub const ALL: [PowerComponent; 4] = [
        Self::Background,
        Self::Burst,
        Self::Refresh,
        Self::ActivatePrecharge,
    ];

    fn index(self) -> usize {
        match self {
            Self::Background => 0,
            Self::Burst => 1,
            Self::Refresh => 2,
            Self::ActivatePrecharge => 3,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Background => "background",
            Self::Burst => "burst",
            Self::Refresh => "refresh",
            Self::ActivatePrecharge => "act_pre",
        }
    }
}

/// Running latency and power sums.  Counts only grow; an average over zero samples is `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatisticsAccumulator {
    latency_sum: u64,
    latency_samples: u64,
    power_sum: [f64; 4],
    power_samples: u64,
}

impl StatisticsAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn latency_sum(&self) -> u64 {
        self.latency_sum
    }

    pub fn latency_samples(&self) -> u64 {
        self.latency_samples
    }

    pub fn power_sum(&self, component: PowerComponent) -> f64 {
        self.power_sum[component.index()]
    }

    pub fn power_samples(&self) -> u64 {
        self.power_samples
    }

    pub fn record_latency(&mut self, latency: u64) {
        self.latency_sum = self.latency_sum.saturating_add(latency);
        self.latency_samples = self.latency_samples.saturating_add(1);
    }

    pub fn record_power(&mut self, sample: &PowerSample) {
        self.power_sum[PowerComponent::Background.index()] += sample.background;
        self.power_sum[PowerComponent::Burst.index()] += sample.burst;
        self.power_sum[PowerComponent::Refresh.index()] += sample.refresh;
        self.power_sum[PowerComponent::ActivatePrecharge.index()] += sample.act_pre;
        self.power_samples = self.power_samples.saturating_add(1);
    }

    pub fn average_latency(&self) -> Option<f64> {
        (self.latency_samples > 0).then(|| self.latency_sum as f64 / self.latency_samples as f64)
    }

    pub fn average_power(&self, component: PowerComponent) -> Option<f64> {
        (self.power_samples > 0)
            .then(|| self.power_sum[component.index()] / self.power_samples as f64)
    }

    pub fn accumulate_from(&mut self, other: &StatisticsAccumulator) {
        *self += other;
    }

    pub fn summary(&self) -> StatsSummary {
        StatsSummary {
            latency_samples: self.latency_samples,
            average_latency: self.average_latency(),
            power_samples: self.power_samples,
            average_power: PowerSummary {
                background: self.average_power(PowerComponent::Background),
                burst: self.average_power(PowerComponent::Burst),
                refresh: self.average_power(PowerComponent::Refresh),
                act_pre: self.average_power(PowerComponent::ActivatePrecharge),
            },
        }
    }
}

impl AddAssign<&StatisticsAccumulator> for StatisticsAccumulator {
    fn add_assign(&mut self, other: &StatisticsAccumulator) {
        self.latency_sum = self.latency_sum.saturating_add(other.latency_sum);
        self.latency_samples = self.latency_samples.saturating_add(other.latency_samples);
        for (sum, other_sum) in self.power_sum.iter_mut().zip(other.power_sum.iter()) {
            *sum += other_sum;
        }
        self.power_samples = self.power_samples.saturating_add(other.power_samples);
    }
}

impl AddAssign<StatisticsAccumulator> for StatisticsAccumulator {
    fn add_assign(&mut self, other: StatisticsAccumulator) {
        *self += &other;
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct PowerSummary {
    pub background: Option<f64>,
    pub burst: Option<f64>,
    pub refresh: Option<f64>,
    pub act_pre: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct StatsSummary {
    pub latency_samples: u64,
    pub average_latency: Option<f64>,
    pub power_samples: u64,
    pub average_power: PowerSummary,
}
