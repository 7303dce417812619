use std::sync::Arc;

use serde::Serialize;

use crate::base::behavior::*;
use crate::base::module::{module, IsModule, ModuleBase};
use crate::bridge::{BridgeError, MemoryOperation, OriginId};
use crate::builtin::queue::QueueRef;
use crate::debug;
use crate::sim::log::Logger;
use crate::timeq::module_now;
use crate::traffic::config::TrafficConfig;
use crate::traffic::patterns::AddressPattern;

/// Progress through the request budget.  Survives `reset`.
#[derive(Debug, Default, Clone, Copy)]
struct Progress {
    next_id: u64,
    reads_issued: u64,
    writes_issued: u64,
    outstanding: usize,
}

/// Response statistics for the current window.
#[derive(Debug, Default, Clone, Copy)]
struct ResponseWindow {
    responses: u64,
    latency_sum: u64,
    max_latency: u64,
}

#[derive(Debug, Default)]
pub struct OriginState {
    progress: Progress,
    window: ResponseWindow,
}

#[derive(Debug, Clone, Serialize)]
pub struct OriginSummary {
    pub origin: OriginId,
    pub reads_issued: u64,
    pub writes_issued: u64,
    pub responses: u64,
    pub outstanding: usize,
    pub average_latency: Option<f64>,
    pub max_latency: u64,
}

/// A synthetic PE.  Issues at most one request per cycle into the shared ingress queue and
/// consumes its read responses from its own egress queue.
pub struct TrafficOrigin {
    base: ModuleBase<OriginState, TrafficConfig>,
    id: OriginId,
    ingress: QueueRef<MemoryOperation>,
    egress: QueueRef<MemoryOperation>,
    pattern: AddressPattern,
    logger: Arc<Logger>,
}

module!(TrafficOrigin, OriginState, TrafficConfig,);

impl TrafficOrigin {
    pub fn new(
        config: Arc<TrafficConfig>,
        id: OriginId,
        ingress: QueueRef<MemoryOperation>,
        logger: &Arc<Logger>,
    ) -> Self {
        let pattern = AddressPattern::new(&config, id);
        let egress = QueueRef::bounded(config.egress_capacity);
        let mut me = Self {
            base: ModuleBase::default(),
            id,
            ingress,
            egress,
            pattern,
            logger: Arc::clone(logger),
        };
        me.init_conf(config);
        me
    }

    pub fn id(&self) -> OriginId {
        self.id
    }

    /// Queue the bridge delivers this origin's read responses to.
    pub fn egress(&self) -> &QueueRef<MemoryOperation> {
        &self.egress
    }

    pub fn outstanding(&self) -> usize {
        self.base.state.progress.outstanding
    }

    pub fn issued(&self) -> u64 {
        let progress = &self.base.state.progress;
        progress.reads_issued + progress.writes_issued
    }

    /// Budget exhausted and every read answered.
    pub fn is_done(&self) -> bool {
        self.issued() >= self.conf().requests_per_origin && self.outstanding() == 0
    }

    pub fn summary(&self) -> OriginSummary {
        let OriginState { progress, window } = &self.base.state;
        OriginSummary {
            origin: self.id,
            reads_issued: progress.reads_issued,
            writes_issued: progress.writes_issued,
            responses: window.responses,
            outstanding: progress.outstanding,
            average_latency: (window.responses > 0)
                .then(|| window.latency_sum as f64 / window.responses as f64),
            max_latency: window.max_latency,
        }
    }

    fn drain_responses(&mut self) {
        while let Some(response) = self.egress.pop() {
            assert!(response.is_response, "non-response on egress of origin {}", self.id);
            assert_eq!(response.origin, self.id, "response routed to the wrong origin");
            let latency = response.latency.unwrap_or_default();
            let state = &mut self.base.state;
            state.progress.outstanding = state.progress.outstanding.saturating_sub(1);
            state.window.responses += 1;
            state.window.latency_sum = state.window.latency_sum.saturating_add(latency);
            state.window.max_latency = state.window.max_latency.max(latency);
            debug!(
                self.logger,
                module_now(self),
                "origin {} got response id={} addr={:#x} latency={}",
                self.id,
                response.id,
                response.address,
                latency
            );
        }
    }

    fn issue(&mut self) {
        let config = self.conf();
        if self.issued() >= config.requests_per_origin
            || self.outstanding() >= config.max_outstanding
            || self.ingress.is_full()
        {
            return;
        }
        let (address, is_write) = self.pattern.next_access();
        let progress = &mut self.base.state.progress;
        let op = MemoryOperation::new(self.id, address, is_write).with_id(progress.next_id);
        if self.ingress.try_push(op).is_err() {
            return;
        }
        progress.next_id += 1;
        if is_write {
            progress.writes_issued += 1;
        } else {
            progress.reads_issued += 1;
            progress.outstanding += 1;
        }
    }
}

impl ModuleBehaviors for TrafficOrigin {
    fn tick_one(&mut self) -> Result<(), BridgeError> {
        self.drain_responses();
        self.issue();
        self.base.advance_cycle();
        Ok(())
    }

    fn reset(&mut self) {
        self.base.state.window = ResponseWindow::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin(config: TrafficConfig, ingress: &QueueRef<MemoryOperation>) -> TrafficOrigin {
        TrafficOrigin::new(Arc::new(config), 3, ingress.clone(), &Arc::new(Logger::silent()))
    }

    fn respond(origin: &TrafficOrigin, mut op: MemoryOperation, latency: u64) {
        op.is_response = true;
        op.latency = Some(latency);
        origin.egress().try_push(op).unwrap();
    }

    #[test]
    fn reads_are_capped_by_max_outstanding() {
        let ingress = QueueRef::bounded(16);
        let mut origin = origin(
            TrafficConfig {
                read_ratio: 1.0,
                max_outstanding: 2,
                requests_per_origin: 10,
                ..TrafficConfig::default()
            },
            &ingress,
        );
        for _ in 0..5 {
            origin.tick_one().unwrap();
        }
        assert_eq!(ingress.available(), 2);
        assert_eq!(origin.outstanding(), 2);

        let first = ingress.pop().unwrap();
        assert_eq!(first.origin, 3);
        assert_eq!(first.id, 0);
        respond(&origin, first, 9000);
        origin.tick_one().unwrap();
        assert_eq!(origin.outstanding(), 2);
        assert_eq!(origin.issued(), 3);
        let summary = origin.summary();
        assert_eq!(summary.responses, 1);
        assert_eq!(summary.average_latency, Some(9000.0));
    }

    #[test]
    fn writes_do_not_hold_budget() {
        let ingress = QueueRef::bounded(16);
        let mut origin = origin(
            TrafficConfig {
                read_ratio: 0.0,
                max_outstanding: 1,
                requests_per_origin: 4,
                ..TrafficConfig::default()
            },
            &ingress,
        );
        for _ in 0..6 {
            origin.tick_one().unwrap();
        }
        assert_eq!(ingress.available(), 4);
        assert!(origin.is_done());
        assert_eq!(origin.summary().writes_issued, 4);
    }

    #[test]
    fn full_ingress_stalls_issue() {
        let ingress = QueueRef::bounded(1);
        let mut origin = origin(
            TrafficConfig {
                read_ratio: 0.0,
                requests_per_origin: 4,
                ..TrafficConfig::default()
            },
            &ingress,
        );
        origin.tick_one().unwrap();
        origin.tick_one().unwrap();
        assert_eq!(origin.issued(), 1);
        assert!(!origin.is_done());
    }

    #[test]
    fn reset_clears_window_only() {
        let ingress = QueueRef::bounded(16);
        let mut origin = origin(
            TrafficConfig {
                read_ratio: 1.0,
                requests_per_origin: 1,
                ..TrafficConfig::default()
            },
            &ingress,
        );
        origin.tick_one().unwrap();
        respond(&origin, ingress.pop().unwrap(), 100);
        origin.tick_one().unwrap();
        origin.reset();
        let summary = origin.summary();
        assert_eq!(summary.responses, 0);
        assert_eq!(summary.average_latency, None);
        assert_eq!(summary.reads_issued, 1);
        assert!(origin.is_done());
    }

    #[test]
    #[should_panic(expected = "response routed to the wrong origin")]
    fn misrouted_response_is_fatal() {
        let ingress = QueueRef::bounded(4);
        let mut origin = origin(TrafficConfig::default(), &ingress);
        respond(&origin, MemoryOperation::read(7, 0x40), 1);
        origin.tick_one().unwrap();
    }
}
