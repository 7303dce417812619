use std::sync::Arc;

use crate::bridge::{BridgeConfig, MemoryBridge, MemoryOperation, OriginId};
use crate::builtin::queue::QueueRef;
use crate::oracle::scripted::ScriptedOracle;
use crate::sim::log::Logger;


pub(super) struct Harness {
    pub bridge: MemoryBridge<ScriptedOracle>,
    pub ingress: QueueRef<MemoryOperation>,
    pub egress: Vec<QueueRef<MemoryOperation>>,
}

pub(super) fn make_bridge(
    oracle: ScriptedOracle,
    config: BridgeConfig,
    origins: &[OriginId],
    egress_capacity: usize,
) -> Harness {
    let ingress = QueueRef::bounded(64);
    let logger = Arc::new(Logger::silent());
    let mut bridge = MemoryBridge::new(Arc::new(config), oracle, ingress.clone(), &logger);
    let mut egress = Vec::new();
    for &origin in origins {
        let queue = QueueRef::bounded(egress_capacity);
        bridge.connect_origin(origin, queue.clone()).unwrap();
        egress.push(queue);
    }
    Harness {
        bridge,
        ingress,
        egress,
    }
}

pub(super) fn unit_config(cycle_duration: u64) -> BridgeConfig {
    BridgeConfig {
        clock_ratio: 1,
        cycle_duration,
    }
}
