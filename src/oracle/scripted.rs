use std::collections::VecDeque;

use super::{Direction, OracleEvent, PowerSample, TimingOracle, TransactionHandle};
use crate::timeq::Cycle;

#[derive(Debug, Clone)]
pub(crate) struct Submission {
    pub handle: TransactionHandle,
    pub address: u64,
    pub direction: Direction,
    pub cycle: Cycle,
}

/// Fixed-latency oracle for tests.  Every transaction completes `latency` internal cycles after
/// submission; extra events can be injected to be delivered on the next advance.
#[derive(Debug)]
pub(crate) struct ScriptedOracle {
    pub capacity: usize,
    pub latency: Cycle,
    pub clock_ratio: u32,
    pub power_every: Option<(Cycle, PowerSample)>,
    cycle: Cycle,
    next_handle: u64,
    outstanding: Vec<(TransactionHandle, Direction, Cycle)>,
    injected: Vec<OracleEvent>,
    events: VecDeque<OracleEvent>,
    pub submissions: Vec<Submission>,
}

impl ScriptedOracle {
    pub fn new(capacity: usize, latency: Cycle) -> Self {
        Self {
            capacity,
            latency,
            clock_ratio: 1,
            power_every: None,
            cycle: 0,
            next_handle: 100,
            outstanding: Vec::new(),
            injected: Vec::new(),
            events: VecDeque::new(),
            submissions: Vec::new(),
        }
    }

    pub fn set_cycle(&mut self, cycle: Cycle) {
        self.cycle = cycle;
    }

    pub fn inject(&mut self, event: OracleEvent) {
        self.injected.push(event);
    }

    pub fn outstanding(&self) -> usize {
        self.outstanding.len()
    }
}

impl TimingOracle for ScriptedOracle {
    fn set_clock_ratio(&mut self, ratio: u32) {
        self.clock_ratio = ratio;
    }

    fn can_accept(&self) -> bool {
        self.outstanding.len() < self.capacity
    }

    fn submit(&mut self, address: u64, direction: Direction) -> TransactionHandle {
        assert!(self.can_accept(), "submit without capacity");
        let handle = TransactionHandle::new(self.next_handle);
        self.next_handle += 1;
        self.outstanding
            .push((handle, direction, self.cycle + self.latency));
        self.submissions.push(Submission {
            handle,
            address,
            direction,
            cycle: self.cycle,
        });
        handle
    }

    fn advance_one_cycle(&mut self) {
        self.events.extend(self.injected.drain(..));
        for _ in 0..self.clock_ratio.max(1) {
            self.cycle += 1;
            let now = self.cycle;
            let mut idx = 0;
            while idx < self.outstanding.len() {
                let (handle, direction, done_at) = self.outstanding[idx];
                if done_at > now {
                    idx += 1;
                    continue;
                }
                self.outstanding.remove(idx);
                self.events.push_back(match direction {
                    Direction::Read => OracleEvent::ReadComplete { handle, cycle: now },
                    Direction::Write => OracleEvent::WriteComplete { handle, cycle: now },
                });
            }
            if let Some((every, sample)) = self.power_every {
                if every > 0 && now % every == 0 {
                    self.events.push_back(OracleEvent::PowerSample(sample));
                }
            }
        }
    }

    fn current_cycle(&self) -> Cycle {
        self.cycle
    }

    fn poll_event(&mut self) -> Option<OracleEvent> {
        self.events.pop_front()
    }
}
