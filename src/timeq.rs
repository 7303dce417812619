/*
Time helpers shared by the bridge and the oracles.

Two clocks are in play.  The PE clock drives the outer scheduler: one `tick_one` of any module is
one PE cycle.  The oracle runs its own clock, `clock_ratio` internal cycles per PE cycle, and
reports completions in its own cycles.  Latencies leave the bridge in time units: oracle cycles
multiplied by the configured `cycle_duration`.
*/

use crate::base::module::IsModule;

pub type Cycle = u64;

// Helper to read the current PE cycle from any module
pub fn module_now<M: IsModule>(module: &M) -> Cycle {
    module.base_ref().cycle
}

/// Elapsed oracle cycles between submission and completion, converted to time units.
/// Returns None if the completion precedes the submission or the product does not fit.
pub fn cycles_to_time(submitted_at: Cycle, completed_at: Cycle, cycle_duration: u64) -> Option<u64> {
    completed_at
        .checked_sub(submitted_at)?
        .checked_mul(cycle_duration)
}
