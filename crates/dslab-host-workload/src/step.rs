//! Base host step.

use crate::scheduler::VmScheduler;
use crate::vm::VmRef;

/// Part of the host step performed before the workload accounting, e.g. advancing VM execution.
pub trait HostStep {
    /// Updates VM processing up to `current_time` and returns the time of the next expected event.
    fn advance(&mut self, vms: &[VmRef], scheduler: &dyn VmScheduler, current_time: f64) -> f64;
}

/// Host step which does nothing and never expects another event.
#[derive(Default)]
pub struct IdleHostStep {}

impl IdleHostStep {
    pub fn new() -> Self {
        Self {}
    }
}

impl HostStep for IdleHostStep {
    fn advance(&mut self, _vms: &[VmRef], _scheduler: &dyn VmScheduler, _current_time: f64) -> f64 {
        f64::MAX
    }
}
