//! Aggregate CPU utilization of host.

/// MIPS delivered to all hosted VMs at the current and the previous step.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UtilizationState {
    current: f64,
    previous: f64,
}

impl UtilizationState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Saves the current value as previous and starts accumulating from zero.
    pub fn begin_step(&mut self) {
        self.previous = self.current;
        self.current = 0.;
    }

    /// Accounts MIPS delivered to some VM at the current step.
    pub fn add(&mut self, mips: f64) {
        self.current += mips;
    }

    pub fn current(&self) -> f64 {
        self.current
    }

    pub fn previous(&self) -> f64 {
        self.previous
    }
}

/// Reports utilization slightly above 1 as 1.
///
/// Per-PE allocations summed over a host accumulate rounding errors, so values within `(1, 1 + margin]` are treated
/// as full utilization. Larger values indicate overallocation and are returned as is.
pub fn clamp_utilization(utilization: f64, margin: f64) -> f64 {
    if utilization > 1. && utilization <= 1. + margin {
        1.
    } else {
        utilization
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn begin_step_keeps_previous_value() {
        let mut state = UtilizationState::new();
        state.add(300.);
        state.add(200.);
        assert_eq!(state.current(), 500.);
        assert_eq!(state.previous(), 0.);

        state.begin_step();
        assert_eq!(state.current(), 0.);
        assert_eq!(state.previous(), 500.);

        state.add(100.);
        state.begin_step();
        assert_eq!(state.previous(), 100.);
    }

    #[test]
    fn clamp_policy() {
        assert_eq!(clamp_utilization(0.5, 0.01), 0.5);
        assert_eq!(clamp_utilization(1., 0.01), 1.);
        assert_eq!(clamp_utilization(1.005, 0.01), 1.);
        assert_eq!(clamp_utilization(1.01, 0.01), 1.);
        assert_eq!(clamp_utilization(1.02, 0.01), 1.02);
        assert_eq!(clamp_utilization(1.08, 0.01), 1.08);
    }
}
