//! Host resources: processing elements, RAM and bandwidth.

use crate::common::{PeId, VmUid};

/// The set of processing elements (PEs) of a host.
pub trait ProcessingElements {
    /// Returns the number of PEs.
    fn count(&self) -> usize;

    /// Returns the summary capacity of all PEs in MIPS.
    fn total_capacity(&self) -> f64;

    /// Returns the maximum utilization (from 0 to 1) among all PEs.
    fn max_utilization(&self) -> f64;

    /// Returns the maximum utilization among the specified PEs.
    fn max_utilization_among(&self, units: &[PeId]) -> f64;

    /// Returns MIPS of the specified PE currently allocated to VM.
    fn allocated_to(&self, pe: PeId, vm: &VmUid) -> f64;
}

/// Provisioner of RAM or network bandwidth of a host.
pub trait ResourceProvisioner {
    /// Returns the amount of resource currently provisioned to VMs.
    fn used(&self) -> f64;
}
