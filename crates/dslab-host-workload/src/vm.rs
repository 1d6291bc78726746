//! Representation of VM as seen by the host.

use std::cell::RefCell;
use std::rc::Rc;

use crate::common::VmUid;

/// Read-only view of a virtual machine (VM) hosted on a physical host.
///
/// The demand of VM changes over time, so the host queries it at every simulation step. VM objects are owned by the
/// simulation and shared with the host, which never modifies them.
pub trait WorkloadVm {
    /// Returns numeric VM id.
    fn id(&self) -> u32;

    /// Returns unique VM identity.
    fn uid(&self) -> &VmUid;

    /// Returns the peak processing capacity of VM in MIPS.
    fn nominal_capacity(&self) -> f64;

    /// Returns the currently requested MIPS for each virtual PE of VM.
    fn requested_shares(&self) -> Vec<f64>;

    /// Returns the currently requested total MIPS. Zero means VM has completed its execution.
    fn requested_total_capacity(&self) -> f64 {
        self.requested_shares().iter().sum()
    }

    /// Checks whether VM is being migrated, either from or to some host.
    fn is_in_migration(&self) -> bool;
}

pub type VmRef = Rc<RefCell<dyn WorkloadVm>>;
