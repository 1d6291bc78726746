//! VM scheduler interface.

use crate::common::PeId;
use crate::vm::WorkloadVm;

/// Distributes the processing capacity of host PEs among hosted VMs.
///
/// The host releases all allocations and then allocates every VM again at each step, so the scheduler always places
/// the current demand from scratch.
pub trait VmScheduler {
    /// Releases all PE capacity allocated to VM.
    fn deallocate(&mut self, vm: &dyn WorkloadVm);

    /// Allocates PE capacity for VM according to its per-PE requested MIPS.
    ///
    /// Returns false if the request could not be satisfied. The scheduler may still grant part of the request,
    /// which is then reported by [`allocated_capacity`](VmScheduler::allocated_capacity).
    fn allocate(&mut self, vm: &dyn WorkloadVm, shares: &[f64]) -> bool;

    /// Returns the total MIPS currently allocated to VM.
    fn allocated_capacity(&self, vm: &dyn WorkloadVm) -> f64;

    /// Returns the PEs which currently provide capacity to VM.
    fn units_assigned_to(&self, vm: &dyn WorkloadVm) -> Vec<PeId>;

    /// Returns the capacity of a single PE in MIPS.
    fn unit_capacity(&self) -> f64;
}
