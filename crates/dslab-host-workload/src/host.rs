//! Physical host hosting VMs.

use crate::common::VmUid;
use crate::resources::{ProcessingElements, ResourceProvisioner};
use crate::scheduler::VmScheduler;
use crate::vm::VmRef;

/// Physical host with its processing elements, RAM and bandwidth, VM scheduler and a list of hosted VMs.
///
/// VMs are kept in the order they were added, which is the order used by all per-VM computations.
pub struct Host {
    pub id: u32,
    pub(crate) vms: Vec<VmRef>,
    pub(crate) scheduler: Box<dyn VmScheduler>,
    pub(crate) pes: Box<dyn ProcessingElements>,
    pub(crate) ram_provisioner: Box<dyn ResourceProvisioner>,
    pub(crate) bw_provisioner: Box<dyn ResourceProvisioner>,
}

impl Host {
    pub fn new(
        id: u32,
        scheduler: Box<dyn VmScheduler>,
        pes: Box<dyn ProcessingElements>,
        ram_provisioner: Box<dyn ResourceProvisioner>,
        bw_provisioner: Box<dyn ResourceProvisioner>,
    ) -> Self {
        Self {
            id,
            vms: Vec::new(),
            scheduler,
            pes,
            ram_provisioner,
            bw_provisioner,
        }
    }

    /// Places VM on the host.
    pub fn add_vm(&mut self, vm: VmRef) {
        self.vms.push(vm);
    }

    /// Removes VM from the host, releasing its PEs, and returns it.
    pub fn remove_vm(&mut self, uid: &VmUid) -> Option<VmRef> {
        let pos = self.vms.iter().position(|vm| vm.borrow().uid() == uid)?;
        let vm = self.vms.remove(pos);
        self.scheduler.deallocate(&*vm.borrow());
        Some(vm)
    }

    pub fn vms(&self) -> &[VmRef] {
        &self.vms
    }

    pub fn vm(&self, uid: &VmUid) -> Option<&VmRef> {
        self.vms.iter().find(|vm| vm.borrow().uid() == uid)
    }

    pub fn scheduler(&self) -> &dyn VmScheduler {
        self.scheduler.as_ref()
    }

    pub fn pes(&self) -> &dyn ProcessingElements {
        self.pes.as_ref()
    }

    pub fn ram_provisioner(&self) -> &dyn ResourceProvisioner {
        self.ram_provisioner.as_ref()
    }

    pub fn bw_provisioner(&self) -> &dyn ResourceProvisioner {
        self.bw_provisioner.as_ref()
    }

    /// Returns the total processing capacity of the host in MIPS.
    pub fn total_capacity(&self) -> f64 {
        self.pes.total_capacity()
    }
}
