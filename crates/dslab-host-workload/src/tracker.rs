//! Per-step accounting of MIPS delivered by host to its VMs.

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;

use log::Level;
use serde::Serialize;

use crate::common::VmUid;
use crate::config::HostWorkloadConfig;
use crate::history::{UnderAllocationEntry, UnderAllocationRecord};
use crate::host::Host;
use crate::logger::Logger;
use crate::step::HostStep;
use crate::utilization::{clamp_utilization, UtilizationState};
use crate::vm::{VmRef, WorkloadVm};

/// Host state after the last step, reported to monitoring.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct HostWorkloadSnapshot {
    pub host_id: u32,
    pub time: f64,
    pub cpu_load: f64,
    pub previous_cpu_load: f64,
    pub cpu_mips: f64,
    pub max_pe_load: f64,
    pub ram_used: f64,
    pub bw_used: f64,
    pub vm_count: usize,
    pub vms_migrating_in: usize,
}

/// Host with dynamic VM workload.
///
/// At every step the VM demand is placed from scratch: all VM allocations are released, then each VM is allocated
/// its currently requested MIPS, and the result is accounted in host utilization and VM under-allocation history.
pub struct HostWorkloadTracker {
    host: Host,
    base_step: Box<dyn HostStep>,
    vms_migrating_in: BTreeSet<VmUid>,
    utilization: UtilizationState,
    under_allocation: UnderAllocationRecord,
    component: String,
    time: f64,
    config: Rc<HostWorkloadConfig>,
    logger: Rc<RefCell<Box<dyn Logger>>>,
}

impl HostWorkloadTracker {
    pub fn new(
        host: Host,
        base_step: Box<dyn HostStep>,
        config: Rc<HostWorkloadConfig>,
        logger: Rc<RefCell<Box<dyn Logger>>>,
    ) -> Self {
        let under_allocation = match config.history_limit {
            Some(limit) => UnderAllocationRecord::with_limit(limit),
            None => UnderAllocationRecord::new(),
        };
        Self {
            component: format!("host#{}", host.id),
            host,
            base_step,
            vms_migrating_in: BTreeSet::new(),
            utilization: UtilizationState::new(),
            under_allocation,
            time: 0.,
            config,
            logger,
        }
    }

    pub fn id(&self) -> u32 {
        self.host.id
    }

    pub fn host(&self) -> &Host {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut Host {
        &mut self.host
    }

    /// Processes a simulation step at `current_time` and returns the time of the next event expected by the host.
    pub fn advance(&mut self, current_time: f64) -> f64 {
        self.time = current_time;
        let next_event_time = self
            .base_step
            .advance(&self.host.vms, self.host.scheduler.as_ref(), current_time);

        self.utilization.begin_step();

        for vm in self.host.vms.iter() {
            self.host.scheduler.deallocate(&*vm.borrow());
        }

        for vm in self.host.vms.iter() {
            let vm = vm.borrow();
            let shares = vm.requested_shares();
            if !self.host.scheduler.allocate(&*vm, &shares) {
                self.log_debug(format!("scheduler failed to allocate requested MIPS for vm #{}", vm.id()));
            }
        }

        for i in 0..self.host.vms.len() {
            let vm = self.host.vms[i].clone();
            self.settle(&*vm.borrow());
        }

        next_event_time
    }

    /// Accounts MIPS allocated to VM at the current step.
    fn settle(&mut self, vm: &dyn WorkloadVm) {
        let requested = vm.requested_total_capacity();
        if requested == 0. {
            self.log_debug(format!("vm #{} has completed its execution", vm.id()));
            return;
        }

        let mut allocated = self.host.scheduler.allocated_capacity(vm);
        if self.logger.borrow().enabled(Level::Debug) {
            self.log_allocation(vm, requested, allocated);
        }

        if self.vms_migrating_in.contains(vm.uid()) {
            self.log_debug(format!("vm #{} is being migrated to host #{}", vm.id(), self.host.id));
        } else {
            if allocated + self.config.under_allocation_tolerance < requested {
                self.log_info(format!(
                    "under allocated MIPS for vm #{}: {:.2}",
                    vm.id(),
                    requested - allocated
                ));
                self.under_allocation.append(vm.uid(), requested, allocated);
            }
            if vm.is_in_migration() {
                self.log_debug(format!("vm #{} is in migration", vm.id()));
                allocated /= self.config.migration_throughput_factor();
            }
        }

        self.utilization.add(allocated);
    }

    fn log_allocation(&self, vm: &dyn WorkloadVm, requested: f64, allocated: f64) {
        let nominal = vm.nominal_capacity();
        let requested_pct = if nominal > 0. { requested / nominal * 100. } else { 0. };
        self.log_debug(format!(
            "total allocated MIPS for vm #{} is {:.2}, was requested {:.2} out of total {:.2} ({:.2}%)",
            vm.id(),
            allocated,
            requested,
            nominal,
            requested_pct
        ));

        let pes = self
            .host
            .scheduler
            .units_assigned_to(vm)
            .iter()
            .map(|pe| format!(" PE #{}: {:.2}.", pe, self.host.pes.allocated_to(*pe, vm.uid())))
            .collect::<String>();
        self.log_debug(format!(
            "MIPS for vm #{} by PEs ({} * {:.2}).{}",
            vm.id(),
            self.host.pes.count(),
            self.host.scheduler.unit_capacity(),
            pes
        ));
    }

    fn log_debug(&self, log: String) {
        self.logger.borrow_mut().log_debug(self.time, &self.component, log);
    }

    fn log_info(&self, log: String) {
        self.logger.borrow_mut().log_info(self.time, &self.component, log);
    }

    // Migrations ------------------------------------------------------------------------------------------------------

    /// Marks VM as being migrated to this host.
    pub fn add_migrating_in_vm(&mut self, uid: VmUid) {
        self.vms_migrating_in.insert(uid);
    }

    /// Unmarks VM as being migrated to this host, returns false if it was not marked.
    pub fn remove_migrating_in_vm(&mut self, uid: &VmUid) -> bool {
        self.vms_migrating_in.remove(uid)
    }

    pub fn is_migrating_in(&self, uid: &VmUid) -> bool {
        self.vms_migrating_in.contains(uid)
    }

    pub fn vms_migrating_in(&self) -> &BTreeSet<VmUid> {
        &self.vms_migrating_in
    }

    // Metrics ---------------------------------------------------------------------------------------------------------

    /// Returns the maximum utilization among all host PEs.
    pub fn max_utilization(&self) -> f64 {
        self.host.pes.max_utilization()
    }

    /// Returns the maximum utilization among host PEs allocated to VM.
    pub fn max_utilization_for_vm(&self, vm: &dyn WorkloadVm) -> f64 {
        let units = self.host.scheduler.units_assigned_to(vm);
        self.host.pes.max_utilization_among(&units)
    }

    /// Returns the amount of RAM provisioned to VMs.
    pub fn ram_utilization(&self) -> f64 {
        self.host.ram_provisioner.used()
    }

    /// Returns the amount of bandwidth provisioned to VMs.
    pub fn bandwidth_utilization(&self) -> f64 {
        self.host.bw_provisioner.used()
    }

    /// Returns the current CPU utilization as a fraction of the host capacity.
    pub fn cpu_utilization_fraction(&self) -> f64 {
        self.utilization_fraction(self.utilization.current())
    }

    /// Returns CPU utilization at the previous step as a fraction of the host capacity.
    pub fn previous_cpu_utilization_fraction(&self) -> f64 {
        self.utilization_fraction(self.utilization.previous())
    }

    fn utilization_fraction(&self, mips: f64) -> f64 {
        let total = self.host.total_capacity();
        if total == 0. {
            return 0.;
        }
        clamp_utilization(mips / total, self.config.utilization_clamp_margin)
    }

    /// Returns the current CPU utilization in MIPS.
    pub fn cpu_utilization_absolute(&self) -> f64 {
        self.utilization.current()
    }

    /// Returns CPU utilization at the previous step in MIPS.
    pub fn previous_cpu_utilization_absolute(&self) -> f64 {
        self.utilization.previous()
    }

    /// Returns host state after the last step.
    pub fn snapshot(&self) -> HostWorkloadSnapshot {
        HostWorkloadSnapshot {
            host_id: self.host.id,
            time: self.time,
            cpu_load: self.cpu_utilization_fraction(),
            previous_cpu_load: self.previous_cpu_utilization_fraction(),
            cpu_mips: self.cpu_utilization_absolute(),
            max_pe_load: self.max_utilization(),
            ram_used: self.ram_utilization(),
            bw_used: self.bandwidth_utilization(),
            vm_count: self.host.vms.len(),
            vms_migrating_in: self.vms_migrating_in.len(),
        }
    }

    // VMs -------------------------------------------------------------------------------------------------------------

    /// Returns VMs which have completed their execution and are not in migration.
    ///
    /// VMs stay on the host, removing them is up to the caller.
    pub fn completed_vms(&self) -> impl Iterator<Item = &VmRef> + '_ {
        self.host.vms.iter().filter(|vm| {
            let vm = vm.borrow();
            !vm.is_in_migration() && vm.requested_total_capacity() == 0.
        })
    }

    /// Returns under-allocation history of VM.
    pub fn under_allocation_history(&self, uid: &VmUid) -> &[UnderAllocationEntry] {
        self.under_allocation.get(uid)
    }

    pub fn under_allocation(&self) -> &UnderAllocationRecord {
        &self.under_allocation
    }

    /// Gives access to the history so that the simulation can truncate or export it.
    pub fn under_allocation_mut(&mut self) -> &mut UnderAllocationRecord {
        &mut self.under_allocation
    }
}
