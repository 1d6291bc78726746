//! Replay of recorded VM demand and scheduler decisions.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;

use serde::Deserialize;

use dslab_host_workload::{HostStep, PeId, ProcessingElements, ResourceProvisioner, VmRef, VmScheduler, VmUid, WorkloadVm};

/// Host description from the trace file.
#[derive(Debug, Deserialize, Clone)]
pub struct HostTrace {
    pub id: u32,
    pub pes: u32,
    pub pe_mips: f64,
}

/// Recorded demand of a single VM. Per-step values are indexed by the global step number.
#[derive(Debug, Deserialize, Clone)]
pub struct VmTrace {
    pub id: u32,
    #[serde(default)]
    pub user_id: u32,
    /// Step at which VM is placed on the host.
    #[serde(default)]
    pub start: usize,
    pub mips: f64,
    pub pes: u32,
    pub ram: f64,
    pub bw: f64,
    pub requested: Vec<f64>,
    /// MIPS granted by the scheduler, the full request is granted if absent.
    pub granted: Option<Vec<f64>>,
    #[serde(default)]
    pub migrating: Vec<bool>,
    #[serde(default)]
    pub migrating_in: Vec<bool>,
}

impl VmTrace {
    pub fn uid(&self) -> VmUid {
        VmUid::new(self.user_id, self.id)
    }

    pub fn requested_at(&self, step: usize) -> f64 {
        self.requested.get(step).copied().unwrap_or(0.)
    }

    pub fn is_migrating_in_at(&self, step: usize) -> bool {
        self.migrating_in.get(step).copied().unwrap_or(false)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct Trace {
    pub step_duration: f64,
    pub host: HostTrace,
    pub vms: Vec<VmTrace>,
}

impl Trace {
    /// Loads the trace from YAML file.
    pub fn from_file(file_name: &str) -> Self {
        serde_yaml::from_str(
            &std::fs::read_to_string(file_name).unwrap_or_else(|_| panic!("Can't read file {}", file_name)),
        )
        .unwrap_or_else(|e| panic!("Can't parse trace from file {}: {}", file_name, e))
    }

    /// Returns the number of steps covered by the trace.
    pub fn steps(&self) -> usize {
        self.vms.iter().map(|vm| vm.requested.len()).max().unwrap_or(0)
    }
}

/// Current step number shared by all trace-driven components.
pub type StepCounter = Rc<Cell<usize>>;

pub struct TraceVm {
    uid: VmUid,
    trace: VmTrace,
    step: StepCounter,
}

impl TraceVm {
    pub fn new(trace: VmTrace, step: StepCounter) -> Self {
        Self {
            uid: trace.uid(),
            trace,
            step,
        }
    }
}

impl WorkloadVm for TraceVm {
    fn id(&self) -> u32 {
        self.trace.id
    }

    fn uid(&self) -> &VmUid {
        &self.uid
    }

    fn nominal_capacity(&self) -> f64 {
        self.trace.mips
    }

    fn requested_shares(&self) -> Vec<f64> {
        let total = self.trace.requested_at(self.step.get());
        let pes = self.trace.pes.max(1);
        vec![total / pes as f64; pes as usize]
    }

    fn requested_total_capacity(&self) -> f64 {
        self.trace.requested_at(self.step.get())
    }

    fn is_in_migration(&self) -> bool {
        self.trace.migrating.get(self.step.get()).copied().unwrap_or(false)
    }
}

/// MIPS of each host PE allocated to VMs.
pub type PeAllocations = Rc<RefCell<Vec<BTreeMap<VmUid, f64>>>>;

/// Scheduler which grants VMs the MIPS recorded in the trace.
///
/// Share `i` of VM is placed on PE `i mod pe_count`, each share is scaled by the granted fraction of the request.
pub struct TraceScheduler {
    granted: BTreeMap<VmUid, Vec<f64>>,
    pe_mips: f64,
    allocations: PeAllocations,
    step: StepCounter,
}

impl TraceScheduler {
    pub fn new(trace: &Trace, allocations: PeAllocations, step: StepCounter) -> Self {
        let granted = trace
            .vms
            .iter()
            .filter_map(|vm| vm.granted.clone().map(|granted| (vm.uid(), granted)))
            .collect();
        Self {
            granted,
            pe_mips: trace.host.pe_mips,
            allocations,
            step,
        }
    }
}

impl VmScheduler for TraceScheduler {
    fn deallocate(&mut self, vm: &dyn WorkloadVm) {
        for pe in self.allocations.borrow_mut().iter_mut() {
            pe.remove(vm.uid());
        }
    }

    fn allocate(&mut self, vm: &dyn WorkloadVm, shares: &[f64]) -> bool {
        let requested: f64 = shares.iter().sum();
        if requested == 0. {
            return true;
        }
        let granted = match self.granted.get(vm.uid()) {
            Some(granted) => granted.get(self.step.get()).copied().unwrap_or(0.).min(requested),
            None => requested,
        };
        let fraction = granted / requested;
        let mut allocations = self.allocations.borrow_mut();
        let pe_count = allocations.len();
        if pe_count == 0 {
            return false;
        }
        for (i, share) in shares.iter().enumerate() {
            *allocations[i % pe_count].entry(vm.uid().clone()).or_insert(0.) += share * fraction;
        }
        granted >= requested
    }

    fn allocated_capacity(&self, vm: &dyn WorkloadVm) -> f64 {
        self.allocations
            .borrow()
            .iter()
            .filter_map(|pe| pe.get(vm.uid()))
            .sum()
    }

    fn units_assigned_to(&self, vm: &dyn WorkloadVm) -> Vec<PeId> {
        self.allocations
            .borrow()
            .iter()
            .enumerate()
            .filter(|(_, pe)| pe.contains_key(vm.uid()))
            .map(|(i, _)| i as PeId)
            .collect()
    }

    fn unit_capacity(&self) -> f64 {
        self.pe_mips
    }
}

pub struct TracePes {
    pe_mips: f64,
    allocations: PeAllocations,
}

impl TracePes {
    pub fn new(pe_mips: f64, allocations: PeAllocations) -> Self {
        Self { pe_mips, allocations }
    }

    fn utilization(&self, pe: &BTreeMap<VmUid, f64>) -> f64 {
        pe.values().sum::<f64>() / self.pe_mips
    }
}

impl ProcessingElements for TracePes {
    fn count(&self) -> usize {
        self.allocations.borrow().len()
    }

    fn total_capacity(&self) -> f64 {
        self.pe_mips * self.count() as f64
    }

    fn max_utilization(&self) -> f64 {
        self.allocations
            .borrow()
            .iter()
            .map(|pe| self.utilization(pe))
            .fold(0., f64::max)
    }

    fn max_utilization_among(&self, units: &[PeId]) -> f64 {
        let allocations = self.allocations.borrow();
        units
            .iter()
            .filter_map(|pe| allocations.get(*pe as usize))
            .map(|pe| self.utilization(pe))
            .fold(0., f64::max)
    }

    fn allocated_to(&self, pe: PeId, vm: &VmUid) -> f64 {
        self.allocations
            .borrow()
            .get(pe as usize)
            .and_then(|pe| pe.get(vm).copied())
            .unwrap_or(0.)
    }
}

/// Provisioner of RAM or bandwidth which gives every active VM its recorded amount.
pub struct TraceProvisioner {
    usage: Vec<(VmTrace, f64)>,
    step: StepCounter,
}

impl TraceProvisioner {
    pub fn new(usage: Vec<(VmTrace, f64)>, step: StepCounter) -> Self {
        Self { usage, step }
    }
}

impl ResourceProvisioner for TraceProvisioner {
    fn used(&self) -> f64 {
        let step = self.step.get();
        self.usage
            .iter()
            .filter(|(vm, _)| vm.start <= step && vm.requested_at(step) > 0.)
            .map(|(_, amount)| amount)
            .sum()
    }
}

/// Moves the trace to the step corresponding to the current time.
pub struct TraceStep {
    step_duration: f64,
    step: StepCounter,
}

impl TraceStep {
    pub fn new(step_duration: f64, step: StepCounter) -> Self {
        Self { step_duration, step }
    }
}

impl HostStep for TraceStep {
    fn advance(&mut self, _vms: &[VmRef], _scheduler: &dyn VmScheduler, current_time: f64) -> f64 {
        self.step.set((current_time / self.step_duration).round() as usize);
        current_time + self.step_duration
    }
}
