//! History of VM under-allocations.

use std::path::Path;

use indexmap::IndexMap;
use serde::Serialize;

use crate::common::VmUid;

/// MIPS requested by VM and allocated to it at some step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct UnderAllocationEntry {
    pub requested: f64,
    pub allocated: f64,
}

impl UnderAllocationEntry {
    pub fn new(requested: f64, allocated: f64) -> Self {
        Self { requested, allocated }
    }

    pub fn deficit(&self) -> f64 {
        self.requested - self.allocated
    }
}

/// Summary of the under-allocation history of a single VM.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct UnderAllocationStats {
    pub entries: usize,
    pub total_requested: f64,
    pub total_allocated: f64,
}

impl UnderAllocationStats {
    /// Returns the fraction of requested MIPS which was not allocated.
    pub fn degradation(&self) -> f64 {
        if self.total_requested == 0. {
            return 0.;
        }
        1. - self.total_allocated / self.total_requested
    }
}

#[derive(Serialize)]
struct CsvRow<'a> {
    vm_uid: &'a VmUid,
    requested: f64,
    allocated: f64,
}

/// Per-VM sequences of under-allocation entries in the order they were recorded.
///
/// The record only grows during the simulation unless a per-VM limit is set, in which case the oldest entries of VM
/// are evicted. Consumers can also truncate or take away the recorded entries at any time.
#[derive(Debug, Clone, Default)]
pub struct UnderAllocationRecord {
    entries: IndexMap<VmUid, Vec<UnderAllocationEntry>>,
    limit: Option<usize>,
}

impl UnderAllocationRecord {
    /// Creates empty unbounded record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates empty record which keeps at most `limit` latest entries per VM.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            entries: IndexMap::new(),
            limit: Some(limit),
        }
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    /// Adds new entry to the end of VM history.
    pub fn append(&mut self, vm: &VmUid, requested: f64, allocated: f64) {
        if self.limit == Some(0) {
            return;
        }
        let history = self.entries.entry(vm.clone()).or_default();
        history.push(UnderAllocationEntry::new(requested, allocated));
        if let Some(limit) = self.limit {
            if history.len() > limit {
                let excess = history.len() - limit;
                history.drain(..excess);
            }
        }
    }

    /// Returns the history of VM, which is empty if nothing was recorded for it.
    pub fn get(&self, vm: &VmUid) -> &[UnderAllocationEntry] {
        self.entries.get(vm).map(|history| history.as_slice()).unwrap_or(&[])
    }

    /// Returns an iterator over VMs and their histories in the order VMs were first recorded.
    pub fn iter(&self) -> impl Iterator<Item = (&VmUid, &[UnderAllocationEntry])> {
        self.entries.iter().map(|(vm, history)| (vm, history.as_slice()))
    }

    /// Returns the number of VMs with recorded history.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the number of entries recorded for all VMs.
    pub fn total_entries(&self) -> usize {
        self.entries.values().map(|history| history.len()).sum()
    }

    /// Keeps only `keep_last` latest entries of VM. VM is removed from the record if nothing is kept.
    pub fn truncate(&mut self, vm: &VmUid, keep_last: usize) {
        if keep_last == 0 {
            self.entries.shift_remove(vm);
            return;
        }
        if let Some(history) = self.entries.get_mut(vm) {
            if history.len() > keep_last {
                let excess = history.len() - keep_last;
                history.drain(..excess);
            }
        }
    }

    /// Removes and returns the history of VM.
    pub fn take(&mut self, vm: &VmUid) -> Vec<UnderAllocationEntry> {
        self.entries.shift_remove(vm).unwrap_or_default()
    }

    /// Removes and returns histories of all VMs.
    pub fn drain(&mut self) -> IndexMap<VmUid, Vec<UnderAllocationEntry>> {
        std::mem::take(&mut self.entries)
    }

    /// Returns the summary of VM history.
    pub fn stats(&self, vm: &VmUid) -> Option<UnderAllocationStats> {
        let history = self.entries.get(vm)?;
        Some(UnderAllocationStats {
            entries: history.len(),
            total_requested: history.iter().map(|e| e.requested).sum(),
            total_allocated: history.iter().map(|e| e.allocated).sum(),
        })
    }

    /// Saves all entries to CSV file with `vm_uid,requested,allocated` columns.
    pub fn save_csv<P: AsRef<Path>>(&self, path: P) -> Result<(), csv::Error> {
        let mut wtr = csv::Writer::from_path(path)?;
        for (vm_uid, history) in &self.entries {
            for entry in history {
                wtr.serialize(CsvRow {
                    vm_uid,
                    requested: entry.requested,
                    allocated: entry.allocated,
                })?;
            }
        }
        wtr.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_vm_has_empty_history() {
        let record = UnderAllocationRecord::new();
        assert!(record.get(&VmUid::from("0-7")).is_empty());
        assert_eq!(record.stats(&VmUid::from("0-7")), None);
        assert!(record.is_empty());
    }

    #[test]
    fn entries_keep_insertion_order() {
        let mut record = UnderAllocationRecord::new();
        let a = VmUid::new(0, 1);
        let b = VmUid::new(0, 2);
        record.append(&b, 100., 50.);
        record.append(&a, 10., 5.);
        record.append(&b, 100., 60.);

        assert_eq!(
            record.get(&b),
            &[UnderAllocationEntry::new(100., 50.), UnderAllocationEntry::new(100., 60.)]
        );
        let vms: Vec<&VmUid> = record.iter().map(|(vm, _)| vm).collect();
        assert_eq!(vms, vec![&b, &a]);
        assert_eq!(record.len(), 2);
        assert_eq!(record.total_entries(), 3);
    }

    #[test]
    fn limit_evicts_oldest_entries() {
        let mut record = UnderAllocationRecord::with_limit(2);
        let vm = VmUid::new(1, 1);
        for i in 0..5 {
            record.append(&vm, 100., i as f64);
        }
        assert_eq!(
            record.get(&vm),
            &[UnderAllocationEntry::new(100., 3.), UnderAllocationEntry::new(100., 4.)]
        );
    }

    #[test]
    fn zero_limit_records_nothing() {
        let mut record = UnderAllocationRecord::with_limit(0);
        let vm = VmUid::new(0, 3);
        record.append(&vm, 100., 50.);
        record.append(&vm, 100., 60.);
        assert!(record.is_empty());
        assert_eq!(record.len(), 0);
        assert_eq!(record.stats(&vm), None);
    }

    #[test]
    fn truncate_to_zero_removes_vm() {
        let mut record = UnderAllocationRecord::new();
        let a = VmUid::new(0, 1);
        let b = VmUid::new(0, 2);
        record.append(&a, 10., 1.);
        record.append(&b, 10., 2.);
        record.truncate(&a, 0);
        assert_eq!(record.len(), 1);
        assert_eq!(record.stats(&a), None);
        let vms: Vec<&VmUid> = record.iter().map(|(vm, _)| vm).collect();
        assert_eq!(vms, vec![&b]);
    }

    #[test]
    fn truncate_and_take() {
        let mut record = UnderAllocationRecord::new();
        let vm = VmUid::new(1, 1);
        for i in 0..4 {
            record.append(&vm, 10., i as f64);
        }
        record.truncate(&vm, 1);
        assert_eq!(record.get(&vm), &[UnderAllocationEntry::new(10., 3.)]);

        assert_eq!(record.take(&vm), vec![UnderAllocationEntry::new(10., 3.)]);
        assert!(record.get(&vm).is_empty());
        assert!(record.take(&vm).is_empty());
    }

    #[test]
    fn drain_empties_record() {
        let mut record = UnderAllocationRecord::new();
        record.append(&VmUid::new(0, 0), 2., 1.);
        record.append(&VmUid::new(0, 1), 4., 1.);
        let drained = record.drain();
        assert_eq!(drained.len(), 2);
        assert!(record.is_empty());
    }

    #[test]
    fn stats_degradation() {
        let mut record = UnderAllocationRecord::new();
        let vm = VmUid::new(0, 0);
        record.append(&vm, 100., 50.);
        record.append(&vm, 300., 250.);
        let stats = record.stats(&vm).unwrap();
        assert_eq!(stats.entries, 2);
        assert_eq!(stats.total_requested, 400.);
        assert_eq!(stats.total_allocated, 300.);
        assert_eq!(stats.degradation(), 0.25);
    }
}
