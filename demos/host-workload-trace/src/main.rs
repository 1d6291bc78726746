mod trace;

use std::cell::Cell;
use std::collections::BTreeMap;
use std::path::Path;

use clap::Parser;
use log::{info, Level};
use sugars::{boxed, rc, refcell};

use dslab_host_workload::{
    FileLogger, Host, HostWorkloadConfig, HostWorkloadTracker, Logger, StdoutLogger, VmRef, VmUid,
};

use crate::trace::{Trace, TracePes, TraceProvisioner, TraceScheduler, TraceStep, TraceVm};

fn init_logger() {
    use env_logger::Builder;
    use std::io::Write;
    Builder::from_default_env()
        .format(|buf, record| writeln!(buf, "{}", record.args()))
        .init();
}

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Path to trace with VM demand and scheduler decisions
    #[clap(short, long)]
    trace: String,

    /// Path to host workload config (default values are used if not set)
    #[clap(short, long)]
    config: Option<String>,

    /// Save under-allocation history to this CSV file
    #[clap(long)]
    history: Option<String>,

    /// Save log to this CSV file instead of printing it
    #[clap(long)]
    log: Option<String>,
}

fn main() {
    init_logger();
    let args = Args::parse();

    let trace = Trace::from_file(&args.trace);
    let config = match &args.config {
        Some(path) => HostWorkloadConfig::from_file(path),
        None => HostWorkloadConfig::default(),
    };
    let logger: Box<dyn Logger> = if args.log.is_some() {
        boxed!(FileLogger::with_level(Level::Debug))
    } else {
        boxed!(StdoutLogger::new())
    };
    let logger = rc!(refcell!(logger));

    let step = rc!(Cell::new(0));
    let allocations = rc!(refcell!(vec![BTreeMap::new(); trace.host.pes as usize]));
    let host = Host::new(
        trace.host.id,
        boxed!(TraceScheduler::new(&trace, allocations.clone(), step.clone())),
        boxed!(TracePes::new(trace.host.pe_mips, allocations)),
        boxed!(TraceProvisioner::new(
            trace.vms.iter().map(|vm| (vm.clone(), vm.ram)).collect(),
            step.clone()
        )),
        boxed!(TraceProvisioner::new(
            trace.vms.iter().map(|vm| (vm.clone(), vm.bw)).collect(),
            step.clone()
        )),
    );
    let mut tracker = HostWorkloadTracker::new(
        host,
        boxed!(TraceStep::new(trace.step_duration, step.clone())),
        rc!(config),
        logger.clone(),
    );

    let mut time = 0.;
    for i in 0..trace.steps() {
        for vm in trace.vms.iter() {
            if vm.start == i {
                let vm_ref: VmRef = rc!(refcell!(TraceVm::new(vm.clone(), step.clone())));
                tracker.host_mut().add_vm(vm_ref);
            }
            if vm.is_migrating_in_at(i) {
                tracker.add_migrating_in_vm(vm.uid());
            } else {
                tracker.remove_migrating_in_vm(&vm.uid());
            }
        }

        time = tracker.advance(time);
        println!(
            "{}",
            serde_json::to_string(&tracker.snapshot()).unwrap_or_else(|e| panic!("Can't serialize snapshot: {}", e))
        );

        let completed: Vec<VmUid> = tracker.completed_vms().map(|vm| vm.borrow().uid().clone()).collect();
        for uid in completed {
            tracker.host_mut().remove_vm(&uid);
            info!("vm {} completed and removed from host #{}", uid, tracker.id());
        }
    }

    for (uid, _) in tracker.under_allocation().iter() {
        if let Some(stats) = tracker.under_allocation().stats(uid) {
            info!(
                "vm {}: under allocated at {} steps, performance degradation {:.2}%",
                uid,
                stats.entries,
                stats.degradation() * 100.
            );
        }
    }

    if let Some(path) = args.history {
        match tracker.under_allocation().save_csv(&path) {
            Ok(_) => println!("Under-allocation history saved successfully to file: {path}"),
            Err(e) => println!("Error while saving under-allocation history: {e:?}"),
        }
    }
    if let Some(path) = args.log {
        match logger.borrow().save_log(Path::new(&path)) {
            Ok(_) => println!("Log saved successfully to file: {path}"),
            Err(e) => println!("Error while saving log: {e:?}"),
        }
    }
}
