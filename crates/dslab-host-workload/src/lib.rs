#![doc = include_str!("../readme.md")]

pub mod common;
pub mod config;
pub mod history;
pub mod host;
pub mod logger;
pub mod resources;
pub mod scheduler;
pub mod step;
pub mod tracker;
pub mod utilization;
pub mod vm;

pub use common::{PeId, VmUid};
pub use config::HostWorkloadConfig;
pub use history::{UnderAllocationEntry, UnderAllocationRecord, UnderAllocationStats};
pub use host::Host;
pub use logger::{FileLogger, Logger, StdoutLogger};
pub use resources::{ProcessingElements, ResourceProvisioner};
pub use scheduler::VmScheduler;
pub use step::{HostStep, IdleHostStep};
pub use tracker::{HostWorkloadSnapshot, HostWorkloadTracker};
pub use utilization::UtilizationState;
pub use vm::{VmRef, WorkloadVm};
