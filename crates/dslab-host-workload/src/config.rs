//! Host workload accounting configuration.

use serde::{Deserialize, Serialize};

/// Holds raw config parsed from YAML file.
#[derive(Debug, PartialEq, Serialize, Deserialize, Clone, Default)]
struct RawHostWorkloadConfig {
    pub under_allocation_tolerance: Option<f64>,
    pub migration_overhead: Option<f64>,
    pub utilization_clamp_margin: Option<f64>,
    pub history_limit: Option<usize>,
}

/// Represents host workload accounting configuration.
#[derive(Debug, PartialEq, Serialize, Deserialize, Clone)]
pub struct HostWorkloadConfig {
    /// Absolute MIPS deficit which is still not considered as VM under-allocation.
    pub under_allocation_tolerance: f64,
    /// Fraction of VM throughput lost while VM is in migration.
    pub migration_overhead: f64,
    /// CPU utilization values within `(1, 1 + margin]` are reported as 1.
    pub utilization_clamp_margin: f64,
    /// Maximum number of under-allocation history entries kept per VM (unbounded if not set).
    pub history_limit: Option<usize>,
}

impl Default for HostWorkloadConfig {
    fn default() -> Self {
        Self::from_raw(RawHostWorkloadConfig::default())
    }
}

impl HostWorkloadConfig {
    fn from_raw(raw: RawHostWorkloadConfig) -> Self {
        Self {
            under_allocation_tolerance: raw.under_allocation_tolerance.unwrap_or(0.1),
            migration_overhead: raw.migration_overhead.unwrap_or(0.1),
            utilization_clamp_margin: raw.utilization_clamp_margin.unwrap_or(0.01),
            history_limit: raw.history_limit,
        }
    }

    /// Parses config from YAML string (uses default values if some parameters are absent).
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let raw: RawHostWorkloadConfig = serde_yaml::from_str(yaml)?;
        Ok(Self::from_raw(raw))
    }

    /// Creates config by reading parameter values from YAML file
    /// (uses default values if some parameters are absent).
    pub fn from_file(file_name: &str) -> Self {
        Self::from_yaml(
            &std::fs::read_to_string(file_name).unwrap_or_else(|_| panic!("Can't read file {}", file_name)),
        )
        .unwrap_or_else(|_| panic!("Can't parse YAML from file {}", file_name))
    }

    /// Returns the fraction of allocated MIPS actually delivered to VM in migration.
    pub fn migration_throughput_factor(&self) -> f64 {
        1. - self.migration_overhead
    }
}
