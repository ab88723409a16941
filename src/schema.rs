use serde::{Deserialize, Serialize};

use crate::{Algorithm, Operation};

/// Unit of every `elapsed_time`, `mean_time` and `median_time` value.
pub const TIME_UNIT: &str = "us";

pub const SCHEMA_VERSION: u32 = 1;

/// One timed execution of one operation. Serialized as a results-table row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrialRecord {
    pub algorithm: Algorithm,
    pub operation: Operation,
    /// Microseconds.
    pub elapsed_time: f64,
}

/// Host description captured once per run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentInfo {
    pub os_name: String,
    pub os_version: String,
    pub cpu_model: String,
    pub cpu_count: usize,
    pub runtime_version: String,
    pub timestamp: String,
}

impl EnvironmentInfo {
    /// (label, value) pairs in column order, for console and chart footers.
    pub fn fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("os_name", self.os_name.clone()),
            ("os_version", self.os_version.clone()),
            ("cpu_model", self.cpu_model.clone()),
            ("cpu_count", self.cpu_count.to_string()),
            ("runtime_version", self.runtime_version.clone()),
            ("timestamp", self.timestamp.clone()),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedStat {
    pub algorithm: Algorithm,
    pub operation: Operation,
    pub mean_time: f64,
    pub median_time: f64,
    pub sample_count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryMeta {
    pub schema_version: u32,
    pub bench_version: String,
    pub unit: String,
    /// Results table the stats were computed from.
    pub source: String,
    pub timestamp_utc: String,
    pub git_sha: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryReport {
    pub run: SummaryMeta,
    pub stats: Vec<AggregatedStat>,
    pub environment: Option<EnvironmentInfo>,
}
