//! Measurement state as reported by `GET /measurements/{id}`.

use serde::{Deserialize, Serialize};

use crate::MeasurementType;

/// Status of a measurement or of a single probe's part of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MeasurementStatus {
    InProgress,
    Finished,
    Failed,
    Offline,
}

impl MeasurementStatus {
    /// Whether no further updates will arrive.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, MeasurementStatus::InProgress)
    }
}

/// Where a probe is located.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbeDetails {
    #[serde(default)]
    pub continent: String,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub country: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub asn: u32,
    #[serde(default)]
    pub network: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

/// Aggregated ping statistics of one probe. Timing fields are absent until
/// at least one reply has been received.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PingStats {
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub avg: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
    #[serde(default)]
    pub total: u32,
    #[serde(default)]
    pub rcv: u32,
    #[serde(default)]
    pub drop: u32,
    #[serde(default)]
    pub loss: f64,
}

/// One probe's result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbeResult {
    pub status: MeasurementStatus,
    #[serde(default)]
    pub raw_output: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_hostname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<PingStats>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeMeasurement {
    pub probe: ProbeDetails,
    pub result: ProbeResult,
}

/// Current state of a measurement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Measurement {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: MeasurementType,
    pub status: MeasurementStatus,
    #[serde(default)]
    pub target: String,
    #[serde(default)]
    pub probes_count: u32,
    #[serde(default)]
    pub results: Vec<ProbeMeasurement>,
}

impl Measurement {
    /// Statuses of the individual probes, in result order.
    pub fn probe_statuses(&self) -> Vec<MeasurementStatus> {
        self.results.iter().map(|r| r.result.status).collect()
    }

    /// True while the measurement runs and at least one probe already
    /// reported a final result.
    pub fn is_partially_finished(&self) -> bool {
        self.status == MeasurementStatus::InProgress
            && self
                .results
                .iter()
                .any(|r| r.result.status == MeasurementStatus::Finished)
    }
}
