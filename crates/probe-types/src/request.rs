//! Measurement creation requests.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of network measurement executed by the probes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeasurementType {
    Ping,
    Traceroute,
    Dns,
    Mtr,
}

impl MeasurementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MeasurementType::Ping => "ping",
            MeasurementType::Traceroute => "traceroute",
            MeasurementType::Dns => "dns",
            MeasurementType::Mtr => "mtr",
        }
    }
}

impl fmt::Display for MeasurementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A probe-location selector.
///
/// `magic` accepts anything the service understands: a continent, country,
/// city, ASN, network name, tag, or the id of a previous measurement (which
/// reuses that measurement's probes).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub magic: String,
}

impl Location {
    pub fn magic(value: impl Into<String>) -> Self {
        Self {
            magic: value.into(),
        }
    }
}

/// DNS query options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsQuery {
    #[serde(rename = "type")]
    pub record_type: String,
}

/// Per-type measurement options. Unset fields use the service defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeasurementOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub packets: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<DnsQuery>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolver: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace: Option<bool>,
}

impl MeasurementOptions {
    pub fn is_empty(&self) -> bool {
        self == &MeasurementOptions::default()
    }
}

/// Body of `POST /measurements`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeasurementCreate {
    #[serde(rename = "type")]
    pub kind: MeasurementType,
    pub target: String,
    pub locations: Vec<Location>,
    pub limit: u32,
    pub in_progress_updates: bool,
    #[serde(
        rename = "measurementOptions",
        default,
        skip_serializing_if = "MeasurementOptions::is_empty"
    )]
    pub options: MeasurementOptions,
}

/// Response to a successful measurement creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeasurementCreateResponse {
    pub id: String,
    #[serde(default)]
    pub probes_count: u32,
}
