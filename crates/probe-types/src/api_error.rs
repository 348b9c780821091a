//! Error body returned by the measurement API.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetails,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetails {
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
    /// Per-parameter messages of a validation error.
    #[serde(default)]
    pub params: BTreeMap<String, String>,
}

impl ErrorDetails {
    /// The message followed by one indented line per offending parameter.
    pub fn describe(&self) -> String {
        let mut out = self.message.clone();
        for message in self.params.values() {
            out.push_str("\n - ");
            out.push_str(message);
        }
        out
    }
}
