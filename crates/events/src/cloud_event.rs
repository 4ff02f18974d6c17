use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

fn default_spec_version() -> String {
    "1.0".to_string()
}

/// A CloudEvents 1.0 event in structured JSON mode.
///
/// Only the attributes the emulator reads are typed; `data`, `time`,
/// `subject` and extension attributes are kept as-is.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct CloudEvent {
    /// Unique identifier within `source`.
    pub id: String,

    /// Context in which the event happened. Filled in on publish when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    /// Event type.
    #[serde(rename = "type")]
    pub event_type: String,

    /// CloudEvents specification version.
    #[serde(default = "default_spec_version")]
    pub specversion: String,

    /// Any other attributes, including the payload.
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}
