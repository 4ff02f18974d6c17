use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// An event in the event grid schema.
///
/// Fields the emulator does not care about are carried through untouched.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventGridEvent {
    /// Unique identifier.
    pub id: String,

    /// Source resource. Always replaced on publish.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,

    /// Publisher defined path to the event subject.
    pub subject: String,

    /// Publisher defined event type.
    pub event_type: String,

    /// Event payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,

    /// Schema version of `data`.
    pub data_version: String,

    /// When the event was generated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_time: Option<String>,

    /// Schema version of the event metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata_version: Option<String>,

    /// Any other properties.
    #[serde(flatten)]
    pub extensions: Map<String, Value>,
}
