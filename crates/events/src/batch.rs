use crate::cloud_event::CloudEvent;
use crate::error::DecodeError;
use crate::event::Event;
use crate::event_grid_event::EventGridEvent;
use crate::format::{CLOUD_EVENT_BATCH_CONTENT_TYPE, EVENT_GRID_CONTENT_TYPE, PublishFormat};
use crate::resource_id;

use bytes::Bytes;
use serde::Serialize;
use serde::de::DeserializeOwned;

/// The decoded events of one publish request.
///
/// Serializes as a JSON array, which is what push subscribers receive.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PublishBatch {
    /// Event grid schema events.
    EventGrid(Vec<EventGridEvent>),

    /// CloudEvents.
    Cloud(Vec<CloudEvent>),
}

impl PublishBatch {
    /// Decodes `body` according to `format`.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::UnsupportedContentType`] for an unsupported
    /// format and [`DecodeError::Json`] when the body does not match it.
    pub fn decode(format: &PublishFormat, body: &[u8]) -> Result<Self, DecodeError> {
        match format {
            PublishFormat::EventGridEventBatch => Ok(Self::EventGrid(one_or_many(body)?)),
            PublishFormat::SingleCloudEvent => Ok(Self::Cloud(vec![serde_json::from_slice(body)?])),
            PublishFormat::CloudEventBatch => Ok(Self::Cloud(serde_json::from_slice(body)?)),
            PublishFormat::Unsupported(raw) => Err(DecodeError::UnsupportedContentType(raw.clone())),
        }
    }

    /// Records where the events were published.
    ///
    /// Event grid events always get the topic's resource id, whatever the
    /// publisher sent. CloudEvents keep their source unless it is missing or
    /// empty.
    pub fn stamp_provenance(&mut self, topic: &str) {
        let id = resource_id(topic);

        match self {
            Self::EventGrid(events) => {
                for event in events {
                    event.topic = Some(id.clone());
                }
            }
            Self::Cloud(events) => {
                for event in events {
                    if event.source.as_deref().is_none_or(str::is_empty) {
                        event.source = Some(id.clone());
                    }
                }
            }
        }
    }

    /// Number of events.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::EventGrid(events) => events.len(),
            Self::Cloud(events) => events.len(),
        }
    }

    /// Whether the batch holds no event.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// A copy holding only the events for which `keep` returns true, given
    /// their event type.
    #[must_use]
    pub fn filtered(&self, keep: impl Fn(&str) -> bool) -> Self {
        match self {
            Self::EventGrid(events) => Self::EventGrid(
                events
                    .iter()
                    .filter(|e| keep(&e.event_type))
                    .cloned()
                    .collect(),
            ),
            Self::Cloud(events) => Self::Cloud(
                events
                    .iter()
                    .filter(|e| keep(&e.event_type))
                    .cloned()
                    .collect(),
            ),
        }
    }

    /// The events as individual items, in publish order.
    #[must_use]
    pub fn to_events(&self) -> Vec<Event> {
        match self {
            Self::EventGrid(events) => events.iter().cloned().map(Event::from).collect(),
            Self::Cloud(events) => events.iter().cloned().map(Event::from).collect(),
        }
    }

    /// Content type used when the batch is pushed to a webhook.
    #[must_use]
    pub const fn content_type(&self) -> &'static str {
        match self {
            Self::EventGrid(_) => EVENT_GRID_CONTENT_TYPE,
            Self::Cloud(_) => CLOUD_EVENT_BATCH_CONTENT_TYPE,
        }
    }

    /// JSON array body for push delivery.
    ///
    /// # Errors
    ///
    /// Returns an error if the batch cannot be serialized.
    pub fn to_body(&self) -> Result<Bytes, serde_json::Error> {
        serde_json::to_vec(self).map(Bytes::from)
    }

    /// Indented JSON for diagnostic logging.
    #[must_use]
    pub fn to_pretty_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|e| format!("<unprintable: {e}>"))
    }
}

fn one_or_many<T: DeserializeOwned>(body: &[u8]) -> Result<Vec<T>, serde_json::Error> {
    let is_array = body
        .iter()
        .find(|b| !b.is_ascii_whitespace())
        .is_some_and(|b| *b == b'[');

    if is_array {
        serde_json::from_slice(body)
    } else {
        serde_json::from_slice(body).map(|event| vec![event])
    }
}
