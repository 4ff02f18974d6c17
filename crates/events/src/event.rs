use crate::cloud_event::CloudEvent;
use crate::event_grid_event::EventGridEvent;

use serde::Serialize;

/// A single published event of either schema.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Event {
    /// Event grid schema.
    EventGrid(EventGridEvent),

    /// CloudEvents schema.
    Cloud(CloudEvent),
}

impl Event {
    /// Unique identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::EventGrid(event) => &event.id,
            Self::Cloud(event) => &event.id,
        }
    }

    /// Event type, used for filtering.
    #[must_use]
    pub fn event_type(&self) -> &str {
        match self {
            Self::EventGrid(event) => &event.event_type,
            Self::Cloud(event) => &event.event_type,
        }
    }
}

impl From<EventGridEvent> for Event {
    fn from(event: EventGridEvent) -> Self {
        Self::EventGrid(event)
    }
}

impl From<CloudEvent> for Event {
    fn from(event: CloudEvent) -> Self {
        Self::Cloud(event)
    }
}
