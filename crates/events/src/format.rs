use std::fmt;

use mime::Mime;

/// Content type selecting event grid schema events.
pub const EVENT_GRID_CONTENT_TYPE: &str = "application/json";

/// Content type selecting a single CloudEvent.
pub const CLOUD_EVENT_CONTENT_TYPE: &str = "application/cloudevents+json";

/// Content type selecting a batch of CloudEvents.
pub const CLOUD_EVENT_BATCH_CONTENT_TYPE: &str = "application/cloudevents-batch+json";

/// How the body of a publish request has to be read.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PublishFormat {
    /// One event grid schema event or an array of them.
    EventGridEventBatch,

    /// Exactly one CloudEvent.
    SingleCloudEvent,

    /// An array of CloudEvents.
    CloudEventBatch,

    /// Anything else. Carries the content type as received.
    Unsupported(String),
}

impl PublishFormat {
    /// Classifies a request content type.
    ///
    /// Only the MIME essence is compared, so parameters such as `charset`
    /// are ignored.
    #[must_use]
    pub fn from_content_type(content_type: Option<&str>) -> Self {
        let Some(raw) = content_type else {
            return Self::Unsupported(String::new());
        };

        let Ok(mime) = raw.trim().parse::<Mime>() else {
            return Self::Unsupported(raw.to_string());
        };

        let essence = mime.essence_str();
        if essence.eq_ignore_ascii_case(EVENT_GRID_CONTENT_TYPE) {
            Self::EventGridEventBatch
        } else if essence.eq_ignore_ascii_case(CLOUD_EVENT_CONTENT_TYPE) {
            Self::SingleCloudEvent
        } else if essence.eq_ignore_ascii_case(CLOUD_EVENT_BATCH_CONTENT_TYPE) {
            Self::CloudEventBatch
        } else {
            Self::Unsupported(raw.to_string())
        }
    }
}

impl fmt::Display for PublishFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EventGridEventBatch => f.write_str(EVENT_GRID_CONTENT_TYPE),
            Self::SingleCloudEvent => f.write_str(CLOUD_EVENT_CONTENT_TYPE),
            Self::CloudEventBatch => f.write_str(CLOUD_EVENT_BATCH_CONTENT_TYPE),
            Self::Unsupported(raw) => write!(f, "unsupported ({raw})"),
        }
    }
}
