use std::fmt;

use eventgrid_config::{SubscriberEndpoint, TopicName};

/// A subscriber of a specific topic.
///
/// The same URL subscribed to two topics yields two keys, each with its own
/// cancellation handle.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberKey {
    /// Topic name.
    pub topic: TopicName,

    /// Subscriber of that topic.
    pub subscriber: SubscriberEndpoint,
}

impl SubscriberKey {
    /// Creates a key.
    #[must_use]
    pub const fn new(topic: TopicName, subscriber: SubscriberEndpoint) -> Self {
        Self { topic, subscriber }
    }
}

impl fmt::Display for SubscriberKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.topic, self.subscriber)
    }
}
