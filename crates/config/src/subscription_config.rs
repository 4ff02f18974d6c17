use crate::endpoint::SubscriberEndpoint;
use crate::filter::{Filter, FilterOptions};
use crate::name::{SubscriptionName, TopicName};
use crate::options::TopicOptions;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Corrected topic configuration.
///
/// Built only by [`crate::correct`]. Equality is structural over topics and
/// filters and ignores ordering; recorded invalid URLs are diagnostics and do
/// not take part in it.
#[derive(Clone, Debug, Default)]
pub struct SubscriptionConfig {
    pub(crate) topics: BTreeMap<TopicName, BTreeSet<SubscriberEndpoint>>,
    pub(crate) filters: BTreeMap<SubscriptionName, Filter>,
    pub(crate) invalid_urls: BTreeSet<String>,
}

impl SubscriptionConfig {
    /// Topics and their subscribers.
    pub fn topics(&self) -> impl Iterator<Item = (&TopicName, &BTreeSet<SubscriberEndpoint>)> {
        self.topics.iter()
    }

    /// Whether no topic survived correction.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }

    /// All subscribers of `topic`.
    #[must_use]
    pub fn subscribers(&self, topic: &TopicName) -> Option<&BTreeSet<SubscriberEndpoint>> {
        self.topics.get(topic)
    }

    /// Push subscribers of `topic`.
    pub fn push_subscribers<'a>(
        &'a self,
        topic: &TopicName,
    ) -> impl Iterator<Item = &'a SubscriberEndpoint> + use<'a> {
        self.topics
            .get(topic)
            .into_iter()
            .flatten()
            .filter(|endpoint| endpoint.push_url().is_some())
    }

    /// Pull subscription names of `topic`.
    pub fn pull_subscriptions<'a>(
        &'a self,
        topic: &TopicName,
    ) -> impl Iterator<Item = &'a SubscriptionName> + use<'a> {
        self.topics
            .get(topic)
            .into_iter()
            .flatten()
            .filter_map(SubscriberEndpoint::pull_subscription)
    }

    /// The filter attached to `subscription`, if any.
    #[must_use]
    pub fn filter(&self, subscription: &SubscriptionName) -> Option<&Filter> {
        self.filters.get(subscription)
    }

    /// All filters, keyed by subscription.
    #[must_use]
    pub const fn filters(&self) -> &BTreeMap<SubscriptionName, Filter> {
        &self.filters
    }

    /// Subscriber strings rejected while correcting.
    #[must_use]
    pub const fn invalid_urls(&self) -> &BTreeSet<String> {
        &self.invalid_urls
    }

    /// Converts back into raw form. Correcting the result yields an equal
    /// configuration.
    #[must_use]
    pub fn to_options(&self) -> TopicOptions {
        TopicOptions {
            topics: Some(
                self.topics
                    .iter()
                    .map(|(topic, subscribers)| {
                        (
                            topic.to_string(),
                            Some(
                                subscribers
                                    .iter()
                                    .map(|s| Some(s.as_str().to_string()))
                                    .collect(),
                            ),
                        )
                    })
                    .collect(),
            ),
            filters: Some(
                self.filters
                    .values()
                    .map(|filter| Some(filter.to_options()))
                    .collect::<Vec<Option<FilterOptions>>>(),
            ),
        }
    }

    /// Human readable listing of topics and subscribers, one topic per line.
    #[must_use]
    pub const fn listing(&self) -> TopicListing<'_> {
        TopicListing(self)
    }
}

impl PartialEq for SubscriptionConfig {
    fn eq(&self, other: &Self) -> bool {
        self.topics == other.topics && self.filters == other.filters
    }
}

impl Eq for SubscriptionConfig {}

/// Display adapter produced by [`SubscriptionConfig::listing`].
pub struct TopicListing<'a>(&'a SubscriptionConfig);

impl fmt::Display for TopicListing<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.topics.is_empty() {
            return write!(f, "\nNothing");
        }

        for (topic, subscribers) in &self.0.topics {
            write!(f, "\n - {topic}: ")?;
            for (i, subscriber) in subscribers.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{subscriber}")?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::{FilterOptions, TopicOptions, correct};

    use pretty_assertions::assert_eq;

    #[test]
    fn test_equal_when_same_content() {
        let a = correct(&TopicOptions::default().with_topic("a", ["http://b", "http://c"])).config;
        let b = correct(&TopicOptions::default().with_topic("a", ["http://c", "http://b"])).config;

        assert_eq!(a, b);
    }

    #[test]
    fn test_equal_with_filters() {
        let options = TopicOptions::default()
            .with_topic("a", ["pull://b", "pull://c"])
            .with_filter(FilterOptions::new("b", ["f"]));

        assert_eq!(correct(&options).config, correct(&options.clone()).config);
    }

    #[test]
    fn test_not_equal_when_content_differs() {
        let empty = correct(&TopicOptions::default()).config;
        let one = correct(&TopicOptions::default().with_topic("a", ["http://e", "http://f"])).config;
        let two = correct(
            &TopicOptions::default()
                .with_topic("a", ["http://e", "http://f"])
                .with_topic("b", ["http://c", "http://d"]),
        )
        .config;

        assert_ne!(empty, one);
        assert_ne!(one, two);
        assert_ne!(empty, two);
    }

    #[test]
    fn test_not_equal_when_filters_differ() {
        let options = TopicOptions::default().with_topic("a", ["pull://b"]);
        let filtered = options.clone().with_filter(FilterOptions::new("b", ["f"]));

        assert_ne!(correct(&options).config, correct(&filtered).config);
    }

    #[test]
    fn test_push_and_pull_views() {
        let config = correct(
            &TopicOptions::default().with_topic("orders", ["https://localhost/hook", "pull://sub"]),
        )
        .config;
        let topic = "ORDERS".into();

        let push: Vec<_> = config.push_subscribers(&topic).map(|s| s.as_str()).collect();
        let pull: Vec<_> = config.pull_subscriptions(&topic).map(|s| s.as_str()).collect();

        assert_eq!(push, vec!["https://localhost/hook"]);
        assert_eq!(pull, vec!["sub"]);
        assert_eq!(config.push_subscribers(&"unknown".into()).count(), 0);
    }

    #[test]
    fn test_listing() {
        let config = correct(
            &TopicOptions::default()
                .with_topic("orders", ["https://localhost/a", "pull://sub"])
                .with_topic("customers", ["https://localhost/b"]),
        )
        .config;

        assert_eq!(
            config.listing().to_string(),
            "\n - customers: https://localhost/b\n - orders: https://localhost/a, pull://sub"
        );
        assert_eq!(
            correct(&TopicOptions::default()).config.listing().to_string(),
            "\nNothing"
        );
    }
}
