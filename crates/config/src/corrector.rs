use crate::endpoint::SubscriberEndpoint;
use crate::error::EndpointError;
use crate::filter::Filter;
use crate::name::{SubscriptionName, TopicName};
use crate::options::TopicOptions;
use crate::subscription_config::SubscriptionConfig;

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

/// Outcome of [`correct`].
#[derive(Clone, Debug, Default)]
pub struct Correction {
    /// The usable configuration.
    pub config: SubscriptionConfig,

    /// Non-blank subscriber strings that were rejected.
    pub invalid_urls: BTreeSet<String>,

    /// Subscription names of filters that were dropped, either because they
    /// name no subscription or because no surviving subscriber carries it.
    pub invalid_filters: Vec<String>,
}

/// Validates and normalizes raw topic configuration.
///
/// Topic names are trimmed and merged case-insensitively. Subscribers must be
/// absolute http, https or pull URIs and are deduplicated per topic on their
/// case-folded canonical form. Topics left without subscribers are dropped,
/// as are filters whose subscription no longer exists. Never fails, and
/// correcting an already corrected configuration changes nothing.
#[must_use]
pub fn correct(raw: &TopicOptions) -> Correction {
    let mut topics: BTreeMap<TopicName, BTreeSet<SubscriberEndpoint>> = BTreeMap::new();
    let mut invalid_urls = BTreeSet::new();

    for (topic, subscribers) in raw.topics.iter().flatten() {
        let topic = TopicName::new(topic);
        let Some(subscribers) = subscribers else {
            continue;
        };
        if topic.is_empty() {
            continue;
        }

        for subscriber in subscribers.iter().flatten() {
            match SubscriberEndpoint::parse(subscriber) {
                Ok(endpoint) => {
                    topics.entry(topic.clone()).or_default().insert(endpoint);
                }
                Err(EndpointError::Blank) => {}
                Err(e) => {
                    debug!(%topic, %subscriber, error = %e, "rejected subscriber");
                    invalid_urls.insert(subscriber.clone());
                }
            }
        }
    }

    let known: BTreeSet<SubscriptionName> = topics
        .values()
        .flatten()
        .map(SubscriberEndpoint::subscription_name)
        .collect();

    let mut filters = BTreeMap::new();
    let mut invalid_filters = Vec::new();

    for options in raw.filters.iter().flatten().flatten() {
        let label = options.subscription.clone().unwrap_or_default();
        match Filter::from_options(options) {
            Some(filter) if known.contains(filter.subscription()) => {
                if filters.contains_key(filter.subscription()) {
                    invalid_filters.push(label);
                } else {
                    filters.insert(filter.subscription().clone(), filter);
                }
            }
            _ => invalid_filters.push(label),
        }
    }

    Correction {
        config: SubscriptionConfig {
            topics,
            filters,
            invalid_urls: invalid_urls.clone(),
        },
        invalid_urls,
        invalid_filters,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FilterOptions;

    use pretty_assertions::assert_eq;

    fn subscribers(config: &SubscriptionConfig, topic: &str) -> Vec<String> {
        config
            .subscribers(&TopicName::new(topic))
            .map(|set| set.iter().map(|s| s.as_str().to_string()).collect())
            .unwrap_or_default()
    }

    fn mixed_options() -> TopicOptions {
        TopicOptions {
            topics: Some(BTreeMap::from([
                (
                    "orders".to_string(),
                    Some(vec![
                        None,
                        Some(String::new()),
                        Some("invalid_url".to_string()),
                        Some("https://localhost/orders-webhook-200".to_string()),
                        Some("https://localhost/orders-webhook-404".to_string()),
                        Some("pull://orders-sub".to_string()),
                    ]),
                ),
                (
                    "customers".to_string(),
                    Some(vec![
                        Some("https://localhost/customers-webhook".to_string()),
                        Some("https://LOCALHOST/Customers-Webhook".to_string()),
                    ]),
                ),
                ("  ".to_string(), Some(vec![Some("https://localhost/x".to_string())])),
                ("nulls".to_string(), None),
                ("empty".to_string(), Some(vec![Some("ftp://localhost".to_string())])),
            ])),
            filters: Some(vec![
                Some(FilterOptions::new("orders-sub", ["A"])),
                Some(FilterOptions::new("gone-sub", ["A"])),
                None,
            ]),
        }
    }

    #[test]
    fn test_invalid_and_blank_subscribers_are_dropped() {
        let correction = correct(&mixed_options());

        assert_eq!(
            subscribers(&correction.config, "orders"),
            vec![
                "https://localhost/orders-webhook-200",
                "https://localhost/orders-webhook-404",
                "pull://orders-sub",
            ]
        );
        assert_eq!(
            correction.invalid_urls,
            BTreeSet::from(["invalid_url".to_string(), "ftp://localhost".to_string()])
        );
        assert_eq!(correction.config.invalid_urls(), &correction.invalid_urls);
    }

    #[test]
    fn test_case_only_duplicates_collapse() {
        let correction = correct(&mixed_options());

        assert_eq!(
            subscribers(&correction.config, "customers"),
            vec!["https://localhost/customers-webhook"]
        );
    }

    #[test]
    fn test_unusable_topics_are_dropped() {
        let correction = correct(&mixed_options());
        let names: Vec<_> = correction
            .config
            .topics()
            .map(|(topic, _)| topic.to_string())
            .collect();

        assert_eq!(names, vec!["customers", "orders"]);
    }

    #[test]
    fn test_topics_differing_by_case_or_whitespace_merge() {
        let options = TopicOptions::default()
            .with_topic("Orders", ["https://localhost/a"])
            .with_topic(" orders ", ["https://localhost/b", "https://localhost/A"]);

        let correction = correct(&options);

        let folded: Vec<_> = subscribers(&correction.config, "ORDERS")
            .iter()
            .map(|s| s.to_lowercase())
            .collect();

        // Either spelling of the duplicate may survive
        assert_eq!(correction.config.topics().count(), 1);
        assert_eq!(folded, vec!["https://localhost/a", "https://localhost/b"]);
    }

    #[test]
    fn test_filters_for_unknown_subscriptions_are_dropped() {
        let correction = correct(&mixed_options());

        assert!(
            correction
                .config
                .filter(&SubscriptionName::new("orders-sub"))
                .is_some()
        );
        assert_eq!(correction.config.filters().len(), 1);
        assert_eq!(correction.invalid_filters, vec!["gone-sub".to_string()]);
    }

    #[test]
    fn test_duplicate_filters_keep_the_first() {
        let options = TopicOptions::default()
            .with_topic("orders", ["pull://sub"])
            .with_filter(FilterOptions::new("sub", ["A"]))
            .with_filter(FilterOptions::new("SUB", ["B"]));

        let correction = correct(&options);
        let filter = correction.config.filter(&"sub".into()).unwrap();

        assert!(filter.accepts("A"));
        assert!(!filter.accepts("B"));
        assert_eq!(correction.invalid_filters, vec!["SUB".to_string()]);
    }

    #[test]
    fn test_filter_can_target_push_subscriber_url() {
        let options = TopicOptions::default()
            .with_topic("orders", ["https://localhost/hook"])
            .with_filter(FilterOptions::new("https://LOCALHOST/hook", ["A"]));

        let correction = correct(&options);

        assert!(correction.invalid_filters.is_empty());
    }

    #[test]
    fn test_missing_topics_produce_empty_config() {
        let correction = correct(&TopicOptions::default());

        assert!(correction.config.is_empty());
        assert!(correction.invalid_urls.is_empty());
    }

    #[test]
    fn test_correction_is_idempotent() {
        let samples = [
            TopicOptions::default(),
            mixed_options(),
            TopicOptions::default()
                .with_topic("Orders", ["https://localhost/a", "pull://Sub"])
                .with_topic("orders", ["https://localhost/A"])
                .with_filter(FilterOptions::new("sub", ["x", "X", " "]))
                .with_filter(FilterOptions {
                    subscription: Some("sub".to_string()),
                    included_event_types: None,
                }),
        ];

        for raw in samples {
            let once = correct(&raw);
            let twice = correct(&once.config.to_options());

            assert_eq!(once.config, twice.config);
            assert!(twice.invalid_urls.is_empty());
            assert!(twice.invalid_filters.is_empty());
        }
    }
}
