use crate::key::SubscriberKey;
use crate::registry::CancellationRegistry;

use std::collections::BTreeSet;
use std::sync::Arc;

use eventgrid_config::SubscriptionConfig;
use parking_lot::Mutex;
use tracing::info;

/// Subscribers that changed between two configurations.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Newly registered subscribers.
    pub added: Vec<SubscriberKey>,

    /// Unregistered subscribers, whose deliveries were canceled.
    pub removed: Vec<SubscriberKey>,
}

impl ReconcileReport {
    /// Whether nothing changed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Keeps the [`CancellationRegistry`] in step with the configuration.
#[derive(Debug)]
pub struct Reconciler {
    registry: Arc<CancellationRegistry>,
    previous: Mutex<Option<BTreeSet<SubscriberKey>>>,
}

impl Reconciler {
    /// Creates a reconciler that has not seen any configuration yet.
    #[must_use]
    pub const fn new(registry: Arc<CancellationRegistry>) -> Self {
        Self {
            registry,
            previous: Mutex::new(None),
        }
    }

    /// Registers subscribers that appeared since the last call and
    /// unregisters those that disappeared, including every subscriber of a
    /// removed topic. The first call registers everything.
    pub fn reconcile(&self, config: &SubscriptionConfig) -> ReconcileReport {
        let current: BTreeSet<SubscriberKey> = config
            .topics()
            .flat_map(|(topic, subscribers)| {
                subscribers
                    .iter()
                    .map(|subscriber| SubscriberKey::new(topic.clone(), subscriber.clone()))
            })
            .collect();

        let mut previous = self.previous.lock();
        let before = previous.take().unwrap_or_default();

        let report = ReconcileReport {
            added: current.difference(&before).cloned().collect(),
            removed: before.difference(&current).cloned().collect(),
        };

        for key in &report.added {
            self.registry.register(key);
        }
        for key in &report.removed {
            info!(topic = %key.topic, subscriber = %key.subscriber, "subscriber removed, canceling its pending deliveries");
            self.registry.unregister(key);
        }

        *previous = Some(current);
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use eventgrid_config::{TopicOptions, correct};
    use pretty_assertions::assert_eq;

    fn config(options: TopicOptions) -> SubscriptionConfig {
        correct(&options).config
    }

    #[test]
    fn test_first_reconcile_registers_everything() {
        let registry = Arc::new(CancellationRegistry::default());
        let reconciler = Reconciler::new(registry.clone());

        let report = reconciler.reconcile(&config(
            TopicOptions::default()
                .with_topic("a", ["https://localhost/1", "pull://s"])
                .with_topic("b", ["https://localhost/1"]),
        ));

        assert_eq!(report.added.len(), 3);
        assert!(report.removed.is_empty());
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_diff_against_previous() {
        let registry = Arc::new(CancellationRegistry::default());
        let reconciler = Reconciler::new(registry.clone());

        reconciler.reconcile(&config(
            TopicOptions::default()
                .with_topic("a", ["https://localhost/1", "https://localhost/2"])
                .with_topic("gone", ["https://localhost/3"]),
        ));
        let kept = SubscriberKey::new(
            "a".into(),
            eventgrid_config::SubscriberEndpoint::parse("https://localhost/1").unwrap(),
        );
        let kept_token = registry.get(&kept);

        let report = reconciler.reconcile(&config(
            TopicOptions::default().with_topic("A", ["HTTPS://localhost/1", "https://localhost/4"]),
        ));

        let added: Vec<_> = report.added.iter().map(ToString::to_string).collect();
        let removed: Vec<_> = report.removed.iter().map(ToString::to_string).collect();
        assert_eq!(added, vec!["A/https://localhost/4"]);
        assert_eq!(
            removed,
            vec!["a/https://localhost/2", "gone/https://localhost/3"]
        );
        assert!(!kept_token.is_cancelled());
    }

    #[test]
    fn test_same_config_is_a_no_op() {
        let reconciler = Reconciler::new(Arc::new(CancellationRegistry::default()));
        let config = config(TopicOptions::default().with_topic("a", ["pull://s"]));

        reconciler.reconcile(&config);

        assert!(reconciler.reconcile(&config).is_empty());
    }
}
