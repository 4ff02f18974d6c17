use crate::subscription_queue::SubscriptionQueue;

use std::sync::Arc;

use dashmap::DashMap;
use eventgrid_config::{SubscriptionName, TopicName};

/// Identifies a pull subscription queue. Both parts compare
/// case-insensitively.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct QueueKey {
    /// Topic the subscription belongs to.
    pub topic: TopicName,

    /// Subscription name.
    pub subscription: SubscriptionName,
}

impl QueueKey {
    /// Creates a key.
    pub fn new(topic: impl Into<TopicName>, subscription: impl Into<SubscriptionName>) -> Self {
        Self {
            topic: topic.into(),
            subscription: subscription.into(),
        }
    }
}

/// All pull subscription queues of the emulator.
///
/// Queues are created on first use and live as long as the store, even when
/// their subscription is removed from configuration.
#[derive(Debug)]
pub struct QueueStore<T> {
    queues: DashMap<QueueKey, Arc<SubscriptionQueue<T>>>,
}

impl<T> QueueStore<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            queues: DashMap::new(),
        }
    }

    /// The queue for `key`, created if needed.
    pub fn queue(&self, key: QueueKey) -> Arc<SubscriptionQueue<T>> {
        self.queues
            .entry(key)
            .or_insert_with(|| Arc::new(SubscriptionQueue::new()))
            .clone()
    }

    /// Number of queues created so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.queues.len()
    }

    /// Whether no queue was created yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queues.is_empty()
    }
}

impl<T> Default for QueueStore<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queues_are_shared_case_insensitively() {
        let store = QueueStore::<String>::new();

        let a = store.queue(QueueKey::new("Orders", "Sub"));
        let b = store.queue(QueueKey::new("orders", "SUB"));
        let c = store.queue(QueueKey::new("orders", "other"));

        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(store.len(), 2);
    }
}
