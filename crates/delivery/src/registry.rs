use crate::key::SubscriberKey;

use std::collections::HashMap;
use std::sync::Arc;

use arc_swap::ArcSwap;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// One cancellation handle per topic subscriber.
///
/// Every handle is a child of the shutdown token, so shutting down cancels
/// all of them. Lookups read an immutable snapshot and never take a lock;
/// registration and removal swap in a new snapshot.
#[derive(Debug)]
pub struct CancellationRegistry {
    tokens: ArcSwap<HashMap<SubscriberKey, CancellationToken>>,
    shutdown: CancellationToken,
}

impl CancellationRegistry {
    /// Creates a registry whose handles are all canceled by `shutdown`.
    #[must_use]
    pub fn new(shutdown: CancellationToken) -> Self {
        Self {
            tokens: ArcSwap::default(),
            shutdown,
        }
    }

    /// Adds a handle for `key`. Returns false, keeping the existing handle,
    /// when one is already registered.
    pub fn register(&self, key: &SubscriberKey) -> bool {
        let previous = self.tokens.rcu(|current| {
            if current.contains_key(key) {
                return Arc::clone(current);
            }

            let mut next = HashMap::clone(current);
            next.insert(key.clone(), self.shutdown.child_token());
            Arc::new(next)
        });

        let added = !previous.contains_key(key);
        if added {
            debug!(%key, "registered subscriber");
        }
        added
    }

    /// The handle of `key`, or the shutdown token when `key` is unknown.
    #[must_use]
    pub fn get(&self, key: &SubscriberKey) -> CancellationToken {
        self.tokens
            .load()
            .get(key)
            .cloned()
            .unwrap_or_else(|| self.shutdown.clone())
    }

    /// Removes the handle of `key` and cancels it, aborting every delivery
    /// that uses it. Returns whether `key` was registered.
    pub fn unregister(&self, key: &SubscriberKey) -> bool {
        let previous = self.tokens.rcu(|current| {
            if !current.contains_key(key) {
                return Arc::clone(current);
            }

            let mut next = HashMap::clone(current);
            next.remove(key);
            Arc::new(next)
        });

        match previous.get(key) {
            Some(token) => {
                token.cancel();
                debug!(%key, "unregistered subscriber");
                true
            }
            None => false,
        }
    }

    /// Whether `key` has its own handle.
    #[must_use]
    pub fn is_registered(&self, key: &SubscriberKey) -> bool {
        self.tokens.load().contains_key(key)
    }

    /// Number of registered subscribers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.load().len()
    }

    /// Whether no subscriber is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.load().is_empty()
    }

    /// The token canceled on shutdown.
    #[must_use]
    pub const fn shutdown_token(&self) -> &CancellationToken {
        &self.shutdown
    }

    /// Cancels every handle, registered or not.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }
}

impl Default for CancellationRegistry {
    fn default() -> Self {
        Self::new(CancellationToken::new())
    }
}
