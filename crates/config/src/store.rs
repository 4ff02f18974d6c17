use crate::subscription_config::SubscriptionConfig;

use std::sync::Arc;

use arc_swap::ArcSwap;

/// Holds the active configuration.
///
/// Readers get a consistent snapshot without locking; a reload swaps the
/// whole snapshot at once.
#[derive(Debug)]
pub struct ConfigStore {
    current: ArcSwap<SubscriptionConfig>,
}

impl ConfigStore {
    /// Creates a store holding `config`.
    #[must_use]
    pub fn new(config: SubscriptionConfig) -> Self {
        Self {
            current: ArcSwap::from_pointee(config),
        }
    }

    /// The current snapshot.
    #[must_use]
    pub fn load(&self) -> Arc<SubscriptionConfig> {
        self.current.load_full()
    }

    /// Replaces the snapshot.
    pub fn store(&self, config: SubscriptionConfig) {
        self.current.store(Arc::new(config));
    }
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::new(SubscriptionConfig::default())
    }
}
