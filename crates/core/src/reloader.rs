use crate::error::Result;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use eventgrid_config::{ConfigStore, Correction, correct, load_options};
use eventgrid_delivery::{CancellationRegistry, Reconciler};
use parking_lot::Mutex;
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Loads the configuration file and applies it whenever it changes.
///
/// Applying means correcting the raw options, reconciling cancellation
/// handles against the previous configuration and publishing the new
/// snapshot. A configuration equal to the active one is ignored.
#[derive(Debug)]
pub struct ConfigReloader {
    path: PathBuf,
    store: Arc<ConfigStore>,
    reconciler: Reconciler,
    applied: Mutex<u64>,
}

impl ConfigReloader {
    /// Creates a reloader for the file at `path`.
    pub fn new(
        path: impl Into<PathBuf>,
        store: Arc<ConfigStore>,
        registry: Arc<CancellationRegistry>,
    ) -> Self {
        Self {
            path: path.into(),
            store,
            reconciler: Reconciler::new(registry),
            applied: Mutex::new(0),
        }
    }

    /// The configuration file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the file and applies it. Returns whether anything changed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed. The active
    /// configuration is left untouched in that case.
    pub async fn reload(&self) -> Result<bool> {
        let options = load_options(&self.path).await?;

        Ok(self.apply(correct(&options)))
    }

    /// Applies an already corrected configuration. Returns whether anything
    /// changed.
    #[allow(clippy::significant_drop_tightening)]
    pub fn apply(&self, correction: Correction) -> bool {
        let mut applied = self.applied.lock();

        if *applied > 0 && *self.store.load() == correction.config {
            return false;
        }

        for url in &correction.invalid_urls {
            warn!("ignoring invalid subscriber url '{url}'");
        }
        for subscription in &correction.invalid_filters {
            warn!("ignoring invalid filter for subscription '{subscription}'");
        }

        let report = self.reconciler.reconcile(&correction.config);
        let listing = correction.config.listing().to_string();
        self.store.store(correction.config);

        *applied += 1;
        if *applied == 1 {
            info!("Loaded topics and subscribers:{listing}");
        } else {
            info!(
                added = report.added.len(),
                removed = report.removed.len(),
                "Reloaded topics and subscribers:{listing}"
            );
        }

        true
    }

    /// Reloads every `period` until `shutdown_token` is canceled. Failed
    /// reloads are logged and keep the active configuration.
    pub async fn run(&self, period: Duration, shutdown_token: CancellationToken) {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await;

        loop {
            tokio::select! {
                () = shutdown_token.cancelled() => break,
                _ = ticker.tick() => {
                    if let Err(e) = self.reload().await {
                        error!("failed to reload {}: {e}", self.path.display());
                    }
                }
            }
        }
    }
}
