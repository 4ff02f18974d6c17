use crate::api::router;
use crate::dispatcher::{Dispatcher, DispatcherOptions};
use crate::error::{Error, Result};
use crate::reloader::ConfigReloader;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use eventgrid_delivery::{HttpTransport, PushTransport, RetryPolicy};
use parking_lot::Mutex;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{error, info};

/// Options for creating an [`Emulator`].
#[derive(Clone, Debug)]
pub struct EmulatorOptions {
    /// Address to accept publish and pull requests on.
    pub listen_addr: SocketAddr,

    /// Topic configuration file.
    pub config_path: PathBuf,

    /// How often the configuration file is re-read. `None` disables reloads.
    pub reload_interval: Option<Duration>,

    /// Whether filters also apply to push subscribers.
    pub filter_push_subscribers: bool,

    /// Retry policy of push deliveries.
    pub retry_policy: RetryPolicy,
}

/// The event grid emulator service.
#[derive(Debug)]
pub struct Emulator<P = HttpTransport>
where
    P: PushTransport,
{
    listen_addr: SocketAddr,
    reload_interval: Option<Duration>,
    dispatcher: Arc<Dispatcher<P>>,
    reloader: Arc<ConfigReloader>,
    local_addr: Mutex<Option<SocketAddr>>,
    shutdown_token: CancellationToken,
    task_tracker: TaskTracker,
}

impl Emulator<HttpTransport> {
    /// Creates an emulator that pushes over HTTP.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(options: EmulatorOptions) -> Result<Self> {
        Ok(Self::with_transport(options, HttpTransport::new()?))
    }
}

impl<P> Emulator<P>
where
    P: PushTransport,
{
    /// Creates an emulator that pushes through `transport`.
    pub fn with_transport(
        EmulatorOptions {
            listen_addr,
            config_path,
            reload_interval,
            filter_push_subscribers,
            retry_policy,
        }: EmulatorOptions,
        transport: P,
    ) -> Self {
        let shutdown_token = CancellationToken::new();

        let dispatcher = Arc::new(Dispatcher::new(DispatcherOptions {
            transport,
            retry_policy,
            filter_push_subscribers,
            shutdown_token: shutdown_token.child_token(),
        }));

        let reloader = Arc::new(ConfigReloader::new(
            config_path,
            dispatcher.config_store().clone(),
            dispatcher.registry().clone(),
        ));

        Self {
            listen_addr,
            reload_interval: reload_interval.filter(|interval| !interval.is_zero()),
            dispatcher,
            reloader,
            local_addr: Mutex::new(None),
            shutdown_token,
            task_tracker: TaskTracker::new(),
        }
    }

    /// The dispatcher behind the HTTP surface.
    #[must_use]
    pub const fn dispatcher(&self) -> &Arc<Dispatcher<P>> {
        &self.dispatcher
    }

    /// The configuration reloader.
    #[must_use]
    pub const fn reloader(&self) -> &Arc<ConfigReloader> {
        &self.reloader
    }

    /// The emulator's routes, without a listener.
    pub fn router(&self) -> Router {
        router(self.dispatcher.clone())
    }

    /// Address actually bound, once started.
    #[must_use]
    pub fn local_addr(&self) -> Option<SocketAddr> {
        *self.local_addr.lock()
    }

    /// Loads the configuration, binds the listener and starts serving.
    ///
    /// # Errors
    ///
    /// Returns an error if already started, if the configuration file exists
    /// but is invalid, or if the listener cannot be bound.
    pub async fn start(&self) -> Result<SocketAddr> {
        if self.task_tracker.is_closed() {
            return Err(Error::AlreadyStarted);
        }

        self.reloader.reload().await?;

        let listener = TcpListener::bind(self.listen_addr)
            .await
            .map_err(Error::Bind)?;
        let local_addr = listener.local_addr().map_err(Error::Bind)?;
        *self.local_addr.lock() = Some(local_addr);

        let router = self.router();
        let shutdown_token = self.shutdown_token.clone();
        self.task_tracker.spawn(async move {
            let server = axum::serve(listener, router.into_make_service())
                .with_graceful_shutdown(shutdown_token.cancelled_owned());

            if let Err(e) = server.await {
                error!("http server exited: {e}");
            }
        });

        if let Some(period) = self.reload_interval {
            let reloader = self.reloader.clone();
            let shutdown_token = self.shutdown_token.clone();
            self.task_tracker.spawn(async move {
                reloader.run(period, shutdown_token).await;
            });
        }

        self.task_tracker.close();

        info!(
            "listening for events on http://{local_addr}/{{topic}}/api/events and http://{local_addr}/topics/{{topic}}:publish"
        );
        info!("emulator started");

        Ok(local_addr)
    }

    /// Stops serving, cancels every pending delivery and waits for all tasks.
    pub async fn shutdown(&self) {
        info!("shutting down...");

        self.shutdown_token.cancel();
        self.task_tracker.close();
        self.dispatcher.shutdown().await;
        self.task_tracker.wait().await;

        info!("stopped");
    }

    /// Waits for the emulator to stop.
    pub async fn wait(&self) {
        self.task_tracker.wait().await;
    }
}
