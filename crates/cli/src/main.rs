//! CLI binary running the event grid emulator.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use eventgrid_core::{Emulator, EmulatorOptions};
use eventgrid_delivery::RetryPolicy;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// CLI-specific error type
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Emulator error
    #[error(transparent)]
    Emulator(#[from] eventgrid_core::Error),

    /// Invalid log filter
    #[error("invalid log filter: {0}")]
    LogFilter(#[from] tracing_subscriber::filter::ParseError),

    /// Signal handler could not be installed
    #[error("failed to install signal handler: {0}")]
    Signal(#[source] std::io::Error),
}

#[derive(Clone, Debug, Parser)]
#[command(version, about, long_about = None)]
struct Args {
    /// Address to listen on
    #[arg(long, default_value = "0.0.0.0", env = "EVENTGRID_BIND")]
    bind: IpAddr,

    /// Path to the topic configuration file
    #[arg(long, default_value = "appsettings.json", env = "EVENTGRID_CONFIG")]
    config: PathBuf,

    /// Apply subscription filters to push subscribers too
    #[arg(long, env = "EVENTGRID_FILTER_PUSH_SUBSCRIBERS")]
    filter_push_subscribers: bool,

    /// Log filter directives, e.g. `info,eventgrid_delivery=debug`
    #[arg(long, env = "EVENTGRID_LOG")]
    log_filter: Option<String>,

    /// HTTP port
    #[arg(long, default_value_t = 6500, env = "EVENTGRID_PORT")]
    port: u16,

    /// Milliseconds between configuration reloads, 0 to disable
    #[arg(long, default_value_t = 1000, env = "EVENTGRID_RELOAD_INTERVAL_MS")]
    reload_interval_ms: u64,
}

impl Args {
    fn emulator_options(&self) -> EmulatorOptions {
        EmulatorOptions {
            listen_addr: SocketAddr::new(self.bind, self.port),
            config_path: self.config.clone(),
            reload_interval: Some(Duration::from_millis(self.reload_interval_ms)),
            filter_push_subscribers: self.filter_push_subscribers,
            retry_policy: RetryPolicy::default(),
        }
    }
}

fn init_tracing(log_filter: Option<&str>) -> Result<(), Error> {
    let filter = match log_filter {
        Some(directives) => EnvFilter::try_new(directives)?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };

    tracing_subscriber::fmt().with_env_filter(filter).init();

    Ok(())
}

async fn wait_for_signal() -> Result<(), Error> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut sigterm = signal(SignalKind::terminate()).map_err(Error::Signal)?;
        let mut sigint = signal(SignalKind::interrupt()).map_err(Error::Signal)?;

        tokio::select! {
            _ = sigterm.recv() => info!("Received SIGTERM"),
            _ = sigint.recv() => info!("Received SIGINT"),
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await.map_err(Error::Signal)?;
        info!("Received interrupt signal");
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    let args = Args::parse();
    init_tracing(args.log_filter.as_deref())?;

    let emulator = Emulator::new(args.emulator_options())?;

    // Create shared shutdown token
    let shutdown_token = CancellationToken::new();

    let signal_shutdown_token = shutdown_token.clone();
    tokio::spawn(async move {
        if let Err(e) = wait_for_signal().await {
            error!("{e}");
        }

        info!("Shutting down");
        signal_shutdown_token.cancel();
    });

    emulator.start().await?;

    shutdown_token.cancelled().await;
    emulator.shutdown().await;

    Ok(())
}
