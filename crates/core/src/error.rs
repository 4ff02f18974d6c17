use thiserror::Error;

/// The result type for this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in this crate.
#[derive(Debug, Error)]
pub enum Error {
    /// Emulator already started.
    #[error("emulator already started")]
    AlreadyStarted,

    /// Binding the listener failed.
    #[error("failed to bind listener: {0}")]
    Bind(#[source] std::io::Error),

    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] eventgrid_config::Error),

    /// Push delivery could not be set up.
    #[error(transparent)]
    Delivery(#[from] eventgrid_delivery::Error),
}
