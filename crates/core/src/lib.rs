//! Event grid emulator: routes published events to push and pull
//! subscribers and serves the HTTP surface for both.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod api;
mod dispatcher;
mod emulator;
mod error;
mod reloader;

pub use api::router;
pub use dispatcher::{DispatchOutcome, Dispatcher, DispatcherOptions};
pub use emulator::{Emulator, EmulatorOptions};
pub use error::{Error, Result};
pub use reloader::ConfigReloader;
