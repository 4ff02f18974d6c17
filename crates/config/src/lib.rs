//! Topic and subscriber configuration for the event grid emulator.
//!
//! Raw user input ([`TopicOptions`]) is never used directly. It is run through
//! [`correct`] which produces a [`SubscriptionConfig`] that is always usable,
//! plus diagnostics describing what had to be dropped.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod corrector;
mod endpoint;
mod error;
mod filter;
mod loader;
mod name;
mod options;
mod store;
mod subscription_config;

pub use corrector::{Correction, correct};
pub use endpoint::{EndpointKind, PULL_SCHEME, SubscriberEndpoint};
pub use error::{EndpointError, Error, Result};
pub use filter::{Filter, FilterOptions};
pub use loader::{load_options, parse_options};
pub use name::{EventType, SubscriptionName, TopicName};
pub use options::TopicOptions;
pub use store::ConfigStore;
pub use subscription_config::{SubscriptionConfig, TopicListing};
