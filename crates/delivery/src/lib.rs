//! Push delivery for the event grid emulator.
//!
//! Deliveries follow event grid's retry schedule and honor a per subscriber
//! cancellation handle, so removing a subscriber from configuration aborts
//! whatever is still pending for it.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod attempt;
mod dispatcher;
mod error;
mod key;
mod mock;
mod policy;
mod reconciler;
mod registry;
mod transport;

pub use attempt::DeliveryAttempt;
pub use dispatcher::*;
pub use error::*;
pub use key::SubscriberKey;
pub use mock::{MockResponse, MockTransport};
pub use policy::*;
pub use reconciler::{ReconcileReport, Reconciler};
pub use registry::CancellationRegistry;
pub use transport::{HttpTransport, PushRequest, PushTransport};
