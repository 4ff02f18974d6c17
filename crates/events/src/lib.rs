//! Event models accepted by the event grid emulator.
//!
//! Publishers send either event grid schema events or CloudEvents. The content
//! type of a publish request is classified once into a [`PublishFormat`], the
//! body is decoded into a [`PublishBatch`] and the batch is stamped with its
//! provenance before being fanned out.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod batch;
mod cloud_event;
mod error;
mod event;
mod event_grid_event;
mod format;

pub use batch::*;
pub use cloud_event::*;
pub use error::*;
pub use event::*;
pub use event_grid_event::*;
pub use format::*;

/// Prefix of the resource id stamped onto events, followed by the topic name.
pub const TOPIC_RESOURCE_PREFIX: &str =
    "/subscriptions/00000000-0000-0000-0000-000000000000/resourceGroups/test-rg/providers/Microsoft.EventGrid/topics/";

/// Resource id of `topic` as event grid would report it.
#[must_use]
pub fn resource_id(topic: &str) -> String {
    format!("{TOPIC_RESOURCE_PREFIX}{topic}")
}
