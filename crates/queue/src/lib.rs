//! In-memory pull subscription queues with lock-token based settlement.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod lock_token;
mod settle;
mod store;
mod subscription_queue;

pub use lock_token::LockToken;
pub use settle::{FailedLockToken, SettleAction, SettleError, SettleResult};
pub use store::{QueueKey, QueueStore};
pub use subscription_queue::{Delivery, ReceiveOutcome, SubscriptionQueue};
