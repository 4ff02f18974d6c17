//! HTTP surface of the emulator.

mod publish;
mod pull;
mod router;

pub use router::router;

/// Splits `orders:publish` into the resource name and its action.
fn split_action(segment: &str) -> Option<(&str, &str)> {
    segment
        .rsplit_once(':')
        .filter(|(name, action)| !name.is_empty() && !action.is_empty())
}
