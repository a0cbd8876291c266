//! Output sinks and the sink capability contract.
//!
//! This module provides:
//! - [`Sink`] — The capability contract every destination implements
//! - [`Delivery`] — Explicit per-sink delivery results
//! - [`NullSink`] — Accepts everything, writes nothing
//! - [`ConsoleSink`] — Synchronous pass-through to stdout
//! - [`RollingFileSink`] — Size- and count-bounded rotating file output

mod console;
mod null;
mod rolling;

pub use console::ConsoleSink;
pub use null::NullSink;
pub use rolling::RollingFileSink;

use std::collections::HashMap;

use crate::error::Result;

/// The result of handing one payload to one sink.
///
/// Failures are values rather than errors so the dispatcher can aggregate
/// them without anything propagating to the log caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// Accepted for eventual write. For asynchronous sinks this means
    /// "enqueued", not "already durable".
    Delivered,
    /// Rejected before any work was attempted: empty payload, or the sink is
    /// not accepting.
    Rejected,
    /// The sink attempted delivery and failed; the payload is dropped.
    Failed(String),
}

impl Delivery {
    /// Returns true if the payload was accepted.
    #[must_use]
    pub fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered)
    }

    /// Returns true if the sink attempted and failed.
    #[must_use]
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// A destination capable of receiving formatted log text.
///
/// Implementations must never panic across this boundary, and `append` must
/// not block the caller meaningfully.
pub trait Sink: Send + Sync {
    /// One-time configuration from the sink's option map. The default
    /// implementation accepts and ignores any options.
    ///
    /// # Errors
    ///
    /// Returns an error if an option is invalid or the sink was already
    /// configured.
    fn configure(&self, options: &HashMap<String, String>) -> Result<()> {
        let _ = options;
        Ok(())
    }

    /// Hands one formatted text block to the sink.
    fn append(&self, text: &str) -> Delivery;

    /// Releases resources and drains pending work, best-effort. Never
    /// panics; safe to call more than once.
    fn shutdown(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delivery_predicates() {
        assert!(Delivery::Delivered.is_delivered());
        assert!(!Delivery::Rejected.is_delivered());
        assert!(Delivery::Failed("disk full".to_string()).is_failed());
        assert!(!Delivery::Delivered.is_failed());
    }

    #[test]
    fn default_configure_accepts_anything() {
        struct Discard;
        impl Sink for Discard {
            fn append(&self, _text: &str) -> Delivery {
                Delivery::Delivered
            }
        }

        let mut options = HashMap::new();
        options.insert("whatever".to_string(), "value".to_string());
        assert!(Discard.configure(&options).is_ok());
        Discard.shutdown();
    }

    #[test]
    fn sinks_are_object_safe() {
        fn assert_usable(_sink: &dyn Sink) {}
        assert_usable(&NullSink::default());
        assert_usable(&ConsoleSink::default());
    }
}
