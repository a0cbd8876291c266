//! A sink that discards everything.

use super::{Delivery, Sink};

/// Accepts every non-empty payload and does nothing with it.
///
/// Configure this when nothing should be logged; it never fails and never
/// touches any resource.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl Sink for NullSink {
    fn append(&self, text: &str) -> Delivery {
        if text.is_empty() {
            Delivery::Rejected
        } else {
            Delivery::Delivered
        }
    }
}
