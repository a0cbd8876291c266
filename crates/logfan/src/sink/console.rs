//! Synchronous console output.

use std::io::Write;

use super::{Delivery, Sink};

/// Direct, synchronous pass-through to stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleSink;

impl Sink for ConsoleSink {
    fn append(&self, text: &str) -> Delivery {
        if text.is_empty() {
            return Delivery::Rejected;
        }
        let mut out = std::io::stdout().lock();
        match out.write_all(text.as_bytes()).and_then(|()| out.flush()) {
            Ok(()) => Delivery::Delivered,
            Err(err) => Delivery::Failed(err.to_string()),
        }
    }
}
