//! Sink groups and their per-source dispatchers.
//!
//! This module provides:
//! - [`SinkGroup`] — A named set of sinks sharing a threshold and time zone
//! - [`Logger`] — The cached per-source dispatcher with a precomputed gate
//! - [`Dispatch`] — The aggregated per-sink results of one log call

use std::collections::HashMap;
use std::sync::Arc;

use chrono_tz::Tz;
use parking_lot::RwLock;

use crate::format::RecordFormatter;
use crate::level::{should_emit, LevelGate, Severity};
use crate::record::{Attachment, CallSite, LogRecord};
use crate::sink::{ConsoleSink, Delivery, Sink};

/// The sink set shared between a group and its dispatchers.
///
/// Append-mostly: safe for concurrent iteration while sinks are being added.
struct SinkSet {
    sinks: RwLock<Vec<Arc<dyn Sink>>>,
    fallback: Arc<dyn Sink>,
}

/// A set of sinks with an immutable severity threshold and time zone.
///
/// Groups and their sinks are created once at configuration time and live
/// for the process lifetime. Internal failures are reported on the group's
/// own fallback sink, never to the log caller.
pub struct SinkGroup {
    threshold: Severity,
    tz: Tz,
    set: Arc<SinkSet>,
    loggers: RwLock<HashMap<String, Arc<Logger>>>,
}

impl SinkGroup {
    /// Creates a group reporting internal failures to the console.
    #[must_use]
    pub fn new(threshold: Severity, tz: Tz) -> Self {
        Self::with_fallback(threshold, tz, Arc::new(ConsoleSink))
    }

    /// Creates a group with an explicit fallback sink.
    #[must_use]
    pub fn with_fallback(threshold: Severity, tz: Tz, fallback: Arc<dyn Sink>) -> Self {
        Self {
            threshold,
            tz,
            set: Arc::new(SinkSet {
                sinks: RwLock::new(Vec::new()),
                fallback,
            }),
            loggers: RwLock::new(HashMap::new()),
        }
    }

    /// The group's severity threshold. Never changes after construction.
    #[must_use]
    pub const fn threshold(&self) -> Severity {
        self.threshold
    }

    /// The zone this group's records are rendered in.
    #[must_use]
    pub const fn timezone(&self) -> Tz {
        self.tz
    }

    /// Adds a sink to the set. Existing dispatchers pick it up on their next
    /// call.
    pub fn add_sink(&self, sink: Arc<dyn Sink>) {
        self.set.sinks.write().push(sink);
    }

    /// Number of sinks currently in the set.
    #[must_use]
    pub fn sink_count(&self) -> usize {
        self.set.sinks.read().len()
    }

    /// Returns the dispatcher for a logical source, creating and caching it
    /// on first use. First use is noted on the fallback sink at trace level.
    pub fn logger(&self, source: &str) -> Arc<Logger> {
        if let Some(logger) = self.loggers.read().get(source) {
            return Arc::clone(logger);
        }

        let mut loggers = self.loggers.write();
        let logger = loggers.entry(source.to_string()).or_insert_with(|| {
            tracing::trace!(source, "created dispatcher");
            if should_emit(self.threshold, Severity::Trace) {
                self.set
                    .fallback
                    .append(&format!("created dispatcher for source {source}\n"));
            }
            Arc::new(Logger {
                source: source.to_string(),
                gate: LevelGate::new(self.threshold),
                formatter: RecordFormatter::new(self.tz),
                set: Arc::clone(&self.set),
            })
        });
        Arc::clone(logger)
    }

    /// Shuts down every sink in the set and the fallback, best-effort.
    pub fn shutdown(&self) {
        for sink in self.set.sinks.read().iter() {
            sink.shutdown();
        }
        self.set.fallback.shutdown();
    }
}

/// Aggregated result of one log call.
///
/// Failures stay observable here (and on the group's fallback sink) without
/// ever propagating to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatch {
    /// Whether the record passed the level gate and was formatted at all.
    pub emitted: bool,
    /// One delivery result per sink, in the set's current order.
    pub results: Vec<Delivery>,
}

impl Dispatch {
    fn skipped() -> Self {
        Self {
            emitted: false,
            results: Vec::new(),
        }
    }

    /// Number of sinks that accepted the payload.
    #[must_use]
    pub fn delivered_count(&self) -> usize {
        self.results.iter().filter(|d| d.is_delivered()).count()
    }

    /// Number of sinks that attempted delivery and failed.
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.results.iter().filter(|d| d.is_failed()).count()
    }
}

/// Per-source dispatcher: a precomputed gate plus fan-out over the group's
/// sink set.
pub struct Logger {
    source: String,
    gate: LevelGate,
    formatter: RecordFormatter,
    set: Arc<SinkSet>,
}

impl Logger {
    /// The logical source this dispatcher was cached under.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Gates, formats once, and fans the record out to every sink.
    ///
    /// Disabled severities return immediately without formatting. Delivery
    /// to each sink is independent and best-effort, with no ordering
    /// guarantee across sinks; failures are recorded on the fallback sink
    /// and aggregated into the returned [`Dispatch`].
    pub fn log(
        &self,
        severity: Severity,
        site: CallSite,
        message: &str,
        attachment: Option<Attachment>,
    ) -> Dispatch {
        if !self.gate.enabled(severity) {
            return Dispatch::skipped();
        }

        let record = LogRecord::new(severity, message, attachment, site);
        let text = self.formatter.format(&record);

        let sinks: Vec<Arc<dyn Sink>> = self.set.sinks.read().clone();
        let mut results = Vec::with_capacity(sinks.len());
        for sink in sinks {
            let delivery = sink.append(&text);
            if let Delivery::Failed(reason) = &delivery {
                tracing::warn!(source = self.source, reason, "sink delivery failed");
                self.set
                    .fallback
                    .append(&format!("sink delivery failed ({}): {reason}\n", self.source));
            }
            results.push(delivery);
        }

        Dispatch {
            emitted: true,
            results,
        }
    }

    /// Logs at trace level.
    pub fn trace(&self, site: CallSite, message: &str) -> Dispatch {
        self.log(Severity::Trace, site, message, None)
    }

    /// Logs at trace level with an attached value.
    pub fn trace_with(&self, site: CallSite, message: &str, attachment: Attachment) -> Dispatch {
        self.log(Severity::Trace, site, message, Some(attachment))
    }

    /// Logs at debug level.
    pub fn debug(&self, site: CallSite, message: &str) -> Dispatch {
        self.log(Severity::Debug, site, message, None)
    }

    /// Logs at debug level with an attached value.
    pub fn debug_with(&self, site: CallSite, message: &str, attachment: Attachment) -> Dispatch {
        self.log(Severity::Debug, site, message, Some(attachment))
    }

    /// Logs at info level.
    pub fn info(&self, site: CallSite, message: &str) -> Dispatch {
        self.log(Severity::Info, site, message, None)
    }

    /// Logs at info level with an attached value.
    pub fn info_with(&self, site: CallSite, message: &str, attachment: Attachment) -> Dispatch {
        self.log(Severity::Info, site, message, Some(attachment))
    }

    /// Logs at warn level.
    pub fn warn(&self, site: CallSite, message: &str) -> Dispatch {
        self.log(Severity::Warn, site, message, None)
    }

    /// Logs at warn level with an attached value.
    pub fn warn_with(&self, site: CallSite, message: &str, attachment: Attachment) -> Dispatch {
        self.log(Severity::Warn, site, message, Some(attachment))
    }

    /// Logs at error level.
    pub fn error(&self, site: CallSite, message: &str) -> Dispatch {
        self.log(Severity::Error, site, message, None)
    }

    /// Logs at error level with an attached value.
    pub fn error_with(&self, site: CallSite, message: &str, attachment: Attachment) -> Dispatch {
        self.log(Severity::Error, site, message, Some(attachment))
    }

    /// Logs at fatal level.
    pub fn fatal(&self, site: CallSite, message: &str) -> Dispatch {
        self.log(Severity::Fatal, site, message, None)
    }

    /// Logs at fatal level with an attached value.
    pub fn fatal_with(&self, site: CallSite, message: &str, attachment: Attachment) -> Dispatch {
        self.log(Severity::Fatal, site, message, Some(attachment))
    }
}
