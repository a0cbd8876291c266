//! # logfan
//!
//! A small structured-logging core: level-gated, multi-sink fan-out with a
//! size- and count-bounded rotating file sink.
//!
//! This crate provides:
//!
//! - [`Severity`] / [`LevelGate`] — Ordered levels and precomputed gating
//! - [`LogRecord`] / [`Attachment`] — Per-call records and attached values
//! - [`RecordFormatter`] — Canonical, time-zone-aware text rendering
//! - [`Sink`] / [`Delivery`] — The destination contract with explicit
//!   per-sink results
//! - [`RollingFileSink`] — Asynchronous single-writer rotating file output
//! - [`SinkGroup`] / [`Logger`] — Fan-out with cached per-source dispatchers
//! - [`Settings`] / [`Registry`] — `key=value` configuration and the
//!   explicit group registry
//!
//! Log calls never panic and never block meaningfully; configuration errors
//! surface synchronously at startup instead of silently losing logs.
//!
//! ## Example
//!
//! ```rust
//! use logfan::{site, Registry};
//!
//! # fn main() -> logfan::Result<()> {
//! let registry = Registry::from_config_text(
//!     "LogLevel=INFO\n\
//!      TimeZone=UTC\n\
//!      console=console\n",
//! )?;
//!
//! let logger = registry.group("server").logger("startup");
//! logger.info(site!(), "service started");
//! registry.shutdown();
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod format;
pub mod group;
pub mod level;
pub mod record;
pub mod registry;
pub mod sink;

// Re-export main types
pub use config::{Settings, SinkKind, SinkSpec};
pub use error::{ConfigError, Result};
pub use format::RecordFormatter;
pub use group::{Dispatch, Logger, SinkGroup};
pub use level::{should_emit, LevelGate, Severity};
pub use record::{Attachment, CallSite, ErrorInfo, LogRecord};
pub use registry::Registry;
pub use sink::{ConsoleSink, Delivery, NullSink, RollingFileSink, Sink};
