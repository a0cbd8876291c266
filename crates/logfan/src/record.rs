//! Log records and the values attached to them.
//!
//! This module provides:
//! - [`LogRecord`] — The ephemeral per-call record handed to the formatter
//! - [`Attachment`] — The optional value attached to a record
//! - [`CallSite`] — Explicit caller identity, built with the [`site!`] macro
//!
//! [`site!`]: crate::site

use chrono::{DateTime, Utc};

use crate::level::Severity;

/// Explicit caller identity supplied with each log call.
///
/// Callers name themselves instead of the library inspecting the call stack;
/// the [`site!`](crate::site) macro fills this in from `file!()`,
/// `module_path!()`, and `line!()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallSite {
    /// Source file of the call.
    pub file: &'static str,
    /// Logical method or module issuing the call.
    pub method: &'static str,
    /// Line number of the call.
    pub line: u32,
}

impl CallSite {
    /// Creates a call site from its three parts.
    #[must_use]
    pub const fn new(file: &'static str, method: &'static str, line: u32) -> Self {
        Self { file, method, line }
    }
}

/// Builds a [`CallSite`] for the current location.
#[macro_export]
macro_rules! site {
    () => {
        $crate::record::CallSite::new(file!(), module_path!(), line!())
    };
}

/// Captured detail of an error attachment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorInfo {
    /// Short type name of the error.
    pub kind: String,
    /// The error's own message, when it has one.
    pub message: Option<String>,
    /// The `source()` chain, outermost cause first.
    pub frames: Vec<String>,
}

impl ErrorInfo {
    fn capture<E: std::error::Error>(err: &E) -> Self {
        let rendered = err.to_string();
        let message = if rendered.is_empty() {
            None
        } else {
            Some(rendered)
        };

        let mut frames = Vec::new();
        let mut cause = err.source();
        while let Some(inner) = cause {
            frames.push(inner.to_string());
            cause = inner.source();
        }

        Self {
            kind: short_type_name::<E>(),
            message,
            frames,
        }
    }
}

fn short_type_name<T>() -> String {
    let full = std::any::type_name::<T>();
    full.rsplit("::").next().unwrap_or(full).to_string()
}

/// A value attached to a log record.
///
/// The two-branch rendering rule lives in the formatter: errors render as a
/// type name, message, and frame lines; everything else renders as its
/// default string form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attachment {
    /// An explicitly absent value, rendered as the literal `null`.
    Null,
    /// An error with its cause chain.
    Error(ErrorInfo),
    /// Any other value, captured as its `Display` form.
    Value(String),
}

impl Attachment {
    /// Captures an error and its cause chain.
    #[must_use]
    pub fn error<E: std::error::Error>(err: &E) -> Self {
        Self::Error(ErrorInfo::capture(err))
    }

    /// Captures any displayable value.
    #[must_use]
    pub fn value<V: std::fmt::Display>(value: &V) -> Self {
        Self::Value(value.to_string())
    }
}

/// One log event, created per call and never retained.
#[derive(Debug, Clone)]
pub struct LogRecord {
    /// Severity the call was issued at.
    pub severity: Severity,
    /// The message text.
    pub message: String,
    /// Optional attached value.
    pub attachment: Option<Attachment>,
    /// When the call was issued.
    pub timestamp: DateTime<Utc>,
    /// Name of the issuing thread.
    pub thread: String,
    /// Caller identity.
    pub site: CallSite,
}

impl LogRecord {
    /// Creates a record for the current instant and thread.
    #[must_use]
    pub fn new(
        severity: Severity,
        message: &str,
        attachment: Option<Attachment>,
        site: CallSite,
    ) -> Self {
        Self {
            severity,
            message: message.to_string(),
            attachment,
            timestamp: Utc::now(),
            thread: current_thread_name(),
            site,
        }
    }
}

fn current_thread_name() -> String {
    let current = std::thread::current();
    current
        .name()
        .map_or_else(|| format!("{:?}", current.id()), str::to_owned)
}
