//! Severity levels and the precomputed level gate.
//!
//! This module provides:
//! - [`Severity`] — Totally ordered severity tiers with gating sentinels
//! - [`should_emit`] — The gating rule as a pure function
//! - [`LevelGate`] — Per-dispatcher precomputed booleans

use std::str::FromStr;

use crate::error::ConfigError;

/// Log severity tiers, ordered from least to most severe.
///
/// `All` and `Off` are gating sentinels only: a group threshold of `All`
/// emits everything and `Off` emits nothing, but no record carries either.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Severity {
    /// Sentinel: every level passes the gate.
    All,
    /// Most verbose emittable level.
    Trace,
    /// Debugging information.
    Debug,
    /// General information.
    Info,
    /// Warning conditions.
    Warn,
    /// Error conditions.
    Error,
    /// Unrecoverable conditions.
    Fatal,
    /// Sentinel: nothing passes the gate.
    Off,
}

impl Severity {
    /// The six levels a record may carry, in ascending rank order.
    pub const EMITTABLE: [Self; 6] = [
        Self::Trace,
        Self::Debug,
        Self::Info,
        Self::Warn,
        Self::Error,
        Self::Fatal,
    ];

    /// Numeric rank used by the gating rule. Ordering never changes at runtime.
    #[must_use]
    pub const fn rank(self) -> u8 {
        self as u8
    }

    /// Fixed-width label, left-justified and padded to 5 characters so
    /// severity columns align in rendered output.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::All => "ALL  ",
            Self::Trace => "TRACE",
            Self::Debug => "DEBUG",
            Self::Info => "INFO ",
            Self::Warn => "WARN ",
            Self::Error => "ERROR",
            Self::Fatal => "FATAL",
            Self::Off => "OFF  ",
        }
    }

    /// Returns true for the six levels a record may carry.
    #[must_use]
    pub const fn is_emittable(self) -> bool {
        !matches!(self, Self::All | Self::Off)
    }
}

impl FromStr for Severity {
    type Err = ConfigError;

    /// Parses a severity name, ignoring surrounding whitespace and case.
    /// Trimmed [`Severity::label`] output round-trips through this.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ALL" => Ok(Self::All),
            "TRACE" => Ok(Self::Trace),
            "DEBUG" => Ok(Self::Debug),
            "INFO" => Ok(Self::Info),
            "WARN" => Ok(Self::Warn),
            "ERROR" => Ok(Self::Error),
            "FATAL" => Ok(Self::Fatal),
            "OFF" => Ok(Self::Off),
            other => Err(ConfigError::UnknownLevel(other.to_string())),
        }
    }
}

/// The gating rule: emit iff the threshold is `All`, or the threshold is not
/// `Off` and the candidate ranks at least as high as the threshold.
#[must_use]
pub fn should_emit(threshold: Severity, candidate: Severity) -> bool {
    if threshold == Severity::All {
        return true;
    }
    if threshold == Severity::Off {
        return false;
    }
    candidate.rank() >= threshold.rank()
}

/// Precomputed per-dispatcher gate.
///
/// Computed once per dispatcher because the group threshold never changes
/// after construction; this turns every log call's guard into a single
/// boolean read.
#[derive(Debug, Clone, Copy)]
pub struct LevelGate {
    trace: bool,
    debug: bool,
    info: bool,
    warn: bool,
    error: bool,
    fatal: bool,
}

impl LevelGate {
    /// Precomputes the gate for the given group threshold.
    #[must_use]
    pub fn new(threshold: Severity) -> Self {
        Self {
            trace: should_emit(threshold, Severity::Trace),
            debug: should_emit(threshold, Severity::Debug),
            info: should_emit(threshold, Severity::Info),
            warn: should_emit(threshold, Severity::Warn),
            error: should_emit(threshold, Severity::Error),
            fatal: should_emit(threshold, Severity::Fatal),
        }
    }

    /// Single-boolean-read guard. The sentinels are never emittable.
    #[must_use]
    pub const fn enabled(&self, severity: Severity) -> bool {
        match severity {
            Severity::All | Severity::Off => false,
            Severity::Trace => self.trace,
            Severity::Debug => self.debug,
            Severity::Info => self.info,
            Severity::Warn => self.warn,
            Severity::Error => self.error,
            Severity::Fatal => self.fatal,
        }
    }
}
