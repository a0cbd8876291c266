//! Parsing of the `key=value` configuration text.
//!
//! This module provides:
//! - [`Settings`] — The validated configuration object
//! - [`SinkSpec`] — One declared sink instance with its option map
//! - [`SinkKind`] — The sink types this crate can construct
//!
//! The format is newline-separated `key=value` tokens; all whitespace inside
//! a line is stripped before matching. `LogLevel` and `TimeZone` are
//! required (first occurrence wins). Any other dot-free key declares a sink
//! instance under that alias, and `alias.option=value` lines are routed into
//! that sink's option map. All parse failures are fatal and raised before
//! any sink is constructed.

use std::collections::HashMap;
use std::str::FromStr;

use chrono_tz::Tz;

use crate::error::{ConfigError, Result};
use crate::level::Severity;

/// The sink types that can be declared in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkKind {
    /// Synchronous stdout pass-through.
    Console,
    /// Discards everything.
    Null,
    /// Rotating file output.
    RollingFile,
}

impl SinkKind {
    /// Parses a sink type name. Accepts the short kind name or a
    /// fully-qualified path whose last segment is the sink type name
    /// (`logfan::sink::RollingFileSink`).
    #[must_use]
    pub fn from_type_name(raw: &str) -> Option<Self> {
        let short = raw.rsplit("::").next().unwrap_or(raw);
        match short.to_ascii_lowercase().as_str() {
            "console" | "consolesink" => Some(Self::Console),
            "null" | "nullsink" => Some(Self::Null),
            "rollingfile" | "rolling_file" | "rollingfilesink" => Some(Self::RollingFile),
            _ => None,
        }
    }
}

/// One declared sink instance.
#[derive(Debug, Clone)]
pub struct SinkSpec {
    /// Unique alias the sink was declared under.
    pub alias: String,
    /// Which sink type to construct.
    pub kind: SinkKind,
    /// Options routed to the sink's `configure`.
    pub options: HashMap<String, String>,
}

/// A fully validated configuration.
#[derive(Debug, Clone)]
pub struct Settings {
    /// The severity threshold shared by every group.
    pub level: Severity,
    /// The zone records are rendered in.
    pub timezone: Tz,
    /// Declared sinks, in declaration order.
    pub sinks: Vec<SinkSpec>,
}

impl Settings {
    /// Parses configuration text.
    ///
    /// # Errors
    ///
    /// Returns an error for a missing `LogLevel` or `TimeZone`, a line
    /// without `=`, a duplicate alias, an unknown sink type or level name,
    /// an invalid time zone, or an option for an alias never declared.
    pub fn parse(text: &str) -> Result<Self> {
        let mut level: Option<Severity> = None;
        let mut timezone: Option<Tz> = None;
        let mut sinks: Vec<SinkSpec> = Vec::new();
        let mut pending_options: HashMap<String, HashMap<String, String>> = HashMap::new();

        for (idx, raw) in text.lines().enumerate() {
            let line: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
            if line.is_empty() {
                continue;
            }

            let malformed = || ConfigError::MalformedLine {
                line: idx + 1,
                text: raw.trim().to_string(),
            };
            let Some((key, value)) = line.split_once('=') else {
                return Err(malformed());
            };
            if key.is_empty() || value.is_empty() {
                return Err(malformed());
            }

            if key == "LogLevel" {
                if level.is_none() {
                    level = Some(value.parse()?);
                }
                continue;
            }
            if key == "TimeZone" {
                if timezone.is_none() {
                    timezone = Some(
                        Tz::from_str(value)
                            .map_err(|_| ConfigError::InvalidTimeZone(value.to_string()))?,
                    );
                }
                continue;
            }

            if let Some((alias, option)) = key.split_once('.') {
                if alias.is_empty() || option.is_empty() {
                    return Err(malformed());
                }
                pending_options
                    .entry(alias.to_string())
                    .or_default()
                    .insert(option.to_string(), value.to_string());
                continue;
            }

            if sinks.iter().any(|spec| spec.alias == key) {
                return Err(ConfigError::DuplicateAlias(key.to_string()));
            }
            let kind = SinkKind::from_type_name(value)
                .ok_or_else(|| ConfigError::UnknownSinkType(value.to_string()))?;
            sinks.push(SinkSpec {
                alias: key.to_string(),
                kind,
                options: HashMap::new(),
            });
        }

        let level = level.ok_or(ConfigError::MissingSetting("LogLevel"))?;
        let timezone = timezone.ok_or(ConfigError::MissingSetting("TimeZone"))?;

        // Options may appear before or after their declaration, but never
        // without one.
        for (alias, options) in pending_options {
            let Some(spec) = sinks.iter_mut().find(|spec| spec.alias == alias) else {
                return Err(ConfigError::UndeclaredAlias(alias));
            };
            spec.options = options;
        }

        Ok(Self {
            level,
            timezone,
            sinks,
        })
    }
}
