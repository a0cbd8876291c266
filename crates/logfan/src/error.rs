//! Error types for the logging core.

use thiserror::Error;

/// Errors raised while parsing settings or configuring sinks.
///
/// Configuration errors are fatal: they are raised once at startup, before
/// any sink is used. Per-payload delivery failures are not errors — they are
/// reported as [`Delivery::Failed`](crate::sink::Delivery::Failed) values.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required top-level setting was not present.
    #[error("missing required setting: {0}")]
    MissingSetting(&'static str),

    /// A line could not be split into `key=value`.
    #[error("malformed line {line}: {text}")]
    MalformedLine {
        /// 1-based line number in the configuration text.
        line: usize,
        /// The offending line, trimmed.
        text: String,
    },

    /// Two sink declarations used the same alias.
    #[error("duplicate sink alias: {0}")]
    DuplicateAlias(String),

    /// A sink declaration named a type this crate does not provide.
    #[error("unknown sink type: {0}")]
    UnknownSinkType(String),

    /// The `LogLevel` value is not a severity name.
    #[error("unknown log level: {0}")]
    UnknownLevel(String),

    /// The `TimeZone` value is not an IANA time-zone id.
    #[error("invalid time zone: {0}")]
    InvalidTimeZone(String),

    /// An option line referenced an alias that was never declared.
    #[error("option for undeclared sink alias: {0}")]
    UndeclaredAlias(String),

    /// A sink option had a value that could not be parsed.
    #[error("invalid value for {key}: {value}")]
    InvalidOption {
        /// The option key.
        key: &'static str,
        /// The rejected value.
        value: String,
    },

    /// `configure` was called a second time on the same sink.
    #[error("sink is already configured")]
    AlreadyConfigured,

    /// An I/O error occurred while preparing a sink.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_messages() {
        let err = ConfigError::MissingSetting("LogLevel");
        assert_eq!(err.to_string(), "missing required setting: LogLevel");

        let err = ConfigError::DuplicateAlias("file".to_string());
        assert_eq!(err.to_string(), "duplicate sink alias: file");

        let err = ConfigError::AlreadyConfigured;
        assert_eq!(err.to_string(), "sink is already configured");

        let err = ConfigError::MalformedLine {
            line: 3,
            text: "no equals here".to_string(),
        };
        assert_eq!(err.to_string(), "malformed line 3: no equals here");
    }

    #[test]
    fn error_io_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: ConfigError = io_err.into();
        assert!(err.to_string().contains("I/O error"));
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ConfigError>();
    }
}
