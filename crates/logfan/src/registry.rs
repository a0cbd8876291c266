//! The registry of named sink groups.
//!
//! This module provides:
//! - [`Registry`] — Constructs sinks from validated settings and hands out
//!   named [`SinkGroup`]s sharing them
//!
//! The registry is an explicit object passed to whoever needs it; there is
//! no process-wide static. Tests construct fresh registries.

use std::collections::HashMap;
use std::sync::Arc;

use chrono_tz::Tz;
use parking_lot::RwLock;

use crate::config::{Settings, SinkKind};
use crate::error::Result;
use crate::group::SinkGroup;
use crate::level::Severity;
use crate::sink::{ConsoleSink, NullSink, RollingFileSink, Sink};

struct RegisteredSink {
    alias: String,
    sink: Arc<dyn Sink>,
}

/// Owns the configured sinks and the named groups fanning out to them.
///
/// Built once from a validated [`Settings`]; sink construction and
/// configuration failures abort here, before any sink is used. Every group
/// shares the full sink set, threshold, and time zone.
pub struct Registry {
    level: Severity,
    timezone: Tz,
    sinks: Vec<RegisteredSink>,
    fallback: Arc<dyn Sink>,
    groups: RwLock<HashMap<String, Arc<SinkGroup>>>,
}

impl Registry {
    /// Constructs and configures every declared sink.
    ///
    /// # Errors
    ///
    /// Returns the first sink configuration error encountered.
    pub fn from_settings(settings: Settings) -> Result<Self> {
        Self::build(settings, Arc::new(ConsoleSink))
    }

    /// Like [`Registry::from_settings`], with an explicit fallback sink for
    /// the groups' internal reporting.
    ///
    /// # Errors
    ///
    /// Returns the first sink configuration error encountered.
    pub fn with_fallback(settings: Settings, fallback: Arc<dyn Sink>) -> Result<Self> {
        Self::build(settings, fallback)
    }

    /// Parses configuration text and builds the registry from it.
    ///
    /// # Errors
    ///
    /// Returns any parse or sink configuration error.
    pub fn from_config_text(text: &str) -> Result<Self> {
        Self::from_settings(Settings::parse(text)?)
    }

    fn build(settings: Settings, fallback: Arc<dyn Sink>) -> Result<Self> {
        let mut sinks = Vec::with_capacity(settings.sinks.len());
        for spec in settings.sinks {
            let sink: Arc<dyn Sink> = match spec.kind {
                SinkKind::Console => Arc::new(ConsoleSink),
                SinkKind::Null => Arc::new(NullSink),
                SinkKind::RollingFile => {
                    Arc::new(RollingFileSink::with_fallback(Arc::clone(&fallback)))
                }
            };
            sink.configure(&spec.options)?;
            tracing::debug!(alias = %spec.alias, "configured sink");
            sinks.push(RegisteredSink {
                alias: spec.alias,
                sink,
            });
        }

        Ok(Self {
            level: settings.level,
            timezone: settings.timezone,
            sinks,
            fallback,
            groups: RwLock::new(HashMap::new()),
        })
    }

    /// The severity threshold every group is built with.
    #[must_use]
    pub const fn level(&self) -> Severity {
        self.level
    }

    /// The time zone every group renders in.
    #[must_use]
    pub const fn timezone(&self) -> Tz {
        self.timezone
    }

    /// Looks up a configured sink by its alias.
    #[must_use]
    pub fn sink(&self, alias: &str) -> Option<Arc<dyn Sink>> {
        self.sinks
            .iter()
            .find(|registered| registered.alias == alias)
            .map(|registered| Arc::clone(&registered.sink))
    }

    /// Returns the group with the given name, creating it on first use with
    /// the full configured sink set attached.
    pub fn group(&self, name: &str) -> Arc<SinkGroup> {
        if let Some(group) = self.groups.read().get(name) {
            return Arc::clone(group);
        }

        let mut groups = self.groups.write();
        let group = groups.entry(name.to_string()).or_insert_with(|| {
            tracing::debug!(group = name, "created sink group");
            let group =
                SinkGroup::with_fallback(self.level, self.timezone, Arc::clone(&self.fallback));
            for registered in &self.sinks {
                group.add_sink(Arc::clone(&registered.sink));
            }
            Arc::new(group)
        });
        Arc::clone(group)
    }

    /// Shuts down every configured sink exactly once, then the fallback.
    /// Groups share the sinks, so this is the only shutdown needed.
    pub fn shutdown(&self) {
        for registered in &self.sinks {
            registered.sink.shutdown();
        }
        self.fallback.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::site;
    use std::fs;
    use tempfile::TempDir;

    fn minimal_text() -> &'static str {
        "LogLevel=INFO\nTimeZone=UTC\nquiet=null\n"
    }

    #[test]
    fn builds_from_config_text() {
        let registry = Registry::from_config_text(minimal_text()).expect("build registry");
        assert_eq!(registry.level(), Severity::Info);
        assert_eq!(registry.timezone(), chrono_tz::UTC);
        assert!(registry.sink("quiet").is_some());
        assert!(registry.sink("ghost").is_none());
    }

    #[test]
    fn parse_errors_surface_before_any_sink_exists() {
        assert!(Registry::from_config_text("LogLevel=INFO\n").is_err());
    }

    #[test]
    fn groups_are_cached_by_name() {
        let registry = Registry::from_config_text(minimal_text()).expect("build registry");
        let first = registry.group("server");
        let second = registry.group("server");
        let other = registry.group("client");

        assert!(Arc::ptr_eq(&first, &second));
        assert!(!Arc::ptr_eq(&first, &other));
    }

    #[test]
    fn groups_share_the_configured_sinks() {
        let registry = Registry::from_config_text(minimal_text()).expect("build registry");
        assert_eq!(registry.group("a").sink_count(), 1);
        assert_eq!(registry.group("b").sink_count(), 1);
    }

    #[test]
    fn invalid_rolling_option_aborts_the_build() {
        let result = Registry::from_config_text(
            "LogLevel=INFO\n\
             TimeZone=UTC\n\
             file=rolling_file\n\
             file.maxFileSize=huge\n",
        );
        assert!(result.is_err());
    }

    #[test]
    fn end_to_end_rolling_sink_writes_records() {
        let dir = TempDir::new().expect("temp dir");
        let text = format!(
            "LogLevel=INFO\n\
             TimeZone=UTC\n\
             file=logfan::sink::RollingFileSink\n\
             file.fileName=app.log\n\
             file.folderPath={}\n",
            dir.path().to_str().expect("utf-8 temp path")
        );
        let registry = Registry::from_config_text(&text).expect("build registry");

        let logger = registry.group("server").logger("startup");
        assert!(!logger.debug(site!(), "gated out").emitted);
        assert_eq!(logger.info(site!(), "listening").delivered_count(), 1);
        registry.shutdown();

        let name = format!("{}-app-0.log", std::process::id());
        let written = fs::read_to_string(dir.path().join(name)).expect("read log file");
        assert!(written.contains("INFO"), "{written}");
        assert!(written.ends_with("listening\n"), "{written}");
        assert!(!written.contains("gated out"), "{written}");
    }
}
