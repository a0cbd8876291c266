//! Size- and count-bounded rotating file output.
//!
//! This module provides:
//! - [`RollingFileSink`] — An asynchronous, single-writer rotating file sink
//!
//! The sink owns a ring of filename slots `{pid}-{base}-{index}{ext}` inside
//! a configured folder. All I/O happens on one dedicated writer thread per
//! sink instance, so payloads are written strictly in acceptance order and
//! never torn. Rotation recycles slots destructively: the file occupying the
//! next slot is deleted before the slot is reused. This bounds disk usage
//! deterministically at the cost of old content — a lossy ring of files, not
//! a retention system.

use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;

use fs2::FileExt;
use parking_lot::Mutex;

use super::{ConsoleSink, Delivery, Sink};
use crate::error::{ConfigError, Result};

/// Smallest accepted `maxFileSize`; lower values are clamped up.
const MIN_FILE_SIZE: u64 = 1024;
/// Default `maxFileSize` when the option is absent.
const DEFAULT_MAX_SIZE: u64 = 1_024_000;

/// A [`Sink`] that appends to a rotating set of files on disk.
///
/// `append` enqueues the payload and returns immediately; the return value
/// means "accepted for eventual write", not "already durable". The open file
/// handle and its exclusive advisory lock belong to the writer thread alone.
pub struct RollingFileSink {
    inner: Mutex<Inner>,
    fallback: Arc<dyn Sink>,
}

#[derive(Default)]
struct Inner {
    tx: Option<mpsc::Sender<Vec<u8>>>,
    worker: Option<thread::JoinHandle<()>>,
}

impl Default for RollingFileSink {
    fn default() -> Self {
        Self::new()
    }
}

impl RollingFileSink {
    /// Creates an unconfigured sink reporting its own failures to the
    /// console.
    #[must_use]
    pub fn new() -> Self {
        Self::with_fallback(Arc::new(ConsoleSink))
    }

    /// Creates an unconfigured sink reporting its own failures to the given
    /// fallback sink.
    #[must_use]
    pub fn with_fallback(fallback: Arc<dyn Sink>) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            fallback,
        }
    }
}

impl Sink for RollingFileSink {
    /// Parses the sink options and starts the writer thread. Allowed exactly
    /// once.
    ///
    /// Options: `fileName` (split at the last `.` into base and extension;
    /// defaults to base `log` with no extension), `maxFileSize` (bytes,
    /// clamped up to 1024), `maxFiles` (`<= 0` means unbounded), and
    /// `folderPath` (created if absent).
    ///
    /// # Errors
    ///
    /// Returns an error on a second call, an unparseable numeric option, or
    /// a folder that cannot be created.
    fn configure(&self, options: &HashMap<String, String>) -> Result<()> {
        let mut inner = self.inner.lock();
        if inner.tx.is_some() || inner.worker.is_some() {
            return Err(ConfigError::AlreadyConfigured);
        }

        let config = RollingConfig::parse(options)?;
        fs::create_dir_all(&config.dir)?;

        let (tx, rx) = mpsc::channel::<Vec<u8>>();
        let fallback = Arc::clone(&self.fallback);
        let name = format!("logfan-rolling-{}", config.base);
        let worker = thread::Builder::new()
            .name(name)
            .spawn(move || Writer::new(config, fallback).run(&rx))?;

        inner.tx = Some(tx);
        inner.worker = Some(worker);
        Ok(())
    }

    /// Enqueues one payload for the writer thread. Empty text is rejected
    /// without opening any file.
    fn append(&self, text: &str) -> Delivery {
        if text.is_empty() {
            return Delivery::Rejected;
        }

        let tx = match self.inner.lock().tx.as_ref() {
            Some(tx) => tx.clone(),
            None => return Delivery::Failed("sink is not accepting payloads".to_string()),
        };

        match tx.send(text.as_bytes().to_vec()) {
            Ok(()) => Delivery::Delivered,
            Err(_) => Delivery::Failed("writer thread is gone".to_string()),
        }
    }

    /// Stops accepting payloads, drains the queue best-effort, and releases
    /// the file handle and lock. Safe to call more than once.
    fn shutdown(&self) {
        let (tx, worker) = {
            let mut inner = self.inner.lock();
            (inner.tx.take(), inner.worker.take())
        };
        // Dropping the sender closes the queue; the writer drains what was
        // already accepted and then exits.
        drop(tx);
        if let Some(worker) = worker {
            if worker.join().is_err() {
                tracing::warn!("rolling file writer thread panicked during shutdown");
            }
        }
    }
}

impl Drop for RollingFileSink {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Parsed `configure` options.
struct RollingConfig {
    dir: PathBuf,
    base: String,
    ext: String,
    max_size: u64,
    max_files: i64,
}

impl RollingConfig {
    fn parse(options: &HashMap<String, String>) -> Result<Self> {
        let (base, ext) = split_file_name(options.get("fileName").map(String::as_str));

        let max_size = match options.get("maxFileSize") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidOption {
                    key: "maxFileSize",
                    value: raw.clone(),
                })?,
            None => DEFAULT_MAX_SIZE,
        }
        .max(MIN_FILE_SIZE);

        let max_files = match options.get("maxFiles") {
            Some(raw) => raw
                .trim()
                .parse::<i64>()
                .map_err(|_| ConfigError::InvalidOption {
                    key: "maxFiles",
                    value: raw.clone(),
                })?,
            None => -1,
        };

        let dir = PathBuf::from(options.get("folderPath").map_or(".", |raw| raw.trim()));

        Ok(Self {
            dir,
            base,
            ext,
            max_size,
            max_files,
        })
    }
}

/// Splits a file name at the last `.` into base and extension. The extension
/// keeps its dot; a bare trailing dot counts as no extension, and a blank
/// base falls back to `log`.
fn split_file_name(raw: Option<&str>) -> (String, String) {
    let raw = raw.map(str::trim).unwrap_or("");
    if raw.is_empty() {
        return ("log".to_string(), String::new());
    }

    match raw.rfind('.') {
        Some(pos) => {
            let base = raw[..pos].trim();
            let ext = raw[pos..].trim();
            let base = if base.is_empty() { "log" } else { base };
            let ext = if ext.len() <= 1 { "" } else { ext };
            (base.to_string(), ext.to_string())
        }
        None => (raw.to_string(), String::new()),
    }
}

/// The single-writer state machine. Lives entirely on the writer thread.
struct Writer {
    config: RollingConfig,
    fallback: Arc<dyn Sink>,
    pid: u32,
    index: u32,
    open: Option<OpenFile>,
}

struct OpenFile {
    file: File,
    size: u64,
}

impl Writer {
    fn new(config: RollingConfig, fallback: Arc<dyn Sink>) -> Self {
        Self {
            config,
            fallback,
            pid: std::process::id(),
            index: 0,
            open: None,
        }
    }

    fn run(mut self, rx: &mpsc::Receiver<Vec<u8>>) {
        // The iterator ends once the sender is dropped and the queue is
        // drained, which is exactly the shutdown contract.
        for payload in rx {
            self.write_payload(&payload);
        }
        self.close();
    }

    /// Processes one payload: open the current slot if needed, rotate while
    /// the payload does not fit, then append at end-of-file.
    fn write_payload(&mut self, payload: &[u8]) {
        loop {
            if self.open.is_none() {
                match self.open_slot() {
                    Ok(open) => self.open = Some(open),
                    Err(err) => {
                        self.report("open", &err);
                        return;
                    }
                }
            }

            let needs_rotation = self
                .open
                .as_ref()
                .is_some_and(|open| open.size > 0 && open.size + payload.len() as u64 > self.config.max_size);
            if needs_rotation {
                if let Err(err) = self.rotate() {
                    self.report("rotate", &err);
                    return;
                }
                continue;
            }

            let Some(open) = self.open.as_mut() else {
                return;
            };
            match open.file.write_all(payload) {
                Ok(()) => {
                    open.size += payload.len() as u64;
                    return;
                }
                Err(err) => {
                    self.close();
                    self.report("write", &err);
                    return;
                }
            }
        }
    }

    /// Opens the current slot create-if-absent and takes an exclusive
    /// advisory lock on it.
    fn open_slot(&self) -> io::Result<OpenFile> {
        let path = self.slot_path(self.index);
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        file.try_lock_exclusive()?;
        let size = file.metadata()?.len();
        Ok(OpenFile { file, size })
    }

    /// Advances to the next slot, wrapping only when the file count is
    /// bounded. Any file already occupying the new slot is deleted before
    /// the current one is closed — the ring recycles slots destructively.
    fn rotate(&mut self) -> io::Result<()> {
        let next = if self.config.max_files > 0 && i64::from(self.index) + 1 >= self.config.max_files
        {
            0
        } else {
            self.index + 1
        };

        let target = self.slot_path(next);
        if target.exists() {
            fs::remove_file(&target)?;
        }

        self.close();
        tracing::debug!(from = self.index, to = next, "rotated file slot");
        self.index = next;
        Ok(())
    }

    fn close(&mut self) {
        if let Some(open) = self.open.take() {
            let _ = open.file.unlock();
        }
    }

    fn slot_path(&self, index: u32) -> PathBuf {
        self.config.dir.join(format!(
            "{}-{}-{}{}",
            self.pid, self.config.base, index, self.config.ext
        ))
    }

    fn report(&self, stage: &str, err: &io::Error) {
        tracing::warn!(stage, error = %err, "rolling file sink dropped a payload");
        self.fallback
            .append(&format!("rolling file sink {stage} failed: {err}\n"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use test_case::test_case;

    /// Captures everything appended to it; used as a fallback under test.
    #[derive(Default)]
    struct RecordingSink {
        lines: Mutex<Vec<String>>,
    }

    impl RecordingSink {
        fn lines(&self) -> Vec<String> {
            self.lines.lock().clone()
        }
    }

    impl Sink for RecordingSink {
        fn append(&self, text: &str) -> Delivery {
            self.lines.lock().push(text.to_string());
            Delivery::Delivered
        }
    }

    fn options(entries: &[(&str, &str)]) -> HashMap<String, String> {
        entries
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    fn configured_sink(dir: &TempDir, extra: &[(&str, &str)]) -> RollingFileSink {
        let sink = RollingFileSink::new();
        let mut opts = vec![
            ("fileName", "app.log"),
            ("folderPath", dir.path().to_str().expect("utf-8 temp path")),
        ];
        opts.extend_from_slice(extra);
        sink.configure(&options(&opts)).expect("configure sink");
        sink
    }

    fn slot_files(dir: &TempDir) -> Vec<PathBuf> {
        let prefix = format!("{}-app-", std::process::id());
        let mut files: Vec<PathBuf> = fs::read_dir(dir.path())
            .expect("read temp dir")
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.file_name()
                    .is_some_and(|name| name.to_string_lossy().starts_with(&prefix))
            })
            .collect();
        files.sort();
        files
    }

    fn slot_content(dir: &TempDir, index: u32) -> String {
        let name = format!("{}-app-{}.log", std::process::id(), index);
        fs::read_to_string(dir.path().join(name)).expect("read slot file")
    }

    #[test_case(Some("app.log"), "app", ".log" ; "simple name")]
    #[test_case(Some("archive.tar.gz"), "archive.tar", ".gz" ; "splits at last dot")]
    #[test_case(Some("noext"), "noext", "" ; "no extension")]
    #[test_case(Some("weird."), "weird", "" ; "bare trailing dot")]
    #[test_case(Some(".hidden"), "log", ".hidden" ; "blank base falls back")]
    #[test_case(Some("  "), "log", "" ; "blank name falls back")]
    #[test_case(None, "log", "" ; "absent name falls back")]
    fn file_name_splitting(raw: Option<&str>, base: &str, ext: &str) {
        assert_eq!(split_file_name(raw), (base.to_string(), ext.to_string()));
    }

    #[test]
    fn size_floor_is_clamped() {
        let config = RollingConfig::parse(&options(&[("maxFileSize", "10")])).expect("parse");
        assert_eq!(config.max_size, 1024);
    }

    #[test]
    fn unparseable_size_is_a_config_error() {
        let result = RollingConfig::parse(&options(&[("maxFileSize", "lots")]));
        assert!(matches!(
            result,
            Err(ConfigError::InvalidOption { key: "maxFileSize", .. })
        ));
    }

    #[test]
    fn unparseable_max_files_is_a_config_error() {
        let result = RollingConfig::parse(&options(&[("maxFiles", "many")]));
        assert!(matches!(
            result,
            Err(ConfigError::InvalidOption { key: "maxFiles", .. })
        ));
    }

    #[test]
    fn configure_twice_is_an_error() {
        let dir = TempDir::new().expect("temp dir");
        let sink = configured_sink(&dir, &[]);
        let result = sink.configure(&options(&[(
            "folderPath",
            dir.path().to_str().expect("utf-8 temp path"),
        )]));
        assert!(matches!(result, Err(ConfigError::AlreadyConfigured)));
    }

    #[test]
    fn append_before_configure_fails() {
        let sink = RollingFileSink::new();
        assert!(sink.append("line\n").is_failed());
    }

    #[test]
    fn empty_append_opens_no_file() {
        let dir = TempDir::new().expect("temp dir");
        let sink = configured_sink(&dir, &[]);
        assert_eq!(sink.append(""), Delivery::Rejected);
        sink.shutdown();
        assert!(slot_files(&dir).is_empty());
    }

    #[test]
    fn appends_land_in_slot_zero() {
        let dir = TempDir::new().expect("temp dir");
        let sink = configured_sink(&dir, &[]);
        assert_eq!(sink.append("first\n"), Delivery::Delivered);
        assert_eq!(sink.append("second\n"), Delivery::Delivered);
        sink.shutdown();

        assert_eq!(slot_files(&dir).len(), 1);
        assert_eq!(slot_content(&dir, 0), "first\nsecond\n");
    }

    #[test]
    fn rotation_boundary_is_exact() {
        let dir = TempDir::new().expect("temp dir");
        let sink = configured_sink(&dir, &[("maxFileSize", "1024")]);

        assert!(sink.append(&"x".repeat(1024)).is_delivered());
        assert!(sink.append("y").is_delivered());
        sink.shutdown();

        // Exactly one rotation: the 1025th byte lands in slot 1.
        let files = slot_files(&dir);
        assert_eq!(files.len(), 2);
        assert_eq!(slot_content(&dir, 0).len(), 1024);
        assert_eq!(slot_content(&dir, 1), "y");
    }

    #[test]
    fn oversized_payload_fills_a_fresh_slot() {
        let dir = TempDir::new().expect("temp dir");
        let sink = configured_sink(&dir, &[("maxFileSize", "1024")]);

        assert!(sink.append(&"a".repeat(2000)).is_delivered());
        assert!(sink.append(&"b".repeat(2000)).is_delivered());
        sink.shutdown();

        // A payload larger than the limit is written whole into an empty
        // slot; the next payload rotates.
        assert_eq!(slot_content(&dir, 0).len(), 2000);
        assert_eq!(slot_content(&dir, 1).len(), 2000);
    }

    #[test]
    fn ring_wraps_and_recycles_slot_zero() {
        let dir = TempDir::new().expect("temp dir");
        let sink = configured_sink(&dir, &[("maxFileSize", "1024"), ("maxFiles", "3")]);

        for fill in ["a", "b", "c", "d"] {
            assert!(sink.append(&fill.repeat(1024)).is_delivered());
        }
        sink.shutdown();

        // Slots 0, 1, 2 filled, then the wrap deleted old slot 0 before
        // writing the fourth payload into it.
        assert_eq!(slot_files(&dir).len(), 3);
        assert_eq!(slot_content(&dir, 0), "d".repeat(1024));
        assert_eq!(slot_content(&dir, 1), "b".repeat(1024));
        assert_eq!(slot_content(&dir, 2), "c".repeat(1024));
    }

    #[test]
    fn bounded_ring_never_exceeds_file_count() {
        let dir = TempDir::new().expect("temp dir");
        let sink = configured_sink(&dir, &[("maxFileSize", "1024"), ("maxFiles", "2")]);

        // 3000 bytes in 300-byte payloads across a two-slot ring.
        for _ in 0..10 {
            assert!(sink.append(&"z".repeat(300)).is_delivered());
        }
        sink.shutdown();

        assert!(slot_files(&dir).len() <= 2);
    }

    #[test]
    fn unbounded_ring_keeps_every_slot() {
        let dir = TempDir::new().expect("temp dir");
        let sink = configured_sink(&dir, &[("maxFileSize", "1024")]);

        for fill in ["a", "b", "c", "d"] {
            assert!(sink.append(&fill.repeat(1024)).is_delivered());
        }
        sink.shutdown();

        // maxFiles is absent, so the index only increases.
        assert_eq!(slot_files(&dir).len(), 4);
    }

    #[test]
    fn open_failure_reaches_the_fallback() {
        let dir = TempDir::new().expect("temp dir");
        let fallback = Arc::new(RecordingSink::default());
        let sink = RollingFileSink::with_fallback(Arc::clone(&fallback) as Arc<dyn Sink>);

        let missing = dir.path().join("gone");
        fs::create_dir_all(&missing).expect("create dir");
        sink.configure(&options(&[(
            "folderPath",
            missing.to_str().expect("utf-8 temp path"),
        )]))
        .expect("configure sink");
        fs::remove_dir_all(&missing).expect("remove dir");

        // Accepted for eventual write, but the writer cannot open the slot.
        assert!(sink.append("doomed\n").is_delivered());
        sink.shutdown();

        let lines = fallback.lines();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("open failed"), "{}", lines[0]);
    }

    #[test]
    fn shutdown_drains_and_is_idempotent() {
        let dir = TempDir::new().expect("temp dir");
        let sink = configured_sink(&dir, &[]);
        for i in 0..100 {
            assert!(sink.append(&format!("line {i}\n")).is_delivered());
        }
        sink.shutdown();
        sink.shutdown();

        assert_eq!(slot_content(&dir, 0).lines().count(), 100);
        assert!(sink.append("late\n").is_failed());
    }
}
