//! Rendering of log records into canonical text.
//!
//! This module provides:
//! - [`RecordFormatter`] — Time-zone-aware rendering of [`LogRecord`]s

use chrono_tz::Tz;

use crate::record::{Attachment, LogRecord};

/// Renders records into the canonical line format.
///
/// One text block per record:
/// `[dd-MM-yyyy][HH:mm:ss][LEVEL][thread][file][method:line] message\n`,
/// followed by the rendering of the attached value when one is present.
#[derive(Debug, Clone, Copy)]
pub struct RecordFormatter {
    tz: Tz,
}

impl RecordFormatter {
    /// Creates a formatter rendering timestamps in the given zone.
    #[must_use]
    pub const fn new(tz: Tz) -> Self {
        Self { tz }
    }

    /// The zone timestamps are rendered in.
    #[must_use]
    pub const fn timezone(&self) -> Tz {
        self.tz
    }

    /// Renders one record. Severity labels are padded to width 5 so columns
    /// align visually.
    #[must_use]
    pub fn format(&self, record: &LogRecord) -> String {
        let local = record.timestamp.with_timezone(&self.tz);
        let mut text = format!(
            "[{}][{}][{}][{}][{}][{}:{}] {}\n",
            local.format("%d-%m-%Y"),
            local.format("%H:%M:%S"),
            record.severity.label(),
            record.thread,
            record.site.file,
            record.site.method,
            record.site.line,
            record.message,
        );
        if let Some(attachment) = &record.attachment {
            render_attachment(attachment, &mut text);
        }
        text
    }
}

/// The two-branch attachment rule: errors render as type, message, and one
/// prefixed line per frame; everything else renders as its string form.
fn render_attachment(attachment: &Attachment, out: &mut String) {
    match attachment {
        Attachment::Null => out.push_str("null\n"),
        Attachment::Value(value) => {
            out.push_str(value);
            out.push('\n');
        }
        Attachment::Error(info) => {
            out.push_str(&info.kind);
            if let Some(message) = &info.message {
                out.push_str(": ");
                out.push_str(message);
            }
            out.push('\n');
            for frame in &info.frames {
                out.push_str("\tat ");
                out.push_str(frame);
                out.push('\n');
            }
        }
    }
}
