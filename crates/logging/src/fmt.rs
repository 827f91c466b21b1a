//! Render `tracing` events into concise single-line records.
//!
//! Events in this workspace name themselves with a short `snake_case`
//! message and carry their details as fields, so a rendered record keeps
//! both: `debounce_ignored key="lbutton" ignored=3`.

use std::fmt::{Debug, Display, Formatter, Result as FmtResult, Write};

use tracing::{
    Event, Metadata,
    field::{Field, Visit},
};

/// Rendered fields extracted from a tracing Event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedLog {
    /// Severity level (e.g., INFO, WARN) for the event.
    pub level: String,
    /// Event target (typically the module path).
    pub target: String,
    /// Message followed by the remaining fields as `key=value` pairs.
    pub message: String,
}

impl Display for RenderedLog {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{:<5} {} {}", self.level, self.target, self.message)
    }
}

/// Collects the message and the other fields of one event.
#[derive(Default)]
struct MsgVisitor {
    /// Captured `message` field, if present.
    msg: Option<String>,
    /// Accumulated non-message fields rendered as `key=value`.
    fields: String,
}

impl MsgVisitor {
    /// Append one `key=value` pair.
    fn push(&mut self, field: &Field, value: impl Display) {
        if !self.fields.is_empty() {
            self.fields.push(' ');
        }
        let _ignored = write!(&mut self.fields, "{}={}", field.name(), value);
    }
}

impl Visit for MsgVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.msg = Some(value.to_string());
        } else {
            self.push(field, format_args!("{value:?}"));
        }
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.push(field, value);
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.push(field, value);
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.push(field, value);
    }

    fn record_debug(&mut self, field: &Field, value: &dyn Debug) {
        if field.name() == "message" {
            self.msg = Some(format!("{:?}", value));
        } else {
            self.push(field, format_args!("{value:?}"));
        }
    }
}

/// Extract level, target, and a one-line message from a tracing Event.
///
/// The message field comes first when present, followed by every other field
/// in declaration order.
pub fn render_event(event: &Event<'_>) -> RenderedLog {
    let meta: &Metadata<'_> = event.metadata();
    let mut vis = MsgVisitor::default();
    event.record(&mut vis);
    let message = match (vis.msg, vis.fields.is_empty()) {
        (Some(m), true) => m,
        (Some(m), false) => format!("{m} {}", vis.fields),
        (None, _) => vis.fields,
    };
    RenderedLog {
        level: meta.level().to_string(),
        target: meta.target().to_string(),
        message,
    }
}
