//! Mirror tracing events into a diagnostic log.
//!
//! A small tracing [`Layer`] that writes every event it sees as one rendered
//! line (see [`crate::fmt`]) into an installed writer, typically a file. The
//! engine's per-edge records land here when the edge log is enabled, giving a
//! persistent trace of everything the engine sent.
//!
//! Usage:
//! - Install the [`layer`] in your tracing subscriber.
//! - Call [`set_file`] (or [`set_writer`]) to start writing.
//! - Call [`clear_sink`] to stop; the writer is flushed and dropped.
//!
//! The layer no-ops when no sink is set.

use std::{
    fs::OpenOptions,
    io::{self, Write},
    path::Path,
    sync::{
        OnceLock,
        atomic::{AtomicU64, Ordering},
    },
};

use parking_lot::Mutex;
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer};

use crate::fmt;

/// Boxed destination for rendered lines.
type Sink = Box<dyn Write + Send>;

/// The global sink; `None` disables the layer.
static DIAG_SINK: OnceLock<Mutex<Option<Sink>>> = OnceLock::new();

/// Count of events lost to write failures.
static DIAG_DROPS: OnceLock<AtomicU64> = OnceLock::new();

/// Access the global sink.
fn sink() -> &'static Mutex<Option<Sink>> {
    DIAG_SINK.get_or_init(|| Mutex::new(None))
}

/// Write rendered events to `w` from now on, replacing any previous sink.
pub fn set_writer(w: impl Write + Send + 'static) {
    let mut guard = sink().lock();
    if let Some(mut old) = guard.replace(Box::new(w)) {
        let _ignored = old.flush();
    }
}

/// Append rendered events to the file at `path`, creating it if needed.
pub fn set_file(path: &Path) -> io::Result<()> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    set_writer(io::LineWriter::new(file));
    Ok(())
}

/// Stop writing; flushes and drops the current sink.
pub fn clear_sink() {
    if let Some(mut w) = sink().lock().take() {
        let _ignored = w.flush();
    }
}

/// Number of events dropped because the sink failed.
pub fn dropped() -> u64 {
    DIAG_DROPS.get().map_or(0, |c| c.load(Ordering::SeqCst))
}

/// Tracing layer that writes events to the diagnostic sink when one is set.
pub struct DiagLayer;

impl<S> Layer<S> for DiagLayer
where
    S: Subscriber,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut guard = sink().lock();
        let Some(w) = guard.as_mut() else { return };

        let line = fmt::render_event(event);
        if writeln!(w, "{line}").is_err() {
            // A broken sink stays broken; drop it to avoid repeated work.
            *guard = None;
            let ctr = DIAG_DROPS.get_or_init(|| AtomicU64::new(0));
            ctr.fetch_add(1, Ordering::SeqCst);
        }
    }
}

/// Create the diagnostic layer instance to add to your subscriber.
pub fn layer() -> DiagLayer {
    DiagLayer
}
