//! Replay a timestamped edge script through an engine.
//!
//! Script lines are `<ms> <op> [arg]`, where `<ms>` is the offset from the
//! start of the replay and must not go backwards:
//!
//! ```text
//! # tap capslock, then hold it
//! 0    down capslock
//! 80   up   capslock
//! 400  down capslock
//! 900  up   capslock
//! 950  focus game
//! 1000 focus-fail
//! ```
//!
//! Input keys are reported physically down between their `down` and `up`
//! lines. Every edge the engine sends is printed with its offset.

use std::{
    fs,
    io::{self, Write},
    sync::Arc,
    time::Duration,
};

use keyfx_engine::{
    Edge, Emitter, Engine, InputEdge, Key,
    sim::{SimPhysical, SimWindow},
};
use parking_lot::Mutex;
use tokio::{
    runtime::Builder,
    time::{self, Instant},
};
use tracing::{debug, info};

use crate::{
    cli::ReplayArgs,
    error::{Error, Result},
};

/// Window reported as foreground until the script says otherwise.
const INITIAL_WINDOW: &str = "main";

/// One scripted operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    /// Input edge for a bound key.
    Edge(Key, InputEdge),
    /// Foreground window change.
    Focus(String),
    /// Foreground window lookups start failing.
    FocusFail,
}

/// An operation and when it happens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    /// Offset from the start of the replay.
    pub at: Duration,
    /// What happens.
    pub op: Op,
}

/// Parse a script. Blank lines and `#` comments are skipped.
pub fn parse_script(text: &str) -> Result<Vec<Step>> {
    let mut steps = Vec::new();
    let mut last = Duration::ZERO;
    for (idx, raw) in text.lines().enumerate() {
        let line = idx + 1;
        let body = raw.split('#').next().unwrap_or("").trim();
        if body.is_empty() {
            continue;
        }
        let mut parts = body.split_whitespace();
        let at = parts
            .next()
            .and_then(|t| t.parse::<u64>().ok())
            .map(Duration::from_millis)
            .ok_or_else(|| Error::script(line, "expected a millisecond offset"))?;
        if at < last {
            return Err(Error::script(line, "offset goes backwards"));
        }
        last = at;

        let op = match (parts.next(), parts.next()) {
            (Some("down"), Some(k)) => Op::Edge(Key::new(k), InputEdge::Down),
            (Some("up"), Some(k)) => Op::Edge(Key::new(k), InputEdge::Up),
            (Some("focus"), Some(w)) => Op::Focus(w.to_string()),
            (Some("focus-fail"), None) => Op::FocusFail,
            (Some(op), _) => {
                return Err(Error::script(line, format!("bad operation '{op}'")));
            }
            (None, _) => return Err(Error::script(line, "missing operation")),
        };
        if parts.next().is_some() {
            return Err(Error::script(line, "trailing input"));
        }
        steps.push(Step { at, op });
    }
    Ok(steps)
}

/// Emitter printing `offset edge key` lines.
pub struct Printer<W> {
    /// Replay start; offsets are measured from here.
    start: Instant,
    /// Output.
    out: Mutex<W>,
}

impl<W: Write + Send> Printer<W> {
    /// Print to `out`, measuring offsets from now.
    pub fn new(out: W) -> Self {
        Self {
            start: Instant::now(),
            out: Mutex::new(out),
        }
    }
}

impl<W: Write + Send> Emitter for Printer<W> {
    fn emit(&self, key: &Key, edge: Edge) {
        let ms = self.start.elapsed().as_millis();
        // Output failures are not observable at the emitter boundary.
        let _ignored = writeln!(self.out.lock(), "{ms:>6} {edge:<7} {key}");
    }
}

/// Feed `steps` to `engine`, then let timers settle for `settle`.
///
/// Each edge is awaited before the next is delivered; a handler that runs
/// past the next step's offset delays it.
pub async fn drive(
    engine: &Engine,
    steps: &[Step],
    physical: &SimPhysical,
    window: &SimWindow,
    settle: Duration,
) {
    let start = Instant::now();
    for step in steps {
        time::sleep_until(start + step.at).await;
        match &step.op {
            Op::Edge(key, edge) => {
                physical.set_down(key, *edge == InputEdge::Down);
                let handled = engine.dispatch(key, *edge).await;
                debug!(%key, ?edge, ?handled, "replay_edge");
            }
            Op::Focus(w) => window.focus(w),
            Op::FocusFail => window.fail(),
        }
    }
    time::sleep(settle).await;
    engine.shutdown().await;
}

/// Run the `replay` subcommand.
pub fn run(args: &ReplayArgs) -> Result<()> {
    if let Some(path) = &args.diag_log {
        logging::diag::set_file(path)?;
    }
    let config = keyfx_config::load_from_path(&args.config)?;
    let steps = parse_script(&fs::read_to_string(&args.script)?)?;
    info!(steps = steps.len(), realtime = args.realtime, "replay_start");

    let rt = Builder::new_current_thread()
        .enable_time()
        .start_paused(!args.realtime)
        .build()?;
    let result = rt.block_on(async {
        let physical = Arc::new(SimPhysical::new());
        let window = Arc::new(SimWindow::new(INITIAL_WINDOW));
        let engine = Engine::from_config(
            &config,
            Arc::new(Printer::new(io::stdout())),
            physical.clone(),
            window.clone(),
        )?;
        drive(
            &engine,
            &steps,
            &physical,
            &window,
            Duration::from_millis(args.settle_ms),
        )
        .await;
        Ok::<(), Error>(())
    });
    logging::diag::clear_sink();
    result
}
