//! hswatch - replay or follow a raw-signal trace through the log watcher
//!
//! Prints one JSON `StateSnapshot` per stable-state notification.

use anyhow::Context;
use clap::{Parser, Subcommand};
use hs_log_watcher::{
    game::{
        GameState, LogWatcher, OutputFormat, StateSnapshot, TickOutcome, VerbosityLevel, WatchEvent,
        WatchSubscriber,
    },
    reader::TraceReader,
    NotifyMode, WatchConfig,
};
use std::path::{Path, PathBuf};

/// Verbosity level for watcher output (custom parser supporting both names and numbers)
#[derive(Debug, Clone, Copy)]
struct VerbosityArg(VerbosityLevel);

impl std::str::FromStr for VerbosityArg {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "silent" | "0" => Ok(VerbosityArg(VerbosityLevel::Silent)),
            "minimal" | "1" => Ok(VerbosityArg(VerbosityLevel::Minimal)),
            "normal" | "2" => Ok(VerbosityArg(VerbosityLevel::Normal)),
            "verbose" | "3" => Ok(VerbosityArg(VerbosityLevel::Verbose)),
            _ => Err(format!(
                "invalid verbosity level '{s}' (expected: silent/0, minimal/1, normal/2, verbose/3)"
            )),
        }
    }
}

impl From<VerbosityArg> for VerbosityLevel {
    fn from(arg: VerbosityArg) -> Self {
        arg.0
    }
}

/// Format of the watcher's log lines
#[derive(Debug, Clone, Copy)]
struct LogFormatArg(OutputFormat);

impl std::str::FromStr for LogFormatArg {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(LogFormatArg(OutputFormat::Text)),
            "json" => Ok(LogFormatArg(OutputFormat::Json)),
            _ => Err(format!("invalid log format '{s}' (expected: text, json)")),
        }
    }
}

#[derive(Parser)]
#[command(name = "hswatch")]
#[command(about = "Debounced game-state notifications from a game log signal trace", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Tick a watcher over a JSON-lines signal trace
    Replay {
        /// Trace file, one raw signal per line
        #[arg(value_name = "TRACE")]
        trace: PathBuf,

        /// JSON config file (fields not given keep their defaults)
        #[arg(long, value_name = "CONFIG_FILE")]
        config: Option<PathBuf>,

        /// Quiet period in milliseconds before the state counts as stable
        #[arg(long)]
        debounce_ms: Option<u64>,

        /// Polling interval in milliseconds
        #[arg(long)]
        tick_ms: Option<u64>,

        /// Notify once per settle instead of on every stable tick
        #[arg(long)]
        edge: bool,

        /// Keep tailing the trace until interrupted
        #[arg(long)]
        follow: bool,

        /// Stop after this many ticks
        #[arg(long)]
        max_ticks: Option<u64>,

        /// Verbosity level (0=silent, 1=minimal, 2=normal, 3=verbose)
        #[arg(long, short = 'v')]
        verbosity: Option<VerbosityArg>,

        /// Format of the watcher's own log lines (text, json)
        #[arg(long, value_name = "FORMAT")]
        log_format: Option<LogFormatArg>,
    },
}

/// Prints snapshots as JSON lines and events as text
struct PrintSubscriber {
    verbosity: VerbosityLevel,
}

impl WatchSubscriber for PrintSubscriber {
    fn on_state_changed(&mut self, game: &GameState) {
        match StateSnapshot::capture(game).to_json() {
            Ok(line) => println!("{}", line),
            Err(err) => eprintln!("warning: cannot serialize snapshot: {}", err),
        }
    }

    fn on_event(&mut self, event: &WatchEvent, _game: &GameState) {
        if self.verbosity < VerbosityLevel::Normal {
            return;
        }
        match event {
            WatchEvent::BlockStart { .. } | WatchEvent::BlockEnd { .. } => {
                if self.verbosity >= VerbosityLevel::Verbose {
                    println!("  event: {:?}", event);
                }
            }
            _ => println!("  event: {:?}", event),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Replay {
            trace,
            config,
            debounce_ms,
            tick_ms,
            edge,
            follow,
            max_ticks,
            verbosity,
            log_format,
        } => {
            let mut config = match config {
                Some(path) => WatchConfig::from_json_file(&path)
                    .with_context(|| format!("loading config {}", path.display()))?,
                None => WatchConfig::default(),
            };
            if let Some(ms) = debounce_ms {
                config.debounce_ms = ms;
            }
            if let Some(ms) = tick_ms {
                config.tick_interval_ms = ms;
            }
            if edge {
                config.notify = NotifyMode::Edge;
            }
            if let Some(v) = verbosity {
                config.verbosity = v.into();
            }
            if let Some(LogFormatArg(format)) = log_format {
                config.log_format = format;
            }
            config.validate().context("invalid options")?;

            run_replay(&trace, config, follow, max_ticks).await
        }
    }
}

async fn run_replay(trace: &Path, config: WatchConfig, follow: bool, max_ticks: Option<u64>) -> anyhow::Result<()> {
    let verbosity = config.verbosity;
    let tick_interval = config.tick_interval();

    let mut watcher = LogWatcher::new(|path: &Path| TraceReader::open(path), config);
    watcher.subscribe(Box::new(PrintSubscriber { verbosity }));
    watcher
        .reset(trace)
        .with_context(|| format!("attaching to {}", trace.display()))?;

    let mut interval = tokio::time::interval(tick_interval);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    let mut ticks: u64 = 0;

    loop {
        tokio::select! {
            _ = interval.tick() => {}
            _ = tokio::signal::ctrl_c() => break,
        }

        let outcome = watcher.tick();
        ticks += 1;

        if max_ticks.is_some_and(|max| ticks >= max) {
            break;
        }
        // Without --follow the whole trace is consumed by the first tick, so
        // the first notification is the settled final state.
        if !follow && matches!(outcome, TickOutcome::Notified | TickOutcome::Stable) {
            break;
        }
    }

    Ok(())
}
