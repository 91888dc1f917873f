//! Game state model and the watcher that keeps it current

pub mod attribution;
pub mod logger;
pub mod signal;
pub mod snapshot;
pub mod stable;
pub mod state;
pub mod turn_owner;
pub mod watcher;

pub use attribution::{attribute_play, Attribution};
pub use logger::{LogEntry, OutputFormat, OutputMode, VerbosityLevel, WatchLogger};
pub use signal::{RawSignal, WatchEvent};
pub use snapshot::StateSnapshot;
pub use stable::{Clock, ManualClock, MonotonicClock, StableDecider, DEFAULT_DEBOUNCE};
pub use state::{GameState, OpenBlock, GAME_ENTITY_ID};
pub use turn_owner::{current_turn_owner, resolve};
pub use watcher::{LogWatcher, TickOutcome, WatchSubscriber};
