//! Session coordinator: drives the log reader and republishes game events
//!
//! ```text
//! tick()
//!   │  (dropped if another tick is in progress)
//!   ▼
//! LogReader::process ──► RawSignal ──► Dispatcher::dispatch
//!                                        ├─► StableDecider::notify_changed
//!                                        ├─► GameState mutation
//!                                        ├─► attribute_play (PLAY block end)
//!                                        └─► WatchSubscriber::on_event
//!   │
//!   ▼  if StableDecider::is_stable
//! WatchSubscriber::on_state_changed(&GameState)
//! ```
//!
//! Everything runs synchronously inside `tick`. The only guard is an atomic
//! flag: a tick that finds another tick in progress (nested from a callback,
//! or from a second thread) returns immediately without touching state.

use crate::config::{NotifyMode, WatchConfig};
use crate::core::{BlockType, EntityId};
use crate::game::attribution::{attribute_play, Attribution};
use crate::game::stable::{Clock, MonotonicClock, StableDecider};
use crate::game::{GameState, RawSignal, VerbosityLevel, WatchEvent, WatchLogger};
use crate::reader::{LogReader, ReaderFactory};
use crate::Result;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Consumer of watcher notifications
///
/// The game state is only lent for the duration of each call.
pub trait WatchSubscriber: Send {
    /// Called on stable ticks with the settled game state
    fn on_state_changed(&mut self, game: &GameState);

    /// Called for each republished event, after the state reflects it
    fn on_event(&mut self, _event: &WatchEvent, _game: &GameState) {}
}

/// What a call to [`LogWatcher::tick`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Another tick was in progress; this one did nothing
    Reentrant,
    /// `reset` has not succeeded yet
    NoSession,
    /// Signals arrived recently; no notification
    Settling,
    /// Stable, but already notified since the last change (edge mode)
    Stable,
    /// Subscribers were handed the stable state
    Notified,
}

struct Session<R> {
    target: PathBuf,
    game: GameState,
    decider: StableDecider,
    reader: R,
    /// Set once subscribers saw the state; cleared by every signal
    notified: bool,
}

struct Inner<R> {
    session: Option<Session<R>>,
    subscribers: Vec<Box<dyn WatchSubscriber>>,
    logger: WatchLogger,
    /// Dropped-tick count already reported in the log
    dropped_logged: u64,
}

/// Clears the tick flag when the tick ends, including by panic
struct TickGuard<'a>(&'a AtomicBool);

impl Drop for TickGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Applies raw signals in a fixed order: decider, state, then republish
struct Dispatcher<'a> {
    game: &'a mut GameState,
    decider: &'a StableDecider,
    notified: &'a mut bool,
    subscribers: &'a mut [Box<dyn WatchSubscriber>],
    logger: &'a WatchLogger,
}

impl Dispatcher<'_> {
    fn dispatch(&mut self, signal: RawSignal) {
        self.decider.notify_changed();
        *self.notified = false;

        if self.logger.verbosity() >= VerbosityLevel::Verbose || self.logger.is_capturing() {
            self.logger
                .log(VerbosityLevel::Verbose, Some("signal"), &format!("signal {:?}", signal));
        }

        match signal {
            RawSignal::LogChanged => {}
            RawSignal::BlockStart { entity_id, block_type } => {
                self.game.notify_block_started(entity_id, block_type);
                self.emit(WatchEvent::BlockStart { entity_id, block_type });
            }
            RawSignal::BlockEnd { entity_id, block_type } => {
                self.close_block(entity_id, block_type);
                if block_type == BlockType::Play {
                    self.attribute(entity_id);
                }
                self.emit(WatchEvent::BlockEnd { entity_id, block_type });
            }
            RawSignal::TagChanged {
                entity_id,
                tag,
                value,
                prev,
            } => {
                if let Some(turn) = self.game.notify_entity_tag_changed(entity_id, tag, value, prev) {
                    self.logger
                        .log(VerbosityLevel::Normal, Some("turn"), &format!("turn {} ended", turn));
                    self.emit(WatchEvent::EndTurn { turn });
                }
            }
            RawSignal::CreateGame => {
                // Auto-restarted games keep the player/opponent assignment
                self.game.soft_reset();
                self.logger
                    .log(VerbosityLevel::Normal, Some("session"), "game created; per-game state cleared");
                self.emit(WatchEvent::CreateGame);
            }
            RawSignal::FullEntity {
                entity_id,
                card_id,
                tags,
            } => {
                self.game.upsert_entity(entity_id, &card_id, &tags);
            }
            RawSignal::ShowEntity { entity_id, card_id } => {
                self.game.reveal_entity(entity_id, &card_id);
            }
            RawSignal::PlayersIdentified { player, opponent } => {
                if self.game.set_agents(player, opponent) {
                    self.logger.log(
                        VerbosityLevel::Normal,
                        Some("session"),
                        &format!("player is entity {}, opponent is entity {}", player, opponent),
                    );
                } else {
                    self.logger.verbose("player/opponent already assigned; ignoring");
                }
            }
            RawSignal::StartWaitingMainAction => {
                self.emit(WatchEvent::StartWaitingMainAction);
            }
        }
    }

    fn close_block(&mut self, entity_id: EntityId, block_type: BlockType) {
        match self.game.notify_block_ended(entity_id, block_type) {
            Some(open) if open.entity_id == entity_id && open.block_type == block_type => {}
            Some(open) => self.logger.verbose(&format!(
                "block end {} {} closed open block {} {}",
                block_type, entity_id, open.block_type, open.entity_id
            )),
            None => self
                .logger
                .verbose(&format!("block end {} {} with no open block", block_type, entity_id)),
        }
    }

    fn attribute(&mut self, entity_id: EntityId) {
        match attribute_play(self.game, entity_id) {
            Ok(Attribution::Recorded { agent, card_id }) => {
                self.logger.log(
                    VerbosityLevel::Normal,
                    Some("attribution"),
                    &format!("{} played {}", agent, card_id),
                );
                self.emit(WatchEvent::CardPlayed { agent, card_id });
            }
            Ok(Attribution::OwnerUnknown) => {
                self.logger
                    .verbose(&format!("play of entity {} skipped: turn owner unknown", entity_id));
            }
            Ok(Attribution::CardUnknown) => {
                self.logger
                    .verbose(&format!("play of entity {} skipped: card id unknown", entity_id));
            }
            Err(err) => {
                self.logger
                    .warn("attribution", &format!("play of entity {} not attributed: {}", entity_id, err));
            }
        }
    }

    fn emit(&mut self, event: WatchEvent) {
        for subscriber in self.subscribers.iter_mut() {
            subscriber.on_event(&event, self.game);
        }
    }
}

/// Coordinates one watched session at a time
///
/// `tick` takes `&self` so a timer on another thread (or a callback) may call
/// it while a tick is running; such calls are dropped. Everything that
/// replaces or reconfigures the session takes `&mut self`.
pub struct LogWatcher<F: ReaderFactory> {
    factory: F,
    config: WatchConfig,
    clock: Arc<dyn Clock>,
    ticking: AtomicBool,
    dropped: AtomicU64,
    inner: Mutex<Inner<F::Reader>>,
}

impl<F: ReaderFactory> LogWatcher<F> {
    pub fn new(factory: F, config: WatchConfig) -> Self {
        Self::with_clock(factory, config, Arc::new(MonotonicClock::new()))
    }

    /// Create a watcher whose debounce timing reads `clock`
    pub fn with_clock(factory: F, config: WatchConfig, clock: Arc<dyn Clock>) -> Self {
        let mut logger = WatchLogger::with_verbosity(config.verbosity);
        logger.set_output_format(config.log_format);
        LogWatcher {
            factory,
            config,
            clock,
            ticking: AtomicBool::new(false),
            dropped: AtomicU64::new(0),
            inner: Mutex::new(Inner {
                session: None,
                subscribers: Vec::new(),
                logger,
                dropped_logged: 0,
            }),
        }
    }

    pub fn config(&self) -> &WatchConfig {
        &self.config
    }

    fn inner_mut(&mut self) -> &mut Inner<F::Reader> {
        self.inner.get_mut().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a consumer; subscribers outlive session resets
    pub fn subscribe(&mut self, subscriber: Box<dyn WatchSubscriber>) {
        self.inner_mut().subscribers.push(subscriber);
    }

    pub fn logger_mut(&mut self) -> &mut WatchLogger {
        &mut self.inner_mut().logger
    }

    /// Start a new session watching `target`
    ///
    /// Attaches a fresh reader and replaces the game state and stability
    /// decider wholesale, player/opponent assignment included. If the reader
    /// cannot be attached the error is returned and the previous session, if
    /// any, is left as it was.
    pub fn reset(&mut self, target: impl AsRef<Path>) -> Result<()> {
        let target = target.as_ref();
        let reader = match self.factory.attach(target) {
            Ok(reader) => reader,
            Err(err) => {
                self.inner_mut()
                    .logger
                    .warn("session", &format!("cannot attach to {}: {}", target.display(), err));
                return Err(err);
            }
        };

        let decider = StableDecider::new(self.config.debounce(), Arc::clone(&self.clock));
        let inner = self.inner_mut();
        inner.session = Some(Session {
            target: target.to_path_buf(),
            game: GameState::new(),
            decider,
            reader,
            notified: false,
        });
        inner
            .logger
            .log(VerbosityLevel::Minimal, Some("session"), &format!("watching {}", target.display()));
        Ok(())
    }

    /// Tell the reader the host started a brand-new game
    pub fn new_game_start(&mut self) -> Result<()> {
        let inner = self.inner_mut();
        let session = inner.session.as_mut().ok_or(crate::WatchError::NoSession)?;
        if let Err(err) = session.reader.new_game_start() {
            inner
                .logger
                .warn("session", &format!("reader could not skip to the new game: {}", err));
            return Err(err);
        }
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, Inner<F::Reader>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Waits for a running tick to finish, so not callable from callbacks
    pub fn has_session(&self) -> bool {
        self.lock().session.is_some()
    }

    /// Target of the current session
    ///
    /// Waits for a running tick to finish, so not callable from callbacks.
    pub fn target(&self) -> Option<PathBuf> {
        self.lock().session.as_ref().map(|s| s.target.clone())
    }

    /// Current game state
    ///
    /// Takes `&mut self` because the state is lent straight out of the
    /// session: exclusive access guarantees no tick mutates it meanwhile.
    pub fn game(&mut self) -> Option<&GameState> {
        self.inner_mut().session.as_ref().map(|s| &s.game)
    }

    /// Whether a tick is running right now
    pub fn is_ticking(&self) -> bool {
        self.ticking.load(Ordering::Acquire)
    }

    /// Ticks dropped because another tick was in progress
    pub fn dropped_ticks(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Consume new log content and notify subscribers if the state is stable
    pub fn tick(&self) -> TickOutcome {
        if self
            .ticking
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            return TickOutcome::Reentrant;
        }
        let _guard = TickGuard(&self.ticking);

        let mut inner = self.lock();
        let Inner {
            session,
            subscribers,
            logger,
            dropped_logged,
        } = &mut *inner;

        // Dropped ticks cannot log themselves: the logger is behind the lock
        let dropped = self.dropped.load(Ordering::Relaxed);
        if dropped > *dropped_logged {
            logger.verbose(&format!(
                "{} tick(s) dropped while a tick was in progress",
                dropped - *dropped_logged
            ));
            *dropped_logged = dropped;
        }
        let Some(session) = session.as_mut() else {
            return TickOutcome::NoSession;
        };
        let Session {
            game,
            decider,
            reader,
            notified,
            ..
        } = session;

        let mut dispatcher = Dispatcher {
            game: &mut *game,
            decider: &*decider,
            notified: &mut *notified,
            subscribers: subscribers.as_mut_slice(),
            logger: &*logger,
        };
        let processed = reader.process(&mut |signal: RawSignal| dispatcher.dispatch(signal));
        if let Err(err) = processed {
            logger.warn("reader", &format!("log reader error: {}", err));
        }

        if !decider.is_stable() {
            return TickOutcome::Settling;
        }
        if self.config.notify == NotifyMode::Edge && *notified {
            return TickOutcome::Stable;
        }

        for subscriber in subscribers.iter_mut() {
            subscriber.on_state_changed(game);
        }
        *notified = true;
        TickOutcome::Notified
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::stable::ManualClock;
    use crate::game::OutputFormat;
    use crate::WatchError;
    use std::collections::VecDeque;
    use std::time::Duration;

    /// Reader that hands out one queued batch per `process` call
    #[derive(Clone, Default)]
    struct QueueReader {
        batches: Arc<Mutex<VecDeque<Vec<RawSignal>>>>,
    }

    impl QueueReader {
        fn push(&self, batch: Vec<RawSignal>) {
            self.batches.lock().unwrap().push_back(batch);
        }
    }

    impl LogReader for QueueReader {
        fn process(&mut self, sink: &mut dyn FnMut(RawSignal)) -> Result<()> {
            let batch = self.batches.lock().unwrap().pop_front();
            for signal in batch.unwrap_or_default() {
                sink(signal);
            }
            Ok(())
        }
    }

    #[derive(Default)]
    struct Counter {
        notified: Arc<Mutex<usize>>,
    }

    impl WatchSubscriber for Counter {
        fn on_state_changed(&mut self, _game: &GameState) {
            *self.notified.lock().unwrap() += 1;
        }
    }

    fn watcher(
        reader: &QueueReader,
        clock: &ManualClock,
        config: WatchConfig,
    ) -> LogWatcher<impl Fn(&Path) -> Result<QueueReader>> {
        let reader = reader.clone();
        let factory = move |_: &Path| -> Result<QueueReader> { Ok(reader.clone()) };
        let mut watcher = LogWatcher::with_clock(factory, config, Arc::new(clock.clone()));
        watcher.logger_mut().enable_capture();
        watcher
    }

    #[test]
    fn test_tick_without_session() {
        let clock = ManualClock::new();
        let reader = QueueReader::default();
        let watcher = watcher(&reader, &clock, WatchConfig::default());
        assert_eq!(watcher.tick(), TickOutcome::NoSession);
        assert!(!watcher.is_ticking());
    }

    #[test]
    fn test_level_mode_renotifies_while_stable() {
        let clock = ManualClock::new();
        let reader = QueueReader::default();
        let mut watcher = watcher(&reader, &clock, WatchConfig::default());
        let count = Counter::default();
        let notified = Arc::clone(&count.notified);
        watcher.subscribe(Box::new(count));
        watcher.reset("power.log").unwrap();

        reader.push(vec![RawSignal::CreateGame, RawSignal::LogChanged]);
        assert_eq!(watcher.tick(), TickOutcome::Settling);

        clock.advance(Duration::from_millis(100));
        assert_eq!(watcher.tick(), TickOutcome::Notified);
        assert_eq!(watcher.tick(), TickOutcome::Notified);
        assert_eq!(*notified.lock().unwrap(), 2);
    }

    #[test]
    fn test_edge_mode_notifies_once_per_settle() {
        let clock = ManualClock::new();
        let reader = QueueReader::default();
        let config = WatchConfig {
            notify: NotifyMode::Edge,
            ..WatchConfig::default()
        };
        let mut watcher = watcher(&reader, &clock, config);
        let count = Counter::default();
        let notified = Arc::clone(&count.notified);
        watcher.subscribe(Box::new(count));
        watcher.reset("power.log").unwrap();

        clock.advance(Duration::from_millis(150));
        assert_eq!(watcher.tick(), TickOutcome::Notified);
        assert_eq!(watcher.tick(), TickOutcome::Stable);

        reader.push(vec![RawSignal::LogChanged]);
        assert_eq!(watcher.tick(), TickOutcome::Settling);
        clock.advance(Duration::from_millis(150));
        assert_eq!(watcher.tick(), TickOutcome::Notified);
        assert_eq!(watcher.tick(), TickOutcome::Stable);
        assert_eq!(*notified.lock().unwrap(), 2);
    }

    #[test]
    fn test_attach_failure_keeps_previous_session() {
        let clock = ManualClock::new();
        let factory = |path: &Path| -> Result<QueueReader> {
            if path.ends_with("missing.log") {
                Err(WatchError::AttachFailed {
                    path: path.to_path_buf(),
                    source: std::io::Error::from(std::io::ErrorKind::NotFound),
                })
            } else {
                Ok(QueueReader::default())
            }
        };
        let mut watcher = LogWatcher::with_clock(factory, WatchConfig::default(), Arc::new(clock));
        watcher.logger_mut().enable_capture();

        assert!(matches!(
            watcher.reset("missing.log"),
            Err(WatchError::AttachFailed { .. })
        ));
        assert!(!watcher.has_session());

        watcher.reset("power.log").unwrap();
        assert!(watcher.reset("missing.log").is_err());
        assert_eq!(watcher.target().as_deref(), Some(Path::new("power.log")));
    }

    struct StuckReader;

    impl LogReader for StuckReader {
        fn process(&mut self, _sink: &mut dyn FnMut(RawSignal)) -> Result<()> {
            Ok(())
        }

        fn new_game_start(&mut self) -> Result<()> {
            Err(std::io::Error::other("seek failed").into())
        }
    }

    #[test]
    fn test_new_game_start_reports_reader_failure() {
        let factory = |_: &Path| -> Result<StuckReader> { Ok(StuckReader) };
        let mut watcher = LogWatcher::with_clock(factory, WatchConfig::default(), Arc::new(ManualClock::new()));
        watcher.logger_mut().enable_capture();
        watcher.reset("power.log").unwrap();

        assert!(matches!(watcher.new_game_start(), Err(WatchError::IoError(_))));
        assert!(watcher
            .logger_mut()
            .logs()
            .iter()
            .any(|entry| entry.message.contains("seek failed")));
        assert!(watcher.has_session());
    }

    #[test]
    fn test_logger_follows_config_format() {
        let clock = ManualClock::new();
        let reader = QueueReader::default();
        let config = WatchConfig {
            log_format: OutputFormat::Json,
            ..WatchConfig::default()
        };
        let mut watcher = watcher(&reader, &clock, config);
        assert_eq!(watcher.logger_mut().output_format(), OutputFormat::Json);
    }

    #[test]
    fn test_session_queries_through_shared_reference() {
        let clock = ManualClock::new();
        let reader = QueueReader::default();
        let mut watcher = watcher(&reader, &clock, WatchConfig::default());
        watcher.reset("power.log").unwrap();

        let watcher = &watcher;
        let target = std::thread::scope(|scope| scope.spawn(|| watcher.target()).join().unwrap());
        assert_eq!(target, Some(PathBuf::from("power.log")));
        assert!(watcher.has_session());
    }

    #[test]
    fn test_new_game_start_needs_session() {
        let clock = ManualClock::new();
        let reader = QueueReader::default();
        let mut watcher = watcher(&reader, &clock, WatchConfig::default());
        assert!(matches!(watcher.new_game_start(), Err(WatchError::NoSession)));
        watcher.reset("power.log").unwrap();
        assert!(watcher.new_game_start().is_ok());
    }
}
