//! Log reader interface
//!
//! The watcher does not tail or parse the game log itself. A [`LogReader`]
//! hands it [`RawSignal`]s for whatever content was appended since the last
//! call, and a [`ReaderFactory`] attaches a fresh reader on every reset.

pub mod trace;

pub use trace::TraceReader;

use crate::game::RawSignal;
use crate::Result;
use std::path::Path;

/// Source of raw signals
pub trait LogReader: Send {
    /// Consume newly appended log content
    ///
    /// Every signal is passed to `sink` synchronously, in log order, before
    /// this returns. An error reports content that could not be consumed;
    /// signals already handed to `sink` stay delivered.
    fn process(&mut self, sink: &mut dyn FnMut(RawSignal)) -> Result<()>;

    /// The host started a brand-new game (not an auto-restart)
    ///
    /// Readers that tail a log skip the history written so far.
    fn new_game_start(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Attaches a log reader to a session target (usually a log path)
pub trait ReaderFactory {
    type Reader: LogReader;

    fn attach(&self, target: &Path) -> Result<Self::Reader>;
}

impl<F, R> ReaderFactory for F
where
    F: Fn(&Path) -> Result<R>,
    R: LogReader,
{
    type Reader = R;

    fn attach(&self, target: &Path) -> Result<R> {
        self(target)
    }
}

impl<R: LogReader + ?Sized> LogReader for Box<R> {
    fn process(&mut self, sink: &mut dyn FnMut(RawSignal)) -> Result<()> {
        (**self).process(sink)
    }

    fn new_game_start(&mut self) -> Result<()> {
        (**self).new_game_start()
    }
}
