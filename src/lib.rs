//! HS Log Watcher - debounced game-state notifications from a game engine log
//!
//! Sits between a log reader and an analysis layer: applies raw log signals
//! to a game-state model, works out whose turn it is, attributes played
//! cards, and tells subscribers when the state has settled.

pub mod config;
pub mod core;
pub mod error;
pub mod game;
pub mod reader;

pub use config::{NotifyMode, WatchConfig};
pub use error::{Result, WatchError};
