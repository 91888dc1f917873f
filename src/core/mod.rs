//! Core game log types and entities

pub mod agent;
pub mod entity;
pub mod types;

pub use agent::AgentIdentity;
pub use entity::{Entity, EntityId, EntityStore};
pub use types::{BlockType, GameTag, Mulligan, Step};
