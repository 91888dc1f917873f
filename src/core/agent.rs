//! Agent identity: which side of the table an action belongs to

use serde::{Deserialize, Serialize};
use std::fmt;

/// The two competing agents, plus "can't tell right now"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum AgentIdentity {
    /// The local player (the one the AI plays for)
    Player,
    Opponent,
    #[default]
    Unknown,
}

impl AgentIdentity {
    pub fn is_known(&self) -> bool {
        !matches!(self, AgentIdentity::Unknown)
    }

    /// The other agent; Unknown stays Unknown
    pub fn other(&self) -> AgentIdentity {
        match self {
            AgentIdentity::Player => AgentIdentity::Opponent,
            AgentIdentity::Opponent => AgentIdentity::Player,
            AgentIdentity::Unknown => AgentIdentity::Unknown,
        }
    }
}

impl fmt::Display for AgentIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentIdentity::Player => write!(f, "player"),
            AgentIdentity::Opponent => write!(f, "opponent"),
            AgentIdentity::Unknown => write!(f, "unknown"),
        }
    }
}
