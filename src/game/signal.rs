//! Raw reader signals and the events republished to subscribers
//!
//! A log reader turns log lines into [`RawSignal`]s. The watcher consumes
//! each one in a single dispatcher and republishes the interesting ones as
//! [`WatchEvent`]s after the game state has been updated.

use crate::core::{AgentIdentity, BlockType, EntityId, GameTag};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Low-level signal produced by a log reader
///
/// Serialized as one JSON object per line with a `kind` field, which is the
/// format [`TraceReader`](crate::reader::TraceReader) tails.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RawSignal {
    BlockStart {
        entity_id: EntityId,
        block_type: BlockType,
    },
    BlockEnd {
        entity_id: EntityId,
        block_type: BlockType,
    },
    /// A CREATE_GAME line: either a new game or an auto-restart
    CreateGame,
    TagChanged {
        entity_id: EntityId,
        tag: GameTag,
        value: i32,
        /// Value before the change, as reported by the reader
        #[serde(default)]
        prev: Option<i32>,
    },
    /// FULL_ENTITY: an entity with its initial tags
    FullEntity {
        entity_id: EntityId,
        #[serde(default)]
        card_id: String,
        #[serde(default)]
        tags: FxHashMap<GameTag, i32>,
    },
    /// SHOW_ENTITY: a hidden card's identity is revealed
    ShowEntity { entity_id: EntityId, card_id: String },
    /// The reader worked out which player entity is ours
    PlayersIdentified { player: EntityId, opponent: EntityId },
    /// The engine started waiting on a main-action choice
    StartWaitingMainAction,
    /// New content was appended to the log
    LogChanged,
}

impl RawSignal {
    /// Short name used in log messages
    pub fn kind(&self) -> &'static str {
        match self {
            RawSignal::BlockStart { .. } => "block_start",
            RawSignal::BlockEnd { .. } => "block_end",
            RawSignal::CreateGame => "create_game",
            RawSignal::TagChanged { .. } => "tag_changed",
            RawSignal::FullEntity { .. } => "full_entity",
            RawSignal::ShowEntity { .. } => "show_entity",
            RawSignal::PlayersIdentified { .. } => "players_identified",
            RawSignal::StartWaitingMainAction => "start_waiting_main_action",
            RawSignal::LogChanged => "log_changed",
        }
    }
}

/// Event republished to subscribers, alongside the current game state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum WatchEvent {
    BlockStart {
        entity_id: EntityId,
        block_type: BlockType,
    },
    BlockEnd {
        entity_id: EntityId,
        block_type: BlockType,
    },
    /// The game entity's TURN tag moved on from `turn`
    EndTurn { turn: i32 },
    CreateGame,
    StartWaitingMainAction,
    /// A PLAY block was attributed to one agent's played-card history
    CardPlayed {
        agent: AgentIdentity,
        card_id: String,
    },
}
