//! Serializable summary of the watched game
//!
//! `GameState` is only lent to subscribers for the duration of a callback.
//! A `StateSnapshot` is an owned copy of the parts a consumer usually wants,
//! cheap to keep around or print as one JSON line.

use crate::core::{AgentIdentity, EntityId, GameTag, Step};
use crate::game::turn_owner::current_turn_owner;
use crate::game::GameState;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub turn: Option<i32>,

    pub step: Option<Step>,

    /// Agent entitled to the current main action
    pub turn_owner: AgentIdentity,

    /// Set when the turn owner could not be resolved consistently
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub turn_owner_error: Option<String>,

    pub player_entity_id: Option<EntityId>,

    pub opponent_entity_id: Option<EntityId>,

    pub entity_count: usize,

    pub block_depth: usize,

    pub player_played_hand_cards: Vec<String>,

    pub opponent_played_hand_cards: Vec<String>,
}

impl StateSnapshot {
    pub fn capture(game: &GameState) -> Self {
        let (turn_owner, turn_owner_error) = match current_turn_owner(game) {
            Ok(owner) => (owner, None),
            Err(err) => (AgentIdentity::Unknown, Some(err.to_string())),
        };

        StateSnapshot {
            turn: game.turn(),
            step: game
                .game_entity()
                .and_then(|e| e.tag(GameTag::STEP))
                .and_then(Step::from_i32),
            turn_owner,
            turn_owner_error,
            player_entity_id: game.player_entity_id(),
            opponent_entity_id: game.opponent_entity_id(),
            entity_count: game.entities.len(),
            block_depth: game.block_depth(),
            player_played_hand_cards: game.player_played_hand_cards().to_vec(),
            opponent_played_hand_cards: game.opponent_played_hand_cards().to_vec(),
        }
    }

    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
