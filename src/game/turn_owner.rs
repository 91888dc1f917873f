//! Turn-owner resolution
//!
//! Works out which agent is entitled to the current main action from the
//! game, player and opponent entity tags. Only the main-action step outside
//! the mulligan has a well-defined actor; everything else is Unknown.

use crate::core::{AgentIdentity, Entity, GameTag, Mulligan, Step};
use crate::game::GameState;
use crate::{Result, WatchError};

fn in_mulligan_input(entity: &Entity) -> bool {
    entity.tag(GameTag::MULLIGAN_STATE).and_then(Mulligan::from_i32) == Some(Mulligan::Input)
}

fn marked_first(entity: &Entity) -> bool {
    entity.tag_or(GameTag::FIRST_PLAYER, 0) == 1
}

/// Resolve the agent whose main action it currently is
///
/// The agent that went first acts on odd turns and the other on even turns.
/// Fails with [`WatchError::FirstPlayerUnresolved`] when neither agent
/// carries FIRST_PLAYER at main action, which means upstream state is
/// inconsistent rather than merely incomplete.
pub fn resolve(game: &Entity, player: &Entity, opponent: &Entity) -> Result<AgentIdentity> {
    if in_mulligan_input(player) || in_mulligan_input(opponent) {
        return Ok(AgentIdentity::Unknown);
    }

    match game.tag(GameTag::STEP).and_then(Step::from_i32) {
        Some(Step::MainAction) => {}
        _ => return Ok(AgentIdentity::Unknown),
    }

    let first = if marked_first(player) {
        AgentIdentity::Player
    } else if marked_first(opponent) {
        AgentIdentity::Opponent
    } else {
        return Err(WatchError::FirstPlayerUnresolved {
            player: player.id.as_u32(),
            opponent: opponent.id.as_u32(),
        });
    };

    let turn = match game.tag(GameTag::TURN) {
        Some(turn) if turn >= 0 => turn,
        _ => return Ok(AgentIdentity::Unknown),
    };

    if turn % 2 == 1 {
        Ok(first)
    } else {
        Ok(first.other())
    }
}

/// Resolve the turn owner for the whole game state
///
/// Unknown while the game, player or opponent entity is not known yet.
pub fn current_turn_owner(state: &GameState) -> Result<AgentIdentity> {
    match (state.game_entity(), state.player_entity(), state.opponent_entity()) {
        (Some(game), Some(player), Some(opponent)) => resolve(game, player, opponent),
        _ => Ok(AgentIdentity::Unknown),
    }
}
