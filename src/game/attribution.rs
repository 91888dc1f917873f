//! Attribution of completed PLAY blocks to an agent's played-card history

use crate::core::{AgentIdentity, EntityId};
use crate::game::turn_owner::current_turn_owner;
use crate::game::GameState;
use crate::Result;

/// What happened to one PLAY block
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attribution {
    /// The card was appended to `agent`'s history
    Recorded { agent: AgentIdentity, card_id: String },
    /// No agent owns the current action (mulligan, non-main step, effect play)
    OwnerUnknown,
    /// The played entity is unknown or its card is still hidden
    CardUnknown,
}

/// Attribute a completed PLAY block started by `entity_id`
///
/// Appends at most one entry to exactly one agent's history. An error means
/// the turn owner could not be resolved consistently; nothing is recorded
/// and the caller can carry on with the next signal.
pub fn attribute_play(state: &mut GameState, entity_id: EntityId) -> Result<Attribution> {
    let agent = current_turn_owner(state)?;
    if !agent.is_known() {
        return Ok(Attribution::OwnerUnknown);
    }

    let card_id = match state.entity(entity_id) {
        Ok(entity) if entity.has_card_id() => entity.card_id.clone(),
        _ => return Ok(Attribution::CardUnknown),
    };

    state.record_played_card(agent, card_id.clone());
    Ok(Attribution::Recorded { agent, card_id })
}
