//! Game state model built up from reader signals

use crate::core::{AgentIdentity, BlockType, Entity, EntityId, EntityStore, GameTag};
use crate::Result;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// The game entity always has this id in the power log
pub const GAME_ENTITY_ID: EntityId = EntityId::new(1);

/// A BLOCK_START that has not seen its BLOCK_END yet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenBlock {
    pub entity_id: EntityId,
    pub block_type: BlockType,
}

/// Complete state of the game being watched
///
/// Mutated only by the watcher's dispatcher while a tick is running.
/// Subscribers get a shared borrow inside their callbacks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    /// All entities seen this game
    pub entities: EntityStore,

    /// Entity id of the local player; survives soft resets
    player_entity_id: Option<EntityId>,

    /// Entity id of the opponent; survives soft resets
    opponent_entity_id: Option<EntityId>,

    /// Currently open blocks, innermost last
    blocks: SmallVec<[OpenBlock; 8]>,

    /// Cards the local player played from hand, in order
    player_played_hand_cards: Vec<String>,

    /// Cards the opponent played from hand, in order
    opponent_played_hand_cards: Vec<String>,
}

impl GameState {
    pub fn new() -> Self {
        GameState {
            entities: EntityStore::new(),
            player_entity_id: None,
            opponent_entity_id: None,
            blocks: SmallVec::new(),
            player_played_hand_cards: Vec::new(),
            opponent_played_hand_cards: Vec::new(),
        }
    }

    /// Clear per-game state for an auto-restarted game
    ///
    /// Player and opponent entity ids are kept: the restarted game's log does
    /// not announce them again.
    pub fn soft_reset(&mut self) {
        self.entities.clear();
        self.blocks.clear();
        self.player_played_hand_cards.clear();
        self.opponent_played_hand_cards.clear();
    }

    pub fn player_entity_id(&self) -> Option<EntityId> {
        self.player_entity_id
    }

    pub fn opponent_entity_id(&self) -> Option<EntityId> {
        self.opponent_entity_id
    }

    /// Assign the player and opponent entity ids
    ///
    /// Returns false (and changes nothing) if they were already assigned for
    /// this session, or if both ids are the same entity.
    pub fn set_agents(&mut self, player: EntityId, opponent: EntityId) -> bool {
        if self.player_entity_id.is_some() || self.opponent_entity_id.is_some() || player == opponent {
            return false;
        }
        self.player_entity_id = Some(player);
        self.opponent_entity_id = Some(opponent);
        true
    }

    /// Which agent an entity id belongs to
    pub fn agent_for(&self, entity_id: EntityId) -> AgentIdentity {
        if self.player_entity_id == Some(entity_id) {
            AgentIdentity::Player
        } else if self.opponent_entity_id == Some(entity_id) {
            AgentIdentity::Opponent
        } else {
            AgentIdentity::Unknown
        }
    }

    pub fn entity(&self, id: EntityId) -> Result<&Entity> {
        self.entities.get(id)
    }

    pub fn game_entity(&self) -> Option<&Entity> {
        self.entities.get(GAME_ENTITY_ID).ok()
    }

    pub fn player_entity(&self) -> Option<&Entity> {
        self.player_entity_id.and_then(|id| self.entities.get(id).ok())
    }

    pub fn opponent_entity(&self) -> Option<&Entity> {
        self.opponent_entity_id.and_then(|id| self.entities.get(id).ok())
    }

    /// Tag value on an entity, or `default` if either is missing
    pub fn tag_or(&self, id: EntityId, tag: GameTag, default: i32) -> i32 {
        self.entities
            .get(id)
            .map(|e| e.tag_or(tag, default))
            .unwrap_or(default)
    }

    /// Current TURN tag of the game entity
    pub fn turn(&self) -> Option<i32> {
        self.game_entity().and_then(|e| e.tag(GameTag::TURN))
    }

    /// Insert or refresh an entity from a FULL_ENTITY record
    ///
    /// Tags are merged into any tags already recorded for the entity, and an
    /// empty card id does not hide a card id that was already known.
    pub fn upsert_entity(&mut self, id: EntityId, card_id: &str, tags: &FxHashMap<GameTag, i32>) {
        let entity = self.entities.get_or_create(id);
        if !card_id.is_empty() {
            entity.card_id = card_id.to_string();
        }
        for (tag, value) in tags {
            entity.set_tag(*tag, *value);
        }
    }

    /// Record a card id revealed by SHOW_ENTITY
    pub fn reveal_entity(&mut self, id: EntityId, card_id: &str) {
        self.entities.get_or_create(id).card_id = card_id.to_string();
    }

    pub fn notify_block_started(&mut self, entity_id: EntityId, block_type: BlockType) {
        self.blocks.push(OpenBlock { entity_id, block_type });
    }

    /// Close the innermost open block
    ///
    /// Returns the block that was closed, or None if no block was open. The
    /// caller decides whether a mismatched entity or type is worth reporting.
    pub fn notify_block_ended(&mut self, _entity_id: EntityId, _block_type: BlockType) -> Option<OpenBlock> {
        self.blocks.pop()
    }

    pub fn block_depth(&self) -> usize {
        self.blocks.len()
    }

    /// Apply a TAG_CHANGE
    ///
    /// Returns `Some(turn)` when this change moved the game entity's TURN tag
    /// off `turn`, i.e. the turn numbered `turn` just ended. `prev` is only
    /// consulted when the model has no earlier value for the tag.
    pub fn notify_entity_tag_changed(
        &mut self,
        id: EntityId,
        tag: GameTag,
        value: i32,
        prev: Option<i32>,
    ) -> Option<i32> {
        let previous = self.entities.get_or_create(id).set_tag(tag, value).or(prev);

        if id != GAME_ENTITY_ID || tag != GameTag::TURN {
            return None;
        }
        match previous {
            Some(old) if old != value => Some(old),
            _ => None,
        }
    }

    pub fn played_cards(&self, agent: AgentIdentity) -> &[String] {
        match agent {
            AgentIdentity::Player => &self.player_played_hand_cards,
            AgentIdentity::Opponent => &self.opponent_played_hand_cards,
            AgentIdentity::Unknown => &[],
        }
    }

    pub fn player_played_hand_cards(&self) -> &[String] {
        &self.player_played_hand_cards
    }

    pub fn opponent_played_hand_cards(&self) -> &[String] {
        &self.opponent_played_hand_cards
    }

    /// Append to one agent's played-card history (attribution only)
    pub(crate) fn record_played_card(&mut self, agent: AgentIdentity, card_id: String) -> bool {
        match agent {
            AgentIdentity::Player => self.player_played_hand_cards.push(card_id),
            AgentIdentity::Opponent => self.opponent_played_hand_cards.push(card_id),
            AgentIdentity::Unknown => return false,
        }
        true
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}
