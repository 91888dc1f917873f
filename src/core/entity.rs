//! Game entities: integer ids carrying an integer tag map

use crate::core::GameTag;
use crate::{Result, WatchError};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Entity id as printed by the game engine log
///
/// Ids are assigned by the engine and stay stable for the whole game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(u32);

impl EntityId {
    pub const fn new(id: u32) -> Self {
        EntityId(id)
    }

    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for EntityId {
    fn from(id: u32) -> Self {
        EntityId(id)
    }
}

/// One game object and its current tags
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,

    /// Card identifier (e.g. "EX1_066"); empty while the card is hidden
    #[serde(default)]
    pub card_id: String,

    #[serde(default)]
    pub tags: FxHashMap<GameTag, i32>,
}

impl Entity {
    pub fn new(id: EntityId) -> Self {
        Entity {
            id,
            card_id: String::new(),
            tags: FxHashMap::default(),
        }
    }

    pub fn with_card_id(mut self, card_id: impl Into<String>) -> Self {
        self.card_id = card_id.into();
        self
    }

    pub fn with_tag(mut self, tag: GameTag, value: i32) -> Self {
        self.tags.insert(tag, value);
        self
    }

    pub fn has_tag(&self, tag: GameTag) -> bool {
        self.tags.contains_key(&tag)
    }

    pub fn tag(&self, tag: GameTag) -> Option<i32> {
        self.tags.get(&tag).copied()
    }

    pub fn tag_or(&self, tag: GameTag, default: i32) -> i32 {
        self.tag(tag).unwrap_or(default)
    }

    /// Set a tag, returning the previous value
    pub fn set_tag(&mut self, tag: GameTag, value: i32) -> Option<i32> {
        self.tags.insert(tag, value)
    }

    pub fn has_card_id(&self) -> bool {
        !self.card_id.is_empty()
    }
}

/// All entities of the current game, keyed by id
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntityStore {
    entities: FxHashMap<EntityId, Entity>,
}

impl EntityStore {
    pub fn new() -> Self {
        EntityStore {
            entities: FxHashMap::default(),
        }
    }

    /// Insert an entity, replacing any previous entity with the same id
    pub fn insert(&mut self, entity: Entity) {
        self.entities.insert(entity.id, entity);
    }

    pub fn get(&self, id: EntityId) -> Result<&Entity> {
        self.entities
            .get(&id)
            .ok_or(WatchError::EntityNotFound(id.as_u32()))
    }

    pub fn get_mut(&mut self, id: EntityId) -> Result<&mut Entity> {
        self.entities
            .get_mut(&id)
            .ok_or(WatchError::EntityNotFound(id.as_u32()))
    }

    /// Get an entity, creating an empty one if the log mentions it first
    pub fn get_or_create(&mut self, id: EntityId) -> &mut Entity {
        self.entities.entry(id).or_insert_with(|| Entity::new(id))
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&EntityId, &Entity)> {
        self.entities.iter()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn clear(&mut self) {
        self.entities.clear();
    }
}
