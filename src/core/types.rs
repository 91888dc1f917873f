//! Strongly-typed wrappers for game log vocabulary
//!
//! Tag keys and values arrive from the log as bare integers. These wrappers
//! keep tag keys, step values and block kinds from being mixed up.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Integer key into an entity's tag map
///
/// Deserializes from either a number or a numeric string, since tag maps in
/// JSON carry their keys as strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct GameTag(i32);

impl GameTag {
    pub const STEP: GameTag = GameTag(19);
    pub const TURN: GameTag = GameTag(20);
    pub const CURRENT_PLAYER: GameTag = GameTag(23);
    pub const FIRST_PLAYER: GameTag = GameTag(24);
    pub const PLAYER_ID: GameTag = GameTag(30);
    pub const ZONE: GameTag = GameTag(49);
    pub const CONTROLLER: GameTag = GameTag(50);
    pub const ENTITY_ID: GameTag = GameTag(53);
    pub const CARDTYPE: GameTag = GameTag(202);
    pub const MULLIGAN_STATE: GameTag = GameTag(305);

    pub const fn new(value: i32) -> Self {
        GameTag(value)
    }

    pub const fn as_i32(&self) -> i32 {
        self.0
    }

    /// Human-readable name for the tags this crate knows about
    pub fn name(&self) -> Option<&'static str> {
        match *self {
            GameTag::STEP => Some("STEP"),
            GameTag::TURN => Some("TURN"),
            GameTag::CURRENT_PLAYER => Some("CURRENT_PLAYER"),
            GameTag::FIRST_PLAYER => Some("FIRST_PLAYER"),
            GameTag::PLAYER_ID => Some("PLAYER_ID"),
            GameTag::ZONE => Some("ZONE"),
            GameTag::CONTROLLER => Some("CONTROLLER"),
            GameTag::ENTITY_ID => Some("ENTITY_ID"),
            GameTag::CARDTYPE => Some("CARDTYPE"),
            GameTag::MULLIGAN_STATE => Some("MULLIGAN_STATE"),
            _ => None,
        }
    }
}

impl fmt::Display for GameTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{}", name),
            None => write!(f, "TAG_{}", self.0),
        }
    }
}

impl<'de> Deserialize<'de> for GameTag {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct TagVisitor;

        impl<'de> serde::de::Visitor<'de> for TagVisitor {
            type Value = GameTag;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an integer tag id")
            }

            fn visit_i64<E: serde::de::Error>(self, v: i64) -> Result<GameTag, E> {
                i32::try_from(v)
                    .map(GameTag)
                    .map_err(|_| E::custom(format!("tag id {} out of range", v)))
            }

            fn visit_u64<E: serde::de::Error>(self, v: u64) -> Result<GameTag, E> {
                i32::try_from(v)
                    .map(GameTag)
                    .map_err(|_| E::custom(format!("tag id {} out of range", v)))
            }

            fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<GameTag, E> {
                v.trim()
                    .parse::<i32>()
                    .map(GameTag)
                    .map_err(|_| E::custom(format!("invalid tag id '{}'", v)))
            }
        }

        deserializer.deserialize_any(TagVisitor)
    }
}

/// Values of the game entity's STEP tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Step {
    Invalid = 0,
    BeginFirst = 1,
    BeginShuffle = 2,
    BeginDraw = 3,
    BeginMulligan = 4,
    MainBegin = 5,
    MainReady = 6,
    MainResource = 7,
    MainDraw = 8,
    MainStart = 9,
    MainAction = 10,
    MainCombat = 11,
    MainEnd = 12,
    MainNext = 13,
    FinalWrapup = 14,
    FinalGameover = 15,
    MainCleanup = 16,
    MainStartTriggers = 17,
}

impl Step {
    pub fn from_i32(value: i32) -> Option<Step> {
        let step = match value {
            0 => Step::Invalid,
            1 => Step::BeginFirst,
            2 => Step::BeginShuffle,
            3 => Step::BeginDraw,
            4 => Step::BeginMulligan,
            5 => Step::MainBegin,
            6 => Step::MainReady,
            7 => Step::MainResource,
            8 => Step::MainDraw,
            9 => Step::MainStart,
            10 => Step::MainAction,
            11 => Step::MainCombat,
            12 => Step::MainEnd,
            13 => Step::MainNext,
            14 => Step::FinalWrapup,
            15 => Step::FinalGameover,
            16 => Step::MainCleanup,
            17 => Step::MainStartTriggers,
            _ => return None,
        };
        Some(step)
    }
}

/// Values of a player entity's MULLIGAN_STATE tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mulligan {
    Invalid = 0,
    Input = 1,
    Dealing = 2,
    Waiting = 3,
    Done = 4,
}

impl Mulligan {
    pub fn from_i32(value: i32) -> Option<Mulligan> {
        match value {
            0 => Some(Mulligan::Invalid),
            1 => Some(Mulligan::Input),
            2 => Some(Mulligan::Dealing),
            3 => Some(Mulligan::Waiting),
            4 => Some(Mulligan::Done),
            _ => None,
        }
    }
}

/// Kind of a BLOCK_START / BLOCK_END pair
///
/// Serialized with the log's upper-case spelling ("PLAY", "TRIGGER", ...).
/// Names this crate does not know deserialize to `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BlockType {
    Attack,
    Joust,
    Power,
    Trigger,
    Deaths,
    Play,
    Fatigue,
    Ritual,
    RevealCard,
    GameReset,
    #[serde(other)]
    Other,
}

impl BlockType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockType::Attack => "ATTACK",
            BlockType::Joust => "JOUST",
            BlockType::Power => "POWER",
            BlockType::Trigger => "TRIGGER",
            BlockType::Deaths => "DEATHS",
            BlockType::Play => "PLAY",
            BlockType::Fatigue => "FATIGUE",
            BlockType::Ritual => "RITUAL",
            BlockType::RevealCard => "REVEAL_CARD",
            BlockType::GameReset => "GAME_RESET",
            BlockType::Other => "OTHER",
        }
    }
}

impl fmt::Display for BlockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BlockType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let block_type = match s.trim().to_ascii_uppercase().as_str() {
            "ATTACK" => BlockType::Attack,
            "JOUST" => BlockType::Joust,
            "POWER" => BlockType::Power,
            "TRIGGER" => BlockType::Trigger,
            "DEATHS" => BlockType::Deaths,
            "PLAY" => BlockType::Play,
            "FATIGUE" => BlockType::Fatigue,
            "RITUAL" => BlockType::Ritual,
            "REVEAL_CARD" => BlockType::RevealCard,
            "GAME_RESET" => BlockType::GameReset,
            _ => BlockType::Other,
        };
        Ok(block_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_display() {
        assert_eq!(GameTag::TURN.to_string(), "TURN");
        assert_eq!(GameTag::new(9999).to_string(), "TAG_9999");
    }

    #[test]
    fn test_step_decoding() {
        assert_eq!(Step::from_i32(10), Some(Step::MainAction));
        assert_eq!(Step::from_i32(4), Some(Step::BeginMulligan));
        assert_eq!(Step::from_i32(99), None);
        assert_eq!(Step::MainAction as i32, 10);
    }

    #[test]
    fn test_block_type_names() {
        assert_eq!("PLAY".parse::<BlockType>().unwrap(), BlockType::Play);
        assert_eq!("reveal_card".parse::<BlockType>().unwrap(), BlockType::RevealCard);
        assert_eq!("SOMETHING_NEW".parse::<BlockType>().unwrap(), BlockType::Other);

        let json = serde_json::to_string(&BlockType::RevealCard).unwrap();
        assert_eq!(json, "\"REVEAL_CARD\"");
        let parsed: BlockType = serde_json::from_str("\"SOMETHING_NEW\"").unwrap();
        assert_eq!(parsed, BlockType::Other);
    }

    #[test]
    fn test_tag_from_number_or_string() {
        let tag: GameTag = serde_json::from_str("305").unwrap();
        assert_eq!(tag, GameTag::MULLIGAN_STATE);
        let tag: GameTag = serde_json::from_str("\"20\"").unwrap();
        assert_eq!(tag, GameTag::TURN);
        assert!(serde_json::from_str::<GameTag>("\"turn\"").is_err());
    }
}
