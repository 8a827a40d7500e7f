//! Event and player metadata for a recorded game.

use crate::Color;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A player as listed in the pairing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub first_name: String,
    pub last_name: String,
    pub colour: Color,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fide_id: Option<u32>,
    #[serde(default)]
    pub elo: u32,
    #[serde(default)]
    pub country: String,
}

impl Player {
    /// Name as written in a PGN tag: "Last, First".
    pub fn pgn_name(&self) -> String {
        format!("{}, {}", self.last_name, self.first_name)
    }
}

/// Game metadata parsed from a PGN header.
///
/// Immutable once parsed, except for `result`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameInfo {
    pub name: String,
    #[serde(default)]
    pub site: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub round: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub board: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    pub result: String,
    /// White first, then Black.
    pub players: [Player; 2],
    /// The header text the info was parsed from.
    pub source_pgn: String,
}

impl GameInfo {
    pub fn player(&self, colour: Color) -> &Player {
        &self.players[colour.index()]
    }
}
