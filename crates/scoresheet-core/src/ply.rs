//! Plies: one player's recorded turn.

use crate::{BoardState, Color, PieceType, Square};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Elapsed game time written next to a ply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RecordedTime {
    pub hours: u32,
    pub minutes: u32,
}

impl RecordedTime {
    /// Returns `None` unless `minutes < 60`.
    pub const fn new(hours: u32, minutes: u32) -> Option<Self> {
        if minutes < 60 {
            Some(RecordedTime { hours, minutes })
        } else {
            None
        }
    }

    /// Whole minutes of `elapsed`, clamped at zero.
    pub fn from_elapsed(elapsed: chrono::Duration) -> Self {
        let total = elapsed.num_minutes().max(0);
        let total = u32::try_from(total).unwrap_or(u32::MAX);
        RecordedTime {
            hours: total / 60,
            minutes: total % 60,
        }
    }
}

impl fmt::Display for RecordedTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{:02}", self.hours, self.minutes)
    }
}

/// A ply in which a piece was moved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovePly {
    pub starting_state: BoardState,
    pub from: Square,
    pub to: Square,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promotion: Option<PieceType>,
    pub player: Color,
    pub ply_index: usize,
    #[serde(default)]
    pub draw_offer: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recorded_time: Option<RecordedTime>,
    /// SAN of the move, computed from `starting_state`.
    pub notation: String,
}

/// A ply in which the player passed without moving.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkipPly {
    pub starting_state: BoardState,
    pub player: Color,
    pub ply_index: usize,
    #[serde(default)]
    pub draw_offer: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recorded_time: Option<RecordedTime>,
}

/// One entry of the move history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Ply {
    Move(MovePly),
    Skip(SkipPly),
}

impl Ply {
    /// A skip for whoever plays at `ply_index`.
    pub fn skip(starting_state: BoardState, ply_index: usize) -> Self {
        Ply::Skip(SkipPly {
            starting_state,
            player: Color::for_ply(ply_index),
            ply_index,
            draw_offer: false,
            recorded_time: None,
        })
    }

    pub fn starting_state(&self) -> &BoardState {
        match self {
            Ply::Move(m) => &m.starting_state,
            Ply::Skip(s) => &s.starting_state,
        }
    }

    pub fn player(&self) -> Color {
        match self {
            Ply::Move(m) => m.player,
            Ply::Skip(s) => s.player,
        }
    }

    pub fn ply_index(&self) -> usize {
        match self {
            Ply::Move(m) => m.ply_index,
            Ply::Skip(s) => s.ply_index,
        }
    }

    pub fn draw_offer(&self) -> bool {
        match self {
            Ply::Move(m) => m.draw_offer,
            Ply::Skip(s) => s.draw_offer,
        }
    }

    pub fn set_draw_offer(&mut self, offered: bool) {
        match self {
            Ply::Move(m) => m.draw_offer = offered,
            Ply::Skip(s) => s.draw_offer = offered,
        }
    }

    pub fn recorded_time(&self) -> Option<RecordedTime> {
        match self {
            Ply::Move(m) => m.recorded_time,
            Ply::Skip(s) => s.recorded_time,
        }
    }

    pub fn set_recorded_time(&mut self, time: Option<RecordedTime>) {
        match self {
            Ply::Move(m) => m.recorded_time = time,
            Ply::Skip(s) => s.recorded_time = time,
        }
    }

    pub fn is_skip(&self) -> bool {
        matches!(self, Ply::Skip(_))
    }

    /// Move number shown on a scoresheet (1-based, shared by both sides).
    pub fn move_number(&self) -> usize {
        self.ply_index() / 2 + 1
    }
}
