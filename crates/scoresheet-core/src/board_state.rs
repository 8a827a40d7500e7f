//! Board-state tokens.
//!
//! A [`BoardState`] is an opaque snapshot of "the game after N plies". The
//! recording core only compares and stores it; the rules adapter is the
//! only component that interprets it.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An opaque FEN snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BoardState(String);

impl BoardState {
    /// The standard starting position.
    pub const STARTPOS: &'static str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

    /// Wraps a FEN string without validating it.
    pub fn from_fen(fen: impl Into<String>) -> Self {
        BoardState(fen.into())
    }

    pub fn startpos() -> Self {
        BoardState(Self::STARTPOS.to_string())
    }

    pub fn as_fen(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BoardState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
