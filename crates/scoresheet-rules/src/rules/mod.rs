//! Rules engine abstraction.
//!
//! This module provides the [`RulesEngine`] trait through which the recording
//! core asks every chess question it has. The core never looks inside a
//! [`BoardState`]; it hands tokens to the engine and gets tokens, boards,
//! predicates and notation back.

mod exposed;
mod standard;

pub use standard::StandardRules;

use crate::BoardPositions;
use scoresheet_core::{BoardState, Color, PieceType, Square};
use thiserror::Error;

/// Why the rules engine refused a move.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejected {
    #[error("invalid board state: {0}")]
    InvalidState(String),

    #[error("no piece on {0}")]
    EmptySquare(Square),

    #[error("piece on {square} belongs to {owner}, who is not to move")]
    NotToMove { square: Square, owner: Color },

    #[error("illegal move {from}{to}")]
    IllegalMove { from: Square, to: Square },

    #[error("move {from}{to} needs a promotion piece")]
    MissingPromotion { from: Square, to: Square },

    #[error("move {from}{to} is not a promotion")]
    UnexpectedPromotion { from: Square, to: Square },

    #[error("cannot promote to {0}")]
    InvalidPromotionPiece(PieceType),
}

/// Chess rules as seen by the scoresheet.
///
/// All methods are pure functions of their arguments.
///
/// # Example
///
/// ```
/// use scoresheet_rules::{RulesEngine, StandardRules};
/// use scoresheet_core::Square;
///
/// let e2 = Square::from_algebraic("e2").unwrap();
/// let e4 = Square::from_algebraic("e4").unwrap();
/// let start = StandardRules.initial_state();
/// let next = StandardRules.apply_move(&start, e2, e4, None).unwrap();
/// assert_eq!(
///     next.as_fen(),
///     "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1"
/// );
/// ```
pub trait RulesEngine {
    /// Returns the state before any ply.
    fn initial_state(&self) -> BoardState;

    /// Derives the 8×8 board for a state.
    ///
    /// An unreadable token yields an empty board.
    fn board_positions(&self, state: &BoardState) -> BoardPositions;

    /// Plays `from`→`to` for the side to move, returning the resulting state.
    fn apply_move(
        &self,
        state: &BoardState,
        from: Square,
        to: Square,
        promotion: Option<PieceType>,
    ) -> Result<BoardState, Rejected>;

    /// Passes the turn without moving.
    fn skip_turn(&self, state: &BoardState) -> Result<BoardState, Rejected>;

    /// Returns true if `from`→`to` is a legal pawn move onto the last rank.
    fn is_promotion(&self, state: &BoardState, from: Square, to: Square) -> bool;

    /// Returns true if `square` holds a piece of the side not to move.
    fn is_opponent_piece(&self, state: &BoardState, square: Square) -> bool;

    /// SAN for the move, including the check or mate suffix.
    fn notation(
        &self,
        state: &BoardState,
        from: Square,
        to: Square,
        promotion: Option<PieceType>,
    ) -> Result<String, Rejected>;

    /// Returns true if the move would be accepted by [`apply_move`](RulesEngine::apply_move).
    fn is_legal(
        &self,
        state: &BoardState,
        from: Square,
        to: Square,
        promotion: Option<PieceType>,
    ) -> bool {
        self.apply_move(state, from, to, promotion).is_ok()
    }

    /// Side to move in `state`, if the token is readable.
    fn side_to_move(&self, state: &BoardState) -> Option<Color>;
}
