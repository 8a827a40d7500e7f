//! Views derived from the history after every commit.

use crate::history::{HistoryError, PlyHistory};
use scoresheet_core::{BoardState, Color, Ply};
use scoresheet_rules::{BoardPositions, RulesEngine};

/// One line of the move list: a White ply and, once played, Black's reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveRow {
    pub move_no: usize,
    pub white: Ply,
    pub black: Option<Ply>,
}

/// Pairs plies into move rows.
pub fn move_rows(plies: &[Ply]) -> Vec<MoveRow> {
    plies
        .chunks(2)
        .enumerate()
        .map(|(i, pair)| MoveRow {
            move_no: i + 1,
            white: pair[0].clone(),
            black: pair.get(1).cloned(),
        })
        .collect()
}

/// Everything the UI shows, recomputed from scratch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedViews {
    pub state: BoardState,
    pub board: BoardPositions,
    pub rows: Vec<MoveRow>,
    pub to_move: Color,
    /// Number of the move being entered.
    pub move_number: usize,
}

impl DerivedViews {
    pub fn compute<R: RulesEngine + ?Sized>(
        history: &PlyHistory,
        rules: &R,
    ) -> Result<Self, HistoryError> {
        let state = history.current_state(rules)?;
        Ok(DerivedViews {
            board: rules.board_positions(&state),
            rows: move_rows(history.plies()),
            to_move: history.next_player(),
            move_number: history.len() / 2 + 1,
            state,
        })
    }
}
