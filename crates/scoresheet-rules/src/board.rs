//! 8×8 board derived from a board-state token.

use scoresheet_core::{Piece, Square};

/// One square of a derived board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoardCell {
    pub square: Square,
    pub piece: Option<Piece>,
}

/// The board as rows of cells, row 0 being rank 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardPositions {
    rows: [[BoardCell; 8]; 8],
}

impl BoardPositions {
    /// A board with no pieces.
    pub fn empty() -> Self {
        let mut rows = [[BoardCell {
            square: Square::A1,
            piece: None,
        }; 8]; 8];
        for square in Square::all() {
            rows[square.rank_index() as usize][square.file_index() as usize].square = square;
        }
        BoardPositions { rows }
    }

    pub fn rows(&self) -> &[[BoardCell; 8]; 8] {
        &self.rows
    }

    pub fn piece_at(&self, square: Square) -> Option<Piece> {
        self.cell(square).piece
    }

    pub fn set(&mut self, square: Square, piece: Option<Piece>) {
        self.rows[square.rank_index() as usize][square.file_index() as usize].piece = piece;
    }

    fn cell(&self, square: Square) -> &BoardCell {
        &self.rows[square.rank_index() as usize][square.file_index() as usize]
    }

    /// Text diagram with rank 8 at the top, `.` for empty squares.
    pub fn to_ascii(&self) -> String {
        let mut out = String::with_capacity(8 * 19);
        for row in self.rows.iter().rev() {
            out.push(row[0].square.rank_char());
            for cell in row {
                out.push(' ');
                out.push(cell.piece.map_or('.', Piece::to_fen_char));
            }
            out.push('\n');
        }
        out.push_str("  a b c d e f g h\n");
        out
    }
}

impl Default for BoardPositions {
    fn default() -> Self {
        Self::empty()
    }
}
