//! Board squares.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// A square, a1 = 0 through h8 = 63 (rank-major, file-minor).
///
/// Plies store squares in this form; snapshots write them as their
/// algebraic name ("e4").
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Square(u8);

impl Square {
    pub const A1: Square = Square(0);
    pub const E1: Square = Square(4);
    pub const H1: Square = Square(7);
    pub const A8: Square = Square(56);
    pub const E8: Square = Square(60);
    pub const H8: Square = Square(63);

    /// Builds a square from zero-based file and rank coordinates.
    pub const fn at(file: u8, rank: u8) -> Option<Self> {
        if file < 8 && rank < 8 {
            Some(Square(rank * 8 + file))
        } else {
            None
        }
    }

    pub const fn from_index(index: u8) -> Option<Self> {
        if index < 64 {
            Some(Square(index))
        } else {
            None
        }
    }

    /// Parses "a1".."h8". Only lowercase files are accepted.
    pub const fn from_algebraic(s: &str) -> Option<Self> {
        match s.as_bytes() {
            [f @ b'a'..=b'h', r @ b'1'..=b'8'] => Some(Square((*r - b'1') * 8 + (*f - b'a'))),
            _ => None,
        }
    }

    #[inline]
    pub const fn index(self) -> u8 {
        self.0
    }

    /// Zero-based file, a = 0.
    #[inline]
    pub const fn file_index(self) -> u8 {
        self.0 % 8
    }

    /// Zero-based rank, rank 1 = 0.
    #[inline]
    pub const fn rank_index(self) -> u8 {
        self.0 / 8
    }

    pub const fn file_char(self) -> char {
        (b'a' + self.file_index()) as char
    }

    pub const fn rank_char(self) -> char {
        (b'1' + self.rank_index()) as char
    }

    pub fn to_algebraic(self) -> String {
        self.to_string()
    }

    /// All 64 squares from a1 to h8.
    pub fn all() -> impl Iterator<Item = Square> {
        (0..64).map(Square)
    }
}

impl fmt::Debug for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Square({})", self)
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.file_char(), self.rank_char())
    }
}

impl std::str::FromStr for Square {
    type Err = InvalidSquare;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Square::from_algebraic(s).ok_or_else(|| InvalidSquare(s.to_string()))
    }
}

impl TryFrom<String> for Square {
    type Error = InvalidSquare;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Square> for String {
    fn from(square: Square) -> Self {
        square.to_algebraic()
    }
}

/// A string that does not name a square.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid square: {0:?}")]
pub struct InvalidSquare(pub String);
