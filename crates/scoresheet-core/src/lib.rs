//! Core types for chess scoresheets.
//!
//! This crate provides the plain data shared by the rules adapter and the
//! recording core:
//! - [`Piece`], [`PieceType`] and [`Color`] for piece representation
//! - [`Square`] board coordinates
//! - [`BoardState`] tokens
//! - [`Ply`] records making up a move history
//! - [`GameInfo`] and [`Player`] event metadata

mod board_state;
mod color;
mod game_info;
mod piece;
mod ply;
mod square;

pub use board_state::BoardState;
pub use color::Color;
pub use game_info::{GameInfo, Player};
pub use piece::{Piece, PieceType};
pub use ply::{MovePly, Ply, RecordedTime, SkipPly};
pub use square::{InvalidSquare, Square};
