//! Chess rules adapter for the scoresheet.
//!
//! This crate provides:
//! - [`RulesEngine`] - every chess question the recording core asks
//! - [`StandardRules`] - standard chess rules backed by `shakmaty`
//! - [`BoardPositions`] - the 8×8 board derived from a state token
//! - [`parse_game_info`] and [`parse_round_info`] - PGN header parsing
//! - [`generate_pgn`] - game-record generation from a ply history
//!
//! # Example
//!
//! ```
//! use scoresheet_rules::{RulesEngine, StandardRules};
//! use scoresheet_core::Square;
//!
//! let g1 = Square::from_algebraic("g1").unwrap();
//! let f3 = Square::from_algebraic("f3").unwrap();
//! let start = StandardRules.initial_state();
//! assert_eq!(StandardRules.notation(&start, g1, f3, None).unwrap(), "Nf3");
//! ```

mod board;
pub mod header;
pub mod pgn;
pub mod rules;

pub use board::{BoardCell, BoardPositions};
pub use header::{parse_game_info, parse_round_info, ParseError, RoundInfo, Tags};
pub use pgn::{generate_pgn, result_token, PgnWriter};
pub use rules::{Rejected, RulesEngine, StandardRules};
