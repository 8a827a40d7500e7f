//! Scoresheet
//!
//! Records a chess game move by move the way an arbiter's scoresheet app
//! does: plies go into an append-mostly history, every change is reversible,
//! and the board, move list and PGN are derived from the history alone.
//!
//! # Example
//!
//! ```
//! use scoresheet::{AppMode, MoveOutcome};
//! use scoresheet_core::Square;
//! use scoresheet_rules::StandardRules;
//!
//! let pgn = "[Event \"Club Night\"]\n[Round \"1.3\"]\n[White \"Polgar, Judit\"]\n[Black \"Short, Nigel\"]\n";
//! let mut mode: AppMode = AppMode::default();
//! mode.load_pgn(pgn).unwrap();
//! mode.start_recording(StandardRules, chrono::Utc::now()).unwrap();
//!
//! let e2 = Square::from_algebraic("e2").unwrap();
//! let e4 = Square::from_algebraic("e4").unwrap();
//! assert_eq!(mode.request_move(e2, e4).unwrap(), MoveOutcome::Committed);
//! assert_eq!(mode.session().unwrap().history().len(), 1);
//! ```

pub mod config;
pub mod history;
pub mod mutation;
pub mod session;
pub mod storage;
pub mod undo;
pub mod views;

pub use config::{ConfigError, ScoresheetConfig};
pub use history::{HistoryError, PlyHistory};
pub use mutation::{Commit, Intent, MovePlan, MutationEngine, MutationError};
pub use session::{AppMode, MoveOutcome, PendingMove, RecordingSession, SessionError};
pub use storage::{JsonFileStore, MemoryStore, SessionSnapshot, SessionStore, StorageError};
pub use undo::{ReversibleAction, UndoController, UndoError};
pub use views::{move_rows, DerivedViews, MoveRow};
