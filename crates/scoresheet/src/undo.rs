//! Reversible actions and the undo/redo controller.
//!
//! Every committed mutation leaves one [`ReversibleAction`] describing how
//! to take it back. Reverting an action yields the new history plus the
//! action that would revert *that*, which is what redo replays.

use crate::history::{HistoryError, PlyHistory};
use scoresheet_core::{Ply, RecordedTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised when an action cannot be reverted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UndoError {
    #[error("action kind is not supported")]
    Unsupported,

    #[error("ply index {index} out of range (history has {len} plies)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error(transparent)]
    History(#[from] HistoryError),
}

/// How to take back one committed mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReversibleAction {
    /// Plies were appended; reverting removes the last `count`.
    AppendPlies { count: usize },
    /// Plies were removed from the end; reverting appends them again.
    RestorePlies { plies: Vec<Ply> },
    /// The draw-offer flag of ply `index` was flipped.
    ToggleDrawOffer { index: usize },
    /// The recorded time of ply `index` was changed from `previous`.
    SetRecordedTime {
        index: usize,
        previous: Option<RecordedTime>,
    },
    /// Plies from `index` on were replaced; `replaced` holds the old ones.
    ReplaceMoves { index: usize, replaced: Vec<Ply> },
    /// An action written by a newer version.
    #[serde(other)]
    Unsupported,
}

impl ReversibleAction {
    /// Reverts this action on `history`.
    ///
    /// Returns the reverted history and the action that undoes the revert.
    pub fn revert(&self, history: &PlyHistory) -> Result<(PlyHistory, ReversibleAction), UndoError> {
        let mut next = history.clone();
        let inverse = match self {
            ReversibleAction::AppendPlies { count } => {
                let len = next.len();
                if *count > len {
                    return Err(UndoError::IndexOutOfRange {
                        index: *count,
                        len,
                    });
                }
                ReversibleAction::RestorePlies {
                    plies: next.truncate(len - count),
                }
            }
            ReversibleAction::RestorePlies { plies } => {
                let count = plies.len();
                next.check_tail(next.len(), plies)?;
                next.replace_tail(next.len(), plies.clone())?;
                ReversibleAction::AppendPlies { count }
            }
            ReversibleAction::ToggleDrawOffer { index } => {
                let ply = ply_mut(&mut next, *index)?;
                ply.set_draw_offer(!ply.draw_offer());
                ReversibleAction::ToggleDrawOffer { index: *index }
            }
            ReversibleAction::SetRecordedTime { index, previous } => {
                let ply = ply_mut(&mut next, *index)?;
                let current = ply.recorded_time();
                ply.set_recorded_time(*previous);
                ReversibleAction::SetRecordedTime {
                    index: *index,
                    previous: current,
                }
            }
            ReversibleAction::ReplaceMoves { index, replaced } => {
                let len = next.len();
                if *index > len {
                    return Err(UndoError::IndexOutOfRange { index: *index, len });
                }
                next.check_tail(*index, replaced)?;
                let removed = next.replace_tail(*index, replaced.clone())?;
                ReversibleAction::ReplaceMoves {
                    index: *index,
                    replaced: removed,
                }
            }
            ReversibleAction::Unsupported => return Err(UndoError::Unsupported),
        };
        Ok((next, inverse))
    }
}

fn ply_mut(history: &mut PlyHistory, index: usize) -> Result<&mut Ply, UndoError> {
    let len = history.len();
    history
        .get_mut(index)
        .ok_or(UndoError::IndexOutOfRange { index, len })
}

/// Undo stack with a single redo slot.
///
/// Only the most recent action can be reverted. Pushing a new action
/// discards whatever was available to redo.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UndoController {
    actions: Vec<ReversibleAction>,
    redo: Option<ReversibleAction>,
}

impl UndoController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resumes with a stored action log. The redo slot starts empty.
    pub fn from_actions(actions: Vec<ReversibleAction>) -> Self {
        UndoController {
            actions,
            redo: None,
        }
    }

    pub fn actions(&self) -> &[ReversibleAction] {
        &self.actions
    }

    pub fn can_undo(&self) -> bool {
        !self.actions.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        self.redo.is_some()
    }

    pub fn push(&mut self, action: ReversibleAction) {
        self.actions.push(action);
        self.redo = None;
    }

    /// Reverts the most recent action.
    ///
    /// Returns `None` when there is nothing to undo or the action cannot be
    /// reverted. A failing action is dropped with a warning.
    pub fn undo(&mut self, history: &PlyHistory) -> Option<PlyHistory> {
        let action = self.actions.pop()?;
        match action.revert(history) {
            Ok((reverted, inverse)) => {
                tracing::debug!(?action, "undone");
                self.redo = Some(inverse);
                Some(reverted)
            }
            Err(e) => {
                tracing::warn!(error = %e, ?action, "cannot undo action, ignoring");
                self.redo = None;
                None
            }
        }
    }

    /// Re-applies the most recently undone action.
    pub fn redo(&mut self, history: &PlyHistory) -> Option<PlyHistory> {
        let action = self.redo.take()?;
        match action.revert(history) {
            Ok((reapplied, inverse)) => {
                tracing::debug!(?action, "redone");
                self.actions.push(inverse);
                Some(reapplied)
            }
            Err(e) => {
                tracing::warn!(error = %e, ?action, "cannot redo action, ignoring");
                None
            }
        }
    }
}
