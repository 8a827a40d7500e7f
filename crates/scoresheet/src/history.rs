//! The ply history: the single source of truth for a recorded game.
//!
//! Board state and notation are never stored alongside the history; they
//! are recomputed from it. Every mutation checks that plies alternate
//! White/Black and that `history[i].ply_index == i`. Breaking that is a
//! programming error: debug builds panic, release builds reject the
//! mutation and leave the history untouched.

use scoresheet_core::{BoardState, Color, Ply};
use scoresheet_rules::{Rejected, RulesEngine};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised by history operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HistoryError {
    #[error("ply history invariant violated at index {index}: {reason}")]
    InvariantViolation { index: usize, reason: &'static str },

    #[error("ply {index} cannot be replayed: {source}")]
    Replay {
        index: usize,
        #[source]
        source: Rejected,
    },
}

/// Ordered plies of a game.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Ply>", into = "Vec<Ply>")]
pub struct PlyHistory {
    plies: Vec<Ply>,
}

impl PlyHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a history from stored plies, checking alternation and indices.
    ///
    /// Bad input is reported as an error; it is data, not a bug.
    pub fn from_plies(plies: Vec<Ply>) -> Result<Self, HistoryError> {
        for (index, ply) in plies.iter().enumerate() {
            if let Err(reason) = check_slot(index, ply) {
                tracing::warn!(index, reason, "rejecting stored ply history");
                return Err(HistoryError::InvariantViolation { index, reason });
            }
        }
        Ok(PlyHistory { plies })
    }

    pub fn len(&self) -> usize {
        self.plies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plies.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Ply> {
        self.plies.get(index)
    }

    pub(crate) fn get_mut(&mut self, index: usize) -> Option<&mut Ply> {
        self.plies.get_mut(index)
    }

    pub fn last(&self) -> Option<&Ply> {
        self.plies.last()
    }

    pub fn plies(&self) -> &[Ply] {
        &self.plies
    }

    /// The side that plays the next ply.
    pub fn next_player(&self) -> Color {
        Color::for_ply(self.plies.len())
    }

    /// State after every ply has been played.
    ///
    /// Only the last ply is replayed, from its own starting state.
    pub fn current_state<R: RulesEngine + ?Sized>(
        &self,
        rules: &R,
    ) -> Result<BoardState, HistoryError> {
        let Some(last) = self.plies.last() else {
            return Ok(rules.initial_state());
        };
        replay(rules, last).map_err(|source| HistoryError::Replay {
            index: last.ply_index(),
            source,
        })
    }

    /// Checks that each ply starts from the state its predecessor produced.
    pub fn verify_chain<R: RulesEngine + ?Sized>(&self, rules: &R) -> Result<(), HistoryError> {
        let mut expected = rules.initial_state();
        for ply in &self.plies {
            if *ply.starting_state() != expected {
                return Err(HistoryError::InvariantViolation {
                    index: ply.ply_index(),
                    reason: "starting state does not follow from the previous ply",
                });
            }
            expected = replay(rules, ply).map_err(|source| HistoryError::Replay {
                index: ply.ply_index(),
                source,
            })?;
        }
        Ok(())
    }

    /// Appends a ply at the end.
    pub fn append(&mut self, ply: Ply) -> Result<(), HistoryError> {
        check_slot(self.plies.len(), &ply).map_err(|reason| violation(self.plies.len(), reason))?;
        self.plies.push(ply);
        Ok(())
    }

    /// Replaces every ply from `from_index` on with `plies`, returning the
    /// plies that were removed.
    pub fn replace_tail(
        &mut self,
        from_index: usize,
        plies: Vec<Ply>,
    ) -> Result<Vec<Ply>, HistoryError> {
        if from_index > self.plies.len() {
            return Err(violation(from_index, "replacement starts past the end"));
        }
        for (offset, ply) in plies.iter().enumerate() {
            let index = from_index + offset;
            check_slot(index, ply).map_err(|reason| violation(index, reason))?;
        }
        let removed = self.plies.split_off(from_index);
        self.plies.extend(plies);
        Ok(removed)
    }

    /// Checks that `plies` would fit in place from `from_index` on.
    ///
    /// Unlike [`replace_tail`](Self::replace_tail) a misfit is reported, not
    /// treated as a bug; stored undo records go through this first.
    pub fn check_tail(&self, from_index: usize, plies: &[Ply]) -> Result<(), HistoryError> {
        if from_index > self.plies.len() {
            return Err(HistoryError::InvariantViolation {
                index: from_index,
                reason: "replacement starts past the end",
            });
        }
        plies.iter().enumerate().try_for_each(|(offset, ply)| {
            let index = from_index + offset;
            check_slot(index, ply)
                .map_err(|reason| HistoryError::InvariantViolation { index, reason })
        })
    }

    /// Removes and returns the last ply.
    pub fn truncate_last(&mut self) -> Option<Ply> {
        self.plies.pop()
    }

    /// Keeps the first `len` plies, returning the rest.
    pub fn truncate(&mut self, len: usize) -> Vec<Ply> {
        if len >= self.plies.len() {
            return Vec::new();
        }
        self.plies.split_off(len)
    }
}

impl TryFrom<Vec<Ply>> for PlyHistory {
    type Error = HistoryError;

    fn try_from(plies: Vec<Ply>) -> Result<Self, Self::Error> {
        PlyHistory::from_plies(plies)
    }
}

impl From<PlyHistory> for Vec<Ply> {
    fn from(history: PlyHistory) -> Self {
        history.plies
    }
}

/// State produced by playing `ply` from its starting state.
pub(crate) fn replay<R: RulesEngine + ?Sized>(rules: &R, ply: &Ply) -> Result<BoardState, Rejected> {
    match ply {
        Ply::Move(m) => rules.apply_move(&m.starting_state, m.from, m.to, m.promotion),
        Ply::Skip(s) => rules.skip_turn(&s.starting_state),
    }
}

fn check_slot(index: usize, ply: &Ply) -> Result<(), &'static str> {
    if ply.ply_index() != index {
        return Err("ply index does not match its position");
    }
    if ply.player() != Color::for_ply(index) {
        return Err("players do not alternate starting with White");
    }
    Ok(())
}

fn violation(index: usize, reason: &'static str) -> HistoryError {
    tracing::error!(index, reason, "ply history invariant violated");
    if cfg!(debug_assertions) {
        panic!("ply history invariant violated at index {index}: {reason}");
    }
    HistoryError::InvariantViolation { index, reason }
}
