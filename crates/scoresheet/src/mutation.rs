//! The mutation engine: every change to a history goes through here.
//!
//! [`MutationEngine::apply`] is pure. It takes a history and an [`Intent`]
//! and either returns a whole new history with the action that reverses it,
//! or an error and nothing else. Compound operations never half-apply.

use crate::history::{HistoryError, PlyHistory};
use crate::undo::ReversibleAction;
use scoresheet_core::{Color, MovePly, PieceType, Ply, RecordedTime, Square};
use scoresheet_rules::{Rejected, RulesEngine};
use thiserror::Error;

/// A requested change to the history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    /// Move a piece. Touching an opponent piece skips the current turn first.
    Move {
        from: Square,
        to: Square,
        promotion: Option<PieceType>,
    },
    /// Pass the turn of the side to move.
    SkipTurn,
    /// Flip the draw-offer flag of a ply.
    ToggleDrawOffer { index: usize },
    /// Set or clear the recorded time of a ply.
    SetRecordedTime {
        index: usize,
        time: Option<RecordedTime>,
    },
    /// Drop ply `index` and everything after it so play can be re-entered.
    EditMove { index: usize },
}

/// Errors returned when an intent is refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MutationError {
    #[error("move rejected: {0}")]
    IllegalMove(#[from] Rejected),

    #[error("move {from}{to} needs a promotion choice")]
    MissingPromotionChoice { from: Square, to: Square },

    #[error("ply index {index} out of range (history has {len} plies)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error(transparent)]
    History(#[from] HistoryError),
}

/// A successful mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    pub history: PlyHistory,
    pub action: ReversibleAction,
}

/// What committing a move would involve, before committing it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MovePlan {
    /// The piece belongs to the side not to move, so a skip comes first.
    pub auto_skip: bool,
    /// The move is a promotion and needs a piece choice.
    pub needs_promotion: bool,
}

/// Applies intents to histories using a rules engine.
pub struct MutationEngine<'r, R: RulesEngine + ?Sized> {
    rules: &'r R,
}

impl<'r, R: RulesEngine + ?Sized> MutationEngine<'r, R> {
    pub fn new(rules: &'r R) -> Self {
        MutationEngine { rules }
    }

    /// Applies `intent` to `history`.
    pub fn apply(&self, history: &PlyHistory, intent: Intent) -> Result<Commit, MutationError> {
        match intent {
            Intent::Move {
                from,
                to,
                promotion,
            } => self.play_move(history, from, to, promotion),
            Intent::SkipTurn => self.skip_turn(history),
            Intent::ToggleDrawOffer { index } => {
                let mut next = history.clone();
                let ply = ply_mut(&mut next, index)?;
                ply.set_draw_offer(!ply.draw_offer());
                Ok(Commit {
                    history: next,
                    action: ReversibleAction::ToggleDrawOffer { index },
                })
            }
            Intent::SetRecordedTime { index, time } => {
                let mut next = history.clone();
                let ply = ply_mut(&mut next, index)?;
                let previous = ply.recorded_time();
                ply.set_recorded_time(time);
                Ok(Commit {
                    history: next,
                    action: ReversibleAction::SetRecordedTime { index, previous },
                })
            }
            Intent::EditMove { index } => {
                let len = history.len();
                if index >= len {
                    return Err(MutationError::IndexOutOfRange { index, len });
                }
                let mut next = history.clone();
                let replaced = next.truncate(index);
                Ok(Commit {
                    history: next,
                    action: ReversibleAction::ReplaceMoves { index, replaced },
                })
            }
        }
    }

    /// Looks ahead at a move without committing it.
    pub fn plan_move(
        &self,
        history: &PlyHistory,
        from: Square,
        to: Square,
    ) -> Result<MovePlan, MutationError> {
        let state = history.current_state(self.rules)?;
        let auto_skip = self.rules.is_opponent_piece(&state, from);
        let move_state = if auto_skip {
            self.rules.skip_turn(&state)?
        } else {
            state
        };
        Ok(MovePlan {
            auto_skip,
            needs_promotion: self.rules.is_promotion(&move_state, from, to),
        })
    }

    fn skip_turn(&self, history: &PlyHistory) -> Result<Commit, MutationError> {
        let state = history.current_state(self.rules)?;
        let mut next = history.clone();
        next.append(Ply::skip(state, history.len()))?;
        Ok(Commit {
            history: next,
            action: ReversibleAction::AppendPlies { count: 1 },
        })
    }

    fn play_move(
        &self,
        history: &PlyHistory,
        from: Square,
        to: Square,
        promotion: Option<PieceType>,
    ) -> Result<Commit, MutationError> {
        let mut next = history.clone();
        let mut move_state = history.current_state(self.rules)?;
        let mut count = 0;

        if self.rules.is_opponent_piece(&move_state, from) {
            tracing::debug!(%from, player = %next.next_player(), "opponent piece touched, skipping turn");
            let skipped = self.rules.skip_turn(&move_state)?;
            next.append(Ply::skip(move_state, next.len()))?;
            move_state = skipped;
            count += 1;
        }

        if promotion.is_none() && self.rules.is_promotion(&move_state, from, to) {
            return Err(MutationError::MissingPromotionChoice { from, to });
        }

        self.rules
            .apply_move(&move_state, from, to, promotion)
            .inspect_err(|e| tracing::debug!(error = %e, "move rejected"))?;
        let notation = self.rules.notation(&move_state, from, to, promotion)?;

        let ply_index = next.len();
        next.append(Ply::Move(MovePly {
            starting_state: move_state,
            from,
            to,
            promotion,
            player: Color::for_ply(ply_index),
            ply_index,
            draw_offer: false,
            recorded_time: None,
            notation,
        }))?;
        count += 1;

        Ok(Commit {
            history: next,
            action: ReversibleAction::AppendPlies { count },
        })
    }
}

fn ply_mut(history: &mut PlyHistory, index: usize) -> Result<&mut Ply, MutationError> {
    let len = history.len();
    history
        .get_mut(index)
        .ok_or(MutationError::IndexOutOfRange { index, len })
}

#[cfg(test)]
mod tests {
    use super::*;
    use scoresheet_rules::StandardRules;

    fn sq(name: &str) -> Square {
        Square::from_algebraic(name).unwrap()
    }

    fn mv(from: &str, to: &str) -> Intent {
        Intent::Move {
            from: sq(from),
            to: sq(to),
            promotion: None,
        }
    }

    fn play(history: &PlyHistory, intents: Vec<Intent>) -> PlyHistory {
        let engine = MutationEngine::new(&StandardRules);
        intents.into_iter().fold(history.clone(), |h, intent| {
            engine.apply(&h, intent).unwrap().history
        })
    }

    #[test]
    fn plain_move_appends_one_ply() {
        let engine = MutationEngine::new(&StandardRules);
        let commit = engine.apply(&PlyHistory::new(), mv("e2", "e4")).unwrap();
        assert_eq!(commit.action, ReversibleAction::AppendPlies { count: 1 });
        assert_eq!(commit.history.len(), 1);
        match commit.history.get(0).unwrap() {
            Ply::Move(m) => {
                assert_eq!(m.notation, "e4");
                assert_eq!(m.player, Color::White);
                assert_eq!(m.starting_state, StandardRules.initial_state());
            }
            other => panic!("expected a move ply, got {other:?}"),
        }
    }

    #[test]
    fn illegal_move_leaves_history_alone() {
        let engine = MutationEngine::new(&StandardRules);
        let history = PlyHistory::new();
        let result = engine.apply(&history, mv("e2", "e5"));
        assert!(matches!(
            result,
            Err(MutationError::IllegalMove(Rejected::IllegalMove { .. }))
        ));
        assert!(history.is_empty());
    }

    #[test]
    fn touching_opponent_piece_skips_first() {
        let engine = MutationEngine::new(&StandardRules);
        let history = PlyHistory::new();
        assert_eq!(
            engine.plan_move(&history, sq("e7"), sq("e5")).unwrap(),
            MovePlan {
                auto_skip: true,
                needs_promotion: false
            }
        );

        let commit = engine.apply(&history, mv("e7", "e5")).unwrap();
        assert_eq!(commit.action, ReversibleAction::AppendPlies { count: 2 });
        let plies = commit.history.plies();
        assert!(plies[0].is_skip());
        assert_eq!(plies[0].player(), Color::White);
        assert_eq!(plies[1].player(), Color::Black);
        assert_eq!(
            plies[1].starting_state().as_fen(),
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR b KQkq - 0 1"
        );
        commit.history.verify_chain(&StandardRules).unwrap();
    }

    #[test]
    fn failed_compound_move_commits_nothing() {
        let engine = MutationEngine::new(&StandardRules);
        let history = PlyHistory::new();
        // Black's pawn cannot jump three squares even after White skips.
        assert!(engine.apply(&history, mv("e7", "e4")).is_err());
        assert!(history.is_empty());
    }

    #[test]
    fn promotion_needs_a_choice() {
        let engine = MutationEngine::new(&StandardRules);
        let history = play(
            &PlyHistory::new(),
            vec![
                mv("h2", "h4"),
                mv("g7", "g5"),
                mv("h4", "g5"),
                mv("g8", "f6"),
                mv("g5", "g6"),
                mv("f6", "e4"),
                mv("g6", "g7"),
                mv("e4", "d6"),
            ],
        );
        assert!(
            engine
                .plan_move(&history, sq("g7"), sq("h8"))
                .unwrap()
                .needs_promotion
        );
        assert_eq!(
            engine.apply(&history, mv("g7", "h8")),
            Err(MutationError::MissingPromotionChoice {
                from: sq("g7"),
                to: sq("h8")
            })
        );

        let commit = engine
            .apply(
                &history,
                Intent::Move {
                    from: sq("g7"),
                    to: sq("h8"),
                    promotion: Some(PieceType::Queen),
                },
            )
            .unwrap();
        match commit.history.last().unwrap() {
            Ply::Move(m) => {
                assert_eq!(m.promotion, Some(PieceType::Queen));
                assert_eq!(m.notation, "gxh8=Q");
            }
            other => panic!("expected a move ply, got {other:?}"),
        }
    }

    #[test]
    fn skip_turn_records_current_state() {
        let engine = MutationEngine::new(&StandardRules);
        let history = play(&PlyHistory::new(), vec![mv("e2", "e4")]);
        let commit = engine.apply(&history, Intent::SkipTurn).unwrap();
        let skip = commit.history.last().unwrap();
        assert!(skip.is_skip());
        assert_eq!(skip.player(), Color::Black);
        assert_eq!(
            skip.starting_state(),
            &history.current_state(&StandardRules).unwrap()
        );
        assert_eq!(
            commit.history.current_state(&StandardRules).unwrap().as_fen(),
            "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR w KQkq - 0 2"
        );
    }

    #[test]
    fn toggle_draw_and_set_time() {
        let engine = MutationEngine::new(&StandardRules);
        let history = play(&PlyHistory::new(), vec![mv("d2", "d4"), mv("d7", "d5")]);

        let commit = engine
            .apply(&history, Intent::ToggleDrawOffer { index: 1 })
            .unwrap();
        assert!(commit.history.get(1).unwrap().draw_offer());
        assert_eq!(commit.action, ReversibleAction::ToggleDrawOffer { index: 1 });

        let time = RecordedTime::new(0, 7);
        let commit = engine
            .apply(&history, Intent::SetRecordedTime { index: 0, time })
            .unwrap();
        assert_eq!(commit.history.get(0).unwrap().recorded_time(), time);
        assert_eq!(
            commit.action,
            ReversibleAction::SetRecordedTime {
                index: 0,
                previous: None
            }
        );
    }

    #[test]
    fn out_of_range_indices() {
        let engine = MutationEngine::new(&StandardRules);
        let history = play(&PlyHistory::new(), vec![mv("d2", "d4")]);
        for intent in [
            Intent::ToggleDrawOffer { index: 1 },
            Intent::SetRecordedTime {
                index: 3,
                time: None,
            },
            Intent::EditMove { index: 1 },
        ] {
            assert!(matches!(
                engine.apply(&history, intent),
                Err(MutationError::IndexOutOfRange { len: 1, .. })
            ));
        }
    }

    #[test]
    fn edit_truncates_and_keeps_suffix() {
        let engine = MutationEngine::new(&StandardRules);
        let history = play(
            &PlyHistory::new(),
            vec![mv("e2", "e4"), mv("e7", "e5"), mv("g1", "f3")],
        );
        let commit = engine
            .apply(&history, Intent::EditMove { index: 1 })
            .unwrap();
        assert_eq!(commit.history.len(), 1);
        match &commit.action {
            ReversibleAction::ReplaceMoves { index, replaced } => {
                assert_eq!(*index, 1);
                assert_eq!(replaced.as_slice(), &history.plies()[1..]);
            }
            other => panic!("expected ReplaceMoves, got {other:?}"),
        }

        // Play continues from the edited ply.
        let commit = engine.apply(&commit.history, mv("c7", "c5")).unwrap();
        assert_eq!(commit.history.last().unwrap().ply_index(), 1);
    }
}
