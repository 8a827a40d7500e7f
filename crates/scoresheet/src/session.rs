//! Recording sessions and the application mode state machine.
//!
//! A [`RecordingSession`] owns one game being recorded: its pairing, ply
//! history, undo log and derived views. [`AppMode`] is the tagged union of
//! screens the application moves through, with one method per transition.
//! Waiting for a promotion piece is a mode of its own, so no other intent
//! can slip in while the choice is open.

use crate::history::{HistoryError, PlyHistory};
use crate::mutation::{Intent, MovePlan, MutationEngine, MutationError};
use crate::storage::{SessionSnapshot, SessionStore};
use crate::undo::UndoController;
use crate::views::DerivedViews;
use chrono::{DateTime, Utc};
use scoresheet_core::{Color, GameInfo, PieceType, RecordedTime, Square};
use scoresheet_rules::{parse_game_info, result_token, ParseError, PgnWriter, RulesEngine, StandardRules};
use thiserror::Error;

/// Errors returned by session operations and mode transitions.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Mutation(#[from] MutationError),

    #[error(transparent)]
    History(#[from] HistoryError),

    #[error("cannot {action} in {mode} mode")]
    WrongMode {
        action: &'static str,
        mode: &'static str,
    },

    #[error("a promotion choice is pending")]
    PromotionPending,
}

/// One game being recorded.
#[derive(Debug, Clone)]
pub struct RecordingSession<R: RulesEngine = StandardRules> {
    rules: R,
    info: GameInfo,
    history: PlyHistory,
    undo: UndoController,
    views: DerivedViews,
    start_time: DateTime<Utc>,
}

impl<R: RulesEngine> RecordingSession<R> {
    /// Starts recording with an empty history.
    pub fn new(rules: R, info: GameInfo, start_time: DateTime<Utc>) -> Result<Self, SessionError> {
        let history = PlyHistory::new();
        let views = DerivedViews::compute(&history, &rules)?;
        Ok(RecordingSession {
            rules,
            info,
            history,
            undo: UndoController::new(),
            views,
            start_time,
        })
    }

    /// Resumes a stored recording. The stored history must replay cleanly.
    pub fn resume(rules: R, info: GameInfo, snapshot: SessionSnapshot) -> Result<Self, SessionError> {
        snapshot.history.verify_chain(&rules)?;
        if snapshot.current_player != snapshot.history.next_player() {
            tracing::warn!(
                stored = %snapshot.current_player,
                derived = %snapshot.history.next_player(),
                "stored current player disagrees with history"
            );
        }
        let views = DerivedViews::compute(&snapshot.history, &rules)?;
        tracing::info!(plies = snapshot.history.len(), "session resumed");
        Ok(RecordingSession {
            rules,
            info,
            history: snapshot.history,
            undo: UndoController::from_actions(snapshot.actions),
            views,
            start_time: snapshot.start_time,
        })
    }

    pub fn info(&self) -> &GameInfo {
        &self.info
    }

    pub fn history(&self) -> &PlyHistory {
        &self.history
    }

    pub fn views(&self) -> &DerivedViews {
        &self.views
    }

    pub fn undo_log(&self) -> &UndoController {
        &self.undo
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    /// Game time elapsed at `now`; the default offered for a time annotation.
    pub fn elapsed(&self, now: DateTime<Utc>) -> RecordedTime {
        RecordedTime::from_elapsed(now - self.start_time)
    }

    pub fn plan_move(&self, from: Square, to: Square) -> Result<MovePlan, SessionError> {
        Ok(MutationEngine::new(&self.rules).plan_move(&self.history, from, to)?)
    }

    /// Applies an intent, recomputes the views and logs its undo action.
    ///
    /// On error nothing changes.
    pub fn commit(&mut self, intent: Intent) -> Result<&DerivedViews, SessionError> {
        let commit = MutationEngine::new(&self.rules).apply(&self.history, intent)?;
        let views = DerivedViews::compute(&commit.history, &self.rules)?;
        tracing::info!(plies = commit.history.len(), action = ?commit.action, "committed");
        self.history = commit.history;
        self.views = views;
        self.undo.push(commit.action);
        Ok(&self.views)
    }

    /// Reverts the last commit. Returns false if nothing changed.
    pub fn undo(&mut self) -> bool {
        match self.undo.undo(&self.history) {
            Some(history) => self.install(history),
            None => false,
        }
    }

    /// Re-applies the last undone commit. Returns false if nothing changed.
    pub fn redo(&mut self) -> bool {
        match self.undo.redo(&self.history) {
            Some(history) => self.install(history),
            None => false,
        }
    }

    fn install(&mut self, history: PlyHistory) -> bool {
        match DerivedViews::compute(&history, &self.rules) {
            Ok(views) => {
                self.history = history;
                self.views = views;
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "reverted history does not replay, keeping current");
                false
            }
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            history: self.history.clone(),
            current_player: self.history.next_player(),
            start_time: self.start_time,
            actions: self.undo.actions().to_vec(),
        }
    }

    pub fn generate_pgn(
        &self,
        winner: Option<Color>,
        writer: &PgnWriter,
    ) -> Result<String, SessionError> {
        Ok(writer.write(&self.info.source_pgn, self.history.plies(), winner)?)
    }
}

/// A move held back until a promotion piece is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingMove {
    pub from: Square,
    pub to: Square,
    /// The move will be preceded by a skipped turn.
    pub auto_skip: bool,
}

/// What happened to a requested move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    Committed,
    AwaitingPromotion,
}

/// The screens of the application.
#[derive(Debug)]
pub enum AppMode<R: RulesEngine = StandardRules> {
    EnterPgn,
    TablePairing {
        pairing: GameInfo,
    },
    Recording(RecordingSession<R>),
    AwaitingPromotion {
        session: RecordingSession<R>,
        pending: PendingMove,
    },
    ResultDisplay {
        pairing: GameInfo,
        winner: Option<Color>,
        pgn: String,
    },
}

impl<R: RulesEngine> Default for AppMode<R> {
    fn default() -> Self {
        AppMode::EnterPgn
    }
}

impl<R: RulesEngine> AppMode<R> {
    pub fn name(&self) -> &'static str {
        match self {
            AppMode::EnterPgn => "enter PGN",
            AppMode::TablePairing { .. } => "table pairing",
            AppMode::Recording(_) => "recording",
            AppMode::AwaitingPromotion { .. } => "awaiting promotion",
            AppMode::ResultDisplay { .. } => "result display",
        }
    }

    /// The session being recorded, if any.
    pub fn session(&self) -> Option<&RecordingSession<R>> {
        match self {
            AppMode::Recording(session) | AppMode::AwaitingPromotion { session, .. } => {
                Some(session)
            }
            _ => None,
        }
    }

    fn recording_mut(&mut self, action: &'static str) -> Result<&mut RecordingSession<R>, SessionError> {
        match self {
            AppMode::Recording(session) => Ok(session),
            AppMode::AwaitingPromotion { .. } => Err(SessionError::PromotionPending),
            other => Err(SessionError::WrongMode {
                action,
                mode: other.name(),
            }),
        }
    }

    fn wrong_mode(&self, action: &'static str) -> SessionError {
        SessionError::WrongMode {
            action,
            mode: self.name(),
        }
    }

    /// Enter PGN → table pairing. A parse error keeps the current mode.
    pub fn load_pgn(&mut self, pgn: &str) -> Result<(), SessionError> {
        if !matches!(self, AppMode::EnterPgn) {
            return Err(self.wrong_mode("load a PGN"));
        }
        let pairing = parse_game_info(pgn)?;
        tracing::info!(event = %pairing.name, board = ?pairing.board, "pairing loaded");
        *self = AppMode::TablePairing { pairing };
        Ok(())
    }

    /// Table pairing → recording, with an empty history.
    pub fn start_recording(&mut self, rules: R, now: DateTime<Utc>) -> Result<(), SessionError> {
        let AppMode::TablePairing { pairing } = self else {
            return Err(self.wrong_mode("start recording"));
        };
        let session = RecordingSession::new(rules, pairing.clone(), now)?;
        tracing::info!(start = %now, "recording started");
        *self = AppMode::Recording(session);
        Ok(())
    }

    /// Table pairing → recording, from a stored snapshot.
    pub fn resume(&mut self, rules: R, snapshot: SessionSnapshot) -> Result<(), SessionError> {
        let AppMode::TablePairing { pairing } = self else {
            return Err(self.wrong_mode("resume recording"));
        };
        let session = RecordingSession::resume(rules, pairing.clone(), snapshot)?;
        *self = AppMode::Recording(session);
        Ok(())
    }

    /// Requests a move. Promotions suspend until [`choose_promotion`](Self::choose_promotion).
    pub fn request_move(&mut self, from: Square, to: Square) -> Result<MoveOutcome, SessionError> {
        let session = self.recording_mut("move")?;
        let plan = session.plan_move(from, to)?;
        if !plan.needs_promotion {
            session.commit(Intent::Move {
                from,
                to,
                promotion: None,
            })?;
            return Ok(MoveOutcome::Committed);
        }

        if let AppMode::Recording(session) = std::mem::take(self) {
            tracing::debug!(%from, %to, "waiting for promotion choice");
            *self = AppMode::AwaitingPromotion {
                session,
                pending: PendingMove {
                    from,
                    to,
                    auto_skip: plan.auto_skip,
                },
            };
        }
        Ok(MoveOutcome::AwaitingPromotion)
    }

    /// Completes a pending promotion. On error the choice stays open.
    pub fn choose_promotion(&mut self, piece: PieceType) -> Result<(), SessionError> {
        let AppMode::AwaitingPromotion { session, pending } = self else {
            return Err(self.wrong_mode("choose a promotion"));
        };
        session.commit(Intent::Move {
            from: pending.from,
            to: pending.to,
            promotion: Some(piece),
        })?;
        self.cancel_promotion()
    }

    /// Drops a pending promotion without committing anything.
    pub fn cancel_promotion(&mut self) -> Result<(), SessionError> {
        if !matches!(self, AppMode::AwaitingPromotion { .. }) {
            return Err(self.wrong_mode("cancel a promotion"));
        }
        if let AppMode::AwaitingPromotion { session, .. } = std::mem::take(self) {
            *self = AppMode::Recording(session);
        }
        Ok(())
    }

    /// Applies any intent while recording.
    pub fn apply(&mut self, intent: Intent) -> Result<(), SessionError> {
        self.recording_mut("edit the history")?.commit(intent)?;
        Ok(())
    }

    pub fn undo(&mut self) -> Result<bool, SessionError> {
        Ok(self.recording_mut("undo")?.undo())
    }

    pub fn redo(&mut self) -> Result<bool, SessionError> {
        Ok(self.recording_mut("redo")?.redo())
    }

    /// Recording → result display.
    ///
    /// The session is stored best-effort; a storage failure is logged and
    /// does not stop the transition.
    pub fn end_game(
        &mut self,
        winner: Option<Color>,
        store: &mut dyn SessionStore,
        writer: &PgnWriter,
    ) -> Result<(), SessionError> {
        let session = self.recording_mut("end the game")?;
        let pgn = session.generate_pgn(winner, writer)?;
        if let Err(e) = store.store_session(&session.snapshot()) {
            tracing::warn!(error = %e, "could not store session");
        }
        let mut pairing = session.info().clone();
        pairing.result = result_token(winner).to_string();
        tracing::info!(result = %pairing.result, plies = session.history().len(), "game ended");
        *self = AppMode::ResultDisplay {
            pairing,
            winner,
            pgn,
        };
        Ok(())
    }

    /// Result display → enter PGN.
    pub fn new_game(&mut self) -> Result<(), SessionError> {
        if !matches!(self, AppMode::ResultDisplay { .. }) {
            return Err(self.wrong_mode("start a new game"));
        }
        *self = AppMode::EnterPgn;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStore, StorageError};
    use crate::undo::ReversibleAction;

    const HEADER: &str = r#"[Event "Club Championship"]
[Site "Hobart"]
[Date "2024.03.09"]
[Round "2.4"]
[White "Lovelace, Ada"]
[Black "Turing, Alan"]
[Result "*"]
"#;

    fn sq(name: &str) -> Square {
        Square::from_algebraic(name).unwrap()
    }

    fn start_time() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-03-09T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn recording() -> AppMode {
        let mut mode = AppMode::default();
        mode.load_pgn(HEADER).unwrap();
        mode.start_recording(StandardRules, start_time()).unwrap();
        mode
    }

    fn play(mode: &mut AppMode, moves: &[(&str, &str)]) {
        for (from, to) in moves {
            assert_eq!(
                mode.request_move(sq(from), sq(to)).unwrap(),
                MoveOutcome::Committed
            );
        }
    }

    struct FailingStore;

    impl SessionStore for FailingStore {
        fn store_session(&mut self, _: &SessionSnapshot) -> Result<(), StorageError> {
            Err(StorageError::Io(std::io::Error::other("disk full")))
        }

        fn load_session(&self) -> Result<Option<SessionSnapshot>, StorageError> {
            Ok(None)
        }
    }

    #[test]
    fn bad_pgn_keeps_enter_pgn() {
        let mut mode: AppMode = AppMode::default();
        assert!(matches!(mode.load_pgn(""), Err(SessionError::Parse(_))));
        assert!(matches!(mode, AppMode::EnterPgn));
    }

    #[test]
    fn full_flow_to_result() {
        let mut mode = recording();
        play(&mut mode, &[("e2", "e4"), ("e7", "e5")]);
        assert_eq!(mode.session().unwrap().views().rows.len(), 1);

        let mut store = MemoryStore::new();
        mode.end_game(Some(Color::White), &mut store, &PgnWriter::default())
            .unwrap();
        match &mode {
            AppMode::ResultDisplay {
                pairing,
                winner,
                pgn,
            } => {
                assert_eq!(pairing.result, "1-0");
                assert_eq!(*winner, Some(Color::White));
                assert!(pgn.contains("1. e4 e5 1-0"));
            }
            other => panic!("expected result display, got {}", other.name()),
        }
        let stored = store.load_session().unwrap().unwrap();
        assert_eq!(stored.history.len(), 2);
        assert_eq!(stored.current_player, Color::White);

        mode.new_game().unwrap();
        assert!(matches!(mode, AppMode::EnterPgn));
    }

    #[test]
    fn storage_failure_does_not_block_end_game() {
        let mut mode = recording();
        play(&mut mode, &[("d2", "d4")]);
        mode.end_game(None, &mut FailingStore, &PgnWriter::default())
            .unwrap();
        assert!(matches!(mode, AppMode::ResultDisplay { winner: None, .. }));
    }

    #[test]
    fn rejected_move_keeps_mode_and_history() {
        let mut mode = recording();
        assert!(matches!(
            mode.request_move(sq("e2"), sq("e5")),
            Err(SessionError::Mutation(MutationError::IllegalMove(_)))
        ));
        assert!(matches!(mode, AppMode::Recording(_)));
        assert!(mode.session().unwrap().history().is_empty());
    }

    #[test]
    fn promotion_suspends_and_blocks_other_intents() {
        let mut mode = recording();
        play(
            &mut mode,
            &[
                ("h2", "h4"),
                ("g7", "g5"),
                ("h4", "g5"),
                ("g8", "f6"),
                ("g5", "g6"),
                ("f6", "e4"),
                ("g6", "g7"),
                ("e4", "d6"),
            ],
        );

        assert_eq!(
            mode.request_move(sq("g7"), sq("h8")).unwrap(),
            MoveOutcome::AwaitingPromotion
        );
        assert!(matches!(
            mode.apply(Intent::SkipTurn),
            Err(SessionError::PromotionPending)
        ));
        assert!(matches!(mode.undo(), Err(SessionError::PromotionPending)));
        assert!(matches!(
            mode.request_move(sq("a2"), sq("a3")),
            Err(SessionError::PromotionPending)
        ));

        // A king is not a valid choice; the promotion stays open.
        assert!(mode.choose_promotion(PieceType::King).is_err());
        assert!(matches!(mode, AppMode::AwaitingPromotion { .. }));

        mode.choose_promotion(PieceType::Knight).unwrap();
        let session = mode.session().unwrap();
        assert_eq!(session.history().len(), 9);
        assert!(matches!(mode, AppMode::Recording(_)));
    }

    #[test]
    fn cancel_promotion_commits_nothing() {
        let mut mode = recording();
        play(
            &mut mode,
            &[
                ("h2", "h4"),
                ("g7", "g5"),
                ("h4", "g5"),
                ("g8", "f6"),
                ("g5", "g6"),
                ("f6", "e4"),
                ("g6", "g7"),
                ("e4", "d6"),
            ],
        );
        mode.request_move(sq("g7"), sq("h8")).unwrap();
        mode.cancel_promotion().unwrap();
        assert_eq!(mode.session().unwrap().history().len(), 8);
        assert!(mode.cancel_promotion().is_err());
    }

    #[test]
    fn undo_and_redo_through_mode() {
        let mut mode = recording();
        play(&mut mode, &[("e2", "e4")]);
        mode.apply(Intent::ToggleDrawOffer { index: 0 }).unwrap();
        assert!(mode.session().unwrap().history().get(0).unwrap().draw_offer());

        assert!(mode.undo().unwrap());
        assert!(!mode.session().unwrap().history().get(0).unwrap().draw_offer());
        assert!(mode.redo().unwrap());
        assert!(mode.session().unwrap().history().get(0).unwrap().draw_offer());
        assert!(!mode.redo().unwrap());
    }

    #[test]
    fn wrong_mode_transitions() {
        let mut mode: AppMode = AppMode::default();
        assert!(matches!(
            mode.start_recording(StandardRules, start_time()),
            Err(SessionError::WrongMode { .. })
        ));
        assert!(matches!(mode.undo(), Err(SessionError::WrongMode { .. })));
        assert!(mode.new_game().is_err());

        let mut mode = recording();
        assert!(mode.load_pgn(HEADER).is_err());
        assert!(mode.choose_promotion(PieceType::Queen).is_err());
    }

    #[test]
    fn resume_from_snapshot() {
        let mut mode = recording();
        play(&mut mode, &[("e2", "e4"), ("c7", "c5")]);
        let snapshot = mode.session().unwrap().snapshot();
        assert_eq!(snapshot.actions.len(), 2);

        let mut resumed: AppMode = AppMode::default();
        resumed.load_pgn(HEADER).unwrap();
        resumed.resume(StandardRules, snapshot).unwrap();
        let session = resumed.session().unwrap();
        assert_eq!(session.history().len(), 2);
        assert_eq!(session.start_time(), start_time());
        assert_eq!(
            session.undo_log().actions(),
            &[
                ReversibleAction::AppendPlies { count: 1 },
                ReversibleAction::AppendPlies { count: 1 }
            ]
        );
    }

    #[test]
    fn resume_rejects_broken_chain() {
        let mut mode = recording();
        play(&mut mode, &[("e2", "e4"), ("c7", "c5")]);
        let mut snapshot = mode.session().unwrap().snapshot();
        let plies: Vec<_> = snapshot.history.plies().iter().rev().cloned().collect();
        // Reversed plies fail alternation before the chain is even checked.
        assert!(PlyHistory::from_plies(plies).is_err());

        let start = StandardRules.initial_state();
        snapshot.history = PlyHistory::from_plies(vec![
            scoresheet_core::Ply::skip(start.clone(), 0),
            scoresheet_core::Ply::skip(start, 1),
        ])
        .unwrap();
        let mut resumed: AppMode = AppMode::default();
        resumed.load_pgn(HEADER).unwrap();
        assert!(matches!(
            resumed.resume(StandardRules, snapshot),
            Err(SessionError::History(_))
        ));
        assert!(matches!(resumed, AppMode::TablePairing { .. }));
    }

    #[test]
    fn resume_with_misplaced_undo_record() {
        let mode = recording();
        let mut snapshot = mode.session().unwrap().snapshot();
        let stray = scoresheet_core::Ply::skip(StandardRules.initial_state(), 3);
        snapshot.actions = vec![
            ReversibleAction::RestorePlies {
                plies: vec![stray.clone()],
            },
            ReversibleAction::ReplaceMoves {
                index: 0,
                replaced: vec![stray],
            },
        ];

        let mut resumed: AppMode = AppMode::default();
        resumed.load_pgn(HEADER).unwrap();
        resumed.resume(StandardRules, snapshot).unwrap();
        assert!(!resumed.undo().unwrap());
        assert!(!resumed.undo().unwrap());
        assert!(!resumed.redo().unwrap());
        let session = resumed.session().unwrap();
        assert!(session.history().is_empty());
        assert!(session.undo_log().actions().is_empty());

        // Recording carries on normally afterwards.
        play(&mut resumed, &[("e2", "e4")]);
        assert_eq!(resumed.session().unwrap().history().len(), 1);
    }

    #[test]
    fn moves_continue_after_skipped_reply_to_check() {
        let mut mode = recording();
        play(&mut mode, &[("e2", "e4"), ("d7", "d5"), ("f1", "b5")]);
        // Black's reply to Bb5+ was missed; White's next move auto-skips it.
        play(&mut mode, &[("g1", "f3")]);
        let history = mode.session().unwrap().history();
        assert_eq!(history.len(), 5);
        assert!(matches!(history.get(3), Some(scoresheet_core::Ply::Skip(_))));
        assert!(matches!(
            history.get(4),
            Some(scoresheet_core::Ply::Move(m)) if m.notation == "Nf3+"
        ));
        play(&mut mode, &[("c7", "c6")]);
        assert_eq!(mode.session().unwrap().views().to_move, Color::White);

        let mut explicit = recording();
        play(&mut explicit, &[("e2", "e4"), ("d7", "d5"), ("f1", "b5")]);
        explicit.apply(Intent::SkipTurn).unwrap();
        play(&mut explicit, &[("b1", "c3")]);
        assert!(matches!(
            explicit.request_move(sq("b5"), sq("e8")),
            Err(SessionError::Mutation(_))
        ));
        assert_eq!(explicit.session().unwrap().history().len(), 5);
    }

    #[test]
    fn elapsed_time_from_start() {
        let mode = recording();
        let now = start_time() + chrono::Duration::minutes(83);
        assert_eq!(
            mode.session().unwrap().elapsed(now),
            RecordedTime { hours: 1, minutes: 23 }
        );
    }
}
