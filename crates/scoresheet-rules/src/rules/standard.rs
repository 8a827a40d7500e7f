//! Standard chess rules backed by `shakmaty`.

use super::{exposed, Rejected, RulesEngine};
use crate::BoardPositions;
use scoresheet_core::{BoardState, Color, Piece, PieceType, Square};
use shakmaty::fen::{Fen, LossyFenError};
use shakmaty::san::SanPlus;
use shakmaty::uci::UciMove;
use shakmaty::{
    Board, CastlingMode, Chess, EnPassantMode, Move, Position, PositionError, PositionErrorKinds,
    Role, Setup,
};

/// Standard chess rules (FIDE).
///
/// Tokens are FEN strings. The en passant square is always written after a
/// double push, whether or not a capture is available.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardRules;

/// A token read for play.
enum Playable {
    Legal(Chess),
    /// The side not to move is in check, left there by a skipped reply.
    Exposed(Setup),
}

impl StandardRules {
    /// Reads a token as a playable position.
    ///
    /// Impossible-check and stale en passant squares are tolerated because
    /// skipped turns can produce them. So is a king of the side not to move
    /// left in check; moves from such a state only have to keep the mover's
    /// own king safe.
    fn playable(state: &BoardState) -> Result<Playable, Rejected> {
        let fen = Self::fen(state)?;
        let setup = fen.as_setup().clone();
        let read = fen
            .into_position::<Chess>(CastlingMode::Standard)
            .or_else(PositionError::ignore_invalid_ep_square)
            .or_else(PositionError::ignore_invalid_castling_rights)
            .or_else(PositionError::ignore_impossible_check);
        match read {
            Ok(position) => Ok(Playable::Legal(position)),
            Err(e) if e.kinds() == PositionErrorKinds::OPPOSITE_CHECK => {
                tracing::debug!(state = %state, "side not to move is in check");
                Ok(Playable::Exposed(setup))
            }
            Err(e) => Err(Rejected::InvalidState(e.to_string())),
        }
    }

    /// Reads a token as a bare setup, without any legality checks.
    fn setup(state: &BoardState) -> Result<Setup, Rejected> {
        Self::fen(state).map(Fen::into_setup)
    }

    fn fen(state: &BoardState) -> Result<Fen, Rejected> {
        Fen::from_ascii(state.as_fen().as_bytes())
            .map_err(|e| Rejected::InvalidState(format!("{}: {:?}", e, state.as_fen())))
    }

    fn encode(position: &Chess) -> BoardState {
        BoardState::from_fen(Fen::from_position(position, EnPassantMode::Always).to_string())
    }

    fn promotes(position: &Chess, from: Square, to: Square) -> bool {
        let (from, to) = (to_sk_square(from), to_sk_square(to));
        position
            .legal_moves()
            .iter()
            .any(|m| m.from() == Some(from) && m.to() == to && m.promotion().is_some())
    }

    /// Checks the piece on `from` and the promotion choice.
    fn check_request(
        board: &Board,
        turn: shakmaty::Color,
        from: Square,
        to: Square,
        promotion: Option<PieceType>,
        promotes: bool,
    ) -> Result<(), Rejected> {
        let piece = board
            .piece_at(to_sk_square(from))
            .ok_or(Rejected::EmptySquare(from))?;
        if piece.color != turn {
            return Err(Rejected::NotToMove {
                square: from,
                owner: from_sk_color(piece.color),
            });
        }

        if let Some(kind) = promotion {
            if !kind.is_promotion_target() {
                return Err(Rejected::InvalidPromotionPiece(kind));
            }
        }
        match (promotes, promotion) {
            (true, None) => Err(Rejected::MissingPromotion { from, to }),
            (false, Some(_)) => Err(Rejected::UnexpectedPromotion { from, to }),
            _ => Ok(()),
        }
    }

    /// Validates the request and resolves it to a legal move.
    fn resolve(
        position: &Chess,
        from: Square,
        to: Square,
        promotion: Option<PieceType>,
    ) -> Result<Move, Rejected> {
        Self::check_request(
            position.board(),
            position.turn(),
            from,
            to,
            promotion,
            Self::promotes(position, from, to),
        )?;

        UciMove::Normal {
            from: to_sk_square(from),
            to: to_sk_square(to),
            promotion: promotion.map(to_role),
        }
        .to_move(position)
        .map_err(|_| Rejected::IllegalMove { from, to })
    }

    /// Plays a move from a state where the side not to move is in check.
    fn play_exposed(
        setup: &Setup,
        from: Square,
        to: Square,
        promotion: Option<PieceType>,
    ) -> Result<Chess, Rejected> {
        let (sk_from, sk_to) = (to_sk_square(from), to_sk_square(to));
        Self::check_request(
            &setup.board,
            setup.turn,
            from,
            to,
            promotion,
            exposed::promotes(setup, sk_from, sk_to),
        )?;
        exposed::play(setup, sk_from, sk_to, promotion.map(to_role))
            .ok_or(Rejected::IllegalMove { from, to })
    }
}

impl RulesEngine for StandardRules {
    fn initial_state(&self) -> BoardState {
        Self::encode(&Chess::default())
    }

    fn board_positions(&self, state: &BoardState) -> BoardPositions {
        let mut board = BoardPositions::empty();
        match Self::setup(state) {
            Ok(setup) => {
                for (square, piece) in &setup.board {
                    board.set(from_sk_square(square), Some(from_sk_piece(piece)));
                }
            }
            Err(e) => tracing::warn!(error = %e, "cannot derive board from state"),
        }
        board
    }

    fn apply_move(
        &self,
        state: &BoardState,
        from: Square,
        to: Square,
        promotion: Option<PieceType>,
    ) -> Result<BoardState, Rejected> {
        let after = match Self::playable(state)? {
            Playable::Legal(mut position) => {
                let m = Self::resolve(&position, from, to, promotion)?;
                position.play_unchecked(m);
                position
            }
            Playable::Exposed(setup) => Self::play_exposed(&setup, from, to, promotion)?,
        };
        Ok(Self::encode(&after))
    }

    fn skip_turn(&self, state: &BoardState) -> Result<BoardState, Rejected> {
        let mut setup = Self::setup(state)?;
        if setup.turn.is_black() {
            setup.fullmoves = setup.fullmoves.saturating_add(1);
        }
        setup.turn = !setup.turn;
        setup.ep_square = None;
        let fen = Fen::try_from(setup).unwrap_or_else(LossyFenError::ignore);
        Ok(BoardState::from_fen(fen.to_string()))
    }

    fn is_promotion(&self, state: &BoardState, from: Square, to: Square) -> bool {
        match Self::playable(state) {
            Ok(Playable::Legal(position)) => Self::promotes(&position, from, to),
            Ok(Playable::Exposed(setup)) => {
                exposed::promotes(&setup, to_sk_square(from), to_sk_square(to))
            }
            Err(_) => false,
        }
    }

    fn is_opponent_piece(&self, state: &BoardState, square: Square) -> bool {
        match Self::setup(state) {
            Ok(setup) => setup
                .board
                .piece_at(to_sk_square(square))
                .is_some_and(|piece| piece.color != setup.turn),
            Err(_) => false,
        }
    }

    fn notation(
        &self,
        state: &BoardState,
        from: Square,
        to: Square,
        promotion: Option<PieceType>,
    ) -> Result<String, Rejected> {
        match Self::playable(state)? {
            Playable::Legal(position) => {
                let m = Self::resolve(&position, from, to, promotion)?;
                Ok(SanPlus::from_move(position, m).to_string())
            }
            Playable::Exposed(setup) => {
                let after = Self::play_exposed(&setup, from, to, promotion)?;
                Ok(exposed::san(
                    &setup,
                    to_sk_square(from),
                    to_sk_square(to),
                    promotion.map(to_role),
                    &after,
                ))
            }
        }
    }

    fn side_to_move(&self, state: &BoardState) -> Option<Color> {
        Self::setup(state).ok().map(|setup| from_sk_color(setup.turn))
    }
}

fn to_sk_square(square: Square) -> shakmaty::Square {
    shakmaty::Square::new(u32::from(square.index()))
}

fn from_sk_square(square: shakmaty::Square) -> Square {
    // Both sides index a1 = 0 .. h8 = 63.
    Square::from_index(square.to_u32() as u8).unwrap_or(Square::A1)
}

fn from_sk_color(color: shakmaty::Color) -> Color {
    match color {
        shakmaty::Color::White => Color::White,
        shakmaty::Color::Black => Color::Black,
    }
}

fn to_role(kind: PieceType) -> Role {
    match kind {
        PieceType::Pawn => Role::Pawn,
        PieceType::Knight => Role::Knight,
        PieceType::Bishop => Role::Bishop,
        PieceType::Rook => Role::Rook,
        PieceType::Queen => Role::Queen,
        PieceType::King => Role::King,
    }
}

fn from_role(role: Role) -> PieceType {
    match role {
        Role::Pawn => PieceType::Pawn,
        Role::Knight => PieceType::Knight,
        Role::Bishop => PieceType::Bishop,
        Role::Rook => PieceType::Rook,
        Role::Queen => PieceType::Queen,
        Role::King => PieceType::King,
    }
}

fn from_sk_piece(piece: shakmaty::Piece) -> Piece {
    Piece::new(from_role(piece.role), from_sk_color(piece.color))
}
