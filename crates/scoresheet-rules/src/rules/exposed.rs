//! Moves from positions where the side not to move is in check.
//!
//! A skipped reply to a check leaves the checked king standing while the
//! other side moves. `shakmaty` refuses such a position, so moves from it
//! are checked here against the mover's own king only. The position after
//! the move is an ordinary one again and goes back through `shakmaty`.

use shakmaty::attacks;
use shakmaty::{
    Bitboard, CastlingMode, Chess, File, FromSetup, Piece, Position, PositionError, Rank, Role,
    Setup, Square,
};

/// How a piece gets from one square to another.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    Step,
    DoublePush,
    EnPassant { captured: Square },
    Castle { rook: Square },
}

fn forward(setup: &Setup) -> i32 {
    setup.turn.fold_wb(8, -8)
}

fn attacked(setup: &Setup, square: Square, occupied: Bitboard) -> bool {
    setup
        .board
        .attacks_to(square, !setup.turn, occupied)
        .any()
}

fn pawn_shape(setup: &Setup, from: Square, to: Square) -> Option<Shape> {
    let board = &setup.board;
    let occupied = board.occupied();
    let step = from.offset(forward(setup))?;

    if to == step && !occupied.contains(to) {
        return Some(Shape::Step);
    }
    if from.rank() == setup.turn.relative_rank(Rank::Second)
        && !occupied.contains(step)
        && step.offset(forward(setup)) == Some(to)
        && !occupied.contains(to)
    {
        return Some(Shape::DoublePush);
    }
    if !attacks::pawn_attacks(setup.turn, from).contains(to) {
        return None;
    }
    if board.color_at(to) == Some(!setup.turn) {
        return Some(Shape::Step);
    }
    let captured = to.offset(-forward(setup))?;
    (setup.ep_square == Some(to) && board.piece_at(captured) == Some((!setup.turn).pawn()))
        .then_some(Shape::EnPassant { captured })
}

fn castle_shape(setup: &Setup, from: Square, to: Square) -> Option<Shape> {
    let backrank = setup.turn.backrank();
    if from != Square::from_coords(File::E, backrank) || to.rank() != backrank {
        return None;
    }
    let rook = match to.file() {
        File::G => Square::from_coords(File::H, backrank),
        File::C => Square::from_coords(File::A, backrank),
        _ => return None,
    };
    let board = &setup.board;
    if !setup.castling_rights.contains(rook) || board.piece_at(rook) != Some(setup.turn.rook()) {
        return None;
    }
    let occupied = board.occupied();
    if attacks::between(from, rook).intersects(occupied) {
        return None;
    }
    // The king may not start on, pass through or land on an attacked square.
    let path = attacks::between(from, to).with(from).with(to);
    let occupied = occupied.without(from);
    (!path.into_iter().any(|square| attacked(setup, square, occupied)))
        .then_some(Shape::Castle { rook })
}

fn shape(setup: &Setup, from: Square, to: Square) -> Option<Shape> {
    let board = &setup.board;
    let piece = board.piece_at(from).filter(|p| p.color == setup.turn)?;
    match board.piece_at(to) {
        Some(target) if target.color == setup.turn || target.role == Role::King => return None,
        _ => {}
    }
    match piece.role {
        Role::Pawn => pawn_shape(setup, from, to),
        Role::King if !attacks::king_attacks(from).contains(to) => castle_shape(setup, from, to),
        _ if attacks::attacks(from, piece, board.occupied()).contains(to) => Some(Shape::Step),
        _ => None,
    }
}

fn last_rank(setup: &Setup) -> Rank {
    setup.turn.relative_rank(Rank::Eighth)
}

/// Returns true if `from`→`to` is a pawn move onto the last rank that
/// would keep the mover's king safe.
pub(super) fn promotes(setup: &Setup, from: Square, to: Square) -> bool {
    setup.board.piece_at(from) == Some(setup.turn.pawn())
        && to.rank() == last_rank(setup)
        && play(setup, from, to, Some(Role::Queen)).is_some()
}

/// Plays the move, or returns `None` if the mover may not make it.
pub(super) fn play(
    setup: &Setup,
    from: Square,
    to: Square,
    promotion: Option<Role>,
) -> Option<Chess> {
    let shape = shape(setup, from, to)?;
    let turn = setup.turn;
    let mut next = setup.clone();
    let piece = next.board.remove_piece_at(from)?;

    let placed = match (piece.role, promotion) {
        (Role::Pawn, Some(role)) if to.rank() == last_rank(setup) => Piece { color: turn, role },
        (Role::Pawn, None) if to.rank() == last_rank(setup) => return None,
        (_, Some(_)) => return None,
        (_, None) => piece,
    };

    let took = next.board.remove_piece_at(to).is_some();
    match shape {
        Shape::EnPassant { captured } => next.board.discard_piece_at(captured),
        Shape::Castle { rook } => {
            next.board.discard_piece_at(rook);
            let file = if to.file() == File::G { File::F } else { File::D };
            next.board
                .set_piece_at(Square::from_coords(file, to.rank()), turn.rook());
        }
        Shape::Step | Shape::DoublePush => {}
    }
    next.board.set_piece_at(to, placed);

    if piece.role == Role::King {
        next.castling_rights
            .discard(Bitboard::from_rank(turn.backrank()));
    }
    next.castling_rights.discard(from);
    next.castling_rights.discard(to);
    next.ep_square = match shape {
        Shape::DoublePush => from.offset(forward(setup)),
        _ => None,
    };
    next.halfmoves = if piece.role == Role::Pawn || took {
        0
    } else {
        setup.halfmoves.saturating_add(1)
    };
    if turn.is_black() {
        next.fullmoves = setup.fullmoves.saturating_add(1);
    }
    next.turn = !turn;

    // Refused here if the move left the mover's own king attacked.
    Chess::from_setup(next, CastlingMode::Standard)
        .or_else(PositionError::ignore_invalid_ep_square)
        .or_else(PositionError::ignore_invalid_castling_rights)
        .or_else(PositionError::ignore_impossible_check)
        .ok()
}

/// SAN for a move accepted by [`play`], with `after` the resulting position.
pub(super) fn san(
    setup: &Setup,
    from: Square,
    to: Square,
    promotion: Option<Role>,
    after: &Chess,
) -> String {
    let mut text = String::new();
    let board = &setup.board;
    let role = board.role_at(from).unwrap_or(Role::Pawn);

    match shape(setup, from, to) {
        Some(Shape::Castle { .. }) if to.file() == File::G => text.push_str("O-O"),
        Some(Shape::Castle { .. }) => text.push_str("O-O-O"),
        shape => {
            let capture = board.piece_at(to).is_some()
                || matches!(shape, Some(Shape::EnPassant { .. }));
            if role == Role::Pawn {
                if capture {
                    text.push(from.file().char());
                }
            } else {
                text.push(role.upper_char());
                if role != Role::King {
                    text.push_str(&disambiguation(setup, from, to, role));
                }
            }
            if capture {
                text.push('x');
            }
            text.push_str(&to.to_string());
            if let Some(role) = promotion {
                text.push('=');
                text.push(role.upper_char());
            }
        }
    }

    if after.is_checkmate() {
        text.push('#');
    } else if after.is_check() {
        text.push('+');
    }
    text
}

fn disambiguation(setup: &Setup, from: Square, to: Square, role: Role) -> String {
    let rivals: Vec<Square> = setup
        .board
        .by_piece(Piece {
            color: setup.turn,
            role,
        })
        .without(from)
        .into_iter()
        .filter(|&other| play(setup, other, to, None).is_some())
        .collect();

    if rivals.is_empty() {
        String::new()
    } else if rivals.iter().all(|other| other.file() != from.file()) {
        from.file().char().to_string()
    } else if rivals.iter().all(|other| other.rank() != from.rank()) {
        from.rank().char().to_string()
    } else {
        from.to_string()
    }
}
