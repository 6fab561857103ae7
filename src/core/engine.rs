use crate::core::board::Board;
use crate::core::definitions::CastlingSide;
use crate::core::moves::MoveKind;
use crate::core::piece::{Piece, PieceId, PieceType, Side};
use crate::core::tile::{Offset, Tile};
use crate::core::utils::{between, in_direction, is_in_diagonal_line, is_in_straight_line};

/** Tables directions for pieces */
pub const BISHOP_DIR: &[Offset] = &[
    Offset::new(1, 1),
    Offset::new(1, -1),
    Offset::new(-1, 1),
    Offset::new(-1, -1),
];
pub const ROOK_DIR: &[Offset] = &[
    Offset::new(1, 0),
    Offset::new(0, -1),
    Offset::new(-1, 0),
    Offset::new(0, 1),
];
pub const QUEEN_DIR: &[Offset] = &[
    Offset::new(1, 1),
    Offset::new(1, -1),
    Offset::new(-1, 1),
    Offset::new(-1, -1),
    Offset::new(1, 0),
    Offset::new(0, -1),
    Offset::new(-1, 0),
    Offset::new(0, 1),
];

/** Possible moves for pieces */
pub const KING_MOVES: &[Offset] = QUEEN_DIR;
pub const KNIGHT_MOVES: &[Offset] = &[
    Offset::new(1, 2),
    Offset::new(2, 1),
    Offset::new(2, -1),
    Offset::new(1, -2),
    Offset::new(-1, -2),
    Offset::new(-2, -1),
    Offset::new(-2, 1),
    Offset::new(-1, 2),
];

/// A destination produced by a movement pattern, before the own king
/// safety filter.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Candidate {
    pub to: Tile,
    pub kind: MoveKind,
    pub captured: Option<PieceId>,
}

impl Candidate {
    fn quiet(to: Tile) -> Candidate {
        Candidate {
            to,
            kind: MoveKind::Normal,
            captured: None,
        }
    }

    fn capture(to: Tile, target: PieceId) -> Candidate {
        Candidate {
            to,
            kind: MoveKind::Normal,
            captured: Some(target),
        }
    }

    /// Plays the candidate on `board`. Promotions keep the pawn, its new
    /// type can't change whether its own king is attacked.
    pub fn apply_to(&self, board: &mut Board, piece: PieceId) {
        match self.kind {
            MoveKind::Castle(castling_side) => board.castle(piece, castling_side),
            _ => board.move_piece(piece, self.to),
        }
    }
}

/// Destinations `piece` reaches by its movement pattern and the board
/// occupancy, ignoring the safety of its own king.
pub fn pseudo_legal(board: &Board, piece: &Piece) -> Vec<Candidate> {
    match piece.kind() {
        PieceType::Pawn => pawn_moves(board, piece),
        PieceType::Knight => leaper_moves(board, piece, KNIGHT_MOVES),
        PieceType::King => {
            let mut moves = leaper_moves(board, piece, KING_MOVES);
            moves.extend(
                CastlingSide::BOTH
                    .into_iter()
                    .filter_map(|castling_side| castling(board, piece, castling_side).ok()),
            );
            moves
        }
        PieceType::Bishop => slider_moves(board, piece, BISHOP_DIR),
        PieceType::Rook => slider_moves(board, piece, ROOK_DIR),
        PieceType::Queen => slider_moves(board, piece, QUEEN_DIR),
    }
}

fn pawn_moves(board: &Board, pawn: &Piece) -> Vec<Candidate> {
    let mut moves = Vec::with_capacity(4);
    let side = pawn.side();
    let position = pawn.position();
    let promote_or = |to: Tile, kind: MoveKind| {
        if to.row() == side.promotion_row() {
            MoveKind::Promotion(None)
        } else {
            kind
        }
    };
    // push
    let Some(front) = position.shift(Offset::new(side.forward(), 0)) else {
        return moves;
    };
    if board[front].is_none() {
        moves.push(Candidate {
            kind: promote_or(front, MoveKind::Normal),
            ..Candidate::quiet(front)
        });
        // double push
        if !pawn.has_moved() && position.row() == side.pawn_row() {
            if let Some(far) = front.shift(Offset::new(side.forward(), 0)) {
                if board[far].is_none() {
                    moves.push(Candidate {
                        kind: MoveKind::DoubleStep,
                        ..Candidate::quiet(far)
                    });
                }
            }
        }
    }
    // capture
    for columns in [-1, 1] {
        let Some(target) = position.shift(Offset::new(side.forward(), columns)) else {
            continue;
        };
        match board.get(target) {
            Some(other) if other.side() != side => moves.push(Candidate {
                kind: promote_or(target, MoveKind::Normal),
                ..Candidate::capture(target, other.id())
            }),
            Some(_) => (),
            None => {
                // enpassant
                let victim = position + (target - position).column_only();
                if let Some(other) = board.get(victim) {
                    if other.side() != side
                        && other.kind() == PieceType::Pawn
                        && other.pawn_just_moved_double()
                    {
                        moves.push(Candidate {
                            kind: MoveKind::EnPassant,
                            ..Candidate::capture(target, other.id())
                        });
                    }
                }
            }
        }
    }
    moves
}

fn leaper_moves(board: &Board, piece: &Piece, offsets: &[Offset]) -> Vec<Candidate> {
    offsets
        .iter()
        .filter_map(|offset| piece.position().shift(*offset))
        .filter_map(|to| match board.get(to) {
            None => Some(Candidate::quiet(to)),
            Some(other) if other.side() != piece.side() => {
                Some(Candidate::capture(to, other.id()))
            }
            Some(_) => None,
        })
        .collect()
}

fn slider_moves(board: &Board, piece: &Piece, directions: &[Offset]) -> Vec<Candidate> {
    let mut moves = Vec::with_capacity(14);
    for dir in directions {
        for to in in_direction(piece.position(), *dir) {
            match board.get(to) {
                None => moves.push(Candidate::quiet(to)),
                Some(other) => {
                    if other.side() != piece.side() {
                        moves.push(Candidate::capture(to, other.id()));
                    }
                    break;
                }
            }
        }
    }
    moves
}

/// Checks every castling precondition for `king` towards `castling_side`.
/// The error names the first one that fails.
///
/// Attacked tiles are found by raw reachability, never by full legality,
/// so this never recurses into the own king safety filter.
pub fn castling(
    board: &Board,
    king: &Piece,
    castling_side: CastlingSide,
) -> Result<Candidate, &'static str> {
    debug_assert!(king.kind() == PieceType::King);
    let side = king.side();
    let position = king.position();
    if king.has_moved() {
        return Err("King has already moved");
    }
    if position != Tile::new(side.home_row(), 4) {
        return Err("King is not on its starting tile");
    }
    let rook_tile = Tile::new(position.row(), castling_side.rook_column());
    match board.get(rook_tile) {
        Some(rook)
            if rook.kind() == PieceType::Rook && rook.side() == side && !rook.has_moved() => {}
        Some(rook) if rook.kind() == PieceType::Rook && rook.side() == side => {
            return Err("Rook has already moved")
        }
        _ => return Err("There is no rook to castle with"),
    }
    if between(position, rook_tile).any(|tile| board[tile].is_some()) {
        return Err("Pieces stand between king and rook");
    }
    let target = Tile::new(position.row(), castling_side.king_target_column());
    let opponent = side.opposite();
    if is_attacked(board, position, opponent) {
        return Err("King can't castle out of check");
    }
    if between(position, target)
        .chain([target])
        .any(|tile| is_attacked(board, tile, opponent))
    {
        return Err("King would pass through or land on an attacked tile");
    }
    Ok(Candidate {
        to: target,
        kind: MoveKind::Castle(castling_side),
        captured: None,
    })
}

/// Whether `attacker` hits `target` by its pattern. Pawns attack their two
/// forward diagonals whether or not anything stands there.
pub fn can_attack(board: &Board, attacker: &Piece, target: Tile) -> bool {
    let position = attacker.position();
    if position == target {
        return false;
    }
    let diff = target - position;
    let clear_path = || between(position, target).all(|tile| board[tile].is_none());
    match attacker.kind() {
        PieceType::Pawn => {
            diff.rows == attacker.side().forward() && diff.columns.abs() == 1
        }
        PieceType::Knight => {
            let diff = diff.abs();
            (diff.rows == 1 && diff.columns == 2) || (diff.rows == 2 && diff.columns == 1)
        }
        PieceType::King => diff.rows.abs() <= 1 && diff.columns.abs() <= 1,
        PieceType::Bishop => is_in_diagonal_line(position, target) && clear_path(),
        PieceType::Rook => is_in_straight_line(position, target) && clear_path(),
        PieceType::Queen => {
            (is_in_straight_line(position, target) || is_in_diagonal_line(position, target))
                && clear_path()
        }
    }
}

pub fn is_attacked(board: &Board, tile: Tile, by: Side) -> bool {
    board
        .pieces_of(by)
        .any(|piece| can_attack(board, piece, tile))
}

pub fn attackers(board: &Board, tile: Tile, by: Side) -> Vec<PieceId> {
    board
        .pieces_of(by)
        .filter(|piece| can_attack(board, piece, tile))
        .map(|piece| piece.id())
        .collect()
}
