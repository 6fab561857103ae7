use std::{fmt::Display, ops::AddAssign};

use log::debug;

use crate::core::board::Board;
use crate::core::definitions::{ImplicitMove, NotationType};
use crate::core::moves::{CheckSuffix, Move};
use crate::core::piece::PieceType;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PerftResult {
    pub all: usize,
    pub captures: usize,
    pub en_passant: usize,
    pub castles: usize,
    pub promotions: usize,
    pub checks: usize,
    pub checkmates: usize,
}

impl PerftResult {
    pub fn combine(self, other: PerftResult) -> Self {
        PerftResult {
            all: self.all + other.all,
            captures: self.captures + other.captures,
            en_passant: self.en_passant + other.en_passant,
            castles: self.castles + other.castles,
            promotions: self.promotions + other.promotions,
            checks: self.checks + other.checks,
            checkmates: self.checkmates + other.checkmates,
        }
    }
}

impl AddAssign for PerftResult {
    fn add_assign(&mut self, rhs: Self) {
        *self = self.combine(rhs);
    }
}

impl Display for PerftResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} - cp: {:<4} ep: {:<4} cs: {:<4} pr: {:<4} Ch: {:<4} CM: {:4}",
            self.all,
            self.captures,
            self.en_passant,
            self.castles,
            self.promotions,
            self.checks,
            self.checkmates
        )
    }
}

/// Legal moves of the side to move with every promotion choice spelled out,
/// ready to be applied.
pub fn playable_moves(board: &Board) -> Vec<Move> {
    let mut moves = Vec::with_capacity(48);
    for _move in board.validator().get_all_legal_moves(board.turn()) {
        if _move.promotion() {
            moves.extend(
                PieceType::PROMOTION_CHOICES
                    .into_iter()
                    .map(|kind| _move.clone().with_promotion(kind)),
            );
        } else {
            moves.push(_move);
        }
    }
    moves
}

/// Plays `_move` on a scratch copy of `board` and hands the turn over.
/// Returns the new position and the move with its check suffix.
pub fn play_on_copy(board: &Board, _move: &Move) -> (Board, Move) {
    let mut next = board.light_clone();
    let mut _move = _move.clone();
    _move.do_move(&mut next);
    _move.append_check_notation(&next);
    next.switch_turn();
    (next, _move)
}

fn count_move(_move: &Move) -> PerftResult {
    let mut result = PerftResult {
        all: 1,
        ..Default::default()
    };
    if _move.is_capture() {
        result.captures += 1;
    }
    if _move.is_en_passant() {
        result.en_passant += 1;
    }
    if _move.is_castle() {
        result.castles += 1;
    }
    if _move.promotion_type().is_some() {
        result.promotions += 1;
    }
    match _move.suffix() {
        CheckSuffix::None => (),
        CheckSuffix::Check => result.checks += 1,
        CheckSuffix::Checkmate => {
            result.checks += 1;
            result.checkmates += 1;
        }
    }
    result
}

/// Counts the leaf nodes `depth` plies below `board`. Move details are
/// tallied for the last ply only.
pub fn perft(board: &Board, depth: usize) -> PerftResult {
    if depth == 0 {
        return PerftResult {
            all: 1,
            ..Default::default()
        };
    }
    playable_moves(board)
        .iter()
        .map(|_move| {
            let (next, played) = play_on_copy(board, _move);
            if depth == 1 {
                count_move(&played)
            } else {
                perft(&next, depth - 1)
            }
        })
        .fold(PerftResult::default(), PerftResult::combine)
}

/// Per root move breakdown of [`perft`].
pub fn divide(board: &Board, depth: usize) -> Vec<(Move, PerftResult)> {
    assert!(depth > 0, "Can't divide at depth zero!");
    playable_moves(board)
        .iter()
        .map(|_move| {
            let (next, played) = play_on_copy(board, _move);
            let result = if depth == 1 {
                count_move(&played)
            } else {
                perft(&next, depth - 1)
            };
            (played, result)
        })
        .collect()
}

pub fn perf_test(
    fen_string: &str,
    depth: usize,
    expected: usize,
    detailed: bool,
) -> anyhow::Result<bool> {
    let board = Board::from_fen(fen_string)?;
    debug!("Perft setup: | {fen_string} | depth: {depth} detailed: {detailed}");
    let total = if detailed && depth > 0 {
        let mut total = PerftResult::default();
        for (_move, result) in divide(&board, depth) {
            println!(" {} : {result}", _move.notation(NotationType::Coordinate));
            total += result;
        }
        println!("+ total: {total}");
        total
    } else {
        perft(&board, depth)
    };
    debug!("Perft details: {total}");
    Ok(total.all == expected)
}
