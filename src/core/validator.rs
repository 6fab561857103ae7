use std::collections::HashMap;

use log::{debug, trace, warn};

use crate::core::board::Board;
use crate::core::definitions::{CastlingSide, GameStatus};
use crate::core::engine::{self, Candidate};
use crate::core::moves::{Disambiguation, Move};
use crate::core::piece::{Piece, PieceId, PieceType, Side};
use crate::core::tile::Tile;
use crate::core::utils::{is_in_diagonal_line, is_in_straight_line};

/// Legal moves per piece for one board generation, plus the advisory
/// reasons for rejected destinations.
#[derive(Debug, Default)]
pub(crate) struct ValidatorCache {
    generation: u64,
    valid: HashMap<PieceId, Vec<Move>>,
    invalid_errors: HashMap<Tile, String>,
}

/// The rules engine, bound to one board.
///
/// Cached legal moves are dropped by [`MovementValidator::reset_cache`] and
/// also whenever the board's generation moves on, so a stale cache is never
/// consulted even if a caller forgets to reset it.
#[derive(Clone, Copy)]
pub struct MovementValidator<'a> {
    board: &'a Board,
}

impl<'a> MovementValidator<'a> {
    pub(crate) fn new(board: &'a Board) -> Self {
        MovementValidator { board }
    }

    pub fn board(&self) -> &'a Board {
        self.board
    }

    /// Legal `Move` taking `piece` to `to`, `None` if the move is illegal.
    /// In that case the reason is recorded under `to`, see
    /// [`MovementValidator::invalid_error`]. Never touches the board.
    pub fn movement(&self, piece: PieceId, to: Tile) -> Option<Move> {
        let found = self
            .get_valid_locations(piece)
            .into_iter()
            .find(|candidate| candidate.to() == to);
        if found.is_none() {
            let reason = self.rejection_reason(self.board.piece(piece), to);
            debug!("{} -> {to} rejected: {reason}", self.board.piece(piece));
            self.board
                .cache
                .borrow_mut()
                .invalid_errors
                .insert(to, reason);
        }
        found
    }

    pub fn is_movement_valid(&self, piece: PieceId, to: Tile) -> bool {
        self.movement(piece, to).is_some()
    }

    /// Every legal move of `piece`, computed once per board generation.
    pub fn get_valid_locations(&self, piece: PieceId) -> Vec<Move> {
        self.sync_generation();
        if let Some(moves) = self.board.cache.borrow().valid.get(&piece) {
            return moves.clone();
        }
        let moves: Vec<Move> = if self.board.is_on_board(piece) {
            let piece = self.board.piece(piece);
            self.legal_candidates(piece)
                .into_iter()
                .map(|candidate| {
                    let disambiguation = self.disambiguation(piece, candidate.to);
                    Move::new(piece, candidate, disambiguation)
                })
                .collect()
        } else {
            Vec::new()
        };
        trace!(
            "Cached {} legal moves for {}",
            moves.len(),
            self.board.piece(piece)
        );
        self.board
            .cache
            .borrow_mut()
            .valid
            .insert(piece, moves.clone());
        moves
    }

    pub fn get_all_legal_moves(&self, side: Side) -> Vec<Move> {
        let ids: Vec<PieceId> = self.board.pieces_of(side).map(Piece::id).collect();
        ids.into_iter()
            .flat_map(|id| self.get_valid_locations(id))
            .collect()
    }

    /// Stops at the first legal move found.
    pub fn has_legal_move(&self, side: Side) -> bool {
        self.board
            .pieces_of(side)
            .any(|piece| !self.legal_candidates(piece).is_empty())
    }

    pub fn reset_cache(&self) {
        let mut cache = self.board.cache.borrow_mut();
        cache.valid.clear();
        cache.invalid_errors.clear();
        cache.generation = self.board.generation();
    }

    /// True if the opponent reaches `side`'s king by any pattern move,
    /// whether or not that move would be legal for the opponent.
    pub fn is_in_check(&self, side: Side) -> bool {
        self.board
            .king(side)
            .map(|king| engine::is_attacked(self.board, king.position(), side.opposite()))
            .unwrap_or(false)
    }

    pub fn is_attacked(&self, tile: Tile, by: Side) -> bool {
        engine::is_attacked(self.board, tile, by)
    }

    pub fn attackers(&self, tile: Tile, by: Side) -> Vec<PieceId> {
        engine::attackers(self.board, tile, by)
    }

    /** Status of the side whose turn it is. */
    pub fn check_game_status(&self) -> GameStatus {
        self.game_status_for(self.board.turn())
    }

    pub fn game_status_for(&self, side: Side) -> GameStatus {
        if self.board.king(side).is_none() {
            warn!("{side} has no king, status is meaningless");
        }
        let in_check = self.is_in_check(side);
        match (in_check, self.has_legal_move(side)) {
            (true, false) => GameStatus::Checkmate,
            (false, false) => GameStatus::Stalemate,
            (true, true) => GameStatus::Check,
            (false, true) => GameStatus::InProgress,
        }
    }

    /// Why the last rejected move to `tile` was rejected. Advisory only.
    pub fn invalid_error(&self, tile: Tile) -> Option<String> {
        self.sync_generation();
        self.board.cache.borrow().invalid_errors.get(&tile).cloned()
    }

    pub fn invalid_errors(&self) -> HashMap<Tile, String> {
        self.sync_generation();
        self.board.cache.borrow().invalid_errors.clone()
    }

    fn sync_generation(&self) {
        let mut cache = self.board.cache.borrow_mut();
        if cache.generation != self.board.generation() {
            cache.valid.clear();
            cache.invalid_errors.clear();
            cache.generation = self.board.generation();
        }
    }

    fn legal_candidates(&self, piece: &Piece) -> Vec<Candidate> {
        engine::pseudo_legal(self.board, piece)
            .into_iter()
            .filter(|candidate| !self.exposes_own_king(piece, candidate))
            .collect()
    }

    /// Plays the candidate on a scratch copy and looks at the mover's king.
    fn exposes_own_king(&self, piece: &Piece, candidate: &Candidate) -> bool {
        let mut scratch = self.board.light_clone();
        candidate.apply_to(&mut scratch, piece.id());
        scratch
            .king(piece.side())
            .map(|king| engine::is_attacked(&scratch, king.position(), piece.side().opposite()))
            .unwrap_or(false)
    }

    /// File first, then rank, then both, against other pieces of the same
    /// type and side that can legally reach `to` as well.
    fn disambiguation(&self, piece: &Piece, to: Tile) -> Disambiguation {
        if matches!(piece.kind(), PieceType::Pawn | PieceType::King) {
            return Disambiguation::None;
        }
        let rivals: Vec<Tile> = self
            .board
            .pieces_of(piece.side())
            .filter(|other| other.id() != piece.id() && other.kind() == piece.kind())
            .filter(|other| {
                self.legal_candidates(other)
                    .iter()
                    .any(|candidate| candidate.to == to)
            })
            .map(Piece::position)
            .collect();
        let from = piece.position();
        if rivals.is_empty() {
            Disambiguation::None
        } else if rivals.iter().all(|rival| rival.column() != from.column()) {
            Disambiguation::File
        } else if rivals.iter().all(|rival| rival.row() != from.row()) {
            Disambiguation::Rank
        } else {
            Disambiguation::Both
        }
    }

    fn rejection_reason(&self, piece: &Piece, to: Tile) -> String {
        let from = piece.position();
        if !self.board.is_on_board(piece.id()) {
            return "Piece is no longer on the board".to_string();
        }
        if from == to {
            return "Piece is already on this tile".to_string();
        }
        let diff = to - from;
        // Two files sideways reads as castling even onto an occupied tile.
        if piece.kind() == PieceType::King && diff.rows == 0 && diff.columns.abs() == 2 {
            let castling_side = if diff.columns > 0 {
                CastlingSide::KingSide
            } else {
                CastlingSide::QueenSide
            };
            if let Err(reason) = engine::castling(self.board, piece, castling_side) {
                return reason.to_string();
            }
        }
        if let Some(other) = self.board.get(to) {
            if other.side() == piece.side() {
                return "Tile is occupied by a friendly piece".to_string();
            }
        }
        if engine::pseudo_legal(self.board, piece)
            .iter()
            .any(|candidate| candidate.to == to)
        {
            return "Move would leave the king in check".to_string();
        }
        match piece.kind() {
            PieceType::Pawn => {
                let forward = piece.side().forward();
                if diff.columns == 0 && diff.rows == 2 * forward {
                    if piece.has_moved() || from.row() != piece.side().pawn_row() {
                        "Pawn can only advance two tiles from its starting rank".to_string()
                    } else {
                        "Pawn is blocked".to_string()
                    }
                } else if diff.columns == 0 && diff.rows == forward {
                    "Pawn is blocked".to_string()
                } else if diff.columns.abs() == 1 && diff.rows == forward {
                    "Pawn can only move diagonally when capturing".to_string()
                } else {
                    "Pawn can't move that way".to_string()
                }
            }
            PieceType::Bishop if is_in_diagonal_line(from, to) => "Path is blocked".to_string(),
            PieceType::Rook if is_in_straight_line(from, to) => "Path is blocked".to_string(),
            PieceType::Queen if is_in_diagonal_line(from, to) || is_in_straight_line(from, to) => {
                "Path is blocked".to_string()
            }
            kind => format!("{kind} can't move that way"),
        }
    }
}
