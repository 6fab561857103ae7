use std::fmt::Display;
use std::sync::atomic::{AtomicU8, Ordering};

use serde::{Deserialize, Serialize};

use crate::core::piece::{PieceId, PieceType};
use crate::core::tile::Tile;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CastlingSide {
    KingSide = 0x07,
    QueenSide = 0x00,
}

impl CastlingSide {
    pub const BOTH: [CastlingSide; 2] = [CastlingSide::KingSide, CastlingSide::QueenSide];

    pub fn rook_column(self) -> u8 {
        self as u8
    }

    pub fn king_target_column(self) -> u8 {
        match self {
            CastlingSide::KingSide => 6,
            CastlingSide::QueenSide => 2,
        }
    }

    pub fn rook_target_column(self) -> u8 {
        match self {
            CastlingSide::KingSide => 5,
            CastlingSide::QueenSide => 3,
        }
    }
}

/// Status of the side to move. Derived from the board on every query.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameStatus {
    InProgress,
    Check,
    Checkmate,
    Stalemate,
}

impl GameStatus {
    pub fn is_finished(self) -> bool {
        matches!(self, GameStatus::Checkmate | GameStatus::Stalemate)
    }
}

impl Display for GameStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(match self {
            GameStatus::InProgress => "InProgress",
            GameStatus::Check => "Check",
            GameStatus::Checkmate => "Checkmate",
            GameStatus::Stalemate => "Stalemate",
        })
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NotationType {
    /** Short algebraic, `Nbd7`, `exd6`, `e8=Q#`. */
    #[default]
    Algebraic = 0,
    /** Origin and destination spelled out, `Nb8-d7`, `e5xd6`. */
    LongAlgebraic = 1,
    /** Bare coordinates, `b8d7`, `e7e8q`. */
    Coordinate = 2,
}

static PREFERRED_NOTATION: AtomicU8 = AtomicU8::new(NotationType::Algebraic as u8);

/// Selects the notation `Move`'s `Display` renders in, for the whole process.
pub fn set_preferred_notation(notation: NotationType) {
    PREFERRED_NOTATION.store(notation as u8, Ordering::Relaxed);
}

pub fn preferred_notation() -> NotationType {
    match PREFERRED_NOTATION.load(Ordering::Relaxed) {
        1 => NotationType::LongAlgebraic,
        2 => NotationType::Coordinate,
        _ => NotationType::Algebraic,
    }
}

/// A move whose promotion piece is supplied by the caller after the move
/// has been produced but before it is applied.
pub trait ImplicitMove {
    fn promotion(&self) -> bool;
    fn set_promotion_type(&mut self, kind: PieceType);
}

/// Delivered to the board's piece-moved handler after every applied move.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PieceMoved {
    pub piece: PieceId,
    pub from: Tile,
    pub to: Tile,
    /** Piece that left the board because of this move, if any. */
    pub captured: Option<PieceId>,
}
