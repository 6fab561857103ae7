pub mod core;
pub mod game;
pub mod utils;

// module re-exports
pub use core::board::{Board, Snapshot};
pub use core::definitions::{
    preferred_notation, set_preferred_notation, CastlingSide, GameStatus, ImplicitMove,
    NotationType, PieceMoved,
};
pub use core::moves::{CheckSuffix, Move, MoveKind};
pub use core::piece::{Piece, PieceId, PieceType, Side};
pub use core::tile::{Offset, Tile};
pub use core::validator::MovementValidator;
pub use game::{Game, GameError};

#[cfg(test)]
mod tests;
