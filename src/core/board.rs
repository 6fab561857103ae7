use std::cell::RefCell;
use std::fmt::{Debug, Display};
use std::ops::Index;

use log::{debug, trace};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, Bytes};

use crate::core::definitions::{CastlingSide, PieceMoved};
use crate::core::moves::Move;
use crate::core::piece::{Piece, PieceId, PieceType, Side, CODE_BLACK};
use crate::core::tile::{Offset, Tile};
use crate::core::validator::{MovementValidator, ValidatorCache};

pub type PieceMovedHandler = Box<dyn FnMut(&mut Board, &PieceMoved)>;

const BACK_RANK: [PieceType; 8] = [
    PieceType::Rook,
    PieceType::Knight,
    PieceType::Bishop,
    PieceType::Queen,
    PieceType::King,
    PieceType::Bishop,
    PieceType::Knight,
    PieceType::Rook,
];

/// Authoritative game state: the grid, the pieces, whose turn it is and
/// the log of applied moves.
///
/// The board executes moves blindly, legality is the job of the
/// [`MovementValidator`] obtained through [`Board::validator`]. Turn
/// advancement is not automatic either: it happens in the piece-moved
/// handler, see [`Board::set_piece_moved_handler`].
pub struct Board {
    cells: [Option<PieceId>; 64],
    pieces: Vec<Piece>,
    turn: Side,
    moves: Vec<Move>,
    generation: u64,
    pub(crate) cache: RefCell<ValidatorCache>,
    on_piece_moved: Option<PieceMovedHandler>,
}

impl Board {
    /** Board with the standard starting position. */
    pub fn new() -> Board {
        let mut board = Board::empty();
        board.reset();
        board
    }

    /** Board without pieces, White to move. */
    pub fn empty() -> Board {
        Board {
            cells: [None; 64],
            pieces: Vec::with_capacity(32),
            turn: Side::White,
            moves: Vec::new(),
            generation: 0,
            cache: RefCell::default(),
            on_piece_moved: None,
        }
    }

    /// Clears the whole grid and sets up the starting position again.
    /// White moves first and the move log is emptied. The piece-moved
    /// handler stays registered.
    pub fn reset(&mut self) {
        self.cells = [None; 64];
        self.pieces.clear();
        for (column, kind) in BACK_RANK.into_iter().enumerate() {
            let column = column as u8;
            self.place(kind, Side::White, Tile::new(0, column));
            self.place(kind, Side::Black, Tile::new(7, column));
        }
        for column in 0..8 {
            self.place(PieceType::Pawn, Side::White, Tile::new(1, column));
            self.place(PieceType::Pawn, Side::Black, Tile::new(6, column));
        }
        self.turn = Side::White;
        self.moves.clear();
        self.invalidate();
        debug!("Board reset to the starting position");
    }

    /// Puts a new piece on an empty tile. Used for position setup.
    pub fn place(&mut self, kind: PieceType, side: Side, tile: Tile) -> PieceId {
        assert!(
            self.cells[tile.index()].is_none(),
            "Trying to place a piece on busy tile {tile}!"
        );
        let id = PieceId::new(self.pieces.len());
        self.pieces.push(Piece::new(id, kind, side, tile));
        self.cells[tile.index()] = Some(id);
        self.invalidate();
        id
    }

    pub fn turn(&self) -> Side {
        self.turn
    }

    pub fn set_turn(&mut self, side: Side) {
        self.turn = side;
        self.invalidate();
    }

    pub fn switch_turn(&mut self) {
        self.turn = self.turn.opposite();
        trace!("{} to move", self.turn);
    }

    /** Applied moves, oldest first. */
    pub fn moves(&self) -> &[Move] {
        &self.moves
    }

    pub fn last_move(&self) -> Option<&Move> {
        self.moves.last()
    }

    pub fn record_move(&mut self, applied: Move) -> &Move {
        self.moves.push(applied);
        &self.moves[self.moves.len() - 1]
    }

    /// Bumped by every arrangement change. Cached legal moves are only
    /// trusted for the generation they were computed in.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn validator(&self) -> MovementValidator<'_> {
        MovementValidator::new(self)
    }

    /// Registers the callback invoked after every applied move, replacing
    /// the previous one. The handler gets the board back mutably so it can
    /// reset the validator cache and switch the turn.
    pub fn set_piece_moved_handler<F>(&mut self, handler: F)
    where
        F: FnMut(&mut Board, &PieceMoved) + 'static,
    {
        self.on_piece_moved = Some(Box::new(handler));
    }

    pub fn clear_piece_moved_handler(&mut self) {
        self.on_piece_moved = None;
    }

    pub fn get(&self, tile: Tile) -> Option<&Piece> {
        self.cells[tile.index()].map(|id| &self.pieces[id.index()])
    }

    /** Panics when the coordinate is outside the board. */
    pub fn at(&self, row: u8, column: u8) -> Option<&Piece> {
        self.get(Tile::new(row, column))
    }

    /// Any piece ever placed on this board, captured ones included.
    pub fn piece(&self, id: PieceId) -> &Piece {
        &self.pieces[id.index()]
    }

    pub fn is_on_board(&self, id: PieceId) -> bool {
        self.cells[self.piece(id).position().index()] == Some(id)
    }

    /// Pieces on the board in row-major order. The order carries no meaning.
    pub fn pieces(&self) -> impl Iterator<Item = &Piece> + '_ {
        self.cells
            .iter()
            .flatten()
            .map(|id| &self.pieces[id.index()])
    }

    pub fn pieces_of(&self, side: Side) -> impl Iterator<Item = &Piece> + '_ {
        self.pieces().filter(move |piece| piece.side() == side)
    }

    pub fn king(&self, side: Side) -> Option<&Piece> {
        self.pieces_of(side)
            .find(|piece| piece.kind() == PieceType::King)
    }

    /// The sole mutation primitive. Does not check legality.
    ///
    /// A pawn stepping diagonally onto an empty tile captures en passant:
    /// the pawn beside its origin, on the destination column, is removed.
    pub fn move_piece(&mut self, id: PieceId, to: Tile) {
        let from = self.piece(id).position();
        let captured = self.relocate(id, to);
        self.finish_move(id, from, to, captured);
    }

    /** Resolves the piece standing on `from` and moves it. */
    pub fn move_piece_from(&mut self, from: Tile, to: Tile) {
        let id = self.cells[from.index()]
            .unwrap_or_else(|| panic!("There is no piece on {from} to move!"));
        self.move_piece(id, to);
    }

    /// Moves king and rook together, notifying once. Both end up marked as
    /// moved.
    pub fn castle(&mut self, king: PieceId, castling_side: CastlingSide) {
        let from = self.piece(king).position();
        assert!(
            self.piece(king).kind() == PieceType::King,
            "Trying to castle without king?!"
        );
        let row = from.row();
        let rook_tile = Tile::new(row, castling_side.rook_column());
        let rook = self.cells[rook_tile.index()]
            .unwrap_or_else(|| panic!("There is no rook on {rook_tile} to castle with!"));
        assert!(
            self.piece(rook).kind() == PieceType::Rook,
            "Non-rook piece used for castling!"
        );
        let king_to = Tile::new(row, castling_side.king_target_column());
        let rook_to = Tile::new(row, castling_side.rook_target_column());
        // Lift both before landing either.
        self.cells[from.index()] = None;
        self.cells[rook_tile.index()] = None;
        assert!(
            self.cells[king_to.index()].is_none() && self.cells[rook_to.index()].is_none(),
            "There is something in way of castling!"
        );
        self.cells[king_to.index()] = Some(king);
        self.cells[rook_to.index()] = Some(rook);
        self.pieces[king.index()].set_position(king_to);
        self.pieces[rook.index()].set_position(rook_to);
        self.finish_move(king, from, king_to, None);
    }

    /// Moves a pawn onto the last rank and turns it into `kind` before
    /// anyone is notified.
    pub fn promote(&mut self, id: PieceId, to: Tile, kind: PieceType) {
        let from = self.piece(id).position();
        let captured = self.relocate(id, to);
        self.pieces[id.index()].promote(kind);
        self.finish_move(id, from, to, captured);
    }

    /// Copy of the arrangement and turn, without move log, cache or
    /// handler. Used to try moves out.
    pub fn light_clone(&self) -> Board {
        Board {
            cells: self.cells,
            pieces: self.pieces.clone(),
            turn: self.turn,
            moves: Vec::new(),
            generation: self.generation,
            cache: RefCell::default(),
            on_piece_moved: None,
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        let mut cells = [0u8; 64];
        for piece in self.pieces() {
            cells[piece.position().index()] = piece.code();
        }
        Snapshot {
            cells,
            turn: self.turn,
        }
    }

    pub(crate) fn piece_mut(&mut self, id: PieceId) -> &mut Piece {
        &mut self.pieces[id.index()]
    }

    pub(crate) fn invalidate(&mut self) {
        self.generation += 1;
    }

    /// Steps (a) to (e) of a move: en passant victim, origin, destination,
    /// piece state. Returns the piece that left the board.
    fn relocate(&mut self, id: PieceId, to: Tile) -> Option<PieceId> {
        let piece = self.piece(id);
        let from = piece.position();
        assert!(
            self.cells[from.index()] == Some(id),
            "That's a bug! {piece} is not on the board where it says it is!"
        );
        let (kind, side) = (piece.kind(), piece.side());
        let delta = to - from;
        let mut captured = None;
        if kind == PieceType::Pawn
            && delta.abs() == Offset::UNIT_DIAGONAL
            && self.cells[to.index()].is_none()
        {
            let victim = from + delta.column_only();
            captured = self.cells[victim.index()].take();
            trace!("En passant removes the piece on {victim}");
        }
        self.cells[from.index()] = None;
        if let Some(target) = self.cells[to.index()].replace(id) {
            captured = Some(target);
        }
        if let Some(target) = captured {
            assert!(
                self.piece(target).side() != side,
                "That's a bug! Piece captured teammate!"
            );
        }
        self.pieces[id.index()].set_position(to);
        captured
    }

    /** Step (f) and the notification. */
    fn finish_move(&mut self, id: PieceId, from: Tile, to: Tile, captured: Option<PieceId>) {
        for index in 0..64 {
            if let Some(other) = self.cells[index] {
                self.pieces[other.index()].after_piece_moved(id, from);
            }
        }
        self.invalidate();
        trace!(
            "{} moved {from} -> {to}{}",
            self.piece(id),
            captured
                .map(|target| format!(", captured {}", self.piece(target).kind()))
                .unwrap_or_default()
        );
        let event = PieceMoved {
            piece: id,
            from,
            to,
            captured,
        };
        if let Some(mut handler) = self.on_piece_moved.take() {
            handler(self, &event);
            if self.on_piece_moved.is_none() {
                self.on_piece_moved = Some(handler);
            }
        }
    }
}

impl Default for Board {
    fn default() -> Self {
        Board::new()
    }
}

impl Index<Tile> for Board {
    type Output = Option<PieceId>;

    fn index(&self, tile: Tile) -> &Self::Output {
        &self.cells[tile.index()]
    }
}

impl Index<(u8, u8)> for Board {
    type Output = Option<PieceId>;

    fn index(&self, (row, column): (u8, u8)) -> &Self::Output {
        &self[Tile::new(row, column)]
    }
}

impl Debug for Board {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Board")
            .field("turn", &self.turn)
            .field("pieces", &self.pieces().collect::<Vec<_>>())
            .field("moves", &self.moves.len())
            .field("generation", &self.generation)
            .finish()
    }
}

impl Display for Board {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for row in (0..8).rev() {
            for column in 0..8 {
                let letter = self
                    .at(row, column)
                    .map(|piece| piece.kind().fen_char(piece.side()))
                    .unwrap_or('.');
                write!(f, "{letter}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Compact, comparable copy of a position: one piece code per tile (see
/// [`Piece::code`]) and the side to move.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde_as(as = "Bytes")]
    cells: [u8; 64],
    turn: Side,
}

impl Snapshot {
    pub fn get(&self, tile: Tile) -> Option<(PieceType, Side)> {
        let code = self.cells[tile.index()];
        PieceType::from_code(code).map(|kind| {
            let side = if code & CODE_BLACK != 0 {
                Side::Black
            } else {
                Side::White
            };
            (kind, side)
        })
    }

    pub fn code(&self, tile: Tile) -> u8 {
        self.cells[tile.index()]
    }

    pub fn turn(&self) -> Side {
        self.turn
    }
}
