use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::core::tile::{Offset, Tile};

#[derive(PartialEq, Eq, Hash, Debug, Default, Clone, Copy, Serialize, Deserialize)]
pub enum Side {
    #[default]
    White,
    Black,
}

impl Side {
    pub fn opposite(self) -> Side {
        match self {
            Side::White => Side::Black,
            Side::Black => Side::White,
        }
    }

    /** Row direction pawns of this side advance in. */
    pub fn forward(self) -> i8 {
        match self {
            Side::White => 1,
            Side::Black => -1,
        }
    }

    pub fn home_row(self) -> u8 {
        match self {
            Side::White => 0,
            Side::Black => 7,
        }
    }

    pub fn pawn_row(self) -> u8 {
        match self {
            Side::White => 1,
            Side::Black => 6,
        }
    }

    pub fn promotion_row(self) -> u8 {
        self.opposite().home_row()
    }
}

impl Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(match self {
            Side::White => "White",
            Side::Black => "Black",
        })
    }
}

#[derive(PartialEq, Eq, Hash, Debug, Clone, Copy, Serialize, Deserialize)]
pub enum PieceType {
    Pawn = 0x01,
    Knight = 0x02,
    Bishop = 0x03,
    Rook = 0x04,
    Queen = 0x05,
    King = 0x06,
}

impl PieceType {
    /** Everything a pawn may turn into on the last rank. */
    pub const PROMOTION_CHOICES: [PieceType; 4] = [
        PieceType::Queen,
        PieceType::Rook,
        PieceType::Bishop,
        PieceType::Knight,
    ];

    pub fn is_promotion_choice(self) -> bool {
        Self::PROMOTION_CHOICES.contains(&self)
    }

    /// Letter used in algebraic notation, `None` for pawns.
    pub fn symbol(self) -> Option<char> {
        match self {
            PieceType::Pawn => None,
            PieceType::Knight => Some('N'),
            PieceType::Bishop => Some('B'),
            PieceType::Rook => Some('R'),
            PieceType::Queen => Some('Q'),
            PieceType::King => Some('K'),
        }
    }

    /// FEN letter: uppercase for White, lowercase for Black.
    pub fn fen_char(self, side: Side) -> char {
        let letter = self.symbol().unwrap_or('P');
        match side {
            Side::White => letter,
            Side::Black => letter.to_ascii_lowercase(),
        }
    }

    pub fn from_fen_char(letter: char) -> Option<(PieceType, Side)> {
        let side = if letter.is_ascii_uppercase() {
            Side::White
        } else {
            Side::Black
        };
        let kind = match letter.to_ascii_uppercase() {
            'P' => PieceType::Pawn,
            'N' => PieceType::Knight,
            'B' => PieceType::Bishop,
            'R' => PieceType::Rook,
            'Q' => PieceType::Queen,
            'K' => PieceType::King,
            _ => return None,
        };
        Some((kind, side))
    }

    pub(crate) fn from_code(code: u8) -> Option<PieceType> {
        match code & CODE_TYPE_MASK {
            0x01 => Some(PieceType::Pawn),
            0x02 => Some(PieceType::Knight),
            0x03 => Some(PieceType::Bishop),
            0x04 => Some(PieceType::Rook),
            0x05 => Some(PieceType::Queen),
            0x06 => Some(PieceType::King),
            _ => None,
        }
    }
}

impl Display for PieceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(match self {
            PieceType::Pawn => "Pawn",
            PieceType::Knight => "Knight",
            PieceType::Bishop => "Bishop",
            PieceType::Rook => "Rook",
            PieceType::Queen => "Queen",
            PieceType::King => "King",
        })
    }
}

/** Bits structure of a compact piece code, see [`Piece::code`]
 * Bit 7 -- Side of the piece
 * - 1 -- Black
 * - 0 -- White
 * Bit 4 -- Pawn has just moved two tiles
 * Bit 3 -- Piece has moved flag
 * Bits 2-0 Piece type
 * - 0 -- Empty tile */
pub(crate) const CODE_TYPE_MASK: u8 = 0x07;
pub(crate) const CODE_MOVED: u8 = 0x08;
pub(crate) const CODE_JUST_DOUBLE: u8 = 0x10;
pub(crate) const CODE_BLACK: u8 = 0x80;

/// Stable identity of a piece for the lifetime of a board setup.
///
/// Two pieces of the same type and side are still different pieces; the
/// id is what tells them apart. Ids stay valid after a capture.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PieceId(u8);

impl PieceId {
    pub(crate) fn new(index: usize) -> PieceId {
        assert!(index <= u8::MAX as usize, "Too many pieces on one board!");
        PieceId(index as u8)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Piece {
    id: PieceId,
    kind: PieceType,
    side: Side,
    position: Tile,
    has_moved: bool,
    pawn_just_moved_double: bool,
}

impl Piece {
    pub(crate) fn new(id: PieceId, kind: PieceType, side: Side, position: Tile) -> Piece {
        Piece {
            id,
            kind,
            side,
            position,
            has_moved: false,
            pawn_just_moved_double: false,
        }
    }

    pub fn id(&self) -> PieceId {
        self.id
    }

    pub fn kind(&self) -> PieceType {
        self.kind
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn position(&self) -> Tile {
        self.position
    }

    /** Gates castling and the pawn double step. */
    pub fn has_moved(&self) -> bool {
        self.has_moved
    }

    /// True only during the single ply after this pawn advanced two tiles,
    /// which is when it can be captured en passant.
    pub fn pawn_just_moved_double(&self) -> bool {
        self.pawn_just_moved_double
    }

    pub fn code(&self) -> u8 {
        let mut code = self.kind as u8;
        if self.side == Side::Black {
            code |= CODE_BLACK;
        }
        if self.has_moved {
            code |= CODE_MOVED;
        }
        if self.pawn_just_moved_double {
            code |= CODE_JUST_DOUBLE;
        }
        code
    }

    pub(crate) fn set_position(&mut self, position: Tile) {
        self.position = position;
        self.has_moved = true;
    }

    pub(crate) fn set_has_moved(&mut self, has_moved: bool) {
        self.has_moved = has_moved;
    }

    pub(crate) fn set_pawn_just_moved_double(&mut self, value: bool) {
        self.pawn_just_moved_double = value;
    }

    pub(crate) fn promote(&mut self, kind: PieceType) {
        assert!(self.kind == PieceType::Pawn, "Trying to promote non-pawn piece!");
        assert!(kind.is_promotion_choice(), "Pawn can't promote to {kind}!");
        self.kind = kind;
    }

    /// Runs for every piece still on the board once `moved` has left
    /// `from`. The mover records whether it was a pawn double step, every
    /// other piece loses its en passant window.
    pub(crate) fn after_piece_moved(&mut self, moved: PieceId, from: Tile) {
        self.pawn_just_moved_double = self.id == moved
            && self.kind == PieceType::Pawn
            && (self.position - from).abs() == Offset::DOUBLE_STEP;
    }
}

impl Display for Piece {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} on {}", self.side, self.kind, self.position)
    }
}
