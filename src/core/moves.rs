use std::fmt::Display;

use log::trace;

use crate::core::board::Board;
use crate::core::definitions::{preferred_notation, CastlingSide, ImplicitMove, NotationType};
use crate::core::engine::Candidate;
use crate::core::piece::{Piece, PieceId, PieceType, Side};
use crate::core::tile::Tile;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MoveKind {
    /** plain move or capture */
    Normal,
    /** pawn advancing two tiles from its starting rank */
    DoubleStep,
    /** pawn capturing the pawn that just passed it */
    EnPassant,
    /** king move, the rook follows */
    Castle(CastlingSide),
    /** pawn reaching the last rank, the piece it turns into is chosen later */
    Promotion(Option<PieceType>),
}

/// What has to be added after the piece letter so the move reads
/// unambiguously.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Disambiguation {
    #[default]
    None,
    File,
    Rank,
    Both,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CheckSuffix {
    #[default]
    None,
    Check,
    Checkmate,
}

/// One ply: who moves where, what it captures and how.
///
/// Produced by the validator, applied with [`Move::do_move`]. After that it
/// only ever receives the check suffix.
#[derive(Clone, Debug, PartialEq)]
pub struct Move {
    piece: PieceId,
    piece_type: PieceType,
    side: Side,
    from: Tile,
    to: Tile,
    captured: Option<PieceId>,
    kind: MoveKind,
    disambiguation: Disambiguation,
    suffix: CheckSuffix,
}

impl Move {
    pub(crate) fn new(piece: &Piece, candidate: Candidate, disambiguation: Disambiguation) -> Move {
        Move {
            piece: piece.id(),
            piece_type: piece.kind(),
            side: piece.side(),
            from: piece.position(),
            to: candidate.to,
            captured: candidate.captured,
            kind: candidate.kind,
            disambiguation,
            suffix: CheckSuffix::None,
        }
    }

    pub fn piece(&self) -> PieceId {
        self.piece
    }

    /** Type of the moving piece before the move, a pawn for promotions. */
    pub fn piece_type(&self) -> PieceType {
        self.piece_type
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn from(&self) -> Tile {
        self.from
    }

    pub fn to(&self) -> Tile {
        self.to
    }

    pub fn captured(&self) -> Option<PieceId> {
        self.captured
    }

    pub fn kind(&self) -> MoveKind {
        self.kind
    }

    pub fn is_capture(&self) -> bool {
        self.captured.is_some()
    }

    pub fn is_castle(&self) -> bool {
        matches!(self.kind, MoveKind::Castle(_))
    }

    pub fn is_en_passant(&self) -> bool {
        self.kind == MoveKind::EnPassant
    }

    pub fn promotion_type(&self) -> Option<PieceType> {
        match self.kind {
            MoveKind::Promotion(kind) => kind,
            _ => None,
        }
    }

    pub fn suffix(&self) -> CheckSuffix {
        self.suffix
    }

    /** Same move with the promotion piece chosen. */
    pub fn with_promotion(mut self, kind: PieceType) -> Move {
        self.set_promotion_type(kind);
        self
    }

    /// Applies the move to `board`. Move is the intent, the board is the
    /// mechanism.
    ///
    /// Panics if this is a promotion whose piece was never chosen, or if
    /// the board no longer has the piece where the move expects it.
    pub fn do_move(&self, board: &mut Board) {
        let piece = board.piece(self.piece);
        assert!(
            board.is_on_board(self.piece) && piece.position() == self.from,
            "Stale move {}: {piece} is not on {}!",
            self.notation(NotationType::Coordinate),
            self.from
        );
        trace!("Applying {}", self.notation(NotationType::LongAlgebraic));
        match self.kind {
            MoveKind::Castle(castling_side) => board.castle(self.piece, castling_side),
            MoveKind::Promotion(Some(kind)) => board.promote(self.piece, self.to, kind),
            MoveKind::Promotion(None) => panic!(
                "Promotion {} applied before a promotion piece was chosen!",
                self.notation(NotationType::Coordinate)
            ),
            MoveKind::Normal | MoveKind::DoubleStep | MoveKind::EnPassant => {
                board.move_piece(self.piece, self.to)
            }
        }
    }

    /// Appends '+' or '#' after the move has been applied, depending on
    /// what it did to the side that did not move.
    pub fn append_check_notation(&mut self, board: &Board) {
        let opponent = self.side.opposite();
        let validator = board.validator();
        self.suffix = if !validator.is_in_check(opponent) {
            CheckSuffix::None
        } else if validator.has_legal_move(opponent) {
            CheckSuffix::Check
        } else {
            CheckSuffix::Checkmate
        };
    }

    pub fn notation(&self, notation: NotationType) -> String {
        match notation {
            NotationType::Algebraic => self.algebraic(),
            NotationType::LongAlgebraic => self.long_algebraic(),
            NotationType::Coordinate => self.coordinate(),
        }
    }

    fn algebraic(&self) -> String {
        let mut text = String::with_capacity(8);
        if let Some(castling) = self.castling_text() {
            text.push_str(castling);
        } else {
            match self.piece_type.symbol() {
                Some(letter) => {
                    text.push(letter);
                    match self.disambiguation {
                        Disambiguation::None => (),
                        Disambiguation::File => text.push(self.from.file_char()),
                        Disambiguation::Rank => text.push(self.from.rank_char()),
                        Disambiguation::Both => text.push_str(&self.from.to_algebraic()),
                    }
                }
                None if self.is_capture() => text.push(self.from.file_char()),
                None => (),
            }
            if self.is_capture() {
                text.push('x');
            }
            text.push_str(&self.to.to_algebraic());
            self.push_promotion(&mut text);
        }
        self.push_suffix(&mut text);
        text
    }

    fn long_algebraic(&self) -> String {
        let mut text = String::with_capacity(10);
        if let Some(castling) = self.castling_text() {
            text.push_str(castling);
        } else {
            if let Some(letter) = self.piece_type.symbol() {
                text.push(letter);
            }
            text.push_str(&self.from.to_algebraic());
            text.push(if self.is_capture() { 'x' } else { '-' });
            text.push_str(&self.to.to_algebraic());
            self.push_promotion(&mut text);
        }
        self.push_suffix(&mut text);
        text
    }

    fn coordinate(&self) -> String {
        let mut text = format!("{}{}", self.from, self.to);
        if let Some(letter) = self.promotion_type().and_then(PieceType::symbol) {
            text.push(letter.to_ascii_lowercase());
        }
        text
    }

    fn castling_text(&self) -> Option<&'static str> {
        match self.kind {
            MoveKind::Castle(CastlingSide::KingSide) => Some("O-O"),
            MoveKind::Castle(CastlingSide::QueenSide) => Some("O-O-O"),
            _ => None,
        }
    }

    fn push_promotion(&self, text: &mut String) {
        if let Some(letter) = self.promotion_type().and_then(PieceType::symbol) {
            text.push('=');
            text.push(letter);
        }
    }

    fn push_suffix(&self, text: &mut String) {
        match self.suffix {
            CheckSuffix::None => (),
            CheckSuffix::Check => text.push('+'),
            CheckSuffix::Checkmate => text.push('#'),
        }
    }
}

impl ImplicitMove for Move {
    fn promotion(&self) -> bool {
        matches!(self.kind, MoveKind::Promotion(_))
    }

    fn set_promotion_type(&mut self, kind: PieceType) {
        match &mut self.kind {
            MoveKind::Promotion(choice) => {
                assert!(kind.is_promotion_choice(), "Pawn can't promote to {kind}!");
                *choice = Some(kind);
            }
            _ => panic!("`set_promotion_type` on non-promotion move"),
        }
    }
}

impl Display for Move {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(&self.notation(preferred_notation()))
    }
}
