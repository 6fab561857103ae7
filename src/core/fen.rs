use anyhow::{bail, Context};
use log::debug;

use crate::core::board::Board;
use crate::core::definitions::CastlingSide;
use crate::core::piece::{PieceType, Side};
use crate::core::tile::{Offset, Tile};

impl Board {
    /// Sets up a position from Forsyth-Edwards Notation.
    ///
    /// Castling availability is mapped onto the moved flags: a missing right
    /// marks its rook as moved, a side without rights gets a moved king.
    /// Pawns off their starting rank count as moved. The en passant target
    /// opens the window on the pawn that just passed it. Move counters are
    /// accepted and ignored.
    pub fn from_fen(fen: &str) -> anyhow::Result<Board> {
        let mut fields = fen.split_whitespace();
        let placement = fields.next().context("FEN string is empty")?;
        let mut board = Board::empty();

        let ranks: Vec<&str> = placement.split('/').collect();
        if ranks.len() != 8 {
            bail!("FEN placement must have 8 ranks, got {}", ranks.len());
        }
        for (index, rank) in ranks.into_iter().enumerate() {
            let row = 7 - index as u8;
            let mut column = 0u8;
            for letter in rank.chars() {
                if let Some(skip) = letter.to_digit(10) {
                    if !(1..=8).contains(&skip) || column as u32 + skip > 8 {
                        bail!("Bad empty tile count {letter:?} in rank {}", row + 1);
                    }
                    column += skip as u8;
                    continue;
                }
                let (kind, side) = PieceType::from_fen_char(letter)
                    .with_context(|| format!("Unknown piece {letter:?} in rank {}", row + 1))?;
                if column >= 8 {
                    bail!("Rank {} is longer than 8 tiles", row + 1);
                }
                board.place(kind, side, Tile::new(row, column));
                column += 1;
            }
            if column != 8 {
                bail!("Rank {} covers {column} tiles instead of 8", row + 1);
            }
        }

        let turn = match fields.next().unwrap_or("w") {
            "w" => Side::White,
            "b" => Side::Black,
            other => bail!("Unknown side to move {other:?}"),
        };
        board.set_turn(turn);

        let castling = fields.next().unwrap_or("-");
        let mut rights: Vec<(Side, CastlingSide)> = Vec::with_capacity(4);
        for letter in castling.chars() {
            rights.push(match letter {
                'K' => (Side::White, CastlingSide::KingSide),
                'Q' => (Side::White, CastlingSide::QueenSide),
                'k' => (Side::Black, CastlingSide::KingSide),
                'q' => (Side::Black, CastlingSide::QueenSide),
                '-' => continue,
                other => bail!("Unknown castling right {other:?}"),
            });
        }

        let ids: Vec<_> = board.pieces().map(|piece| piece.id()).collect();
        for id in ids {
            let piece = board.piece(id);
            let (side, position) = (piece.side(), piece.position());
            let unmoved = match piece.kind() {
                PieceType::Pawn => position.row() == side.pawn_row(),
                PieceType::King => {
                    position == Tile::new(side.home_row(), 4)
                        && rights.iter().any(|(owner, _)| *owner == side)
                }
                PieceType::Rook => rights.iter().any(|&(owner, castling_side)| {
                    owner == side
                        && position == Tile::new(side.home_row(), castling_side.rook_column())
                }),
                _ => position.row() == side.home_row(),
            };
            board.piece_mut(id).set_has_moved(!unmoved);
        }

        let en_passant = fields.next().unwrap_or("-");
        if en_passant != "-" {
            let target = Tile::from_algebraic(en_passant)
                .with_context(|| format!("Bad en passant target {en_passant:?}"))?;
            let victim = target
                .shift(Offset::new(-turn.forward(), 0))
                .context("En passant target on the edge of the board")?;
            match board.get(victim) {
                Some(pawn) if pawn.kind() == PieceType::Pawn && pawn.side() != turn => {
                    let id = pawn.id();
                    board.piece_mut(id).set_pawn_just_moved_double(true);
                }
                _ => bail!("No pawn can be captured en passant on {target}"),
            }
        }

        board.invalidate();
        debug!("Board set up from FEN {fen:?}");
        Ok(board)
    }
}
