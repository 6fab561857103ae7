use std::cell::RefCell;
use std::rc::Rc;

use log::{debug, info};
use thiserror::Error;

use crate::core::board::Board;
use crate::core::definitions::{preferred_notation, GameStatus, ImplicitMove, NotationType};
use crate::core::moves::Move;
use crate::core::piece::{PieceId, PieceType, Side};
use crate::core::tile::Tile;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    #[error("There is no piece on {0}")]
    NoPiece(Tile),
    #[error("It is {0}'s turn")]
    NotYourTurn(Side),
    #[error("Illegal move {from}-{to}: {reason}")]
    IllegalMove { from: Tile, to: Tile, reason: String },
    #[error("Move {from}-{to} promotes a pawn, a promotion piece is required")]
    PromotionRequired { from: Tile, to: Tile },
    #[error("The game is already over ({0})")]
    Finished(GameStatus),
}

/// One game session around a [`Board`].
///
/// Registers the standard piece-moved handler: captured pieces are
/// collected, the validator cache is reset and the turn passes to the other
/// side.
#[derive(Debug)]
pub struct Game {
    board: Board,
    captured: Rc<RefCell<Vec<PieceId>>>,
    enforce_turns: bool,
}

impl Game {
    pub fn new() -> Game {
        Game::with_board(Board::new())
    }

    pub fn from_fen(fen: &str) -> anyhow::Result<Game> {
        Ok(Game::with_board(Board::from_fen(fen)?))
    }

    pub fn with_board(mut board: Board) -> Game {
        let captured: Rc<RefCell<Vec<PieceId>>> = Rc::default();
        let sink = Rc::clone(&captured);
        board.set_piece_moved_handler(move |board, event| {
            if let Some(target) = event.captured {
                sink.borrow_mut().push(target);
            }
            board.validator().reset_cache();
            board.switch_turn();
        });
        Game {
            board,
            captured,
            enforce_turns: true,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn enforce_turns(&self) -> bool {
        self.enforce_turns
    }

    /** When off, either side may move at any time. */
    pub fn set_enforce_turns(&mut self, enforce: bool) {
        self.enforce_turns = enforce;
    }

    /** Pieces captured so far, in capture order. */
    pub fn captured(&self) -> Vec<PieceId> {
        self.captured.borrow().clone()
    }

    pub fn status(&self) -> GameStatus {
        self.board.validator().check_game_status()
    }

    pub fn legal_move_count(&self) -> usize {
        self.board
            .validator()
            .get_all_legal_moves(self.board.turn())
            .len()
    }

    /// Destinations the piece on `tile` may move to, empty for an empty
    /// tile.
    pub fn valid_targets(&self, tile: Tile) -> Vec<Tile> {
        self.board
            .get(tile)
            .map(|piece| {
                self.board
                    .validator()
                    .get_valid_locations(piece.id())
                    .iter()
                    .map(Move::to)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Plays `from`-`to`. Promotions need `promotion`, the engine never
    /// picks the piece itself.
    pub fn play(
        &mut self,
        from: Tile,
        to: Tile,
        promotion: Option<PieceType>,
    ) -> Result<&Move, GameError> {
        self.play_with(from, to, |_move| promotion)
    }

    /// Plays `from`-`to`, asking `choose` for the promotion piece when the
    /// move turns out to be a promotion. `choose` runs before the move is
    /// applied, returning `None` abandons the move.
    pub fn play_with<F>(&mut self, from: Tile, to: Tile, choose: F) -> Result<&Move, GameError>
    where
        F: FnOnce(&Move) -> Option<PieceType>,
    {
        let status = self.status();
        if status.is_finished() {
            return Err(GameError::Finished(status));
        }
        let piece = self.board.get(from).ok_or(GameError::NoPiece(from))?;
        if self.enforce_turns && piece.side() != self.board.turn() {
            return Err(GameError::NotYourTurn(self.board.turn()));
        }
        let validator = self.board.validator();
        let mut _move = validator
            .movement(piece.id(), to)
            .ok_or_else(|| GameError::IllegalMove {
                from,
                to,
                reason: validator
                    .invalid_error(to)
                    .unwrap_or_else(|| "INVALID".to_string()),
            })?;
        if _move.promotion() {
            let kind = choose(&_move).ok_or(GameError::PromotionRequired { from, to })?;
            _move.set_promotion_type(kind);
        }

        _move.do_move(&mut self.board);
        _move.append_check_notation(&self.board);
        debug!("Played {}", _move.notation(NotationType::LongAlgebraic));
        let status = self.status();
        if status.is_finished() {
            info!("Game over: {status} after {}", _move.notation(NotationType::Algebraic));
        }
        Ok(self.board.record_move(_move))
    }

    /// Back to the starting position with an empty history.
    pub fn reset(&mut self) {
        self.board.reset();
        self.board.validator().reset_cache();
        self.captured.borrow_mut().clear();
    }

    pub fn history_lines(&self) -> Vec<String> {
        self.history_lines_in(preferred_notation())
    }

    /// Move list, one numbered line per full move ("1. e4 e5"). An
    /// unfinished last line ends with "..." while the game is in progress
    /// and nobody is in check. Without enforced turns every ply gets its own
    /// line prefixed with its side.
    pub fn history_lines_in(&self, notation: NotationType) -> Vec<String> {
        let mut lines = Vec::new();
        if !self.enforce_turns {
            for _move in self.board.moves() {
                lines.push(format!("{}: {}", _move.side(), _move.notation(notation)));
            }
            return lines;
        }
        let mut buffer = String::new();
        let mut turn = 1;
        for _move in self.board.moves() {
            match _move.side() {
                Side::White => {
                    buffer.push_str(&_move.notation(notation));
                    buffer.push(' ');
                }
                Side::Black => {
                    if buffer.is_empty() {
                        buffer.push_str("... ");
                    }
                    buffer.push_str(&_move.notation(notation));
                    lines.push(format!("{turn}. {buffer}"));
                    buffer.clear();
                    turn += 1;
                }
            }
        }
        if !buffer.is_empty() {
            if self.status() == GameStatus::InProgress {
                lines.push(format!("{turn}. {buffer}..."));
            } else {
                lines.push(format!("{turn}. {}", buffer.trim_end()));
            }
        }
        lines
    }

    /// Diagnostic lines about one tile and the piece on it.
    pub fn describe(&self, tile: Tile) -> Vec<String> {
        let validator = self.board.validator();
        let mut lines = vec![format!("Tile: {tile}")];
        if let Some(piece) = self.board.get(tile) {
            lines.push(format!("Piece: {} {}", piece.side(), piece.kind()));
            if !piece.has_moved() {
                lines.push("Not yet moved".to_string());
            }
            if piece.kind() == PieceType::Pawn && piece.pawn_just_moved_double() {
                lines.push("Open to en passant".to_string());
            }
            if self.enforce_turns && piece.side() != self.board.turn() {
                lines.push(format!("{}'s turn", self.board.turn()));
            }
            let count = validator.get_valid_locations(piece.id()).len();
            lines.push(format!("{count} legal moves"));
        }
        if let Some(reason) = validator.invalid_error(tile) {
            lines.push(format!("({reason})"));
        }
        lines
    }
}

impl Default for Game {
    fn default() -> Self {
        Game::new()
    }
}
