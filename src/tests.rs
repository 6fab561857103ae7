use std::cell::Cell;
use std::rc::Rc;

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

use crate::core::utils::{between, is_in_diagonal_line, is_in_straight_line};
use crate::utils::{perft, playable_moves, PerftResult};

use super::*;

const START: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";
const KIWIPETE: &str = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - ";
const POSITION_3: &str = "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1";
const POSITION_4: &str = "r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1";
const POSITION_5: &str = "rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8";

fn tile(name: &str) -> Tile {
    name.parse().unwrap()
}

fn play_all(game: &mut Game, moves: &[(&str, &str)]) {
    for (from, to) in moves {
        if let Err(error) = game.play(tile(from), tile(to), None) {
            panic!("{from}-{to} should be playable: {error}");
        }
    }
}

fn last_notation(game: &Game) -> String {
    game.board()
        .last_move()
        .expect("No move was played")
        .notation(NotationType::Algebraic)
}

fn check_board_invariants(board: &Board) {
    for piece in board.pieces() {
        assert_eq!(
            board.get(piece.position()).map(Piece::id),
            Some(piece.id()),
            "{piece} is not where the grid says"
        );
    }
    for side in [Side::White, Side::Black] {
        let kings = board
            .pieces_of(side)
            .filter(|piece| piece.kind() == PieceType::King)
            .count();
        assert_eq!(kings, 1, "{side} should have exactly one king");
    }
}

#[test]
fn tiles() {
    let e4 = tile("e4");
    assert_eq!((e4.row(), e4.column()), (3, 4));
    assert_eq!(Tile::new(0, 0).to_string(), "a1");
    assert_eq!(Tile::from_index(63), tile("h8"));
    assert_eq!(tile("e4") - tile("e2"), Offset::new(2, 0));
    let delta = tile("d6") - tile("e5");
    assert_eq!(delta.abs(), Offset::UNIT_DIAGONAL);
    assert_eq!(tile("e5") + delta.column_only(), tile("d5"));
    assert_eq!(delta.row_only(), Offset::new(1, 0));
    assert_eq!(tile("h8").shift(Offset::new(1, 0)), None);
    assert_eq!(tile("a1").shift(Offset::UNIT_DIAGONAL), Some(tile("b2")));
    assert!(Tile::from_algebraic("i9").is_err());
    assert!(Tile::from_algebraic("e").is_err());
    assert_eq!(Tile::try_new(-1, 3), None);
    assert_eq!(Tile::clamped(-4, 12), tile("h1"));
    assert_eq!(Tile::all().count(), 64);
}

#[test]
fn math() {
    assert!(is_in_diagonal_line(tile("a1"), tile("d4")), "This line is diagonal");
    let cells: Vec<_> = between(tile("a1"), tile("d4")).collect();
    assert_eq!(cells, vec![tile("b2"), tile("c3")]);
    let cells: Vec<_> = between(tile("e1"), tile("h1")).collect();
    assert_eq!(cells, vec![tile("f1"), tile("g1")]);
    assert_eq!(between(tile("e1"), tile("f1")).count(), 0);
}

#[test]
fn straight_line() {
    const STRAIGHT_LINE: [(u8, u8); 8] = [
        (0, 2),
        (1, 2),
        (2, 0),
        (2, 1),
        (2, 3),
        (2, 4),
        (3, 2),
        (4, 2),
    ];
    let test_piece = Tile::new(2, 2);
    for row in 0..5 {
        for column in 0..5 {
            let pos = Tile::new(row, column);
            let expected = STRAIGHT_LINE.contains(&(row, column));
            assert_eq!(expected, is_in_straight_line(test_piece, pos), "{pos:?}");
            assert_eq!(expected, is_in_straight_line(pos, test_piece), "{pos:?}");
        }
    }
}

#[test]
fn diagonal_line() {
    const DIAGONAL_LINE: [(u8, u8); 8] = [
        (0, 0),
        (0, 4),
        (1, 1),
        (1, 3),
        (3, 1),
        (3, 3),
        (4, 0),
        (4, 4),
    ];
    let test_piece = Tile::new(2, 2);
    for row in 0..5 {
        for column in 0..5 {
            let pos = Tile::new(row, column);
            let expected = DIAGONAL_LINE.contains(&(row, column));
            assert_eq!(expected, is_in_diagonal_line(test_piece, pos), "{pos:?}");
            assert_eq!(expected, is_in_diagonal_line(pos, test_piece), "{pos:?}");
        }
    }
}

#[test]
fn starting_position() {
    let board = Board::new();
    assert_eq!(board.pieces().count(), 32);
    assert_eq!(board.turn(), Side::White);
    assert!(board.moves().is_empty());
    check_board_invariants(&board);
    assert_eq!(
        board.king(Side::White).map(Piece::position),
        Some(tile("e1"))
    );
    assert_eq!(
        board.king(Side::Black).map(Piece::position),
        Some(tile("e8"))
    );
    assert!(board.pieces().all(|piece| !piece.has_moved()));
    assert_eq!(board.validator().get_all_legal_moves(Side::White).len(), 20);
    assert_eq!(board.validator().get_all_legal_moves(Side::Black).len(), 20);
    assert_eq!(board.validator().check_game_status(), GameStatus::InProgress);
    assert_eq!(
        board.to_string(),
        "rnbqkbnr\npppppppp\n........\n........\n........\n........\nPPPPPPPP\nRNBQKBNR\n"
    );
}

#[test]
fn reset_restores_start() {
    let mut game = Game::new();
    play_all(&mut game, &[("e2", "e4"), ("d7", "d5"), ("e4", "d5")]);
    assert_eq!(game.captured().len(), 1);
    game.reset();
    assert!(game.board().moves().is_empty());
    assert!(game.captured().is_empty());
    assert_eq!(game.board().turn(), Side::White);
    assert_eq!(game.board().snapshot(), Board::new().snapshot());
    // The handler survives a reset.
    play_all(&mut game, &[("e2", "e4")]);
    assert_eq!(game.board().turn(), Side::Black);
}

#[test]
fn pawn_double_step() {
    let mut game = Game::new();
    assert!(game.valid_targets(tile("e2")).contains(&tile("e4")));
    play_all(&mut game, &[("e2", "e3"), ("a7", "a6")]);
    let error = game.play(tile("e3"), tile("e5"), None).unwrap_err();
    assert_eq!(
        error,
        GameError::IllegalMove {
            from: tile("e3"),
            to: tile("e5"),
            reason: "Pawn can only advance two tiles from its starting rank".to_string(),
        }
    );

    let game = Game::from_fen("4k3/8/8/8/8/4P3/8/4K3 w - - 0 1").unwrap();
    assert_eq!(game.valid_targets(tile("e3")), vec![tile("e4")]);

    let game = Game::from_fen("4k3/8/8/8/8/4n3/4P3/4K3 w - - 0 1").unwrap();
    assert!(game.valid_targets(tile("e2")).is_empty(), "Blocked pawn can't jump");
}

#[test]
fn en_passant() {
    let mut game = Game::new();
    play_all(&mut game, &[("e2", "e4"), ("a7", "a6"), ("e4", "e5"), ("d7", "d5")]);
    assert!(game
        .describe(tile("d5"))
        .contains(&"Open to en passant".to_string()));
    let victim = game.board().get(tile("d5")).unwrap().id();
    let _move = game.play(tile("e5"), tile("d6"), None).unwrap();
    assert!(_move.is_en_passant());
    assert_eq!(_move.captured(), Some(victim));
    assert_eq!(_move.notation(NotationType::Algebraic), "exd6");
    assert_eq!(_move.notation(NotationType::LongAlgebraic), "e5xd6");
    assert!(game.board().get(tile("d5")).is_none());
    assert!(!game.board().is_on_board(victim));
    assert_eq!(game.captured(), vec![victim]);
    check_board_invariants(game.board());
}

#[test]
fn en_passant_window_expires() {
    let mut game = Game::new();
    play_all(
        &mut game,
        &[
            ("e2", "e4"),
            ("a7", "a6"),
            ("e4", "e5"),
            ("d7", "d5"),
            ("h2", "h3"),
            ("h7", "h6"),
        ],
    );
    assert!(!game.board().get(tile("d5")).unwrap().pawn_just_moved_double());
    let error = game.play(tile("e5"), tile("d6"), None).unwrap_err();
    assert!(matches!(error, GameError::IllegalMove { .. }), "{error}");
    assert_eq!(
        game.board().validator().invalid_error(tile("d6")).as_deref(),
        Some("Pawn can only move diagonally when capturing")
    );
}

#[test]
fn en_passant_from_fen() {
    let mut game = Game::from_fen("4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 1").unwrap();
    assert!(game.valid_targets(tile("e5")).contains(&tile("d6")));
    game.play(tile("e5"), tile("d6"), None).unwrap();
    assert!(game.board().get(tile("d5")).is_none());
}

#[test]
fn castling() {
    let mut game = Game::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
    let targets = game.valid_targets(tile("e1"));
    assert!(targets.contains(&tile("g1")) && targets.contains(&tile("c1")));
    let _move = game.play(tile("e1"), tile("g1"), None).unwrap();
    assert!(_move.is_castle());
    assert_eq!(_move.notation(NotationType::Algebraic), "O-O");
    let board = game.board();
    assert_eq!(board.get(tile("g1")).map(Piece::kind), Some(PieceType::King));
    assert_eq!(board.get(tile("f1")).map(Piece::kind), Some(PieceType::Rook));
    assert!(board.get(tile("h1")).is_none());
    assert!(board.get(tile("f1")).unwrap().has_moved());
    assert_eq!(board.turn(), Side::Black);

    let _move = game.play(tile("e8"), tile("c8"), None).unwrap();
    assert_eq!(_move.notation(NotationType::Algebraic), "O-O-O");
    assert_eq!(game.board().get(tile("d8")).map(Piece::kind), Some(PieceType::Rook));
}

#[test]
fn castling_through_attack() {
    let mut game = Game::from_fen("r3kr2/8/8/8/8/8/8/R3K2R w KQq - 0 1").unwrap();
    let error = game.play(tile("e1"), tile("g1"), None).unwrap_err();
    assert_eq!(
        error,
        GameError::IllegalMove {
            from: tile("e1"),
            to: tile("g1"),
            reason: "King would pass through or land on an attacked tile".to_string(),
        }
    );
    assert!(game.valid_targets(tile("e1")).contains(&tile("c1")));
}

#[test]
fn castling_after_rook_moved() {
    let mut game = Game::from_fen("4k3/8/8/8/8/8/8/R3K2R w KQ - 0 1").unwrap();
    play_all(&mut game, &[("h1", "h2"), ("e8", "d8"), ("h2", "h1"), ("d8", "e8")]);
    let error = game.play(tile("e1"), tile("g1"), None).unwrap_err();
    assert!(
        matches!(&error, GameError::IllegalMove { reason, .. } if reason == "Rook has already moved"),
        "{error}"
    );
}

#[test]
fn castle_notifies_once() {
    let mut board = Board::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
    let events = Rc::new(Cell::new(0));
    let counter = Rc::clone(&events);
    board.set_piece_moved_handler(move |_, event| {
        assert_eq!(event.to, Tile::new(0, 6));
        counter.set(counter.get() + 1);
    });
    let king = board.king(Side::White).unwrap().id();
    let _move = board.validator().movement(king, tile("g1")).unwrap();
    _move.do_move(&mut board);
    assert_eq!(events.get(), 1);
    assert_eq!(board.turn(), Side::White, "Only the handler switches turns");

    board.clear_piece_moved_handler();
    board.move_piece_from(tile("a8"), tile("a7"));
    assert_eq!(events.get(), 1);
}

#[test]
fn check() {
    let mut game = Game::new();
    play_all(&mut game, &[("e2", "e4"), ("f7", "f5"), ("d1", "h5")]);
    assert_eq!(last_notation(&game), "Qh5+");
    assert_eq!(game.status(), GameStatus::Check);
    assert_eq!(
        game.history_lines_in(NotationType::Algebraic),
        vec!["1. e4 f5", "2. Qh5+"]
    );
    assert!(game.board().validator().is_in_check(Side::Black));
    let attackers = game.board().validator().attackers(tile("e8"), Side::White);
    assert_eq!(attackers, vec![game.board().get(tile("h5")).unwrap().id()]);
    // Only blocking with g6 or taking the check is legal.
    assert_eq!(game.legal_move_count(), 1);
}

#[test]
fn fools_mate() {
    let mut game = Game::new();
    play_all(
        &mut game,
        &[("f2", "f3"), ("e7", "e5"), ("g2", "g4"), ("d8", "h4")],
    );
    assert_eq!(last_notation(&game), "Qh4#");
    assert_eq!(game.status(), GameStatus::Checkmate);
    assert_eq!(game.legal_move_count(), 0);
    assert_eq!(
        game.play(tile("a2"), tile("a3"), None).unwrap_err(),
        GameError::Finished(GameStatus::Checkmate)
    );
    assert_eq!(
        game.history_lines_in(NotationType::Algebraic),
        vec!["1. f3 e5", "2. g4 Qh4#"]
    );
}

#[test]
fn scholars_mate() {
    let mut game = Game::new();
    play_all(
        &mut game,
        &[
            ("e2", "e4"),
            ("e7", "e5"),
            ("f1", "c4"),
            ("b8", "c6"),
            ("d1", "h5"),
            ("g8", "f6"),
            ("h5", "f7"),
        ],
    );
    assert_eq!(game.status(), GameStatus::Checkmate);
    assert_eq!(
        game.history_lines_in(NotationType::Algebraic),
        vec!["1. e4 e5", "2. Bc4 Nc6", "3. Qh5 Nf6", "4. Qxf7#"]
    );
    assert_eq!(game.captured().len(), 1);
}

#[test]
fn stalemate() {
    let mut game = Game::from_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1").unwrap();
    assert_eq!(game.status(), GameStatus::Stalemate);
    assert!(!game.board().validator().is_in_check(Side::Black));
    assert_eq!(
        game.play(tile("h8"), tile("g8"), None).unwrap_err(),
        GameError::Finished(GameStatus::Stalemate)
    );
}

#[test]
fn pinned_piece_cant_move() {
    let game = Game::from_fen("4k3/4r3/8/8/8/8/4B3/4K3 w - - 0 1").unwrap();
    assert!(game.valid_targets(tile("e2")).is_empty());
    let board = game.board();
    let bishop = board.get(tile("e2")).unwrap().id();
    assert!(!board.validator().is_movement_valid(bishop, tile("d3")));
    assert_eq!(
        board.validator().invalid_error(tile("d3")).as_deref(),
        Some("Move would leave the king in check")
    );
}

#[test]
fn promotion() {
    let mut game = Game::from_fen("8/P7/8/8/8/8/8/k6K w - - 0 1").unwrap();
    assert_eq!(
        game.play(tile("a7"), tile("a8"), None).unwrap_err(),
        GameError::PromotionRequired {
            from: tile("a7"),
            to: tile("a8"),
        }
    );
    assert_eq!(game.board().turn(), Side::White, "Nothing was applied");
    assert_eq!(game.board().get(tile("a7")).map(Piece::kind), Some(PieceType::Pawn));

    let _move = game
        .play(tile("a7"), tile("a8"), Some(PieceType::Queen))
        .unwrap();
    assert_eq!(_move.notation(NotationType::Algebraic), "a8=Q+");
    assert_eq!(_move.notation(NotationType::Coordinate), "a7a8q");
    assert_eq!(_move.piece_type(), PieceType::Pawn);
    let queen = game.board().get(tile("a8")).unwrap();
    assert_eq!((queen.kind(), queen.side()), (PieceType::Queen, Side::White));
    assert_eq!(game.status(), GameStatus::Check);
}

#[test]
fn promotion_with_chooser() {
    let mut game = Game::from_fen("8/P7/8/8/8/8/8/k6K w - - 0 1").unwrap();
    let _move = game
        .play_with(tile("a7"), tile("a8"), |_move| {
            assert!(_move.promotion());
            Some(PieceType::Knight)
        })
        .unwrap();
    assert_eq!(_move.notation(NotationType::Algebraic), "a8=N");
    assert_eq!(game.board().get(tile("a8")).map(Piece::kind), Some(PieceType::Knight));
}

#[test]
#[should_panic(expected = "before a promotion piece was chosen")]
fn promotion_without_choice() {
    let mut board = Board::from_fen("8/P7/8/8/8/8/8/k6K w - - 0 1").unwrap();
    let pawn = board.get(tile("a7")).unwrap().id();
    let _move = board.validator().movement(pawn, tile("a8")).unwrap();
    _move.do_move(&mut board);
}

#[test]
#[should_panic(expected = "There is no piece on e4")]
fn move_from_empty_tile() {
    let mut board = Board::empty();
    board.move_piece_from(tile("e4"), tile("e5"));
}

#[test]
fn cache_reset_is_idempotent() {
    let board = Board::new();
    let validator = board.validator();
    let knight = board.get(tile("g1")).unwrap().id();
    let first = validator.get_valid_locations(knight);
    validator.reset_cache();
    validator.reset_cache();
    assert_eq!(first, validator.get_valid_locations(knight));
    let mut targets: Vec<_> = first.iter().map(Move::to).collect();
    targets.sort();
    assert_eq!(targets, vec![tile("f3"), tile("h3")]);
}

#[test]
fn stale_cache_is_dropped() {
    let mut board = Board::new();
    let bishop = board.get(tile("f1")).unwrap().id();
    assert!(board.validator().get_valid_locations(bishop).is_empty());
    board.move_piece_from(tile("e2"), tile("e4"));
    // No handler and no reset, the generation alone invalidates the cache.
    assert_eq!(board.validator().get_valid_locations(bishop).len(), 5);
}

#[test]
fn disambiguation() {
    let board = Board::from_fen("4k3/8/8/8/8/8/8/1N2KN2 w - - 0 1").unwrap();
    let knight = board.get(tile("b1")).unwrap().id();
    let _move = board.validator().movement(knight, tile("d2")).unwrap();
    assert_eq!(_move.notation(NotationType::Algebraic), "Nbd2");
    let _move = board.validator().movement(knight, tile("c3")).unwrap();
    assert_eq!(_move.notation(NotationType::Algebraic), "Nc3");

    let board = Board::from_fen("4k3/8/8/8/R7/8/8/R3K3 w - - 0 1").unwrap();
    let rook = board.get(tile("a1")).unwrap().id();
    let _move = board.validator().movement(rook, tile("a2")).unwrap();
    assert_eq!(_move.notation(NotationType::Algebraic), "R1a2");
}

#[test]
fn invalid_move_reasons() {
    let mut game = Game::new();
    assert_eq!(
        game.play(tile("e4"), tile("e5"), None).unwrap_err(),
        GameError::NoPiece(tile("e4"))
    );
    assert_eq!(
        game.play(tile("e7"), tile("e5"), None).unwrap_err(),
        GameError::NotYourTurn(Side::White)
    );
    let cases = [
        ("e2", "e5", "Pawn can't move that way"),
        ("b1", "b3", "Knight can't move that way"),
        ("c1", "e3", "Path is blocked"),
        ("a1", "a2", "Tile is occupied by a friendly piece"),
        ("e1", "g1", "Pieces stand between king and rook"),
        ("e1", "c1", "Pieces stand between king and rook"),
        ("e1", "d1", "Tile is occupied by a friendly piece"),
    ];
    for (from, to, reason) in cases {
        match game.play(tile(from), tile(to), None) {
            Err(GameError::IllegalMove { reason: found, .. }) => {
                assert_eq!(found, reason, "{from}-{to}")
            }
            other => panic!("{from}-{to} should be illegal, got {other:?}"),
        }
    }
    let errors = game.board().validator().invalid_errors();
    assert_eq!(errors.len(), cases.len());
    assert!(game
        .describe(tile("e3"))
        .contains(&"(Path is blocked)".to_string()));
}

#[test]
fn describe_tile() {
    let game = Game::new();
    let lines = game.describe(tile("g1"));
    assert_eq!(
        lines,
        vec!["Tile: g1", "Piece: White Knight", "Not yet moved", "2 legal moves"]
    );
    assert_eq!(game.describe(tile("e4")), vec!["Tile: e4"]);
}

#[test]
fn free_play_history() {
    let mut game = Game::new();
    game.set_enforce_turns(false);
    play_all(&mut game, &[("e2", "e4"), ("d2", "d4")]);
    assert_eq!(
        game.history_lines_in(NotationType::Algebraic),
        vec!["White: e4", "White: d4"]
    );
}

#[test]
fn unfinished_history_line() {
    let mut game = Game::new();
    play_all(&mut game, &[("e2", "e4"), ("e7", "e5"), ("g1", "f3")]);
    assert_eq!(
        game.history_lines_in(NotationType::LongAlgebraic),
        vec!["1. e2-e4 e7-e5", "2. Ng1-f3 ..."]
    );
}

#[test]
fn preferred_notation_switch() {
    let mut game = Game::new();
    play_all(&mut game, &[("e2", "e4")]);
    let _move = game.board().last_move().unwrap();
    set_preferred_notation(NotationType::Coordinate);
    assert_eq!(_move.to_string(), "e2e4");
    assert_eq!(game.history_lines(), vec!["1. e2e4 ..."]);
    set_preferred_notation(NotationType::Algebraic);
    assert_eq!(_move.to_string(), "e4");
}

#[test]
fn fen_parsing() {
    const FENS: [&str; 5] = [START, KIWIPETE, POSITION_3, POSITION_4, POSITION_5];
    for setup in FENS {
        let board = Board::from_fen(setup).unwrap();
        check_board_invariants(&board);
    }
    assert_eq!(
        Board::from_fen(START).unwrap().snapshot(),
        Board::new().snapshot()
    );
    let board = Board::from_fen(POSITION_4).unwrap();
    assert!(board.king(Side::White).unwrap().has_moved());
    assert!(!board.get(tile("a8")).unwrap().has_moved());

    assert!(Board::from_fen("").is_err());
    assert!(Board::from_fen("8/8/8 w - -").is_err());
    assert!(Board::from_fen("rnbqkbnr/pppppppp/9/8/8/8/PPPPPPPP/RNBQKBNR w").is_err());
    assert!(Board::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKXNR w").is_err());
    assert!(Board::from_fen("rnbqkbnr/pppppppp/08/8/8/8/PPPPPPPP/RNBQKBNR w").is_err());
    assert!(Board::from_fen("rnbqkbnr/pppppppp/44/8/8/8/PPPPPPPP/RNBQKBNR w").is_ok());
    assert!(Board::from_fen("rnbqkbnr/pppppppp/53/8/8/8/PPPPPPPP/RNBQKBNR w").is_err());
    let long_rank = format!("{}/8/8/8/8/8/8/8 w - - 0 1", "9".repeat(29));
    assert!(Board::from_fen(&long_rank).is_err());
    assert!(Board::from_fen(START.replace(" w ", " x ").as_str()).is_err());
}

#[test]
fn snapshot() {
    let board = Board::new();
    let snapshot = board.snapshot();
    assert_eq!(snapshot.get(tile("e1")), Some((PieceType::King, Side::White)));
    assert_eq!(snapshot.get(tile("d8")), Some((PieceType::Queen, Side::Black)));
    assert_eq!(snapshot.get(tile("e4")), None);
    assert_eq!(snapshot.turn(), Side::White);

    let mut moved = board.light_clone();
    moved.move_piece_from(tile("e2"), tile("e4"));
    let after = moved.snapshot();
    assert_ne!(after, snapshot);
    assert_eq!(after.get(tile("e4")), Some((PieceType::Pawn, Side::White)));
    assert_ne!(after.code(tile("e4")), snapshot.code(tile("e2")), "Flags are part of the code");
}

#[test]
fn snapshot_serialization() {
    let mut board = Board::new();
    board.move_piece_from(tile("e2"), tile("e4"));
    board.switch_turn();
    let snapshot = board.snapshot();
    let bytes = postcard::to_allocvec(&snapshot).unwrap();
    // Length prefix, the grid as one byte string, then the side.
    assert_eq!(bytes.len(), 1 + 64 + 1);
    let restored: Snapshot = postcard::from_bytes(&bytes).unwrap();
    assert_eq!(restored, snapshot);
    assert_eq!(restored.turn(), Side::Black);
    assert_eq!(restored.get(tile("e4")), Some((PieceType::Pawn, Side::White)));

    let bytes = postcard::to_allocvec(&tile("e4")).unwrap();
    assert_eq!(postcard::from_bytes::<Tile>(&bytes).unwrap(), tile("e4"));
    let bytes = postcard::to_allocvec(&(9u8, 2u8)).unwrap();
    assert!(postcard::from_bytes::<Tile>(&bytes).is_err(), "Tiles off the board are rejected");
}

#[test]
fn no_king_is_never_in_check() {
    let mut board = Board::empty();
    board.place(PieceType::Rook, Side::Black, tile("e8"));
    assert!(!board.validator().is_in_check(Side::White));
    assert!(board.validator().is_attacked(tile("e1"), Side::Black));
}

#[test]
fn random_playouts() {
    let mut rng = StdRng::seed_from_u64(0x5EED);
    for _ in 0..20 {
        let mut game = Game::new();
        for _ in 0..150 {
            if game.status().is_finished() {
                break;
            }
            let moves = playable_moves(game.board());
            let _move = moves.choose(&mut rng).expect("Unfinished game has moves").clone();
            let side = game.board().turn();
            game.play(_move.from(), _move.to(), _move.promotion_type())
                .unwrap_or_else(|error| panic!("{_move:?} was offered but rejected: {error}"));
            check_board_invariants(game.board());
            assert_eq!(game.board().turn(), side.opposite());
            assert!(
                !game.board().validator().is_in_check(side),
                "{side} left its king in check"
            );
        }
    }
}

fn perft_counts(fen: &str, depth: usize) -> PerftResult {
    let board = Board::from_fen(fen).unwrap();
    let result = perft(&board, depth);
    println!(" - setup: | {fen} | depth: {depth}\n details: {result}");
    result
}

#[test]
fn perft_start() {
    for (depth, expected) in [1, 20, 400, 8902].into_iter().enumerate() {
        assert_eq!(perft_counts(START, depth).all, expected, "depth {depth}");
    }
    let result = perft_counts(START, 3);
    assert_eq!((result.captures, result.checks, result.checkmates), (34, 12, 0));
}

#[test]
fn perft_kiwipete() {
    let result = perft_counts(KIWIPETE, 1);
    assert_eq!((result.all, result.captures, result.castles), (48, 8, 2));
    let result = perft_counts(KIWIPETE, 2);
    assert_eq!(
        result,
        PerftResult {
            all: 2039,
            captures: 351,
            en_passant: 1,
            castles: 91,
            promotions: 0,
            checks: 3,
            checkmates: 0,
        }
    );
}

#[test]
fn perft_position_3() {
    assert_eq!(perft_counts(POSITION_3, 1).all, 14);
    assert_eq!(perft_counts(POSITION_3, 2).all, 191);
    let result = perft_counts(POSITION_3, 3);
    assert_eq!((result.all, result.captures, result.en_passant), (2812, 209, 2));
    assert_eq!(result.checks, 267);
}

#[test]
fn perft_promotions() {
    assert_eq!(perft_counts(POSITION_4, 1).all, 6);
    let result = perft_counts(POSITION_4, 2);
    assert_eq!((result.all, result.captures, result.castles), (264, 87, 6));
    assert_eq!((result.promotions, result.checks), (48, 10));
    assert_eq!(perft_counts(POSITION_5, 1).all, 44);
    assert_eq!(perft_counts(POSITION_5, 2).all, 1486);
}

#[test]
#[ignore = "slow"]
fn perft_deep() {
    assert_eq!(perft_counts(START, 4).all, 197_281);
    assert_eq!(perft_counts(KIWIPETE, 3).all, 97_862);
    assert_eq!(perft_counts(POSITION_3, 4).all, 43_238);
}

#[test]
fn perf_test_reports() {
    assert!(utils::perf_test(POSITION_3, 2, 191, true).unwrap());
    assert!(!utils::perf_test(POSITION_3, 1, 15, false).unwrap());
    assert!(utils::perf_test("not a fen", 1, 0, false).is_err());
}
