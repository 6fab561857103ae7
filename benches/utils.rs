use chess_rules::utils::{perft, playable_moves};
use chess_rules::{Board, Game, Side, Tile};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

const KIWIPETE: &str = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - ";

fn legal_move_count(board: &Board, side: Side) -> usize {
    let validator = board.validator();
    validator.reset_cache();
    validator.get_all_legal_moves(side).len()
}

fn attacked_tiles(board: &Board, by: Side) -> usize {
    let validator = board.validator();
    Tile::all().filter(|tile| validator.is_attacked(*tile, by)).count()
}

fn stupid_game(max_steps: usize) -> Game {
    let mut rng = StdRng::seed_from_u64(42);
    let mut game = Game::new();
    for _ in 0..max_steps {
        if game.status().is_finished() {
            break;
        }
        let moves = playable_moves(game.board());
        let Some(_move) = moves.choose(&mut rng) else {
            break;
        };
        if game
            .play(_move.from(), _move.to(), _move.promotion_type())
            .is_err()
        {
            break;
        }
    }
    game
}

fn criterion_benchmark(c: &mut Criterion) {
    let start = Board::default();
    let kiwipete = Board::from_fen(KIWIPETE).expect("Valid FEN");
    c.bench_function("legal moves start", |b| {
        b.iter(|| legal_move_count(black_box(&start), Side::White))
    });
    c.bench_function("legal moves kiwipete", |b| {
        b.iter(|| legal_move_count(black_box(&kiwipete), Side::White))
    });
    c.bench_function("attacked tiles kiwipete", |b| {
        b.iter(|| attacked_tiles(black_box(&kiwipete), Side::Black))
    });
    c.bench_function("perft start 3", |b| b.iter(|| perft(black_box(&start), 3)));
    c.bench_function("stupid game 100", |b| b.iter(|| stupid_game(100)));
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
