use std::env;

use anyhow::{bail, Context};
use chess_rules::core::definitions::NotationType;
use chess_rules::utils::{divide, PerftResult};
use chess_rules::Board;

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args: Vec<String> = env::args().collect();
    let Some(fen) = args.get(1) else {
        bail!("Usage: {} <fen> <depth> [expected]", args[0]);
    };
    let board = Board::from_fen(fen)?;
    let depth: usize = args
        .get(2)
        .context("Missing depth")?
        .parse()
        .context("Depth must be a number")?;
    if depth == 0 {
        bail!("Depth must be at least 1");
    }
    let expected: Option<usize> = args
        .get(3)
        .map(|text| text.parse::<usize>())
        .transpose()
        .context("Expected count must be a number")?;

    print!("{board}");
    let mut total = PerftResult::default();
    for (_move, result) in divide(&board, depth) {
        println!("{} {}", _move.notation(NotationType::Coordinate), result.all);
        total += result;
    }
    println!("\n{total}");
    match expected {
        Some(expected) if expected != total.all => {
            bail!("Found {} moves, expected {expected}", total.all)
        }
        _ => Ok(()),
    }
}
