pub mod board;
pub mod definitions;
pub mod engine;
mod fen;
pub mod moves;
pub mod piece;
pub mod tile;
pub mod utils;
pub mod validator;
