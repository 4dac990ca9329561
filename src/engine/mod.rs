pub mod attacks;
pub mod board;
pub mod generator;
pub mod types;

pub use board::Board;
pub use generator::{generate, generate_with, Position};
pub use types::*;
