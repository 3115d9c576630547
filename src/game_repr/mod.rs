mod position;
mod rules;

#[cfg(test)]
mod tests;

pub use position::*;
pub use rules::*;

pub use chess::{ChessMove as Move, Color};
