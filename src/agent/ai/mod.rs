// AI Agent - Negamax with Alpha-Beta Pruning
//
// Fixed-depth negamax over a material plus piece-square evaluator. The root
// move selector runs on a worker thread owned by the search controller and
// can be cancelled between root moves.
//
// Key features:
// - Deterministic (same position and depth always give the same move)
// - Generic over the `Rules` boundary, so it can search any game tree
// - Make/unmake on a single position, no copies during the search

mod controller;
mod evaluation;
mod negamax;
mod piece_square_tables;
mod search;

#[cfg(test)]
mod tests;

pub use controller::{CancellationSignal, NullListener, SearchController, SearchListener, SearchState};
pub use evaluation::{
    evaluate_material_and_position, perspective, piece_value, terminal_score, Evaluator, PieceSquareEvaluator,
    Score, DRAW_SCORE, INFINITY, WIN_SCORE,
};
pub use negamax::{negamax, SearchStats};
pub use piece_square_tables::pst_value;
pub use search::{select_move, CandidateReport, SearchResult, SearchStatus};
