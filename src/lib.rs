// Hikarlsen - a small UCI chess engine
//
// Fixed-depth negamax with alpha-beta pruning over a material plus
// piece-square evaluation. Chess rules come from the `chess` crate through
// the `game_repr::Rules` boundary; the search runs on a worker thread
// driven by `agent::SearchController` and the `uci` front end.

pub mod agent;
pub mod config;
pub mod error;
pub mod game_repr;
pub mod uci;

pub use agent::ai::{select_move, CancellationSignal, PieceSquareEvaluator, SearchController, SearchResult};
pub use config::EngineConfig;
pub use error::{EngineError, EngineResult};
pub use game_repr::Position;
pub use uci::UciEngine;
