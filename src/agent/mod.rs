pub mod ai;
pub use ai::{
    select_move, CancellationSignal, PieceSquareEvaluator, SearchController, SearchListener, SearchResult,
    SearchState, SearchStatus,
};
