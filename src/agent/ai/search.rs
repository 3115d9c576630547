// Root move selection
//
// Walks the root moves in generation order, searches each one to a fixed
// depth with a full window and keeps the first move with the highest value.
// Cancellation is checked once per root move, before the move is applied, so
// a root move that has started is always searched to completion.

use super::controller::CancellationSignal;
use super::evaluation::{Evaluator, Score, INFINITY};
use super::negamax::{negamax, SearchStats};
use crate::error::{EngineError, EngineResult};
use crate::game_repr::{with_move, Move, Rules};
use log::debug;
use std::time::{Duration, Instant};

/// How a root search ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchStatus {
    /// Every root move was searched
    Completed,
    /// The signal was observed before the last root move was started
    Cancelled,
}

/// Result of a search operation
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult<M = Move> {
    /// Best root move, `None` if there were no legal moves or the search was
    /// cancelled before the first one finished
    pub best_move: Option<M>,
    /// Value of `best_move` for the side to move at the root
    pub score: Option<Score>,
    pub status: SearchStatus,
    /// Total depth in plies, root move included
    pub depth: u8,
    /// Root moves searched to completion
    pub candidates_explored: usize,
    pub stats: SearchStats,
    pub elapsed: Duration,
}

impl<M> SearchResult<M> {
    pub fn is_cancelled(&self) -> bool {
        self.status == SearchStatus::Cancelled
    }
}

/// Progress report handed out after each root move finishes
#[derive(Debug, Clone, Copy)]
pub struct CandidateReport<M> {
    /// 1-based position of the move in the root move list
    pub index: usize,
    pub total: usize,
    pub mv: M,
    pub score: Score,
    pub best_move: M,
    pub best_score: Score,
}

/// Pick the best root move
///
/// # Arguments
/// * `pos` - Root position, restored before returning
/// * `evaluator` - Leaf evaluator
/// * `depth` - Total plies to search, the root move included (must be >= 1)
/// * `signal` - Checked before each root move
/// * `on_candidate` - Called after each root move has been searched
///
/// Ties keep the earliest move in generation order.
pub fn select_move<P, E, F>(
    pos: &mut P,
    evaluator: &E,
    depth: u8,
    signal: &CancellationSignal,
    mut on_candidate: F,
) -> EngineResult<SearchResult<P::Move>>
where
    P: Rules,
    E: Evaluator<P>,
    F: FnMut(&CandidateReport<P::Move>),
{
    if depth == 0 {
        return Err(EngineError::InvalidDepth(depth));
    }

    let start_time = Instant::now();
    let moves = pos.legal_moves();
    let total = moves.len();

    let mut stats = SearchStats::default();
    let mut best: Option<(P::Move, Score)> = None;
    let mut explored = 0;
    let mut status = SearchStatus::Completed;

    for mv in moves {
        if signal.is_cancelled() {
            debug!("search cancelled after {} of {} root moves", explored, total);
            status = SearchStatus::Cancelled;
            break;
        }

        // The child value is from the opponent's side; negate it back to ours
        let score = -with_move(pos, mv, |child| {
            negamax(child, evaluator, -INFINITY, INFINITY, depth - 1, &mut stats)
        })?;
        explored += 1;

        let improved = match best {
            None => true,
            Some((_, best_score)) => score > best_score,
        };
        if improved {
            best = Some((mv, score));
        }

        if let Some((best_move, best_score)) = best {
            debug!("root move {}/{} {}: {} (best {} {})", explored, total, mv, score, best_move, best_score);
            on_candidate(&CandidateReport {
                index: explored,
                total,
                mv,
                score,
                best_move,
                best_score,
            });
        }
    }

    Ok(SearchResult {
        best_move: best.map(|(mv, _)| mv),
        score: best.map(|(_, score)| score),
        status,
        depth,
        candidates_explored: explored,
        stats,
        elapsed: start_time.elapsed(),
    })
}
