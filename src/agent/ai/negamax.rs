// Negamax Search with Alpha-Beta Pruning
//
// Negamax is a variant of the minimax algorithm that simplifies implementation
// by taking advantage of the zero-sum property of chess: max(a, b) = -min(-a, -b).
// Instead of separate maximizing and minimizing functions, we use one function
// that negates the score at each level.
//
// The evaluator is absolute (White positive). Leaves multiply its score by the
// side-to-move sign, so every value returned here is from the perspective of
// the side to move at the node.
//
// Moves are searched in generation order with no ordering heuristics, no
// transposition table and no quiescence extension. Depth is fixed by the caller.

use super::evaluation::{perspective, Evaluator, Score, INFINITY};
use crate::error::EngineResult;
use crate::game_repr::{with_move, Rules};

/// Counters collected while searching
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchStats {
    /// Nodes entered, leaves included
    pub nodes: u64,
    /// Calls into the evaluator
    pub evaluations: u64,
    /// Nodes where the remaining moves were skipped after alpha >= beta
    pub cutoffs: u64,
}

/// Negamax search with alpha-beta pruning
///
/// # Arguments
///
/// * `pos` - Current position, mutated in place and restored before returning
/// * `evaluator` - Static evaluator used at depth 0 and at terminal nodes
/// * `alpha` - Lower bound of the window the caller still cares about
/// * `beta` - Upper bound of that window
/// * `depth` - Remaining plies; 0 evaluates without generating moves
///
/// # Returns
///
/// The value of the position for the side to move. Errors come only from the
/// rules adapter (a move it generated could not be applied or undone).
pub fn negamax<P, E>(
    pos: &mut P,
    evaluator: &E,
    mut alpha: Score,
    beta: Score,
    depth: u8,
    stats: &mut SearchStats,
) -> EngineResult<Score>
where
    P: Rules,
    E: Evaluator<P>,
{
    stats.nodes += 1;

    if depth == 0 || pos.is_terminal() {
        stats.evaluations += 1;
        return Ok(perspective(pos.side_to_move()) * evaluator.evaluate(pos));
    }

    let mut best = -INFINITY;

    for mv in pos.legal_moves() {
        let value = -with_move(pos, mv, |child| {
            negamax(child, evaluator, -beta, -alpha, depth - 1, stats)
        })?;

        best = best.max(value);
        alpha = alpha.max(best);

        // Beta cutoff: the opponent already has a better option elsewhere
        if alpha >= beta {
            stats.cutoffs += 1;
            break;
        }
    }

    Ok(best)
}
