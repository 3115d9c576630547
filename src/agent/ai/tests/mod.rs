use super::*;
use crate::error::{EngineError, EngineResult};
use crate::game_repr::{Color, MoveList, Outcome, Position, Rules};
use std::cell::Cell;

// ==================== SYNTHETIC GAME TREE ====================

/// A node of a hand-built game tree
///
/// `value` is the absolute (White-positive) static value the tree evaluator
/// reports when the search stops at this node.
#[derive(Debug, Clone)]
pub struct Node {
    pub value: Score,
    pub children: Vec<usize>,
}

/// Game tree driven through the same `Rules` boundary as real chess
///
/// Moves are node ids. White moves at even plies, Black at odd plies.
#[derive(Debug, Clone)]
pub struct GameTree {
    pub nodes: Vec<Node>,
    pub path: Vec<usize>,
}

impl GameTree {
    /// Uniform tree of the given branching factor and height with
    /// pseudo-random node values derived from `seed`
    pub fn uniform(branching: usize, height: u8, seed: u64) -> Self {
        let mut state = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        let mut next_value = move || {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            ((state >> 33) % 2001) as Score - 1000
        };

        let mut nodes = vec![Node { value: next_value(), children: Vec::new() }];
        let mut frontier = vec![0];
        for _ in 0..height {
            let mut next = Vec::new();
            for parent in frontier {
                for _ in 0..branching {
                    let id = nodes.len();
                    nodes.push(Node { value: next_value(), children: Vec::new() });
                    nodes[parent].children.push(id);
                    next.push(id);
                }
            }
            frontier = next;
        }

        Self { nodes, path: Vec::new() }
    }

    /// Root with one leaf child per value, in order
    pub fn leaves(values: &[Score]) -> Self {
        let mut nodes = vec![Node { value: 0, children: Vec::new() }];
        for &value in values {
            let id = nodes.len();
            nodes.push(Node { value, children: Vec::new() });
            nodes[0].children.push(id);
        }
        Self { nodes, path: Vec::new() }
    }

    pub fn current(&self) -> usize {
        self.path.last().copied().unwrap_or(0)
    }
}

impl Rules for GameTree {
    type Move = usize;

    fn legal_moves(&self) -> MoveList<usize> {
        self.nodes[self.current()].children.iter().copied().collect()
    }

    fn apply_move(&mut self, mv: usize) -> EngineResult<()> {
        if !self.nodes[self.current()].children.contains(&mv) {
            return Err(EngineError::IllegalMove {
                mv: mv.to_string(),
                fen: format!("node {}", self.current()),
            });
        }
        self.path.push(mv);
        Ok(())
    }

    fn undo_last_move(&mut self) -> EngineResult<()> {
        self.path.pop().map(|_| ()).ok_or(EngineError::EmptyHistory)
    }

    fn outcome(&self) -> Outcome {
        Outcome::InProgress
    }

    fn side_to_move(&self) -> Color {
        if self.path.len() % 2 == 0 {
            Color::White
        } else {
            Color::Black
        }
    }
}

/// Tree evaluator that counts how often it is called
#[derive(Debug, Default)]
pub struct CountingEvaluator {
    pub calls: Cell<u64>,
}

impl Evaluator<GameTree> for CountingEvaluator {
    fn evaluate(&self, tree: &GameTree) -> Score {
        self.calls.set(self.calls.get() + 1);
        tree.nodes[tree.current()].value
    }
}

/// Plain negamax without pruning, used as the reference value
pub fn full_width<P: Rules, E: Evaluator<P>>(pos: &mut P, evaluator: &E, depth: u8) -> Score {
    let moves = pos.legal_moves();
    if depth == 0 || moves.is_empty() || pos.is_terminal() {
        return perspective(pos.side_to_move()) * evaluator.evaluate(pos);
    }

    let mut best = -INFINITY;
    for mv in moves {
        pos.apply_move(mv).unwrap();
        best = best.max(-full_width(pos, evaluator, depth - 1));
        pos.undo_last_move().unwrap();
    }
    best
}

// ==================== CHESS HELPERS ====================

/// Helper function to build a position from a FEN that is known to be valid
pub fn fen(fen: &str) -> Position {
    Position::from_fen(fen).unwrap_or_else(|e| panic!("bad test FEN {}: {}", fen, e))
}

/// Colour-flipped FEN: ranks mirrored, piece colours swapped, other side to move
pub fn mirror_fen(fen: &str) -> String {
    let fields: Vec<&str> = fen.split_whitespace().collect();

    let placement = fields[0]
        .split('/')
        .rev()
        .map(swap_case)
        .collect::<Vec<_>>()
        .join("/");
    let side = if fields[1] == "w" { "b" } else { "w" };

    let mut castling: Vec<char> = swap_case(fields[2]).chars().collect();
    castling.sort_by_key(|c| "KQkq-".find(*c));
    let castling: String = castling.into_iter().collect();

    let ep = match fields[3] {
        "-" => "-".to_string(),
        square => {
            let (file, rank) = square.split_at(1);
            let rank = if rank == "3" { "6" } else { "3" };
            format!("{}{}", file, rank)
        }
    };

    format!("{} {} {} {} {} {}", placement, side, castling, ep, fields[4], fields[5])
}

fn swap_case(s: &str) -> String {
    s.chars()
        .map(|c| {
            if c.is_ascii_uppercase() {
                c.to_ascii_lowercase()
            } else {
                c.to_ascii_uppercase()
            }
        })
        .collect()
}

/// Positions exercised by the property tests
pub const CORPUS: &[&str] = &[
    "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
    "r1bqkbnr/pppp1ppp/2n5/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R w KQkq - 2 3",
    "r3k2r/pppq1ppp/2n2n2/3pp3/3PP3/2N2N2/PPPQ1PPP/R3K2R b KQkq - 4 8",
    "4k3/8/8/3q4/8/3R4/8/4K3 b - - 0 1",
    "6k1/5ppp/8/8/8/8/8/R5K1 w - - 0 1",
    "8/2k5/8/3P4/8/8/5K2/8 w - - 0 1",
];

// ==================== TEST MODULES ====================
