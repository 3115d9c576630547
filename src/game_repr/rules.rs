// Boundary between the search and whatever owns the board
//
// The search never copies a position. It walks the tree by applying a move,
// recursing and undoing the move on the same object, so every implementation
// must keep make/unmake strictly stack ordered.

use crate::error::EngineResult;
use chess::Color;
use smallvec::SmallVec;
use std::fmt;

/// Legal moves of one node, in generation order
pub type MoveList<M> = SmallVec<[M; 64]>;

/// Why a game ended without a winner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawReason {
    Stalemate,
    InsufficientMaterial,
    SeventyFiveMoves,
    FivefoldRepetition,
}

/// Game-theoretic state of a position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Game continues
    InProgress,
    /// Game is drawn
    Draw(DrawReason),
    /// The given side has won (the other side is checkmated)
    Win(Color),
}

impl Outcome {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Outcome::InProgress)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::InProgress => write!(f, "in progress"),
            Outcome::Draw(reason) => write!(f, "draw ({:?})", reason),
            Outcome::Win(Color::White) => write!(f, "white wins"),
            Outcome::Win(Color::Black) => write!(f, "black wins"),
        }
    }
}

/// Operations the search needs from a game position
pub trait Rules {
    type Move: Copy + PartialEq + fmt::Debug + fmt::Display;

    /// All legal moves; the order decides search order and root tie-breaks
    fn legal_moves(&self) -> MoveList<Self::Move>;

    /// Apply a legal move in place
    ///
    /// An illegal move is an error and must leave the position untouched.
    fn apply_move(&mut self, mv: Self::Move) -> EngineResult<()>;

    /// Revert the most recently applied move
    fn undo_last_move(&mut self) -> EngineResult<()>;

    fn outcome(&self) -> Outcome;

    fn side_to_move(&self) -> Color;

    fn is_terminal(&self) -> bool {
        self.outcome().is_terminal()
    }
}

/// Apply `mv`, run `f` on the child position and undo the move again
///
/// The undo happens on every path out of `f`, including errors, so callers
/// can return early (for example on a beta cutoff) without unbalancing the
/// make/unmake stack.
pub fn with_move<P, T, F>(pos: &mut P, mv: P::Move, f: F) -> EngineResult<T>
where
    P: Rules + ?Sized,
    F: FnOnce(&mut P) -> EngineResult<T>,
{
    pos.apply_move(mv)?;
    let result = f(pos);
    pos.undo_last_move()?;
    result
}
