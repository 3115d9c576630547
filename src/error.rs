// Error types for the engine
//
// Covers position setup, move application against the rules adapter,
// search parameter validation and the lifecycle of the search worker.

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while setting up or running a search
#[derive(Error, Debug)]
pub enum EngineError {
    /// FEN string could not be parsed into a valid position
    #[error("Invalid FEN '{fen}': {reason}")]
    InvalidFen { fen: String, reason: String },

    /// Move is not legal in the current position
    #[error("Illegal move '{mv}' in position {fen}")]
    IllegalMove { mv: String, fen: String },

    /// Undo requested with no applied move left on the history stack
    #[error("No move to undo")]
    EmptyHistory,

    /// Search depth must be at least one ply
    #[error("Invalid search depth {0} (must be at least 1)")]
    InvalidDepth(u8),

    /// Position differs from its root state after the search returned
    #[error("Position corrupted by search: expected {expected}, found {found}")]
    PositionCorrupted { expected: String, found: String },

    /// A search task still owns the position and did not stop in time
    #[error("A search is already running and did not stop in time")]
    SearchInProgress,

    /// Waiting for the search task exceeded the given timeout
    #[error("Search did not finish within {0:?}")]
    AwaitTimeout(Duration),

    /// The search worker terminated without reporting a result
    #[error("Search worker panicked")]
    WorkerPanicked,

    /// The search worker thread could not be created
    #[error("Failed to spawn search worker: {0}")]
    WorkerSpawn(#[source] std::io::Error),

    /// A protocol command was missing arguments or had malformed ones
    #[error("{0}")]
    Protocol(String),

    /// Reading commands or writing replies failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for engine operations
pub type EngineResult<T> = Result<T, EngineError>;
