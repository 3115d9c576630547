use super::*;

// ==================== HELPER FUNCTIONS ====================

/// Helper function to build a position from a FEN that is known to be valid
pub fn fen(fen: &str) -> Position {
    Position::from_fen(fen).unwrap_or_else(|e| panic!("bad test FEN {}: {}", fen, e))
}

/// Helper function to play a sequence of UCI moves from the initial setup
pub fn play(moves: &[&str]) -> Position {
    Position::from_moves(None, moves).unwrap()
}

/// Helper function to check if a move exists in the move list
pub fn has_move(pos: &Position, uci: &str) -> bool {
    pos.legal_moves().iter().any(|m| m.to_string() == uci)
}

// ==================== TEST MODULES ====================
