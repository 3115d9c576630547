// Position evaluation function
// Returns an absolute score in centipawns: positive favours White,
// negative favours Black, regardless of whose turn it is.

use super::piece_square_tables::pst_value;
use crate::game_repr::{Outcome, Position, Rules};
use chess::{Board, Color, Piece, ALL_PIECES};

/// Search and evaluation score in centipawns
pub type Score = i32;

/// Bound used for the full search window.
///
/// `-INFINITY` is `-i32::MAX`, so negating either bound never overflows.
pub const INFINITY: Score = i32::MAX;

/// Score of a decisive result; the same magnitude as the window bounds
pub const WIN_SCORE: Score = INFINITY;

pub const DRAW_SCORE: Score = 0;

// Material values in centipawns
const PAWN_VALUE: Score = 100;
const KNIGHT_VALUE: Score = 300;
const BISHOP_VALUE: Score = 300;
const ROOK_VALUE: Score = 500;
const QUEEN_VALUE: Score = 900;
const KING_VALUE: Score = 1000;

/// Static evaluator used at search leaves
///
/// Implementations are pure: they must not mutate the position and must
/// score from White's point of view. The searcher applies the side-to-move
/// sign itself.
pub trait Evaluator<P: Rules + ?Sized> {
    fn evaluate(&self, pos: &P) -> Score;
}

/// Material plus piece-square evaluator
#[derive(Debug, Clone, Copy, Default)]
pub struct PieceSquareEvaluator;

impl Evaluator<Position> for PieceSquareEvaluator {
    fn evaluate(&self, pos: &Position) -> Score {
        match terminal_score(pos.outcome()) {
            Some(score) => score,
            None => evaluate_material_and_position(pos.board()),
        }
    }
}

/// Get material value for a piece type
pub fn piece_value(piece: Piece) -> Score {
    match piece {
        Piece::Pawn => PAWN_VALUE,
        Piece::Knight => KNIGHT_VALUE,
        Piece::Bishop => BISHOP_VALUE,
        Piece::Rook => ROOK_VALUE,
        Piece::Queen => QUEEN_VALUE,
        Piece::King => KING_VALUE,
    }
}

/// Absolute score of a finished game, `None` while the game is still going
pub fn terminal_score(outcome: Outcome) -> Option<Score> {
    match outcome {
        Outcome::InProgress => None,
        Outcome::Draw(_) => Some(DRAW_SCORE),
        Outcome::Win(Color::White) => Some(WIN_SCORE),
        Outcome::Win(Color::Black) => Some(-WIN_SCORE),
    }
}

/// `+1` for White, `-1` for Black; turns absolute scores into side-to-move scores
pub fn perspective(color: Color) -> Score {
    match color {
        Color::White => 1,
        Color::Black => -1,
    }
}

/// Evaluate material balance and piece-square tables
pub fn evaluate_material_and_position(board: &Board) -> Score {
    let mut score = 0;

    for piece in ALL_PIECES {
        let material = piece_value(piece);

        for square in *board.pieces(piece) & *board.color_combined(Color::White) {
            score += material + pst_value(piece, square, Color::White);
        }
        for square in *board.pieces(piece) & *board.color_combined(Color::Black) {
            score -= material + pst_value(piece, square, Color::Black);
        }
    }

    score
}
