use super::rules::{DrawReason, MoveList, Outcome, Rules};
use crate::error::{EngineError, EngineResult};
use chess::{Board, BoardStatus, ChessMove, Color, MoveGen, Piece};
use std::fmt;
use std::str::FromStr;

pub const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// a1, c1, ..., b2, d2, ...
const DARK_SQUARES: u64 = 0xAA55_AA55_AA55_AA55;

/// Halfmove clock value at which the game ends automatically
const SEVENTY_FIVE_MOVE_PLIES: u32 = 150;

const FIVEFOLD: usize = 5;

#[derive(Clone, Copy, PartialEq, Eq)]
struct Snapshot {
    board: Board,
    halfmove_clock: u32,
    fullmove_number: u32,
}

/// Mutable game position with make/unmake history
///
/// Move generation and check detection come from `chess::Board`; this type
/// adds the undo stack, the move clocks and the automatic draw rules.
/// Equality compares the whole state, history included.
#[derive(Clone, PartialEq, Eq)]
pub struct Position {
    board: Board,
    halfmove_clock: u32,
    fullmove_number: u32,
    history: Vec<Snapshot>,
}

impl Default for Position {
    fn default() -> Self {
        Self {
            board: Board::default(),
            halfmove_clock: 0,
            fullmove_number: 1,
            history: Vec::new(),
        }
    }
}

impl Position {
    /// Build a position from a FEN string, or the initial setup for `None`
    pub fn new(fen: Option<&str>) -> EngineResult<Position> {
        match fen {
            Some(fen) => Position::from_fen(fen),
            None => Ok(Position::default()),
        }
    }

    /// Parse a FEN string. The clock fields are optional and default to `0 1`.
    pub fn from_fen(fen: &str) -> EngineResult<Position> {
        let fields: Vec<&str> = fen.split_whitespace().collect();
        if fields.len() < 4 || fields.len() > 6 {
            return Err(invalid_fen(fen, "expected 4 to 6 fields"));
        }

        let halfmove_clock = match fields.get(4) {
            Some(field) => field
                .parse::<u32>()
                .map_err(|_| invalid_fen(fen, "bad halfmove clock"))?,
            None => 0,
        };
        let fullmove_number = match fields.get(5) {
            Some(field) => field
                .parse::<u32>()
                .map_err(|_| invalid_fen(fen, "bad fullmove number"))?,
            None => 1,
        };

        let normalized = format!("{} {} {} {} {} {}", fields[0], fields[1], fields[2], fields[3], halfmove_clock, fullmove_number);
        let board = Board::from_str(&normalized).map_err(|e| invalid_fen(fen, &e.to_string()))?;

        Ok(Position {
            board,
            halfmove_clock,
            fullmove_number: fullmove_number.max(1),
            history: Vec::new(),
        })
    }

    /// Initial setup followed by a list of UCI move tokens
    pub fn from_moves<S: AsRef<str>>(fen: Option<&str>, moves: &[S]) -> EngineResult<Position> {
        let mut pos = Position::new(fen)?;
        for token in moves {
            pos.apply_uci(token.as_ref())?;
        }
        Ok(pos)
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn halfmove_clock(&self) -> u32 {
        self.halfmove_clock
    }

    pub fn fullmove_number(&self) -> u32 {
        self.fullmove_number
    }

    /// Number of moves that can still be undone
    pub fn ply_count(&self) -> usize {
        self.history.len()
    }

    pub fn is_in_check(&self) -> bool {
        self.board.checkers().popcnt() > 0
    }

    pub fn to_fen(&self) -> String {
        // Board's own FEN always carries "0 1" clocks; swap in ours.
        let board_fen = self.board.to_string();
        let placement: Vec<&str> = board_fen.split_whitespace().take(4).collect();
        format!("{} {} {}", placement.join(" "), self.halfmove_clock, self.fullmove_number)
    }

    /// Resolve a UCI token (`e2e4`, `e7e8q`) against the legal moves
    pub fn parse_uci(&self, token: &str) -> EngineResult<ChessMove> {
        MoveGen::new_legal(&self.board)
            .find(|mv| mv.to_string() == token)
            .ok_or_else(|| EngineError::IllegalMove {
                mv: token.to_string(),
                fen: self.to_fen(),
            })
    }

    pub fn apply_uci(&mut self, token: &str) -> EngineResult<ChessMove> {
        let mv = self.parse_uci(token)?;
        self.apply_move(mv)?;
        Ok(mv)
    }

    /// How often the current position occurred since the last irreversible move
    pub fn repetition_count(&self) -> usize {
        let window = (self.halfmove_clock as usize).min(self.history.len());
        1 + self
            .history
            .iter()
            .rev()
            .take(window)
            .filter(|snapshot| snapshot.board == self.board)
            .count()
    }

    /// Neither side can possibly deliver mate
    pub fn is_insufficient_material(&self) -> bool {
        self.has_insufficient_material(Color::White) && self.has_insufficient_material(Color::Black)
    }

    fn has_insufficient_material(&self, color: Color) -> bool {
        let ours = *self.board.color_combined(color);
        let theirs = *self.board.color_combined(!color);
        let pawns = *self.board.pieces(Piece::Pawn);
        let knights = *self.board.pieces(Piece::Knight);
        let bishops = *self.board.pieces(Piece::Bishop);
        let rooks = *self.board.pieces(Piece::Rook);
        let queens = *self.board.pieces(Piece::Queen);
        let kings = *self.board.pieces(Piece::King);

        if (ours & (pawns | rooks | queens)).popcnt() > 0 {
            return false;
        }

        // A lone knight can only mate with help from enemy pieces that block
        // the king, which queens never do.
        if (ours & knights).popcnt() > 0 {
            return ours.popcnt() <= 2 && (theirs & !kings & !queens).popcnt() == 0;
        }

        // Bishops all on one square colour cannot mate without other material
        if (ours & bishops).popcnt() > 0 {
            let same_colour = bishops.0 & DARK_SQUARES == 0 || bishops.0 & !DARK_SQUARES == 0;
            return same_colour && pawns.popcnt() == 0 && knights.popcnt() == 0;
        }

        true
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            board: self.board,
            halfmove_clock: self.halfmove_clock,
            fullmove_number: self.fullmove_number,
        }
    }
}

impl Rules for Position {
    type Move = ChessMove;

    fn legal_moves(&self) -> MoveList<ChessMove> {
        MoveGen::new_legal(&self.board).collect()
    }

    fn apply_move(&mut self, mv: ChessMove) -> EngineResult<()> {
        if !self.board.legal(mv) {
            return Err(EngineError::IllegalMove {
                mv: mv.to_string(),
                fen: self.to_fen(),
            });
        }

        let irreversible = self.board.piece_on(mv.get_source()) == Some(Piece::Pawn)
            || self.board.piece_on(mv.get_dest()).is_some();

        self.history.push(self.snapshot());
        if self.board.side_to_move() == Color::Black {
            self.fullmove_number += 1;
        }
        self.halfmove_clock = if irreversible { 0 } else { self.halfmove_clock + 1 };
        self.board = self.board.make_move_new(mv);
        Ok(())
    }

    fn undo_last_move(&mut self) -> EngineResult<()> {
        let snapshot = self.history.pop().ok_or(EngineError::EmptyHistory)?;
        self.board = snapshot.board;
        self.halfmove_clock = snapshot.halfmove_clock;
        self.fullmove_number = snapshot.fullmove_number;
        Ok(())
    }

    fn outcome(&self) -> Outcome {
        match self.board.status() {
            BoardStatus::Checkmate => return Outcome::Win(!self.board.side_to_move()),
            BoardStatus::Stalemate => return Outcome::Draw(DrawReason::Stalemate),
            BoardStatus::Ongoing => {}
        }

        if self.is_insufficient_material() {
            Outcome::Draw(DrawReason::InsufficientMaterial)
        } else if self.halfmove_clock >= SEVENTY_FIVE_MOVE_PLIES {
            Outcome::Draw(DrawReason::SeventyFiveMoves)
        } else if self.repetition_count() >= FIVEFOLD {
            Outcome::Draw(DrawReason::FivefoldRepetition)
        } else {
            Outcome::InProgress
        }
    }

    fn side_to_move(&self) -> Color {
        self.board.side_to_move()
    }
}

impl fmt::Debug for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Position")
            .field("fen", &self.to_fen())
            .field("plies", &self.history.len())
            .finish()
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_fen())
    }
}

fn invalid_fen(fen: &str, reason: &str) -> EngineError {
    EngineError::InvalidFen {
        fen: fen.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_start_position() {
        let pos = Position::default();
        assert_eq!(pos.to_fen(), START_FEN);
        assert_eq!(pos.legal_moves().len(), 20);
        assert_eq!(pos.side_to_move(), Color::White);
    }

    #[test]
    fn test_fen_round_trip_keeps_clocks() {
        let fen = "r3k2r/8/8/8/8/8/8/R3K2R b KQkq - 12 40";
        let pos = Position::from_fen(fen).unwrap();
        assert_eq!(pos.to_fen(), fen);
        assert_eq!(pos.halfmove_clock(), 12);
        assert_eq!(pos.fullmove_number(), 40);
    }

    #[test]
    fn test_fen_without_clocks() {
        let pos = Position::from_fen("4k3/8/8/8/8/8/4P3/4K3 w - -").unwrap();
        assert_eq!(pos.halfmove_clock(), 0);
        assert_eq!(pos.fullmove_number(), 1);
    }

    #[test]
    fn test_invalid_fen_rejected() {
        assert!(matches!(
            Position::from_fen("not a fen"),
            Err(EngineError::InvalidFen { .. })
        ));
        assert!(matches!(
            Position::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - x 1"),
            Err(EngineError::InvalidFen { .. })
        ));
    }

    #[test]
    fn test_clocks_follow_moves() {
        let mut pos = Position::default();
        pos.apply_uci("g1f3").unwrap();
        assert_eq!(pos.halfmove_clock(), 1);
        assert_eq!(pos.fullmove_number(), 1);

        pos.apply_uci("e7e5").unwrap();
        assert_eq!(pos.halfmove_clock(), 0, "pawn move resets the clock");
        assert_eq!(pos.fullmove_number(), 2);

        pos.apply_uci("f3e5").unwrap();
        assert_eq!(pos.halfmove_clock(), 0, "capture resets the clock");
    }

    #[test]
    fn test_parse_uci_promotion() {
        let pos = Position::from_fen("8/4P3/8/8/8/8/k7/4K3 w - - 0 1").unwrap();
        let mv = pos.parse_uci("e7e8q").unwrap();
        assert_eq!(mv.get_promotion(), Some(Piece::Queen));
        assert!(pos.parse_uci("e7e8").is_err(), "promotion piece is required");
    }
}
