// Improvement potential. Support promotion to pieces other than queen in the UI. The engine
//   already accepts any promotion target; only the local move path always asks for a queen.

use cozy_chess::{Board, Color, File, GameStatus, Move, Piece, Rank, Square};

use crate::board::{ChessGameStatus, DrawReason, RulesEngine, TurnError, TurnMove, VictoryReason};
use crate::coord::Coord;
use crate::force::Force;
use crate::piece::PieceKind;


const FIFTY_MOVE_RULE_HALFMOVES: u8 = 100;
const REPETITIONS_FOR_DRAW: usize = 3;

fn to_square(coord: Coord) -> Square {
    Square::new(
        File::index(coord.col.to_zero_based() as usize),
        Rank::index(coord.row.to_zero_based() as usize),
    )
}

fn to_force(color: Color) -> Force {
    match color {
        Color::White => Force::White,
        Color::Black => Force::Black,
    }
}

fn to_piece(kind: PieceKind) -> Piece {
    match kind {
        PieceKind::Pawn => Piece::Pawn,
        PieceKind::Knight => Piece::Knight,
        PieceKind::Bishop => Piece::Bishop,
        PieceKind::Rook => Piece::Rook,
        PieceKind::Queen => Piece::Queen,
        PieceKind::King => Piece::King,
    }
}

fn from_piece(piece: Piece) -> PieceKind {
    match piece {
        Piece::Pawn => PieceKind::Pawn,
        Piece::Knight => PieceKind::Knight,
        Piece::Bishop => PieceKind::Bishop,
        Piece::Rook => PieceKind::Rook,
        Piece::Queen => PieceKind::Queen,
        Piece::King => PieceKind::King,
    }
}

fn last_rank(color: Color) -> Rank {
    match color {
        Color::White => Rank::Eighth,
        Color::Black => Rank::First,
    }
}


// Standard chess on top of `cozy_chess`. Adds the draw rules that `cozy_chess` leaves to the
// caller: threefold repetition and insufficient material.
#[derive(Clone, Debug)]
pub struct ChessGame {
    board: Board,
    // Hashes of every position reached in this game, including the starting one.
    position_history: Vec<u64>,
}

impl ChessGame {
    pub fn new() -> Self { Self::from_board(Board::default()) }

    pub fn from_fen(fen: &str) -> Result<Self, String> {
        let board = Board::from_fen(fen, false).map_err(|err| format!("invalid FEN: {err:?}"))?;
        Ok(Self::from_board(board))
    }

    fn from_board(board: Board) -> Self {
        let position_history = vec![board.hash()];
        ChessGame { board, position_history }
    }

    // `cozy_chess` encodes castling as the king capturing its own rook. Translate the usual
    // two-square king move into that form.
    fn engine_target(&self, from: Square, to: Square, color: Color) -> Square {
        let file_distance = (from.file() as i8 - to.file() as i8).abs();
        if self.board.piece_on(from) != Some(Piece::King)
            || from.rank() != to.rank()
            || file_distance != 2
        {
            return to;
        }
        let rights = self.board.castle_rights(color);
        let rook_file = if (to.file() as i8) > (from.file() as i8) {
            rights.short
        } else {
            rights.long
        };
        match rook_file {
            Some(file) => Square::new(file, from.rank()),
            None => to,
        }
    }

    fn is_insufficient_material(&self) -> bool {
        let occupied = self.board.occupied().len();
        let minor_pieces = self.board.pieces(Piece::Knight) | self.board.pieces(Piece::Bishop);
        occupied == 2 || (occupied == 3 && !minor_pieces.is_empty())
    }

    fn is_threefold_repetition(&self) -> bool {
        let Some(current) = self.position_history.last() else {
            return false;
        };
        self.position_history.iter().filter(|&h| h == current).count() >= REPETITIONS_FOR_DRAW
    }
}

impl RulesEngine for ChessGame {
    fn reset(&mut self) { *self = ChessGame::new(); }

    fn try_move(&mut self, mv: TurnMove) -> Result<TurnMove, TurnError> {
        if self.is_game_over() {
            return Err(TurnError::GameOver);
        }
        let color = self.board.side_to_move();
        let from = to_square(mv.from);
        let to = to_square(mv.to);
        let piece = self.board.piece_on(from).ok_or(TurnError::PieceMissing)?;
        if self.board.color_on(from) != Some(color) {
            return Err(TurnError::WrongTurnOrder);
        }
        if self.board.color_on(to) == Some(color) {
            return Err(TurnError::CannotCaptureOwnPiece);
        }
        let promotion = if piece == Piece::Pawn && to.rank() == last_rank(color) {
            let target = mv.promotion.unwrap_or(PieceKind::Queen);
            if matches!(target, PieceKind::Pawn | PieceKind::King) {
                return Err(TurnError::BadPromotion);
            }
            Some(to_piece(target))
        } else {
            None
        };
        let engine_move = Move {
            from,
            to: self.engine_target(from, to, color),
            promotion,
        };
        if !self.board.is_legal(engine_move) {
            return Err(TurnError::IllegalMove);
        }
        self.board.play_unchecked(engine_move);
        self.position_history.push(self.board.hash());
        Ok(TurnMove {
            from: mv.from,
            to: mv.to,
            promotion: promotion.map(from_piece),
        })
    }

    fn active_force(&self) -> Force { to_force(self.board.side_to_move()) }

    fn status(&self) -> ChessGameStatus {
        match self.board.status() {
            GameStatus::Won => ChessGameStatus::Victory(
                self.active_force().opponent(),
                VictoryReason::Checkmate,
            ),
            GameStatus::Drawn => {
                if self.board.halfmove_clock() >= FIFTY_MOVE_RULE_HALFMOVES {
                    ChessGameStatus::Draw(DrawReason::FiftyMoveRule)
                } else {
                    ChessGameStatus::Draw(DrawReason::Stalemate)
                }
            }
            GameStatus::Ongoing => {
                if self.is_threefold_repetition() {
                    ChessGameStatus::Draw(DrawReason::ThreefoldRepetition)
                } else if self.is_insufficient_material() {
                    ChessGameStatus::Draw(DrawReason::InsufficientMaterial)
                } else {
                    ChessGameStatus::Active
                }
            }
        }
    }

    fn is_check(&self) -> bool { !self.board.checkers().is_empty() }

    fn fen(&self) -> String { format!("{}", self.board) }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::fen::STARTING_FEN;

    fn mv(s: &str) -> TurnMove {
        let (from, to) = crate::coord::parse_coord_pair(s).unwrap();
        TurnMove::new(from, to)
    }

    fn replay(game: &mut ChessGame, log: &str) -> Result<(), TurnError> {
        for turn in log.split_whitespace() {
            game.try_move(mv(turn))?;
        }
        Ok(())
    }

    #[test]
    fn starting_position() {
        let game = ChessGame::new();
        assert_eq!(game.fen(), STARTING_FEN);
        assert_eq!(game.active_force(), Force::White);
        assert_eq!(game.status(), ChessGameStatus::Active);
        assert!(!game.is_check());
    }

    #[test]
    fn scholars_mate() {
        let mut game = ChessGame::new();
        replay(&mut game, "e2e4 e7e5 f1c4 b8c6 d1h5 g8f6 h5f7").unwrap();
        assert!(game.is_check());
        assert_eq!(
            game.status(),
            ChessGameStatus::Victory(Force::White, VictoryReason::Checkmate)
        );
        assert_eq!(game.try_move(mv("e8f7")), Err(TurnError::GameOver));
    }

    #[test]
    fn rejected_moves_leave_position_intact() {
        let mut game = ChessGame::new();
        let fen = game.fen();
        assert_eq!(game.try_move(mv("e3e4")), Err(TurnError::PieceMissing));
        assert_eq!(game.try_move(mv("e7e5")), Err(TurnError::WrongTurnOrder));
        assert_eq!(game.try_move(mv("a1a2")), Err(TurnError::CannotCaptureOwnPiece));
        assert_eq!(game.try_move(mv("e2e5")), Err(TurnError::IllegalMove));
        assert_eq!(game.fen(), fen);
        assert_eq!(game.active_force(), Force::White);
    }

    #[test]
    fn castling_as_king_move() {
        let mut game = ChessGame::from_fen("4k3/8/8/8/8/8/8/4K2R w K - 0 1").unwrap();
        let applied = game.try_move(mv("e1g1")).unwrap();
        assert_eq!(applied, mv("e1g1"));
        assert!(game.fen().starts_with("4k3/8/8/8/8/8/8/5RK1 b"), "{}", game.fen());
    }

    #[test]
    fn promotion_defaults_to_queen() {
        let mut game = ChessGame::from_fen("8/P6k/8/8/8/8/8/4K3 w - - 0 1").unwrap();
        let applied = game.try_move(mv("a7a8")).unwrap();
        assert_eq!(applied.promotion, Some(PieceKind::Queen));
        assert!(game.fen().starts_with("Q7/7k/"), "{}", game.fen());
    }

    #[test]
    fn promotion_request_dropped_for_regular_move() {
        let mut game = ChessGame::new();
        let applied = game.try_move(mv("e2e4").with_promotion(PieceKind::Queen)).unwrap();
        assert_eq!(applied, mv("e2e4"));
    }

    #[test]
    fn stalemate() {
        let game = ChessGame::from_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1").unwrap();
        assert_eq!(game.status(), ChessGameStatus::Draw(DrawReason::Stalemate));
    }

    #[test]
    fn insufficient_material() {
        let game = ChessGame::from_fen("8/8/8/4k3/8/8/8/4K2N w - - 0 1").unwrap();
        assert_eq!(game.status(), ChessGameStatus::Draw(DrawReason::InsufficientMaterial));
        let game = ChessGame::from_fen("8/8/8/4k3/8/8/8/4K2R w - - 0 1").unwrap();
        assert_eq!(game.status(), ChessGameStatus::Active);
    }

    #[test]
    fn fifty_move_rule() {
        let mut game = ChessGame::from_fen("8/8/8/4k3/8/8/8/R3K3 w - - 99 80").unwrap();
        assert_eq!(game.status(), ChessGameStatus::Active);
        game.try_move(mv("a1a2")).unwrap();
        assert_eq!(game.status(), ChessGameStatus::Draw(DrawReason::FiftyMoveRule));
    }

    #[test]
    fn threefold_repetition() {
        let mut game = ChessGame::new();
        replay(&mut game, "g1f3 g8f6 f3g1 f6g8 g1f3 g8f6 f3g1").unwrap();
        assert_eq!(game.status(), ChessGameStatus::Active);
        game.try_move(mv("f6g8")).unwrap();
        assert_eq!(game.status(), ChessGameStatus::Draw(DrawReason::ThreefoldRepetition));
    }

    #[test]
    fn reset() {
        let mut game = ChessGame::new();
        replay(&mut game, "e2e4 e7e5").unwrap();
        game.reset();
        assert_eq!(game.fen(), STARTING_FEN);
        assert_eq!(game.active_force(), Force::White);
    }
}
