use serde::{Deserialize, Serialize};

use crate::coord::Coord;
use crate::force::Force;
use crate::piece::PieceKind;


// Move descriptor as produced by the rules engine and sent over the wire. Castling is expressed
// as a two-square king move (e1g1), never as "king takes rook".
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct TurnMove {
    pub from: Coord,
    pub to: Coord,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promotion: Option<PieceKind>,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TurnError {
    PieceMissing,
    WrongTurnOrder,
    CannotCaptureOwnPiece,
    BadPromotion,
    IllegalMove,
    GameOver,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum VictoryReason {
    Checkmate,
    Flag,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum DrawReason {
    Stalemate,
    FiftyMoveRule,
    ThreefoldRepetition,
    InsufficientMaterial,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum ChessGameStatus {
    Active,
    Victory(Force, VictoryReason),
    Draw(DrawReason),
}

impl TurnMove {
    pub fn new(from: Coord, to: Coord) -> Self { TurnMove { from, to, promotion: None } }
    pub fn with_promotion(self, promotion: PieceKind) -> Self {
        TurnMove { promotion: Some(promotion), ..self }
    }
}


// Chess legality lives behind this trait. The match controller never inspects the position
// itself: it only applies moves and asks for the outcome.
pub trait RulesEngine {
    // Back to the standard starting position, history cleared.
    fn reset(&mut self);

    // Applies the move if legal. Returns the move as it was actually applied, which may differ
    // from the input in the promotion field (e.g. promotion request dropped for a non-pawn move).
    fn try_move(&mut self, mv: TurnMove) -> Result<TurnMove, TurnError>;

    fn active_force(&self) -> Force;
    fn status(&self) -> ChessGameStatus;
    fn is_check(&self) -> bool;
    fn fen(&self) -> String;

    fn is_game_over(&self) -> bool { self.status() != ChessGameStatus::Active }
}
