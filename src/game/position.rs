//! Position snapshots as issued by the game service
//!
//! A [`Position`] is the full FEN text of a board (placement, side to move,
//! castling rights, en passant square, clocks). The client never derives one
//! position from another; it only stores what the service sent and hands it
//! back (to the AI service, to the renderer, to the undo history).
//!
//! The FEN is validated once on construction with `shakmaty` so that a
//! malformed service response is caught at the network boundary instead of
//! surfacing later inside the controller.

use serde::{Deserialize, Serialize};
use shakmaty::fen::Fen;
use std::fmt;
use std::str::FromStr;

use crate::game::types::PieceColor;

/// FEN of the standard starting arrangement
pub const STARTING_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Immutable board snapshot
///
/// Equality is textual: two positions are equal when the service produced
/// the same FEN string for them.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Position {
    fen: String,
    side_to_move: PieceColor,
}

/// A FEN string that `shakmaty` could not parse
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid FEN {fen:?}: {reason}")]
pub struct InvalidPosition {
    pub fen: String,
    pub reason: String,
}

impl Position {
    /// Standard chess starting position
    pub fn starting() -> Self {
        Self {
            fen: STARTING_FEN.to_string(),
            side_to_move: PieceColor::White,
        }
    }

    /// Parse and validate a FEN string, keeping its exact text
    pub fn from_fen(fen: impl Into<String>) -> Result<Self, InvalidPosition> {
        let fen = fen.into();
        let parsed = Fen::from_str(fen.trim()).map_err(|e| InvalidPosition {
            fen: fen.clone(),
            reason: e.to_string(),
        })?;

        let side_to_move = match parsed.as_setup().turn {
            shakmaty::Color::White => PieceColor::White,
            shakmaty::Color::Black => PieceColor::Black,
        };

        Ok(Self { fen, side_to_move })
    }

    pub fn as_fen(&self) -> &str {
        &self.fen
    }

    pub fn side_to_move(&self) -> PieceColor {
        self.side_to_move
    }

    /// Piece placement field only (first FEN field)
    pub fn placement(&self) -> &str {
        self.fen.split_whitespace().next().unwrap_or_default()
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::starting()
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.fen)
    }
}

impl FromStr for Position {
    type Err = InvalidPosition;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_fen(s)
    }
}

impl TryFrom<String> for Position {
    type Error = InvalidPosition;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_fen(value)
    }
}

impl From<Position> for String {
    fn from(position: Position) -> Self {
        position.fen
    }
}
