//! Value types exchanged between the controller, its components and callers

use serde::{Deserialize, Serialize};
use shakmaty::{Role, Square};
use std::fmt;
use std::str::FromStr;

pub use shared::protocol::{AIDifficulty, GameStatus, PieceColor};

use crate::game::ai::GameMode;
use crate::game::position::Position;

/// Opaque session identifier issued by the game service
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First eight characters, for status lines
    pub fn short(&self) -> &str {
        match self.0.char_indices().nth(8) {
            Some((idx, _)) => &self.0[..idx],
            None => &self.0,
        }
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which side is drawn at the bottom of the board. Presentation only.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    White,
    Black,
}

impl Orientation {
    pub fn flipped(self) -> Self {
        match self {
            Orientation::White => Orientation::Black,
            Orientation::Black => Orientation::White,
        }
    }
}

/// A move the caller wants the game service to play
///
/// Never stored; built per submission. `promotion` uses `shakmaty::Role`
/// so only real piece kinds can be requested.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MoveAttempt {
    pub from: Square,
    pub to: Square,
    pub promotion: Option<Role>,
}

/// A move string that is not UCI long algebraic
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid move {text:?}: {reason}")]
pub struct ParseMoveError {
    pub text: String,
    pub reason: &'static str,
}

impl MoveAttempt {
    pub fn new(from: Square, to: Square) -> Self {
        Self {
            from,
            to,
            promotion: None,
        }
    }

    pub fn with_promotion(mut self, role: Role) -> Self {
        self.promotion = Some(role);
        self
    }

    /// Build from the separate square/promotion strings the services use
    pub fn from_parts(
        from: &str,
        to: &str,
        promotion: Option<&str>,
    ) -> Result<Self, ParseMoveError> {
        let text = format!("{}{}{}", from, to, promotion.unwrap_or_default());
        let err = |reason| ParseMoveError {
            text: text.clone(),
            reason,
        };

        let from = Square::from_str(from.trim()).map_err(|_| err("bad origin square"))?;
        let to = Square::from_str(to.trim()).map_err(|_| err("bad target square"))?;
        let promotion = match promotion.map(str::trim).filter(|p| !p.is_empty()) {
            None => None,
            Some(p) => {
                let mut chars = p.chars();
                let role = chars
                    .next()
                    .and_then(|c| Role::from_char(c.to_ascii_lowercase()))
                    .ok_or_else(|| err("bad promotion piece"))?;
                if chars.next().is_some() {
                    return Err(err("bad promotion piece"));
                }
                Some(role)
            }
        };

        Ok(Self { from, to, promotion })
    }

    /// UCI long algebraic form, e.g. `e7e8q`
    pub fn uci(&self) -> String {
        match self.promotion {
            Some(role) => format!("{}{}{}", self.from, self.to, role.char()),
            None => format!("{}{}", self.from, self.to),
        }
    }

    pub fn promotion_str(&self) -> Option<String> {
        self.promotion.map(|role| role.char().to_string())
    }
}

impl fmt::Display for MoveAttempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.uci())
    }
}

impl FromStr for MoveAttempt {
    type Err = ParseMoveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if !s.is_ascii() || !(4..=5).contains(&s.len()) {
            return Err(ParseMoveError {
                text: s.to_string(),
                reason: "expected four or five characters",
            });
        }
        let promotion = if s.len() == 5 { Some(&s[4..5]) } else { None };
        Self::from_parts(&s[0..2], &s[2..4], promotion)
    }
}

/// Notation details the game service attaches to an applied move
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MoveRecord {
    pub from: String,
    pub to: String,
    pub san: Option<String>,
    pub piece: Option<String>,
    pub captured: Option<String>,
}

/// Authoritative result of an accepted move
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MoveOutcome {
    pub position: Position,
    pub turn: PieceColor,
    pub status: GameStatus,
    pub is_check: bool,
    pub is_checkmate: bool,
    pub winner: Option<PieceColor>,
    pub record: Option<MoveRecord>,
}

/// Authoritative session state as returned by create / fetch
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub session_id: SessionId,
    pub position: Position,
    pub turn: PieceColor,
    pub status: GameStatus,
    pub winner: Option<PieceColor>,
}

/// The one game the controller is playing
///
/// Replaced wholesale on every authoritative response; fields are never
/// patched one at a time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GameSession {
    pub session_id: SessionId,
    pub position: Position,
    pub turn: PieceColor,
    pub status: GameStatus,
    pub winner: Option<PieceColor>,
    pub mode: GameMode,
}

impl GameSession {
    pub fn from_snapshot(snapshot: SessionSnapshot, mode: GameMode) -> Self {
        Self {
            session_id: snapshot.session_id,
            position: snapshot.position,
            turn: snapshot.turn,
            status: snapshot.status,
            winner: snapshot.winner,
            mode,
        }
    }

    /// Successor session after an accepted move
    pub fn after_move(&self, outcome: &MoveOutcome) -> Self {
        Self {
            session_id: self.session_id.clone(),
            position: outcome.position.clone(),
            turn: outcome.turn,
            status: outcome.status,
            winner: outcome.winner,
            mode: self.mode,
        }
    }

    /// Whether the automated opponent is the side to move
    pub fn is_ai_turn(&self) -> bool {
        self.mode.ai_color() == Some(self.turn)
    }
}

/// Move proposed by the AI service
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Suggestion {
    pub attempt: MoveAttempt,
    pub san: Option<String>,
}
