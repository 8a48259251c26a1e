//! Game mode and automated-opponent settings
//!
//! Decides whether the turn scheduler is active at all and, when it is, which
//! side the AI service plays and how hard it tries.
//!
//! # Game Modes
//!
//! - **Local**: Two humans sharing one board (hot-seat). The scheduler never runs.
//! - **VsAI**: One human against the AI service (specify AI color and difficulty).
//!
//! # Difficulty Levels
//!
//! Difficulty is forwarded verbatim to the AI service, which maps it to its
//! own search settings:
//!
//! | Difficulty | Depth | Skill level | Time limit |
//! |------------|-------|-------------|------------|
//! | Easy       | 5     | 5           | 0.1s       |
//! | Medium     | 10    | 10          | 0.5s       |
//! | Hard       | 15    | 20          | 1.0s       |
//!
//! # Retry Policy
//!
//! A failed suggestion leaves the turn with the AI. The scheduler retries the
//! suggestion request up to [`AiRetryPolicy::max_attempts`] times with a
//! linear backoff. Submitting the suggested move is tried once; a rejected or
//! failed submission ends the round. Either way the caller can start another
//! round with `SessionController::retry_ai_move`.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::game::types::{AIDifficulty, PieceColor};
use shared::protocol::GameModeKind;

/// Game mode selection
///
/// The mode travels inside the session, so every call site asks the mode
/// instead of checking loose flags.
///
/// # Examples
///
/// ```rust
/// use xfchess_session::game::ai::GameMode;
/// use xfchess_session::game::types::{AIDifficulty, PieceColor};
///
/// // Human plays White, AI plays Black
/// let mode = GameMode::vs_ai(AIDifficulty::Hard);
/// assert_eq!(mode.ai_color(), Some(PieceColor::Black));
///
/// assert_eq!(GameMode::Local.ai_color(), None);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GameMode {
    /// Both sides are moved by the local human
    #[default]
    Local,

    /// Human vs AI opponent
    ///
    /// The specified color is controlled by the AI service.
    /// The other color is controlled by human input.
    #[serde(rename = "vs_ai")]
    VsAI {
        /// The color the AI plays
        ai_color: PieceColor,
        /// Strength requested from the AI service
        difficulty: AIDifficulty,
    },
}

impl GameMode {
    /// AI plays Black at the given difficulty
    pub fn vs_ai(difficulty: AIDifficulty) -> Self {
        GameMode::VsAI {
            ai_color: PieceColor::Black,
            difficulty,
        }
    }

    /// The AI's color, or `None` in local mode
    pub fn ai_color(self) -> Option<PieceColor> {
        match self {
            GameMode::Local => None,
            GameMode::VsAI { ai_color, .. } => Some(ai_color),
        }
    }

    pub fn difficulty(self) -> Option<AIDifficulty> {
        match self {
            GameMode::Local => None,
            GameMode::VsAI { difficulty, .. } => Some(difficulty),
        }
    }

    pub fn is_vs_ai(self) -> bool {
        matches!(self, GameMode::VsAI { .. })
    }

    /// Mode tag sent with `POST /games`
    pub fn wire_kind(self) -> GameModeKind {
        match self {
            GameMode::Local => GameModeKind::Local,
            GameMode::VsAI { .. } => GameModeKind::Ai,
        }
    }
}

/// Bounded retry for failed AI suggestions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AiRetryPolicy {
    /// Total suggestion requests per scheduler round (at least 1)
    pub max_attempts: u32,
    /// Delay before attempt `n` is `backoff * (n - 1)`
    pub backoff: Duration,
}

impl Default for AiRetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_millis(250),
        }
    }
}

impl AiRetryPolicy {
    /// Single attempt, no retry
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            backoff: Duration::ZERO,
        }
    }

    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Wait before the given 1-based attempt
    pub fn delay_before(&self, attempt: u32) -> Duration {
        self.backoff * attempt.saturating_sub(1)
    }
}
