//! Error types for the session client
//!
//! One enum per operation family. Every variant is recoverable: the
//! controller reports it through the returned `Result` and the status
//! message, and its state is left exactly as it was before the call.

use crate::game::types::{GameStatus, PieceColor};

/// Failure talking to either remote service
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ServiceError {
    /// The service understood the request and declined it (HTTP 4xx)
    #[error("request rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// The service does not know the session (HTTP 404)
    #[error("session not found: {message}")]
    NotFound { message: String },

    /// Network fault, timeout, or server-side failure (HTTP 5xx)
    #[error("transport error: {0}")]
    Transport(String),

    /// The response body could not be understood
    #[error("malformed response: {0}")]
    Decode(String),
}

impl ServiceError {
    pub fn is_rejection(&self) -> bool {
        matches!(self, ServiceError::Rejected { .. } | ServiceError::NotFound { .. })
    }
}

/// `create` / `new_game` failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionCreateError {
    #[error("a session is already being created")]
    AlreadyPending,

    #[error("could not create game: {0}")]
    Service(#[from] ServiceError),

    /// The controller was torn down while the request was in flight
    #[error("session creation was superseded")]
    Superseded,
}

/// Move submission failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MoveError {
    #[error("no game in progress")]
    NoSession,

    #[error("another move is still being processed")]
    InFlight,

    #[error("game is over ({status})")]
    GameOver { status: GameStatus },

    #[error("it is {color}'s turn (automated opponent)")]
    NotYourTurn { color: PieceColor },

    /// The board shows an undone position; resync before moving
    #[error("board is showing an earlier position; resync first")]
    Rewound,

    /// Illegal per the game service
    #[error("illegal move: {0}")]
    Rejected(String),

    #[error("transport error: {0}")]
    Transport(String),

    /// The session changed while the move was in flight; response dropped
    #[error("move response belongs to a superseded session")]
    Superseded,
}

impl MoveError {
    /// Failures detected locally, before any network call
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            MoveError::NoSession
                | MoveError::InFlight
                | MoveError::GameOver { .. }
                | MoveError::NotYourTurn { .. }
                | MoveError::Rewound
        )
    }
}

impl From<ServiceError> for MoveError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Rejected { message, .. } => MoveError::Rejected(message),
            ServiceError::NotFound { .. } => MoveError::NoSession,
            ServiceError::Transport(msg) => MoveError::Transport(msg),
            ServiceError::Decode(msg) => MoveError::Transport(msg),
        }
    }
}

/// The AI service could not produce a move
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SuggestionError {
    /// `success: false`, or an error body from the AI service
    #[error("AI declined to move: {0}")]
    Declined(String),

    #[error("AI service unavailable: {0}")]
    Service(#[from] ServiceError),
}

/// Undo with nothing to undo
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("nothing to undo")]
pub struct EmptyHistory;

/// Automated-opponent turn failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AiTurnError {
    /// Not vs-AI, not the AI's turn, or the game is over
    #[error("no automated move is due")]
    NotDue,

    #[error("another move is still being processed")]
    Busy,

    #[error(transparent)]
    Suggestion(#[from] SuggestionError),

    #[error("AI move failed: {0}")]
    Move(#[from] MoveError),

    #[error("AI turn belongs to a superseded session")]
    Superseded,
}

/// Failures of the auxiliary session operations (refresh, resign, queries)
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("no game in progress")]
    NoSession,

    #[error("another move is still being processed")]
    InFlight,

    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error(transparent)]
    Suggestion(#[from] SuggestionError),

    #[error("response belongs to a superseded session")]
    Superseded,
}

/// Result type alias for move submission
pub type MoveResult<T> = Result<T, MoveError>;

/// Result type alias for service calls
pub type ServiceResult<T> = Result<T, ServiceError>;
