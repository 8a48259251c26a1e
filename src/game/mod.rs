//! Chess session logic - one remotely validated game at a time
//!
//! The client never decides whether a move is legal. It sends moves to the
//! game service, shows only what the service confirms, and keeps a local undo
//! history that affects the display alone.
//!
//! # Module Organization
//!
//! - `position` - FEN snapshot issued by the game service
//! - `types` - Move attempts, outcomes and the session record
//! - `error` - Error taxonomy for every operation
//! - `events` - Session events and status-line text
//! - `resources` - Undo stack, submission slot and the session store
//! - `sync` - Move submission and reconciliation
//! - `ai` - Game mode and the automated-opponent scheduler
//! - `session` - `SessionController`, the composition root
//!
//! # Data Flow
//!
//! 1. `SessionController::create` asks the game service for a session
//! 2. The turn scheduler checks the confirmed turn and, if the AI is due,
//!    asks the AI service for a move
//! 3. Human and AI moves both go through `MoveSynchronizer`
//! 4. Each accepted response replaces the session and records the previous
//!    position for undo

pub mod ai;
pub mod error;
pub mod events;
pub mod position;
pub mod resources;
pub mod session;
pub mod sync;
pub mod types;

pub use error::{
    AiTurnError, EmptyHistory, MoveError, ServiceError, SessionCreateError, SessionError,
    SuggestionError,
};
pub use events::SessionEvent;
pub use position::Position;
pub use session::{SessionController, SessionView};
pub use types::{GameSession, MoveAttempt, MoveOutcome, Orientation, SessionId};
