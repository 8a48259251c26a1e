//! Session events and their status-line text
//!
//! State changes and remote-call results publish a [`SessionEvent`]. A move
//! publishes `MovePending` and then its outcome; precondition failures
//! (`InFlight`, `NotYourTurn`, `Rewound`, `GameOver`) publish nothing and
//! leave the status message as it was. The `Display` text of the latest
//! event is the advisory status message; nothing parses it back.

use tokio::sync::broadcast;

use crate::game::types::{AIDifficulty, GameStatus, MoveAttempt, Orientation, PieceColor, SessionId};

/// Buffer for subscribers that fall behind
pub const EVENT_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Creating,
    Created {
        session_id: SessionId,
        turn: PieceColor,
    },
    CreateFailed {
        reason: String,
    },
    MovePending {
        attempt: MoveAttempt,
    },
    MoveApplied {
        by: PieceColor,
        turn: PieceColor,
        status: GameStatus,
        winner: Option<PieceColor>,
    },
    MoveRejected {
        reason: String,
    },
    TransportFailed {
        reason: String,
    },
    AiThinking {
        difficulty: AIDifficulty,
        attempt: u32,
    },
    AiFailed {
        reason: String,
    },
    Undone {
        remaining: usize,
    },
    NothingToUndo,
    Resynced,
    Refreshed {
        turn: PieceColor,
        status: GameStatus,
    },
    Resigned {
        color: PieceColor,
        winner: Option<PieceColor>,
    },
    OrientationFlipped(Orientation),
    Disposed,
}

impl std::fmt::Display for SessionEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionEvent::Creating => write!(f, "Creating new game..."),
            SessionEvent::Created { session_id, turn } => {
                write!(f, "Game {} created! {} to move.", session_id.short(), turn)
            }
            SessionEvent::CreateFailed { reason } => write!(f, "Error creating game: {}", reason),
            SessionEvent::MovePending { attempt } => write!(f, "Processing move {}...", attempt),
            SessionEvent::MoveApplied {
                turn,
                status,
                winner,
                ..
            } => match status {
                GameStatus::Checkmate => match winner {
                    Some(w) => write!(f, "Checkmate! {} wins!", w),
                    None => write!(f, "Checkmate!"),
                },
                GameStatus::Check => write!(f, "Check! {} to move.", turn),
                GameStatus::Stalemate => write!(f, "Draw by stalemate."),
                GameStatus::Draw => write!(f, "Draw."),
                GameStatus::Resigned => match winner {
                    Some(w) => write!(f, "Game over, {} wins.", w),
                    None => write!(f, "Game over."),
                },
                GameStatus::Active => write!(f, "Turn: {}", turn),
            },
            SessionEvent::MoveRejected { reason } => write!(f, "Illegal move: {}", reason),
            SessionEvent::TransportFailed { reason } => write!(f, "Error: {}", reason),
            SessionEvent::AiThinking { difficulty, attempt } => {
                if *attempt > 1 {
                    write!(f, "AI ({}) is thinking... (attempt {})", difficulty, attempt)
                } else {
                    write!(f, "AI ({}) is thinking...", difficulty)
                }
            }
            SessionEvent::AiFailed { reason } => write!(f, "AI could not move: {}", reason),
            SessionEvent::Undone { .. } => write!(f, "Move undone (local view only)"),
            SessionEvent::NothingToUndo => write!(f, "No moves to undo"),
            SessionEvent::Resynced => write!(f, "Back to the current position"),
            SessionEvent::Refreshed { turn, status } => {
                write!(f, "Game reloaded: {} to move ({})", turn, status)
            }
            SessionEvent::Resigned { color, winner } => match winner {
                Some(w) => write!(f, "{} resigned. {} wins!", color, w),
                None => write!(f, "{} resigned.", color),
            },
            SessionEvent::OrientationFlipped(o) => match o {
                Orientation::White => write!(f, "Board oriented for White"),
                Orientation::Black => write!(f, "Board oriented for Black"),
            },
            SessionEvent::Disposed => write!(f, "Game closed"),
        }
    }
}

/// Fan-out of session events
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<SessionEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        let (tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self { tx }
    }
}

impl EventBus {
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.tx.subscribe()
    }

    /// Send to current subscribers; having none is fine
    pub fn publish(&self, event: SessionEvent) {
        let _ = self.tx.send(event);
    }
}
