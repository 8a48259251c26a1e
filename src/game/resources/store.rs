//! Generation-tagged session store
//!
//! Holds the one piece of shared mutable state in the client: the
//! authoritative [`GameSession`], the position currently shown to the
//! player, and the local undo history. The controller's components never
//! touch these fields directly; they go through the methods below, each of
//! which takes the lock once, updates everything that has to change
//! together, and releases it before returning. Nothing here is `async`, so
//! the lock is never held across a network call.
//!
//! # Generations
//!
//! Every create and every teardown bumps `generation`. Requests capture the
//! generation they were issued under in a ticket; a response whose ticket no
//! longer matches is dropped without touching state.
//!
//! # Rewound view
//!
//! `undo` moves entries from the undo stack into `rewound` and shows them.
//! While `rewound` is non-empty the displayed position is older than the
//! authoritative one. A move response that lands in that state updates the
//! session but not the display, and its pre-move position is queued in
//! `rewound` so `resync` rebuilds the full history.

use parking_lot::Mutex;
use tracing::{debug, info};

use crate::game::ai::GameMode;
use crate::game::error::{EmptyHistory, MoveError, ServiceError, SessionCreateError, SessionError};
use crate::game::events::{EventBus, SessionEvent};
use crate::game::position::Position;
use crate::game::resources::history::UndoStack;
use crate::game::types::{
    AIDifficulty, GameSession, GameStatus, MoveOutcome, Orientation, PieceColor, SessionId,
    SessionSnapshot,
};

#[derive(Debug, Default)]
struct SessionState {
    generation: u64,
    creating: bool,
    session: Option<GameSession>,
    displayed: Option<Position>,
    undo: UndoStack,
    /// Entries popped by `undo`, in pop order
    rewound: Vec<Position>,
    orientation: Orientation,
    message: String,
}

impl SessionState {
    fn publish(&mut self, events: &EventBus, event: SessionEvent) {
        self.message = event.to_string();
        events.publish(event);
    }

    fn restore_history(&mut self) {
        for position in self.rewound.drain(..).rev() {
            self.undo.push(position);
        }
    }
}

/// Outcome of [`SessionStore::begin_create`]
#[derive(Debug)]
pub enum CreateStart {
    /// Go ahead; the response must be handed back with this generation
    Fresh(u64),
    /// A session already exists; no request needed
    Existing(GameSession),
}

/// Context captured when a move is submitted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveTicket {
    pub generation: u64,
    pub session_id: SessionId,
    /// Authoritative position the move is played from
    pub position: Position,
    pub mover: PieceColor,
}

/// Context captured for an automated-opponent turn
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AiTicket {
    pub difficulty: AIDifficulty,
    pub mv: MoveTicket,
}

/// Plain copy of the store for callers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreSnapshot {
    pub generation: u64,
    pub creating: bool,
    pub session: Option<GameSession>,
    pub displayed: Option<Position>,
    pub history_len: usize,
    pub rewound_depth: usize,
    pub orientation: Orientation,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct SessionStore {
    state: Mutex<SessionState>,
    events: EventBus,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn generation(&self) -> u64 {
        self.state.lock().generation
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.state.lock().generation == generation
    }

    pub fn session(&self) -> Option<GameSession> {
        self.state.lock().session.clone()
    }

    pub fn displayed(&self) -> Option<Position> {
        self.state.lock().displayed.clone()
    }

    pub fn message(&self) -> String {
        self.state.lock().message.clone()
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        let state = self.state.lock();
        StoreSnapshot {
            generation: state.generation,
            creating: state.creating,
            session: state.session.clone(),
            displayed: state.displayed.clone(),
            history_len: state.undo.len(),
            rewound_depth: state.rewound.len(),
            orientation: state.orientation,
            message: state.message.clone(),
        }
    }

    /// Publish an event that does not change session state
    pub fn note(&self, event: SessionEvent) {
        self.state.lock().publish(&self.events, event);
    }

    /// Publish only if `generation` is still current
    pub fn note_for(&self, generation: u64, event: SessionEvent) {
        let mut state = self.state.lock();
        if state.generation == generation {
            state.publish(&self.events, event);
        }
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Reentry guard for `create`
    pub fn begin_create(&self) -> Result<CreateStart, SessionCreateError> {
        let mut state = self.state.lock();
        if state.creating {
            return Err(SessionCreateError::AlreadyPending);
        }
        if let Some(session) = &state.session {
            return Ok(CreateStart::Existing(session.clone()));
        }
        state.generation += 1;
        state.creating = true;
        let generation = state.generation;
        state.publish(&self.events, SessionEvent::Creating);
        Ok(CreateStart::Fresh(generation))
    }

    pub fn finish_create(
        &self,
        generation: u64,
        mode: GameMode,
        result: Result<SessionSnapshot, ServiceError>,
    ) -> Result<GameSession, SessionCreateError> {
        let mut state = self.state.lock();
        if state.generation != generation {
            debug!("[SESSION] Dropping create response for generation {}", generation);
            return Err(SessionCreateError::Superseded);
        }
        state.creating = false;

        match result {
            Ok(snapshot) => {
                let session = GameSession::from_snapshot(snapshot, mode);
                state.displayed = Some(session.position.clone());
                state.undo.clear();
                state.rewound.clear();
                state.session = Some(session.clone());
                state.publish(
                    &self.events,
                    SessionEvent::Created {
                        session_id: session.session_id.clone(),
                        turn: session.turn,
                    },
                );
                info!(
                    "[SESSION] Game {} created ({:?}), {} to move",
                    session.session_id, mode, session.turn
                );
                Ok(session)
            }
            Err(err) => {
                state.publish(
                    &self.events,
                    SessionEvent::CreateFailed {
                        reason: err.to_string(),
                    },
                );
                Err(SessionCreateError::Service(err))
            }
        }
    }

    /// Drop the current session; in-flight responses become stale
    pub fn teardown(&self) -> u64 {
        let mut state = self.state.lock();
        state.generation += 1;
        state.creating = false;
        state.session = None;
        state.displayed = None;
        state.undo.clear();
        state.rewound.clear();
        state.generation
    }

    // ------------------------------------------------------------------
    // Moves
    // ------------------------------------------------------------------

    /// Local checks for a human move; no network involved
    pub fn human_ticket(&self) -> Result<MoveTicket, MoveError> {
        let state = self.state.lock();
        let session = state.session.as_ref().ok_or(MoveError::NoSession)?;
        if !session.status.accepts_moves() {
            return Err(MoveError::GameOver {
                status: session.status,
            });
        }
        if session.is_ai_turn() {
            return Err(MoveError::NotYourTurn {
                color: session.turn,
            });
        }
        if !state.rewound.is_empty() {
            return Err(MoveError::Rewound);
        }
        Ok(MoveTicket {
            generation: state.generation,
            session_id: session.session_id.clone(),
            position: session.position.clone(),
            mover: session.turn,
        })
    }

    /// `Some` when the confirmed state says the AI should move now
    pub fn ai_ticket(&self) -> Option<AiTicket> {
        let state = self.state.lock();
        let session = state.session.as_ref()?;
        let difficulty = session.mode.difficulty()?;
        if !session.status.accepts_moves() || !session.is_ai_turn() {
            return None;
        }
        Some(AiTicket {
            difficulty,
            mv: MoveTicket {
                generation: state.generation,
                session_id: session.session_id.clone(),
                position: session.position.clone(),
                mover: session.turn,
            },
        })
    }

    /// Replace the session from an accepted move
    pub fn apply_outcome(
        &self,
        ticket: &MoveTicket,
        outcome: &MoveOutcome,
    ) -> Result<(), MoveError> {
        let mut state = self.state.lock();
        if state.generation != ticket.generation {
            debug!(
                "[SESSION] Dropping move response for generation {} (current {})",
                ticket.generation, state.generation
            );
            return Err(MoveError::Superseded);
        }
        let Some(current) = state.session.as_ref() else {
            return Err(MoveError::Superseded);
        };
        if current.session_id != ticket.session_id {
            return Err(MoveError::Superseded);
        }

        let next = current.after_move(outcome);
        if state.rewound.is_empty() {
            state.undo.push(ticket.position.clone());
            state.displayed = Some(next.position.clone());
        } else {
            // Keep the player's rewound view; remember where this move started
            state.rewound.insert(0, ticket.position.clone());
        }
        state.session = Some(next);

        state.publish(
            &self.events,
            SessionEvent::MoveApplied {
                by: ticket.mover,
                turn: outcome.turn,
                status: outcome.status,
                winner: outcome.winner,
            },
        );
        Ok(())
    }

    // ------------------------------------------------------------------
    // Local view
    // ------------------------------------------------------------------

    pub fn undo(&self) -> Result<Position, EmptyHistory> {
        let mut state = self.state.lock();
        match state.undo.pop() {
            Ok(position) => {
                state.rewound.push(position.clone());
                state.displayed = Some(position.clone());
                let remaining = state.undo.len();
                state.publish(&self.events, SessionEvent::Undone { remaining });
                Ok(position)
            }
            Err(err) => {
                state.publish(&self.events, SessionEvent::NothingToUndo);
                Err(err)
            }
        }
    }

    /// Show the authoritative position again; `None` without a session
    pub fn resync(&self) -> Option<Position> {
        let mut state = self.state.lock();
        let position = state.session.as_ref()?.position.clone();
        state.restore_history();
        state.displayed = Some(position.clone());
        state.publish(&self.events, SessionEvent::Resynced);
        Some(position)
    }

    pub fn flip_orientation(&self) -> Orientation {
        let mut state = self.state.lock();
        state.orientation = state.orientation.flipped();
        let orientation = state.orientation;
        state.publish(&self.events, SessionEvent::OrientationFlipped(orientation));
        orientation
    }

    // ------------------------------------------------------------------
    // Control responses
    // ------------------------------------------------------------------

    /// Current session id and generation, for control requests
    pub fn current(&self) -> Option<(SessionId, u64)> {
        let state = self.state.lock();
        state
            .session
            .as_ref()
            .map(|s| (s.session_id.clone(), state.generation))
    }

    /// Replace the session with a freshly fetched snapshot
    pub fn apply_snapshot(
        &self,
        generation: u64,
        snapshot: SessionSnapshot,
    ) -> Result<GameSession, SessionError> {
        let mut state = self.state.lock();
        if state.generation != generation {
            return Err(SessionError::Superseded);
        }
        let Some(current) = state.session.as_ref() else {
            return Err(SessionError::Superseded);
        };
        if current.session_id != snapshot.session_id {
            return Err(SessionError::Superseded);
        }

        let previous = current.position.clone();
        let next = GameSession::from_snapshot(snapshot, current.mode);
        state.restore_history();
        if previous != next.position {
            state.undo.push(previous);
        }
        state.displayed = Some(next.position.clone());
        state.session = Some(next.clone());
        state.publish(
            &self.events,
            SessionEvent::Refreshed {
                turn: next.turn,
                status: next.status,
            },
        );
        Ok(next)
    }

    /// Record a resignation reported by the game service
    pub fn apply_resignation(
        &self,
        generation: u64,
        color: PieceColor,
        status: GameStatus,
        winner: Option<PieceColor>,
    ) -> Result<GameSession, SessionError> {
        let mut state = self.state.lock();
        if state.generation != generation {
            return Err(SessionError::Superseded);
        }
        let Some(current) = state.session.as_ref() else {
            return Err(SessionError::Superseded);
        };
        let next = GameSession {
            status,
            winner,
            ..current.clone()
        };
        state.session = Some(next.clone());
        state.publish(&self.events, SessionEvent::Resigned { color, winner });
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::types::MoveRecord;

    const AFTER_E4: &str = "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1";
    const AFTER_E5: &str = "rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR w KQkq - 0 2";

    fn snapshot(id: &str) -> SessionSnapshot {
        SessionSnapshot {
            session_id: SessionId::new(id),
            position: Position::starting(),
            turn: PieceColor::White,
            status: GameStatus::Active,
            winner: None,
        }
    }

    fn outcome(fen: &str, turn: PieceColor) -> MoveOutcome {
        MoveOutcome {
            position: Position::from_fen(fen).unwrap(),
            turn,
            status: GameStatus::Active,
            is_check: false,
            is_checkmate: false,
            winner: None,
            record: Some(MoveRecord::default()),
        }
    }

    fn created(mode: GameMode) -> SessionStore {
        let store = SessionStore::new();
        let CreateStart::Fresh(generation) = store.begin_create().unwrap() else {
            panic!("expected a fresh create");
        };
        store.finish_create(generation, mode, Ok(snapshot("g1"))).unwrap();
        store
    }

    #[test]
    fn test_begin_create_is_reentrant_safe() {
        let store = SessionStore::new();
        assert!(matches!(store.begin_create(), Ok(CreateStart::Fresh(1))));
        assert_eq!(
            store.begin_create().unwrap_err(),
            SessionCreateError::AlreadyPending
        );
    }

    #[test]
    fn test_existing_session_is_returned() {
        let store = created(GameMode::Local);
        match store.begin_create().unwrap() {
            CreateStart::Existing(session) => assert_eq!(session.session_id.as_str(), "g1"),
            CreateStart::Fresh(_) => panic!("should not create twice"),
        }
    }

    #[test]
    fn test_failed_create_leaves_no_session() {
        let store = SessionStore::new();
        let CreateStart::Fresh(generation) = store.begin_create().unwrap() else {
            panic!("expected a fresh create");
        };
        let err = store
            .finish_create(
                generation,
                GameMode::Local,
                Err(ServiceError::Transport("down".into())),
            )
            .unwrap_err();
        assert!(matches!(err, SessionCreateError::Service(_)));
        assert!(store.session().is_none());
        assert!(!store.snapshot().creating);
        assert!(store.message().starts_with("Error creating game"));
    }

    #[test]
    fn test_stale_outcome_is_dropped() {
        let store = created(GameMode::Local);
        let ticket = store.human_ticket().unwrap();
        store.teardown();

        let result = store.apply_outcome(&ticket, &outcome(AFTER_E4, PieceColor::Black));
        assert_eq!(result, Err(MoveError::Superseded));
        assert!(store.session().is_none());
    }

    #[test]
    fn test_outcome_replaces_session_and_records_history() {
        let store = created(GameMode::Local);
        let ticket = store.human_ticket().unwrap();
        store
            .apply_outcome(&ticket, &outcome(AFTER_E4, PieceColor::Black))
            .unwrap();

        let session = store.session().unwrap();
        assert_eq!(session.turn, PieceColor::Black);
        assert_eq!(store.displayed().unwrap().as_fen(), AFTER_E4);
        assert_eq!(store.snapshot().history_len, 1);
    }

    #[test]
    fn test_response_during_rewound_view_keeps_view() {
        let store = created(GameMode::Local);
        let t1 = store.human_ticket().unwrap();
        store
            .apply_outcome(&t1, &outcome(AFTER_E4, PieceColor::Black))
            .unwrap();

        // Second move in flight, player steps back meanwhile
        let t2 = store.human_ticket().unwrap();
        assert_eq!(store.undo().unwrap(), Position::starting());
        store
            .apply_outcome(&t2, &outcome(AFTER_E5, PieceColor::White))
            .unwrap();

        assert_eq!(store.displayed().unwrap(), Position::starting());
        assert_eq!(store.session().unwrap().position.as_fen(), AFTER_E5);
        assert_eq!(store.human_ticket(), Err(MoveError::Rewound));

        assert_eq!(store.resync().unwrap().as_fen(), AFTER_E5);
        assert_eq!(store.undo().unwrap().as_fen(), AFTER_E4);
        assert_eq!(store.undo().unwrap(), Position::starting());
        assert_eq!(store.undo(), Err(EmptyHistory));
    }

    #[test]
    fn test_ai_ticket_only_on_ai_turn() {
        let store = created(GameMode::vs_ai(AIDifficulty::Easy));
        assert!(store.ai_ticket().is_none());

        let ticket = store.human_ticket().unwrap();
        store
            .apply_outcome(&ticket, &outcome(AFTER_E4, PieceColor::Black))
            .unwrap();
        let ai = store.ai_ticket().expect("black is the AI");
        assert_eq!(ai.difficulty, AIDifficulty::Easy);
        assert_eq!(ai.mv.mover, PieceColor::Black);
        assert_eq!(
            store.human_ticket(),
            Err(MoveError::NotYourTurn {
                color: PieceColor::Black
            })
        );
    }

    #[test]
    fn test_resignation_ends_game() {
        let store = created(GameMode::Local);
        let (_, generation) = store.current().unwrap();
        store
            .apply_resignation(
                generation,
                PieceColor::White,
                GameStatus::Resigned,
                Some(PieceColor::Black),
            )
            .unwrap();
        assert_eq!(
            store.human_ticket(),
            Err(MoveError::GameOver {
                status: GameStatus::Resigned
            })
        );
    }
}
