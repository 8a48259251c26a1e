//! Session controller
//!
//! Composition root of the client. Owns the one game being played and wires
//! the submission slot, move synchronizer and turn scheduler around a shared
//! [`SessionStore`].
//!
//! Every operation leaves a status message behind (see
//! [`SessionEvent`](crate::game::events::SessionEvent)) and returns a typed
//! result. The message is advisory; callers branch on the result.
//!
//! # Sequencing
//!
//! A human move that succeeds is followed, before `attempt_move` returns, by
//! the automated reply when one is due. The submission slot stays taken while
//! the reply is in flight, so the next human attempt fails with
//! `MoveError::InFlight` until the reply settles.

use shakmaty::{Role, Square};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::core::config::ClientConfig;
use crate::game::ai::{AiRetryPolicy, GameMode, SchedulerPhase, TurnScheduler};
use crate::game::error::{
    AiTurnError, EmptyHistory, MoveResult, ServiceError, SessionCreateError, SessionError,
};
use crate::game::events::SessionEvent;
use crate::game::position::Position;
use crate::game::resources::pending::{SubmissionSlot, Submitter};
use crate::game::resources::store::{CreateStart, SessionStore};
use crate::game::sync::MoveSynchronizer;
use crate::game::types::{
    GameSession, MoveAttempt, MoveOutcome, MoveRecord, Orientation, PieceColor, Suggestion,
};
use crate::networking::{AiService, GameService, HttpAiService, HttpGameService, NewSession};

/// Settings the controller needs beyond its services
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerOptions {
    /// Seated on every side the human controls
    pub player_id: String,
    pub ai_retry: AiRetryPolicy,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            player_id: uuid::Uuid::new_v4().to_string(),
            ai_retry: AiRetryPolicy::default(),
        }
    }
}

/// Read-only picture of the controller for rendering
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionView {
    pub session: Option<GameSession>,
    /// What the board shows; older than `session.position` while rewound
    pub displayed: Option<Position>,
    pub orientation: Orientation,
    pub rewound_depth: usize,
    pub history_len: usize,
    pub in_flight: Option<Submitter>,
    pub scheduler: SchedulerPhase,
    pub generation: u64,
    pub message: String,
}

impl SessionView {
    pub fn is_rewound(&self) -> bool {
        self.rewound_depth > 0
    }
}

pub struct SessionController {
    options: ControllerOptions,
    games: Arc<dyn GameService>,
    ai: Arc<dyn AiService>,
    store: Arc<SessionStore>,
    slot: Arc<SubmissionSlot>,
    sync: Arc<MoveSynchronizer>,
    scheduler: TurnScheduler,
}

impl SessionController {
    pub fn new(
        games: Arc<dyn GameService>,
        ai: Arc<dyn AiService>,
        options: ControllerOptions,
    ) -> Self {
        let store = Arc::new(SessionStore::new());
        let slot = SubmissionSlot::new();
        let sync = Arc::new(MoveSynchronizer::new(
            Arc::clone(&games),
            Arc::clone(&store),
            Arc::clone(&slot),
        ));
        let scheduler = TurnScheduler::new(
            Arc::clone(&ai),
            Arc::clone(&sync),
            Arc::clone(&store),
            Arc::clone(&slot),
            options.ai_retry,
        );

        Self {
            options,
            games,
            ai,
            store,
            slot,
            sync,
            scheduler,
        }
    }

    /// Controller backed by the HTTP services named in `config`
    pub fn from_config(config: &ClientConfig) -> Result<Self, ServiceError> {
        let games = HttpGameService::new(config.api_url.clone(), config.request_timeout)?;
        let ai = HttpAiService::new(config.ai_url.clone(), config.request_timeout)?;
        Ok(Self::new(
            Arc::new(games),
            Arc::new(ai),
            ControllerOptions {
                player_id: config.player_id.clone(),
                ai_retry: config.ai_retry,
            },
        ))
    }

    pub fn player_id(&self) -> &str {
        &self.options.player_id
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Open a session, or return the one already open
    pub async fn create(&self, mode: GameMode) -> Result<GameSession, SessionCreateError> {
        let generation = match self.store.begin_create()? {
            CreateStart::Existing(session) => {
                debug!("[SESSION] Reusing game {}", session.session_id.short());
                return Ok(session);
            }
            CreateStart::Fresh(generation) => generation,
        };

        let request = NewSession::for_player(mode, &self.options.player_id);
        let result = self.games.create_session(&request).await;
        let session = self.store.finish_create(generation, mode, result)?;

        // AI playing White opens the game
        self.settle_ai_turn().await;
        Ok(session)
    }

    /// Drop the current game and open a fresh one
    pub async fn new_game(&self, mode: GameMode) -> Result<GameSession, SessionCreateError> {
        self.teardown();
        self.create(mode).await
    }

    /// Drop the current game; late responses are ignored
    pub fn dispose(&self) {
        self.teardown();
        self.store.note(SessionEvent::Disposed);
        info!("[SESSION] Disposed");
    }

    fn teardown(&self) {
        let generation = self.store.teardown();
        self.slot.reset();
        self.scheduler.reset();
        debug!("[SESSION] Torn down, now at generation {}", generation);
    }

    // ------------------------------------------------------------------
    // Play
    // ------------------------------------------------------------------

    /// Submit a human move and, if due, the automated reply
    pub async fn attempt_move(
        &self,
        from: Square,
        to: Square,
        promotion: Option<Role>,
    ) -> MoveResult<MoveOutcome> {
        self.submit(MoveAttempt {
            from,
            to,
            promotion,
        })
        .await
    }

    pub async fn submit(&self, attempt: MoveAttempt) -> MoveResult<MoveOutcome> {
        let outcome = self.sync.submit(attempt).await?;
        self.settle_ai_turn().await;
        Ok(outcome)
    }

    /// Run a due AI turn; failures stay in the status message
    async fn settle_ai_turn(&self) {
        match self.scheduler.run_due_turn().await {
            None | Some(Ok(_)) => {}
            Some(Err(AiTurnError::Superseded)) => {
                debug!("[SESSION] AI turn dropped with its game");
            }
            Some(Err(err)) => {
                warn!("[SESSION] AI turn did not complete: {}", err);
            }
        }
    }

    /// Re-run a stalled automated-opponent turn
    pub async fn retry_ai_move(&self) -> Result<MoveOutcome, AiTurnError> {
        self.scheduler.take_turn().await
    }

    // ------------------------------------------------------------------
    // Local view
    // ------------------------------------------------------------------

    /// Show the previous position; the game itself is unchanged
    pub fn undo(&self) -> Result<Position, EmptyHistory> {
        self.store.undo()
    }

    /// Show the authoritative position again after `undo`
    pub fn resync(&self) -> Option<Position> {
        self.store.resync()
    }

    pub fn flip_orientation(&self) -> Orientation {
        self.store.flip_orientation()
    }

    // ------------------------------------------------------------------
    // Control
    // ------------------------------------------------------------------

    /// Reload the session from the game service
    pub async fn refresh(&self) -> Result<GameSession, SessionError> {
        let (session_id, generation) = self.store.current().ok_or(SessionError::NoSession)?;
        let guard = self
            .slot
            .request(Submitter::Control)
            .ok_or(SessionError::InFlight)?;

        let snapshot = match self.games.fetch_session(&session_id).await {
            Ok(snapshot) => snapshot,
            Err(err) => {
                self.store.note_for(
                    generation,
                    SessionEvent::TransportFailed {
                        reason: err.to_string(),
                    },
                );
                return Err(err.into());
            }
        };
        let session = self.store.apply_snapshot(generation, snapshot)?;
        info!(
            "[SESSION] Reloaded game {}: {} to move ({})",
            session.session_id.short(),
            session.turn,
            session.status
        );
        drop(guard);

        self.settle_ai_turn().await;
        Ok(session)
    }

    /// Resign on behalf of `color`
    pub async fn resign(&self, color: PieceColor) -> Result<GameSession, SessionError> {
        let (session_id, generation) = self.store.current().ok_or(SessionError::NoSession)?;
        let _guard = self
            .slot
            .request(Submitter::Control)
            .ok_or(SessionError::InFlight)?;

        match self.games.resign(&session_id, color).await {
            Ok(resignation) => {
                info!("[SESSION] {} resigned game {}", color, session_id.short());
                self.store
                    .apply_resignation(generation, color, resignation.status, resignation.winner)
            }
            Err(err) => {
                self.store.note_for(
                    generation,
                    SessionEvent::TransportFailed {
                        reason: err.to_string(),
                    },
                );
                Err(err.into())
            }
        }
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub async fn valid_moves(
        &self,
        square: Option<Square>,
    ) -> Result<Vec<MoveAttempt>, SessionError> {
        let (session_id, _) = self.store.current().ok_or(SessionError::NoSession)?;
        Ok(self.games.valid_moves(&session_id, square).await?)
    }

    pub async fn move_log(&self) -> Result<Vec<MoveRecord>, SessionError> {
        let (session_id, _) = self.store.current().ok_or(SessionError::NoSession)?;
        Ok(self.games.move_history(&session_id).await?)
    }

    /// Ask the AI service for a move in the authoritative position
    pub async fn hint(&self) -> Result<Suggestion, SessionError> {
        let session = self.store.session().ok_or(SessionError::NoSession)?;
        Ok(self.ai.hint(&session.position).await?)
    }

    // ------------------------------------------------------------------
    // Observation
    // ------------------------------------------------------------------

    pub fn view(&self) -> SessionView {
        let snapshot = self.store.snapshot();
        SessionView {
            session: snapshot.session,
            displayed: snapshot.displayed,
            orientation: snapshot.orientation,
            rewound_depth: snapshot.rewound_depth,
            history_len: snapshot.history_len,
            in_flight: self.slot.holder(),
            scheduler: self.scheduler.phase(),
            generation: snapshot.generation,
            message: snapshot.message,
        }
    }

    pub fn session(&self) -> Option<GameSession> {
        self.store.session()
    }

    pub fn status_message(&self) -> String {
        self.store.message()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.store.events().subscribe()
    }
}
