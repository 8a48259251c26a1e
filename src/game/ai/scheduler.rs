//! Automated-opponent turn scheduling
//!
//! After every confirmed state change the controller asks the scheduler to
//! take a turn. The scheduler looks only at the authoritative session: it
//! acts when the game is vs-AI, the side to move is the AI's color, the game
//! is still running and nothing else is in flight.
//!
//! ```text
//! Idle --(AI due, slot free)--> RequestingSuggestion
//! RequestingSuggestion --(suggestion)--> SubmittingSuggestion
//! RequestingSuggestion --(all attempts failed)--> Idle
//! SubmittingSuggestion --(accepted | rejected | failed)--> Idle
//! ```
//!
//! The scheduler holds the submission slot for the whole round, so a human
//! move cannot slip in between the suggestion and its submission.

use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::resource::AiRetryPolicy;
use crate::game::error::{AiTurnError, MoveError, SuggestionError};
use crate::game::events::SessionEvent;
use crate::game::resources::pending::{SubmissionSlot, Submitter};
use crate::game::resources::store::{AiTicket, SessionStore};
use crate::game::sync::MoveSynchronizer;
use crate::game::types::{MoveOutcome, Suggestion};
use crate::networking::AiService;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SchedulerPhase {
    #[default]
    Idle,
    /// Waiting on the AI service
    RequestingSuggestion,
    /// Waiting on the game service to accept the AI's move
    SubmittingSuggestion,
}

#[derive(Debug, Default)]
struct PhaseState {
    phase: SchedulerPhase,
    round: u64,
}

/// Puts the scheduler back to `Idle` when a round ends, however it ends
struct PhaseGuard<'a> {
    state: &'a Mutex<PhaseState>,
    round: u64,
}

impl<'a> PhaseGuard<'a> {
    fn enter(state: &'a Mutex<PhaseState>, phase: SchedulerPhase) -> Self {
        let mut locked = state.lock();
        locked.round += 1;
        locked.phase = phase;
        Self {
            state,
            round: locked.round,
        }
    }

    fn set(&self, phase: SchedulerPhase) {
        let mut locked = self.state.lock();
        if locked.round == self.round {
            locked.phase = phase;
        }
    }
}

impl Drop for PhaseGuard<'_> {
    fn drop(&mut self) {
        let mut locked = self.state.lock();
        if locked.round == self.round {
            locked.phase = SchedulerPhase::Idle;
        }
    }
}

pub struct TurnScheduler {
    ai: Arc<dyn AiService>,
    sync: Arc<MoveSynchronizer>,
    store: Arc<SessionStore>,
    slot: Arc<SubmissionSlot>,
    retry: AiRetryPolicy,
    phase: Mutex<PhaseState>,
}

impl TurnScheduler {
    pub fn new(
        ai: Arc<dyn AiService>,
        sync: Arc<MoveSynchronizer>,
        store: Arc<SessionStore>,
        slot: Arc<SubmissionSlot>,
        retry: AiRetryPolicy,
    ) -> Self {
        Self {
            ai,
            sync,
            store,
            slot,
            retry,
            phase: Mutex::new(PhaseState::default()),
        }
    }

    pub fn phase(&self) -> SchedulerPhase {
        self.phase.lock().phase
    }

    /// Abandon the current round (session teardown)
    pub fn reset(&self) {
        let mut locked = self.phase.lock();
        locked.round += 1;
        locked.phase = SchedulerPhase::Idle;
    }

    /// Take the AI's turn if one is due; `None` when nothing was due
    pub async fn run_due_turn(&self) -> Option<Result<MoveOutcome, AiTurnError>> {
        match self.take_turn().await {
            Err(AiTurnError::NotDue) => None,
            other => Some(other),
        }
    }

    /// One full scheduler round: suggest, then submit
    pub async fn take_turn(&self) -> Result<MoveOutcome, AiTurnError> {
        let ticket = self.store.ai_ticket().ok_or(AiTurnError::NotDue)?;
        let guard = self
            .slot
            .request(Submitter::Ai)
            .ok_or(AiTurnError::Busy)?;
        let phase = PhaseGuard::enter(&self.phase, SchedulerPhase::RequestingSuggestion);

        let suggestion = match self.request_suggestion(&ticket).await {
            Ok(suggestion) => suggestion,
            Err(AiTurnError::Suggestion(err)) => {
                warn!("[AI] No move after {} attempt(s): {}", self.retry.attempts(), err);
                self.store.note_for(
                    ticket.mv.generation,
                    SessionEvent::AiFailed {
                        reason: err.to_string(),
                    },
                );
                return Err(AiTurnError::Suggestion(err));
            }
            Err(other) => return Err(other),
        };

        if !self.store.is_current(ticket.mv.generation) {
            debug!("[AI] Discarding suggestion for a superseded game");
            return Err(AiTurnError::Superseded);
        }

        info!(
            "[AI] {} plays {}{}",
            ticket.mv.mover,
            suggestion.attempt,
            suggestion
                .san
                .as_deref()
                .map(|san| format!(" ({})", san))
                .unwrap_or_default()
        );
        phase.set(SchedulerPhase::SubmittingSuggestion);

        match self.sync.submit_with(&guard, ticket.mv, suggestion.attempt).await {
            Ok(outcome) => Ok(outcome),
            Err(MoveError::Superseded) => Err(AiTurnError::Superseded),
            Err(err) => Err(AiTurnError::Move(err)),
        }
    }

    async fn request_suggestion(&self, ticket: &AiTicket) -> Result<Suggestion, AiTurnError> {
        let mut last_error: Option<SuggestionError> = None;

        for attempt in 1..=self.retry.attempts() {
            let delay = self.retry.delay_before(attempt);
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            if !self.store.is_current(ticket.mv.generation) {
                return Err(AiTurnError::Superseded);
            }

            self.store.note_for(
                ticket.mv.generation,
                SessionEvent::AiThinking {
                    difficulty: ticket.difficulty,
                    attempt,
                },
            );
            debug!("[AI] Requesting {} move (attempt {})", ticket.difficulty, attempt);

            match self.ai.suggest_move(&ticket.mv.position, ticket.difficulty).await {
                Ok(suggestion) => return Ok(suggestion),
                Err(err) => {
                    warn!("[AI] Suggestion attempt {} failed: {}", attempt, err);
                    last_error = Some(err);
                }
            }
        }

        Err(AiTurnError::Suggestion(last_error.unwrap_or_else(|| {
            SuggestionError::Declined("no attempts made".to_string())
        })))
    }
}
