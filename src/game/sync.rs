//! Move submission and reconciliation
//!
//! Sends one move to the game service and folds the answer back into the
//! [`SessionStore`]. The synchronizer never guesses at the result of a move:
//! until the service answers, the store keeps the session exactly as it was,
//! and only an accepted response replaces it.
//!
//! Human and automated moves go through the same path. The only difference
//! is who takes the [`SubmissionSlot`] and how the ticket is produced.

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::game::error::{MoveError, MoveResult};
use crate::game::events::SessionEvent;
use crate::game::resources::pending::{SubmissionGuard, SubmissionSlot, Submitter};
use crate::game::resources::store::{MoveTicket, SessionStore};
use crate::game::types::{MoveAttempt, MoveOutcome};
use crate::networking::GameService;

pub struct MoveSynchronizer {
    games: Arc<dyn GameService>,
    store: Arc<SessionStore>,
    slot: Arc<SubmissionSlot>,
}

impl MoveSynchronizer {
    pub fn new(
        games: Arc<dyn GameService>,
        store: Arc<SessionStore>,
        slot: Arc<SubmissionSlot>,
    ) -> Self {
        Self { games, store, slot }
    }

    /// Submit a move entered by the local player
    ///
    /// Fails fast, without any network traffic, when another submission is
    /// outstanding or the local state forbids the move.
    pub async fn submit(&self, attempt: MoveAttempt) -> MoveResult<MoveOutcome> {
        let guard = self
            .slot
            .request(Submitter::Human)
            .ok_or(MoveError::InFlight)?;
        let ticket = self.store.human_ticket()?;
        self.submit_with(&guard, ticket, attempt).await
    }

    /// Submit under a slot the caller already holds
    pub async fn submit_with(
        &self,
        guard: &SubmissionGuard,
        ticket: MoveTicket,
        attempt: MoveAttempt,
    ) -> MoveResult<MoveOutcome> {
        info!(
            "[SYNC] {:?} submitting {} for {} in game {}",
            guard.submitter(),
            attempt,
            ticket.mover,
            ticket.session_id.short()
        );
        self.store
            .note_for(ticket.generation, SessionEvent::MovePending { attempt });

        match self.games.submit_move(&ticket.session_id, &attempt).await {
            Ok(outcome) => {
                self.store.apply_outcome(&ticket, &outcome)?;
                debug!(
                    "[SYNC] Move {} accepted: {} to move, status {}",
                    attempt, outcome.turn, outcome.status
                );
                Ok(outcome)
            }
            Err(err) => {
                if !self.store.is_current(ticket.generation) {
                    debug!("[SYNC] Ignoring failure for superseded game: {}", err);
                    return Err(MoveError::Superseded);
                }

                let err = MoveError::from(err);
                let event = match &err {
                    MoveError::Rejected(reason) => {
                        info!("[SYNC] Move {} rejected: {}", attempt, reason);
                        SessionEvent::MoveRejected {
                            reason: reason.clone(),
                        }
                    }
                    other => {
                        warn!("[SYNC] Move {} failed: {}", attempt, other);
                        SessionEvent::TransportFailed {
                            reason: other.to_string(),
                        }
                    }
                };
                self.store.note(event);
                Err(err)
            }
        }
    }
}
