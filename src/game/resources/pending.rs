//! In-flight submission slot
//!
//! At most one request that can change the authoritative session (a human
//! move, an AI move, a resign or a refresh) may be outstanding at a time. The
//! slot hands out a [`SubmissionGuard`]; dropping the guard frees the slot, so
//! every exit path of a submission (success, rejection, transport failure,
//! early `?` return) releases it.
//!
//! Tearing a session down calls [`SubmissionSlot::reset`]. A guard acquired
//! before the reset keeps its old ticket and cannot free a slot taken after
//! it.

use parking_lot::Mutex;
use std::sync::Arc;

/// Who currently owns the slot
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Submitter {
    /// Move entered by the local player
    Human,
    /// Move sourced from the AI service by the turn scheduler
    Ai,
    /// Resign or refresh request
    Control,
}

#[derive(Clone, Copy, Debug)]
struct PendingSubmission {
    submitter: Submitter,
    ticket: u64,
}

#[derive(Debug, Default)]
struct SlotState {
    pending: Option<PendingSubmission>,
    next_ticket: u64,
}

#[derive(Debug, Default)]
pub struct SubmissionSlot {
    state: Mutex<SlotState>,
}

impl SubmissionSlot {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Take the slot, or `None` if something is already in flight
    pub fn request(self: &Arc<Self>, submitter: Submitter) -> Option<SubmissionGuard> {
        let mut state = self.state.lock();
        if state.pending.is_some() {
            return None;
        }
        state.next_ticket += 1;
        let ticket = state.next_ticket;
        state.pending = Some(PendingSubmission { submitter, ticket });

        Some(SubmissionGuard {
            slot: Arc::clone(self),
            submitter,
            ticket,
        })
    }

    pub fn is_pending(&self) -> bool {
        self.state.lock().pending.is_some()
    }

    pub fn holder(&self) -> Option<Submitter> {
        self.state.lock().pending.map(|p| p.submitter)
    }

    /// Free the slot regardless of who holds it (session teardown)
    pub fn reset(&self) {
        self.state.lock().pending = None;
    }

    fn release(&self, ticket: u64) {
        let mut state = self.state.lock();
        if state.pending.map(|p| p.ticket) == Some(ticket) {
            state.pending = None;
        }
    }
}

/// Proof of slot ownership; releases the slot on drop
#[derive(Debug)]
pub struct SubmissionGuard {
    slot: Arc<SubmissionSlot>,
    submitter: Submitter,
    ticket: u64,
}

impl SubmissionGuard {
    pub fn submitter(&self) -> Submitter {
        self.submitter
    }
}

impl Drop for SubmissionGuard {
    fn drop(&mut self) {
        self.slot.release(self.ticket);
    }
}
