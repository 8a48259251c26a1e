//! Controller state
//!
//! - `history`: local undo stack of displayed positions
//! - `pending`: single in-flight submission slot
//! - `store`: authoritative session, displayed position and generation

pub mod history;
pub mod pending;
pub mod store;

pub use history::UndoStack;
pub use pending::{SubmissionGuard, SubmissionSlot, Submitter};
pub use store::{AiTicket, CreateStart, MoveTicket, SessionStore, StoreSnapshot};
