//! Automated opponent
//!
//! The AI never computes moves locally. It asks the remote AI service for a
//! suggestion and plays it through the same submission path as a human move,
//! so the game service validates both alike.
//!
//! # Architecture
//!
//! - `GameMode`: whether an AI plays, which color and how strong
//! - `AiRetryPolicy`: how hard to try before leaving the turn to the caller
//! - `TurnScheduler`: checks the confirmed state after every change and runs
//!   one suggest-then-submit round when the AI is due

pub mod resource;
pub mod scheduler;

pub use resource::{AiRetryPolicy, GameMode};
pub use scheduler::{SchedulerPhase, TurnScheduler};
