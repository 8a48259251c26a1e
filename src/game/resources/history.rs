//! Local undo history
//!
//! Keeps the positions the board displayed before each confirmed move so the
//! player can step back through them. The history is cosmetic: popping an
//! entry changes what is shown, never what the game service believes. It is
//! cleared whenever a new session is created.

use crate::game::error::EmptyHistory;
use crate::game::position::Position;

/// LIFO of previously displayed positions
///
/// Index 0 = position before the first confirmed move
/// Last index = position before the most recent confirmed move
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct UndoStack {
    positions: Vec<Position>,
}

impl UndoStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a position that is about to be replaced on screen
    pub fn push(&mut self, position: Position) {
        self.positions.push(position);
    }

    /// Remove and return the most recent position
    pub fn pop(&mut self) -> Result<Position, EmptyHistory> {
        self.positions.pop().ok_or(EmptyHistory)
    }

    pub fn peek(&self) -> Option<&Position> {
        self.positions.last()
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Forget everything (new session)
    pub fn clear(&mut self) {
        self.positions.clear();
    }
}
