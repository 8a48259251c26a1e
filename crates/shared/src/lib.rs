//! Wire protocol shared by the XFChess session client and its HTTP services.
//!
//! Every body sent to or received from the game gateway lives in
//! [`protocol`]. Field names follow the JSON the services emit.

pub mod protocol;

pub use protocol::{AIDifficulty, GameModeKind, GameStatus, PieceColor};
