pub mod core;
pub mod game;
pub mod networking;

pub use crate::core::ClientConfig;
pub use game::session::{ControllerOptions, SessionController, SessionView};
