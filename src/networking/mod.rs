//! Clients for the remote game and AI services

pub mod client;

pub use client::{
    AiService, GameService, HttpAiService, HttpGameService, NewSession, Resignation,
};
