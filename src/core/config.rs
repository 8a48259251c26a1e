//! Client configuration
//!
//! Loaded from the process environment (after `.env` has been read by the
//! binary) and then overridden by command-line flags.
//!
//! | Variable                        | Default                   |
//! |---------------------------------|---------------------------|
//! | `XFCHESS_API_URL`               | `http://localhost:8000`   |
//! | `XFCHESS_AI_URL`                | same as `XFCHESS_API_URL` |
//! | `XFCHESS_REQUEST_TIMEOUT_SECS`  | `90`                      |
//! | `XFCHESS_PLAYER_ID`             | random UUID v4            |
//! | `XFCHESS_AI_COLOR`              | `black`                   |
//! | `XFCHESS_AI_ATTEMPTS`           | `3`                       |
//! | `XFCHESS_AI_BACKOFF_MS`         | `250`                     |

use std::str::FromStr;
use std::time::Duration;
use url::Url;

use crate::game::ai::{AiRetryPolicy, GameMode};
use crate::game::types::{AIDifficulty, PieceColor};

pub const API_URL_VAR: &str = "XFCHESS_API_URL";
pub const AI_URL_VAR: &str = "XFCHESS_AI_URL";
pub const TIMEOUT_VAR: &str = "XFCHESS_REQUEST_TIMEOUT_SECS";
pub const PLAYER_ID_VAR: &str = "XFCHESS_PLAYER_ID";
pub const AI_COLOR_VAR: &str = "XFCHESS_AI_COLOR";
pub const AI_ATTEMPTS_VAR: &str = "XFCHESS_AI_ATTEMPTS";
pub const AI_BACKOFF_VAR: &str = "XFCHESS_AI_BACKOFF_MS";

pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Per-request timeout when none is configured
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(90);

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} is not a valid URL ({value:?}): {source}")]
    InvalidUrl {
        var: &'static str,
        value: String,
        #[source]
        source: url::ParseError,
    },

    #[error("{var} must be a whole number, got {value:?}")]
    InvalidNumber { var: &'static str, value: String },

    #[error("{var} must be \"white\" or \"black\", got {value:?}")]
    InvalidColor { var: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Gateway in front of the game service
    pub api_url: Url,
    pub ai_url: Url,
    pub request_timeout: Duration,
    pub player_id: String,
    /// Color the AI plays in vs-AI games
    pub ai_color: PieceColor,
    pub ai_retry: AiRetryPolicy,
}

/// Parse a base URL, making sure relative joins keep its path
pub fn parse_base_url(var: &'static str, value: &str) -> Result<Url, ConfigError> {
    let value = value.trim();
    let mut url = Url::parse(value).map_err(|source| ConfigError::InvalidUrl {
        var,
        value: value.to_string(),
        source,
    })?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

fn parse_number(var: &'static str, value: &str) -> Result<u64, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidNumber {
            var,
            value: value.to_string(),
        })
}

impl ClientConfig {
    /// Read from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read through an arbitrary lookup; unset or blank variables keep defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_url = parse_base_url(
            API_URL_VAR,
            get(API_URL_VAR).as_deref().unwrap_or(DEFAULT_API_URL),
        )?;
        let ai_url = match get(AI_URL_VAR) {
            Some(value) => parse_base_url(AI_URL_VAR, &value)?,
            None => api_url.clone(),
        };
        let mut config = Self {
            api_url,
            ai_url,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            player_id: uuid::Uuid::new_v4().to_string(),
            ai_color: PieceColor::Black,
            ai_retry: AiRetryPolicy::default(),
        };

        if let Some(value) = get(TIMEOUT_VAR) {
            config.request_timeout = Duration::from_secs(parse_number(TIMEOUT_VAR, &value)?);
        }
        if let Some(value) = get(PLAYER_ID_VAR) {
            config.player_id = value.trim().to_string();
        }
        if let Some(value) = get(AI_COLOR_VAR) {
            config.ai_color =
                PieceColor::from_str(value.trim()).map_err(|_| ConfigError::InvalidColor {
                    var: AI_COLOR_VAR,
                    value: value.clone(),
                })?;
        }
        if let Some(value) = get(AI_ATTEMPTS_VAR) {
            let attempts = parse_number(AI_ATTEMPTS_VAR, &value)?;
            config.ai_retry.max_attempts = u32::try_from(attempts).unwrap_or(u32::MAX);
        }
        if let Some(value) = get(AI_BACKOFF_VAR) {
            config.ai_retry.backoff = Duration::from_millis(parse_number(AI_BACKOFF_VAR, &value)?);
        }

        Ok(config)
    }

    /// Vs-AI mode with the configured AI color
    pub fn vs_ai(&self, difficulty: AIDifficulty) -> GameMode {
        GameMode::VsAI {
            ai_color: self.ai_color,
            difficulty,
        }
    }
}
