//! Remote game and AI services
//!
//! The controller only talks to the two traits below. The HTTP clients are
//! the production implementations; tests swap in scripted ones.
//!
//! Status mapping for every endpoint:
//!
//! | Response            | Error                      |
//! |---------------------|----------------------------|
//! | 404                 | `ServiceError::NotFound`   |
//! | other 4xx           | `ServiceError::Rejected`   |
//! | 5xx, network, timeout | `ServiceError::Transport` |
//! | unreadable body     | `ServiceError::Decode`     |

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use shakmaty::Square;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use shared::protocol::{
    AiMoveRequest, AiMoveResponse, CreateGameRequest, CreateGameResponse, ErrorBody,
    GameStateResponse, HintRequest, HintResponse, HistoryEntry, HistoryResponse, MoveRequest,
    MoveResponse, ResignRequest, ResignResponse, ValidMovesResponse,
};

use crate::game::ai::GameMode;
use crate::game::error::{ServiceError, ServiceResult, SuggestionError};
use crate::game::position::Position;
use crate::game::types::{
    AIDifficulty, GameStatus, MoveAttempt, MoveOutcome, MoveRecord, PieceColor, SessionId,
    SessionSnapshot, Suggestion,
};

/// Parameters for opening a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSession {
    pub mode: GameMode,
    pub white_player_id: Option<String>,
    pub black_player_id: Option<String>,
}

impl NewSession {
    /// Seat `player_id` on every side the human controls
    pub fn for_player(mode: GameMode, player_id: &str) -> Self {
        let seat = |color: PieceColor| match mode.ai_color() {
            Some(ai) if ai == color => None,
            _ => Some(player_id.to_string()),
        };
        Self {
            mode,
            white_player_id: seat(PieceColor::White),
            black_player_id: seat(PieceColor::Black),
        }
    }
}

/// Result of a resignation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resignation {
    pub status: GameStatus,
    pub winner: Option<PieceColor>,
}

/// Authoritative game service
#[async_trait]
pub trait GameService: Send + Sync {
    async fn create_session(&self, request: &NewSession) -> ServiceResult<SessionSnapshot>;

    async fn submit_move(
        &self,
        session_id: &SessionId,
        attempt: &MoveAttempt,
    ) -> ServiceResult<MoveOutcome>;

    async fn fetch_session(&self, session_id: &SessionId) -> ServiceResult<SessionSnapshot>;

    async fn resign(&self, session_id: &SessionId, color: PieceColor) -> ServiceResult<Resignation>;

    /// Legal moves, optionally only those leaving `square`
    async fn valid_moves(
        &self,
        session_id: &SessionId,
        square: Option<Square>,
    ) -> ServiceResult<Vec<MoveAttempt>>;

    async fn move_history(&self, session_id: &SessionId) -> ServiceResult<Vec<MoveRecord>>;
}

/// Move suggestion service
#[async_trait]
pub trait AiService: Send + Sync {
    async fn suggest_move(
        &self,
        position: &Position,
        difficulty: AIDifficulty,
    ) -> Result<Suggestion, SuggestionError>;

    async fn hint(&self, position: &Position) -> Result<Suggestion, SuggestionError>;
}

// ============================================================================
// HTTP plumbing
// ============================================================================

fn build_client(timeout: Duration) -> ServiceResult<Client> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| ServiceError::Transport(format!("failed to build HTTP client: {}", e)))
}

fn endpoint(base: &Url, segments: &[&str]) -> ServiceResult<Url> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| ServiceError::Transport(format!("{} cannot be used as a base URL", base)))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

fn transport(err: reqwest::Error) -> ServiceError {
    if err.is_timeout() {
        ServiceError::Transport("request timed out".to_string())
    } else if err.is_connect() {
        ServiceError::Transport(format!("could not connect: {}", err))
    } else {
        ServiceError::Transport(err.to_string())
    }
}

fn classify(status: StatusCode, message: String) -> ServiceError {
    if status == StatusCode::NOT_FOUND {
        ServiceError::NotFound { message }
    } else if status.is_client_error() {
        ServiceError::Rejected {
            status: status.as_u16(),
            message,
        }
    } else {
        ServiceError::Transport(format!("HTTP {}: {}", status.as_u16(), message))
    }
}

/// Send a request and decode a JSON body, mapping failures per the table above
async fn send_json<T: DeserializeOwned>(request: RequestBuilder) -> ServiceResult<T> {
    let response = request.send().await.map_err(transport)?;
    let status = response.status();
    let body = response.bytes().await.map_err(transport)?;

    if !status.is_success() {
        let message = match serde_json::from_slice::<ErrorBody>(&body) {
            Ok(err) => err.error,
            Err(_) => String::from_utf8_lossy(&body).trim().to_string(),
        };
        debug!("[NETWORK] HTTP {} - {}", status.as_u16(), message);
        return Err(classify(status, message));
    }

    serde_json::from_slice(&body).map_err(|e| ServiceError::Decode(e.to_string()))
}

fn parse_position(fen: &str) -> ServiceResult<Position> {
    Position::from_fen(fen).map_err(|e| ServiceError::Decode(e.to_string()))
}

fn snapshot_from_state(state: GameStateResponse) -> ServiceResult<SessionSnapshot> {
    Ok(SessionSnapshot {
        session_id: SessionId::new(state.game_id),
        position: parse_position(&state.board_state)?,
        turn: state.current_turn,
        status: state.status,
        winner: state.winner,
    })
}

fn record_from_history(entry: HistoryEntry) -> MoveRecord {
    MoveRecord {
        from: entry.from,
        to: entry.to,
        san: entry.notation,
        piece: entry.piece,
        captured: entry.captured,
    }
}

// ============================================================================
// Game service
// ============================================================================

/// reqwest client for the game service
#[derive(Debug, Clone)]
pub struct HttpGameService {
    client: Client,
    base: Url,
}

impl HttpGameService {
    pub fn new(base: Url, timeout: Duration) -> ServiceResult<Self> {
        Ok(Self::with_client(build_client(timeout)?, base))
    }

    pub fn with_client(client: Client, base: Url) -> Self {
        Self { client, base }
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }
}

#[async_trait]
impl GameService for HttpGameService {
    async fn create_session(&self, request: &NewSession) -> ServiceResult<SessionSnapshot> {
        let url = endpoint(&self.base, &["games"])?;
        let body = CreateGameRequest {
            mode: request.mode.wire_kind(),
            white_player_id: request.white_player_id.clone(),
            black_player_id: request.black_player_id.clone(),
        };
        info!("[NETWORK] Creating {:?} game at {}", body.mode, url);

        let created: CreateGameResponse = send_json(self.client.post(url).json(&body)).await?;
        Ok(SessionSnapshot {
            session_id: SessionId::new(created.game_id),
            position: parse_position(&created.board_state)?,
            turn: created.current_turn,
            status: created.status,
            winner: None,
        })
    }

    async fn submit_move(
        &self,
        session_id: &SessionId,
        attempt: &MoveAttempt,
    ) -> ServiceResult<MoveOutcome> {
        let url = endpoint(&self.base, &["games", session_id.as_str(), "move"])?;
        let body = MoveRequest {
            from: attempt.from.to_string(),
            to: attempt.to.to_string(),
            promotion: attempt.promotion_str(),
        };
        debug!("[NETWORK] POST {} {}", url, attempt);

        let response: MoveResponse = send_json(self.client.post(url).json(&body)).await?;
        if !response.success {
            return Err(ServiceError::Rejected {
                status: StatusCode::OK.as_u16(),
                message: "move was not applied".to_string(),
            });
        }

        Ok(MoveOutcome {
            position: parse_position(&response.board_state)?,
            turn: response.current_turn,
            status: response.status,
            is_check: response.is_check,
            is_checkmate: response.is_checkmate,
            winner: response.winner,
            record: response.applied.map(|m| MoveRecord {
                from: m.from,
                to: m.to,
                san: m.notation,
                piece: m.piece,
                captured: m.captured,
            }),
        })
    }

    async fn fetch_session(&self, session_id: &SessionId) -> ServiceResult<SessionSnapshot> {
        let url = endpoint(&self.base, &["games", session_id.as_str()])?;
        let state: GameStateResponse = send_json(self.client.get(url)).await?;
        snapshot_from_state(state)
    }

    async fn resign(
        &self,
        session_id: &SessionId,
        color: PieceColor,
    ) -> ServiceResult<Resignation> {
        let url = endpoint(&self.base, &["games", session_id.as_str(), "resign"])?;
        info!("[NETWORK] {} resigns game {}", color, session_id.short());

        let response: ResignResponse =
            send_json(self.client.post(url).json(&ResignRequest { color })).await?;
        Ok(Resignation {
            status: response.status,
            winner: response.winner,
        })
    }

    async fn valid_moves(
        &self,
        session_id: &SessionId,
        square: Option<Square>,
    ) -> ServiceResult<Vec<MoveAttempt>> {
        let mut url = endpoint(&self.base, &["games", session_id.as_str(), "valid-moves"])?;
        if let Some(square) = square {
            url.query_pairs_mut()
                .append_pair("square", &square.to_string());
        }

        let response: ValidMovesResponse = send_json(self.client.get(url)).await?;
        response
            .valid_moves
            .iter()
            .map(|uci| {
                uci.parse::<MoveAttempt>()
                    .map_err(|e| ServiceError::Decode(e.to_string()))
            })
            .collect()
    }

    async fn move_history(&self, session_id: &SessionId) -> ServiceResult<Vec<MoveRecord>> {
        let url = endpoint(&self.base, &["games", session_id.as_str(), "history"])?;
        let response: HistoryResponse = send_json(self.client.get(url)).await?;
        Ok(response.moves.into_iter().map(record_from_history).collect())
    }
}

// ============================================================================
// AI service
// ============================================================================

/// reqwest client for the AI service
#[derive(Debug, Clone)]
pub struct HttpAiService {
    client: Client,
    base: Url,
}

impl HttpAiService {
    pub fn new(base: Url, timeout: Duration) -> ServiceResult<Self> {
        Ok(Self::with_client(build_client(timeout)?, base))
    }

    pub fn with_client(client: Client, base: Url) -> Self {
        Self { client, base }
    }
}

fn declined_or_service(err: ServiceError) -> SuggestionError {
    match err {
        ServiceError::Rejected { message, .. } => SuggestionError::Declined(message),
        other => SuggestionError::Service(other),
    }
}

#[async_trait]
impl AiService for HttpAiService {
    async fn suggest_move(
        &self,
        position: &Position,
        difficulty: AIDifficulty,
    ) -> Result<Suggestion, SuggestionError> {
        let url = endpoint(&self.base, &["ai", "move"])?;
        let body = AiMoveRequest {
            fen: position.as_fen().to_string(),
            difficulty,
        };
        debug!("[NETWORK] Requesting {} AI move", difficulty);

        let response: AiMoveResponse = send_json(self.client.post(url).json(&body))
            .await
            .map_err(declined_or_service)?;

        let suggested = match response.suggestion {
            Some(mv) if response.success => mv,
            _ => {
                warn!("[NETWORK] AI service returned no move");
                return Err(SuggestionError::Declined("no move returned".to_string()));
            }
        };

        let attempt = MoveAttempt::from_parts(
            &suggested.from,
            &suggested.to,
            suggested.promotion.as_deref(),
        )
        .map_err(|e| SuggestionError::Service(ServiceError::Decode(e.to_string())))?;

        Ok(Suggestion {
            attempt,
            san: suggested.san,
        })
    }

    async fn hint(&self, position: &Position) -> Result<Suggestion, SuggestionError> {
        let url = endpoint(&self.base, &["ai", "hint"])?;
        let body = HintRequest {
            fen: position.as_fen().to_string(),
        };

        let response: HintResponse = send_json(self.client.post(url).json(&body))
            .await
            .map_err(declined_or_service)?;

        let hint = match response.hint {
            Some(hint) if response.success => hint,
            _ => return Err(SuggestionError::Declined("no hint available".to_string())),
        };

        let attempt = MoveAttempt::from_parts(&hint.from, &hint.to, None)
            .map_err(|e| SuggestionError::Service(ServiceError::Decode(e.to_string())))?;
        Ok(Suggestion {
            attempt,
            san: hint.san,
        })
    }
}
