//! Scripted in-memory services for controller tests
//!
//! Each service pops pre-loaded responses in order and counts its calls.
//! A [`Gate`] can hold a call open so a test can act while it is in flight.

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use shakmaty::Square;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

use xfchess_session::game::ai::{AiRetryPolicy, GameMode};
use xfchess_session::game::error::{ServiceError, ServiceResult, SuggestionError};
use xfchess_session::game::position::Position;
use xfchess_session::game::types::{
    AIDifficulty, GameStatus, MoveAttempt, MoveOutcome, MoveRecord, PieceColor, SessionId,
    SessionSnapshot, Suggestion,
};
use xfchess_session::networking::{AiService, GameService, NewSession, Resignation};
use xfchess_session::{ControllerOptions, SessionController};

// ============================================================================
// Positions
// ============================================================================

pub const START: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";
pub const AFTER_E4: &str = "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1";
pub const AFTER_E5: &str = "rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR w KQkq - 0 2";
pub const AFTER_NF3: &str = "rnbqkbnr/pppp1ppp/8/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R b KQkq - 1 2";
pub const AFTER_NC6: &str = "r1bqkbnr/pppp1ppp/2n5/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R w KQkq - 2 3";

pub const GAME_ID: &str = "5f0c2a9e-1b7d-4c1e-9a55-0d6f2b7c8e11";

pub fn pos(fen: &str) -> Position {
    Position::from_fen(fen).unwrap()
}

pub fn mv(uci: &str) -> MoveAttempt {
    uci.parse().unwrap()
}

pub fn snapshot(id: &str, fen: &str) -> SessionSnapshot {
    let position = pos(fen);
    SessionSnapshot {
        session_id: SessionId::new(id),
        turn: position.side_to_move(),
        position,
        status: GameStatus::Active,
        winner: None,
    }
}

pub fn accepted(fen: &str) -> MoveOutcome {
    accepted_with(fen, GameStatus::Active, None)
}

pub fn accepted_with(fen: &str, status: GameStatus, winner: Option<PieceColor>) -> MoveOutcome {
    let position = pos(fen);
    MoveOutcome {
        turn: position.side_to_move(),
        position,
        status,
        is_check: status == GameStatus::Check,
        is_checkmate: status == GameStatus::Checkmate,
        winner,
        record: None,
    }
}

pub fn illegal(message: &str) -> ServiceError {
    ServiceError::Rejected {
        status: 400,
        message: message.to_string(),
    }
}

pub fn suggestion(uci: &str) -> Suggestion {
    Suggestion {
        attempt: mv(uci),
        san: None,
    }
}

// ============================================================================
// Gate
// ============================================================================

/// Holds a scripted call open until released
#[derive(Default)]
pub struct Gate {
    entered: Notify,
    release: Notify,
}

impl Gate {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Wait until a call reaches the gate
    pub async fn entered(&self) {
        self.entered.notified().await;
    }

    /// Let the waiting call continue
    pub fn open(&self) {
        self.release.notify_one();
    }

    async fn pass(&self) {
        self.entered.notify_one();
        self.release.notified().await;
    }
}

// ============================================================================
// Game service
// ============================================================================

#[derive(Default)]
struct GameScript {
    creates: VecDeque<ServiceResult<SessionSnapshot>>,
    moves: VecDeque<ServiceResult<MoveOutcome>>,
    fetches: VecDeque<ServiceResult<SessionSnapshot>>,
    resigns: VecDeque<ServiceResult<Resignation>>,
    valid_moves: Vec<MoveAttempt>,
    history: Vec<MoveRecord>,
    create_gate: Option<Arc<Gate>>,
    move_gate: Option<Arc<Gate>>,
}

#[derive(Default)]
pub struct ScriptedGameService {
    script: Mutex<GameScript>,
    pub create_calls: AtomicUsize,
    pub move_calls: AtomicUsize,
    pub fetch_calls: AtomicUsize,
    pub submitted: Mutex<Vec<MoveAttempt>>,
    pub create_requests: Mutex<Vec<NewSession>>,
}

impl ScriptedGameService {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn on_create(&self, result: ServiceResult<SessionSnapshot>) {
        self.script.lock().creates.push_back(result);
    }

    pub fn on_move(&self, result: ServiceResult<MoveOutcome>) {
        self.script.lock().moves.push_back(result);
    }

    pub fn on_fetch(&self, result: ServiceResult<SessionSnapshot>) {
        self.script.lock().fetches.push_back(result);
    }

    pub fn on_resign(&self, result: ServiceResult<Resignation>) {
        self.script.lock().resigns.push_back(result);
    }

    pub fn set_valid_moves(&self, moves: Vec<MoveAttempt>) {
        self.script.lock().valid_moves = moves;
    }

    pub fn set_history(&self, history: Vec<MoveRecord>) {
        self.script.lock().history = history;
    }

    /// Hold every create call at `gate` until cleared
    pub fn gate_creates(&self, gate: Arc<Gate>) {
        self.script.lock().create_gate = Some(gate);
    }

    pub fn ungate_creates(&self) {
        self.script.lock().create_gate = None;
    }

    /// Hold every move call at `gate` until cleared
    pub fn gate_moves(&self, gate: Arc<Gate>) {
        self.script.lock().move_gate = Some(gate);
    }

    pub fn ungate_moves(&self) {
        self.script.lock().move_gate = None;
    }

    pub fn moves(&self) -> usize {
        self.move_calls.load(Ordering::SeqCst)
    }

    pub fn creates(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }
}

fn unscripted<T>(what: &str) -> ServiceResult<T> {
    Err(ServiceError::Transport(format!("no scripted {} response", what)))
}

#[async_trait]
impl GameService for ScriptedGameService {
    async fn create_session(&self, request: &NewSession) -> ServiceResult<SessionSnapshot> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        self.create_requests.lock().push(request.clone());
        let gate = self.script.lock().create_gate.clone();
        if let Some(gate) = gate {
            gate.pass().await;
        }
        let next = self.script.lock().creates.pop_front();
        next.unwrap_or_else(|| unscripted("create"))
    }

    async fn submit_move(
        &self,
        _session_id: &SessionId,
        attempt: &MoveAttempt,
    ) -> ServiceResult<MoveOutcome> {
        self.move_calls.fetch_add(1, Ordering::SeqCst);
        self.submitted.lock().push(*attempt);
        let gate = self.script.lock().move_gate.clone();
        if let Some(gate) = gate {
            gate.pass().await;
        }
        let next = self.script.lock().moves.pop_front();
        next.unwrap_or_else(|| unscripted("move"))
    }

    async fn fetch_session(&self, _session_id: &SessionId) -> ServiceResult<SessionSnapshot> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        let next = self.script.lock().fetches.pop_front();
        next.unwrap_or_else(|| unscripted("fetch"))
    }

    async fn resign(
        &self,
        _session_id: &SessionId,
        _color: PieceColor,
    ) -> ServiceResult<Resignation> {
        let next = self.script.lock().resigns.pop_front();
        next.unwrap_or_else(|| unscripted("resign"))
    }

    async fn valid_moves(
        &self,
        _session_id: &SessionId,
        square: Option<Square>,
    ) -> ServiceResult<Vec<MoveAttempt>> {
        let moves = self.script.lock().valid_moves.clone();
        Ok(moves
            .into_iter()
            .filter(|m| square.map_or(true, |sq| m.from == sq))
            .collect())
    }

    async fn move_history(&self, _session_id: &SessionId) -> ServiceResult<Vec<MoveRecord>> {
        Ok(self.script.lock().history.clone())
    }
}

// ============================================================================
// AI service
// ============================================================================

#[derive(Default)]
struct AiScript {
    suggestions: VecDeque<Result<Suggestion, SuggestionError>>,
    hints: VecDeque<Result<Suggestion, SuggestionError>>,
    gate: Option<Arc<Gate>>,
}

#[derive(Default)]
pub struct ScriptedAiService {
    script: Mutex<AiScript>,
    pub suggest_calls: AtomicUsize,
    /// Highest number of suggestion requests open at once
    pub max_concurrent: AtomicUsize,
    open: AtomicUsize,
    pub seen: Mutex<Vec<(Position, AIDifficulty)>>,
}

impl ScriptedAiService {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn on_suggest(&self, result: Result<Suggestion, SuggestionError>) {
        self.script.lock().suggestions.push_back(result);
    }

    pub fn on_hint(&self, result: Result<Suggestion, SuggestionError>) {
        self.script.lock().hints.push_back(result);
    }

    pub fn gate(&self, gate: Arc<Gate>) {
        self.script.lock().gate = Some(gate);
    }

    pub fn calls(&self) -> usize {
        self.suggest_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AiService for ScriptedAiService {
    async fn suggest_move(
        &self,
        position: &Position,
        difficulty: AIDifficulty,
    ) -> Result<Suggestion, SuggestionError> {
        self.suggest_calls.fetch_add(1, Ordering::SeqCst);
        let open = self.open.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_concurrent.fetch_max(open, Ordering::SeqCst);
        self.seen.lock().push((position.clone(), difficulty));

        let gate = self.script.lock().gate.clone();
        if let Some(gate) = gate {
            gate.pass().await;
        }
        let next = self.script.lock().suggestions.pop_front();
        self.open.fetch_sub(1, Ordering::SeqCst);
        next.unwrap_or_else(|| Err(SuggestionError::Declined("no scripted suggestion".into())))
    }

    async fn hint(&self, _position: &Position) -> Result<Suggestion, SuggestionError> {
        let next = self.script.lock().hints.pop_front();
        next.unwrap_or_else(|| Err(SuggestionError::Declined("no hint".into())))
    }
}

// ============================================================================
// Controller
// ============================================================================

pub struct Harness {
    pub games: Arc<ScriptedGameService>,
    pub ai: Arc<ScriptedAiService>,
    pub controller: SessionController,
}

pub fn harness() -> Harness {
    harness_with_retry(AiRetryPolicy::no_retry())
}

pub fn harness_with_retry(ai_retry: AiRetryPolicy) -> Harness {
    let games = ScriptedGameService::new();
    let ai = ScriptedAiService::new();
    let controller = SessionController::new(
        games.clone(),
        ai.clone(),
        ControllerOptions {
            player_id: "player-1".to_string(),
            ai_retry,
        },
    );
    Harness {
        games,
        ai,
        controller,
    }
}

impl Harness {
    /// Create a session starting from the initial position
    pub async fn start(&self, mode: GameMode) {
        self.games.on_create(Ok(snapshot(GAME_ID, START)));
        self.controller.create(mode).await.unwrap();
    }

    pub async fn start_vs_ai(&self, difficulty: AIDifficulty) {
        self.start(GameMode::vs_ai(difficulty)).await;
    }
}
