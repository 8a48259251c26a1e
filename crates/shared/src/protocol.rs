use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Side of the board, as the services spell it (`"white"` / `"black"`)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PieceColor {
    White,
    Black,
}

impl PieceColor {
    pub fn opposite(self) -> Self {
        match self {
            PieceColor::White => PieceColor::Black,
            PieceColor::Black => PieceColor::White,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PieceColor::White => "white",
            PieceColor::Black => "black",
        }
    }
}

impl fmt::Display for PieceColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PieceColor::White => f.write_str("White"),
            PieceColor::Black => f.write_str("Black"),
        }
    }
}

impl FromStr for PieceColor {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "white" | "w" => Ok(PieceColor::White),
            "black" | "b" => Ok(PieceColor::Black),
            _ => Err(UnknownVariant::new("color", s)),
        }
    }
}

/// Game status reported by the game service after every state change
///
/// `Draw` covers insufficient material; the service reports it separately
/// from stalemate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    Active,
    Check,
    Checkmate,
    Stalemate,
    Draw,
    Resigned,
}

impl GameStatus {
    /// Moves are accepted only while the game is active or in check
    pub fn accepts_moves(self) -> bool {
        matches!(self, GameStatus::Active | GameStatus::Check)
    }

    pub fn is_over(self) -> bool {
        !self.accepts_moves()
    }
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            GameStatus::Active => "active",
            GameStatus::Check => "check",
            GameStatus::Checkmate => "checkmate",
            GameStatus::Stalemate => "stalemate",
            GameStatus::Draw => "draw",
            GameStatus::Resigned => "resigned",
        };
        f.write_str(text)
    }
}

/// Mode tag accepted by `POST /games`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameModeKind {
    Local,
    Ai,
}

/// Strength requested from the AI service
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AIDifficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl AIDifficulty {
    pub fn as_str(self) -> &'static str {
        match self {
            AIDifficulty::Easy => "easy",
            AIDifficulty::Medium => "medium",
            AIDifficulty::Hard => "hard",
        }
    }
}

impl fmt::Display for AIDifficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AIDifficulty {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(AIDifficulty::Easy),
            "medium" => Ok(AIDifficulty::Medium),
            "hard" => Ok(AIDifficulty::Hard),
            _ => Err(UnknownVariant::new("difficulty", s)),
        }
    }
}

/// Returned when a wire enum is parsed from free text
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl UnknownVariant {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

impl fmt::Display for UnknownVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown {}: {:?}", self.kind, self.value)
    }
}

impl std::error::Error for UnknownVariant {}

// ---------------------------------------------------------------------------
// Game service
// ---------------------------------------------------------------------------

/// `POST /games`
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct CreateGameRequest {
    pub mode: GameModeKind,
    pub white_player_id: Option<String>,
    pub black_player_id: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct CreateGameResponse {
    pub game_id: String,
    #[serde(default)]
    pub mode: Option<GameModeKind>,
    pub board_state: String,
    pub current_turn: PieceColor,
    pub status: GameStatus,
}

/// `GET /games/{id}`
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct GameStateResponse {
    pub game_id: String,
    pub board_state: String,
    pub current_turn: PieceColor,
    pub status: GameStatus,
    #[serde(default)]
    pub winner: Option<PieceColor>,
    #[serde(default)]
    pub is_check: bool,
    #[serde(default)]
    pub is_game_over: bool,
}

/// `POST /games/{id}/move`
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct MoveRequest {
    pub from: String,
    pub to: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promotion: Option<String>,
}

/// Details of an applied move, as echoed by the game service
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct MoveDetails {
    pub from: String,
    pub to: String,
    #[serde(default)]
    pub piece: Option<String>,
    #[serde(default)]
    pub captured: Option<String>,
    #[serde(default)]
    pub promotion: Option<String>,
    #[serde(default)]
    pub notation: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct MoveResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default, rename = "move")]
    pub applied: Option<MoveDetails>,
    pub board_state: String,
    pub current_turn: PieceColor,
    pub status: GameStatus,
    #[serde(default)]
    pub winner: Option<PieceColor>,
    #[serde(default)]
    pub is_check: bool,
    #[serde(default)]
    pub is_checkmate: bool,
    #[serde(default)]
    pub is_game_over: bool,
}

/// `POST /games/{id}/resign`
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ResignRequest {
    pub color: PieceColor,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ResignResponse {
    #[serde(default)]
    pub message: Option<String>,
    pub status: GameStatus,
    #[serde(default)]
    pub winner: Option<PieceColor>,
}

/// `GET /games/{id}/valid-moves`
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ValidMovesResponse {
    pub valid_moves: Vec<String>,
    #[serde(default)]
    pub count: usize,
}

/// One entry of `GET /games/{id}/history`
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct HistoryEntry {
    pub from: String,
    pub to: String,
    #[serde(default)]
    pub piece: Option<String>,
    #[serde(default)]
    pub captured: Option<String>,
    #[serde(default)]
    pub notation: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct HistoryResponse {
    pub game_id: String,
    pub moves: Vec<HistoryEntry>,
    #[serde(default)]
    pub total_moves: usize,
}

// ---------------------------------------------------------------------------
// AI service
// ---------------------------------------------------------------------------

/// `POST /ai/move`
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct AiMoveRequest {
    pub fen: String,
    pub difficulty: AIDifficulty,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct AiMove {
    pub from: String,
    pub to: String,
    #[serde(default)]
    pub promotion: Option<String>,
    #[serde(default)]
    pub uci: Option<String>,
    #[serde(default)]
    pub san: Option<String>,
    #[serde(default)]
    pub piece: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct AiMoveResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default, rename = "move")]
    pub suggestion: Option<AiMove>,
    #[serde(default)]
    pub difficulty: Option<AIDifficulty>,
    #[serde(default)]
    pub evaluation: Option<serde_json::Value>,
    #[serde(default)]
    pub fen: Option<String>,
}

/// `POST /ai/hint`
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct HintRequest {
    pub fen: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct HintMove {
    pub from: String,
    pub to: String,
    #[serde(default)]
    pub san: Option<String>,
    #[serde(default)]
    pub piece: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct HintResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub hint: Option<HintMove>,
}

/// Body of every non-2xx response
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ErrorBody {
    pub error: String,
}
