//! JSON game-record format: metadata, the current position, and the action
//! history of a game, serializable with serde.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::board::parse_square_in;
use crate::game::{Game, Phase, MAX_MOVES_PER_TURN};
use crate::protocol::kfen::{self, KfenError};

/// Supported record format version.
pub const RECORD_VERSION: &str = "1.0";

/// Errors from reading or restoring a game record.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("unsupported record version '{0}'")]
    UnsupportedVersion(String),

    #[error("invalid history: {0}")]
    InvalidHistory(String),

    #[error(transparent)]
    Kfen(#[from] KfenError),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Who played, where, and how it ended.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub north_player: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub south_player: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event: Option<String>,

    /// `ONGOING`, `NORTH_WINS`, `SOUTH_WINS`, or `DRAW`.
    #[serde(default = "default_result")]
    pub result: String,
}

fn default_result() -> String {
    "ONGOING".to_string()
}

/// The position block: dimensions plus the KFEN string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionInfo {
    pub rows: usize,
    pub cols: usize,
    pub kfen: String,
}

/// The turn-state block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateInfo {
    pub turn_number: u32,
    pub side_to_move: String,
    pub phase: String,
    /// Squares the side to move must vacate, in spreadsheet notation.
    #[serde(default)]
    pub pending_retreats: Vec<String>,
}

/// One recorded action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ActionRecord {
    Move {
        from: String,
        to: String,
        #[serde(default)]
        destroyed_arsenal: bool,
    },
    Attack {
        target: String,
        outcome: String,
    },
    Pass,
    EndTurn,
}

/// A complete game record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameRecord {
    pub version: String,
    #[serde(default)]
    pub metadata: RecordMetadata,
    pub position: PositionInfo,
    pub state: StateInfo,
    #[serde(default)]
    pub history: Vec<ActionRecord>,
}

impl GameRecord {
    /// Snapshots the current game. History starts empty; the caller appends
    /// as actions are applied.
    pub fn from_game(game: &Game, metadata: RecordMetadata) -> Result<GameRecord, RecordError> {
        let kfen = kfen::encode(game)?;
        let mut metadata = metadata;
        metadata.result = game.game_state().name().to_string();
        Ok(GameRecord {
            version: RECORD_VERSION.to_string(),
            metadata,
            position: PositionInfo {
                rows: game.board().rows(),
                cols: game.board().cols(),
                kfen,
            },
            state: StateInfo {
                turn_number: game.turn_number(),
                side_to_move: game.side_to_move().name().to_string(),
                phase: game.phase().kfen_char().to_string(),
                pending_retreats: game.pending_retreats().iter().map(|s| s.to_string()).collect(),
            },
            history: Vec::new(),
        })
    }

    pub fn to_json(&self) -> Result<String, RecordError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(s: &str) -> Result<GameRecord, RecordError> {
        let record: GameRecord = serde_json::from_str(s)?;
        if record.version != RECORD_VERSION {
            return Err(RecordError::UnsupportedVersion(record.version));
        }
        record.validate_history()?;
        Ok(record)
    }

    /// Restores the recorded position as a playable game.
    pub fn restore(&self) -> Result<Game, RecordError> {
        let mut game = kfen::decode(&self.position.kfen)?;
        game.set_turn_number(self.state.turn_number);
        let dims = game.board().dims();
        let retreats = self
            .state
            .pending_retreats
            .iter()
            .map(|s| {
                parse_square_in(s, dims)
                    .map_err(|_| RecordError::InvalidHistory(format!("bad retreat square '{s}'")))
            })
            .collect::<Result<Vec<_>, _>>()?;
        game.restore_retreats(retreats);
        Ok(game)
    }

    /// Structural checks on the history: per-turn budgets and at most one
    /// attack or pass between turn ends.
    pub fn validate_history(&self) -> Result<(), RecordError> {
        let mut moves = 0usize;
        let mut attacks = 0usize;
        for (i, action) in self.history.iter().enumerate() {
            match action {
                ActionRecord::Move { .. } => {
                    moves += 1;
                    if moves > MAX_MOVES_PER_TURN {
                        return Err(RecordError::InvalidHistory(format!(
                            "more than {MAX_MOVES_PER_TURN} moves before action {i}"
                        )));
                    }
                }
                ActionRecord::Attack { .. } | ActionRecord::Pass => {
                    attacks += 1;
                    if attacks > 1 {
                        return Err(RecordError::InvalidHistory(format!(
                            "second attack or pass before action {i}"
                        )));
                    }
                }
                ActionRecord::EndTurn => {
                    moves = 0;
                    attacks = 0;
                }
            }
        }
        Ok(())
    }
}

/// Replays a history on top of a starting position, failing on the first
/// illegal action.
pub fn replay(start_kfen: &str, history: &[ActionRecord]) -> Result<Game, RecordError> {
    let mut game = kfen::decode(start_kfen)?;
    let dims = game.board().dims();
    let bad = |i: usize, what: &str| RecordError::InvalidHistory(format!("action {i}: {what}"));

    for (i, action) in history.iter().enumerate() {
        match action {
            ActionRecord::Move { from, to, .. } => {
                let from = parse_square_in(from, dims).map_err(|e| bad(i, &e.to_string()))?;
                let to = parse_square_in(to, dims).map_err(|e| bad(i, &e.to_string()))?;
                game.make_move(from, to).map_err(|e| bad(i, &e.to_string()))?;
            }
            ActionRecord::Attack { target, .. } => {
                if game.phase() == Phase::Movement {
                    game.switch_to_battle().map_err(|e| bad(i, &e.to_string()))?;
                }
                let target = parse_square_in(target, dims).map_err(|e| bad(i, &e.to_string()))?;
                game.make_attack(target).map_err(|e| bad(i, &e.to_string()))?;
            }
            ActionRecord::Pass => {
                if game.phase() == Phase::Movement {
                    game.switch_to_battle().map_err(|e| bad(i, &e.to_string()))?;
                }
                game.pass_attack().map_err(|e| bad(i, &e.to_string()))?;
            }
            ActionRecord::EndTurn => {
                game.end_turn().map_err(|e| bad(i, &e.to_string()))?;
            }
        }
    }
    Ok(game)
}
