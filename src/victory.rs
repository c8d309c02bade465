//! Victory condition detection.
//!
//! A side loses when both its arsenals are gone, when it has no mobile
//! combat units left, when its relays are destroyed and every remaining
//! unit is offline, or when it surrenders. The arsenal and network
//! conditions only apply while the LOC rules are enabled. Simultaneous
//! defeat is a draw.

use crate::board::{Board, Side};

/// Terminal state of the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameState {
    Ongoing,
    NorthWins,
    SouthWins,
    Draw,
}

impl GameState {
    pub const fn name(self) -> &'static str {
        match self {
            GameState::Ongoing => "ONGOING",
            GameState::NorthWins => "NORTH_WINS",
            GameState::SouthWins => "SOUTH_WINS",
            GameState::Draw => "DRAW",
        }
    }

    pub const fn winner(self) -> Option<Side> {
        match self {
            GameState::NorthWins => Some(Side::North),
            GameState::SouthWins => Some(Side::South),
            _ => None,
        }
    }

    pub const fn wins_for(side: Side) -> GameState {
        match side {
            Side::North => GameState::NorthWins,
            Side::South => GameState::SouthWins,
        }
    }

    pub fn from_name(s: &str) -> Option<GameState> {
        match s {
            "ONGOING" => Some(GameState::Ongoing),
            "NORTH_WINS" => Some(GameState::NorthWins),
            "SOUTH_WINS" => Some(GameState::SouthWins),
            "DRAW" => Some(GameState::Draw),
            _ => None,
        }
    }
}

/// The specific condition that decided the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VictoryCondition {
    ArsenalsDestroyed,
    NoMobileUnits,
    NetworkCollapse,
    Surrender,
}

impl VictoryCondition {
    pub const fn name(self) -> &'static str {
        match self {
            VictoryCondition::ArsenalsDestroyed => "ARSENALS_DESTROYED",
            VictoryCondition::NoMobileUnits => "NO_MOBILE_UNITS",
            VictoryCondition::NetworkCollapse => "NETWORK_COLLAPSE",
            VictoryCondition::Surrender => "SURRENDER",
        }
    }
}

/// Outcome of a victory check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VictoryReport {
    pub state: GameState,
    pub winner: Option<Side>,
    pub condition: Option<VictoryCondition>,
    pub details: String,
}

impl VictoryReport {
    fn ongoing() -> VictoryReport {
        VictoryReport {
            state: GameState::Ongoing,
            winner: None,
            condition: None,
            details: "game is ongoing".to_string(),
        }
    }
}

/// The condition defeating `side` on the current board, if any.
pub fn side_defeated(board: &Board, side: Side) -> Option<VictoryCondition> {
    if board.networks_enabled() && board.arsenal_count(side) == 0 {
        return Some(VictoryCondition::ArsenalsDestroyed);
    }

    if !board.units_of(side).any(|(_, u)| u.kind.is_combat()) {
        return Some(VictoryCondition::NoMobileUnits);
    }

    if board.networks_enabled() {
        let has_relay = board.units_of(side).any(|(_, u)| u.kind.is_relay());
        if !has_relay && board.online_units(side).next().is_none() {
            return Some(VictoryCondition::NetworkCollapse);
        }
    }

    None
}

/// Checks both sides' losing conditions and reports the game state.
pub fn check(board: &Board) -> VictoryReport {
    let north = side_defeated(board, Side::North);
    let south = side_defeated(board, Side::South);

    match (north, south) {
        (None, None) => VictoryReport::ongoing(),
        (Some(_), Some(_)) => VictoryReport {
            state: GameState::Draw,
            winner: None,
            condition: None,
            details: "draw: both sides defeated simultaneously".to_string(),
        },
        (Some(cond), None) => defeat_report(Side::North, cond),
        (None, Some(cond)) => defeat_report(Side::South, cond),
    }
}

/// Builds the report for a surrender by `side`.
pub fn surrender_report(side: Side) -> VictoryReport {
    let winner = side.opponent();
    VictoryReport {
        state: GameState::wins_for(winner),
        winner: Some(winner),
        condition: Some(VictoryCondition::Surrender),
        details: format!("{} wins: {} has surrendered", winner.name(), side.name()),
    }
}

fn defeat_report(loser: Side, condition: VictoryCondition) -> VictoryReport {
    let winner = loser.opponent();
    let details = match condition {
        VictoryCondition::ArsenalsDestroyed => {
            format!("{} wins: both of {}'s arsenals are destroyed", winner.name(), loser.name())
        }
        VictoryCondition::NoMobileUnits => {
            format!("{} wins: {} has no combat units left", winner.name(), loser.name())
        }
        VictoryCondition::NetworkCollapse => format!(
            "{} wins: {}'s relays are destroyed and every remaining unit is offline",
            winner.name(),
            loser.name()
        ),
        VictoryCondition::Surrender => {
            format!("{} wins: {} has surrendered", winner.name(), loser.name())
        }
    };
    VictoryReport {
        state: GameState::wins_for(winner),
        winner: Some(winner),
        condition: Some(condition),
        details,
    }
}
