//! Turn state machine: phases, per-turn budgets, retreat enforcement, and
//! end-of-turn transitions.
//!
//! Control flow per action: validate, mutate the board, recompute the
//! network (done by the board itself), then advance the machine. A failed
//! action never transitions state.

use thiserror::Error;

use crate::board::{Board, Side, Square, Unit};
use crate::combat::{self, AttackError, CombatOutcome, CombatReport};
use crate::movegen::{self, MoveError};
use crate::victory::{self, GameState, VictoryReport};

/// A side may move at most five units per turn.
pub const MAX_MOVES_PER_TURN: usize = 5;

/// Phase within a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Movement,
    Battle,
}

impl Phase {
    /// The single-character KFEN abbreviation.
    pub const fn kfen_char(self) -> char {
        match self {
            Phase::Movement => 'M',
            Phase::Battle => 'B',
        }
    }

    pub fn from_kfen_char(c: char) -> Option<Phase> {
        match c {
            'M' => Some(Phase::Movement),
            'B' => Some(Phase::Battle),
            _ => None,
        }
    }
}

/// Why a turn action was rejected. The state machine never transitions on
/// a rejected action.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ActionError {
    #[error("game is over")]
    GameOver,

    #[error("wrong phase for this action")]
    WrongPhase,

    #[error("turn cannot end: the battle phase has not been resolved")]
    TurnNotEndable,

    #[error("no unit at {0}")]
    NoUnitAt(String),

    #[error("unit at {0} does not belong to the side to move")]
    NotYourUnit(String),

    #[error("unit at {0} has already moved this turn")]
    AlreadyMoved(String),

    #[error("no moves left this turn")]
    OutOfMoveBudget,

    #[error("a pending retreat must be resolved first")]
    MustRetreatFirst,

    #[error("no attacks left this turn")]
    NoAttacksLeft,

    #[error("already attacked or passed this turn")]
    AlreadyAttacked,

    #[error(transparent)]
    Move(#[from] MoveError),

    #[error(transparent)]
    Attack(#[from] AttackError),
}

/// What a successful move did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveOutcome {
    /// The move entered an enemy arsenal, destroying it and consuming the
    /// turn's attack.
    pub arsenal_destroyed: bool,
}

/// A unit destroyed because it had nowhere to retreat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetreatCasualty {
    pub square: Square,
    pub unit: Unit,
}

/// Snapshot of the turn state, for front ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnSummary {
    pub turn_number: u32,
    pub side_to_move: Side,
    pub phase: Phase,
    pub moves_made: usize,
    pub moves_remaining: usize,
    pub attacks_made: u8,
    pub attacks_remaining: u8,
    pub pending_retreats: usize,
}

/// Picks the side that moves first. The only randomness in the engine;
/// callers may equally supply a side of their own.
pub fn coin_flip<R: rand::Rng>(rng: &mut R) -> Side {
    if rng.gen_bool(0.5) {
        Side::North
    } else {
        Side::South
    }
}

/// A game in progress: the board plus the turn state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Game {
    board: Board,
    side_to_move: Side,
    turn_number: u32,
    phase: Phase,
    /// `(from, to)` of every move this turn. Budget counting and the
    /// moved-twice check use the destination.
    moves_made: Vec<(Square, Square)>,
    attacks_this_turn: u8,
    attack_target: Option<Square>,
    /// Cells marked for retreat during this turn's battle; they belong to
    /// the side about to move and are resolved at end of turn.
    marked_retreats: Vec<Square>,
    /// Cells of the side to move that must retreat before anything else.
    must_retreat: Vec<Square>,
    state: GameState,
    victory: Option<VictoryReport>,
}

impl Game {
    /// Starts a game on `board` with North to move.
    pub fn new(board: Board) -> Game {
        Game::with_first_player(board, Side::North)
    }

    /// Starts a game with an explicitly chosen first player.
    pub fn with_first_player(board: Board, first: Side) -> Game {
        Game {
            board,
            side_to_move: first,
            turn_number: 1,
            phase: Phase::Movement,
            moves_made: Vec::new(),
            attacks_this_turn: 0,
            attack_target: None,
            marked_retreats: Vec::new(),
            must_retreat: Vec::new(),
            state: GameState::Ongoing,
            victory: None,
        }
    }

    /// Reassembles a game from decoded position data. The codec owns the
    /// validation of its inputs.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn from_parts(
        board: Board,
        side_to_move: Side,
        turn_number: u32,
        phase: Phase,
        moves_made: Vec<(Square, Square)>,
        attacks_this_turn: u8,
        attack_target: Option<Square>,
    ) -> Game {
        Game {
            board,
            side_to_move,
            turn_number,
            phase,
            moves_made,
            attacks_this_turn,
            attack_target,
            marked_retreats: Vec::new(),
            must_retreat: Vec::new(),
            state: GameState::Ongoing,
            victory: None,
        }
    }

    /// Record restoration: the codec has no turn-number field.
    pub(crate) fn set_turn_number(&mut self, n: u32) {
        self.turn_number = n;
    }

    /// Record restoration: pending retreats are not part of the KFEN string.
    pub(crate) fn restore_retreats(&mut self, retreats: Vec<Square>) {
        self.must_retreat = retreats;
    }

    // Queries

    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Session-layer access for applying engine options to a live game.
    pub(crate) fn board_mut(&mut self) -> &mut Board {
        &mut self.board
    }

    pub fn side_to_move(&self) -> Side {
        self.side_to_move
    }

    pub fn turn_number(&self) -> u32 {
        self.turn_number
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn moves_made(&self) -> &[(Square, Square)] {
        &self.moves_made
    }

    pub fn attacks_this_turn(&self) -> u8 {
        self.attacks_this_turn
    }

    pub fn attack_target(&self) -> Option<Square> {
        self.attack_target
    }

    /// Cells the side to move must vacate before any other action.
    pub fn pending_retreats(&self) -> &[Square] {
        &self.must_retreat
    }

    /// Cells marked for retreat during this turn, to be resolved when the
    /// opposing side comes to move.
    pub fn marked_retreats(&self) -> &[Square] {
        &self.marked_retreats
    }

    pub fn game_state(&self) -> GameState {
        self.state
    }

    pub fn is_game_over(&self) -> bool {
        self.state != GameState::Ongoing
    }

    pub fn victory_report(&self) -> Option<&VictoryReport> {
        self.victory.as_ref()
    }

    /// Evaluates the victory conditions on the current board without
    /// advancing the machine.
    pub fn evaluate_victory(&self) -> VictoryReport {
        victory::check(&self.board)
    }

    pub fn summary(&self) -> TurnSummary {
        TurnSummary {
            turn_number: self.turn_number,
            side_to_move: self.side_to_move,
            phase: self.phase,
            moves_made: self.moves_made.len(),
            moves_remaining: MAX_MOVES_PER_TURN - self.moves_made.len(),
            attacks_made: self.attacks_this_turn,
            attacks_remaining: 1 - self.attacks_this_turn,
            pending_retreats: self.must_retreat.len(),
        }
    }

    /// True when a move originated from or ended on `sq` this turn. The
    /// destination is what counts: a unit that has moved cannot move again.
    pub fn has_moved(&self, sq: Square) -> bool {
        self.moves_made.iter().any(|&(_, to)| to == sq)
    }

    /// Legal destinations for the unit at `from` under the full turn rules.
    pub fn legal_moves(&self, from: Square) -> Vec<Square> {
        if self.is_game_over()
            || self.phase != Phase::Movement
            || self.moves_made.len() >= MAX_MOVES_PER_TURN
            || self.has_moved(from)
            || !self.board.is_friendly(from, self.side_to_move)
        {
            return Vec::new();
        }
        if !self.must_retreat.is_empty() {
            if self.must_retreat.contains(&from) {
                return movegen::retreat_destinations(&self.board, from);
            }
            return Vec::new();
        }
        movegen::legal_moves(&self.board, from)
    }

    fn ensure_ongoing(&self) -> Result<(), ActionError> {
        if self.is_game_over() {
            return Err(ActionError::GameOver);
        }
        Ok(())
    }

    // Transitions

    /// Moves a unit of the side to move. An entry into an enemy arsenal
    /// destroys it and consumes the turn's attack slot.
    pub fn make_move(&mut self, from: Square, to: Square) -> Result<MoveOutcome, ActionError> {
        self.ensure_ongoing()?;
        if self.phase != Phase::Movement {
            return Err(ActionError::WrongPhase);
        }

        let unit = self
            .board
            .unit_at(from)
            .ok_or_else(|| ActionError::NoUnitAt(from.to_string()))?;
        if unit.side != self.side_to_move {
            return Err(ActionError::NotYourUnit(from.to_string()));
        }
        if self.moves_made.len() >= MAX_MOVES_PER_TURN {
            return Err(ActionError::OutOfMoveBudget);
        }
        if self.has_moved(from) {
            return Err(ActionError::AlreadyMoved(from.to_string()));
        }

        let retreating = self.must_retreat.contains(&from);
        if !self.must_retreat.is_empty() && !retreating {
            return Err(ActionError::MustRetreatFirst);
        }

        if retreating {
            // A forced retreat is a single step to an adjacent safe cell.
            if !movegen::retreat_destinations(&self.board, from).contains(&to) {
                return Err(MoveError::MovementBlocked(to.to_string()).into());
            }
        } else {
            movegen::validate_move(&self.board, from, to)?;
        }

        let raided = self.board.terrain_at(to).arsenal_owner() == Some(unit.side.opponent());
        if raided {
            self.board.destroy_arsenal(to);
        }
        self.board.move_unit(from, to);
        self.moves_made.push((from, to));
        self.must_retreat.retain(|&sq| sq != from);

        if raided {
            // The entry is the attack for this turn.
            self.phase = Phase::Battle;
            self.attacks_this_turn = 1;
            self.attack_target = Some(to);
        }

        Ok(MoveOutcome { arsenal_destroyed: raided })
    }

    /// Ends the movement phase. Refused while retreats are unresolved.
    pub fn switch_to_battle(&mut self) -> Result<(), ActionError> {
        self.ensure_ongoing()?;
        if self.phase != Phase::Movement {
            return Err(ActionError::WrongPhase);
        }
        if !self.must_retreat.is_empty() {
            return Err(ActionError::MustRetreatFirst);
        }
        self.phase = Phase::Battle;
        Ok(())
    }

    /// Resolves the turn's single attack against `target`.
    pub fn make_attack(&mut self, target: Square) -> Result<CombatReport, ActionError> {
        self.ensure_ongoing()?;
        if self.phase != Phase::Battle {
            return Err(ActionError::WrongPhase);
        }
        if self.attacks_this_turn > 0 {
            return Err(ActionError::NoAttacksLeft);
        }
        if !self.must_retreat.is_empty() {
            return Err(ActionError::MustRetreatFirst);
        }

        combat::check_target(&self.board, target, self.side_to_move)?;
        let report = combat::evaluate(&self.board, target, self.side_to_move);

        match report.outcome {
            CombatOutcome::Capture => {
                self.board.remove(target).expect("validated attack target");
            }
            CombatOutcome::Retreat => {
                if !self.marked_retreats.contains(&target) {
                    self.marked_retreats.push(target);
                }
            }
            CombatOutcome::Neutral => {}
        }

        self.attacks_this_turn = 1;
        self.attack_target = Some(target);
        Ok(report)
    }

    /// Declines the turn's attack.
    pub fn pass_attack(&mut self) -> Result<(), ActionError> {
        self.ensure_ongoing()?;
        if self.phase != Phase::Battle {
            return Err(ActionError::WrongPhase);
        }
        if self.attacks_this_turn > 0 {
            return Err(ActionError::AlreadyAttacked);
        }
        self.attacks_this_turn = 1;
        self.attack_target = None;
        Ok(())
    }

    /// Ends the turn: flips the side to move, resolves the incoming side's
    /// marked retreats, recomputes the network, and checks victory.
    /// Returns units destroyed for lack of a retreat square.
    pub fn end_turn(&mut self) -> Result<Vec<RetreatCasualty>, ActionError> {
        self.ensure_ongoing()?;
        if self.phase != Phase::Battle || self.attacks_this_turn == 0 {
            return Err(ActionError::TurnNotEndable);
        }
        debug_assert!(self.must_retreat.is_empty(), "retreats must resolve before battle");

        let finished = self.side_to_move;
        self.side_to_move = finished.opponent();
        if finished == Side::South {
            self.turn_number += 1;
        }
        self.phase = Phase::Movement;
        self.moves_made.clear();
        self.attacks_this_turn = 0;
        self.attack_target = None;
        self.must_retreat.clear();

        // Resolve retreats for the incoming side: a unit with no safe
        // neighbor is destroyed, the rest must move first.
        let mut casualties = Vec::new();
        for sq in std::mem::take(&mut self.marked_retreats) {
            match self.board.unit_at(sq) {
                Some(u) if u.side == self.side_to_move => {
                    if movegen::retreat_destinations(&self.board, sq).is_empty() {
                        let unit = self.board.remove(sq).expect("retreating unit present");
                        casualties.push(RetreatCasualty { square: sq, unit });
                    } else {
                        self.must_retreat.push(sq);
                    }
                }
                _ => {}
            }
        }

        let report = self.evaluate_victory();
        if report.state != GameState::Ongoing {
            self.state = report.state;
            self.victory = Some(report);
        }

        Ok(casualties)
    }

    /// External surrender signal.
    pub fn surrender(&mut self, side: Side) -> Result<(), ActionError> {
        self.ensure_ongoing()?;
        let report = victory::surrender_report(side);
        self.state = report.state;
        self.victory = Some(report);
        Ok(())
    }
}
