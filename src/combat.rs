//! Vector-summed combat: attack/defense power along the 8 lines through a
//! target, cavalry-charge stacking, and outcome resolution.
//!
//! Line of sight runs outward from the target. Enemy units and mountains
//! terminate a line at their cell; friendly units and all other terrain are
//! transparent. Terrain defense bonuses apply to the target only.

use thiserror::Error;

use crate::board::{Board, Direction, Side, Square, Terrain, Unit, UnitKind};

/// Cavalry in an unbroken charge chain contribute attack + 3.
const CHARGE_BONUS: i32 = 3;
/// At most four cavalry stack in one charge line.
const MAX_CHARGE_STACK: usize = 4;

/// Why an attack on a target square is rejected.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AttackError {
    #[error("no attacking unit has a line to {0}")]
    NoLineToTarget(String),

    #[error("target {0} is out of range of every attacking unit")]
    TargetOutOfRange(String),

    #[error("{0} is not a valid attack target")]
    InvalidTarget(String),
}

/// Result of comparing attack and defense power.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CombatOutcome {
    /// `A <= D`: no state change.
    Neutral,
    /// `A == D + 1`: the defender must vacate next turn.
    Retreat,
    /// `A >= D + 2`: the defender is removed immediately.
    Capture,
}

/// Totals and outcome for one prospective attack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CombatReport {
    pub attack_power: i32,
    pub defense_power: i32,
    pub outcome: CombatOutcome,
}

/// One unit's contribution to an attack or defense total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Contribution {
    pub square: Square,
    pub unit: Unit,
    pub amount: i32,
    pub charging: bool,
}

/// Why a unit in line with the target contributes nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockReason {
    OutOfRange,
    PathBlocked,
}

/// Full per-unit breakdown of a prospective attack, for front ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CombatPreview {
    pub report: CombatReport,
    pub attackers: Vec<Contribution>,
    pub defenders: Vec<Contribution>,
    pub blocked_attackers: Vec<(Square, BlockReason)>,
    pub blocked_defenders: Vec<(Square, BlockReason)>,
}

/// A friendly unit found on one line through the target.
struct LineUnit {
    square: Square,
    unit: Unit,
    distance: usize,
    /// An enemy unit or mountain sits between it and the target.
    beyond_block: bool,
}

/// Collects `side`'s units along one ray from the target, outward order.
fn line_units(board: &Board, target: Square, dir: Direction, side: Side) -> Vec<LineUnit> {
    let mut units = Vec::new();
    let mut blocked = false;
    for (i, cell) in board.dims().ray(target, dir).enumerate() {
        if board.terrain_at(cell).blocks_ray() {
            blocked = true;
            continue;
        }
        match board.unit_at(cell) {
            Some(u) if u.side == side => units.push(LineUnit {
                square: cell,
                unit: u,
                distance: i + 1,
                beyond_block: blocked,
            }),
            Some(_) => blocked = true,
            None => {}
        }
    }
    units
}

/// Length of the cavalry charge chain at the head of one line: consecutive
/// friendly cavalry from the cell adjacent to the target outward, none in a
/// fortress, capped at four. Zero when the target stands on a pass or
/// fortress.
fn charge_length(board: &Board, target: Square, units: &[LineUnit]) -> usize {
    if matches!(board.terrain_at(target), Terrain::Pass | Terrain::Fortress) {
        return 0;
    }
    let mut len = 0;
    for (k, lu) in units.iter().take(MAX_CHARGE_STACK).enumerate() {
        if lu.beyond_block
            || lu.distance != k + 1
            || lu.unit.kind != UnitKind::Cavalry
            || board.terrain_at(lu.square) == Terrain::Fortress
        {
            break;
        }
        len += 1;
    }
    len
}

/// Attack contributions of `attacker`'s units along one line.
fn attack_line(
    board: &Board,
    target: Square,
    dir: Direction,
    attacker: Side,
    contributions: &mut Vec<Contribution>,
    blocked: &mut Vec<(Square, BlockReason)>,
) {
    let units = line_units(board, target, dir, attacker);
    let charge = charge_length(board, target, &units);

    for (k, lu) in units.iter().enumerate() {
        if k < charge {
            // Charging cavalry are exempt from the range check.
            contributions.push(Contribution {
                square: lu.square,
                unit: lu.unit,
                amount: board.effective_attack(lu.square) + CHARGE_BONUS,
                charging: true,
            });
        } else if lu.beyond_block {
            blocked.push((lu.square, BlockReason::PathBlocked));
        } else if board.effective_range(lu.square) < lu.distance {
            blocked.push((lu.square, BlockReason::OutOfRange));
        } else {
            contributions.push(Contribution {
                square: lu.square,
                unit: lu.unit,
                amount: board.effective_attack(lu.square),
                charging: false,
            });
        }
    }
}

/// Defense contributions along one line: supporters need range and a clear
/// path, and never receive terrain bonuses.
fn defense_line(
    board: &Board,
    target: Square,
    dir: Direction,
    defender: Side,
    contributions: &mut Vec<Contribution>,
    blocked: &mut Vec<(Square, BlockReason)>,
) {
    for lu in line_units(board, target, dir, defender) {
        if lu.beyond_block {
            blocked.push((lu.square, BlockReason::PathBlocked));
        } else if board.effective_range(lu.square) < lu.distance {
            blocked.push((lu.square, BlockReason::OutOfRange));
        } else {
            contributions.push(Contribution {
                square: lu.square,
                unit: lu.unit,
                amount: board.effective_defense(lu.square),
                charging: false,
            });
        }
    }
}

/// Total attack power `attacker` brings against `target`.
pub fn attack_power(board: &Board, target: Square, attacker: Side) -> i32 {
    let mut contributions = Vec::new();
    let mut blocked = Vec::new();
    for dir in Direction::ALL {
        attack_line(board, target, dir, attacker, &mut contributions, &mut blocked);
    }
    contributions.iter().map(|c| c.amount).sum()
}

/// Total defense power protecting `target` for `defender`: the target
/// unit's own effective defense plus its terrain bonus, plus supporters.
pub fn defense_power(board: &Board, target: Square, defender: Side) -> i32 {
    let mut total = 0;
    if matches!(board.unit_at(target), Some(u) if u.side == defender) {
        total += board.effective_defense(target) + board.terrain_at(target).defense_bonus();
    }
    let mut contributions = Vec::new();
    let mut blocked = Vec::new();
    for dir in Direction::ALL {
        defense_line(board, target, dir, defender, &mut contributions, &mut blocked);
    }
    total + contributions.iter().map(|c| c.amount).sum::<i32>()
}

/// Resolves attack versus defense power.
pub const fn resolve(attack: i32, defense: i32) -> CombatOutcome {
    if attack <= defense {
        CombatOutcome::Neutral
    } else if attack == defense + 1 {
        CombatOutcome::Retreat
    } else {
        CombatOutcome::Capture
    }
}

/// Computes the full combat report for `attacker` striking `target`.
pub fn evaluate(board: &Board, target: Square, attacker: Side) -> CombatReport {
    let attack = attack_power(board, target, attacker);
    let defense = defense_power(board, target, attacker.opponent());
    CombatReport {
        attack_power: attack,
        defense_power: defense,
        outcome: resolve(attack, defense),
    }
}

/// Per-unit breakdown of a prospective attack, including units barred from
/// contributing and why. Purely informational; does not mutate anything.
pub fn preview(board: &Board, target: Square, attacker: Side) -> CombatPreview {
    let defender = attacker.opponent();

    let mut attackers = Vec::new();
    let mut blocked_attackers = Vec::new();
    let mut defenders = Vec::new();
    let mut blocked_defenders = Vec::new();

    if let Some(u) = board.unit_at(target) {
        if u.side == defender {
            defenders.push(Contribution {
                square: target,
                unit: u,
                amount: board.effective_defense(target)
                    + board.terrain_at(target).defense_bonus(),
                charging: false,
            });
        }
    }

    for dir in Direction::ALL {
        attack_line(board, target, dir, attacker, &mut attackers, &mut blocked_attackers);
        defense_line(board, target, dir, defender, &mut defenders, &mut blocked_defenders);
    }

    let attack = attackers.iter().map(|c| c.amount).sum();
    let defense = defenders.iter().map(|c| c.amount).sum();
    CombatPreview {
        report: CombatReport {
            attack_power: attack,
            defense_power: defense,
            outcome: resolve(attack, defense),
        },
        attackers,
        defenders,
        blocked_attackers,
        blocked_defenders,
    }
}

/// Validates that `target` holds an enemy unit and that at least one of
/// `attacker`'s units can actually strike it.
pub fn check_target(board: &Board, target: Square, attacker: Side) -> Result<(), AttackError> {
    if !board.dims().contains(target) {
        return Err(AttackError::InvalidTarget(target.to_string()));
    }
    match board.unit_at(target) {
        Some(u) if u.side != attacker => {}
        _ => return Err(AttackError::InvalidTarget(target.to_string())),
    }

    let mut any_line = false;
    for dir in Direction::ALL {
        let units = line_units(board, target, dir, attacker);
        let charge = charge_length(board, target, &units);
        if charge > 0 {
            return Ok(());
        }
        for lu in &units {
            if lu.beyond_block {
                continue;
            }
            any_line = true;
            if board.effective_range(lu.square) >= lu.distance {
                return Ok(());
            }
        }
    }

    if any_line {
        Err(AttackError::TargetOutOfRange(target.to_string()))
    } else {
        Err(AttackError::NoLineToTarget(target.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(row: usize, col: usize) -> Square {
        Square::new(row, col)
    }

    fn board5() -> Board {
        Board::new(5, 5)
    }

    #[test]
    fn resolve_boundaries() {
        assert_eq!(resolve(5, 6), CombatOutcome::Neutral);
        assert_eq!(resolve(6, 6), CombatOutcome::Neutral);
        assert_eq!(resolve(7, 6), CombatOutcome::Retreat);
        assert_eq!(resolve(8, 6), CombatOutcome::Capture);
        assert_eq!(resolve(28, 6), CombatOutcome::Capture);
    }

    #[test]
    fn four_cavalry_charge_captures() {
        // A full charge column against lone infantry.
        let mut board = board5();
        board.place_new(sq(0, 4), UnitKind::Infantry, Side::South).unwrap();
        for col in 0..4 {
            board.place_new(sq(0, col), UnitKind::Cavalry, Side::North).unwrap();
        }

        let report = evaluate(&board, sq(0, 4), Side::North);
        assert_eq!(report.attack_power, 28);
        assert_eq!(report.defense_power, 6);
        assert_eq!(report.outcome, CombatOutcome::Capture);
    }

    #[test]
    fn single_adjacent_cavalry_forces_retreat() {
        // A = 7 against infantry D = 6.
        let mut board = board5();
        board.place_new(sq(0, 3), UnitKind::Infantry, Side::South).unwrap();
        board.place_new(sq(0, 2), UnitKind::Cavalry, Side::North).unwrap();

        let report = evaluate(&board, sq(0, 3), Side::North);
        assert_eq!(report.attack_power, 7);
        assert_eq!(report.defense_power, 6);
        assert_eq!(report.outcome, CombatOutcome::Retreat);
    }

    #[test]
    fn two_infantry_capture_one() {
        let mut board = board5();
        board.place_new(sq(0, 1), UnitKind::Infantry, Side::North).unwrap();
        board.place_new(sq(0, 2), UnitKind::Infantry, Side::North).unwrap();
        board.place_new(sq(0, 3), UnitKind::Infantry, Side::South).unwrap();

        let report = evaluate(&board, sq(0, 3), Side::North);
        assert_eq!(report.attack_power, 8);
        assert_eq!(report.outcome, CombatOutcome::Capture);
    }

    #[test]
    fn non_adjacent_cavalry_does_not_charge() {
        let mut board = board5();
        board.place_new(sq(0, 4), UnitKind::Infantry, Side::South).unwrap();
        board.place_new(sq(0, 2), UnitKind::Cavalry, Side::North).unwrap();

        // Distance 2, within range 2, but no charge bonus.
        assert_eq!(attack_power(&board, sq(0, 4), Side::North), 4);
    }

    #[test]
    fn gap_breaks_charge_chain() {
        let mut board = board5();
        board.place_new(sq(0, 4), UnitKind::Infantry, Side::South).unwrap();
        board.place_new(sq(0, 3), UnitKind::Cavalry, Side::North).unwrap();
        // Gap at (0,2).
        board.place_new(sq(0, 1), UnitKind::Cavalry, Side::North).unwrap();

        // Adjacent cavalry charges (7); the one behind the gap is at
        // distance 3, beyond cavalry range, so it contributes nothing.
        assert_eq!(attack_power(&board, sq(0, 4), Side::North), 7);
    }

    #[test]
    fn non_cavalry_breaks_charge_chain() {
        let mut board = board5();
        board.place_new(sq(0, 4), UnitKind::Infantry, Side::South).unwrap();
        board.place_new(sq(0, 3), UnitKind::Cavalry, Side::North).unwrap();
        board.place_new(sq(0, 2), UnitKind::Infantry, Side::North).unwrap();
        board.place_new(sq(0, 1), UnitKind::Cavalry, Side::North).unwrap();

        // 7 (charging cavalry) + 4 (infantry, distance 2) + nothing from
        // the cavalry at distance 3 (out of range, chain broken).
        assert_eq!(attack_power(&board, sq(0, 4), Side::North), 11);
    }

    #[test]
    fn cavalry_in_fortress_breaks_chain() {
        let mut board = board5();
        board.place_new(sq(0, 4), UnitKind::Infantry, Side::South).unwrap();
        board.set_terrain(sq(0, 3), Terrain::Fortress).unwrap();
        board.place_new(sq(0, 3), UnitKind::Cavalry, Side::North).unwrap();
        board.place_new(sq(0, 2), UnitKind::Cavalry, Side::North).unwrap();

        // Fortress cavalry cannot charge: contributes base 4 (distance 1),
        // the second cavalry contributes base 4 (distance 2, in range).
        assert_eq!(attack_power(&board, sq(0, 4), Side::North), 8);
    }

    #[test]
    fn no_charge_against_target_on_pass_or_fortress() {
        for terrain in [Terrain::Pass, Terrain::Fortress] {
            let mut board = board5();
            board.set_terrain(sq(0, 4), terrain).unwrap();
            board.place_new(sq(0, 4), UnitKind::Infantry, Side::South).unwrap();
            board.place_new(sq(0, 3), UnitKind::Cavalry, Side::North).unwrap();

            assert_eq!(
                attack_power(&board, sq(0, 4), Side::North),
                4,
                "no charge bonus onto {:?}",
                terrain
            );
        }
    }

    #[test]
    fn terrain_bonus_applies_to_target_only() {
        let mut board = board5();
        board.set_terrain(sq(0, 3), Terrain::Pass).unwrap();
        board.place_new(sq(0, 3), UnitKind::Infantry, Side::South).unwrap();
        // Supporter also on a pass: no bonus for it.
        board.set_terrain(sq(0, 2), Terrain::Pass).unwrap();
        board.place_new(sq(0, 2), UnitKind::Infantry, Side::South).unwrap();

        // 6 + 2 (target on pass) + 6 (supporter, no bonus).
        assert_eq!(defense_power(&board, sq(0, 3), Side::South), 14);
    }

    #[test]
    fn fortress_target_gets_plus_four() {
        let mut board = board5();
        board.set_terrain(sq(2, 2), Terrain::Fortress).unwrap();
        board.place_new(sq(2, 2), UnitKind::Cavalry, Side::South).unwrap();
        assert_eq!(defense_power(&board, sq(2, 2), Side::South), 9);
    }

    #[test]
    fn enemy_unit_blocks_line_of_sight() {
        let mut board = board5();
        board.place_new(sq(0, 4), UnitKind::Infantry, Side::South).unwrap();
        board.place_new(sq(0, 2), UnitKind::Infantry, Side::South).unwrap();
        board.place_new(sq(0, 1), UnitKind::Cannon, Side::North).unwrap();

        // The cannon (range 3, distance 3) is behind the south infantry at
        // (0,2): its line to the target is cut.
        assert_eq!(attack_power(&board, sq(0, 4), Side::North), 0);
    }

    #[test]
    fn friendly_units_do_not_block_line_of_sight() {
        let mut board = board5();
        board.place_new(sq(0, 4), UnitKind::Infantry, Side::South).unwrap();
        board.place_new(sq(0, 2), UnitKind::Infantry, Side::North).unwrap();
        board.place_new(sq(0, 1), UnitKind::Cannon, Side::North).unwrap();

        // Infantry at distance 2 (4) + cannon firing through it at
        // distance 3 (5).
        assert_eq!(attack_power(&board, sq(0, 4), Side::North), 9);
    }

    #[test]
    fn mountain_blocks_line_of_sight() {
        let mut board = board5();
        board.place_new(sq(0, 4), UnitKind::Infantry, Side::South).unwrap();
        board.set_terrain(sq(0, 3), Terrain::Mountain).unwrap();
        board.place_new(sq(0, 2), UnitKind::Cannon, Side::North).unwrap();

        assert_eq!(attack_power(&board, sq(0, 4), Side::North), 0);
    }

    #[test]
    fn out_of_range_units_do_not_contribute() {
        let mut board = board5();
        board.place_new(sq(0, 4), UnitKind::Infantry, Side::South).unwrap();
        // Infantry range 2, distance 3.
        board.place_new(sq(0, 1), UnitKind::Infantry, Side::North).unwrap();
        assert_eq!(attack_power(&board, sq(0, 4), Side::North), 0);

        // A cannon at the same distance reaches.
        board.remove(sq(0, 1)).unwrap();
        board.place_new(sq(0, 1), UnitKind::Cannon, Side::North).unwrap();
        assert_eq!(attack_power(&board, sq(0, 4), Side::North), 5);
    }

    #[test]
    fn offline_attackers_contribute_zero() {
        let mut board = board5();
        board.place_new(sq(0, 4), UnitKind::Infantry, Side::South).unwrap();
        board.place_new(sq(0, 3), UnitKind::Infantry, Side::North).unwrap();
        board.set_networks_enabled(true);

        // No North arsenal: the infantry is offline.
        assert_eq!(attack_power(&board, sq(0, 4), Side::North), 0);
    }

    #[test]
    fn offline_relay_supports_with_one() {
        let mut board = board5();
        board.set_arsenal(sq(4, 0), Side::South).unwrap();
        board.place_new(sq(0, 3), UnitKind::Infantry, Side::South).unwrap();
        board.place_new(sq(0, 2), UnitKind::Relay, Side::South).unwrap();
        board.set_networks_enabled(true);

        // Relays have range 0: even online they never support a neighbor.
        let defense = defense_power(&board, sq(0, 3), Side::South);
        let target_online = board.is_online(sq(0, 3), Side::South);
        assert_eq!(defense, if target_online { 6 } else { 0 });
    }

    #[test]
    fn relays_never_support_due_to_zero_range() {
        let mut board = board5();
        board.place_new(sq(0, 3), UnitKind::Infantry, Side::South).unwrap();
        board.place_new(sq(0, 2), UnitKind::Relay, Side::South).unwrap();
        assert_eq!(defense_power(&board, sq(0, 3), Side::South), 6);
    }

    #[test]
    fn check_target_errors() {
        let mut board = board5();
        board.place_new(sq(0, 0), UnitKind::Infantry, Side::North).unwrap();
        board.place_new(sq(4, 4), UnitKind::Infantry, Side::South).unwrap();

        // Empty cell.
        assert!(matches!(
            check_target(&board, sq(2, 2), Side::North),
            Err(AttackError::InvalidTarget(_))
        ));
        // Own unit.
        assert!(matches!(
            check_target(&board, sq(0, 0), Side::North),
            Err(AttackError::InvalidTarget(_))
        ));
        // Enemy on the diagonal at distance 4: in line, out of range.
        assert!(matches!(
            check_target(&board, sq(4, 4), Side::North),
            Err(AttackError::TargetOutOfRange(_))
        ));
    }

    #[test]
    fn check_target_no_line() {
        let mut board = board5();
        board.place_new(sq(0, 0), UnitKind::Infantry, Side::North).unwrap();
        board.place_new(sq(1, 2), UnitKind::Infantry, Side::South).unwrap();

        // Knight offset: no straight line to the target.
        assert!(matches!(
            check_target(&board, sq(1, 2), Side::North),
            Err(AttackError::NoLineToTarget(_))
        ));
    }

    #[test]
    fn check_target_accepts_reachable_enemy() {
        let mut board = board5();
        board.place_new(sq(0, 0), UnitKind::Infantry, Side::North).unwrap();
        board.place_new(sq(0, 2), UnitKind::Infantry, Side::South).unwrap();
        assert!(check_target(&board, sq(0, 2), Side::North).is_ok());
    }

    #[test]
    fn preview_reports_contributions_and_blocks() {
        let mut board = board5();
        board.place_new(sq(0, 4), UnitKind::Infantry, Side::South).unwrap();
        board.place_new(sq(0, 3), UnitKind::Cavalry, Side::North).unwrap();
        board.place_new(sq(0, 0), UnitKind::Infantry, Side::North).unwrap();
        board.place_new(sq(2, 4), UnitKind::Infantry, Side::South).unwrap();

        let pv = preview(&board, sq(0, 4), Side::North);
        assert_eq!(pv.report.attack_power, 7);
        assert_eq!(pv.report.defense_power, 6 + 6);
        assert_eq!(pv.attackers.len(), 1);
        assert!(pv.attackers[0].charging);
        // North infantry at distance 4: listed as out of range.
        assert_eq!(pv.blocked_attackers, vec![(sq(0, 0), BlockReason::OutOfRange)]);
        // Target + south supporter at distance 2.
        assert_eq!(pv.defenders.len(), 2);
    }
}
