//! Legal-move enumeration and validation.
//!
//! Moves are single-step jumps bounded by the unit's effective Chebyshev
//! radius; intervening cells are ignored except for the mounted early-stop
//! rule. Movement never captures: the only special destination is an empty
//! enemy arsenal cell, whose entry (resolved by the turn machine) destroys
//! the arsenal.

use thiserror::Error;

use crate::board::{direction_between, Board, Side, Square, Terrain};

/// Why a movement destination is illegal.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MoveError {
    #[error("no unit at {0}")]
    NoUnitAt(String),

    #[error("destination {0} is out of range")]
    OutOfRange(String),

    #[error("destination {0} is impassable terrain")]
    IllegalTerrain(String),

    #[error("destination {0} is occupied by a friendly unit")]
    OccupiedByFriendly(String),

    #[error("movement to {0} is blocked")]
    MovementBlocked(String),
}

/// Validates a single move from `from` to `to` against the movement rules.
///
/// Does not consult turn state; the turn machine layers budgets, ownership,
/// and retreat enforcement on top.
pub fn validate_move(board: &Board, from: Square, to: Square) -> Result<(), MoveError> {
    let unit = board
        .unit_at(from)
        .ok_or_else(|| MoveError::NoUnitAt(from.to_string()))?;

    if !board.dims().contains(to) {
        return Err(MoveError::OutOfRange(to.to_string()));
    }

    let distance = from.chebyshev(to);
    let movement = board.effective_movement(from);
    if distance == 0 || distance > movement {
        return Err(MoveError::OutOfRange(to.to_string()));
    }

    if !board.terrain_at(to).is_passable() {
        return Err(MoveError::IllegalTerrain(to.to_string()));
    }

    match board.unit_at(to) {
        Some(u) if u.side == unit.side => {
            return Err(MoveError::OccupiedByFriendly(to.to_string()))
        }
        Some(_) => return Err(MoveError::MovementBlocked(to.to_string())),
        None => {}
    }

    if unit.kind.is_mounted() {
        mounted_path_check(board, from, to, unit.side)?;
    }

    Ok(())
}

/// The straight-line constraint for mounted units (Cavalry, SwiftCannon,
/// SwiftRelay): the destination must lie on one of the 8 rays, and a unit
/// leaving an online cell stops on the first offline cell of its path.
fn mounted_path_check(board: &Board, from: Square, to: Square, side: Side) -> Result<(), MoveError> {
    let dir =
        direction_between(from, to).ok_or_else(|| MoveError::MovementBlocked(to.to_string()))?;

    if !board.networks_enabled() || !board.is_online(from, side) {
        return Ok(());
    }

    for cell in board.dims().ray(from, dir) {
        if !board.is_online(cell, side) {
            // First offline cell on the path: the unit may stop here but
            // not pass through.
            return if cell == to {
                Ok(())
            } else {
                Err(MoveError::MovementBlocked(to.to_string()))
            };
        }
        if cell == to {
            return Ok(());
        }
    }
    unreachable!("destination {} not on ray from {}", to, from)
}

/// All legal destinations for the unit at `from`. Empty when the cell holds
/// no unit or the unit cannot move.
pub fn legal_moves(board: &Board, from: Square) -> Vec<Square> {
    let movement = board.effective_movement(from);
    if movement == 0 {
        return Vec::new();
    }

    let dims = board.dims();
    let row_lo = from.row.saturating_sub(movement);
    let row_hi = (from.row + movement).min(dims.rows - 1);
    let col_lo = from.col.saturating_sub(movement);
    let col_hi = (from.col + movement).min(dims.cols - 1);

    let mut moves = Vec::new();
    for row in row_lo..=row_hi {
        for col in col_lo..=col_hi {
            let to = Square::new(row, col);
            if validate_move(board, from, to).is_ok() {
                moves.push(to);
            }
        }
    }
    moves
}

/// Valid retreat destinations: adjacent, empty, non-Mountain cells that are
/// not an enemy arsenal (a retreat cannot double as an arsenal raid).
pub fn retreat_destinations(board: &Board, from: Square) -> Vec<Square> {
    let Some(unit) = board.unit_at(from) else {
        return Vec::new();
    };
    board
        .dims()
        .neighbors8(from)
        .filter(|&sq| {
            let terrain = board.terrain_at(sq);
            terrain.is_passable()
                && terrain.arsenal_owner() != Some(unit.side.opponent())
                && board.unit_at(sq).is_none()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Side, UnitKind};

    fn sq(row: usize, col: usize) -> Square {
        Square::new(row, col)
    }

    #[test]
    fn infantry_has_eight_moves_in_the_open() {
        let mut board = Board::new(5, 5);
        board.place_new(sq(2, 2), UnitKind::Infantry, Side::North).unwrap();
        assert_eq!(legal_moves(&board, sq(2, 2)).len(), 8);
    }

    #[test]
    fn infantry_in_corner_has_three_moves() {
        let mut board = Board::new(5, 5);
        board.place_new(sq(0, 0), UnitKind::Infantry, Side::North).unwrap();
        assert_eq!(legal_moves(&board, sq(0, 0)).len(), 3);
    }

    #[test]
    fn cavalry_reaches_radius_two_on_lines_only() {
        let mut board = Board::new(5, 5);
        board.place_new(sq(2, 2), UnitKind::Cavalry, Side::North).unwrap();
        let moves = legal_moves(&board, sq(2, 2));
        // 8 adjacent + 8 straight-line cells at distance 2.
        assert_eq!(moves.len(), 16);
        assert!(moves.contains(&sq(0, 0)));
        assert!(moves.contains(&sq(2, 4)));
        // Knight-like offsets are not straight lines.
        assert!(!moves.contains(&sq(0, 1)));
        assert!(!moves.contains(&sq(3, 0)));
    }

    #[test]
    fn knight_offset_rejected_for_mounted() {
        let mut board = Board::new(5, 5);
        board.place_new(sq(2, 2), UnitKind::SwiftCannon, Side::North).unwrap();
        assert!(matches!(
            validate_move(&board, sq(2, 2), sq(3, 4)),
            Err(MoveError::MovementBlocked(_))
        ));
    }

    #[test]
    fn cannot_move_onto_any_unit() {
        let mut board = Board::new(5, 5);
        board.place_new(sq(2, 2), UnitKind::Infantry, Side::North).unwrap();
        board.place_new(sq(2, 3), UnitKind::Relay, Side::North).unwrap();
        board.place_new(sq(2, 1), UnitKind::Infantry, Side::South).unwrap();

        assert!(matches!(
            validate_move(&board, sq(2, 2), sq(2, 3)),
            Err(MoveError::OccupiedByFriendly(_))
        ));
        assert!(matches!(
            validate_move(&board, sq(2, 2), sq(2, 1)),
            Err(MoveError::MovementBlocked(_))
        ));
    }

    #[test]
    fn cannot_enter_mountain() {
        let mut board = Board::new(5, 5);
        board.place_new(sq(2, 2), UnitKind::Infantry, Side::North).unwrap();
        board.set_terrain(sq(2, 3), Terrain::Mountain).unwrap();
        assert!(matches!(
            validate_move(&board, sq(2, 2), sq(2, 3)),
            Err(MoveError::IllegalTerrain(_))
        ));
    }

    #[test]
    fn moving_too_far_is_out_of_range() {
        let mut board = Board::new(5, 5);
        board.place_new(sq(2, 2), UnitKind::Infantry, Side::North).unwrap();
        assert!(matches!(
            validate_move(&board, sq(2, 2), sq(2, 4)),
            Err(MoveError::OutOfRange(_))
        ));
        assert!(matches!(
            validate_move(&board, sq(2, 2), sq(2, 2)),
            Err(MoveError::OutOfRange(_))
        ));
    }

    #[test]
    fn empty_enemy_arsenal_is_a_legal_destination() {
        let mut board = Board::new(5, 5);
        board.place_new(sq(2, 2), UnitKind::Infantry, Side::North).unwrap();
        board.set_arsenal(sq(2, 3), Side::South).unwrap();
        assert!(validate_move(&board, sq(2, 2), sq(2, 3)).is_ok());
    }

    #[test]
    fn offline_unit_cannot_move() {
        let mut board = Board::new(5, 5);
        board.place_new(sq(2, 2), UnitKind::Infantry, Side::North).unwrap();
        board.set_networks_enabled(true);
        assert!(legal_moves(&board, sq(2, 2)).is_empty());
        assert!(matches!(
            validate_move(&board, sq(2, 2), sq(2, 3)),
            Err(MoveError::OutOfRange(_))
        ));
    }

    #[test]
    fn offline_relay_moves_at_base_speed() {
        let mut board = Board::new(5, 5);
        board.place_new(sq(2, 2), UnitKind::SwiftRelay, Side::North).unwrap();
        board.set_networks_enabled(true);
        let moves = legal_moves(&board, sq(2, 2));
        // Offline origin: the early-stop rule does not bind, but the
        // straight-line restriction for mounted kinds still does.
        assert_eq!(moves.len(), 16);
    }

    #[test]
    fn mounted_may_stop_on_first_offline_cell() {
        // Cavalry on the east arsenal ray. (1,1) is online only through the
        // cavalry's own adjacency halo; (2,1) is beyond every ray and halo.
        let mut board = Board::new(5, 6);
        board.set_arsenal(sq(0, 0), Side::North).unwrap();
        board.place_new(sq(0, 1), UnitKind::Cavalry, Side::North).unwrap();
        board.set_networks_enabled(true);

        assert!(board.is_online(sq(0, 1), Side::North));
        assert!(board.is_online(sq(1, 1), Side::North));
        assert!(!board.is_online(sq(2, 1), Side::North));

        // Path (1,1) online, destination (2,1) is the first offline cell.
        assert!(validate_move(&board, sq(0, 1), sq(2, 1)).is_ok());
    }

    #[test]
    fn mounted_cannot_pass_through_offline_cell() {
        // An enemy on the ray makes its own cell offline; the cavalry may
        // not jump over it to the dark cell behind.
        let mut board = Board::new(5, 6);
        board.set_arsenal(sq(0, 0), Side::North).unwrap();
        board.place_new(sq(0, 1), UnitKind::Cavalry, Side::North).unwrap();
        board.place_new(sq(0, 2), UnitKind::Infantry, Side::South).unwrap();
        board.set_networks_enabled(true);

        assert!(!board.is_online(sq(0, 2), Side::North));
        assert!(!board.is_online(sq(0, 3), Side::North));
        assert!(matches!(
            validate_move(&board, sq(0, 1), sq(0, 3)),
            Err(MoveError::MovementBlocked(_))
        ));
    }

    #[test]
    fn mounted_jumps_over_friendly_on_online_path() {
        let mut board = Board::new(5, 6);
        board.set_arsenal(sq(0, 0), Side::North).unwrap();
        board.place_new(sq(0, 1), UnitKind::Cavalry, Side::North).unwrap();
        board.place_new(sq(0, 2), UnitKind::Infantry, Side::North).unwrap();
        board.set_networks_enabled(true);

        assert!(validate_move(&board, sq(0, 1), sq(0, 3)).is_ok());
    }

    #[test]
    fn retreat_destinations_exclude_occupied_mountain_and_enemy_arsenal() {
        let mut board = Board::new(5, 5);
        board.place_new(sq(2, 2), UnitKind::Infantry, Side::South).unwrap();
        board.set_terrain(sq(1, 1), Terrain::Mountain).unwrap();
        board.set_arsenal(sq(1, 2), Side::North).unwrap();
        board.place_new(sq(1, 3), UnitKind::Infantry, Side::South).unwrap();
        board.place_new(sq(3, 3), UnitKind::Infantry, Side::North).unwrap();

        let dests = retreat_destinations(&board, sq(2, 2));
        assert!(!dests.contains(&sq(1, 1)), "mountain");
        assert!(!dests.contains(&sq(1, 2)), "enemy arsenal");
        assert!(!dests.contains(&sq(1, 3)), "friendly unit");
        assert!(!dests.contains(&sq(3, 3)), "enemy unit");
        assert!(dests.contains(&sq(2, 1)));
        assert!(dests.contains(&sq(3, 2)));
        assert_eq!(dests.len(), 4);
    }

    #[test]
    fn surrounded_unit_has_no_retreat() {
        let mut board = Board::new(3, 3);
        board.place_new(sq(0, 0), UnitKind::Infantry, Side::South).unwrap();
        board.set_terrain(sq(0, 1), Terrain::Mountain).unwrap();
        board.set_terrain(sq(1, 0), Terrain::Mountain).unwrap();
        board.set_terrain(sq(1, 1), Terrain::Mountain).unwrap();
        assert!(retreat_destinations(&board, sq(0, 0)).is_empty());
    }
}
