//! Lines of Communication (LOC) solver.
//!
//! Computes, for one side, which cells are covered by its network: cells on
//! unblocked 8-directional rays from its arsenals, extended by online
//! relays, plus an adjacency halo around online units. Mountains and enemy
//! non-relay units block rays at the blocking cell; enemy relays are
//! transparent. The computation runs to a fixed point: adjacency can light
//! a relay that rays missed, and (by default) such a relay rebroadcasts.

use crate::board::{Board, Direction, Side, Square};

/// Computes the coverage map for `side` on the current position.
///
/// Pure with respect to the board: the result depends only on terrain,
/// units, and the rebroadcast flag, never on previous solves.
pub fn solve(board: &Board, side: Side) -> Vec<bool> {
    let dims = board.dims();
    let mut coverage = vec![false; dims.rows * dims.cols];
    let mut rebroadcast = vec![false; dims.rows * dims.cols];

    // Arsenal rays seed the network.
    for arsenal in board.arsenals_of(side) {
        coverage[dims.index(arsenal)] = true;
        for dir in Direction::ALL {
            cast_ray(board, side, arsenal, dir, &mut coverage);
        }
    }

    // Relays lit by arsenal rays (or by each other) rebroadcast until no
    // relay remains unpropagated.
    relay_pass(board, side, &mut coverage, &mut rebroadcast);

    // Alternate adjacency and relay passes until nothing new comes online.
    loop {
        let grew = adjacency_pass(board, side, &mut coverage);
        if !grew {
            break;
        }
        if board.relay_adjacency_rebroadcast() {
            relay_pass(board, side, &mut coverage, &mut rebroadcast);
        }
    }

    coverage
}

/// Marks every cell of one ray until a blocker. The blocker cell itself
/// receives no signal.
fn cast_ray(board: &Board, side: Side, origin: Square, dir: Direction, coverage: &mut [bool]) {
    let dims = board.dims();
    for sq in dims.ray(origin, dir) {
        if board.terrain_at(sq).blocks_ray() {
            break;
        }
        match board.unit_at(sq) {
            None => coverage[dims.index(sq)] = true,
            Some(u) if u.side == side => coverage[dims.index(sq)] = true,
            // Enemy relays neither extend nor stop the ray.
            Some(u) if u.kind.is_relay() => continue,
            Some(_) => break,
        }
    }
}

/// Casts rays from every covered relay that has not yet rebroadcast,
/// repeating until a full pass adds none. Terminates: the rebroadcast set
/// grows monotonically within a finite grid.
fn relay_pass(board: &Board, side: Side, coverage: &mut [bool], rebroadcast: &mut [bool]) {
    let dims = board.dims();
    let relays: Vec<Square> = board
        .units_of(side)
        .filter(|(_, u)| u.kind.is_relay())
        .map(|(sq, _)| sq)
        .collect();

    loop {
        let mut progressed = false;
        for &sq in &relays {
            let i = dims.index(sq);
            if coverage[i] && !rebroadcast[i] {
                rebroadcast[i] = true;
                for dir in Direction::ALL {
                    cast_ray(board, side, sq, dir, coverage);
                }
                progressed = true;
            }
        }
        if !progressed {
            break;
        }
    }
}

/// One sweep of 8-neighborhood propagation from covered friendly units.
/// Covers adjacent friendly units and (for movement purposes) adjacent
/// empty non-mountain cells. Returns whether any new unit came online.
fn adjacency_pass(board: &Board, side: Side, coverage: &mut [bool]) -> bool {
    let dims = board.dims();
    let covered_units: Vec<Square> = board
        .units_of(side)
        .map(|(sq, _)| sq)
        .filter(|sq| coverage[dims.index(*sq)])
        .collect();

    let mut grew = false;
    for sq in covered_units {
        for neighbor in dims.neighbors8(sq) {
            let i = dims.index(neighbor);
            if coverage[i] || board.terrain_at(neighbor).blocks_ray() {
                continue;
            }
            match board.unit_at(neighbor) {
                None => coverage[i] = true,
                Some(u) if u.side == side => {
                    coverage[i] = true;
                    grew = true;
                }
                Some(_) => {}
            }
        }
    }
    grew
}
