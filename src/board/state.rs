//! Board state: terrain grid, unit occupancy, and the derived online maps.
//!
//! The board owns all position state. Every mutation recomputes the online
//! maps before returning, so readers never observe a stale network.

use thiserror::Error;

use super::geometry::{Dims, Square};
use super::terrain::Terrain;
use super::unit::{Side, Unit, UnitKind};
use crate::network;

/// Default board height.
pub const DEFAULT_ROWS: usize = 20;
/// Default board width.
pub const DEFAULT_COLS: usize = 25;

/// Errors from board occupancy operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BoardError {
    #[error("cell {0} is out of bounds")]
    CellOutOfBounds(String),

    #[error("cell {0} is occupied")]
    CellOccupied(String),

    #[error("cell {0} is impassable")]
    CellImpassable(String),

    #[error("no unit at {0}")]
    NoUnitAt(String),
}

/// The complete position: terrain, units, network configuration, and the
/// derived per-side online maps.
///
/// A `Board` is a plain value; callers that want speculative search clone it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    dims: Dims,
    terrain: Vec<Terrain>,
    units: Vec<Option<Unit>>,
    online: [Vec<bool>; 2],
    networks_enabled: bool,
    relay_adjacency_rebroadcast: bool,
}

impl Board {
    /// Creates an empty board of the given size, all terrain `Flat`,
    /// networks disabled.
    pub fn new(rows: usize, cols: usize) -> Board {
        assert!(rows > 0 && cols > 0, "board must have at least one cell");
        let n = rows * cols;
        Board {
            dims: Dims::new(rows, cols),
            terrain: vec![Terrain::Flat; n],
            units: vec![None; n],
            online: [vec![false; n], vec![false; n]],
            networks_enabled: false,
            relay_adjacency_rebroadcast: true,
        }
    }

    /// The standard 20x25 board.
    pub fn standard() -> Board {
        Board::new(DEFAULT_ROWS, DEFAULT_COLS)
    }

    pub fn dims(&self) -> Dims {
        self.dims
    }

    pub fn rows(&self) -> usize {
        self.dims.rows
    }

    pub fn cols(&self) -> usize {
        self.dims.cols
    }

    fn idx(&self, sq: Square) -> usize {
        assert!(self.dims.contains(sq), "square {} out of bounds", sq);
        self.dims.index(sq)
    }

    fn check_bounds(&self, sq: Square) -> Result<usize, BoardError> {
        if !self.dims.contains(sq) {
            return Err(BoardError::CellOutOfBounds(format!(
                "({}, {})",
                sq.row, sq.col
            )));
        }
        Ok(self.dims.index(sq))
    }

    // Occupancy

    pub fn unit_at(&self, sq: Square) -> Option<Unit> {
        self.units[self.idx(sq)]
    }

    pub fn terrain_at(&self, sq: Square) -> Terrain {
        self.terrain[self.idx(sq)]
    }

    pub fn is_friendly(&self, sq: Square, side: Side) -> bool {
        matches!(self.unit_at(sq), Some(u) if u.side == side)
    }

    pub fn is_enemy(&self, sq: Square, side: Side) -> bool {
        matches!(self.unit_at(sq), Some(u) if u.side != side)
    }

    /// Places a unit on an empty, passable cell.
    pub fn place(&mut self, sq: Square, unit: Unit) -> Result<(), BoardError> {
        let i = self.check_bounds(sq)?;
        if !self.terrain[i].is_passable() {
            return Err(BoardError::CellImpassable(sq.to_string()));
        }
        if self.units[i].is_some() {
            return Err(BoardError::CellOccupied(sq.to_string()));
        }
        self.units[i] = Some(unit);
        self.refresh_networks();
        Ok(())
    }

    /// Removes and returns the unit at `sq`.
    pub fn remove(&mut self, sq: Square) -> Result<Unit, BoardError> {
        let i = self.check_bounds(sq)?;
        let unit = self.units[i].take().ok_or_else(|| BoardError::NoUnitAt(sq.to_string()))?;
        self.refresh_networks();
        Ok(unit)
    }

    /// Atomically relocates a unit. Panics on invariant violation; callers
    /// validate first.
    pub fn move_unit(&mut self, from: Square, to: Square) {
        let fi = self.idx(from);
        let ti = self.idx(to);
        let unit = self.units[fi].take().unwrap_or_else(|| panic!("no unit at {}", from));
        assert!(self.terrain[ti].is_passable(), "cell {} is impassable", to);
        assert!(self.units[ti].is_none(), "cell {} is occupied", to);
        self.units[ti] = Some(unit);
        self.refresh_networks();
    }

    /// Sets the terrain of a cell. Refuses to raise a mountain under a unit.
    pub fn set_terrain(&mut self, sq: Square, terrain: Terrain) -> Result<(), BoardError> {
        let i = self.check_bounds(sq)?;
        if !terrain.is_passable() && self.units[i].is_some() {
            return Err(BoardError::CellOccupied(sq.to_string()));
        }
        self.terrain[i] = terrain;
        self.refresh_networks();
        Ok(())
    }

    /// Places an arsenal owned by `side`.
    pub fn set_arsenal(&mut self, sq: Square, side: Side) -> Result<(), BoardError> {
        self.set_terrain(sq, Terrain::Arsenal(side))
    }

    /// Flips an arsenal cell to `Flat`. Panics if the cell holds no arsenal;
    /// callers check the terrain first.
    pub fn destroy_arsenal(&mut self, sq: Square) {
        let i = self.idx(sq);
        assert!(
            matches!(self.terrain[i], Terrain::Arsenal(_)),
            "no arsenal at {}",
            sq
        );
        self.terrain[i] = Terrain::Flat;
        self.refresh_networks();
    }

    // Queries

    /// All units of one side, in row-major order.
    pub fn units_of(&self, side: Side) -> impl Iterator<Item = (Square, Unit)> + '_ {
        self.all_units().filter(move |(_, u)| u.side == side)
    }

    /// All units on the board, in row-major order.
    pub fn all_units(&self) -> impl Iterator<Item = (Square, Unit)> + '_ {
        self.dims
            .squares()
            .filter_map(move |sq| self.units[self.dims.index(sq)].map(|u| (sq, u)))
    }

    pub fn count_units(&self, side: Side) -> usize {
        self.units_of(side).count()
    }

    /// All arsenal cells owned by `side`, in row-major order.
    pub fn arsenals_of(&self, side: Side) -> impl Iterator<Item = Square> + '_ {
        self.dims
            .squares()
            .filter(move |&sq| self.terrain[self.dims.index(sq)] == Terrain::Arsenal(side))
    }

    pub fn arsenal_count(&self, side: Side) -> usize {
        self.arsenals_of(side).count()
    }

    // Network configuration and queries

    pub fn networks_enabled(&self) -> bool {
        self.networks_enabled
    }

    /// Turns the LOC rules on or off. Off means every cell counts as online.
    pub fn set_networks_enabled(&mut self, enabled: bool) {
        self.networks_enabled = enabled;
        self.refresh_networks();
    }

    pub fn relay_adjacency_rebroadcast(&self) -> bool {
        self.relay_adjacency_rebroadcast
    }

    /// Whether relays lit only by adjacency rebroadcast their own rays.
    pub fn set_relay_adjacency_rebroadcast(&mut self, enabled: bool) {
        self.relay_adjacency_rebroadcast = enabled;
        self.refresh_networks();
    }

    /// Whether a cell is covered by `side`'s network. Always true while
    /// networks are disabled.
    pub fn is_online(&self, sq: Square, side: Side) -> bool {
        if !self.networks_enabled {
            return true;
        }
        self.online[side.index()][self.idx(sq)]
    }

    /// Online units of one side.
    pub fn online_units(&self, side: Side) -> impl Iterator<Item = (Square, Unit)> + '_ {
        self.units_of(side).filter(move |(sq, _)| self.is_online(*sq, side))
    }

    /// Offline units of one side. Empty while networks are disabled.
    pub fn offline_units(&self, side: Side) -> impl Iterator<Item = (Square, Unit)> + '_ {
        self.units_of(side).filter(move |(sq, _)| !self.is_online(*sq, side))
    }

    fn refresh_networks(&mut self) {
        if self.networks_enabled {
            self.online = [
                network::solve(self, Side::North),
                network::solve(self, Side::South),
            ];
        }
    }

    // Effective stats, derived from online status

    /// Effective attack of the unit at `sq`; 0 for empty cells and offline
    /// non-relay units.
    pub fn effective_attack(&self, sq: Square) -> i32 {
        match self.unit_at(sq) {
            Some(u) if u.kind.is_relay() => u.kind.attack(),
            Some(u) if self.is_online(sq, u.side) => u.kind.attack(),
            _ => 0,
        }
    }

    /// Effective defense of the unit at `sq`. Relays keep their base defense
    /// even offline.
    pub fn effective_defense(&self, sq: Square) -> i32 {
        match self.unit_at(sq) {
            Some(u) if u.kind.is_relay() => u.kind.defense(),
            Some(u) if self.is_online(sq, u.side) => u.kind.defense(),
            _ => 0,
        }
    }

    /// Effective movement of the unit at `sq`. Relays may move offline.
    pub fn effective_movement(&self, sq: Square) -> usize {
        match self.unit_at(sq) {
            Some(u) if u.kind.is_relay() => u.kind.movement(),
            Some(u) if self.is_online(sq, u.side) => u.kind.movement(),
            _ => 0,
        }
    }

    /// Effective range of the unit at `sq`; 0 offline.
    pub fn effective_range(&self, sq: Square) -> usize {
        match self.unit_at(sq) {
            Some(u) if self.is_online(sq, u.side) => u.kind.range(),
            _ => 0,
        }
    }

    /// Convenience constructor used by the codec and tests.
    pub fn place_new(&mut self, sq: Square, kind: UnitKind, side: Side) -> Result<(), BoardError> {
        self.place(sq, Unit::new(kind, side))
    }
}

impl Default for Board {
    fn default() -> Board {
        Board::standard()
    }
}
