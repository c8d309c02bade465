//! Board representation: geometry, units, terrain, and position state.

pub mod geometry;
pub mod state;
pub mod terrain;
pub mod unit;

pub use geometry::{
    direction_between, format_square, parse_square, parse_square_in, CoordError, Dims, Direction,
    Ray, Square,
};
pub use state::{Board, BoardError, DEFAULT_COLS, DEFAULT_ROWS};
pub use terrain::Terrain;
pub use unit::{Side, Unit, UnitKind};
