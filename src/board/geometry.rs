//! Grid geometry: squares, directions, rays, and the spreadsheet codec.
//!
//! The canonical internal coordinate is `(row, col)` with row 0 at the top
//! and col 0 at the left. The spreadsheet codec is column-letters followed
//! by a 1-indexed row number, so `A1` is the top-left corner.

use thiserror::Error;

/// Errors from coordinate parsing and bounds checks.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoordError {
    #[error("coordinate '{0}' is outside the board")]
    OutOfBounds(String),

    #[error("invalid coordinate: '{0}'")]
    InvalidCoord(String),
}

/// A cell on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Square {
    pub row: usize,
    pub col: usize,
}

impl Square {
    pub const fn new(row: usize, col: usize) -> Square {
        Square { row, col }
    }

    /// Chebyshev distance: the number of king moves between two squares.
    pub fn chebyshev(self, other: Square) -> usize {
        let dr = self.row.abs_diff(other.row);
        let dc = self.col.abs_diff(other.col);
        dr.max(dc)
    }

    /// True when the squares share a side or a corner.
    pub fn is_adjacent(self, other: Square) -> bool {
        self.chebyshev(other) == 1
    }
}

impl std::fmt::Display for Square {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&format_square(*self))
    }
}

/// One of the 8 ray directions.
///
/// All 8 participate symmetrically in LOC propagation, combat lines, and
/// cavalry charges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    North,
    NorthEast,
    East,
    SouthEast,
    South,
    SouthWest,
    West,
    NorthWest,
}

impl Direction {
    /// All directions, clockwise from North.
    pub const ALL: [Direction; 8] = [
        Direction::North,
        Direction::NorthEast,
        Direction::East,
        Direction::SouthEast,
        Direction::South,
        Direction::SouthWest,
        Direction::West,
        Direction::NorthWest,
    ];

    /// The `(row, col)` step for this direction. North is toward row 0.
    pub const fn delta(self) -> (isize, isize) {
        match self {
            Direction::North => (-1, 0),
            Direction::NorthEast => (-1, 1),
            Direction::East => (0, 1),
            Direction::SouthEast => (1, 1),
            Direction::South => (1, 0),
            Direction::SouthWest => (1, -1),
            Direction::West => (0, -1),
            Direction::NorthWest => (-1, -1),
        }
    }
}

/// Board dimensions, carried separately so geometry helpers can bounds-check
/// without borrowing the full board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dims {
    pub rows: usize,
    pub cols: usize,
}

impl Dims {
    pub const fn new(rows: usize, cols: usize) -> Dims {
        Dims { rows, cols }
    }

    pub fn contains(self, sq: Square) -> bool {
        sq.row < self.rows && sq.col < self.cols
    }

    /// Row-major flat index for grid storage.
    pub fn index(self, sq: Square) -> usize {
        sq.row * self.cols + sq.col
    }

    /// Steps one square in `dir`, or `None` at the board edge.
    pub fn step(self, from: Square, dir: Direction) -> Option<Square> {
        let (dr, dc) = dir.delta();
        let row = from.row.checked_add_signed(dr)?;
        let col = from.col.checked_add_signed(dc)?;
        let sq = Square::new(row, col);
        self.contains(sq).then_some(sq)
    }

    /// The up-to-8 in-bounds neighbors of `sq`.
    pub fn neighbors8(self, sq: Square) -> impl Iterator<Item = Square> {
        Direction::ALL.into_iter().filter_map(move |d| self.step(sq, d))
    }

    /// Lazy sequence of squares from `from` (exclusive) toward the board
    /// edge in `dir`.
    pub fn ray(self, from: Square, dir: Direction) -> Ray {
        Ray { dims: self, current: from, dir }
    }

    /// All squares in row-major order.
    pub fn squares(self) -> impl Iterator<Item = Square> {
        let cols = self.cols;
        (0..self.rows * self.cols).map(move |i| Square::new(i / cols, i % cols))
    }
}

/// Iterator over the squares of a ray, excluding its origin.
#[derive(Debug, Clone)]
pub struct Ray {
    dims: Dims,
    current: Square,
    dir: Direction,
}

impl Iterator for Ray {
    type Item = Square;

    fn next(&mut self) -> Option<Square> {
        self.current = self.dims.step(self.current, self.dir)?;
        Some(self.current)
    }
}

/// The direction from `from` to `to` when they are aligned on one of the 8
/// rays, or `None` for knight-like offsets.
pub fn direction_between(from: Square, to: Square) -> Option<Direction> {
    if from == to {
        return None;
    }
    let dr = to.row as isize - from.row as isize;
    let dc = to.col as isize - from.col as isize;
    if dr != 0 && dc != 0 && dr.abs() != dc.abs() {
        return None;
    }
    let step = (dr.signum(), dc.signum());
    Direction::ALL.into_iter().find(|d| d.delta() == step)
}

/// Formats a square in spreadsheet notation: column letters, then the
/// 1-indexed row number (`A1` = top-left).
pub fn format_square(sq: Square) -> String {
    let mut letters = Vec::new();
    let mut c = sq.col + 1;
    while c > 0 {
        c -= 1;
        letters.push(b'A' + (c % 26) as u8);
        c /= 26;
    }
    letters.reverse();
    let mut out = String::from_utf8(letters).unwrap();
    out.push_str(&(sq.row + 1).to_string());
    out
}

/// Parses spreadsheet notation into a square, without bounds checking.
///
/// Column letters are bijective base-26 (`A`..`Z`, `AA`..); rows are
/// 1-indexed decimal. Letters are accepted case-insensitively.
pub fn parse_square(s: &str) -> Result<Square, CoordError> {
    let invalid = || CoordError::InvalidCoord(s.to_string());
    let split = s.find(|c: char| c.is_ascii_digit()).ok_or_else(invalid)?;
    let (letters, digits) = s.split_at(split);
    if letters.is_empty()
        || digits.is_empty()
        || !letters.chars().all(|c| c.is_ascii_alphabetic())
        || !digits.chars().all(|c| c.is_ascii_digit())
    {
        return Err(invalid());
    }

    let mut col: usize = 0;
    for ch in letters.chars() {
        col = col
            .checked_mul(26)
            .and_then(|v| v.checked_add(ch.to_ascii_uppercase() as usize - 'A' as usize + 1))
            .ok_or_else(invalid)?;
    }

    let row: usize = digits.parse().map_err(|_| invalid())?;
    if row == 0 {
        return Err(invalid());
    }

    Ok(Square::new(row - 1, col - 1))
}

/// Parses spreadsheet notation and checks it against the board bounds.
pub fn parse_square_in(s: &str, dims: Dims) -> Result<Square, CoordError> {
    let sq = parse_square(s)?;
    if !dims.contains(sq) {
        return Err(CoordError::OutOfBounds(s.to_string()));
    }
    Ok(sq)
}
