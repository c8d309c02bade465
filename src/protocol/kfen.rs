//! KFEN position-string codec.
//!
//! Format: `<row1>/<row2>/…/<rowH>/<turn>/<phase>/<actions>`. Cells are
//! `_` (flat), `m` (mountain), `p` (pass), `f` (fortress), a unit letter on
//! flat ground (uppercase North, lowercase South, `A`/`a` for arsenal
//! terrain), `(L)` for a unit on a pass, and `[L]` for a unit in a
//! fortress. The tail is the side to move (`N`/`S`), the phase (`M`/`B`),
//! and the actions taken this turn: `[(from,to),…]` during movement, or a
//! target square, `pass`, or `-` during battle. Coordinates use the
//! spreadsheet codec (`A1` = top-left).
//!
//! Decoding the encoder's output reproduces the position exactly. Board
//! dimensions are taken from the string itself, so reduced boards parse
//! too.

use thiserror::Error;

use crate::board::{parse_square_in, Board, Side, Square, Terrain, Unit, UnitKind};
use crate::game::{Game, Phase, MAX_MOVES_PER_TURN};

/// Errors from KFEN parsing and encoding.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum KfenError {
    #[error("expected at least 4 '/'-separated sections, got {0}")]
    TooFewSections(usize),

    #[error("row {row} has {got} cells, expected {expected}")]
    BadRowWidth { row: usize, expected: usize, got: usize },

    #[error("invalid cell symbol '{0}'")]
    BadCell(char),

    #[error("unterminated '{0}' group")]
    UnclosedGroup(char),

    #[error("invalid side-to-move field '{0}'")]
    BadTurn(String),

    #[error("invalid phase field '{0}'")]
    BadPhase(String),

    #[error("invalid actions field '{0}'")]
    BadActions(String),

    #[error("invalid move token '{0}'")]
    BadMoveToken(String),

    #[error("more than {} moves in actions list", MAX_MOVES_PER_TURN)]
    TooManyMoves,

    #[error("unit on arsenal cell {0} cannot be encoded")]
    UnitOnArsenal(String),
}

/// Encodes a game into its canonical KFEN string.
///
/// Fails only for positions outside the format's alphabet: a unit standing
/// on an arsenal cell.
pub fn encode(game: &Game) -> Result<String, KfenError> {
    let board = game.board();
    let dims = board.dims();
    let mut out = String::with_capacity(dims.rows * (dims.cols + 1) + 16);

    for row in 0..dims.rows {
        if row > 0 {
            out.push('/');
        }
        for col in 0..dims.cols {
            let sq = Square::new(row, col);
            encode_cell(board.terrain_at(sq), board.unit_at(sq), sq, &mut out)?;
        }
    }

    out.push('/');
    out.push(game.side_to_move().kfen_char());
    out.push('/');
    out.push(game.phase().kfen_char());
    out.push('/');
    out.push_str(&encode_actions(game));
    Ok(out)
}

fn encode_cell(
    terrain: Terrain,
    unit: Option<Unit>,
    sq: Square,
    out: &mut String,
) -> Result<(), KfenError> {
    match (terrain, unit) {
        (Terrain::Flat, None) => out.push('_'),
        (Terrain::Mountain, None) => out.push('m'),
        (Terrain::Pass, None) => out.push('p'),
        (Terrain::Fortress, None) => out.push('f'),
        (Terrain::Arsenal(Side::North), None) => out.push('A'),
        (Terrain::Arsenal(Side::South), None) => out.push('a'),
        (Terrain::Flat, Some(u)) => out.push(u.kfen_char()),
        (Terrain::Pass, Some(u)) => {
            out.push('(');
            out.push(u.kfen_char());
            out.push(')');
        }
        (Terrain::Fortress, Some(u)) => {
            out.push('[');
            out.push(u.kfen_char());
            out.push(']');
        }
        (Terrain::Arsenal(_), Some(_)) => {
            return Err(KfenError::UnitOnArsenal(sq.to_string()));
        }
        (Terrain::Mountain, Some(_)) => unreachable!("unit on mountain"),
    }
    Ok(())
}

fn encode_actions(game: &Game) -> String {
    match game.phase() {
        Phase::Movement => {
            let pairs: Vec<String> = game
                .moves_made()
                .iter()
                .map(|(from, to)| format!("({},{})", from, to))
                .collect();
            format!("[{}]", pairs.join(","))
        }
        Phase::Battle => {
            if game.attacks_this_turn() == 0 {
                "-".to_string()
            } else {
                match game.attack_target() {
                    Some(target) => target.to_string(),
                    None => "pass".to_string(),
                }
            }
        }
    }
}

/// Parses a KFEN string into a game. Board dimensions come from the row
/// sections; all rows must have the same width.
pub fn decode(s: &str) -> Result<Game, KfenError> {
    let sections: Vec<&str> = s.split('/').collect();
    if sections.len() < 4 {
        return Err(KfenError::TooFewSections(sections.len()));
    }
    let row_count = sections.len() - 3;
    let row_sections = &sections[..row_count];

    let rows: Vec<Vec<Cell>> = row_sections
        .iter()
        .map(|row| parse_row(row))
        .collect::<Result<_, _>>()?;

    let cols = rows[0].len();
    for (i, row) in rows.iter().enumerate() {
        if row.len() != cols {
            return Err(KfenError::BadRowWidth { row: i + 1, expected: cols, got: row.len() });
        }
    }
    if cols == 0 {
        return Err(KfenError::BadRowWidth { row: 1, expected: 1, got: 0 });
    }

    let mut board = Board::new(row_count, cols);
    for (r, row) in rows.iter().enumerate() {
        for (c, cell) in row.iter().enumerate() {
            let sq = Square::new(r, c);
            if cell.terrain != Terrain::Flat {
                board
                    .set_terrain(sq, cell.terrain)
                    .expect("terrain set on empty board");
            }
            if let Some(unit) = cell.unit {
                board.place(sq, unit).expect("cell parsed as unoccupied");
            }
        }
    }

    let side = parse_turn(sections[row_count])?;
    let phase = parse_phase(sections[row_count + 1])?;
    let (moves_made, attacks, attack_target) =
        parse_actions(sections[row_count + 2], phase, &board)?;

    Ok(Game::from_parts(board, side, 1, phase, moves_made, attacks, attack_target))
}

struct Cell {
    terrain: Terrain,
    unit: Option<Unit>,
}

fn unit_from_letter(c: char) -> Option<Unit> {
    let side = if c.is_ascii_uppercase() { Side::North } else { Side::South };
    UnitKind::from_kfen_char(c.to_ascii_uppercase()).map(|kind| Unit::new(kind, side))
}

fn parse_row(row: &str) -> Result<Vec<Cell>, KfenError> {
    let mut cells = Vec::new();
    let mut chars = row.chars();
    while let Some(c) = chars.next() {
        let cell = match c {
            '_' => Cell { terrain: Terrain::Flat, unit: None },
            'm' => Cell { terrain: Terrain::Mountain, unit: None },
            'p' => Cell { terrain: Terrain::Pass, unit: None },
            'f' => Cell { terrain: Terrain::Fortress, unit: None },
            'A' => Cell { terrain: Terrain::Arsenal(Side::North), unit: None },
            'a' => Cell { terrain: Terrain::Arsenal(Side::South), unit: None },
            '(' | '[' => {
                let letter = chars.next().ok_or(KfenError::UnclosedGroup(c))?;
                let unit = unit_from_letter(letter).ok_or(KfenError::BadCell(letter))?;
                let closer = chars.next().ok_or(KfenError::UnclosedGroup(c))?;
                let terrain = match (c, closer) {
                    ('(', ')') => Terrain::Pass,
                    ('[', ']') => Terrain::Fortress,
                    _ => return Err(KfenError::UnclosedGroup(c)),
                };
                Cell { terrain, unit: Some(unit) }
            }
            _ => match unit_from_letter(c) {
                Some(unit) => Cell { terrain: Terrain::Flat, unit: Some(unit) },
                None => return Err(KfenError::BadCell(c)),
            },
        };
        cells.push(cell);
    }
    Ok(cells)
}

fn parse_turn(s: &str) -> Result<Side, KfenError> {
    let mut chars = s.chars();
    match (chars.next().and_then(Side::from_kfen_char), chars.next()) {
        (Some(side), None) => Ok(side),
        _ => Err(KfenError::BadTurn(s.to_string())),
    }
}

fn parse_phase(s: &str) -> Result<Phase, KfenError> {
    let mut chars = s.chars();
    match (chars.next().and_then(Phase::from_kfen_char), chars.next()) {
        (Some(phase), None) => Ok(phase),
        _ => Err(KfenError::BadPhase(s.to_string())),
    }
}

type Actions = (Vec<(Square, Square)>, u8, Option<Square>);

fn parse_actions(s: &str, phase: Phase, board: &Board) -> Result<Actions, KfenError> {
    match phase {
        Phase::Movement => {
            let inner = s
                .strip_prefix('[')
                .and_then(|rest| rest.strip_suffix(']'))
                .ok_or_else(|| KfenError::BadActions(s.to_string()))?;
            let moves = parse_move_pairs(inner, board)?;
            Ok((moves, 0, None))
        }
        Phase::Battle => match s {
            "-" => Ok((Vec::new(), 0, None)),
            "pass" => Ok((Vec::new(), 1, None)),
            _ => {
                let target = parse_square_in(s, board.dims())
                    .map_err(|_| KfenError::BadMoveToken(s.to_string()))?;
                Ok((Vec::new(), 1, Some(target)))
            }
        },
    }
}

fn parse_move_pairs(inner: &str, board: &Board) -> Result<Vec<(Square, Square)>, KfenError> {
    let mut moves = Vec::new();
    let parts: Vec<&str> = inner.split(',').collect();
    let mut i = 0;
    while i < parts.len() {
        let head = parts[i].trim();
        if head.is_empty() {
            // Missing entries between commas are tolerated.
            i += 1;
            continue;
        }
        let tail = parts
            .get(i + 1)
            .map(|t| t.trim())
            .ok_or_else(|| KfenError::BadActions(inner.to_string()))?;
        let from_str = head
            .strip_prefix('(')
            .ok_or_else(|| KfenError::BadActions(inner.to_string()))?;
        let to_str = tail
            .strip_suffix(')')
            .ok_or_else(|| KfenError::BadActions(inner.to_string()))?;

        let from = parse_square_in(from_str, board.dims())
            .map_err(|_| KfenError::BadMoveToken(from_str.to_string()))?;
        let to = parse_square_in(to_str, board.dims())
            .map_err(|_| KfenError::BadMoveToken(to_str.to_string()))?;
        moves.push((from, to));
        if moves.len() > MAX_MOVES_PER_TURN {
            return Err(KfenError::TooManyMoves);
        }
        i += 2;
    }
    Ok(moves)
}
