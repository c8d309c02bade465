//! Line-oriented command parser for the UCI-like control protocol.
//!
//! Parses raw command lines into structured [`Command`] variants for the
//! engine loop to dispatch on. Game semantics live elsewhere; this module
//! only recognizes syntax.

use thiserror::Error;

use crate::game::Phase;

/// Errors from command parsing.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("empty command")]
    Empty,

    #[error("unknown command '{0}'")]
    UnknownCommand(String),

    #[error("malformed {command}: {reason}")]
    Malformed { command: &'static str, reason: String },
}

fn malformed(command: &'static str, reason: impl Into<String>) -> ProtocolError {
    ProtocolError::Malformed { command, reason: reason.into() }
}

/// Search constraints passed with the `go` command. The engine performs no
/// search; the constraints are accepted for protocol compatibility.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GoParams {
    pub depth: Option<u32>,
    pub nodes: Option<u64>,
    pub movetime: Option<u64>,
    pub infinite: bool,
    pub ponder: bool,
}

/// Where a `position` command starts from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PositionSpec {
    StartPos,
    Kfen(String),
}

/// A parsed frontend-to-engine command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Uci,
    Debug(bool),
    IsReady,
    SetOption { name: String, value: Option<String> },
    NewGame,
    Position { position: PositionSpec, moves: Vec<String> },
    Go(GoParams),
    Stop,
    Quit,
    Status,
    Network,
    Victory,
    /// `phase` queries the current phase; `phase B` ends the movement phase.
    Phase(Option<Phase>),
    Retreats,
}

/// Parses a single input line.
pub fn parse_command(line: &str) -> Result<Command, ProtocolError> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let Some((&head, args)) = tokens.split_first() else {
        return Err(ProtocolError::Empty);
    };

    match head {
        "uci" => Ok(Command::Uci),
        "isready" => Ok(Command::IsReady),
        "ucinewgame" => Ok(Command::NewGame),
        "stop" => Ok(Command::Stop),
        "quit" => Ok(Command::Quit),
        "status" => Ok(Command::Status),
        "network" => Ok(Command::Network),
        "victory" => Ok(Command::Victory),
        "retreats" => Ok(Command::Retreats),

        "debug" => parse_debug(args),
        "setoption" => parse_setoption(args),
        "position" => parse_position(args),
        "go" => parse_go(args),
        "phase" => parse_phase(args),

        other => Err(ProtocolError::UnknownCommand(other.to_string())),
    }
}

/// Parses `debug on|off`.
fn parse_debug(args: &[&str]) -> Result<Command, ProtocolError> {
    match args {
        ["on"] => Ok(Command::Debug(true)),
        ["off"] => Ok(Command::Debug(false)),
        _ => Err(malformed("debug", "expected 'on' or 'off'")),
    }
}

/// Parses `setoption name <id> [value <x>]`. Names and values may span
/// several tokens.
fn parse_setoption(args: &[&str]) -> Result<Command, ProtocolError> {
    if args.first() != Some(&"name") {
        return Err(malformed("setoption", "expected 'setoption name <id> [value <x>]'"));
    }
    let rest = &args[1..];
    let value_idx = rest.iter().position(|&t| t == "value");

    let (name_parts, value_parts) = match value_idx {
        Some(vi) => (&rest[..vi], Some(&rest[vi + 1..])),
        None => (rest, None),
    };
    if name_parts.is_empty() {
        return Err(malformed("setoption", "empty option name"));
    }

    let name = name_parts.join(" ");
    let value = match value_parts {
        Some([]) => Some(String::new()),
        Some(parts) => Some(parts.join(" ")),
        None => None,
    };
    Ok(Command::SetOption { name, value })
}

/// Parses `position startpos|kfen <string> [moves m1 m2 ...]`.
fn parse_position(args: &[&str]) -> Result<Command, ProtocolError> {
    let Some((&kind, rest)) = args.split_first() else {
        return Err(malformed("position", "expected 'startpos' or 'kfen <string>'"));
    };

    let (position, rest) = match kind {
        "startpos" => (PositionSpec::StartPos, rest),
        "kfen" => {
            let Some((&kfen, rest)) = rest.split_first() else {
                return Err(malformed("position", "kfen requires a position string"));
            };
            (PositionSpec::Kfen(kfen.to_string()), rest)
        }
        other => {
            return Err(malformed(
                "position",
                format!("invalid position type '{other}', expected 'startpos' or 'kfen'"),
            ))
        }
    };

    let moves = match rest.split_first() {
        None => Vec::new(),
        Some((&"moves", move_tokens)) => move_tokens.iter().map(|t| t.to_string()).collect(),
        Some((other, _)) => {
            return Err(malformed("position", format!("unexpected token '{other}'")))
        }
    };

    Ok(Command::Position { position, moves })
}

/// Parses `go [depth N] [nodes N] [movetime MS] [infinite] [ponder]`.
fn parse_go(args: &[&str]) -> Result<Command, ProtocolError> {
    let mut params = GoParams::default();
    let mut i = 0;
    while i < args.len() {
        match args[i] {
            "infinite" => params.infinite = true,
            "ponder" => params.ponder = true,
            key @ ("depth" | "nodes" | "movetime") => {
                i += 1;
                let value = args
                    .get(i)
                    .ok_or_else(|| malformed("go", format!("'{key}' requires a value")))?;
                match key {
                    "depth" => {
                        params.depth = Some(value.parse().map_err(|_| {
                            malformed("go", format!("invalid depth value '{value}'"))
                        })?)
                    }
                    "nodes" => {
                        params.nodes = Some(value.parse().map_err(|_| {
                            malformed("go", format!("invalid nodes value '{value}'"))
                        })?)
                    }
                    "movetime" => {
                        params.movetime = Some(value.parse().map_err(|_| {
                            malformed("go", format!("invalid movetime value '{value}'"))
                        })?)
                    }
                    _ => unreachable!(),
                }
            }
            other => return Err(malformed("go", format!("unknown parameter '{other}'"))),
        }
        i += 1;
    }
    Ok(Command::Go(params))
}

/// Parses `phase [M|B]`.
fn parse_phase(args: &[&str]) -> Result<Command, ProtocolError> {
    match args {
        [] => Ok(Command::Phase(None)),
        [p] => {
            let mut chars = p.chars();
            match (chars.next().and_then(Phase::from_kfen_char), chars.next()) {
                (Some(phase), None) => Ok(Command::Phase(Some(phase))),
                _ => Err(malformed("phase", format!("invalid phase '{p}', expected 'M' or 'B'"))),
            }
        }
        _ => Err(malformed("phase", "expected at most one argument")),
    }
}
