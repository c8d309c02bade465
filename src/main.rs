//! Kriegspiel -- an engine for A Game of War, speaking a UCI-like protocol.
//!
//! This binary reads commands from stdin and writes responses to stdout.

use std::io::{self, BufRead, Write};

use kriegspiel::engine::Engine;
use kriegspiel::protocol::parser::{parse_command, Command, PositionSpec, ProtocolError};

/// Runs the main protocol loop, reading commands from stdin and writing
/// responses to stdout.
fn main() {
    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut out = io::BufWriter::new(stdout.lock());
    let mut engine = Engine::new();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(_) => break,
        };

        let cmd = match parse_command(&line) {
            Ok(c) => c,
            Err(ProtocolError::Empty) => continue,
            Err(e) => {
                writeln!(out, "error {}", e).unwrap();
                out.flush().unwrap();
                continue;
            }
        };

        match cmd {
            Command::Uci => engine.handle_uci(&mut out),
            Command::Debug(enabled) => engine.set_debug(enabled),
            Command::IsReady => engine.handle_isready(&mut out),
            Command::SetOption { name, value } => engine.set_option(name, value),
            Command::NewGame => engine.new_game(),
            Command::Position { position, moves } => {
                let kfen = match &position {
                    PositionSpec::StartPos => None,
                    PositionSpec::Kfen(s) => Some(s.as_str()),
                };
                engine.handle_position(&mut out, kfen, &moves);
            }
            Command::Go(params) => engine.handle_go(&mut out, &params),
            Command::Stop => {
                // No asynchronous search to interrupt.
            }
            Command::Status => engine.handle_status(&mut out),
            Command::Network => engine.handle_network(&mut out),
            Command::Victory => engine.handle_victory(&mut out),
            Command::Phase(requested) => engine.handle_phase(&mut out, requested),
            Command::Retreats => engine.handle_retreats(&mut out),
            Command::Quit => break,
        }
    }
}
