//! Integration tests for the kriegspiel binary.
//!
//! Spawns the engine process, feeds it protocol commands on stdin, and
//! checks the stdout responses.

use std::io::{BufRead, Write};
use std::process::{Command, Stdio};

/// Sends a sequence of commands to the engine and collects stdout lines.
fn run_engine(commands: &[&str]) -> Vec<String> {
    let exe = env!("CARGO_BIN_EXE_kriegspiel");
    let mut child = Command::new(exe)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("failed to start kriegspiel");

    let mut stdin = child.stdin.take().unwrap();
    let stdout = child.stdout.take().unwrap();
    let reader = std::io::BufReader::new(stdout);

    for cmd in commands {
        writeln!(stdin, "{}", cmd).unwrap();
    }
    stdin.flush().unwrap();
    drop(stdin);

    let lines: Vec<String> = reader.lines().map(|l| l.unwrap()).collect();
    let status = child.wait().expect("failed to wait on child");
    assert!(status.success());
    lines
}

/// A small position: one infantry per side on a 5x5 board.
const SMALL_KFEN: &str = "I____/_____/_____/_____/____i/N/M/[]";

#[test]
fn uci_handshake() {
    let lines = run_engine(&["uci", "quit"]);

    assert!(lines.iter().any(|l| l == "id name kriegspiel"));
    assert!(lines.iter().any(|l| l.starts_with("option name NetworksEnabled")));
    assert!(lines.iter().any(|l| l == "uciok"));

    let uciok_idx = lines.iter().position(|l| l == "uciok").unwrap();
    let id_idx = lines.iter().position(|l| l == "id name kriegspiel").unwrap();
    assert!(id_idx < uciok_idx, "id lines must precede uciok");
}

#[test]
fn isready_answers_readyok() {
    let lines = run_engine(&["isready", "quit"]);
    assert_eq!(lines, vec!["readyok"]);
}

#[test]
fn position_and_status() {
    let lines = run_engine(&[&format!("position kfen {}", SMALL_KFEN), "status", "quit"]);
    assert_eq!(
        lines,
        vec!["status turn 1 side NORTH phase M moves 0/5 attacks 0/1 retreats 0 state ONGOING"]
    );
}

#[test]
fn position_with_moves_updates_status() {
    let lines = run_engine(&[
        &format!("position kfen {} moves A1B2", SMALL_KFEN),
        "status",
        "quit",
    ]);
    assert_eq!(
        lines,
        vec!["status turn 1 side NORTH phase M moves 1/5 attacks 0/1 retreats 0 state ONGOING"]
    );
}

#[test]
fn phase_switch_and_query() {
    let lines = run_engine(&[
        &format!("position kfen {}", SMALL_KFEN),
        "phase",
        "phase B",
        "phase",
        "quit",
    ]);
    assert_eq!(lines, vec!["phase M", "phase B", "phase B"]);
}

#[test]
fn go_answers_bestmove() {
    let lines = run_engine(&[&format!("position kfen {}", SMALL_KFEN), "go", "quit"]);
    assert_eq!(lines.len(), 1);
    assert!(lines[0].starts_with("bestmove "), "got: {}", lines[0]);
}

#[test]
fn network_respects_option() {
    let lines = run_engine(&[
        "setoption name NetworksEnabled value true",
        "position kfen A_I__/_____/_____/_____/____i/N/M/[]",
        "network",
        "quit",
    ]);
    assert_eq!(lines, vec!["network enabled true north 1/1 south 0/1"]);
}

#[test]
fn victory_reports_ongoing() {
    let lines = run_engine(&[&format!("position kfen {}", SMALL_KFEN), "victory", "quit"]);
    assert_eq!(lines, vec!["victory ONGOING"]);
}

#[test]
fn retreats_empty_by_default() {
    let lines = run_engine(&[&format!("position kfen {}", SMALL_KFEN), "retreats", "quit"]);
    assert_eq!(lines, vec!["retreats -"]);
}

#[test]
fn unknown_command_yields_error_line() {
    let lines = run_engine(&["frobnicate", "quit"]);
    assert_eq!(lines, vec!["error unknown command 'frobnicate'"]);
}

#[test]
fn bad_kfen_yields_error_line() {
    let lines = run_engine(&["position kfen bogus", "quit"]);
    assert_eq!(lines.len(), 1);
    assert!(lines[0].starts_with("error failed to parse kfen"));
}

#[test]
fn commands_without_position_report_errors() {
    let lines = run_engine(&["status", "network", "victory", "retreats", "go", "quit"]);
    assert_eq!(lines.len(), 5);
    assert!(lines.iter().all(|l| l.starts_with("error no position set")));
}

#[test]
fn full_session_flow() {
    let lines = run_engine(&[
        "uci",
        "isready",
        "ucinewgame",
        &format!("position kfen {}", SMALL_KFEN),
        "phase B",
        "go",
        "quit",
    ]);

    assert!(lines.iter().any(|l| l == "uciok"));
    assert!(lines.iter().any(|l| l == "readyok"));
    assert!(lines.iter().any(|l| l == "phase B"));
    // The two infantry are far apart: no attack is available.
    assert!(lines.iter().any(|l| l == "bestmove pass"));
}
