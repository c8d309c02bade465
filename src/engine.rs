//! Protocol-session state: the current game, engine options, and the
//! handlers behind each protocol command.
//!
//! The engine performs no search. `go` answers with the first legal action
//! in deterministic scan order, which is enough for frontends that only
//! need a syntactically valid suggestion.

use std::collections::HashMap;
use std::io::Write;

use crate::board::{format_square, parse_square_in, Board, Side, Square};
use crate::combat;
use crate::game::{Game, Phase};
use crate::protocol::kfen;
use crate::protocol::parser::GoParams;

/// Engine identity reported in the `uci` handshake.
const ENGINE_NAME: &str = "kriegspiel";
const ENGINE_AUTHOR: &str = "kriegspiel project";

/// Holds the mutable state of the engine between commands.
pub struct Engine {
    game: Option<Game>,
    options: HashMap<String, String>,
    debug: bool,
}

impl Engine {
    pub fn new() -> Engine {
        Engine { game: None, options: HashMap::new(), debug: false }
    }

    pub fn game(&self) -> Option<&Game> {
        self.game.as_ref()
    }

    /// Resets per-game state. Options survive a new game.
    pub fn new_game(&mut self) {
        self.game = None;
    }

    pub fn set_debug(&mut self, enabled: bool) {
        self.debug = enabled;
    }

    fn debug_line<W: Write>(&self, out: &mut W, message: &str) {
        if self.debug {
            writeln!(out, "info string {}", message).unwrap();
        }
    }

    fn bool_option(&self, name: &str, default: bool) -> bool {
        self.options
            .get(name)
            .map(|v| matches!(v.as_str(), "true" | "yes" | "1"))
            .unwrap_or(default)
    }

    /// Stores an option and applies network options to a live game.
    pub fn set_option(&mut self, name: String, value: Option<String>) {
        self.options.insert(name, value.unwrap_or_default());
        self.apply_options();
    }

    fn apply_options(&mut self) {
        let networks = self.bool_option("NetworksEnabled", false);
        let rebroadcast = self.bool_option("RelayAdjacencyRebroadcast", true);
        if let Some(game) = self.game.as_mut() {
            game.board_mut().set_networks_enabled(networks);
            game.board_mut().set_relay_adjacency_rebroadcast(rebroadcast);
        }
    }

    /// Handles `uci`: identity, options, `uciok`.
    pub fn handle_uci<W: Write>(&self, out: &mut W) {
        writeln!(out, "id name {}", ENGINE_NAME).unwrap();
        writeln!(out, "id author {}", ENGINE_AUTHOR).unwrap();
        writeln!(out, "option name NetworksEnabled type check default false").unwrap();
        writeln!(out, "option name RelayAdjacencyRebroadcast type check default true").unwrap();
        writeln!(out, "uciok").unwrap();
        out.flush().unwrap();
    }

    pub fn handle_isready<W: Write>(&self, out: &mut W) {
        writeln!(out, "readyok").unwrap();
        out.flush().unwrap();
    }

    /// Sets the position from `startpos` or a KFEN string, then applies the
    /// given move tokens.
    pub fn handle_position<W: Write>(
        &mut self,
        out: &mut W,
        kfen: Option<&str>,
        moves: &[String],
    ) {
        let mut game = match kfen {
            None => Game::new(Board::standard()),
            Some(s) => match kfen::decode(s) {
                Ok(game) => game,
                Err(e) => {
                    writeln!(out, "error failed to parse kfen: {}", e).unwrap();
                    out.flush().unwrap();
                    return;
                }
            },
        };
        game.board_mut().set_networks_enabled(self.bool_option("NetworksEnabled", false));
        game.board_mut()
            .set_relay_adjacency_rebroadcast(self.bool_option("RelayAdjacencyRebroadcast", true));

        for token in moves {
            let (from, to) = match parse_move_token(token, &game) {
                Ok(pair) => pair,
                Err(reason) => {
                    writeln!(out, "error bad move token '{}': {}", token, reason).unwrap();
                    out.flush().unwrap();
                    return;
                }
            };
            if let Err(e) = game.make_move(from, to) {
                writeln!(out, "error move '{}' rejected: {}", token, e).unwrap();
                out.flush().unwrap();
                return;
            }
        }

        self.debug_line(out, &format!("position set, {} to move", game.side_to_move().name()));
        self.game = Some(game);
        out.flush().unwrap();
    }

    /// Handles `go`: emits the first legal action as `bestmove`.
    pub fn handle_go<W: Write>(&mut self, out: &mut W, _params: &GoParams) {
        let Some(game) = self.game.as_ref() else {
            writeln!(out, "error no position set").unwrap();
            out.flush().unwrap();
            return;
        };
        if game.is_game_over() {
            writeln!(out, "error game is over").unwrap();
            out.flush().unwrap();
            return;
        }

        let response = match game.phase() {
            Phase::Movement => first_move(game)
                .map(|(from, to)| format!("{}{}", format_square(from), format_square(to))),
            Phase::Battle if game.attacks_this_turn() == 0 => {
                first_target(game).map(format_square)
            }
            Phase::Battle => None,
        };

        writeln!(out, "bestmove {}", response.unwrap_or_else(|| "pass".to_string())).unwrap();
        out.flush().unwrap();
    }

    /// Handles `status`: one line of turn-state summary.
    pub fn handle_status<W: Write>(&self, out: &mut W) {
        match self.game.as_ref() {
            None => writeln!(out, "error no position set").unwrap(),
            Some(game) => {
                let s = game.summary();
                writeln!(
                    out,
                    "status turn {} side {} phase {} moves {}/{} attacks {}/1 retreats {} state {}",
                    s.turn_number,
                    s.side_to_move.name(),
                    s.phase.kfen_char(),
                    s.moves_made,
                    s.moves_made + s.moves_remaining,
                    s.attacks_made,
                    s.pending_retreats,
                    game.game_state().name(),
                )
                .unwrap();
            }
        }
        out.flush().unwrap();
    }

    /// Handles `network`: per-side online/total unit counts.
    pub fn handle_network<W: Write>(&self, out: &mut W) {
        match self.game.as_ref() {
            None => writeln!(out, "error no position set").unwrap(),
            Some(game) => {
                let board = game.board();
                let count = |side: Side| {
                    (board.online_units(side).count(), board.count_units(side))
                };
                let (n_on, n_total) = count(Side::North);
                let (s_on, s_total) = count(Side::South);
                writeln!(
                    out,
                    "network enabled {} north {}/{} south {}/{}",
                    board.networks_enabled(),
                    n_on,
                    n_total,
                    s_on,
                    s_total,
                )
                .unwrap();
            }
        }
        out.flush().unwrap();
    }

    /// Handles `victory`: the current game state, with the deciding
    /// condition once the game has ended.
    pub fn handle_victory<W: Write>(&self, out: &mut W) {
        match self.game.as_ref() {
            None => writeln!(out, "error no position set").unwrap(),
            Some(game) => match game.victory_report() {
                Some(report) => {
                    let condition =
                        report.condition.map(|c| c.name()).unwrap_or("SIMULTANEOUS");
                    writeln!(out, "victory {} {}", report.state.name(), condition).unwrap();
                }
                None => writeln!(out, "victory {}", game.game_state().name()).unwrap(),
            },
        }
        out.flush().unwrap();
    }

    /// Handles `phase` and `phase B` (the only legal transition).
    pub fn handle_phase<W: Write>(&mut self, out: &mut W, requested: Option<Phase>) {
        let Some(game) = self.game.as_mut() else {
            writeln!(out, "error no position set").unwrap();
            out.flush().unwrap();
            return;
        };
        match requested {
            None => writeln!(out, "phase {}", game.phase().kfen_char()).unwrap(),
            Some(Phase::Battle) => match game.switch_to_battle() {
                Ok(()) => writeln!(out, "phase B").unwrap(),
                Err(e) => writeln!(out, "error {}", e).unwrap(),
            },
            Some(Phase::Movement) => {
                if game.phase() == Phase::Movement {
                    writeln!(out, "phase M").unwrap();
                } else {
                    writeln!(out, "error cannot return to the movement phase").unwrap();
                }
            }
        }
        out.flush().unwrap();
    }

    /// Handles `retreats`: squares the side to move must vacate.
    pub fn handle_retreats<W: Write>(&self, out: &mut W) {
        match self.game.as_ref() {
            None => writeln!(out, "error no position set").unwrap(),
            Some(game) => {
                if game.pending_retreats().is_empty() {
                    writeln!(out, "retreats -").unwrap();
                } else {
                    let squares: Vec<String> =
                        game.pending_retreats().iter().map(|s| s.to_string()).collect();
                    writeln!(out, "retreats {}", squares.join(" ")).unwrap();
                }
            }
        }
        out.flush().unwrap();
    }
}

impl Default for Engine {
    fn default() -> Engine {
        Engine::new()
    }
}

/// Splits a move token like `A1B2` into its two squares.
fn parse_move_token(token: &str, game: &Game) -> Result<(Square, Square), String> {
    // The from-square ends after its digit run.
    let letters_end = token
        .find(|c: char| c.is_ascii_digit())
        .ok_or_else(|| "missing row number".to_string())?;
    let digits_end = token[letters_end..]
        .find(|c: char| !c.is_ascii_digit())
        .map(|i| letters_end + i)
        .ok_or_else(|| "missing destination".to_string())?;

    let dims = game.board().dims();
    let from = parse_square_in(&token[..digits_end], dims).map_err(|e| e.to_string())?;
    let to = parse_square_in(&token[digits_end..], dims).map_err(|e| e.to_string())?;
    Ok((from, to))
}

/// First mover and destination in row-major scan order.
fn first_move(game: &Game) -> Option<(Square, Square)> {
    for (sq, _) in game.board().units_of(game.side_to_move()) {
        if let Some(&to) = game.legal_moves(sq).first() {
            return Some((sq, to));
        }
    }
    None
}

/// First attackable enemy square in row-major scan order.
fn first_target(game: &Game) -> Option<Square> {
    game.board()
        .units_of(game.side_to_move().opponent())
        .map(|(sq, _)| sq)
        .find(|&sq| combat::check_target(game.board(), sq, game.side_to_move()).is_ok())
}
