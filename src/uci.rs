// UCI front end
//
// Reads commands line by line, dispatches them to an owned
// `SearchController` and writes replies to a shared output. Search results
// are written from the worker thread through `UciReporter`, so every write
// goes through the same mutex and lines never interleave.

use crate::agent::ai::{CandidateReport, SearchController, SearchListener, SearchResult};
use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::game_repr::Move;
use log::{debug, error, info, warn};
use parking_lot::Mutex;
use std::io::{BufRead, Write};
use std::sync::Arc;

/// Sent as `bestmove` when there is no move to play
pub const NULL_MOVE: &str = "0000";

/// Whether the command loop should keep reading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

fn write_lines<W: Write>(out: &Mutex<W>, lines: &[String]) -> std::io::Result<()> {
    let mut out = out.lock();
    for line in lines {
        writeln!(out, "{}", line)?;
    }
    out.flush()
}

/// Turns search events into `info` and `bestmove` lines
pub struct UciReporter<W> {
    out: Arc<Mutex<W>>,
}

impl<W> UciReporter<W> {
    pub fn new(out: Arc<Mutex<W>>) -> Self {
        Self { out }
    }
}

impl<W: Write + Send> UciReporter<W> {
    fn emit(&self, lines: &[String]) {
        if let Err(err) = write_lines(&self.out, lines) {
            error!("failed to write search output: {}", err);
        }
    }
}

impl<W: Write + Send> SearchListener for UciReporter<W> {
    fn on_candidate(&self, depth: u8, report: &CandidateReport<Move>) {
        self.emit(&[format!(
            "info depth {} currmove {} currmovenumber {}",
            depth, report.mv, report.index
        )]);
    }

    fn on_complete(&self, result: &EngineResult<SearchResult>) {
        let lines = match result {
            Ok(result) => {
                let mut lines = Vec::with_capacity(2);
                if let Some(score) = result.score {
                    lines.push(format!(
                        "info depth {} score cp {} nodes {} time {}",
                        result.depth,
                        score,
                        result.stats.nodes,
                        result.elapsed.as_millis()
                    ));
                }
                let best = result.best_move.map_or_else(|| NULL_MOVE.to_string(), |mv| mv.to_string());
                lines.push(format!("bestmove {}", best));
                lines
            }
            Err(err) => {
                error!("search failed: {}", err);
                vec![format!("info string search failed: {}", err), format!("bestmove {}", NULL_MOVE)]
            }
        };
        self.emit(&lines);
    }
}

/// Parsed arguments of a `position` command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionCommand<'a> {
    /// `None` for `startpos`
    pub fen: Option<String>,
    pub moves: Vec<&'a str>,
}

/// Parse the arguments following `position`
pub fn parse_position<'a>(args: &[&'a str]) -> EngineResult<PositionCommand<'a>> {
    let (fen, rest) = match args.split_first() {
        Some((&"startpos", rest)) => (None, rest),
        Some((&"fen", rest)) => {
            let end = rest.iter().position(|token| *token == "moves").unwrap_or(rest.len());
            if end == 0 {
                return Err(EngineError::Protocol("position fen: missing FEN".to_string()));
            }
            (Some(rest[..end].join(" ")), &rest[end..])
        }
        Some((other, _)) => {
            return Err(EngineError::Protocol(format!(
                "position: expected 'startpos' or 'fen', got '{}'",
                other
            )))
        }
        None => return Err(EngineError::Protocol("position: missing arguments".to_string())),
    };

    let moves = match rest.split_first() {
        None => Vec::new(),
        Some((&"moves", moves)) => moves.to_vec(),
        Some((other, _)) => {
            return Err(EngineError::Protocol(format!("position: unexpected '{}'", other)));
        }
    };

    Ok(PositionCommand { fen, moves })
}

/// Parse the arguments following `go`, returning the requested depth
///
/// Time-control arguments are accepted and skipped.
pub fn parse_go(args: &[&str], default_depth: u8) -> EngineResult<u8> {
    let mut depth = default_depth;
    let mut tokens = args.iter();

    while let Some(&token) = tokens.next() {
        match token {
            "depth" => {
                depth = tokens
                    .next()
                    .and_then(|value| value.parse::<u8>().ok())
                    .ok_or_else(|| EngineError::Protocol("go depth: expected a number from 0 to 255".to_string()))?;
            }
            "wtime" | "btime" | "winc" | "binc" | "movestogo" | "movetime" | "nodes" | "mate" => {
                tokens.next();
            }
            "searchmoves" => break,
            other => debug!("ignoring go argument '{}'", other),
        }
    }

    Ok(depth)
}

/// UCI command loop
pub struct UciEngine<W: Write + Send + 'static> {
    controller: SearchController,
    out: Arc<Mutex<W>>,
}

impl<W: Write + Send + 'static> UciEngine<W> {
    pub fn new(config: EngineConfig, out: Arc<Mutex<W>>) -> Self {
        let reporter = Arc::new(UciReporter::new(Arc::clone(&out)));
        Self {
            controller: SearchController::new(config, reporter),
            out,
        }
    }

    pub fn controller(&mut self) -> &mut SearchController {
        &mut self.controller
    }

    /// Process commands until `quit` or end of input
    pub fn run<R: BufRead>(&mut self, input: R) -> EngineResult<()> {
        info!("{} ready", self.controller.config().name);

        for line in input.lines() {
            if self.handle_line(&line?)? == Flow::Quit {
                return Ok(());
            }
        }

        debug!("input closed");
        self.quit()
    }

    /// Handle a single command line
    ///
    /// Only I/O failures are returned as errors; bad commands are reported
    /// to the client and the loop goes on.
    pub fn handle_line(&mut self, line: &str) -> EngineResult<Flow> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let Some((&command, args)) = tokens.split_first() else {
            return Ok(Flow::Continue);
        };

        match command {
            "uci" => {
                let config = self.controller.config();
                let lines = [
                    format!("id name {}", config.name),
                    format!("id author {}", config.author),
                    "uciok".to_string(),
                ];
                self.send(&lines)?;
            }
            "isready" => self.send(&["readyok".to_string()])?,
            "ucinewgame" => {
                if let Err(err) = self.controller.reset_position() {
                    self.reject(command, &err)?;
                }
            }
            "position" => self.position(args)?,
            "go" => self.go(args)?,
            "stop" => {
                self.controller.stop();
                self.send(&["info string Received 'stop' command.".to_string()])?;
            }
            "quit" => {
                self.quit()?;
                return Ok(Flow::Quit);
            }
            _ => {
                warn!("unknown command: {}", line.trim());
                self.send(&[format!("info string Unknown command: {}", line.trim())])?;
            }
        }

        Ok(Flow::Continue)
    }

    fn position(&mut self, args: &[&str]) -> EngineResult<()> {
        let result = parse_position(args)
            .and_then(|command| self.controller.set_position(command.fen.as_deref(), &command.moves));

        match result {
            Ok(()) => self.send(&["info string Position set.".to_string()]),
            Err(err) => self.reject("position", &err),
        }
    }

    fn go(&mut self, args: &[&str]) -> EngineResult<()> {
        let result = parse_go(args, self.controller.config().default_depth)
            .and_then(|depth| self.controller.start(depth));

        match result {
            Ok(()) => Ok(()),
            Err(err) => self.reject("go", &err),
        }
    }

    fn quit(&mut self) -> EngineResult<()> {
        self.send(&["info string Received 'quit' command. Shutting down.".to_string()])?;
        self.controller.shutdown();
        Ok(())
    }

    fn reject(&self, command: &str, err: &EngineError) -> EngineResult<()> {
        warn!("{} rejected: {}", command, err);
        self.send(&[format!("info string {} rejected: {}", command, err)])
    }

    fn send(&self, lines: &[String]) -> EngineResult<()> {
        write_lines(&self.out, lines)?;
        Ok(())
    }
}
