//! PGN game-record generation.
//!
//! The header of the source record is kept tag for tag with only the
//! `Result` tag replaced. Movetext is rebuilt from the ply history:
//! SAN for moves, `--` for skipped turns, and a brace comment carrying
//! the recorded time (`[%egt H:MM:00]`) and any draw offer.

use crate::header::{escape, ParseError, Tags};
use scoresheet_core::{Color, Ply};
use std::fmt::Write;

/// Default movetext line width.
pub const DEFAULT_LINE_WIDTH: usize = 80;

/// Result token for a finished game; `None` is a draw.
pub const fn result_token(winner: Option<Color>) -> &'static str {
    match winner {
        Some(Color::White) => "1-0",
        Some(Color::Black) => "0-1",
        None => "1/2-1/2",
    }
}

/// Builds PGN text from a source header and a ply history.
#[derive(Debug, Clone, Copy)]
pub struct PgnWriter {
    line_width: usize,
}

impl Default for PgnWriter {
    fn default() -> Self {
        PgnWriter {
            line_width: DEFAULT_LINE_WIDTH,
        }
    }
}

impl PgnWriter {
    pub fn new(line_width: usize) -> Self {
        PgnWriter {
            line_width: line_width.max(1),
        }
    }

    /// Writes the full game record.
    ///
    /// Fails only if `source_pgn` has no readable header.
    pub fn write(
        &self,
        source_pgn: &str,
        plies: &[Ply],
        winner: Option<Color>,
    ) -> Result<String, ParseError> {
        let result = result_token(winner);
        let mut tags = Tags::parse(source_pgn)?;
        tags.set("Result", result);

        let mut out = String::new();
        for (key, value) in tags.iter() {
            // Writing into a String cannot fail.
            let _ = writeln!(out, "[{} \"{}\"]", key, escape(value));
        }
        out.push('\n');

        let mut tokens = movetext_tokens(plies);
        tokens.push(result.to_string());
        for line in wrap(&tokens, self.line_width) {
            out.push_str(&line);
            out.push('\n');
        }

        Ok(out)
    }
}

/// Generates a PGN game record with the default line width.
pub fn generate_pgn(
    source_pgn: &str,
    plies: &[Ply],
    winner: Option<Color>,
) -> Result<String, ParseError> {
    PgnWriter::default().write(source_pgn, plies, winner)
}

fn movetext_tokens(plies: &[Ply]) -> Vec<String> {
    let mut tokens = Vec::with_capacity(plies.len() * 2);
    let mut needs_number = true;

    for ply in plies {
        let san = match ply {
            Ply::Move(m) => m.notation.as_str(),
            Ply::Skip(_) => "--",
        };
        // A move number never ends a line apart from its move.
        tokens.push(match ply.player() {
            Color::White => format!("{}. {}", ply.move_number(), san),
            Color::Black if needs_number => format!("{}... {}", ply.move_number(), san),
            Color::Black => san.to_string(),
        });

        let comment = annotation(ply);
        needs_number = comment.is_some();
        tokens.extend(comment);
    }

    tokens
}

fn annotation(ply: &Ply) -> Option<String> {
    let mut parts = Vec::new();
    if let Some(time) = ply.recorded_time() {
        parts.push(format!("[%egt {}:{:02}:00]", time.hours, time.minutes));
    }
    if ply.draw_offer() {
        parts.push("draw offer".to_string());
    }
    if parts.is_empty() {
        None
    } else {
        Some(format!("{{{}}}", parts.join(" ")))
    }
}

/// Greedy fill; a token longer than `width` gets a line of its own.
fn wrap(tokens: &[String], width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut line = String::new();
    for token in tokens {
        if !line.is_empty() && line.len() + 1 + token.len() > width {
            lines.push(std::mem::take(&mut line));
        }
        if !line.is_empty() {
            line.push(' ');
        }
        line.push_str(token);
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines
}
