//! Scoresheet tokens given on the command line.

use anyhow::{anyhow, bail, Context};
use scoresheet_core::{PieceType, RecordedTime, Square};
use std::str::FromStr;

/// One step of a recording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    /// `e2e4`, or `e7e8q` with a promotion piece.
    Move {
        from: Square,
        to: Square,
        promotion: Option<PieceType>,
    },
    Skip,
    /// Toggle the draw offer on the last ply.
    Draw,
    Undo,
    Redo,
    /// `edit:N` re-enters play from ply N.
    Edit(usize),
    /// `time:N:H:MM` sets the recorded time of ply N.
    Time { index: usize, time: RecordedTime },
}

impl FromStr for Token {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "skip" => return Ok(Token::Skip),
            "draw" => return Ok(Token::Draw),
            "undo" => return Ok(Token::Undo),
            "redo" => return Ok(Token::Redo),
            _ => {}
        }

        if let Some(index) = s.strip_prefix("edit:") {
            return Ok(Token::Edit(parse_index(index)?));
        }

        if let Some(rest) = s.strip_prefix("time:") {
            let mut parts = rest.splitn(3, ':');
            let (Some(index), Some(hours), Some(minutes)) = (parts.next(), parts.next(), parts.next())
            else {
                bail!("expected time:N:H:MM, got '{s}'");
            };
            let hours: u32 = hours.parse().with_context(|| format!("bad hours in '{s}'"))?;
            let minutes: u32 = minutes
                .parse()
                .with_context(|| format!("bad minutes in '{s}'"))?;
            let time = RecordedTime::new(hours, minutes)
                .ok_or_else(|| anyhow!("minutes must be below 60 in '{s}'"))?;
            return Ok(Token::Time {
                index: parse_index(index)?,
                time,
            });
        }

        parse_move(s)
    }
}

fn parse_index(s: &str) -> anyhow::Result<usize> {
    s.parse().with_context(|| format!("bad ply index '{s}'"))
}

fn parse_move(s: &str) -> anyhow::Result<Token> {
    if !s.is_ascii() || !(4..=5).contains(&s.len()) {
        bail!("unrecognised token '{s}'");
    }
    let square = |name: &str| {
        Square::from_algebraic(name).ok_or_else(|| anyhow!("bad square '{name}' in '{s}'"))
    };
    let promotion = match s[4..].chars().next() {
        Some(c) => Some(
            PieceType::from_char(c)
                .filter(|p| p.is_promotion_target())
                .ok_or_else(|| anyhow!("bad promotion piece in '{s}'"))?,
        ),
        None => None,
    };
    Ok(Token::Move {
        from: square(&s[0..2])?,
        to: square(&s[2..4])?,
        promotion,
    })
}

/// Splits a whitespace-separated token list.
pub fn parse_tokens(text: &str) -> anyhow::Result<Vec<Token>> {
    text.split_whitespace()
        .map(|t| t.parse::<Token>())
        .collect()
}
