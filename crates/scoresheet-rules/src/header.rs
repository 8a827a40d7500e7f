//! PGN header parsing.
//!
//! Reads the `[Key "Value"]` tag section of a game record into an ordered
//! [`Tags`] list and from there into a [`GameInfo`].

use chrono::NaiveDate;
use regex::Regex;
use scoresheet_core::{Color, GameInfo, Player};
use thiserror::Error;

/// Errors that can occur when reading a game record.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("game record is empty")]
    Empty,

    #[error("game record is an HTML page, not PGN")]
    Html,

    #[error("no PGN header tags found")]
    NoHeaders,

    #[error("missing required tag: {0}")]
    MissingTag(&'static str),

    #[error("invalid player name {0:?}: expected \"Last, First\"")]
    InvalidPlayerName(String),

    #[error("invalid round {0:?}")]
    InvalidRound(String),

    #[error("invalid {tag} value {value:?}")]
    InvalidNumber { tag: &'static str, value: String },

    #[error("tag pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Header tags in the order they appear.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tags(Vec<(String, String)>);

impl Tags {
    /// Extracts every `[Key "Value"]` tag from `pgn`.
    pub fn parse(pgn: &str) -> Result<Self, ParseError> {
        if pgn.trim().is_empty() {
            return Err(ParseError::Empty);
        }
        let head: String = pgn.trim_start().chars().take(14).collect();
        let head = head.to_ascii_lowercase();
        if head.starts_with("<!doctype html") || head.starts_with("<html") {
            return Err(ParseError::Html);
        }

        // Values may carry PGN escapes: \" and \\.
        let tag_re = Regex::new(r#"\[(\w+)\s+"((?:[^"\\]|\\.)*)"\]"#)?;
        let tags: Vec<(String, String)> = tag_re
            .captures_iter(pgn)
            .map(|cap| (cap[1].to_string(), unescape(&cap[2])))
            .collect();
        if tags.is_empty() {
            return Err(ParseError::NoHeaders);
        }
        Ok(Tags(tags))
    }

    /// Value of the first tag named `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Replaces the value of `key`, or appends the tag if absent.
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        match self.0.iter_mut().find(|(k, _)| k == key) {
            Some(slot) => slot.1 = value,
            None => self.0.push((key.to_string(), value)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    fn require(&self, key: &'static str) -> Result<&str, ParseError> {
        self.get(key).ok_or(ParseError::MissingTag(key))
    }
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => out.extend(chars.next()),
            c => out.push(c),
        }
    }
    out
}

/// Escapes a tag value for writing between double quotes.
pub(crate) fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Round, game and board numbers read from a `Round` tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundInfo {
    pub round: Option<u32>,
    pub game: Option<u32>,
    pub board: u32,
}

/// Parses a `Round` tag value.
///
/// - `N` is board N
/// - `N.M` is round N, board M
/// - `N.M.P` is round N, game M, board P
///
/// Anything else, including an empty value, is an error.
pub fn parse_round_info(text: &str) -> Result<RoundInfo, ParseError> {
    let invalid = || ParseError::InvalidRound(text.to_string());
    let numbers = text
        .trim()
        .split('.')
        .map(|part| {
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid());
            }
            part.parse::<u32>().map_err(|_| invalid())
        })
        .collect::<Result<Vec<u32>, ParseError>>()?;

    match numbers.as_slice() {
        [board] => Ok(RoundInfo {
            round: None,
            game: None,
            board: *board,
        }),
        [round, board] => Ok(RoundInfo {
            round: Some(*round),
            game: None,
            board: *board,
        }),
        [round, game, board] => Ok(RoundInfo {
            round: Some(*round),
            game: Some(*game),
            board: *board,
        }),
        _ => Err(invalid()),
    }
}

/// Parses the header of a game record into a [`GameInfo`].
///
/// `Event`, `Round`, `White` and `Black` are required. Player names must be
/// written "Last, First".
pub fn parse_game_info(pgn: &str) -> Result<GameInfo, ParseError> {
    let tags = Tags::parse(pgn)?;

    let name = tags.require("Event")?.to_string();
    let rounds = parse_round_info(tags.require("Round")?)?;
    let white = extract_player(&tags, Color::White)?;
    let black = extract_player(&tags, Color::Black)?;

    let date = tags
        .get("Date")
        .and_then(|value| NaiveDate::parse_from_str(value, "%Y.%m.%d").ok());

    Ok(GameInfo {
        name,
        site: tags.get("Site").unwrap_or_default().to_string(),
        round: rounds.round,
        board: Some(rounds.board),
        game: rounds.game,
        date,
        result: tags.get("Result").unwrap_or("*").to_string(),
        players: [white, black],
        source_pgn: pgn.to_string(),
    })
}

fn extract_player(tags: &Tags, colour: Color) -> Result<Player, ParseError> {
    let (name_tag, fide_tag, elo_tag, country_tag) = match colour {
        Color::White => ("White", "WhiteFideId", "WhiteElo", "WhiteFederation"),
        Color::Black => ("Black", "BlackFideId", "BlackElo", "BlackFederation"),
    };

    let full_name = tags.require(name_tag)?;
    let (last_name, first_name) = full_name
        .rsplit_once(',')
        .map(|(last, first)| (last.trim(), first.trim()))
        .filter(|(last, first)| !last.is_empty() && !first.is_empty())
        .ok_or_else(|| ParseError::InvalidPlayerName(full_name.to_string()))?;

    let fide_id = match tags.get(fide_tag).map(str::trim) {
        None | Some("") => None,
        Some(value) => Some(value.parse::<u32>().map_err(|_| ParseError::InvalidNumber {
            tag: fide_tag,
            value: value.to_string(),
        })?),
    };

    Ok(Player {
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
        colour,
        fide_id,
        elo: tags
            .get(elo_tag)
            .and_then(|value| value.trim().parse().ok())
            .unwrap_or(0),
        country: tags.get(country_tag).unwrap_or_default().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = r#"[Event "Spring Open"]
[Site "Melbourne"]
[Date "2022.05.14"]
[Round "6.1.3"]
[White "Carlsen, Magnus"]
[Black "Nepomniachtchi, Ian"]
[Result "*"]
[WhiteFideId "1503014"]
[BlackFideId "4168119"]
[WhiteElo "2864"]
[BlackFederation "FID"]

*
"#;

    #[test]
    fn round_board_only() {
        assert_eq!(
            parse_round_info("6").unwrap(),
            RoundInfo {
                round: None,
                game: None,
                board: 6
            }
        );
    }

    #[test]
    fn round_and_board() {
        assert_eq!(
            parse_round_info("6.1").unwrap(),
            RoundInfo {
                round: Some(6),
                game: None,
                board: 1
            }
        );
    }

    #[test]
    fn round_game_and_board() {
        assert_eq!(
            parse_round_info(" 6.1.3 ").unwrap(),
            RoundInfo {
                round: Some(6),
                game: Some(1),
                board: 3
            }
        );
    }

    #[test]
    fn round_rejects_bad_input() {
        for text in ["", "?", "abc", "6.", ".6", "6.1.3.2", "-1", "6.x"] {
            assert!(
                matches!(parse_round_info(text), Err(ParseError::InvalidRound(_))),
                "{text:?} should be rejected"
            );
        }
    }

    #[test]
    fn parses_full_header() {
        let info = parse_game_info(HEADER).unwrap();
        assert_eq!(info.name, "Spring Open");
        assert_eq!(info.site, "Melbourne");
        assert_eq!(info.date, NaiveDate::from_ymd_opt(2022, 5, 14));
        assert_eq!(info.round, Some(6));
        assert_eq!(info.game, Some(1));
        assert_eq!(info.board, Some(3));
        assert_eq!(info.result, "*");
        assert_eq!(info.source_pgn, HEADER);

        let white = info.player(Color::White);
        assert_eq!(white.first_name, "Magnus");
        assert_eq!(white.last_name, "Carlsen");
        assert_eq!(white.fide_id, Some(1503014));
        assert_eq!(white.elo, 2864);
        assert_eq!(white.country, "");

        let black = info.player(Color::Black);
        assert_eq!(black.first_name, "Ian");
        assert_eq!(black.last_name, "Nepomniachtchi");
        assert_eq!(black.colour, Color::Black);
        assert_eq!(black.elo, 0);
        assert_eq!(black.country, "FID");
    }

    #[test]
    fn optional_tags_default() {
        let pgn = "[Event \"E\"]\n[Round \"3\"]\n[White \"A, B\"]\n[Black \"C, D\"]\n";
        let info = parse_game_info(pgn).unwrap();
        assert_eq!(info.site, "");
        assert_eq!(info.date, None);
        assert_eq!(info.result, "*");
        assert_eq!(info.board, Some(3));
        assert_eq!(info.round, None);
        assert_eq!(info.players[0].fide_id, None);
    }

    #[test]
    fn unknown_date_is_none() {
        let pgn = "[Event \"E\"]\n[Date \"????.??.??\"]\n[Round \"1\"]\n[White \"A, B\"]\n[Black \"C, D\"]\n";
        assert_eq!(parse_game_info(pgn).unwrap().date, None);
    }

    #[test]
    fn rejects_empty_and_html() {
        assert!(matches!(parse_game_info(""), Err(ParseError::Empty)));
        assert!(matches!(parse_game_info("   \n"), Err(ParseError::Empty)));
        assert!(matches!(
            parse_game_info("<!DOCTYPE html><html><body>404</body></html>"),
            Err(ParseError::Html)
        ));
        assert!(matches!(
            parse_game_info("1. e4 e5 *"),
            Err(ParseError::NoHeaders)
        ));
    }

    #[test]
    fn rejects_missing_tags() {
        let pgn = "[Round \"1\"]\n[White \"A, B\"]\n[Black \"C, D\"]\n";
        assert!(matches!(
            parse_game_info(pgn),
            Err(ParseError::MissingTag("Event"))
        ));
        let pgn = "[Event \"E\"]\n[White \"A, B\"]\n[Black \"C, D\"]\n";
        assert!(matches!(
            parse_game_info(pgn),
            Err(ParseError::MissingTag("Round"))
        ));
        let pgn = "[Event \"E\"]\n[Round \"1\"]\n[White \"A, B\"]\n";
        assert!(matches!(
            parse_game_info(pgn),
            Err(ParseError::MissingTag("Black"))
        ));
    }

    #[test]
    fn rejects_unsplittable_names() {
        for name in ["Magnus Carlsen", ", Magnus", "Carlsen,", ""] {
            let pgn = format!(
                "[Event \"E\"]\n[Round \"1\"]\n[White \"{name}\"]\n[Black \"C, D\"]\n"
            );
            assert!(
                matches!(parse_game_info(&pgn), Err(ParseError::InvalidPlayerName(_))),
                "{name:?} should be rejected"
            );
        }
    }

    #[test]
    fn name_splits_on_last_comma() {
        let pgn = "[Event \"E\"]\n[Round \"1\"]\n[White \"van der Berg, Jr., Jan\"]\n[Black \"C, D\"]\n";
        let info = parse_game_info(pgn).unwrap();
        assert_eq!(info.players[0].last_name, "van der Berg, Jr.");
        assert_eq!(info.players[0].first_name, "Jan");
    }

    #[test]
    fn rejects_bad_fide_id() {
        let pgn = "[Event \"E\"]\n[Round \"1\"]\n[White \"A, B\"]\n[Black \"C, D\"]\n[BlackFideId \"abc\"]\n";
        assert!(matches!(
            parse_game_info(pgn),
            Err(ParseError::InvalidNumber {
                tag: "BlackFideId",
                ..
            })
        ));
    }

    #[test]
    fn escaped_quotes_in_values() {
        let pgn = r#"[Event "The \"Immortal\" Open"]
[Round "1"]
[White "O\\Neill, Pat"]
[Black "C, D"]
"#;
        let info = parse_game_info(pgn).unwrap();
        assert_eq!(info.name, r#"The "Immortal" Open"#);
        assert_eq!(info.player(Color::White).last_name, r"O\Neill");
        assert_eq!(escape(&info.name), r#"The \"Immortal\" Open"#);
        assert_eq!(escape(r"O\Neill"), r"O\\Neill");
    }

    #[test]
    fn tags_set_replaces_or_appends() {
        let mut tags = Tags::parse(HEADER).unwrap();
        tags.set("Result", "1-0");
        tags.set("Annotator", "Arbiter");
        assert_eq!(tags.get("Result"), Some("1-0"));
        let keys: Vec<&str> = tags.iter().map(|(k, _)| k).collect();
        assert_eq!(keys.first(), Some(&"Event"));
        assert_eq!(keys.last(), Some(&"Annotator"));
        assert_eq!(keys.iter().filter(|k| **k == "Result").count(), 1);
    }
}
