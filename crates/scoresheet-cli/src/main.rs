//! Scoresheet - records a chess game from the command line.
//!
//! Reads the pairing from a PGN header, replays scoresheet tokens through a
//! recording session and prints the board, the move list and the game record.

mod tokens;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use scoresheet::{
    AppMode, Intent, JsonFileStore, MoveOutcome, MoveRow, RecordingSession, ScoresheetConfig,
    SessionStore,
};
use scoresheet_core::{Color, Ply};
use scoresheet_rules::{parse_game_info, PgnWriter, StandardRules};
use std::path::{Path, PathBuf};
use tokens::Token;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "scoresheet")]
#[command(about = "Chess scoresheet recorder")]
struct Cli {
    /// Path to the config file
    #[arg(long, default_value = "scoresheet.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the pairing read from a PGN header
    Info {
        /// PGN file with the game header
        pgn: PathBuf,
    },
    /// Record a new game
    Record {
        /// PGN file with the game header
        pgn: PathBuf,
        #[command(flatten)]
        play: PlayArgs,
    },
    /// Continue the stored game
    Resume {
        /// PGN file with the game header
        pgn: PathBuf,
        #[command(flatten)]
        play: PlayArgs,
    },
}

#[derive(clap::Args)]
struct PlayArgs {
    /// Tokens: e2e4, e7e8q, skip, draw, undo, redo, edit:N, time:N:H:MM
    #[arg(long, default_value = "")]
    plies: String,

    /// End the game with this result
    #[arg(long)]
    winner: Option<Winner>,
}

#[derive(Clone, Copy, ValueEnum)]
enum Winner {
    White,
    Black,
    Draw,
}

impl Winner {
    fn color(self) -> Option<Color> {
        match self {
            Winner::White => Some(Color::White),
            Winner::Black => Some(Color::Black),
            Winner::Draw => None,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = ScoresheetConfig::load_from(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Info { pgn } => info(&pgn),
        Commands::Record { pgn, play } => {
            let mut mode = pairing(&pgn)?;
            mode.start_recording(StandardRules, chrono::Utc::now())?;
            record(mode, &config, &play)
        }
        Commands::Resume { pgn, play } => {
            let store = JsonFileStore::new(&config.session_path);
            let Some(snapshot) = store.load_session()? else {
                bail!("no stored session at {}", config.session_path.display());
            };
            let mut mode = pairing(&pgn)?;
            mode.resume(StandardRules, snapshot)?;
            record(mode, &config, &play)
        }
    }
}

fn read_pgn(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

fn pairing(path: &Path) -> anyhow::Result<AppMode> {
    let mut mode = AppMode::default();
    mode.load_pgn(&read_pgn(path)?)?;
    Ok(mode)
}

fn info(path: &Path) -> anyhow::Result<()> {
    let info = parse_game_info(&read_pgn(path)?)?;
    println!("Event:  {}", info.name);
    if !info.site.is_empty() {
        println!("Site:   {}", info.site);
    }
    if let Some(date) = info.date {
        println!("Date:   {}", date);
    }
    let number = |n: Option<u32>| n.map_or("-".to_string(), |n| n.to_string());
    println!(
        "Round:  {}  Board: {}  Game: {}",
        number(info.round),
        number(info.board),
        number(info.game)
    );
    for player in &info.players {
        let mut line = format!("{:<6}  {}", player.colour.to_string(), player.pgn_name());
        if player.elo > 0 {
            line.push_str(&format!(" ({})", player.elo));
        }
        if !player.country.is_empty() {
            line.push_str(&format!(" {}", player.country));
        }
        println!("{}", line);
    }
    println!("Result: {}", info.result);
    Ok(())
}

fn record(mut mode: AppMode, config: &ScoresheetConfig, play: &PlayArgs) -> anyhow::Result<()> {
    for (i, token) in tokens::parse_tokens(&play.plies)?.into_iter().enumerate() {
        apply_token(&mut mode, token).with_context(|| format!("token {} ({:?})", i + 1, token))?;
    }

    let Some(session) = mode.session() else {
        bail!("not recording");
    };
    print_session(session);

    let mut store = JsonFileStore::new(&config.session_path);
    match play.winner {
        Some(winner) => {
            let writer = PgnWriter::new(config.pgn_line_width);
            mode.end_game(winner.color(), &mut store, &writer)?;
            if let AppMode::ResultDisplay { pgn, .. } = &mode {
                println!();
                print!("{}", pgn);
            }
        }
        None => {
            if let Err(e) = store.store_session(&session.snapshot()) {
                tracing::warn!(error = %e, "could not store session");
            }
        }
    }
    Ok(())
}

fn apply_token(mode: &mut AppMode, token: Token) -> anyhow::Result<()> {
    match token {
        Token::Move {
            from,
            to,
            promotion,
        } => match (mode.request_move(from, to)?, promotion) {
            (MoveOutcome::Committed, None) => {}
            (MoveOutcome::Committed, Some(piece)) => {
                tracing::warn!(%from, %to, %piece, "not a promotion, piece ignored");
            }
            (MoveOutcome::AwaitingPromotion, Some(piece)) => mode.choose_promotion(piece)?,
            (MoveOutcome::AwaitingPromotion, None) => {
                mode.cancel_promotion()?;
                bail!("{}{} promotes, add the piece letter (e.g. {}{}q)", from, to, from, to);
            }
        },
        Token::Skip => mode.apply(Intent::SkipTurn)?,
        Token::Draw => {
            let last = mode
                .session()
                .and_then(|s| s.history().len().checked_sub(1));
            let Some(index) = last else {
                bail!("no ply to offer a draw on");
            };
            mode.apply(Intent::ToggleDrawOffer { index })?;
        }
        Token::Undo => {
            if !mode.undo()? {
                tracing::warn!("nothing to undo");
            }
        }
        Token::Redo => {
            if !mode.redo()? {
                tracing::warn!("nothing to redo");
            }
        }
        Token::Edit(index) => mode.apply(Intent::EditMove { index })?,
        Token::Time { index, time } => mode.apply(Intent::SetRecordedTime {
            index,
            time: Some(time),
        })?,
    }
    Ok(())
}

fn print_session(session: &RecordingSession) {
    let views = session.views();
    println!("{}", views.board.to_ascii());
    for row in &views.rows {
        println!("{}", format_row(row));
    }
    println!("{} to move (move {})", views.to_move, views.move_number);
}

fn format_row(row: &MoveRow) -> String {
    let black = row.black.as_ref().map(ply_text).unwrap_or_default();
    format!("{:>3}. {:<24} {}", row.move_no, ply_text(&row.white), black)
        .trim_end()
        .to_string()
}

fn ply_text(ply: &Ply) -> String {
    let mut text = match ply {
        Ply::Move(m) => m.notation.clone(),
        Ply::Skip(_) => "--".to_string(),
    };
    if ply.draw_offer() {
        text.push_str(" (=)");
    }
    if let Some(time) = ply.recorded_time() {
        text.push_str(&format!(" [{}]", time));
    }
    text
}
