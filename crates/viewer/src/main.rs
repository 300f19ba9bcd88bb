use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::{interval_at, Instant, Interval};
use tracing_subscriber::EnvFilter;

use engine_session::{AnalysisEvent, AnalysisHandle, AnalysisSession, Completion, EngineAnalysis};
use pgn_core::{format_moves_for_display, NavigationUpdate};
use pgn_viewer::clients::{fetch_pgn, http_client, ChessComClient, LichessClient, PlatformGame};
use pgn_viewer::{Document, ViewerConfig, SAMPLE_PGN};

#[derive(Parser)]
#[command(name = "pgn-viewer")]
#[command(about = "Step through PGN games with live engine analysis")]
#[command(version = "0.1.0")]
struct Cli {
    /// PGN file to open
    #[arg(value_name = "FILE")]
    file: Option<PathBuf>,

    /// Download PGN text from a URL
    #[arg(long, conflicts_with = "file")]
    url: Option<String>,

    /// Import recent games of a Lichess user
    #[arg(long, value_name = "USER", conflicts_with_all = ["file", "url"])]
    lichess: Option<String>,

    /// Import a monthly archive of a Chess.com user
    #[arg(
        long = "chess-com",
        value_name = "USER",
        conflicts_with_all = ["file", "url", "lichess"]
    )]
    chess_com: Option<String>,

    /// Open the built-in sample game
    #[arg(long, conflicts_with_all = ["file", "url", "lichess", "chess_com"])]
    sample: bool,

    /// Archive month for --chess-com (defaults to the current month)
    #[arg(long, value_name = "YYYY-MM")]
    month: Option<String>,

    /// Number of games to import from Lichess
    #[arg(long, default_value = "20")]
    max_games: usize,

    /// Game to open first (0-based)
    #[arg(short, long, default_value = "0")]
    game: usize,

    /// Search depth (overrides ANALYSIS_DEPTH)
    #[arg(short, long)]
    depth: Option<u32>,

    /// Run without an engine
    #[arg(long)]
    no_engine: bool,

    /// Delay between moves when auto-playing
    #[arg(long, value_name = "MS", default_value = "1000")]
    play_interval_ms: u64,
}

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Next,
    Prev,
    Start,
    End,
    Ply(isize),
    Game(usize),
    Games,
    Moves,
    Pgn,
    Play,
    Help,
    Quit,
}

impl Command {
    fn parse(line: &str) -> Option<Self> {
        let mut parts = line.split_whitespace();
        let command = match (parts.next()?, parts.next()) {
            ("n", None) => Command::Next,
            ("p", None) => Command::Prev,
            ("s", None) => Command::Start,
            ("e", None) => Command::End,
            ("g", Some(ply)) => Command::Ply(ply.parse().ok()?),
            ("game", Some(index)) => Command::Game(index.parse().ok()?),
            ("games", None) => Command::Games,
            ("moves", None) => Command::Moves,
            ("pgn", None) => Command::Pgn,
            ("play", None) => Command::Play,
            ("h" | "help", None) => Command::Help,
            ("q" | "quit", None) => Command::Quit,
            _ => return None,
        };
        Some(command)
    }
}

const HELP: &str = "\
n           next move
p           previous move
s / e       start / end of game
g <ply>     jump to ply (-1 is the starting position)
game <i>    open game i
games       list games
moves       show the move list
pgn         print the game as PGN
play        start or stop auto-play
q           quit";

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();
    let config = ViewerConfig::from_env();

    let text = load_source(&cli, &config).await?;
    let mut doc = Document::load(&text).context("Failed to parse PGN")?;
    tracing::info!(games = doc.games().len(), "Document loaded");
    for (index, error) in doc.check_games() {
        tracing::warn!(game = index, %error, "Game stops early");
    }

    if cli.game != 0 && doc.select_game(cli.game).is_none() {
        bail!("Game {} out of range (document has {})", cli.game, doc.games().len());
    }

    let depth = cli.depth.unwrap_or(config.engine.analysis_depth).max(1);
    let mut engine = if cli.no_engine {
        None
    } else {
        match AnalysisSession::spawn(&config.engine).await {
            Ok(session) => Some(session),
            Err(e) => {
                tracing::warn!("Engine unavailable, continuing without analysis: {e}");
                None
            }
        }
    };

    print_games(&doc);
    let update = doc.go_to_start();
    show(&doc, &update);
    let mut pending = start_analysis(&mut engine, &doc, depth);

    let play_step = Duration::from_millis(cli.play_interval_ms.max(1));
    let mut autoplay: Option<Interval> = None;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if line.trim().is_empty() {
                    continue;
                }
                let Some(command) = Command::parse(&line) else {
                    println!("Unknown command, type 'help'");
                    continue;
                };

                let before = doc.current_fen().to_string();
                let update = match command {
                    Command::Next => doc.step_forward(),
                    Command::Prev => doc.step_backward(),
                    Command::Start => doc.go_to_start(),
                    Command::End => doc.go_to_end(),
                    Command::Ply(ply) => doc.go_to_ply(ply),
                    Command::Game(index) => match doc.select_game(index) {
                        Some(update) => {
                            autoplay = None;
                            print_title(&doc);
                            update
                        }
                        None => {
                            println!("No game {index}");
                            continue;
                        }
                    },
                    Command::Games => {
                        print_games(&doc);
                        continue;
                    }
                    Command::Moves => {
                        print_moves(&doc);
                        continue;
                    }
                    Command::Pgn => {
                        println!("{}", doc.selected().to_pgn());
                        continue;
                    }
                    Command::Play => {
                        autoplay = match autoplay {
                            Some(_) => None,
                            None => Some(interval_at(Instant::now() + play_step, play_step)),
                        };
                        continue;
                    }
                    Command::Help => {
                        println!("{HELP}");
                        continue;
                    }
                    Command::Quit => break,
                };

                show(&doc, &update);
                if update.fen != before || (pending.is_none() && doc.analysis().is_none()) {
                    pending = start_analysis(&mut engine, &doc, depth);
                }
            }
            _ = next_tick(&mut autoplay) => match doc.play_step() {
                Some(update) => {
                    show(&doc, &update);
                    if update.malformed.is_none() {
                        pending = start_analysis(&mut engine, &doc, depth);
                    }
                }
                None => {
                    println!("Auto-play stopped");
                    autoplay = None;
                }
            },
            Some(event) = next_event(&mut pending) => match event {
                AnalysisEvent::Progress(analysis) => {
                    if doc.apply_analysis(analysis) {
                        print_analysis(doc.analysis(), "…");
                    }
                }
                AnalysisEvent::Finished(outcome) => {
                    pending = None;
                    match outcome.completion {
                        Completion::Complete | Completion::TimedOut => {
                            if doc.apply_analysis(outcome.analysis) {
                                let tag = if outcome.completion == Completion::TimedOut {
                                    "(timed out)"
                                } else {
                                    ""
                                };
                                print_analysis(doc.analysis(), tag);
                            }
                        }
                        Completion::Crashed => {
                            println!("Engine stopped responding; restart to analyse again");
                            engine = None;
                        }
                        Completion::Unavailable => tracing::debug!("Engine not ready"),
                        Completion::Superseded | Completion::Cancelled => {}
                    }
                }
            },
        }
    }

    if let Some(session) = engine {
        session.shutdown().await?;
    }
    Ok(())
}

async fn load_source(cli: &Cli, config: &ViewerConfig) -> Result<String> {
    if cli.sample {
        return Ok(SAMPLE_PGN.to_string());
    }

    if let Some(path) = &cli.file {
        return tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()));
    }

    let client = http_client(config)?;

    if let Some(url) = &cli.url {
        return Ok(fetch_pgn(&client, url).await?);
    }

    let games: Vec<PlatformGame> = if let Some(user) = &cli.lichess {
        LichessClient::new(client)
            .fetch_user_games(user, cli.max_games)
            .await?
    } else if let Some(user) = &cli.chess_com {
        let (year, month) = match &cli.month {
            Some(month) => parse_month(month)?,
            None => (None, None),
        };
        ChessComClient::new(client)
            .fetch_user_games(user, year, month)
            .await?
    } else {
        bail!("Nothing to open: pass a FILE, --sample, --url, --lichess or --chess-com");
    };

    if games.is_empty() {
        bail!("No games found");
    }
    Ok(games
        .iter()
        .map(|g| g.pgn.trim())
        .collect::<Vec<_>>()
        .join("\n\n"))
}

fn parse_month(value: &str) -> Result<(Option<i32>, Option<u32>)> {
    let (year, month) = value
        .split_once('-')
        .context("Month must look like YYYY-MM")?;
    let year: i32 = year.parse().context("Invalid year")?;
    let month: u32 = month.parse().context("Invalid month")?;
    if !(1..=12).contains(&month) {
        bail!("Month must be between 1 and 12");
    }
    Ok((Some(year), Some(month)))
}

fn start_analysis(
    engine: &mut Option<AnalysisSession>,
    doc: &Document,
    depth: u32,
) -> Option<AnalysisHandle> {
    engine
        .as_mut()
        .map(|session| session.analyze(doc.current_fen(), depth))
}

async fn next_event(pending: &mut Option<AnalysisHandle>) -> Option<AnalysisEvent> {
    match pending {
        Some(handle) => handle.next().await,
        None => std::future::pending().await,
    }
}

async fn next_tick(autoplay: &mut Option<Interval>) {
    match autoplay {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}

fn print_games(doc: &Document) {
    for (i, game) in doc.games().iter().enumerate() {
        let marker = if i == doc.selected_index() { '>' } else { ' ' };
        println!("{marker} {i:>3}  {}", game.title());
    }
}

fn print_title(doc: &Document) {
    println!("{}", doc.selected().title());
}

fn print_moves(doc: &Document) {
    let line = format_moves_for_display(doc.selected().moves())
        .iter()
        .map(|pair| {
            let white = pair.white.as_deref().unwrap_or("...");
            match &pair.black {
                Some(black) => format!("{}. {white} {black}", pair.number),
                None => format!("{}. {white}", pair.number),
            }
        })
        .collect::<Vec<_>>()
        .join(" ");
    println!("{line} {}", doc.selected().result());
}

fn show(doc: &Document, update: &NavigationUpdate) {
    let total = doc.selected().moves().len();
    match &update.last_move {
        Some(mv) => println!("[{}/{}] {} ({})", update.ply + 1, total, mv.san, mv.uci),
        None => println!("[0/{total}] start"),
    }
    println!("  {}", update.fen);
    if let Some(malformed) = &update.malformed {
        println!("  ! malformed game: {malformed}");
    }
    if let Some(opening) = doc.opening() {
        println!("  {} {}", opening.eco, opening.name);
    }
}

fn print_analysis(analysis: Option<&EngineAnalysis>, tag: &str) {
    let Some(a) = analysis else {
        return;
    };
    let score = match a.mate_distance {
        Some(n) => format!("#{n}"),
        None => format!("{:+.2}", a.evaluation),
    };
    println!(
        "  depth {:>2}  {score:>7}  {}  {} {tag}",
        a.depth,
        a.best_move,
        a.principal_variation.join(" ")
    );
}
