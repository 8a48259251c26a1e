//! `xfchess-session` - terminal client for a remotely validated chess game

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use shakmaty::Square;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use xfchess_session::core::config::{parse_base_url, AI_URL_VAR, API_URL_VAR};
use xfchess_session::game::ai::GameMode;
use xfchess_session::game::types::{AIDifficulty, MoveAttempt, PieceColor};
use xfchess_session::{ClientConfig, SessionController};

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum ModeArg {
    Local,
    Ai,
}

#[derive(Parser, Debug)]
#[command(name = "xfchess-session", version, about = "Play chess against the XFChess game service")]
struct Cli {
    /// Game mode for the first game
    #[arg(long, value_enum, default_value_t = ModeArg::Ai)]
    mode: ModeArg,

    /// AI strength (easy, medium, hard)
    #[arg(long, default_value = "medium")]
    difficulty: AIDifficulty,

    /// Color played by the AI (overrides XFCHESS_AI_COLOR)
    #[arg(long)]
    ai_color: Option<PieceColor>,

    /// Game service gateway (overrides XFCHESS_API_URL)
    #[arg(long)]
    api_url: Option<String>,

    /// AI service (overrides XFCHESS_AI_URL)
    #[arg(long)]
    ai_url: Option<String>,

    /// Request timeout in seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Player id sent when creating games
    #[arg(long)]
    player_id: Option<String>,
}

const HELP: &str = "\
Commands:
  e2e4 | e7e8q     submit a move
  undo             show the previous position (local only)
  resync           return to the current position
  flip             flip the board orientation
  refresh          reload the game from the server
  resign           resign for the side to move
  retry            retry a stalled AI move
  moves [square]   list legal moves
  log              show the move history
  hint             ask the AI for a suggestion
  new [local|ai]   start a new game
  show             print the current state
  quit             exit";

fn load_config(cli: &Cli) -> Result<ClientConfig> {
    let mut config = ClientConfig::from_env().context("invalid environment configuration")?;
    if let Some(url) = &cli.api_url {
        config.api_url = parse_base_url(API_URL_VAR, url)?;
        if cli.ai_url.is_none() && std::env::var(AI_URL_VAR).is_err() {
            config.ai_url = config.api_url.clone();
        }
    }
    if let Some(url) = &cli.ai_url {
        config.ai_url = parse_base_url(AI_URL_VAR, url)?;
    }
    if let Some(secs) = cli.timeout_secs {
        config.request_timeout = std::time::Duration::from_secs(secs);
    }
    if let Some(id) = &cli.player_id {
        config.player_id = id.clone();
    }
    if let Some(color) = cli.ai_color {
        config.ai_color = color;
    }
    Ok(config)
}

fn mode_for(config: &ClientConfig, mode: ModeArg, difficulty: AIDifficulty) -> GameMode {
    match mode {
        ModeArg::Local => GameMode::Local,
        ModeArg::Ai => config.vs_ai(difficulty),
    }
}

fn print_state(controller: &SessionController) {
    let view = controller.view();
    println!("{}", view.message);
    match (&view.session, &view.displayed) {
        (Some(session), Some(displayed)) => {
            let rewound = if view.is_rewound() {
                format!(" [viewing {} move(s) back]", view.rewound_depth)
            } else {
                String::new()
            };
            println!(
                "  game {} | {} to move | {} | board: {:?}{}",
                session.session_id.short(),
                session.turn,
                session.status,
                view.orientation,
                rewound
            );
            println!("  {}", displayed);
        }
        _ => println!("  no game in progress"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;
    tracing::info!(
        "[SESSION] Game service {}, AI service {}",
        config.api_url,
        config.ai_url
    );

    let controller =
        SessionController::from_config(&config).context("failed to set up HTTP clients")?;
    let mut mode = mode_for(&config, cli.mode, cli.difficulty);

    if let Err(err) = controller.create(mode).await {
        eprintln!("{}", err);
    }
    print_state(&controller);
    println!("{}", HELP);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let mut words = line.split_whitespace();
        let Some(command) = words.next() else {
            continue;
        };
        let arg = words.next();

        match command {
            "quit" | "exit" => break,
            "help" => println!("{}", HELP),
            "show" => {}
            "undo" => {
                if let Err(err) = controller.undo() {
                    println!("{}", err);
                }
            }
            "resync" => {
                controller.resync();
            }
            "flip" => {
                controller.flip_orientation();
            }
            "refresh" => {
                if let Err(err) = controller.refresh().await {
                    println!("{}", err);
                }
            }
            "resign" => match controller.session() {
                Some(session) => {
                    if let Err(err) = controller.resign(session.turn).await {
                        println!("{}", err);
                    }
                }
                None => println!("no game in progress"),
            },
            "retry" => {
                if let Err(err) = controller.retry_ai_move().await {
                    println!("{}", err);
                }
            }
            "moves" => {
                let square = match arg.map(str::parse::<Square>) {
                    None => None,
                    Some(Ok(square)) => Some(square),
                    Some(Err(_)) => {
                        println!("not a square: {}", arg.unwrap_or_default());
                        continue;
                    }
                };
                match controller.valid_moves(square).await {
                    Ok(moves) => {
                        let list: Vec<String> = moves.iter().map(MoveAttempt::uci).collect();
                        println!("{} legal move(s): {}", list.len(), list.join(" "));
                    }
                    Err(err) => println!("{}", err),
                }
                continue;
            }
            "log" => {
                match controller.move_log().await {
                    Ok(records) => {
                        for (i, record) in records.iter().enumerate() {
                            let san = record.san.as_deref().unwrap_or("");
                            println!("  {:>3}. {}{} {}", i + 1, record.from, record.to, san);
                        }
                    }
                    Err(err) => println!("{}", err),
                }
                continue;
            }
            "hint" => {
                match controller.hint().await {
                    Ok(hint) => println!(
                        "hint: {}{}",
                        hint.attempt,
                        hint.san.map(|san| format!(" ({})", san)).unwrap_or_default()
                    ),
                    Err(err) => println!("{}", err),
                }
                continue;
            }
            "new" => {
                let next = match arg {
                    Some("local") => ModeArg::Local,
                    Some("ai") => ModeArg::Ai,
                    _ => {
                        if mode.is_vs_ai() {
                            ModeArg::Ai
                        } else {
                            ModeArg::Local
                        }
                    }
                };
                mode = mode_for(&config, next, cli.difficulty);
                if let Err(err) = controller.new_game(mode).await {
                    println!("{}", err);
                }
            }
            text => match text.parse::<MoveAttempt>() {
                Ok(attempt) => {
                    if let Err(err) = controller.submit(attempt).await {
                        println!("{}", err);
                    }
                }
                Err(err) => {
                    println!("{} (type `help` for commands)", err);
                    continue;
                }
            },
        }
        print_state(&controller);
    }

    controller.dispose();
    Ok(())
}
