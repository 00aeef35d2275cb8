//! Console front end for a hexagon bridge.
//!
//! ```text
//! hexbridge-console [config.json]
//! ```
//!
//! Reads commands from stdin and prints session events as JSON lines.
//! Logging goes to stderr and is controlled by `RUST_LOG`.

use hexbridge::prelude::*;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

const HELP: &str = "\
commands:
  /start <player> [seconds] [level]
  /change [level=N] [player=NAME] [time=SECONDS]
  /end | /abort | /status | /quit
  <sender>: <text>     chat line";

// ---------------------------------------------------------------------------
// Command parsing
// ---------------------------------------------------------------------------

#[derive(Debug, PartialEq)]
enum Command {
    Start {
        player: String,
        game_time: Option<i32>,
        level: Option<u8>,
    },
    Change {
        level: Option<u8>,
        player: Option<String>,
        game_time: Option<i32>,
    },
    End {
        abort: bool,
    },
    Status,
    Quit,
    Chat {
        sender: String,
        text: String,
    },
}

fn parse_command(line: &str) -> Result<Command, String> {
    let line = line.trim();
    let Some(rest) = line.strip_prefix('/') else {
        let (sender, text) = line
            .split_once(':')
            .ok_or_else(|| "expected a /command or `sender: text`".to_owned())?;
        return Ok(Command::Chat {
            sender: sender.trim().to_owned(),
            text: text.trim_start().to_owned(),
        });
    };

    let mut words = rest.split_whitespace();
    match words.next() {
        Some("start") => {
            let player = words.next().ok_or("missing player name")?.to_owned();
            let game_time = words.next().map(parse_number::<i32>).transpose()?;
            let level = words.next().map(parse_number::<u8>).transpose()?;
            Ok(Command::Start {
                player,
                game_time,
                level,
            })
        }
        Some("change") => {
            let mut change = (None, None, None);
            for word in words {
                match word.split_once('=') {
                    Some(("level", v)) => change.0 = Some(parse_number::<u8>(v)?),
                    Some(("player", v)) => change.1 = Some(v.to_owned()),
                    Some(("time", v)) => change.2 = Some(parse_number::<i32>(v)?),
                    _ => return Err(format!("unknown change parameter `{word}`")),
                }
            }
            Ok(Command::Change {
                level: change.0,
                player: change.1,
                game_time: change.2,
            })
        }
        Some("end") => Ok(Command::End { abort: false }),
        Some("abort") => Ok(Command::End { abort: true }),
        Some("status") => Ok(Command::Status),
        Some("quit") => Ok(Command::Quit),
        Some(other) => Err(format!("unknown command /{other}")),
        None => Err("empty command".into()),
    }
}

fn parse_number<T: std::str::FromStr>(word: &str) -> Result<T, String> {
    word.parse().map_err(|_| format!("`{word}` is not a valid number"))
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => load_config(path)?,
        None => BridgeConfig::new("127.0.0.1", 4242),
    };
    let (bridge, mut events) = Hexbridge::builder().config(config).start_with_channel()?;

    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match serde_json::to_string(&event) {
                Ok(json) => println!("{json}"),
                Err(e) => tracing::warn!(error = %e, "cannot encode event"),
            }
        }
    });

    eprintln!("{HELP}");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let command = match parse_command(&line) {
            Ok(command) => command,
            Err(e) => {
                eprintln!("{e}\n{HELP}");
                continue;
            }
        };
        let result = match command {
            Command::Start {
                player,
                game_time,
                level,
            } => bridge.start_round(player, game_time, level).await,
            Command::Change {
                level,
                player,
                game_time,
            } => bridge.change_round(level, player, game_time).await,
            Command::End { abort } => bridge.end_round(abort).await,
            Command::Status => bridge.info().await.map(|info| {
                match serde_json::to_string(&info) {
                    Ok(json) => println!("{json}"),
                    Err(e) => tracing::warn!(error = %e, "cannot encode status"),
                }
            }),
            Command::Chat { sender, text } => bridge.chat_message(sender, text).await,
            Command::Quit => break,
        };
        if let Err(e) = result {
            eprintln!("error: {e}");
        }
    }

    bridge.shutdown().await?;
    Ok(())
}
