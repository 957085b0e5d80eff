//! Binary entrypoint for the jielong CLI.
//!
//! Commands:
//! - `start` - run the bot, reading `user_id<TAB>text` lines from stdin and writing replies to stdout
//! - `init` - create a starter `config.toml` and word list
//! - `status [--json]` - print dictionary size, stored sessions, policies and counters
//! - `say <user> <text>` - route a single message and print the reply
//!
//! See the library crate docs for module-level details: `jielong::`.
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::{info, warn};
use std::path::Path;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use jielong::bot::{ChatBot, ConsoleSink, IncomingMessage, RecordingSink};
use jielong::config::Config;
use jielong::dictionary::WordListFile;

/// User id for stdin lines that carry no `user_id<TAB>` prefix.
const CONSOLE_USER: &str = "console";

const STARTER_WORDS: &[&str] = &[
    "開花結果",
    "果實纍纍",
    "天長地久",
    "久而久之",
    "一心一意",
    "意氣風發",
    "發揚光大",
    "大公無私",
    "私心雜念",
    "念念不忘",
    "忘恩負義",
    "義不容辭",
    "辭舊迎新",
    "新陳代謝",
    "謝天謝地",
    "地大物博",
    "博大精深",
    "深入淺出",
    "出口成章",
    "自強不息",
    "息息相關",
    "關懷備至",
];

#[derive(Parser)]
#[command(name = "jielong")]
#[command(about = "A Chinese word-chain (接龍) chat bot")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (can be used before or after subcommand)
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: String,

    /// Verbose logging (-v, -vv for more; may appear before or after subcommand)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the bot on stdin/stdout
    Start,
    /// Create a default configuration and starter word list
    Init,
    /// Show dictionary, session and policy status
    Status {
        /// Print machine-readable JSON
        #[arg(long)]
        json: bool,
    },
    /// Send one message as a user and print the bot's reply
    Say {
        /// Platform user id
        user: String,
        /// Message text
        text: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Commands::Init = cli.command {
        init_logging(&None, cli.verbose);
        return init(&cli.config).await;
    }

    let config = Config::load(&cli.config).await?;
    init_logging(&Some(config.clone()), cli.verbose);

    match cli.command {
        Commands::Start => {
            info!("Starting jielong v{}", env!("CARGO_PKG_VERSION"));
            let bot = Arc::new(ChatBot::new(config, Arc::new(ConsoleSink))?);
            let (tx, rx) = mpsc::unbounded_channel();
            tokio::spawn(read_stdin(tx));
            bot.run(rx).await?;
        }
        Commands::Status { json } => {
            let bot = ChatBot::new(config, Arc::new(RecordingSink::new()))?;
            if json {
                println!("{}", bot.status_json()?);
            } else {
                bot.show_status()?;
            }
        }
        Commands::Say { user, text } => {
            let bot = ChatBot::new(config, Arc::new(RecordingSink::new()))?;
            let reply = bot
                .route_text_event(IncomingMessage::new(user, text))
                .await?;
            println!("{}", reply);
        }
        // Handled before the config is loaded
        Commands::Init => {}
    }
    Ok(())
}

async fn init(config_path: &str) -> Result<()> {
    info!("Initializing new jielong configuration");
    if Path::new(config_path).exists() {
        warn!("{} already exists; leaving it untouched", config_path);
    } else {
        Config::create_default(config_path).await?;
        info!("Configuration file created at {}", config_path);
    }
    let config = Config::load(config_path).await?;

    let words = WordListFile::new(&config.dictionary.words_file);
    if words.create_with(STARTER_WORDS)? {
        info!(
            "Starter word list ({} words) written to {}",
            STARTER_WORDS.len(),
            words.path().display()
        );
    } else {
        info!("Word list {} already exists", words.path().display());
    }

    tokio::fs::create_dir_all(&config.storage.data_dir)
        .await
        .with_context(|| format!("failed to create data dir {}", config.storage.data_dir))?;
    Ok(())
}

/// Feed stdin lines to the bot until EOF. A line is `user_id<TAB>text`, or bare text from
/// [`CONSOLE_USER`].
async fn read_stdin(tx: mpsc::UnboundedSender<IncomingMessage>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if line.trim().is_empty() {
                    continue;
                }
                let msg = match line.split_once('\t') {
                    Some((user, text)) => IncomingMessage::new(user, text),
                    None => IncomingMessage::new(CONSOLE_USER, line),
                };
                if tx.send(msg).is_err() {
                    break;
                }
            }
            Ok(None) => break,
            Err(e) => {
                warn!("stdin read failed: {}", e);
                break;
            }
        }
    }
}

fn init_logging(config: &Option<Config>, verbosity: u8) {
    use std::io::Write;
    let mut builder = env_logger::Builder::new();
    // -v overrides the configured level
    let base_level = match verbosity {
        0 => config
            .as_ref()
            .and_then(|c| c.logging.level.parse::<log::LevelFilter>().ok())
            .unwrap_or(log::LevelFilter::Info),
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    builder.filter_level(base_level);

    let log_file = config
        .as_ref()
        .and_then(|c| c.logging.file.as_ref())
        .and_then(|file| {
            std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(file)
                .ok()
        });

    if let Some(f) = log_file {
        let write_mutex = std::sync::Arc::new(std::sync::Mutex::new(f));
        // Mirror to the console only in the foreground
        let is_tty = atty::is(atty::Stream::Stdout);
        builder.format(move |fmt, record| {
            let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
            let line = format!("{} [{}] {}", ts, record.level(), record.args());
            if let Ok(mut guard) = write_mutex.lock() {
                let _ = writeln!(guard, "{}", line);
            }
            if is_tty {
                writeln!(fmt, "{}", line)
            } else {
                Ok(())
            }
        });
    } else {
        builder.format(|fmt, record| {
            let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
            writeln!(fmt, "{} [{}] {}", ts, record.level(), record.args())
        });
    }
    let _ = builder.try_init();
}
