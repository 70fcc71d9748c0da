//! quizline CLI: the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "quizline",
    version,
    about = "Timed trivia with character powers and a local leaderboard"
)]
struct Cli {
    /// Config file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Attempt store file (overrides the config)
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a quiz in the terminal
    Play {
        /// Your name
        #[arg(long)]
        name: String,

        /// Character: astronaut, wizard, knight, dragon-tamer, detective
        #[arg(long)]
        character: Option<String>,

        /// Question bank TOML file (default: built-in bank)
        #[arg(long)]
        bank: Option<PathBuf>,

        /// Shuffle seed for a reproducible question order
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Show the leaderboard
    Leaderboard {
        /// Only the top N rows
        #[arg(long)]
        limit: Option<usize>,

        /// Sort field: score, date
        #[arg(long, default_value = "score")]
        sort: String,

        /// Lowest first
        #[arg(long)]
        ascending: bool,

        /// Output format: text, json, markdown, html
        #[arg(long, default_value = "text")]
        format: String,

        /// Write to a file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// List attempts completed within a date range
    History {
        /// Start (RFC 3339 or YYYY-MM-DD), inclusive
        #[arg(long)]
        since: Option<String>,

        /// End (RFC 3339 or YYYY-MM-DD), inclusive
        #[arg(long)]
        until: Option<String>,
    },

    /// Change the name on a stored attempt
    Rename {
        #[arg(long)]
        id: u64,

        #[arg(long)]
        name: String,
    },

    /// Delete a stored attempt
    Delete {
        #[arg(long)]
        id: u64,
    },

    /// Remove attempts older than the retention period
    Prune {
        /// Retention in days (default from config)
        #[arg(long)]
        retention_days: Option<u32>,
    },

    /// Remove every stored attempt
    Clear {
        /// Confirm the wipe
        #[arg(long)]
        yes: bool,
    },

    /// Validate question bank TOML files
    Validate {
        /// Bank file or directory (default: built-in bank)
        #[arg(long)]
        bank: Option<PathBuf>,
    },

    /// List the characters and their powers
    Characters,

    /// Create starter config and an example question bank
    Init,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("quizline=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();
    let config = cli.config;
    let store = cli.store;

    let result = match cli.command {
        Commands::Play {
            name,
            character,
            bank,
            seed,
        } => commands::play::execute(config, store, name, character, bank, seed).await,
        Commands::Leaderboard {
            limit,
            sort,
            ascending,
            format,
            output,
        } => {
            commands::leaderboard::execute(config, store, limit, sort, ascending, format, output)
                .await
        }
        Commands::History { since, until } => {
            commands::history::execute(config, store, since, until).await
        }
        Commands::Rename { id, name } => {
            commands::manage::rename(config, store, id, name).await
        }
        Commands::Delete { id } => commands::manage::delete(config, store, id).await,
        Commands::Prune { retention_days } => {
            commands::manage::prune(config, store, retention_days).await
        }
        Commands::Clear { yes } => commands::manage::clear(config, store, yes).await,
        Commands::Validate { bank } => commands::validate::execute(bank),
        Commands::Characters => commands::characters::execute(),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
