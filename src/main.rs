use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use sentiscope::cli;

#[derive(Debug, Parser)]
#[command(name = "sentiscope")]
#[command(about = "Terminal client for a sentiment-analysis backend")]
struct App {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Interactive session with panels, shortcuts and word clouds (default)
    Shell,
    /// Analyze a single text
    Analyze {
        /// Text to analyze
        #[arg(trailing_var_arg = true, required = true, allow_hyphen_values = true)]
        text: Vec<String>,
    },
    /// Analyze one text per line
    Batch {
        /// Read texts from this file instead of stdin
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Upload a CSV file whose first column holds the texts
    Upload {
        /// Path to a .csv file
        path: Option<PathBuf>,
    },
    /// Generate a word cloud image
    Wordcloud {
        /// One text per line; defaults to the stored history
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Show recent analyses
    History {
        /// Output format: table (default), json, csv
        #[arg(long, default_value = "table")]
        format: String,
        /// Only show the newest N entries
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Check backend reachability, config, history and log files
    Health,
    /// Inspect or edit configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Write a default ~/.sentiscope/config.toml
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Set a dotted key, e.g. `api.base_url http://host:5001`
    Set { key: String, value: String },
    /// Overwrite the global config with defaults
    Reset,
}

fn main() -> Result<()> {
    let app = App::parse();

    match app.command.unwrap_or(Commands::Shell) {
        Commands::Shell => cli::run_shell(),
        Commands::Analyze { text } => cli::run_analyze(&text.join(" ")),
        Commands::Batch { file } => cli::run_batch(file.as_deref()),
        Commands::Upload { path } => cli::run_upload(path),
        Commands::Wordcloud { file } => cli::run_wordcloud(file.as_deref()),
        Commands::History { format, limit } => {
            let fmt = cli::OutputFormat::from_str_opt(Some(&format));
            cli::run_history(fmt, limit)
        }
        Commands::Health => cli::run_health(),
        Commands::Config { action } => match action {
            ConfigAction::Show => cli::run_config_show(),
            ConfigAction::Init { force } => cli::run_config_init(force),
            ConfigAction::Set { key, value } => cli::run_config_set(&key, &value),
            ConfigAction::Reset => cli::run_config_reset(),
        },
    }
}
