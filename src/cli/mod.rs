//! CLI command implementations.
//!
//! Provides subcommand handlers for:
//! - `sentiscope shell` — interactive session (the default)
//! - `sentiscope analyze <text>` — analyze one text
//! - `sentiscope batch [--file F]` — analyze one text per line
//! - `sentiscope upload <file.csv>` — analyze every row of a CSV file
//! - `sentiscope wordcloud [--file F]` — word cloud from a file or the history
//! - `sentiscope history` — recent analyses as a table, JSON, or CSV
//! - `sentiscope health` — backend reachability, config, history and log files
//! - `sentiscope config show|init|set|reset` — configuration management

use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;

use anyhow::{Context, Result, bail};
use colored::Colorize;

use crate::api::{AnalysisClient, Sentiment};
use crate::app::runtime::{self, Runtime};
use crate::app::{AppController, Event, EventHandler, Timings};
use crate::config::{self, SentiscopeConfig};
use crate::history::{HistoryEntry, HistoryStore};
use crate::logging::EventLog;
use crate::shell;
use crate::ui::ResultRenderer;
use crate::ui::terminal::TerminalUi;

/// Output format for listing commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}

impl OutputFormat {
    pub fn from_str_opt(s: Option<&str>) -> Self {
        match s {
            Some("json") => Self::Json,
            Some("csv") => Self::Csv,
            _ => Self::Table,
        }
    }
}

// ---------------------------------------------------------------------------
// Wiring
// ---------------------------------------------------------------------------

/// Open the history the config points at, or an in-memory one when
/// persistence is disabled.
fn open_history(config: &SentiscopeConfig) -> HistoryStore {
    let capacity = config.history.max_entries;
    let store = match config.history_path() {
        Some(path) => HistoryStore::open(path, capacity),
        None => HistoryStore::in_memory(capacity),
    };
    store.with_prefix_chars(config.history.prefix_chars)
}

fn build_runtime(config: &SentiscopeConfig) -> (Runtime<TerminalUi>, Sender<Event>) {
    let (tx, rx) = runtime::channel();
    let controller = AppController::new(
        AnalysisClient::from_config(config),
        TerminalUi::stdout(config.wordcloud_path()),
        open_history(config),
        tx.clone(),
    )
    .with_timings(Timings::from_config(&config.ui))
    .with_log(EventLog::new(config.log_path()));
    (Runtime::new(controller, rx), tx)
}

/// Submit one event and pump the loop until its request settles. A failure
/// has already been shown as a notification; it is also returned so the
/// process exits non-zero.
fn run_once(event: Event) -> Result<()> {
    let config = config::load();
    let (mut runtime, _tx) = build_runtime(&config);
    runtime.controller_mut().handle(event);
    runtime.run_until_idle();

    match runtime.controller().state().last_failure() {
        Some(err) => bail!("{err}"),
        None => Ok(()),
    }
}

/// Read a file, or stdin when no file is given.
fn read_input(file: Option<&Path>) -> Result<String> {
    match file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display())),
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed reading texts from stdin")?;
            Ok(buf)
        }
    }
}

// ---------------------------------------------------------------------------
// sentiscope shell
// ---------------------------------------------------------------------------

/// Interactive session. Returns when the user quits or stdin closes.
pub fn run_shell() -> Result<()> {
    let config = config::load();
    let (mut runtime, tx) = build_runtime(&config);

    println!("{}", "sentiscope".bold().cyan());
    println!("  {} {}", "Backend:".bold(), config.api.base_url);
    println!("{}", shell::HELP.dimmed());
    println!();

    runtime.controller_mut().init();
    let _reader = shell::spawn_reader(tx);
    runtime.run();
    Ok(())
}

// ---------------------------------------------------------------------------
// sentiscope analyze | batch | upload
// ---------------------------------------------------------------------------

pub fn run_analyze(text: &str) -> Result<()> {
    run_once(Event::SubmitSingle(text.to_string()))
}

/// Analyze one text per line of `file` (stdin when absent).
pub fn run_batch(file: Option<&Path>) -> Result<()> {
    let raw = read_input(file)?;
    run_once(Event::SubmitBatch(raw))
}

pub fn run_upload(path: Option<PathBuf>) -> Result<()> {
    run_once(Event::SubmitUpload(path))
}

// ---------------------------------------------------------------------------
// sentiscope wordcloud
// ---------------------------------------------------------------------------

/// Generate a word cloud from the lines of `file`, or from the stored
/// history when no file is given.
pub fn run_wordcloud(file: Option<&Path>) -> Result<()> {
    let config = config::load();
    let corpus: Vec<String> = match file {
        Some(path) => read_input(Some(path))?
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect(),
        None => open_history(&config)
            .entries()
            .iter()
            .map(|entry| entry.text.clone())
            .collect(),
    };

    let client = AnalysisClient::from_config(&config);
    let mut ui = TerminalUi::stdout(config.wordcloud_path());
    match client.generate_word_cloud(&corpus) {
        Ok(image) => {
            ui.word_cloud(&image, corpus.len());
            Ok(())
        }
        Err(err) => {
            eprintln!("{}", err.user_message().yellow());
            bail!("{err}")
        }
    }
}

// ---------------------------------------------------------------------------
// sentiscope history
// ---------------------------------------------------------------------------

/// Show the most recent analyses, newest first.
pub fn run_history(format: OutputFormat, limit: Option<usize>) -> Result<()> {
    let config = config::load();
    let store = open_history(&config);
    let entries = &store.entries()[..limit.unwrap_or(usize::MAX).min(store.len())];

    if entries.is_empty() {
        println!(
            "{}",
            "No history yet. Analyze some text to start one.".yellow()
        );
        return Ok(());
    }

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(entries)?),
        OutputFormat::Csv => print_history_csv(entries),
        OutputFormat::Table => print_history_table(&store, entries),
    }
    Ok(())
}

fn print_history_table(store: &HistoryStore, entries: &[HistoryEntry]) {
    println!("{}", "Recent Analyses".bold().cyan());
    println!("{}", "=".repeat(78));
    println!(
        "  {:<3} {:<9} {:>6}  {:<20} Text",
        "#", "Sentiment", "Conf", "Time"
    );
    println!("  {}", "-".repeat(76));

    for (i, entry) in entries.iter().enumerate() {
        let line = format!(
            "  {:<3} {:<9} {:>5.1}%  {:<20} {}",
            i + 1,
            entry.sentiment,
            entry.confidence * 100.0,
            truncate(&entry.timestamp, 19),
            truncate(&entry.text, 36),
        );
        if i % 2 == 0 {
            println!("{}", line);
        } else {
            println!("{}", line.dimmed());
        }
    }

    let summary = store.summary();
    println!();
    println!(
        "  {} {}   {} {:.1}%",
        "Stored:".bold(),
        summary.total,
        "Avg confidence:".bold(),
        summary.average_confidence * 100.0
    );
    let counts: Vec<String> = Sentiment::ALL
        .iter()
        .map(|s| format!("{} {} ({:.0}%)", s, summary.count(*s), summary.pct(*s)))
        .collect();
    println!("  {}", counts.join("  "));
}

fn print_history_csv(entries: &[HistoryEntry]) {
    println!("timestamp,sentiment,confidence,text");
    for entry in entries {
        println!(
            "{},{},{:.4},{}",
            entry.timestamp,
            entry.sentiment,
            entry.confidence,
            csv_field(&entry.text)
        );
    }
}

// ---------------------------------------------------------------------------
// sentiscope health
// ---------------------------------------------------------------------------

/// Check backend reachability, config files, history, and the client log.
pub fn run_health() -> Result<()> {
    println!("{}", "sentiscope Health Check".bold().cyan());
    println!("{}", "=".repeat(40));

    let global_exists = config::global_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    let project_exists = config::project_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    let cfg = config::load();
    print_health_item(
        "Global config",
        global_exists,
        if global_exists {
            "~/.sentiscope/config.toml found"
        } else {
            "not found (run `sentiscope config init` to create)"
        },
    );
    print_health_item(
        "Project config",
        project_exists,
        if project_exists {
            ".sentiscope.toml found"
        } else {
            "none (optional)"
        },
    );

    let client = AnalysisClient::from_config(&cfg);
    match client.server_info() {
        Ok(info) => {
            print_health_item(
                "Backend",
                info.status == "running",
                &format!("{} at {} (v{})", info.status, cfg.api.base_url, info.version),
            );
            print_health_item("Models", !info.models.is_empty(), &info.models.join(", "));
        }
        Err(err) => {
            print_health_item(
                "Backend",
                false,
                &format!("not reachable at {} ({err})", cfg.api.base_url),
            );
        }
    }

    match cfg.history_path() {
        Some(path) => {
            let store = HistoryStore::open(path.clone(), cfg.history.max_entries);
            print_health_item(
                "History",
                true,
                &format!("{} entries in {}", store.len(), path.display()),
            );
        }
        None => print_health_item("History", false, "disabled (in-memory only)"),
    }

    match cfg.log_path() {
        Some(path) => print_health_item(
            "Client log",
            path.exists(),
            &if path.exists() {
                path.display().to_string()
            } else {
                "no log file yet".to_string()
            },
        ),
        None => print_health_item("Client log", false, "disabled"),
    }

    Ok(())
}

fn print_health_item(name: &str, ok: bool, detail: &str) {
    let status = if ok {
        "✓".green().bold()
    } else {
        "✗".red().bold()
    };
    println!("  {} {:<25} {}", status, name, detail.dimmed());
}

// ---------------------------------------------------------------------------
// sentiscope config show | init | set | reset
// ---------------------------------------------------------------------------

/// Show the effective (merged) configuration as TOML.
pub fn run_config_show() -> Result<()> {
    let toml_str = config::show_effective_config()?;
    println!("{}", "Effective sentiscope Configuration".bold().cyan());
    println!("{}", "=".repeat(50));
    println!();
    println!("{toml_str}");

    let global_exists = config::global_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    let project_exists = config::project_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    println!("{}", "Sources (highest priority last):".dimmed());
    println!("  {} built-in defaults", "·".dimmed());
    if global_exists {
        println!("  {} {}", "✓".green(), "~/.sentiscope/config.toml".dimmed());
    } else {
        println!(
            "  {} {}",
            "·".dimmed(),
            "~/.sentiscope/config.toml (not found)".dimmed()
        );
    }
    if project_exists {
        println!("  {} {}", "✓".green(), ".sentiscope.toml".dimmed());
    } else {
        println!(
            "  {} {}",
            "·".dimmed(),
            ".sentiscope.toml (not found)".dimmed()
        );
    }
    println!(
        "  {} {}",
        "·".dimmed(),
        "SENTISCOPE_* environment variables".dimmed()
    );

    Ok(())
}

/// Initialize a default config file at `~/.sentiscope/config.toml`.
pub fn run_config_init(force: bool) -> Result<()> {
    let path = config::init_config(force)?;
    println!(
        "{} Config written to {}",
        "✓".green().bold(),
        path.display()
    );
    Ok(())
}

/// Set a single configuration value in the global config file.
pub fn run_config_set(key: &str, value: &str) -> Result<()> {
    config::set_config_value(key, value)?;
    println!("{} Set {} = {}", "✓".green().bold(), key.bold(), value);
    Ok(())
}

/// Reset configuration to defaults.
pub fn run_config_reset() -> Result<()> {
    let path = config::reset_config()?;
    println!(
        "{} Config reset to defaults at {}",
        "✓".green().bold(),
        path.display()
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// Formatting helpers
// ---------------------------------------------------------------------------

/// Truncate to `max_len` characters, appending "…" if truncated.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(1)).collect();
        format!("{kept}…")
    }
}

/// Quote a CSV field when it contains a separator, quote, or newline.
fn csv_field(s: &str) -> String {
    if s.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
