//! Interactive shell.
//!
//! A reader thread turns stdin lines into [`Event`]s for the runtime. The
//! grammar stands in for the browser surface: nav clicks, keyboard chords,
//! form submits, drag-and-drop, and clicks on the loading overlay.

use std::io::{self, BufRead};
use std::path::PathBuf;
use std::sync::mpsc::Sender;
use std::thread::JoinHandle;

use colored::Colorize;

use crate::app::Event;
use crate::ui::KeyChord;

/// Line that ends multi-line batch input.
const BATCH_TERMINATOR: &str = ".";

pub const HELP: &str = "\
Commands:
  /<panel> | panel <panel>   switch panel (single, batch, upload, analytics)
  ^1..^4 | ctrl+1..ctrl+4    switch panel by shortcut
  analyze <text>             analyze one text
  batch                      analyze one text per line; end with a line holding '.'
  upload [path]              upload a CSV file
  drop <path> [path...]      drop files on the upload area (first one is used)
  wordcloud                  word cloud from every text analyzed this session
  esc | dismiss              hide the loading indicator and cancel pending requests
  help                       show this help
  quit                       leave the shell";

/// What one input line amounts to.
#[derive(Debug, Clone)]
pub enum Input {
    Event(Event),
    Help,
    Quit,
    /// Nothing to do yet: a blank line or a line inside a batch block.
    Pending,
    Unknown(String),
}

/// Line-by-line parser. Stateful only while a batch block is open.
#[derive(Debug, Default)]
pub struct LineReader {
    batch: Option<Vec<String>>,
}

impl LineReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// True while lines are being collected for a batch.
    pub fn in_batch(&self) -> bool {
        self.batch.is_some()
    }

    pub fn feed(&mut self, line: &str) -> Input {
        if let Some(lines) = &mut self.batch {
            if line.trim() == BATCH_TERMINATOR {
                let raw = lines.join("\n");
                self.batch = None;
                return Input::Event(Event::SubmitBatch(raw));
            }
            lines.push(line.to_string());
            return Input::Pending;
        }

        let line = line.trim();
        if line.is_empty() {
            return Input::Pending;
        }

        let (command, rest) = match line.split_once(char::is_whitespace) {
            Some((command, rest)) => (command, rest.trim()),
            None => (line, ""),
        };

        if let Some(id) = command.strip_prefix('/') {
            return Input::Event(Event::NavClicked(id.to_string()));
        }
        if let Some(chord) = parse_chord(command) {
            return Input::Event(Event::Key(chord));
        }

        match command.to_ascii_lowercase().as_str() {
            "panel" => Input::Event(Event::NavClicked(rest.to_string())),
            "esc" | "escape" => Input::Event(Event::Key(KeyChord::escape())),
            "dismiss" => Input::Event(Event::DismissLoading),
            "analyze" => Input::Event(Event::SubmitSingle(rest.to_string())),
            "batch" => {
                let first = (!rest.is_empty()).then(|| rest.to_string());
                self.batch = Some(first.into_iter().collect());
                Input::Pending
            }
            "upload" => {
                let path = (!rest.is_empty()).then(|| PathBuf::from(rest));
                Input::Event(Event::SubmitUpload(path))
            }
            "drop" => Input::Event(Event::FilesDropped(
                rest.split_whitespace().map(PathBuf::from).collect(),
            )),
            "wordcloud" => Input::Event(Event::GenerateWordCloud),
            "help" | "?" => Input::Help,
            "quit" | "exit" => Input::Quit,
            _ => Input::Unknown(command.to_string()),
        }
    }
}

/// `^N`, `ctrl+N` or `cmd+N`.
fn parse_chord(token: &str) -> Option<KeyChord> {
    let lower = token.to_ascii_lowercase();
    let key = lower
        .strip_prefix('^')
        .or_else(|| lower.strip_prefix("ctrl+"))
        .or_else(|| lower.strip_prefix("cmd+"))?;

    let mut chars = key.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(KeyChord::with_modifier(c)),
        _ => None,
    }
}

/// Read stdin on a background thread, forwarding events until `quit` or
/// end of input. Always finishes by sending [`Event::Quit`].
pub fn spawn_reader(events: Sender<Event>) -> JoinHandle<()> {
    std::thread::spawn(move || {
        let mut reader = LineReader::new();
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else {
                break;
            };
            match reader.feed(&line) {
                Input::Event(event) => {
                    if events.send(event).is_err() {
                        return;
                    }
                }
                Input::Help => println!("{HELP}"),
                Input::Quit => break,
                Input::Pending => {}
                Input::Unknown(command) => {
                    eprintln!(
                        "{} unknown command '{}' (type 'help')",
                        "?".yellow().bold(),
                        command
                    );
                }
            }
        }
        let _ = events.send(Event::Quit);
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
