//! Recent-analysis history.
//!
//! A bounded, newest-first list of `{text, sentiment, confidence, timestamp}`
//! records persisted as one JSON array (default `~/.sentiscope/history.json`).
//! Every insert rewrites the whole file, so the file on disk is always a
//! complete, valid snapshot of the list.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::api::Sentiment;

/// Default number of retained entries.
pub const DEFAULT_CAPACITY: usize = 50;

/// Default number of characters of each text that are stored.
pub const DEFAULT_PREFIX_CHARS: usize = 100;

// ---------------------------------------------------------------------------
// Entry
// ---------------------------------------------------------------------------

/// One analyzed text, as remembered across sessions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Prefix of the analyzed text.
    pub text: String,
    pub sentiment: Sentiment,
    /// Overall confidence reported by the backend. Records written before
    /// confidence was tracked load as `0.0`.
    #[serde(default)]
    pub confidence: f64,
    /// RFC 3339 timestamp of the analysis.
    pub timestamp: String,
}

impl HistoryEntry {
    /// Build an entry stamped with the current time, keeping at most
    /// `prefix_chars` characters of `text`.
    pub fn now(text: &str, sentiment: Sentiment, confidence: f64, prefix_chars: usize) -> Self {
        Self {
            text: text.chars().take(prefix_chars).collect(),
            sentiment,
            confidence,
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

// ---------------------------------------------------------------------------
// Summary
// ---------------------------------------------------------------------------

/// Aggregate over a set of analyses.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SentimentSummary {
    pub total: usize,
    pub counts: BTreeMap<Sentiment, usize>,
    pub average_confidence: f64,
}

impl SentimentSummary {
    /// Summarize `(sentiment, confidence)` pairs.
    pub fn from_scores(scores: impl IntoIterator<Item = (Sentiment, f64)>) -> Self {
        let mut summary = Self::default();
        let mut confidence_sum = 0.0;

        for (sentiment, confidence) in scores {
            summary.total += 1;
            *summary.counts.entry(sentiment).or_insert(0) += 1;
            confidence_sum += confidence;
        }

        if summary.total > 0 {
            summary.average_confidence = confidence_sum / summary.total as f64;
        }
        summary
    }

    pub fn count(&self, sentiment: Sentiment) -> usize {
        self.counts.get(&sentiment).copied().unwrap_or(0)
    }

    /// Share of the given sentiment, in percent.
    pub fn pct(&self, sentiment: Sentiment) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.count(sentiment) as f64 / self.total as f64 * 100.0
        }
    }
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// Bounded, newest-first history with whole-file persistence.
#[derive(Debug)]
pub struct HistoryStore {
    path: Option<PathBuf>,
    capacity: usize,
    prefix_chars: usize,
    entries: Vec<HistoryEntry>,
}

impl HistoryStore {
    /// Open the history at `path`. A missing or unreadable file starts an
    /// empty history; it will be replaced on the next append.
    pub fn open(path: PathBuf, capacity: usize) -> Self {
        let mut entries = load_entries(&path);
        entries.truncate(capacity);
        Self {
            path: Some(path),
            capacity,
            prefix_chars: DEFAULT_PREFIX_CHARS,
            entries,
        }
    }

    /// A history that is never written to disk.
    pub fn in_memory(capacity: usize) -> Self {
        Self {
            path: None,
            capacity,
            prefix_chars: DEFAULT_PREFIX_CHARS,
            entries: Vec::new(),
        }
    }

    pub fn with_prefix_chars(mut self, prefix_chars: usize) -> Self {
        self.prefix_chars = prefix_chars;
        self
    }

    /// Insert at the front, evict beyond capacity, then persist the whole
    /// list. The in-memory list is updated even when persisting fails.
    pub fn append(&mut self, entry: HistoryEntry) -> Result<()> {
        self.entries.insert(0, entry);
        self.entries.truncate(self.capacity);
        self.persist()
    }

    /// Record an analysis stamped with the current time.
    pub fn record(&mut self, text: &str, sentiment: Sentiment, confidence: f64) -> Result<()> {
        let entry = HistoryEntry::now(text, sentiment, confidence, self.prefix_chars);
        self.append(entry)
    }

    /// All entries, newest first.
    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Sentiment counts and mean confidence over the stored entries.
    pub fn summary(&self) -> SentimentSummary {
        SentimentSummary::from_scores(self.entries.iter().map(|e| (e.sentiment, e.confidence)))
    }

    fn persist(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("failed to create history directory")?;
        }

        let json = serde_json::to_string(&self.entries).context("failed to serialize history")?;

        // Write-then-rename: the file on disk is always a whole snapshot.
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json)
            .with_context(|| format!("failed to write {}", tmp.display()))?;
        fs::rename(&tmp, path)
            .with_context(|| format!("failed to replace {}", path.display()))?;
        Ok(())
    }
}

fn load_entries(path: &Path) -> Vec<HistoryEntry> {
    let Ok(content) = fs::read_to_string(path) else {
        return Vec::new();
    };
    serde_json::from_str(&content).unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(n: usize) -> HistoryEntry {
        HistoryEntry {
            text: format!("text {n}"),
            sentiment: Sentiment::Neutral,
            confidence: 0.5,
            timestamp: format!("2026-10-19T10:00:{:02}Z", n % 60),
        }
    }

    #[test]
    fn append_inserts_newest_first() {
        let mut store = HistoryStore::in_memory(DEFAULT_CAPACITY);
        store.append(entry(1)).unwrap();
        store.append(entry(2)).unwrap();
        assert_eq!(store.entries()[0].text, "text 2");
        assert_eq!(store.entries()[1].text, "text 1");
    }

    #[test]
    fn capacity_evicts_oldest() {
        let mut store = HistoryStore::in_memory(3);
        for n in 0..5 {
            store.append(entry(n)).unwrap();
        }
        let texts: Vec<&str> = store.entries().iter().map(|e| e.text.as_str()).collect();
        assert_eq!(texts, vec!["text 4", "text 3", "text 2"]);
    }

    #[test]
    fn record_keeps_prefix_by_characters() {
        let mut store = HistoryStore::in_memory(DEFAULT_CAPACITY).with_prefix_chars(4);
        store.record("héllo wörld", Sentiment::Positive, 0.9).unwrap();
        assert_eq!(store.entries()[0].text, "héll");
        assert_eq!(store.entries()[0].sentiment, Sentiment::Positive);
    }

    #[test]
    fn legacy_records_without_confidence_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        fs::write(
            &path,
            r#"[{"text":"old","sentiment":"negative","timestamp":"2024-01-01T00:00:00Z"}]"#,
        )
        .unwrap();

        let store = HistoryStore::open(path, DEFAULT_CAPACITY);
        assert_eq!(store.len(), 1);
        assert_eq!(store.entries()[0].confidence, 0.0);
    }

    #[test]
    fn corrupt_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        fs::write(&path, "{not json").unwrap();
        assert!(HistoryStore::open(path, DEFAULT_CAPACITY).is_empty());
    }

    #[test]
    fn summary_uses_stored_confidence() {
        let mut store = HistoryStore::in_memory(DEFAULT_CAPACITY);
        store.record("a", Sentiment::Positive, 0.8).unwrap();
        store.record("b", Sentiment::Positive, 0.4).unwrap();
        store.record("c", Sentiment::Negative, 0.3).unwrap();

        let summary = store.summary();
        assert_eq!(summary.total, 3);
        assert_eq!(summary.count(Sentiment::Positive), 2);
        assert_eq!(summary.count(Sentiment::Neutral), 0);
        assert!((summary.average_confidence - 0.5).abs() < 1e-9);
    }

    #[test]
    fn empty_summary_is_zeroed() {
        let summary = SentimentSummary::from_scores([]);
        assert_eq!(summary.total, 0);
        assert_eq!(summary.average_confidence, 0.0);
        assert_eq!(summary.pct(Sentiment::Positive), 0.0);
    }
}
