//! Colored terminal front end.
//!
//! Renders results as plain text blocks, writes decoded word-cloud images to
//! disk, and prints a navigation bar whenever the active panel changes.

use std::collections::BTreeSet;
use std::io::{self, Write};
use std::path::PathBuf;

use colored::{ColoredString, Colorize};

use super::{
    AnalyticsSnapshot, Notification, NotificationId, Panel, PanelView, ResultRenderer,
};
use crate::api::{AnalysisResult, Sentiment, Severity, UploadOutcome, WordCloudImage};
use crate::history::SentimentSummary;

/// Characters of each text shown in batch listings.
const BATCH_PREVIEW_CHARS: usize = 100;

/// Characters of each text shown in upload samples.
const UPLOAD_PREVIEW_CHARS: usize = 80;

/// Upload rows shown before the "... and N more" line.
const UPLOAD_SAMPLE_ROWS: usize = 5;

/// Width of percentage bars.
const BAR_WIDTH: usize = 20;

pub struct TerminalUi<W: Write = io::Stdout> {
    out: W,
    wordcloud_path: PathBuf,
    active_panel: Option<Panel>,
    active_nav: BTreeSet<Panel>,
    loading: bool,
    visible_notifications: BTreeSet<NotificationId>,
}

impl TerminalUi<io::Stdout> {
    pub fn stdout(wordcloud_path: PathBuf) -> Self {
        Self::new(io::stdout(), wordcloud_path)
    }
}

impl<W: Write> TerminalUi<W> {
    pub fn new(out: W, wordcloud_path: PathBuf) -> Self {
        Self {
            out,
            wordcloud_path,
            active_panel: None,
            active_nav: BTreeSet::new(),
            loading: false,
            visible_notifications: BTreeSet::new(),
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Number of notifications that have not been dismissed yet.
    pub fn visible_notifications(&self) -> usize {
        self.visible_notifications.len()
    }

    fn line(&mut self, text: impl std::fmt::Display) {
        let _ = writeln!(self.out, "{text}");
    }

    fn nav_bar(&mut self) {
        let items: Vec<String> = Panel::ALL
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let label = format!("[{} {}]", i + 1, p.id());
                if self.active_nav.contains(p) {
                    label.bold().cyan().to_string()
                } else {
                    label.dimmed().to_string()
                }
            })
            .collect();
        self.line(items.join(" "));
    }

    fn summary_block(&mut self, title: &str, summary: &SentimentSummary) {
        self.line(title.bold().cyan());
        if summary.total == 0 {
            self.line("  No data yet.".dimmed());
            return;
        }
        self.line(format!(
            "  {} {}   {} {:.1}%",
            "Analyses:".bold(),
            summary.total,
            "Avg confidence:".bold(),
            summary.average_confidence * 100.0
        ));
        for sentiment in Sentiment::ALL {
            let pct = summary.pct(sentiment);
            self.line(format!(
                "  {:<9} {} {:>4} ({:.1}%)",
                colorize_sentiment(sentiment),
                bar(pct),
                summary.count(sentiment),
                pct
            ));
        }
    }
}

impl<W: Write> PanelView for TerminalUi<W> {
    fn set_panel_active(&mut self, panel: Panel, active: bool) {
        if active {
            self.active_panel = Some(panel);
            self.line(format!("── {} ──", panel.title()).bold());
        } else if self.active_panel == Some(panel) {
            self.active_panel = None;
        }
    }

    fn set_nav_active(&mut self, panel: Panel, active: bool) {
        if active {
            self.active_nav.insert(panel);
            self.nav_bar();
        } else {
            self.active_nav.remove(&panel);
        }
    }
}

impl<W: Write> ResultRenderer for TerminalUi<W> {
    fn single_result(&mut self, result: &AnalysisResult) {
        self.line(format!(
            "{} {}",
            "Overall sentiment:".bold(),
            colorize_sentiment(result.overall_sentiment)
        ));
        self.line(format!(
            "{} {} {:.1}%",
            "Confidence:       ".bold(),
            bar(result.overall_confidence * 100.0),
            result.overall_confidence * 100.0
        ));

        if !result.per_model.is_empty() {
            self.line("Model results:".bold());
            for (name, score) in &result.per_model {
                self.line(format!(
                    "  {:<10} {:<9} score {:>7.3}  confidence {} {:.1}%",
                    name,
                    colorize_sentiment(score.sentiment),
                    score.raw_score,
                    bar(score.confidence * 100.0),
                    score.confidence * 100.0
                ));
            }
        }

        if let Some(ts) = &result.timestamp {
            self.line(format!("Analyzed at {ts}").dimmed());
        }
    }

    fn batch_results(&mut self, results: &[AnalysisResult]) {
        if results.is_empty() {
            self.line("No results to display.".yellow());
            return;
        }
        for (i, result) in results.iter().enumerate() {
            self.line(format!(
                "{:>3}. {:<9} {:>5.1}%  \"{}\"",
                i + 1,
                colorize_sentiment(result.overall_sentiment),
                result.overall_confidence * 100.0,
                preview(&result.text, BATCH_PREVIEW_CHARS)
            ));
        }
    }

    fn upload_results(&mut self, outcome: &UploadOutcome) {
        let summary = &outcome.summary;
        self.line("Upload Summary".bold().cyan());
        self.line(format!(
            "  {} {}   {} {:.1}%   {} {}",
            "Total texts:".bold(),
            summary.total_texts,
            "Avg confidence:".bold(),
            summary.average_confidence * 100.0,
            "Sentiments:".bold(),
            summary.sentiment_distribution.len()
        ));
        for (sentiment, count) in &summary.sentiment_distribution {
            let pct = summary.percentage(*sentiment);
            self.line(format!(
                "  {:<9} {} {} ({:.1}%)",
                colorize_sentiment(*sentiment),
                bar(pct),
                count,
                pct
            ));
        }

        self.line(format!("Sample Results (First {UPLOAD_SAMPLE_ROWS})").bold().cyan());
        for (i, result) in outcome.results.iter().take(UPLOAD_SAMPLE_ROWS).enumerate() {
            self.line(format!(
                "{:>3}. {:<9} {:>5.1}%  \"{}\"",
                i + 1,
                colorize_sentiment(result.overall_sentiment),
                result.overall_confidence * 100.0,
                preview(&result.text, UPLOAD_PREVIEW_CHARS)
            ));
        }
        if outcome.results.len() > UPLOAD_SAMPLE_ROWS {
            self.line(
                format!(
                    "... and {} more results",
                    outcome.results.len() - UPLOAD_SAMPLE_ROWS
                )
                .dimmed(),
            );
        }
    }

    fn word_cloud(&mut self, image: &WordCloudImage, corpus_size: usize) {
        let written = image
            .decode()
            .map_err(|e| e.to_string())
            .and_then(|bytes| {
                if let Some(parent) = self.wordcloud_path.parent()
                    && !parent.as_os_str().is_empty()
                {
                    std::fs::create_dir_all(parent).map_err(|e| e.to_string())?;
                }
                std::fs::write(&self.wordcloud_path, bytes).map_err(|e| e.to_string())
            });

        match written {
            Ok(()) => {
                let path = self.wordcloud_path.display().to_string();
                self.line(format!("{} {}", "Word cloud written to".bold(), path));
                self.line(format!("Generated from {corpus_size} texts").dimmed());
            }
            Err(e) => self.line(format!("Could not save word cloud: {e}").red()),
        }
    }

    fn analytics(&mut self, snapshot: &AnalyticsSnapshot) {
        if snapshot.session.total == 0 && snapshot.history.total == 0 {
            self.line("No data available for analytics.".yellow());
            return;
        }
        self.summary_block("This session", &snapshot.session);
        self.summary_block("Recent history", &snapshot.history);
    }

    fn session_stats(&mut self, stats: &SentimentSummary) {
        self.line(
            format!(
                "Total analyses: {}  ·  Avg confidence: {:.0}%",
                stats.total,
                stats.average_confidence * 100.0
            )
            .dimmed(),
        );
    }

    fn notify(&mut self, notification: &Notification) {
        self.visible_notifications.insert(notification.id);
        let text = match notification.severity {
            Severity::Warning => format!("! {}", notification.message).yellow(),
            Severity::Danger => format!("✗ {}", notification.message).red(),
        };
        self.line(text);
    }

    fn dismiss_notification(&mut self, id: NotificationId) {
        self.visible_notifications.remove(&id);
    }

    fn loading(&mut self, visible: bool) {
        if visible && !self.loading {
            self.line("… working (esc to dismiss)".dimmed());
        }
        self.loading = visible;
    }
}

// ---------------------------------------------------------------------------
// Formatting helpers
// ---------------------------------------------------------------------------

/// Truncate to `max_chars` characters, appending "..." if truncated.
fn preview(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let head: String = text.chars().take(max_chars).collect();
        format!("{head}...")
    }
}

/// Fixed-width bar for a percentage in `[0, 100]`.
fn bar(pct: f64) -> String {
    let filled = ((pct.clamp(0.0, 100.0) / 100.0) * BAR_WIDTH as f64).round() as usize;
    format!("{}{}", "█".repeat(filled), "░".repeat(BAR_WIDTH - filled))
}

fn colorize_sentiment(sentiment: Sentiment) -> ColoredString {
    match sentiment {
        Sentiment::Positive => sentiment.as_str().green(),
        Sentiment::Negative => sentiment.as_str().red(),
        Sentiment::Neutral => sentiment.as_str().normal(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::api::UploadSummary;

    fn result(text: &str, sentiment: Sentiment) -> AnalysisResult {
        AnalysisResult {
            text: text.to_string(),
            overall_sentiment: sentiment,
            overall_confidence: 0.42,
            per_model: BTreeMap::new(),
            timestamp: None,
        }
    }

    fn output(ui: TerminalUi<Vec<u8>>) -> String {
        String::from_utf8(ui.into_inner()).unwrap()
    }

    #[test]
    fn preview_truncates_by_characters() {
        assert_eq!(preview("short", 10), "short");
        assert_eq!(preview("ééééé", 3), "ééé...");
    }

    #[test]
    fn bar_is_fixed_width() {
        assert_eq!(bar(0.0).chars().count(), BAR_WIDTH);
        assert_eq!(bar(100.0), "█".repeat(BAR_WIDTH));
        assert_eq!(bar(250.0), "█".repeat(BAR_WIDTH));
        assert_eq!(bar(50.0).chars().filter(|c| *c == '█').count(), BAR_WIDTH / 2);
    }

    #[test]
    fn upload_results_list_at_most_five_samples() {
        let mut ui = TerminalUi::new(Vec::new(), PathBuf::from("unused.png"));
        let results: Vec<AnalysisResult> = (0..8)
            .map(|i| result(&format!("row {i}"), Sentiment::Neutral))
            .collect();
        let outcome = UploadOutcome {
            summary: UploadSummary {
                total_texts: 8,
                average_confidence: 0.42,
                sentiment_distribution: BTreeMap::from([(Sentiment::Neutral, 8)]),
            },
            results,
        };

        ui.upload_results(&outcome);
        let text = output(ui);
        assert!(text.contains("row 4"));
        assert!(!text.contains("row 5"));
        assert!(text.contains("and 3 more results"));
    }

    #[test]
    fn word_cloud_is_written_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("cloud.png");
        let mut ui = TerminalUi::new(Vec::new(), path.clone());

        let image = WordCloudImage {
            base64: "iVBORw0KGgo=".to_string(),
        };
        ui.word_cloud(&image, 7);

        assert_eq!(std::fs::read(&path).unwrap()[..4], [0x89, b'P', b'N', b'G']);
        assert!(output(ui).contains("Generated from 7 texts"));
    }

    #[test]
    fn notifications_are_tracked_until_dismissed() {
        let mut ui = TerminalUi::new(Vec::new(), PathBuf::from("unused.png"));
        ui.notify(&Notification {
            id: 3,
            message: "Please select a file.".into(),
            severity: Severity::Warning,
        });
        assert_eq!(ui.visible_notifications(), 1);
        ui.dismiss_notification(3);
        assert_eq!(ui.visible_notifications(), 0);
        assert!(output(ui).contains("Please select a file."));
    }

    #[test]
    fn empty_analytics_shows_empty_state() {
        let mut ui = TerminalUi::new(Vec::new(), PathBuf::from("unused.png"));
        ui.analytics(&AnalyticsSnapshot::default());
        assert!(output(ui).contains("No data available for analytics."));
    }
}
