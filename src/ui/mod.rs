//! Rendering collaborators.
//!
//! The application core never formats output itself. It hands typed data to
//! a [`PanelView`] (active markers) and a [`ResultRenderer`] (results,
//! notifications, loading indicator). [`terminal::TerminalUi`] implements
//! both for the interactive shell and one-shot commands.

pub mod panel;
pub mod terminal;

use serde::Serialize;

use crate::api::{AnalysisResult, Severity, UploadOutcome, WordCloudImage};
use crate::history::SentimentSummary;

pub use panel::{Key, KeyChord, Panel, PanelController, Transition, UnknownPanel};

/// Identifier of a displayed notification.
pub type NotificationId = u64;

/// A transient, user-visible message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub id: NotificationId,
    pub message: String,
    pub severity: Severity,
}

/// Data behind the analytics panel.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AnalyticsSnapshot {
    /// Analyses made in this session.
    pub session: SentimentSummary,
    /// Analyses in the persisted history.
    pub history: SentimentSummary,
}

/// Receives panel marker changes.
pub trait PanelView {
    fn set_panel_active(&mut self, panel: Panel, active: bool);
    fn set_nav_active(&mut self, panel: Panel, active: bool);
}

/// Receives everything the application wants displayed.
pub trait ResultRenderer {
    fn single_result(&mut self, result: &AnalysisResult);
    fn batch_results(&mut self, results: &[AnalysisResult]);
    fn upload_results(&mut self, outcome: &UploadOutcome);
    fn word_cloud(&mut self, image: &WordCloudImage, corpus_size: usize);
    fn analytics(&mut self, snapshot: &AnalyticsSnapshot);
    /// Session counters: number of analyses and mean confidence.
    fn session_stats(&mut self, stats: &SentimentSummary);
    fn notify(&mut self, notification: &Notification);
    fn dismiss_notification(&mut self, id: NotificationId);
    fn loading(&mut self, visible: bool);
}

/// A complete front end.
pub trait Ui: PanelView + ResultRenderer {}

impl<T: PanelView + ResultRenderer> Ui for T {}
