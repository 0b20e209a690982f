//! Explicit client state owned by the controller.

use std::collections::BTreeMap;

use super::requests::{InFlight, RequestId};
use super::timers::Timers;
use crate::api::{AnalysisResult, ClientError, Sentiment, UploadOutcome, WordCloudImage};
use crate::history::{HistoryStore, SentimentSummary};
use crate::ui::{AnalyticsSnapshot, Notification, NotificationId, PanelController};

/// Latest successful result shown in each panel.
#[derive(Debug, Default)]
pub struct CurrentResults {
    pub single: Option<AnalysisResult>,
    pub batch: Option<Vec<AnalysisResult>>,
    pub upload: Option<UploadOutcome>,
    pub word_cloud: Option<WordCloudImage>,
}

#[derive(Debug)]
pub struct AppState {
    pub(crate) panels: PanelController,
    /// Raw texts analyzed this session, in completion order. Word-cloud corpus.
    pub(crate) session_texts: Vec<String>,
    /// `(sentiment, confidence)` for every entry of `session_texts`.
    pub(crate) session_scores: Vec<(Sentiment, f64)>,
    pub(crate) current: CurrentResults,
    pub(crate) history: HistoryStore,
    pub(crate) in_flight: BTreeMap<RequestId, InFlight>,
    pub(crate) notifications: Vec<Notification>,
    pub(crate) loading_visible: bool,
    pub(crate) timers: Timers,
    pub(crate) last_failure: Option<ClientError>,
    next_request: RequestId,
    next_notification: NotificationId,
}

impl AppState {
    pub fn new(history: HistoryStore) -> Self {
        Self {
            panels: PanelController::new(),
            session_texts: Vec::new(),
            session_scores: Vec::new(),
            current: CurrentResults::default(),
            history,
            in_flight: BTreeMap::new(),
            notifications: Vec::new(),
            loading_visible: false,
            timers: Timers::new(),
            last_failure: None,
            next_request: 1,
            next_notification: 1,
        }
    }

    pub(crate) fn next_request_id(&mut self) -> RequestId {
        let id = self.next_request;
        self.next_request += 1;
        id
    }

    pub(crate) fn next_notification_id(&mut self) -> NotificationId {
        let id = self.next_notification;
        self.next_notification += 1;
        id
    }

    pub fn panels(&self) -> &PanelController {
        &self.panels
    }

    pub fn session_texts(&self) -> &[String] {
        &self.session_texts
    }

    pub fn current(&self) -> &CurrentResults {
        &self.current
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    pub fn in_flight(&self) -> &BTreeMap<RequestId, InFlight> {
        &self.in_flight
    }

    /// Notifications that have not expired yet, oldest first.
    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    pub fn loading_visible(&self) -> bool {
        self.loading_visible
    }

    pub fn timers(&self) -> &Timers {
        &self.timers
    }

    pub fn last_failure(&self) -> Option<&ClientError> {
        self.last_failure.as_ref()
    }

    /// Counts and mean confidence over this session's analyses.
    pub fn session_summary(&self) -> SentimentSummary {
        SentimentSummary::from_scores(self.session_scores.iter().copied())
    }

    pub fn analytics_snapshot(&self) -> AnalyticsSnapshot {
        AnalyticsSnapshot {
            session: self.session_summary(),
            history: self.history.summary(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_monotonic_and_independent() {
        let mut state = AppState::new(HistoryStore::in_memory(50));
        assert_eq!(state.next_request_id(), 1);
        assert_eq!(state.next_request_id(), 2);
        assert_eq!(state.next_notification_id(), 1);
    }

    #[test]
    fn session_summary_uses_recorded_scores() {
        let mut state = AppState::new(HistoryStore::in_memory(50));
        state.session_scores.push((Sentiment::Positive, 0.8));
        state.session_scores.push((Sentiment::Negative, 0.4));

        let summary = state.session_summary();
        assert_eq!(summary.total, 2);
        assert_eq!(summary.count(Sentiment::Positive), 1);
        assert!((summary.average_confidence - 0.6).abs() < 1e-9);
        assert_eq!(state.analytics_snapshot().history.total, 0);
    }
}
