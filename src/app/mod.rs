//! Application controller.
//!
//! [`AppController`] is the single owner of client state. Every input, from
//! the user or from a finished network request, arrives as an [`Event`] and
//! is applied on one thread, so no state is ever shared or locked.
//!
//! Request lifecycle:
//!
//! 1. Submit: local validation. Failure raises a warning and stops here.
//! 2. Start: allocate an id and a [`CancelToken`], register in flight, show
//!    the loading indicator, arm the safety timeout, hand the job to the
//!    [`RequestRunner`].
//! 3. Complete: the job sends [`Event::Completed`]. Completions for requests
//!    that were dismissed or timed out are discarded. Otherwise the result
//!    updates session state and history and is rendered.

pub mod requests;
pub mod runtime;
pub mod state;
pub mod timers;

use std::path::PathBuf;
use std::sync::mpsc::Sender;
use std::time::{Duration, Instant};

pub use requests::{
    CancelToken, Completion, InFlight, Job, Outcome, RequestId, RequestKind, RequestRunner,
    ThreadRunner,
};
pub use state::{AppState, CurrentResults};
pub use timers::{TimerKind, Timers};

use crate::api::{
    self, AnalysisClient, AnalysisResult, ClientError, Severity, prepare_batch, validate_upload,
};
use crate::config::schema::UiConfig;
use crate::history::HistoryStore;
use crate::logging::EventLog;
use crate::ui::{Key, KeyChord, Notification, NotificationId, Panel, Transition, Ui, UnknownPanel};

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Everything the controller reacts to.
#[derive(Debug, Clone)]
pub enum Event {
    /// Navigation affordance clicked, carrying the raw panel id.
    NavClicked(String),
    Key(KeyChord),
    SubmitSingle(String),
    /// Raw multi-line batch input.
    SubmitBatch(String),
    SubmitUpload(Option<PathBuf>),
    /// Files dropped on the upload area. Only the first is uploaded.
    FilesDropped(Vec<PathBuf>),
    GenerateWordCloud,
    /// Click outside the loading indicator.
    DismissLoading,
    Completed(Completion),
    /// Fire every timer due at the given instant.
    Tick(Instant),
    /// Stop the event loop. Ignored by the controller itself.
    Quit,
}

pub trait EventHandler {
    fn handle(&mut self, event: Event);
}

/// Delays the controller arms timers with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timings {
    pub notification_ttl: Duration,
    pub loading_timeout: Duration,
    pub analytics_refresh: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            notification_ttl: Duration::from_secs(5),
            loading_timeout: Duration::from_secs(30),
            analytics_refresh: Duration::from_millis(100),
        }
    }
}

impl Timings {
    pub fn from_config(ui: &UiConfig) -> Self {
        Self {
            notification_ttl: Duration::from_millis(ui.notification_ttl_ms),
            loading_timeout: Duration::from_millis(ui.loading_timeout_ms),
            analytics_refresh: Duration::from_millis(ui.analytics_refresh_ms),
        }
    }
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

pub struct AppController<U: Ui> {
    client: AnalysisClient,
    ui: U,
    runner: Box<dyn RequestRunner>,
    events: Sender<Event>,
    timings: Timings,
    log: EventLog,
    state: AppState,
}

impl<U: Ui> AppController<U> {
    /// `events` is the channel completions are sent back on.
    pub fn new(
        client: AnalysisClient,
        ui: U,
        history: HistoryStore,
        events: Sender<Event>,
    ) -> Self {
        Self {
            client,
            ui,
            runner: Box::new(ThreadRunner),
            events,
            timings: Timings::default(),
            log: EventLog::disabled(),
            state: AppState::new(history),
        }
    }

    pub fn with_runner(mut self, runner: Box<dyn RequestRunner>) -> Self {
        self.runner = runner;
        self
    }

    pub fn with_timings(mut self, timings: Timings) -> Self {
        self.timings = timings;
        self
    }

    pub fn with_log(mut self, log: EventLog) -> Self {
        self.log = log;
        self
    }

    /// Draw the initial panel markers and session counters.
    pub fn init(&mut self) {
        self.state.panels.sync(&mut self.ui);
        let stats = self.state.session_summary();
        self.ui.session_stats(&stats);
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn ui(&self) -> &U {
        &self.ui
    }

    pub fn ui_mut(&mut self) -> &mut U {
        &mut self.ui
    }

    pub fn into_ui(self) -> U {
        self.ui
    }

    pub fn has_in_flight(&self) -> bool {
        !self.state.in_flight.is_empty()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.state.timers.next_deadline()
    }

    // -- Navigation ---------------------------------------------------------

    /// Switch to the panel named `id`. An unknown id is logged and raised
    /// as a warning; the current panel stays active.
    pub fn navigate(&mut self, id: &str) -> Result<Transition, UnknownPanel> {
        match self.state.panels.set_active(id, &mut self.ui) {
            Ok(transition) => {
                self.after_transition(transition);
                Ok(transition)
            }
            Err(err) => {
                self.log.log(&format!("navigation: {err}"));
                self.notify(Severity::Warning, format!("Unknown panel: {}", err.0.trim()));
                Err(err)
            }
        }
    }

    pub fn show_panel(&mut self, panel: Panel) -> Transition {
        let transition = self.state.panels.activate(panel, &mut self.ui);
        self.after_transition(transition);
        transition
    }

    fn after_transition(&mut self, transition: Transition) {
        if transition.refresh_analytics {
            let at = Instant::now() + self.timings.analytics_refresh;
            self.state.timers.reschedule(at, TimerKind::RefreshAnalytics);
        }
    }

    // -- Submissions --------------------------------------------------------

    fn submit_single(&mut self, text: &str) {
        let text = match api::validate_text(text) {
            Ok(text) => text.to_string(),
            Err(err) => return self.fail(err),
        };
        self.start(RequestKind::Single, move |client| {
            client
                .analyze_single(&text)
                .map(|result| Outcome::Single { text, result })
        });
    }

    fn submit_batch(&mut self, raw: &str) {
        let lines = match prepare_batch(raw) {
            Ok(lines) => lines,
            Err(err) => return self.fail(err),
        };
        self.start(RequestKind::Batch, move |client| {
            client
                .analyze_batch(&lines)
                .map(|results| Outcome::Batch { lines, results })
        });
    }

    fn submit_upload(&mut self, path: Option<PathBuf>) {
        if let Err(err) = validate_upload(path.as_deref()) {
            return self.fail(err);
        }
        self.start(RequestKind::Upload, move |client| {
            client.upload_csv(path.as_deref()).map(Outcome::Upload)
        });
    }

    fn generate_word_cloud(&mut self) {
        if self.state.session_texts.is_empty() {
            return self.fail(ClientError::EmptyCorpus);
        }
        let corpus = self.state.session_texts.clone();
        let corpus_size = corpus.len();
        self.start(RequestKind::WordCloud, move |client| {
            client
                .generate_word_cloud(&corpus)
                .map(|image| Outcome::WordCloud { image, corpus_size })
        });
    }

    /// Register a request and hand its work to the runner.
    fn start<F>(&mut self, kind: RequestKind, work: F) -> RequestId
    where
        F: FnOnce(&AnalysisClient) -> Result<Outcome, ClientError> + Send + 'static,
    {
        let now = Instant::now();
        let id = self.state.next_request_id();
        let token = CancelToken::new();

        self.state.in_flight.insert(
            id,
            InFlight {
                kind,
                token: token.clone(),
                started: now,
            },
        );
        self.state
            .timers
            .schedule(now + self.timings.loading_timeout, TimerKind::LoadingTimeout(id));
        self.refresh_loading();
        self.log.log(&format!("request {id} {kind} started"));

        let client = self.client.clone();
        let events = self.events.clone();
        self.runner.spawn(Box::new(move || {
            if token.is_cancelled() {
                return;
            }
            let result = work(&client);
            let _ = events.send(Event::Completed(Completion { id, result }));
        }));
        id
    }

    // -- Completions --------------------------------------------------------

    fn complete(&mut self, completion: Completion) {
        let id = completion.id;
        let Some(flight) = self.state.in_flight.remove(&id) else {
            self.log
                .log(&format!("request {id} discarded: cancelled before it completed"));
            return;
        };
        self.state.timers.cancel(TimerKind::LoadingTimeout(id));

        let elapsed_ms = flight.started.elapsed().as_millis();
        match completion.result {
            Ok(outcome) => {
                self.log
                    .log(&format!("request {id} {} completed in {elapsed_ms}ms", flight.kind));
                self.apply(outcome);
            }
            Err(err) => {
                self.log.log(&format!(
                    "request {id} {} failed in {elapsed_ms}ms: {err}",
                    flight.kind
                ));
                self.fail(err);
            }
        }
        self.refresh_loading();
    }

    fn apply(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Single { text, result } => {
                self.accumulate(&text, &result);
                self.ui.single_result(&result);
                self.state.current.single = Some(result);
                self.render_session_stats();
            }
            Outcome::Batch { lines, results } => {
                for (i, result) in results.iter().enumerate() {
                    let text = lines.get(i).map_or(result.text.as_str(), String::as_str);
                    self.accumulate(text, result);
                }
                self.ui.batch_results(&results);
                self.state.current.batch = Some(results);
                self.render_session_stats();
            }
            Outcome::Upload(outcome) => {
                for result in &outcome.results {
                    self.accumulate(&result.text, result);
                }
                self.ui.upload_results(&outcome);
                self.state.current.upload = Some(outcome);
                self.render_session_stats();
            }
            Outcome::WordCloud { image, corpus_size } => {
                self.ui.word_cloud(&image, corpus_size);
                self.state.current.word_cloud = Some(image);
            }
        }
    }

    /// Add one analyzed text to the session and the persisted history.
    fn accumulate(&mut self, text: &str, result: &AnalysisResult) {
        let sentiment = result.overall_sentiment;
        let confidence = result.overall_confidence;
        self.state.session_texts.push(text.to_string());
        self.state.session_scores.push((sentiment, confidence));
        if let Err(err) = self.state.history.record(text, sentiment, confidence) {
            self.log.log(&format!("history: {err:#}"));
        }
    }

    fn render_session_stats(&mut self) {
        let stats = self.state.session_summary();
        self.ui.session_stats(&stats);
    }

    // -- Notifications and loading -----------------------------------------

    fn fail(&mut self, err: ClientError) {
        if err.is_validation() {
            self.log.log(&format!("rejected: {err}"));
        }
        self.notify(err.severity(), err.user_message());
        self.state.last_failure = Some(err);
    }

    /// Show a notification and arm its expiry timer.
    pub fn notify(&mut self, severity: Severity, message: impl Into<String>) -> NotificationId {
        let id = self.state.next_notification_id();
        let notification = Notification {
            id,
            message: message.into(),
            severity,
        };
        self.ui.notify(&notification);
        self.state.notifications.push(notification);

        let at = Instant::now() + self.timings.notification_ttl;
        self.state
            .timers
            .schedule(at, TimerKind::DismissNotification(id));
        id
    }

    fn dismiss_notification(&mut self, id: NotificationId) {
        let before = self.state.notifications.len();
        self.state.notifications.retain(|n| n.id != id);
        if self.state.notifications.len() != before {
            self.ui.dismiss_notification(id);
        }
    }

    /// Hide the loading indicator and cancel everything in flight. Late
    /// completions for those requests are discarded.
    pub fn dismiss_loading(&mut self) {
        let cancelled = std::mem::take(&mut self.state.in_flight);
        for (id, flight) in cancelled {
            flight.token.cancel();
            self.state.timers.cancel(TimerKind::LoadingTimeout(id));
            self.log.log(&format!("request {id} {} dismissed", flight.kind));
        }
        self.refresh_loading();
    }

    fn time_out(&mut self, id: RequestId) {
        let Some(flight) = self.state.in_flight.remove(&id) else {
            return;
        };
        flight.token.cancel();
        self.log.log(&format!(
            "request {id} {} timed out after {}ms",
            flight.kind,
            self.timings.loading_timeout.as_millis()
        ));
        self.refresh_loading();
        self.fail(ClientError::TimedOut(self.timings.loading_timeout));
    }

    /// Visible iff at least one live request is in flight.
    fn refresh_loading(&mut self) {
        let visible = !self.state.in_flight.is_empty();
        if visible != self.state.loading_visible {
            self.state.loading_visible = visible;
            self.ui.loading(visible);
        }
    }

    // -- Timers -------------------------------------------------------------

    /// Fire every timer due at `now`.
    pub fn fire_due(&mut self, now: Instant) {
        for timer in self.state.timers.take_due(now) {
            match timer {
                TimerKind::RefreshAnalytics => {
                    if self.state.panels.active() == Panel::Analytics {
                        let snapshot = self.state.analytics_snapshot();
                        self.ui.analytics(&snapshot);
                    }
                }
                TimerKind::DismissNotification(id) => self.dismiss_notification(id),
                TimerKind::LoadingTimeout(id) => self.time_out(id),
            }
        }
    }
}

impl<U: Ui> EventHandler for AppController<U> {
    fn handle(&mut self, event: Event) {
        match event {
            Event::NavClicked(id) => {
                let _ = self.navigate(&id);
            }
            Event::Key(chord) => {
                if chord.key == Key::Escape {
                    self.dismiss_loading();
                } else if let Some(panel) = Panel::from_chord(&chord) {
                    self.show_panel(panel);
                }
            }
            Event::SubmitSingle(text) => self.submit_single(&text),
            Event::SubmitBatch(raw) => self.submit_batch(&raw),
            Event::SubmitUpload(path) => self.submit_upload(path),
            Event::FilesDropped(paths) => self.submit_upload(paths.into_iter().next()),
            Event::GenerateWordCloud => self.generate_word_cloud(),
            Event::DismissLoading => self.dismiss_loading(),
            Event::Completed(completion) => self.complete(completion),
            Event::Tick(now) => self.fire_due(now),
            Event::Quit => {}
        }
    }
}
