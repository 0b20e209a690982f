//! In-flight request bookkeeping.
//!
//! Requests run off the event-loop thread. Each one owns a [`CancelToken`]
//! shared with its job; the controller flips it when the user dismisses the
//! loading indicator or the safety timeout fires, and a completion whose
//! token is cancelled is never applied.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use crate::api::{AnalysisResult, ClientError, UploadOutcome, WordCloudImage};
use crate::ui::Panel;

/// Identifier of one submitted request.
pub type RequestId = u64;

/// Shared cancellation flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Which backend operation a request performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Single,
    Batch,
    Upload,
    WordCloud,
}

impl RequestKind {
    /// Panel whose result area the response is rendered into.
    pub fn panel(self) -> Panel {
        match self {
            Self::Single => Panel::Single,
            Self::Batch => Panel::Batch,
            Self::Upload => Panel::Upload,
            Self::WordCloud => Panel::Analytics,
        }
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Single => "analyze",
            Self::Batch => "analyze-batch",
            Self::Upload => "upload-csv",
            Self::WordCloud => "wordcloud",
        };
        f.write_str(name)
    }
}

/// A request that has been submitted and not yet settled.
#[derive(Debug, Clone)]
pub struct InFlight {
    pub kind: RequestKind,
    pub token: CancelToken,
    pub started: Instant,
}

/// Successful payload of a settled request, with whatever the completion
/// handler needs to update session state.
#[derive(Debug, Clone)]
pub enum Outcome {
    Single {
        text: String,
        result: AnalysisResult,
    },
    Batch {
        lines: Vec<String>,
        results: Vec<AnalysisResult>,
    },
    Upload(UploadOutcome),
    WordCloud {
        image: WordCloudImage,
        corpus_size: usize,
    },
}

/// Message a finished job sends back to the event loop.
#[derive(Debug, Clone)]
pub struct Completion {
    pub id: RequestId,
    pub result: Result<Outcome, ClientError>,
}

/// Work handed to a [`RequestRunner`].
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Executes request jobs away from the event loop.
pub trait RequestRunner {
    fn spawn(&self, job: Job);
}

/// Runs every job on its own OS thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRunner;

impl RequestRunner for ThreadRunner {
    fn spawn(&self, job: Job) {
        std::thread::spawn(job);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancel_is_visible_through_clones() {
        let token = CancelToken::new();
        let shared = token.clone();
        assert!(!shared.is_cancelled());
        token.cancel();
        assert!(shared.is_cancelled());
    }

    #[test]
    fn word_cloud_renders_on_analytics_panel() {
        assert_eq!(RequestKind::WordCloud.panel(), Panel::Analytics);
        assert_eq!(RequestKind::Batch.panel(), Panel::Batch);
        assert_eq!(RequestKind::Upload.to_string(), "upload-csv");
    }

    #[test]
    fn thread_runner_runs_job() {
        let (tx, rx) = std::sync::mpsc::channel();
        ThreadRunner.spawn(Box::new(move || {
            let _ = tx.send(7);
        }));
        assert_eq!(rx.recv().unwrap(), 7);
    }
}
