//! Failure taxonomy for backend operations.

use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;

/// How loudly a failure is surfaced to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// The user can fix it (bad input, missing file).
    Warning,
    /// The backend or the network failed.
    Danger,
}

/// Which input box was left empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    /// The single-text box.
    Text,
    /// The newline-separated batch box.
    Batch,
}

/// A classified failure from [`super::AnalysisClient`].
///
/// Validation variants are produced before any network traffic. `Server`,
/// `Network`, and `MalformedResponse` come from the transport. `TimedOut` is
/// raised by the controller when a request outlives the loading timeout.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ClientError {
    #[error("no text to analyze")]
    EmptyInput(InputKind),
    #[error("no file selected")]
    MissingFile,
    #[error("not a CSV file: {0}")]
    InvalidFileType(String),
    #[error("no analyzed texts to build a word cloud from")]
    EmptyCorpus,
    #[error("failed to read {}: {reason}", path.display())]
    FileRead { path: PathBuf, reason: String },
    #[error("server error: {0}")]
    Server(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("malformed response: {0}")]
    MalformedResponse(String),
    #[error("no response after {0:?}")]
    TimedOut(Duration),
}

impl ClientError {
    pub fn severity(&self) -> Severity {
        match self {
            Self::EmptyInput(_)
            | Self::MissingFile
            | Self::InvalidFileType(_)
            | Self::EmptyCorpus
            | Self::FileRead { .. } => Severity::Warning,
            Self::Server(_)
            | Self::Network(_)
            | Self::MalformedResponse(_)
            | Self::TimedOut(_) => Severity::Danger,
        }
    }

    /// Text shown in the notification for this failure.
    pub fn user_message(&self) -> String {
        match self {
            Self::EmptyInput(InputKind::Text) => {
                "Please enter some text to analyze.".to_string()
            }
            Self::EmptyInput(InputKind::Batch) => {
                "Please enter some texts to analyze.".to_string()
            }
            Self::MissingFile => "Please select a file.".to_string(),
            Self::InvalidFileType(_) => "Please upload a CSV file.".to_string(),
            Self::EmptyCorpus => "No texts available for word cloud generation.".to_string(),
            Self::FileRead { path, .. } => format!("Could not read {}.", path.display()),
            Self::Server(message) => message.clone(),
            Self::Network(_) => "Network error. Please try again.".to_string(),
            Self::MalformedResponse(_) => {
                "The server sent a response that could not be read.".to_string()
            }
            Self::TimedOut(_) => "Request timed out.".to_string(),
        }
    }

    /// True for failures raised by local validation, before any request.
    pub fn is_validation(&self) -> bool {
        self.severity() == Severity::Warning
    }
}
