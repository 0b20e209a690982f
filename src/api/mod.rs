//! Client for the sentiment-analysis backend.
//!
//! Every operation validates its input locally first and makes no network
//! call when validation fails. Wire failures are classified into
//! [`ClientError`] variants with an operation-specific fallback message for
//! servers that return no `error` field.
//!
//! Operations are independent: the client holds no per-request state, so it
//! can be shared across worker threads and invoked concurrently.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::{Value, json};

pub mod error;
pub mod transport;
pub mod types;

pub use error::{ClientError, InputKind, Severity};
pub use transport::{FilePart, HttpTransport, Transport, TransportError};
pub use types::{
    AnalysisResult, ModelScore, Sentiment, ServerInfo, UploadOutcome, UploadSummary,
    WordCloudImage,
};

use crate::config::SentiscopeConfig;
use types::BatchResponse;

/// Extension an uploaded file must carry.
const CSV_EXTENSION: &str = ".csv";

/// Multipart field name the backend reads the upload from.
const UPLOAD_FIELD: &str = "file";

/// Backend client. Cheap to clone.
#[derive(Clone)]
pub struct AnalysisClient {
    transport: Arc<dyn Transport>,
}

impl AnalysisClient {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Build an HTTP client from the resolved config.
    pub fn from_config(config: &SentiscopeConfig) -> Self {
        let transport = HttpTransport::new(
            &config.api.base_url,
            Duration::from_millis(config.api.timeout_ms),
        );
        Self::new(Arc::new(transport))
    }

    /// Analyze a single text. The text is trimmed before it is sent.
    pub fn analyze_single(&self, text: &str) -> Result<AnalysisResult, ClientError> {
        let text = validate_text(text)?;

        let mut result: AnalysisResult = self.post(
            "/api/analyze",
            &json!({ "text": text }),
            "Analysis failed.",
        )?;
        if result.text.is_empty() {
            result.text = text.to_string();
        }
        Ok(result)
    }

    /// Analyze pre-split lines (see [`prepare_batch`]). Results come back in
    /// input order, one per line.
    pub fn analyze_batch(&self, lines: &[String]) -> Result<Vec<AnalysisResult>, ClientError> {
        if lines.is_empty() {
            return Err(ClientError::EmptyInput(InputKind::Batch));
        }

        let response: BatchResponse = self.post(
            "/api/analyze-batch",
            &json!({ "texts": lines }),
            "Batch analysis failed.",
        )?;
        Ok(response.results)
    }

    /// Upload a CSV file whose first column holds the texts to analyze.
    pub fn upload_csv(&self, path: Option<&Path>) -> Result<UploadOutcome, ClientError> {
        let path = validate_upload(path)?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let bytes = std::fs::read(path).map_err(|e| ClientError::FileRead {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let file = FilePart {
            field: UPLOAD_FIELD,
            file_name: &file_name,
            content_type: "text/csv",
            bytes: &bytes,
        };
        let value = self
            .transport
            .post_file("/api/upload-csv", file)
            .map_err(|e| e.classify("File upload failed."))?;
        decode(value)
    }

    /// Render a word cloud from every text analyzed so far.
    pub fn generate_word_cloud(&self, corpus: &[String]) -> Result<WordCloudImage, ClientError> {
        if corpus.is_empty() {
            return Err(ClientError::EmptyCorpus);
        }

        self.post(
            "/api/wordcloud",
            &json!({ "texts": corpus }),
            "Word cloud generation failed.",
        )
    }

    /// Backend status, version, and model list.
    pub fn server_info(&self) -> Result<ServerInfo, ClientError> {
        let value = self
            .transport
            .get_json("/api/stats")
            .map_err(|e| e.classify("Server info request failed."))?;
        decode(value)
    }

    fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &Value,
        fallback: &str,
    ) -> Result<T, ClientError> {
        let value = self
            .transport
            .post_json(path, body)
            .map_err(|e| e.classify(fallback))?;
        decode(value)
    }
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T, ClientError> {
    serde_json::from_value(value).map_err(|e| ClientError::MalformedResponse(e.to_string()))
}

/// Trim a single text, rejecting it when nothing is left.
pub fn validate_text(text: &str) -> Result<&str, ClientError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ClientError::EmptyInput(InputKind::Text));
    }
    Ok(text)
}

/// Split raw batch input into the lines to analyze.
///
/// The input is trimmed as a whole, split on newlines, and lines that are
/// blank after trimming are dropped. Surviving lines keep their order and
/// inner content.
pub fn prepare_batch(raw: &str) -> Result<Vec<String>, ClientError> {
    let lines: Vec<String> = raw
        .trim()
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(str::to_string)
        .collect();

    if lines.is_empty() {
        return Err(ClientError::EmptyInput(InputKind::Batch));
    }
    Ok(lines)
}

/// Check that a file was chosen and that it is a CSV.
pub fn validate_upload(path: Option<&Path>) -> Result<&Path, ClientError> {
    let path = path.ok_or(ClientError::MissingFile)?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    if !name.ends_with(CSV_EXTENSION) {
        return Err(ClientError::InvalidFileType(name));
    }
    Ok(path)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
