//! HTTP transport for the sentiment backend.
//!
//! The [`Transport`] trait is the seam between request validation (in
//! [`super::AnalysisClient`]) and the wire. [`HttpTransport`] is the
//! synchronous `ureq` implementation used by the CLI. Tests substitute
//! in-memory fakes.

use std::time::Duration;

use serde_json::Value;

use super::error::ClientError;

/// Raw wire failure, before the caller picks a fallback message.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportError {
    /// The server answered with a non-success status. `message` is the
    /// body's `error` field when there was one.
    Status { code: u16, message: Option<String> },
    /// No response was obtained (connect, DNS, TLS, timeout).
    Network(String),
    /// A success status whose body was not the expected JSON.
    Malformed(String),
}

impl TransportError {
    /// Classify into a [`ClientError`], using `fallback` when the server gave
    /// no message of its own.
    pub fn classify(self, fallback: &str) -> ClientError {
        match self {
            Self::Status { message, .. } => {
                ClientError::Server(message.unwrap_or_else(|| fallback.to_string()))
            }
            Self::Network(detail) => ClientError::Network(detail),
            Self::Malformed(detail) => ClientError::MalformedResponse(detail),
        }
    }
}

/// A file attached to a multipart request.
#[derive(Debug, Clone)]
pub struct FilePart<'a> {
    pub field: &'a str,
    pub file_name: &'a str,
    pub content_type: &'a str,
    pub bytes: &'a [u8],
}

/// One round trip to the backend. Implementations must be shareable across
/// the worker threads that run requests.
pub trait Transport: Send + Sync {
    fn get_json(&self, path: &str) -> Result<Value, TransportError>;
    fn post_json(&self, path: &str, body: &Value) -> Result<Value, TransportError>;
    fn post_file(&self, path: &str, file: FilePart<'_>) -> Result<Value, TransportError>;
}

// ---------------------------------------------------------------------------
// ureq implementation
// ---------------------------------------------------------------------------

/// Synchronous HTTP transport.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    base_url: String,
    timeout: Duration,
}

impl HttpTransport {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        // On Windows, "localhost" may try IPv6 (::1) first, causing delays
        // when the backend only binds to IPv4.
        let base_url = base_url
            .trim_end_matches('/')
            .replace("://localhost", "://127.0.0.1");
        Self { base_url, timeout }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Transport for HttpTransport {
    fn get_json(&self, path: &str) -> Result<Value, TransportError> {
        let result = ureq::get(&self.url(path)).timeout(self.timeout).call();
        read_response(result)
    }

    fn post_json(&self, path: &str, body: &Value) -> Result<Value, TransportError> {
        let result = ureq::post(&self.url(path))
            .timeout(self.timeout)
            .send_json(body);
        read_response(result)
    }

    fn post_file(&self, path: &str, file: FilePart<'_>) -> Result<Value, TransportError> {
        let boundary = multipart_boundary();
        let body = multipart_body(&boundary, &file);
        let result = ureq::post(&self.url(path))
            .timeout(self.timeout)
            .set(
                "Content-Type",
                &format!("multipart/form-data; boundary={boundary}"),
            )
            .send_bytes(&body);
        read_response(result)
    }
}

/// Turn a ureq outcome into parsed JSON or a classified failure.
fn read_response(result: Result<ureq::Response, ureq::Error>) -> Result<Value, TransportError> {
    match result {
        Ok(resp) => resp
            .into_json::<Value>()
            .map_err(|e| TransportError::Malformed(e.to_string())),
        Err(ureq::Error::Status(code, resp)) => {
            let message = resp
                .into_json::<Value>()
                .ok()
                .and_then(|body| error_message(&body));
            Err(TransportError::Status { code, message })
        }
        Err(ureq::Error::Transport(transport)) => {
            Err(TransportError::Network(transport.to_string()))
        }
    }
}

/// Extract the backend's `{"error": "..."}` message, if any.
fn error_message(body: &Value) -> Option<String> {
    body.get("error")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
}

fn multipart_boundary() -> String {
    let nanos = chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default();
    format!("----sentiscope{nanos:x}")
}

/// Encode a single-file `multipart/form-data` body.
fn multipart_body(boundary: &str, file: &FilePart<'_>) -> Vec<u8> {
    let file_name = file.file_name.replace('"', "");
    let mut body = Vec::with_capacity(file.bytes.len() + 256);
    body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
            file.field, file_name
        )
        .as_bytes(),
    );
    body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", file.content_type).as_bytes());
    body.extend_from_slice(file.bytes);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    body
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
