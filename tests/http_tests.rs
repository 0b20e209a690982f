/// HTTP transport tests against a local fake backend.
///
/// Each test serves exactly the requests it expects on a `tiny_http` server
/// bound to an ephemeral port, then inspects what the client sent and how
/// the reply was classified.
use std::io::Read;
use std::net::TcpListener;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use sentiscope::api::{AnalysisClient, ClientError, HttpTransport, Sentiment};
use tiny_http::{Header, Response, Server};

/// What the fake backend saw.
#[derive(Debug)]
struct Seen {
    method: String,
    url: String,
    content_type: String,
    body: Vec<u8>,
}

/// Serve one request with the given status and JSON body.
fn serve_once(status: u16, reply: &'static str) -> (String, JoinHandle<Seen>) {
    let server = Server::http("127.0.0.1:0").unwrap();
    let port = server.server_addr().to_ip().unwrap().port();

    let handle = std::thread::spawn(move || {
        let mut request = server.recv().unwrap();
        let mut body = Vec::new();
        request.as_reader().read_to_end(&mut body).unwrap();
        let content_type = request
            .headers()
            .iter()
            .find(|h| h.field.equiv("Content-Type"))
            .map(|h| h.value.as_str().to_string())
            .unwrap_or_default();
        let seen = Seen {
            method: request.method().to_string(),
            url: request.url().to_string(),
            content_type,
            body,
        };

        let json = Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..]).unwrap();
        let response = Response::from_string(reply)
            .with_status_code(status)
            .with_header(json);
        request.respond(response).unwrap();
        seen
    });

    (format!("http://localhost:{port}"), handle)
}

fn client(base_url: &str) -> AnalysisClient {
    let transport = HttpTransport::new(base_url, Duration::from_secs(5));
    AnalysisClient::new(Arc::new(transport))
}

const ANALYSIS: &str = r#"{
    "text": "I love this",
    "overall_sentiment": "positive",
    "overall_confidence": 0.72,
    "textblob": {"sentiment": "positive", "polarity": 0.5, "subjectivity": 0.6, "confidence": 0.5},
    "vader": {"sentiment": "positive", "compound": 0.64, "confidence": 0.64},
    "custom": {"sentiment": "positive", "score": 2, "confidence": 1.0},
    "timestamp": "2026-10-19T10:00:00"
}"#;

#[test]
fn analyze_posts_trimmed_text_and_decodes_models() {
    let (url, server) = serve_once(200, ANALYSIS);
    let result = client(&url).analyze_single("  I love this \n").unwrap();
    let seen = server.join().unwrap();

    assert_eq!(seen.method, "POST");
    assert_eq!(seen.url, "/api/analyze");
    let body: serde_json::Value = serde_json::from_slice(&seen.body).unwrap();
    assert_eq!(body, serde_json::json!({ "text": "I love this" }));

    assert_eq!(result.overall_sentiment, Sentiment::Positive);
    assert_eq!(result.per_model.len(), 3);
    assert_eq!(result.per_model["custom"].raw_score, 2.0);
    assert_eq!(result.per_model["vader"].raw_score, 0.64);
}

#[test]
fn server_error_body_maps_to_server_message() {
    let (url, server) = serve_once(400, r#"{"error": "Text is required"}"#);
    let err = client(&url).analyze_single("hello").unwrap_err();
    server.join().unwrap();

    assert_eq!(err, ClientError::Server("Text is required".into()));
    assert_eq!(err.user_message(), "Text is required");
}

#[test]
fn server_error_without_json_uses_fallback() {
    let (url, server) = serve_once(500, "Internal Server Error");
    let err = client(&url)
        .generate_word_cloud(&["one".to_string()])
        .unwrap_err();
    server.join().unwrap();

    assert_eq!(err, ClientError::Server("Word cloud generation failed.".into()));
}

#[test]
fn success_with_unexpected_body_is_malformed() {
    let (url, server) = serve_once(200, r#"{"unexpected": true}"#);
    let err = client(&url)
        .analyze_batch(&["a".to_string()])
        .unwrap_err();
    server.join().unwrap();

    assert!(matches!(err, ClientError::MalformedResponse(_)));
}

#[test]
fn unreachable_host_is_network_error() {
    // Bind and drop to get a port nothing listens on.
    let port = TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();
    let err = client(&format!("http://127.0.0.1:{port}"))
        .analyze_single("hello")
        .unwrap_err();

    assert!(matches!(err, ClientError::Network(_)));
    assert_eq!(err.user_message(), "Network error. Please try again.");
}

#[test]
fn upload_sends_multipart_file_field() {
    let dir = tempfile::tempdir().unwrap();
    let csv = dir.path().join("reviews.csv");
    std::fs::write(&csv, "text\nGreat service\n").unwrap();

    let reply = r#"{
        "summary": {"total_texts": 1, "average_confidence": 0.8,
                    "sentiment_distribution": {"positive": 1}},
        "results": [{"text": "Great service", "overall_sentiment": "positive",
                     "overall_confidence": 0.8}]
    }"#;
    let (url, server) = serve_once(200, reply);
    let outcome = client(&url).upload_csv(Some(&csv)).unwrap();
    let seen = server.join().unwrap();

    assert_eq!(seen.url, "/api/upload-csv");
    assert!(seen.content_type.starts_with("multipart/form-data; boundary="));
    let body = String::from_utf8(seen.body).unwrap();
    assert!(body.contains("name=\"file\"; filename=\"reviews.csv\""));
    assert!(body.contains("text\nGreat service\n"));

    assert_eq!(outcome.summary.total_texts, 1);
    assert_eq!(outcome.summary.percentage(Sentiment::Positive), 100.0);
    assert_eq!(outcome.results[0].text, "Great service");
}

#[test]
fn server_info_reads_stats_endpoint() {
    let reply = r#"{"status": "running", "version": "1.0.0",
                    "models": ["TextBlob", "VADER", "Custom"],
                    "endpoints": ["/api/analyze"]}"#;
    let (url, server) = serve_once(200, reply);
    let info = client(&url).server_info().unwrap();
    let seen = server.join().unwrap();

    assert_eq!(seen.method, "GET");
    assert_eq!(seen.url, "/api/stats");
    assert_eq!(info.status, "running");
    assert_eq!(info.models.len(), 3);
}
