//! Typed views of the backend's JSON payloads.
//!
//! Responses are decoded once, here, into explicit structures. Callers never
//! inspect ad-hoc fields of raw JSON.

use std::collections::BTreeMap;
use std::fmt;

use base64::Engine;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Sentiment
// ---------------------------------------------------------------------------

/// Polarity label assigned by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

impl Sentiment {
    pub const ALL: [Sentiment; 3] = [Self::Positive, Self::Negative, Self::Neutral];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Positive => "positive",
            Self::Negative => "negative",
            Self::Neutral => "neutral",
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Analysis results
// ---------------------------------------------------------------------------

/// One model's verdict on a text.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelScore {
    pub sentiment: Sentiment,
    pub confidence: f64,
    /// The model's native score: TextBlob polarity, VADER compound, or the
    /// keyword model's normalized score.
    pub raw_score: f64,
}

/// Fields that carry a model's native score, in lookup order.
const RAW_SCORE_FIELDS: [&str; 3] = ["polarity", "compound", "score"];

/// A fully decoded analysis of one text. Serializes back to the wire shape it
/// was read from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "WireAnalysis", into = "WireAnalysis")]
pub struct AnalysisResult {
    pub text: String,
    pub overall_sentiment: Sentiment,
    pub overall_confidence: f64,
    pub per_model: BTreeMap<String, ModelScore>,
    pub timestamp: Option<String>,
}

/// Wire shape of an analysis: fixed overall fields plus one object per model
/// (`textblob`, `vader`, `custom`, ...).
#[derive(Debug, Serialize, Deserialize)]
struct WireAnalysis {
    #[serde(default)]
    text: String,
    overall_sentiment: Sentiment,
    overall_confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    timestamp: Option<String>,
    #[serde(flatten)]
    extra: BTreeMap<String, serde_json::Value>,
}

impl TryFrom<WireAnalysis> for AnalysisResult {
    type Error = String;

    fn try_from(wire: WireAnalysis) -> Result<Self, Self::Error> {
        let mut per_model = BTreeMap::new();

        for (name, value) in wire.extra {
            let Some(object) = value.as_object() else {
                continue;
            };
            let (Some(sentiment), Some(confidence)) = (
                object.get("sentiment").and_then(|s| s.as_str()),
                object.get("confidence").and_then(|c| c.as_f64()),
            ) else {
                continue;
            };
            let sentiment = parse_sentiment(sentiment)
                .ok_or_else(|| format!("model '{name}' has unknown sentiment '{sentiment}'"))?;
            let raw_score = RAW_SCORE_FIELDS
                .iter()
                .find_map(|field| object.get(*field).and_then(|v| v.as_f64()))
                .unwrap_or(0.0);

            per_model.insert(
                name,
                ModelScore {
                    sentiment,
                    confidence,
                    raw_score,
                },
            );
        }

        Ok(Self {
            text: wire.text,
            overall_sentiment: wire.overall_sentiment,
            overall_confidence: wire.overall_confidence,
            per_model,
            timestamp: wire.timestamp,
        })
    }
}

impl From<AnalysisResult> for WireAnalysis {
    fn from(result: AnalysisResult) -> Self {
        let extra = result
            .per_model
            .into_iter()
            .map(|(name, model)| {
                let object = serde_json::json!({
                    "sentiment": model.sentiment,
                    "confidence": model.confidence,
                    "score": model.raw_score,
                });
                (name, object)
            })
            .collect();

        Self {
            text: result.text,
            overall_sentiment: result.overall_sentiment,
            overall_confidence: result.overall_confidence,
            timestamp: result.timestamp,
            extra,
        }
    }
}

fn parse_sentiment(raw: &str) -> Option<Sentiment> {
    Sentiment::ALL.into_iter().find(|s| s.as_str() == raw)
}

/// `POST /api/analyze-batch` response.
#[derive(Debug, Deserialize)]
pub(crate) struct BatchResponse {
    pub results: Vec<AnalysisResult>,
}

// ---------------------------------------------------------------------------
// CSV upload
// ---------------------------------------------------------------------------

/// Aggregate over the rows of an uploaded CSV.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadSummary {
    pub total_texts: usize,
    #[serde(default)]
    pub average_confidence: f64,
    #[serde(default)]
    pub sentiment_distribution: BTreeMap<Sentiment, usize>,
}

impl UploadSummary {
    /// Share of rows with the given sentiment, in percent.
    pub fn percentage(&self, sentiment: Sentiment) -> f64 {
        if self.total_texts == 0 {
            return 0.0;
        }
        let count = self.sentiment_distribution.get(&sentiment).copied().unwrap_or(0);
        count as f64 / self.total_texts as f64 * 100.0
    }
}

/// `POST /api/upload-csv` response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadOutcome {
    pub summary: UploadSummary,
    pub results: Vec<AnalysisResult>,
}

// ---------------------------------------------------------------------------
// Word cloud
// ---------------------------------------------------------------------------

/// Base64-encoded word-cloud image, passed through to the renderer as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordCloudImage {
    #[serde(rename = "wordcloud")]
    pub base64: String,
}

impl WordCloudImage {
    /// Decode the image bytes (PNG as produced by the backend).
    pub fn decode(&self) -> Result<Vec<u8>, base64::DecodeError> {
        base64::engine::general_purpose::STANDARD.decode(self.base64.trim())
    }
}

// ---------------------------------------------------------------------------
// Server info
// ---------------------------------------------------------------------------

/// `GET /api/stats` response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerInfo {
    pub status: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub models: Vec<String>,
    #[serde(default)]
    pub endpoints: Vec<String>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
