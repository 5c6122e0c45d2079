// Google Perspective API implementation.
//
// Only the TOXICITY attribute is requested: the moderation context exposes a
// single scalar score. Submissions are sent with doNotStore so feedback text
// is not retained by the service.
//
// API docs: https://developers.perspectiveapi.com/s/about-the-api-methods

use std::collections::HashMap;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::traits::{ToxicityResult, ToxicityScorer};

pub const DEFAULT_PERSPECTIVE_URL: &str =
    "https://commentanalyzer.googleapis.com/v1alpha1/comments:analyze";

/// Longest text (in characters) sent for scoring. Longer bodies are cut.
pub const MAX_SCORED_CHARS: usize = 3000;

/// Perspective API toxicity scorer.
pub struct PerspectiveScorer {
    client: Client,
    api_key: String,
    url: String,
}

impl PerspectiveScorer {
    /// Create a new Perspective API scorer with the given API key.
    /// `timeout` bounds the whole request, connect through body.
    pub fn new(api_key: String, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            api_key,
            url: DEFAULT_PERSPECTIVE_URL.to_string(),
        })
    }

    /// Point the scorer at a different analyze endpoint (e.g. a local stub).
    pub fn with_url(mut self, url: &str) -> Self {
        self.url = url.to_string();
        self
    }
}

#[async_trait]
impl ToxicityScorer for PerspectiveScorer {
    async fn score_text(&self, text: &str) -> Result<ToxicityResult> {
        let text = truncate_for_scoring(text, MAX_SCORED_CHARS);

        let request = PerspectiveRequest {
            comment: Comment { text },
            requested_attributes: RequestedAttributes {
                toxicity: AttributeConfig {},
            },
            do_not_store: true,
        };

        let response = self
            .client
            .post(&self.url)
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await
            .context("Failed to call Perspective API")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Perspective API returned {}: {}", status, body);
        }

        let result: PerspectiveResponse = response
            .json()
            .await
            .context("Failed to parse Perspective API response")?;

        let toxicity = toxicity_from_response(&result)?;
        debug!(toxicity = toxicity, "Scored text");

        Ok(ToxicityResult { toxicity })
    }
}

/// Pull the TOXICITY summary score out of a response, clamped into [0, 1].
///
/// A response without the attribute is an error, not a zero score.
pub fn toxicity_from_response(response: &PerspectiveResponse) -> Result<f64> {
    let value = response
        .attribute_scores
        .get("TOXICITY")
        .map(|score| score.summary_score.value)
        .context("Perspective response has no TOXICITY score")?;

    if !value.is_finite() {
        anyhow::bail!("Perspective returned a non-finite TOXICITY score");
    }
    Ok(value.clamp(0.0, 1.0))
}

/// Cut `text` to at most `max_chars` characters on a char boundary.
fn truncate_for_scoring(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => text[..byte_idx].to_string(),
        None => text.to_string(),
    }
}

// --- Perspective API request/response types ---

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PerspectiveRequest {
    comment: Comment,
    requested_attributes: RequestedAttributes,
    do_not_store: bool,
}

#[derive(Serialize)]
struct Comment {
    text: String,
}

#[derive(Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
struct RequestedAttributes {
    toxicity: AttributeConfig,
}

#[derive(Serialize)]
struct AttributeConfig {}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerspectiveResponse {
    #[serde(default)]
    pub attribute_scores: HashMap<String, AttributeScore>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeScore {
    pub summary_score: SummaryScore,
}

#[derive(Debug, Deserialize)]
pub struct SummaryScore {
    pub value: f64,
}
