// Akismet comment-check implementation.
//
// Akismet answers with a bare "true" (spam) or "false" (ham). Anything else
// is a failure; "invalid" usually means a bad key or missing blog URL, with
// the reason in the X-akismet-debug-help header.
//
// API docs: https://akismet.com/developers/detailed-docs/comment-check/

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use super::traits::{SpamChecker, SpamQuery};

pub const DEFAULT_AKISMET_URL: &str = "https://rest.akismet.com/1.1/comment-check";

const DEBUG_HELP_HEADER: &str = "x-akismet-debug-help";

/// Akismet spam checker.
pub struct AkismetChecker {
    client: Client,
    api_key: String,
    url: String,
}

impl AkismetChecker {
    pub fn new(api_key: String, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("feedback-core/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            api_key,
            url: DEFAULT_AKISMET_URL.to_string(),
        })
    }

    /// Point the checker at a different comment-check endpoint.
    pub fn with_url(mut self, url: &str) -> Self {
        self.url = url.to_string();
        self
    }
}

#[async_trait]
impl SpamChecker for AkismetChecker {
    async fn check(&self, query: &SpamQuery) -> Result<Option<bool>> {
        let form = [
            ("api_key", self.api_key.as_str()),
            ("blog", query.site.as_deref().unwrap_or_default()),
            ("user_ip", query.user_ip.as_deref().unwrap_or_default()),
            ("user_agent", query.user_agent.as_deref().unwrap_or_default()),
            ("referrer", query.referrer.as_deref().unwrap_or_default()),
            ("comment_type", query.comment_type.as_str()),
            ("comment_content", query.content.as_str()),
        ];

        let response = self
            .client
            .post(&self.url)
            .form(&form)
            .send()
            .await
            .context("Failed to call Akismet")?;

        let status = response.status();
        let debug_help = response
            .headers()
            .get(DEBUG_HELP_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response
            .text()
            .await
            .context("Failed to read Akismet response")?;

        if !status.is_success() {
            anyhow::bail!("Akismet returned {}: {}", status, body);
        }

        let verdict = parse_verdict(&body, debug_help.as_deref())?;
        debug!(verdict = ?verdict, "Akismet comment-check complete");
        Ok(verdict)
    }
}

/// Interpret a comment-check response body.
///
/// An empty body is "no opinion"; "invalid" and anything unrecognised are errors.
pub fn parse_verdict(body: &str, debug_help: Option<&str>) -> Result<Option<bool>> {
    match body.trim() {
        "true" => Ok(Some(true)),
        "false" => Ok(Some(false)),
        "" => Ok(None),
        "invalid" => anyhow::bail!(
            "Akismet rejected the request: {}",
            debug_help.unwrap_or("no debug help provided")
        ),
        other => anyhow::bail!("Unexpected Akismet response: {other}"),
    }
}
