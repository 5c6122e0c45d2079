// Pipeline stages: one per external check.
//
// A stage either lets the submission continue (recording its outcome in the
// report) or rejects it with a FeedbackError. Only the spam stage ever rejects.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{info, warn};

use super::{CheckOutcome, FeedbackInput, ModerationReport, RequestMeta, SpamVerdict, ToxicitySignal};
use crate::error::FeedbackError;
use crate::spam::traits::{SpamChecker, SpamQuery, FEEDBACK_COMMENT_TYPE};
use crate::toxicity::traits::ToxicityScorer;

/// Client-facing message for a blocked submission.
pub const SPAM_DETECTED: &str = "Spam detected.";

/// One step of the moderation pipeline.
#[async_trait]
pub trait ModerationStage: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Run the check. `Err` stops the pipeline and becomes the response.
    async fn run(
        &self,
        input: &FeedbackInput,
        meta: &RequestMeta,
        report: &mut ModerationReport,
    ) -> Result<(), FeedbackError>;
}

/// Advisory toxicity scoring. Never rejects.
pub struct ToxicityStage {
    scorer: Arc<dyn ToxicityScorer>,
    timeout: Duration,
}

impl ToxicityStage {
    pub fn new(scorer: Arc<dyn ToxicityScorer>, timeout: Duration) -> Self {
        Self { scorer, timeout }
    }
}

#[async_trait]
impl ModerationStage for ToxicityStage {
    fn name(&self) -> &'static str {
        "toxicity"
    }

    async fn run(
        &self,
        input: &FeedbackInput,
        _meta: &RequestMeta,
        report: &mut ModerationReport,
    ) -> Result<(), FeedbackError> {
        let outcome = match tokio::time::timeout(self.timeout, self.scorer.score_text(&input.body))
            .await
        {
            Ok(Ok(result)) if result.toxicity.is_finite() => CheckOutcome::Verdict(ToxicitySignal {
                toxicity: result.toxicity.clamp(0.0, 1.0),
            }),
            Ok(Ok(result)) => {
                warn!(score = result.toxicity, "Toxicity scorer returned a non-finite score");
                CheckOutcome::Failed("non-finite score".to_string())
            }
            Ok(Err(e)) => {
                warn!(error = %e, "Toxicity check failed");
                CheckOutcome::Failed(e.to_string())
            }
            Err(_) => {
                warn!(timeout_ms = self.timeout.as_millis() as u64, "Toxicity check timed out");
                CheckOutcome::Failed(format!("timed out after {:?}", self.timeout))
            }
        };

        report.toxicity = outcome;
        Ok(())
    }
}

/// Spam classification. Rejects flagged submissions unless spam is allowed.
pub struct SpamStage {
    checker: Arc<dyn SpamChecker>,
    allow_spam: bool,
    /// Reported as the site when the request has no Origin header.
    fallback_site: Option<String>,
    timeout: Duration,
}

impl SpamStage {
    pub fn new(checker: Arc<dyn SpamChecker>, allow_spam: bool, timeout: Duration) -> Self {
        Self {
            checker,
            allow_spam,
            fallback_site: None,
            timeout,
        }
    }

    pub fn with_fallback_site(mut self, site: Option<String>) -> Self {
        self.fallback_site = site;
        self
    }

    fn query(&self, input: &FeedbackInput, meta: &RequestMeta) -> SpamQuery {
        SpamQuery {
            site: meta.origin.clone().or_else(|| self.fallback_site.clone()),
            user_ip: meta.client_ip.clone(),
            user_agent: meta.user_agent.clone(),
            referrer: meta.referrer.clone(),
            comment_type: FEEDBACK_COMMENT_TYPE.to_string(),
            content: input.body.clone(),
        }
    }
}

#[async_trait]
impl ModerationStage for SpamStage {
    fn name(&self) -> &'static str {
        "spam"
    }

    async fn run(
        &self,
        input: &FeedbackInput,
        meta: &RequestMeta,
        report: &mut ModerationReport,
    ) -> Result<(), FeedbackError> {
        let query = self.query(input, meta);

        let outcome = match tokio::time::timeout(self.timeout, self.checker.check(&query)).await {
            Ok(Ok(Some(true))) if !self.allow_spam => {
                info!(client_ip = ?meta.client_ip, "Blocked submission flagged as spam");
                return Err(FeedbackError::bad_request(SPAM_DETECTED));
            }
            Ok(Ok(Some(spam))) => {
                if spam {
                    info!("Submission flagged as spam, passing through (ALLOW_SPAM)");
                }
                CheckOutcome::Verdict(SpamVerdict { spam })
            }
            Ok(Ok(None)) => CheckOutcome::Inconclusive,
            Ok(Err(e)) => {
                warn!(error = %e, "Spam check failed");
                CheckOutcome::Failed(e.to_string())
            }
            Err(_) => {
                warn!(timeout_ms = self.timeout.as_millis() as u64, "Spam check timed out");
                CheckOutcome::Failed(format!("timed out after {:?}", self.timeout))
            }
        };

        report.spam = outcome;
        Ok(())
    }
}
