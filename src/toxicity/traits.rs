// Toxicity scorer trait: the swap-ready abstraction.

use anyhow::Result;
use async_trait::async_trait;

/// The result of scoring a single piece of text for toxicity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToxicityResult {
    /// Overall toxicity score from 0.0 (benign) to 1.0 (very toxic)
    pub toxicity: f64,
}

/// Trait for scoring text toxicity. Implementations must be async because
/// most providers require HTTP API calls.
///
/// Any error is treated as "no signal" by the moderation pipeline, so
/// implementations should fail rather than guess a score.
#[async_trait]
pub trait ToxicityScorer: Send + Sync {
    /// Score a single text for toxicity.
    async fn score_text(&self, text: &str) -> Result<ToxicityResult>;
}
