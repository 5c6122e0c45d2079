use anyhow::Result;
use async_trait::async_trait;

/// Comment type reported to the spam service for every submission.
pub const FEEDBACK_COMMENT_TYPE: &str = "feedback";

/// What the spam service needs to know about one submission.
#[derive(Debug, Clone, Default)]
pub struct SpamQuery {
    /// The site the feedback was submitted from (Origin header or configured site).
    pub site: Option<String>,
    pub user_ip: Option<String>,
    pub user_agent: Option<String>,
    pub referrer: Option<String>,
    pub comment_type: String,
    pub content: String,
}

/// Trait for classifying a submission as spam.
///
/// `Ok(None)` means the service answered without a usable verdict; the
/// pipeline treats it the same as a failed check.
#[async_trait]
pub trait SpamChecker: Send + Sync {
    async fn check(&self, query: &SpamQuery) -> Result<Option<bool>>;
}
