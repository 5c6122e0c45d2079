// Moderation pipeline: the checks a submission passes through before the
// backend sees it.
//
// Each check is a stage; the driver in `moderation` runs them in order and
// stops at the first stage that rejects the submission. Stages record what
// they saw in a ModerationReport, which collapses into the ModerationContext
// handed to the backend.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub mod moderation;
pub mod stages;

/// A parsed feedback submission. `body` is guaranteed non-empty by the
/// dispatcher; every other field the caller sent is kept in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackInput {
    pub body: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FeedbackInput {
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            extra: Map::new(),
        }
    }
}

/// Request metadata the spam check needs. All fields are optional: a missing
/// header is passed on as empty rather than failing the request.
#[derive(Debug, Clone, Default)]
pub struct RequestMeta {
    pub origin: Option<String>,
    pub client_ip: Option<String>,
    pub user_agent: Option<String>,
    pub referrer: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ToxicitySignal {
    pub toxicity: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpamVerdict {
    pub spam: bool,
}

/// What happened to one advisory check on one request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", content = "value", rename_all = "snake_case")]
pub enum CheckOutcome<T> {
    /// The check is disabled.
    Skipped,
    /// The call failed or timed out. Carries the reason for logs.
    Failed(String),
    /// The service answered but gave no verdict.
    Inconclusive,
    Verdict(T),
}

impl<T> Default for CheckOutcome<T> {
    fn default() -> Self {
        CheckOutcome::Skipped
    }
}

impl<T> CheckOutcome<T> {
    /// Collapse to the backend-facing form: anything but a verdict is `None`.
    pub fn into_option(self) -> Option<T> {
        match self {
            CheckOutcome::Verdict(value) => Some(value),
            CheckOutcome::Skipped | CheckOutcome::Failed(_) | CheckOutcome::Inconclusive => None,
        }
    }
}

/// Per-check outcomes accumulated by the stages of one pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ModerationReport {
    pub toxicity: CheckOutcome<ToxicitySignal>,
    pub spam: CheckOutcome<SpamVerdict>,
}

impl ModerationReport {
    pub fn into_context(self, input: FeedbackInput) -> ModerationContext {
        ModerationContext {
            input,
            toxicity: self.toxicity.into_option(),
            akismet: self.spam.into_option(),
        }
    }
}

/// What the backend receives. A `None` signal means the check was disabled,
/// failed, or returned nothing; the backend cannot tell which.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModerationContext {
    pub input: FeedbackInput,
    pub toxicity: Option<ToxicitySignal>,
    pub akismet: Option<SpamVerdict>,
}
