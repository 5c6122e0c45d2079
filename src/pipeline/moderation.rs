// Moderation driver: runs the configured stages in order.
//
// Stages run one after another; the first rejection ends the run and later
// stages never start. The pipeline is built once at startup and shared
// read-only across requests.

use std::sync::Arc;

use anyhow::Result;
use tracing::debug;

use super::stages::{ModerationStage, SpamStage, ToxicityStage};
use super::{FeedbackInput, ModerationContext, ModerationReport, RequestMeta};
use crate::config::Config;
use crate::error::FeedbackError;
use crate::spam::akismet::AkismetChecker;
use crate::toxicity::perspective::PerspectiveScorer;

#[derive(Default)]
pub struct ModerationPipeline {
    stages: Vec<Box<dyn ModerationStage>>,
}

impl ModerationPipeline {
    /// An empty pipeline: every submission passes with no signals.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the production pipeline: toxicity first, then spam, each only
    /// if enabled in `config`.
    pub fn from_config(config: &Config) -> Result<Self> {
        // Config::load already runs the require_* checks; repeated for hand-built configs.
        let mut pipeline = Self::new();

        if config.perspective_enabled {
            config.require_perspective()?;
            let scorer =
                PerspectiveScorer::new(config.perspective_api_key.clone(), config.check_timeout)?;
            pipeline = pipeline.with_stage(ToxicityStage::new(Arc::new(scorer), config.check_timeout));
        }

        if config.akismet_enabled {
            config.require_akismet()?;
            let checker = AkismetChecker::new(config.akismet_api_key.clone(), config.check_timeout)?;
            pipeline = pipeline.with_stage(
                SpamStage::new(Arc::new(checker), config.allow_spam, config.check_timeout)
                    .with_fallback_site(config.akismet_site.clone()),
            );
        }

        Ok(pipeline)
    }

    /// Append a stage. Stages run in the order they were added.
    pub fn with_stage(mut self, stage: impl ModerationStage + 'static) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Run every stage and return the per-check outcomes.
    pub async fn moderate(
        &self,
        input: &FeedbackInput,
        meta: &RequestMeta,
    ) -> Result<ModerationReport, FeedbackError> {
        let mut report = ModerationReport::default();
        for stage in &self.stages {
            stage.run(input, meta, &mut report).await?;
            debug!(stage = stage.name(), "Moderation stage passed");
        }
        Ok(report)
    }

    /// Run every stage and build the context handed to the backend.
    pub async fn run(
        &self,
        input: FeedbackInput,
        meta: &RequestMeta,
    ) -> Result<ModerationContext, FeedbackError> {
        let report = self.moderate(&input, meta).await?;
        Ok(report.into_context(input))
    }
}
