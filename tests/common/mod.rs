// Shared fakes for integration tests: in-process checkers and a counting
// backend, so nothing here touches the network.

#![allow(dead_code)]

use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use axum::http::request::Parts;
use axum::http::{HeaderMap, StatusCode};
use serde_json::Value;

use feedback_core::backend::Backend;
use feedback_core::error::FeedbackError;
use feedback_core::pipeline::ModerationContext;
use feedback_core::spam::traits::{SpamChecker, SpamQuery};
use feedback_core::toxicity::traits::{ToxicityResult, ToxicityScorer};

/// How a fake check behaves.
#[derive(Clone)]
pub enum Behavior<T> {
    Return(T),
    Fail,
    /// Sleep this long before answering with the value.
    Hang(Duration, T),
}

pub struct FakeScorer {
    behavior: Behavior<f64>,
    pub calls: AtomicUsize,
}

impl FakeScorer {
    pub fn new(behavior: Behavior<f64>) -> Arc<Self> {
        Arc::new(Self {
            behavior,
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl ToxicityScorer for FakeScorer {
    async fn score_text(&self, _text: &str) -> Result<ToxicityResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.behavior {
            Behavior::Return(toxicity) => Ok(ToxicityResult { toxicity: *toxicity }),
            Behavior::Fail => anyhow::bail!("Perspective API returned 503 Service Unavailable"),
            Behavior::Hang(delay, toxicity) => {
                tokio::time::sleep(*delay).await;
                Ok(ToxicityResult { toxicity: *toxicity })
            }
        }
    }
}

pub struct FakeSpamChecker {
    behavior: Behavior<Option<bool>>,
    pub calls: AtomicUsize,
    pub last_query: Mutex<Option<SpamQuery>>,
}

impl FakeSpamChecker {
    pub fn new(behavior: Behavior<Option<bool>>) -> Arc<Self> {
        Arc::new(Self {
            behavior,
            calls: AtomicUsize::new(0),
            last_query: Mutex::new(None),
        })
    }
}

#[async_trait]
impl SpamChecker for FakeSpamChecker {
    async fn check(&self, query: &SpamQuery) -> Result<Option<bool>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_query.lock().unwrap() = Some(query.clone());
        match &self.behavior {
            Behavior::Return(verdict) => Ok(*verdict),
            Behavior::Fail => anyhow::bail!("Failed to call Akismet"),
            Behavior::Hang(delay, verdict) => {
                tokio::time::sleep(*delay).await;
                Ok(*verdict)
            }
        }
    }
}

/// What the fake backend does once called.
#[derive(Clone)]
pub enum BackendReply {
    Ok(Value),
    Err(Option<StatusCode>, String),
}

/// Backend that records every context it receives.
pub struct RecordingBackend {
    reply: BackendReply,
    pub contexts: Mutex<Vec<ModerationContext>>,
}

impl RecordingBackend {
    pub fn new(reply: BackendReply) -> Arc<Self> {
        Arc::new(Self {
            reply,
            contexts: Mutex::new(Vec::new()),
        })
    }

    pub fn returning(value: Value) -> Arc<Self> {
        Self::new(BackendReply::Ok(value))
    }

    pub fn call_count(&self) -> usize {
        self.contexts.lock().unwrap().len()
    }

    pub fn last_context(&self) -> Option<ModerationContext> {
        self.contexts.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl Backend for RecordingBackend {
    async fn handle(
        &self,
        context: ModerationContext,
        _request: &Parts,
        _response_headers: &mut HeaderMap,
    ) -> Result<Value, FeedbackError> {
        self.contexts.lock().unwrap().push(context);
        match &self.reply {
            BackendReply::Ok(value) => Ok(value.clone()),
            BackendReply::Err(Some(status), message) => {
                Err(FeedbackError::new(*status, message.clone()))
            }
            BackendReply::Err(None, message) => Err(anyhow::anyhow!(message.clone()).into()),
        }
    }
}

/// In-memory log sink: install with `capture_logs` and read back with `contents`.
#[derive(Clone, Default)]
pub struct LogCapture(Arc<Mutex<Vec<u8>>>);

impl LogCapture {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Route this thread's tracing output into a LogCapture until the guard drops.
///
/// Only sound with the current-thread runtime `#[tokio::test]` uses by default.
pub fn capture_logs() -> (LogCapture, tracing::subscriber::DefaultGuard) {
    let capture = LogCapture::default();
    let writer = capture.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();
    (capture, tracing::subscriber::set_default(subscriber))
}
