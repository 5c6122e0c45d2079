// HTTP client tests: Perspective and Akismet against a local mock server.
//
// Each test points the real client at a wiremock MockServer, checks the
// request it sends, and runs the reply through the pipeline stage so the
// outcome the backend would see is asserted too.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_partial_json, body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use feedback_core::pipeline::moderation::ModerationPipeline;
use feedback_core::pipeline::stages::{SpamStage, ToxicityStage, SPAM_DETECTED};
use feedback_core::pipeline::{CheckOutcome, FeedbackInput, RequestMeta, SpamVerdict, ToxicitySignal};
use feedback_core::spam::akismet::AkismetChecker;
use feedback_core::toxicity::perspective::{PerspectiveScorer, MAX_SCORED_CHARS};

const TIMEOUT: Duration = Duration::from_secs(5);

fn meta() -> RequestMeta {
    RequestMeta {
        origin: Some("https://app.example.com".to_string()),
        client_ip: Some("203.0.113.7".to_string()),
        user_agent: Some("Mozilla/5.0".to_string()),
        referrer: Some("https://app.example.com/help".to_string()),
    }
}

fn toxicity_pipeline(server: &MockServer) -> ModerationPipeline {
    let scorer = PerspectiveScorer::new("p-key".to_string(), TIMEOUT)
        .unwrap()
        .with_url(&format!("{}/analyze", server.uri()));
    ModerationPipeline::new().with_stage(ToxicityStage::new(Arc::new(scorer), TIMEOUT))
}

fn spam_pipeline(server: &MockServer, allow_spam: bool) -> ModerationPipeline {
    let checker = AkismetChecker::new("a-key".to_string(), TIMEOUT)
        .unwrap()
        .with_url(&format!("{}/comment-check", server.uri()));
    ModerationPipeline::new().with_stage(SpamStage::new(Arc::new(checker), allow_spam, TIMEOUT))
}

// ============================================================
// Perspective
// ============================================================

#[tokio::test]
async fn perspective_request_carries_key_and_toxicity_attribute() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/analyze"))
        .and(query_param("key", "p-key"))
        .and(body_partial_json(json!({
            "comment": { "text": "you are great" },
            "requestedAttributes": { "TOXICITY": {} },
            "doNotStore": true
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "attributeScores": {
                "TOXICITY": { "summaryScore": { "value": 0.12, "type": "PROBABILITY" } }
            },
            "languages": ["en"]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let report = toxicity_pipeline(&server)
        .moderate(&FeedbackInput::new("you are great"), &meta())
        .await
        .unwrap();
    assert_eq!(report.toxicity, CheckOutcome::Verdict(ToxicitySignal { toxicity: 0.12 }));
}

#[tokio::test]
async fn perspective_truncates_long_bodies() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/analyze"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "attributeScores": { "TOXICITY": { "summaryScore": { "value": 0.0 } } }
        })))
        .mount(&server)
        .await;

    let long = "é".repeat(MAX_SCORED_CHARS + 500);
    toxicity_pipeline(&server)
        .moderate(&FeedbackInput::new(long), &meta())
        .await
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    let sent: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    let text = sent["comment"]["text"].as_str().unwrap();
    assert_eq!(text.chars().count(), MAX_SCORED_CHARS);
}

#[tokio::test]
async fn perspective_server_error_is_a_failed_check() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/analyze"))
        .respond_with(ResponseTemplate::new(503).set_body_string("backend unavailable"))
        .mount(&server)
        .await;

    let report = toxicity_pipeline(&server)
        .moderate(&FeedbackInput::new("hello"), &meta())
        .await
        .unwrap();
    match report.toxicity {
        CheckOutcome::Failed(reason) => assert!(reason.contains("503"), "{reason}"),
        other => panic!("expected a failed check, got {other:?}"),
    }
}

#[tokio::test]
async fn perspective_reply_without_toxicity_is_a_failed_check() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/analyze"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "attributeScores": {} })))
        .mount(&server)
        .await;

    let context = toxicity_pipeline(&server)
        .run(FeedbackInput::new("hello"), &meta())
        .await
        .unwrap();
    assert!(context.toxicity.is_none());
}

// ============================================================
// Akismet
// ============================================================

#[tokio::test]
async fn akismet_request_carries_every_form_field() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/comment-check"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string_contains("api_key=a-key"))
        .and(body_string_contains("blog=https%3A%2F%2Fapp.example.com"))
        .and(body_string_contains("user_ip=203.0.113.7"))
        .and(body_string_contains("user_agent=Mozilla%2F5.0"))
        .and(body_string_contains("referrer=https%3A%2F%2Fapp.example.com%2Fhelp"))
        .and(body_string_contains("comment_type=feedback"))
        .and(body_string_contains("comment_content=love+the+new+release"))
        .respond_with(ResponseTemplate::new(200).set_body_string("false"))
        .expect(1)
        .mount(&server)
        .await;

    let report = spam_pipeline(&server, false)
        .moderate(&FeedbackInput::new("love the new release"), &meta())
        .await
        .unwrap();
    assert_eq!(report.spam, CheckOutcome::Verdict(SpamVerdict { spam: false }));

    let requests = server.received_requests().await.unwrap();
    let agent = requests[0]
        .headers
        .get("user-agent")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    assert!(agent.starts_with("feedback-core/"), "{agent}");
}

#[tokio::test]
async fn akismet_spam_reply_blocks_the_submission() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/comment-check"))
        .respond_with(ResponseTemplate::new(200).set_body_string("true"))
        .mount(&server)
        .await;

    let err = spam_pipeline(&server, false)
        .run(FeedbackInput::new("cheap pills"), &meta())
        .await
        .unwrap_err();
    assert_eq!(err.status.as_u16(), 400);
    assert_eq!(err.message, SPAM_DETECTED);

    let context = spam_pipeline(&server, true)
        .run(FeedbackInput::new("cheap pills"), &meta())
        .await
        .unwrap();
    assert_eq!(context.akismet, Some(SpamVerdict { spam: true }));
}

#[tokio::test]
async fn akismet_invalid_reply_is_a_failed_check_with_debug_help() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/comment-check"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("invalid")
                .insert_header("x-akismet-debug-help", "Empty \"blog\" value"),
        )
        .mount(&server)
        .await;

    let report = spam_pipeline(&server, false)
        .moderate(&FeedbackInput::new("hello"), &meta())
        .await
        .unwrap();
    match report.spam {
        CheckOutcome::Failed(reason) => assert!(reason.contains("Empty \"blog\" value"), "{reason}"),
        other => panic!("expected a failed check, got {other:?}"),
    }
}

#[tokio::test]
async fn akismet_server_error_is_a_failed_check() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/comment-check"))
        .respond_with(ResponseTemplate::new(500).set_body_string("oops"))
        .mount(&server)
        .await;

    let report = spam_pipeline(&server, false)
        .moderate(&FeedbackInput::new("hello"), &meta())
        .await
        .unwrap();
    match report.spam {
        CheckOutcome::Failed(reason) => assert!(reason.contains("500"), "{reason}"),
        other => panic!("expected a failed check, got {other:?}"),
    }
}

#[tokio::test]
async fn akismet_empty_reply_is_inconclusive() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/comment-check"))
        .respond_with(ResponseTemplate::new(200).set_body_string(""))
        .mount(&server)
        .await;

    let report = spam_pipeline(&server, false)
        .moderate(&FeedbackInput::new("hello"), &meta())
        .await
        .unwrap();
    assert_eq!(report.spam, CheckOutcome::Inconclusive);
}
