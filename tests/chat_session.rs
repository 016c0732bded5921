//! Integration tests for a full chat session against a mock assistant:
//! request shape, streamed replies, failures, and leaving chat.

use scholar::catalog::{default_cards, fallback_catalog};
use scholar::chat::{ChatStatus, HttpChatTransport, ReplyEvent, Role, ERROR_NOTICE};
use scholar::session::{BackOutcome, Session, ViewState};
use scholar::util::{endpoint_url, validate_base_url};
use secrecy::SecretString;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CHAT_PATH: &str = "/api/chat";

fn sse(parts: &[&str]) -> String {
    parts
        .iter()
        .map(|p| format!("data: {}\n\n", p))
        .collect::<String>()
        + "data: [DONE]\n\n"
}

fn streamed_reply(text_parts: &[&str]) -> ResponseTemplate {
    let mut parts = vec![r#"{"type":"start"}"#.to_string()];
    for t in text_parts {
        parts.push(serde_json::json!({"type": "text-delta", "id": "0", "delta": t}).to_string());
    }
    parts.push(r#"{"type":"finish"}"#.to_string());
    let refs: Vec<&str> = parts.iter().map(String::as_str).collect();
    ResponseTemplate::new(200).set_body_raw(sse(&refs), "text/event-stream")
}

fn transport(server: &MockServer, token: Option<&str>) -> HttpChatTransport {
    let base = validate_base_url(&server.uri()).unwrap();
    HttpChatTransport::new(
        reqwest::Client::new(),
        endpoint_url(&base, CHAT_PATH),
        token.map(|t| SecretString::from(t.to_string())),
    )
}

fn session() -> Session {
    Session::new(default_cards(), fallback_catalog(), 12)
}

#[tokio::test]
async fn test_question_streams_reply_into_transcript() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(CHAT_PATH))
        .and(header("content-type", "application/json"))
        .and(body_partial_json(serde_json::json!({
            "text": "What are the top colleges in India?",
            "messages": [{
                "role": "user",
                "parts": [{"type": "text", "text": "What are the top colleges in India?"}]
            }]
        })))
        .respond_with(streamed_reply(&["IIT ", "Bombay"]))
        .expect(1)
        .mount(&server)
        .await;

    let backend = transport(&server, None);
    let mut session = session();
    let question = session.visible_questions(3)[0].clone();
    let exchange = session.select_question(&question).unwrap();
    assert_eq!(session.view(), ViewState::Chat);
    assert_eq!(session.status(), ChatStatus::Submitted);

    let mut seen = Vec::new();
    let status = session
        .run_exchange(&backend, exchange, |event| seen.push(event.clone()))
        .await;

    assert_eq!(status, ChatStatus::Ready);
    assert_eq!(seen.first(), Some(&ReplyEvent::Started));
    assert_eq!(seen.last(), Some(&ReplyEvent::Finished));

    let messages = session.messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].role, Role::User);
    assert_eq!(messages[1].role, Role::Assistant);
    assert_eq!(messages[1].text(), "IIT Bombay");
}

#[tokio::test]
async fn test_follow_up_carries_whole_transcript() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_partial_json(serde_json::json!({"text": "First"})))
        .respond_with(streamed_reply(&["One"]))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(body_partial_json(serde_json::json!({
            "text": "Second",
            "messages": [
                {"role": "user", "parts": [{"type": "text", "text": "First"}]},
                {"role": "assistant", "parts": [{"type": "text", "text": "One"}]},
                {"role": "user", "parts": [{"type": "text", "text": "Second"}]}
            ]
        })))
        .respond_with(streamed_reply(&["Two"]))
        .expect(1)
        .mount(&server)
        .await;

    let backend = transport(&server, None);
    let mut session = session();

    let first = session.submit_free_text("First").unwrap();
    session.run_exchange(&backend, first, |_| {}).await;
    let second = session.submit_free_text("  Second  ").unwrap();
    let status = session.run_exchange(&backend, second, |_| {}).await;

    assert_eq!(status, ChatStatus::Ready);
    assert_eq!(session.messages().len(), 4);
    assert_eq!(session.messages()[3].text(), "Two");
}

#[tokio::test]
async fn test_send_rejected_while_reply_outstanding() {
    let mut session = session();
    let exchange = session.submit_free_text("Fees at IIT Delhi?").unwrap();

    assert!(session.submit_free_text("Another").is_none());
    assert!(session.select_question("Yet another").is_none());
    assert_eq!(session.messages().len(), 2);

    session.apply_reply(exchange.generation, ReplyEvent::Started);
    assert_eq!(session.status(), ChatStatus::Streaming);
    assert!(session.submit_free_text("Another").is_none());
}

#[tokio::test]
async fn test_server_error_ends_in_error_notice() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let backend = transport(&server, None);
    let mut session = session();
    let exchange = session.submit_free_text("Hello").unwrap();
    let status = session.run_exchange(&backend, exchange, |_| {}).await;

    assert_eq!(status, ChatStatus::Error);
    assert_eq!(session.chat().error_notice(), Some(ERROR_NOTICE));
    assert!(session.chat().error().unwrap().contains("500"));
    // Failure unlocks sending again.
    assert!(session.submit_free_text("Retry").is_some());
}

#[tokio::test]
async fn test_error_part_fails_reply_and_keeps_partial_text() {
    let server = MockServer::start().await;
    let body = sse(&[
        r#"{"type":"start"}"#,
        r#"{"type":"text-delta","id":"0","delta":"Partial"}"#,
        r#"{"type":"error","errorText":"model overloaded"}"#,
    ]);
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
        .mount(&server)
        .await;

    let backend = transport(&server, None);
    let mut session = session();
    let exchange = session.submit_free_text("Hello").unwrap();
    let status = session.run_exchange(&backend, exchange, |_| {}).await;

    assert_eq!(status, ChatStatus::Error);
    assert_eq!(session.messages()[1].text(), "Partial");
    assert!(session.chat().error().unwrap().contains("model overloaded"));
}

#[tokio::test]
async fn test_plain_text_reply_completes_at_end_of_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("Just text.", "text/plain"))
        .mount(&server)
        .await;

    let backend = transport(&server, None);
    let mut session = session();
    let exchange = session.submit_free_text("Hello").unwrap();
    let status = session.run_exchange(&backend, exchange, |_| {}).await;

    assert_eq!(status, ChatStatus::Ready);
    assert_eq!(session.messages()[1].text(), "Just text.");
}

#[tokio::test]
async fn test_bearer_token_sent_when_configured() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header("authorization", "Bearer s3cret"))
        .respond_with(streamed_reply(&["ok"]))
        .expect(1)
        .mount(&server)
        .await;

    let backend = transport(&server, Some("s3cret"));
    let mut session = session();
    let exchange = session.submit_free_text("Hello").unwrap();
    assert_eq!(
        session.run_exchange(&backend, exchange, |_| {}).await,
        ChatStatus::Ready
    );
}

#[tokio::test]
async fn test_back_clears_transcript_and_returns_to_browsing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(streamed_reply(&["Answer"]))
        .mount(&server)
        .await;

    let backend = transport(&server, None);
    let mut session = session();
    session.select_category("Exams");
    let exchange = session.submit_free_text("JEE dates?").unwrap();
    session.run_exchange(&backend, exchange, |_| {}).await;

    assert_eq!(session.go_back(), BackOutcome::ReturnedToBrowsing);
    assert_eq!(session.view(), ViewState::Browsing);
    assert!(session.messages().is_empty());
    assert_eq!(session.status(), ChatStatus::Idle);
    // Browsing position survives the round trip.
    assert_eq!(session.nav().active_category(), "Exams");

    assert_eq!(session.go_back(), BackOutcome::Delegated);
}

#[tokio::test]
async fn test_reply_from_abandoned_exchange_is_ignored() {
    let mut session = session();
    let stale = session.submit_free_text("First").unwrap();
    session.go_back();

    let fresh = session.submit_free_text("Second").unwrap();
    assert!(!session.apply_reply(stale.generation, ReplyEvent::Delta("old".into())));
    assert!(session.apply_reply(fresh.generation, ReplyEvent::Delta("new".into())));
    assert_eq!(session.messages()[1].text(), "new");
}
