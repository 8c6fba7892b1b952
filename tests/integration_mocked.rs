/// Integration tests with mocked external APIs
/// Exercises the LLM and lead notification clients without hitting real services
use chrono::Utc;
use property_chat_api::llm_client::{ChatMessage, LlmClient, LlmError};
use property_chat_api::notifier::{LeadNotification, LeadNotifier};
use property_chat_api::visitor::VisitorInfo;
use uuid::Uuid;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_client(base_url: String) -> LlmClient {
    LlmClient::new(base_url, "test_key".to_string(), "gpt-4o-mini".to_string()).unwrap()
}

fn test_notification() -> LeadNotification {
    LeadNotification {
        kind: LeadNotification::KIND,
        session_id: Uuid::new_v4(),
        property_id: Uuid::new_v4(),
        agent_id: Uuid::new_v4(),
        property_title: "48 Maple Ct, Austin, TX".to_string(),
        score: 85,
        interests: vec!["pool".to_string()],
        visitor_info: Some(VisitorInfo {
            name: Some("Dana".to_string()),
            email: Some("dana@example.com".to_string()),
            phone: None,
        }),
        notified_at: Utc::now(),
    }
}

#[tokio::test]
async fn test_llm_successful_completion() {
    let mock_server = MockServer::start().await;

    let mock_response = serde_json::json!({
        "id": "chatcmpl-1",
        "choices": [
            {
                "index": 0,
                "message": {"role": "assistant", "content": "  The home has four bedrooms.  "},
                "finish_reason": "stop"
            }
        ]
    });

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer test_key"))
        .and(body_partial_json(serde_json::json!({"model": "gpt-4o-mini"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(&mock_response))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = test_client(mock_server.uri());
    let reply = client
        .complete(&[
            ChatMessage::system("You are helpful"),
            ChatMessage::user("How many bedrooms?"),
        ])
        .await
        .unwrap();

    assert_eq!(reply, "The home has four bedrooms.");
}

#[tokio::test]
async fn test_llm_api_error_is_surfaced() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(429).set_body_json(serde_json::json!({
            "error": {"message": "Rate limit reached", "type": "requests"}
        })))
        .mount(&mock_server)
        .await;

    let client = test_client(mock_server.uri());
    let result = client.complete(&[ChatMessage::user("hello")]).await;

    match result {
        Err(LlmError::Api { status, message }) => {
            assert_eq!(status, 429);
            assert_eq!(message, "Rate limit reached");
        }
        other => panic!("Expected API error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_llm_is_not_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = test_client(mock_server.uri());
    let result = client.complete(&[ChatMessage::user("hello")]).await;

    assert!(matches!(result, Err(LlmError::Api { status: 500, .. })));
}

#[tokio::test]
async fn test_llm_empty_choices() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"choices": []})))
        .mount(&mock_server)
        .await;

    let client = test_client(mock_server.uri());
    let result = client.complete(&[ChatMessage::user("hello")]).await;

    assert!(matches!(result, Err(LlmError::EmptyContent)));
}

#[tokio::test]
async fn test_llm_malformed_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&mock_server)
        .await;

    let client = test_client(mock_server.uri());
    let result = client.complete(&[ChatMessage::user("hello")]).await;

    assert!(matches!(result, Err(LlmError::Parse(_))));
}

#[tokio::test]
async fn test_notification_delivered() {
    let mock_server = MockServer::start().await;
    let notification = test_notification();

    Mock::given(method("POST"))
        .and(path("/notify"))
        .and(body_partial_json(serde_json::json!({
            "type": "lead_qualified",
            "score": 85,
            "interests": ["pool"],
            "visitor_info": {"email": "dana@example.com"}
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let notifier = LeadNotifier::new(format!("{}/notify", mock_server.uri())).unwrap();
    let result = notifier.send(&notification).await;

    assert!(result.is_ok());
}

#[tokio::test]
async fn test_notification_failure_is_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/notify"))
        .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let notifier = LeadNotifier::new(format!("{}/notify", mock_server.uri())).unwrap();
    let result = notifier.send(&test_notification()).await;

    assert!(result.is_err());
}

#[tokio::test]
async fn test_spawned_notification_fires_once() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/notify"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&mock_server)
        .await;

    let notifier = LeadNotifier::new(format!("{}/notify", mock_server.uri())).unwrap();
    notifier.spawn_send(test_notification());

    // Give the detached task time to run; a failure must not trigger a retry
    tokio::time::sleep(std::time::Duration::from_millis(300)).await;
}
