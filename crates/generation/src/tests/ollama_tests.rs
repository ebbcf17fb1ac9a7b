use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use futures::StreamExt;
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::Mutex};

use super::*;

#[derive(Clone)]
struct MockServerState {
    requests: Arc<Mutex<Vec<Value>>>,
    status: StatusCode,
    body: String,
}

async fn handle_chat(
    State(state): State<MockServerState>,
    Json(request): Json<Value>,
) -> (StatusCode, String) {
    state.requests.lock().await.push(request);
    (state.status, state.body.clone())
}

async fn spawn_chat_server(
    status: StatusCode,
    body: impl Into<String>,
) -> (String, Arc<Mutex<Vec<Value>>>) {
    let requests = Arc::new(Mutex::new(Vec::new()));
    let state = MockServerState {
        requests: requests.clone(),
        status,
        body: body.into(),
    };
    let app = Router::new()
        .route("/api/chat", post(handle_chat))
        .with_state(state);
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve");
    });
    (format!("http://{addr}"), requests)
}

fn session_for(base_url: String) -> OllamaSession {
    OllamaSession::new(OllamaConfig {
        base_url,
        model: "test-model".to_string(),
        ..OllamaConfig::default()
    })
    .expect("session")
}

fn sample_request() -> GenerationRequest {
    GenerationRequest {
        instructions: vec!["You are a helpful vocabulary assistant.".to_string()],
        prompt: vec!["Define the word 'ephemeral'.".to_string()],
        examples: vec![json!({"definition": "Feeling good."})],
    }
}

#[tokio::test]
async fn respond_posts_chat_request_and_returns_message_content() {
    let body = json!({
        "model": "test-model",
        "message": {"role": "assistant", "content": "{\"definition\":\"Short-lived.\"}"},
        "done": true
    })
    .to_string();
    let (url, requests) = spawn_chat_server(StatusCode::OK, body).await;
    let session = session_for(url);

    let content = session.respond(&sample_request()).await.expect("respond");
    assert_eq!(content, "{\"definition\":\"Short-lived.\"}");

    let requests = requests.lock().await;
    assert_eq!(requests.len(), 1);
    let sent = &requests[0];
    assert_eq!(sent["model"], "test-model");
    assert_eq!(sent["stream"], false);
    assert_eq!(sent["format"], "json");
    assert_eq!(sent["messages"][0]["role"], "system");
    assert_eq!(
        sent["messages"][0]["content"],
        "You are a helpful vocabulary assistant."
    );
    assert_eq!(sent["messages"][1]["role"], "user");
    let user = sent["messages"][1]["content"].as_str().expect("user prompt");
    assert!(user.starts_with("Define the word 'ephemeral'."));
    assert!(user.contains("Feeling good."));
}

#[tokio::test]
async fn stream_response_yields_chunks_until_done() {
    let frames = [
        json!({"message": {"role": "assistant", "content": "{\"definition\":"}, "done": false}),
        json!({"message": {"role": "assistant", "content": " \"Short"}, "done": false}),
        json!({"message": {"role": "assistant", "content": "-lived.\"}"}, "done": false}),
        json!({"message": {"role": "assistant", "content": ""}, "done": true}),
    ];
    let body = frames
        .iter()
        .map(Value::to_string)
        .collect::<Vec<_>>()
        .join("\n");
    let (url, requests) = spawn_chat_server(StatusCode::OK, body).await;
    let session = session_for(url);

    let stream = session
        .stream_response(&sample_request())
        .await
        .expect("stream");
    let chunks: Vec<String> = stream
        .map(|chunk| chunk.expect("chunk"))
        .collect()
        .await;
    assert_eq!(chunks, ["{\"definition\":", " \"Short", "-lived.\"}"]);
    assert_eq!(chunks.concat(), "{\"definition\": \"Short-lived.\"}");
    assert_eq!(requests.lock().await[0]["stream"], true);
}

#[tokio::test]
async fn stream_reports_error_frames() {
    let body = [
        json!({"message": {"content": "{\"defi"}, "done": false}).to_string(),
        json!({"error": "model crashed"}).to_string(),
    ]
    .join("\n");
    let (url, _) = spawn_chat_server(StatusCode::OK, body).await;
    let session = session_for(url);

    let mut stream = session
        .stream_response(&sample_request())
        .await
        .expect("stream");
    assert_eq!(stream.next().await.expect("first").expect("chunk"), "{\"defi");
    match stream.next().await {
        Some(Err(SessionError::Rejected(message))) => assert_eq!(message, "model crashed"),
        other => panic!("unexpected item: {other:?}"),
    }
    assert!(stream.next().await.is_none());
}

#[tokio::test]
async fn stream_reports_undecodable_frames() {
    let (url, _) = spawn_chat_server(StatusCode::OK, "this is not json\n").await;
    let session = session_for(url);

    let mut stream = session
        .stream_response(&sample_request())
        .await
        .expect("stream");
    assert!(matches!(
        stream.next().await,
        Some(Err(SessionError::Decode(_)))
    ));
}

#[tokio::test]
async fn http_errors_are_rejections_with_server_detail() {
    let body = json!({"error": "model 'test-model' not found"}).to_string();
    let (url, _) = spawn_chat_server(StatusCode::NOT_FOUND, body).await;
    let session = session_for(url);

    match session.respond(&sample_request()).await {
        Err(SessionError::Rejected(message)) => {
            assert!(message.contains("404"));
            assert!(message.contains("model 'test-model' not found"));
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[tokio::test]
async fn unreachable_server_is_unavailable() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);
    let session = session_for(format!("http://{addr}"));

    assert!(matches!(
        session.respond(&sample_request()).await,
        Err(SessionError::Unavailable(_))
    ));
    assert!(matches!(
        session.prewarm().await,
        Err(SessionError::Unavailable(_))
    ));
}

#[tokio::test]
async fn prewarm_sends_empty_conversation_with_keep_alive() {
    let body = json!({"model": "test-model", "done": true}).to_string();
    let (url, requests) = spawn_chat_server(StatusCode::OK, body).await;
    let session = session_for(url);

    session.prewarm().await.expect("prewarm");

    let requests = requests.lock().await;
    assert_eq!(requests[0]["messages"], json!([]));
    assert_eq!(requests[0]["keep_alive"], "10m");
    assert!(requests[0].get("format").is_none());
}

#[test]
fn chat_url_keeps_base_path_prefix() {
    assert_eq!(
        chat_url("http://localhost:11434").expect("url").as_str(),
        "http://localhost:11434/api/chat"
    );
    assert_eq!(
        chat_url("http://gpu-box/ollama").expect("url").as_str(),
        "http://gpu-box/ollama/api/chat"
    );
    assert!(chat_url("not a url").is_err());
}
