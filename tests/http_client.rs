//! HTTP client and controller against a stub backend served by axum.
//!
//! The stub behaves like the real service: it hands out a session cookie,
//! keys history by that cookie, and reports bad requests as a JSON `error`
//! with a 400 status.

use std::sync::{Arc, Mutex};

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};

use chat_panel::{
    ChatBackend, ChatController, ChatReply, ClientError, ControllerOptions, HttpChatClient,
    Message, PanelView, Role,
};

const SESSION: &str = "session=abc123";

#[derive(Clone, Default)]
struct Stub {
    log: Arc<Mutex<Vec<Message>>>,
}

fn has_session(headers: &HeaderMap) -> bool {
    headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.contains(SESSION))
        .unwrap_or(false)
}

async fn history(State(stub): State<Stub>, headers: HeaderMap) -> impl IntoResponse {
    let messages = if has_session(&headers) {
        stub.log.lock().unwrap().clone()
    } else {
        Vec::new()
    };
    (
        [(header::SET_COOKIE, format!("{}; Path=/", SESSION))],
        Json(messages),
    )
}

async fn chat(
    State(stub): State<Stub>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    let Some(message) = body.get("message").and_then(Value::as_str) else {
        return (StatusCode::BAD_REQUEST, Json(json!({"error": "Invalid request"})));
    };
    if message == "slow down" {
        return (StatusCode::OK, Json(json!({"error": "rate limited"})));
    }

    let reply = format!("You said: {}\nAnything else?", message);
    if has_session(&headers) {
        let mut log = stub.log.lock().unwrap();
        log.push(Message::user(message));
        log.push(Message::assistant(reply.clone()));
    }
    (StatusCode::OK, Json(json!({"response": reply})))
}

async fn broken() -> impl IntoResponse {
    (StatusCode::INTERNAL_SERVER_ERROR, "<h1>Internal Server Error</h1>")
}

async fn spawn(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

async fn stub_server() -> String {
    let router = Router::new()
        .route("/api/history", get(history))
        .route("/api/chat", post(chat))
        .with_state(Stub::default());
    spawn(router).await
}

#[tokio::test]
async fn test_session_cookie_carries_history() {
    let base = stub_server().await;
    let client = HttpChatClient::new(&base).unwrap();

    assert!(client.history().await.unwrap().is_empty());

    let reply = client.chat("Hello").await.unwrap();
    assert_eq!(reply, ChatReply::answer("You said: Hello\nAnything else?"));

    let history = client.history().await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0], Message::user("Hello"));
    assert_eq!(history[1].role, Role::Assistant);
}

#[tokio::test]
async fn test_error_body_is_read_despite_bad_status() {
    let base = stub_server().await;
    let client = reqwest::Client::new();

    let status = client
        .post(format!("{}/api/chat", base))
        .json(&json!({"wrong": "field"}))
        .send()
        .await
        .unwrap()
        .status();
    assert_eq!(status, reqwest::StatusCode::BAD_REQUEST);

    // Same body through the chat client surfaces as an application error
    let router = Router::new().route(
        "/api/chat",
        post(|| async { (StatusCode::BAD_REQUEST, Json(json!({"error": "Invalid request"}))) }),
    );
    let base = spawn(router).await;
    let reply = HttpChatClient::new(&base).unwrap().chat("hi").await.unwrap();
    assert_eq!(reply, ChatReply::failed("Invalid request"));
}

#[tokio::test]
async fn test_non_json_body_is_decode_error() {
    let router = Router::new()
        .route("/api/history", get(broken))
        .route("/api/chat", post(broken));
    let base = spawn(router).await;
    let client = HttpChatClient::new(&base).unwrap();

    assert!(matches!(client.history().await, Err(ClientError::Decode(_))));
    assert!(matches!(client.chat("hi").await, Err(ClientError::Decode(_))));
}

#[tokio::test]
async fn test_unreachable_backend_is_http_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = HttpChatClient::new(&format!("http://{}", addr)).unwrap();
    assert!(matches!(client.chat("hi").await, Err(ClientError::Http(_))));
}

#[tokio::test]
async fn test_panel_round_trip_over_http() {
    let base = stub_server().await;
    let backend = Arc::new(HttpChatClient::new(&base).unwrap());
    let mut controller = ChatController::new(backend, ControllerOptions::default());
    let mut panel = PanelView::with_welcome("Welcome!");

    // Fresh session: nothing to load, welcome stays
    controller.load_history(&mut panel).await;
    assert_eq!(panel.len(), 1);

    panel.input.set("Hello");
    controller.send_message(&mut panel).await;
    panel.input.set("slow down");
    controller.send_message(&mut panel).await;

    assert_eq!(
        panel.to_html(),
        [
            "<div class=\"message bot-message\">Welcome!</div>",
            "<div class=\"message user-message\">Hello</div>",
            "<div class=\"message bot-message\">You said: Hello<br>Anything else?</div>",
            "<div class=\"message user-message\">slow down</div>",
            "<div class=\"message bot-message\" style=\"color:red\">Error: rate limited</div>",
        ]
        .join("\n")
    );
    assert_eq!(panel.scroll(), panel.max_scroll());

    // A reload of the same session gets the conversation back
    let mut reloaded = PanelView::with_welcome("Welcome!");
    controller.load_history(&mut reloaded).await;
    let classes: Vec<&str> = reloaded.blocks().map(|b| b.kind.css_class()).collect();
    assert_eq!(classes, vec!["user-message", "bot-message"]);
}
