#![allow(clippy::expect_used)]

use rentlens_core::config::Config;
use serde_json::Value;
use serde_json::json;
use wiremock::Mock;
use wiremock::MockServer;
use wiremock::ResponseTemplate;
use wiremock::matchers::method;
use wiremock::matchers::path;

/// Config pointed at `server` with the `/api` prefix the backend uses.
pub fn config_for(server: &MockServer) -> Config {
    Config::for_api_base(&format!("{}/api", server.uri())).expect("mock server URI is valid")
}

/// Frame `events` as the backend does: one `data:` line per event followed
/// by a blank line.
pub fn sse(events: &[Value]) -> String {
    events.iter().map(|e| format!("data: {e}\n\n")).collect()
}

pub fn ev_connected(run_id: &str) -> Value {
    json!({"type": "connected", "run_id": run_id})
}

pub fn ev_status(status: &str) -> Value {
    json!({"type": "status", "status": status})
}

pub fn ev_message(content: &str) -> Value {
    json!({"type": "message", "content": content})
}

pub fn ev_done(thread_id: Option<&str>) -> Value {
    json!({"type": "done", "thread_id": thread_id, "run_id": "run-1"})
}

pub fn ev_error(message: &str) -> Value {
    json!({"type": "error", "message": message})
}

pub fn sse_response(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("content-type", "text/event-stream")
        .set_body_raw(body, "text/event-stream")
}

/// Serve `body` for every `POST /api/chat/stream`.
pub async fn mount_sse(server: &MockServer, body: String) {
    Mock::given(method("POST"))
        .and(path("/api/chat/stream"))
        .respond_with(sse_response(body))
        .mount(server)
        .await;
}
