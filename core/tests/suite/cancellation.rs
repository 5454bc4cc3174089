#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::time::Duration;

use assert_matches::assert_matches;
use futures::StreamExt;
use rentlens_core::AnalysisClient;
use rentlens_core::ReportRun;
use rentlens_core::ReportSession;
use rentlens_core::SessionUpdate;
use rentlens_core::accumulator::Draft;
use rentlens_core::config::Config;
use rentlens_test_support::config_for;
use rentlens_test_support::ev_connected;
use rentlens_test_support::ev_done;
use rentlens_test_support::ev_message;
use rentlens_test_support::sse;
use rentlens_test_support::sse_response;
use tokio::io::AsyncReadExt;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use wiremock::Mock;
use wiremock::MockServer;
use wiremock::matchers::method;
use wiremock::matchers::path;

async fn slow_server() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat/stream"))
        .respond_with(
            sse_response(sse(&[ev_message("too late"), ev_done(Some("t1"))]))
                .set_delay(Duration::from_secs(30)),
        )
        .mount(&server)
        .await;
    server
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn cancelling_in_flight_request_ends_run() {
    let server = slow_server().await;
    let client = AnalysisClient::new(&config_for(&server)).unwrap();
    let mut session = ReportSession::new(client);

    let run = session.start_analysis("1 Main St");
    let token = run.cancellation_token();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        token.cancel();
    });

    let updates: Vec<SessionUpdate> = tokio::time::timeout(Duration::from_secs(5), run.collect())
        .await
        .expect("cancellation ends the run promptly");

    assert_eq!(updates.len(), 1, "updates: {updates:?}");
    assert_matches!(updates[0], SessionUpdate::Cancelled);
    assert_matches!(session.draft(), Draft::Text(""));
    assert_eq!(session.thread_id(), None);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn new_analysis_cancels_previous_token() {
    let server = slow_server().await;
    let client = AnalysisClient::new(&config_for(&server)).unwrap();
    let mut session = ReportSession::new(client);

    let first = session.start_analysis("1 Main St").cancellation_token();
    assert!(!first.is_cancelled());
    let second = session.start_analysis("2 Main St").cancellation_token();

    assert!(first.is_cancelled());
    assert!(!second.is_cancelled());
    session.cancel();
    assert!(second.is_cancelled());
}

/// Accepts one connection, sends `body` as the first chunk of a chunked
/// event stream and then keeps the connection open without finishing it.
async fn open_ended_server(body: String) -> (Config, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = Vec::new();
        let mut buf = [0u8; 4096];
        while !request.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = socket.read(&mut buf).await.unwrap();
            if n == 0 {
                return;
            }
            request.extend_from_slice(&buf[..n]);
        }
        let head = "HTTP/1.1 200 OK\r\n\
                    content-type: text/event-stream\r\n\
                    transfer-encoding: chunked\r\n\r\n";
        let chunk = format!("{:x}\r\n{body}\r\n", body.len());
        socket.write_all(head.as_bytes()).await.unwrap();
        socket.write_all(chunk.as_bytes()).await.unwrap();
        socket.flush().await.unwrap();
        // Drain the request body and hold the stream open until the client
        // goes away.
        while socket.read(&mut buf).await.is_ok_and(|n| n > 0) {}
    });
    let config = Config::for_api_base(&format!("http://{addr}/api")).unwrap();
    (config, handle)
}

async fn next_update(run: &mut ReportRun<'_>) -> Option<SessionUpdate> {
    tokio::time::timeout(Duration::from_secs(5), run.next())
        .await
        .expect("the run makes progress")
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn cancelling_mid_body_discards_draft() {
    let (config, server) = open_ended_server(sse(&[
        ev_connected("run-1"),
        ev_message("Checking HPD records..."),
    ]))
    .await;
    let mut session = ReportSession::new(AnalysisClient::new(&config).unwrap());

    let mut run = session.start_analysis("1 Main St");
    let token = run.cancellation_token();
    assert_matches!(
        next_update(&mut run).await,
        Some(SessionUpdate::Connected { .. })
    );
    assert_matches!(
        next_update(&mut run).await,
        Some(SessionUpdate::Text(t)) if t == "Checking HPD records..."
    );

    token.cancel();
    assert_matches!(next_update(&mut run).await, Some(SessionUpdate::Cancelled));
    assert_matches!(next_update(&mut run).await, None);
    drop(run);

    assert_matches!(session.draft(), Draft::Text(""));
    assert_eq!(session.thread_id(), None);
    server.abort();
}
