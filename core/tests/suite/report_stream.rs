#![allow(clippy::unwrap_used, clippy::expect_used)]

use assert_matches::assert_matches;
use futures::StreamExt;
use pretty_assertions::assert_eq;
use rentlens_core::AnalysisClient;
use rentlens_core::ReportSession;
use rentlens_core::SessionUpdate;
use rentlens_core::accumulator::Draft;
use rentlens_core::error::RentlensErr;
use rentlens_protocol::ThreadId;
use rentlens_test_support::config_for;
use rentlens_test_support::ev_connected;
use rentlens_test_support::ev_done;
use rentlens_test_support::ev_error;
use rentlens_test_support::ev_message;
use rentlens_test_support::ev_status;
use rentlens_test_support::mount_sse;
use rentlens_test_support::sse;
use serde_json::Value;
use serde_json::json;
use wiremock::Mock;
use wiremock::MockServer;
use wiremock::ResponseTemplate;
use wiremock::matchers::method;
use wiremock::matchers::path;

async fn session_for(server: &MockServer) -> ReportSession {
    let client = AnalysisClient::new(&config_for(server)).unwrap();
    ReportSession::new(client)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn partial_then_final_report_with_thread() {
    let server = MockServer::start().await;
    let partial = json!({"property": {"address": "1 Main St"}}).to_string();
    let final_report = json!({
        "property": {"address": "1 Main St", "beds": 2},
        "scores": {"overall_grade": 72, "quality_score": 60, "financial_score": "80/100"},
        "recommendation": "CAUTION - open HPD complaints"
    })
    .to_string();
    mount_sse(
        &server,
        sse(&[
            ev_connected("run-1"),
            ev_status("running"),
            ev_message(&partial),
            ev_message("Checking HPD records..."),
            ev_message("Checking HPD records..."),
            ev_message(&final_report),
            ev_message("late narration"),
            ev_done(Some("abc123")),
        ]),
    )
    .await;

    let mut session = session_for(&server).await;
    let updates: Vec<SessionUpdate> = session.start_analysis("1 Main St").collect().await;

    assert_eq!(updates.len(), 5, "updates: {updates:?}");
    assert_matches!(&updates[0], SessionUpdate::Connected { run_id: Some(id) } if id == "run-1");
    assert_matches!(&updates[1], SessionUpdate::Status(s) if s == "running");
    assert_matches!(&updates[2], SessionUpdate::Text(t) if t == "Checking HPD records...");
    let SessionUpdate::Finalized(finalized) = &updates[3] else {
        panic!("expected finalized report, got {:?}", updates[3]);
    };
    assert_eq!(finalized.scores.overall, Some(72.0));
    assert_eq!(finalized.scores.financial, Some(80.0));
    assert_eq!(finalized.recommendation.level.as_deref(), Some("CAUTION"));
    let SessionUpdate::Completed { report, thread_id } = &updates[4] else {
        panic!("expected completion, got {:?}", updates[4]);
    };
    assert_eq!(report, finalized);
    assert_eq!(thread_id.as_ref(), Some(&ThreadId::new("abc123")));

    assert_eq!(session.thread_id(), Some(&ThreadId::new("abc123")));
    assert_matches!(session.draft(), Draft::Report(r) if r.scores.overall == Some(72.0));

    // The follow-up turn carries the thread id; the first one did not.
    let _: Vec<SessionUpdate> = session.send("and the taxes?").collect().await;
    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);
    let first: Value = requests[0].body_json().unwrap();
    let second: Value = requests[1].body_json().unwrap();
    assert_eq!(first.get("thread_id"), None);
    assert!(
        first["message"].as_str().unwrap().contains("1 Main St"),
        "analysis prompt names the address: {first}"
    );
    assert_eq!(second, json!({"message": "and the taxes?", "thread_id": "abc123"}));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn malformed_line_is_skipped_and_text_is_normalized() {
    let server = MockServer::start().await;
    let body = format!(
        "data: {{not json\n\n{}",
        sse(&[
            ev_message("Overall Grade: **65%**\n"),
            ev_message("Quality Score: **50/100**"),
            ev_done(None),
        ])
    );
    mount_sse(&server, body).await;

    let mut session = session_for(&server).await;
    let updates: Vec<SessionUpdate> = session.start_analysis("1 Main St").collect().await;

    assert_eq!(updates.len(), 3, "updates: {updates:?}");
    let SessionUpdate::Completed { report, thread_id } = &updates[2] else {
        panic!("expected completion, got {:?}", updates[2]);
    };
    assert_eq!(report.scores.overall, Some(65.0));
    assert_eq!(report.scores.quality, Some(50.0));
    assert_eq!(report.property.address, "1 Main St");
    assert_eq!(*thread_id, None);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn unstructured_reply_keeps_full_text() {
    let server = MockServer::start().await;
    mount_sse(
        &server,
        sse(&[ev_message("The landlord answers quickly."), ev_done(Some("t1"))]),
    )
    .await;

    let mut session = session_for(&server).await;
    let updates: Vec<SessionUpdate> = session.send("how is the landlord?").collect().await;

    assert_matches!(
        updates.last(),
        Some(SessionUpdate::Completed { report, .. })
            if report.full_text.as_deref() == Some("The landlord answers quickly.")
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn upstream_error_event_fails_the_run() {
    let server = MockServer::start().await;
    mount_sse(
        &server,
        sse(&[
            ev_connected("run-1"),
            ev_error("Run failed"),
            ev_message("never delivered"),
        ]),
    )
    .await;

    let mut session = session_for(&server).await;
    let updates: Vec<SessionUpdate> = session.start_analysis("1 Main St").collect().await;

    assert_eq!(updates.len(), 2, "updates: {updates:?}");
    assert_matches!(&updates[1], SessionUpdate::Failed(RentlensErr::Upstream(msg)) if msg == "Run failed");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn non_success_status_is_a_transport_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat/stream"))
        .respond_with(ResponseTemplate::new(503).set_body_string("agent unavailable"))
        .mount(&server)
        .await;

    let mut session = session_for(&server).await;
    let updates: Vec<SessionUpdate> = session.start_analysis("1 Main St").collect().await;

    assert_eq!(updates.len(), 1);
    let SessionUpdate::Failed(err) = &updates[0] else {
        panic!("expected failure, got {:?}", updates[0]);
    };
    assert!(err.is_transport());
    assert_matches!(
        err,
        RentlensErr::UnexpectedStatus { status, body, .. }
            if status.as_u16() == 503 && body == "agent unavailable"
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn early_close_without_content_fails() {
    let server = MockServer::start().await;
    mount_sse(&server, sse(&[ev_connected("run-1")])).await;

    let mut session = session_for(&server).await;
    let updates: Vec<SessionUpdate> = session.start_analysis("1 Main St").collect().await;

    assert_matches!(updates.last(), Some(SessionUpdate::Failed(RentlensErr::Stream(_))));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn done_sentinel_completes_with_accumulated_text() {
    let server = MockServer::start().await;
    let body = format!(
        "{}data: [DONE]\n\n",
        sse(&[ev_message("Overall Transparency Grade: 81%")])
    );
    mount_sse(&server, body).await;

    let mut session = session_for(&server).await;
    let updates: Vec<SessionUpdate> = session.start_analysis("9 Elm St").collect().await;

    assert_matches!(
        updates.last(),
        Some(SessionUpdate::Completed { report, .. }) if report.scores.overall == Some(81.0)
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn placeholder_overall_does_not_finalize() {
    let server = MockServer::start().await;
    let placeholder = json!({"scores": {"overall_grade": "N/A", "quality_score": 50}}).to_string();
    let final_report = json!({
        "property": {"address": "1 Main St"},
        "scores": {"overall_grade": 72, "quality_score": 60}
    })
    .to_string();
    mount_sse(
        &server,
        sse(&[
            ev_message(&placeholder),
            ev_message(&final_report),
            ev_done(Some("abc123")),
        ]),
    )
    .await;

    let mut session = session_for(&server).await;
    let updates: Vec<SessionUpdate> = session.start_analysis("1 Main St").collect().await;

    assert_eq!(updates.len(), 2, "updates: {updates:?}");
    assert_matches!(&updates[0], SessionUpdate::Finalized(r) if r.scores.overall == Some(72.0));
    let SessionUpdate::Completed { report, .. } = &updates[1] else {
        panic!("expected completion, got {:?}", updates[1]);
    };
    assert_eq!(report.scores.overall, Some(72.0));
    assert_eq!(report.scores.quality, Some(60.0));
    assert!(report.is_complete());
}
