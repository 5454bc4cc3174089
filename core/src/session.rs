//! One property view's analysis pipeline.
//!
//! A [`ReportSession`] owns the conversation, the report draft and the
//! cancellation token of the request in flight. Each request hands back a
//! [`ReportRun`], an ordered stream of [`SessionUpdate`]s that ends after
//! `Completed`, `Failed` or `Cancelled`.

use std::pin::Pin;
use std::task::Context;
use std::task::Poll;

use futures::Stream;
use futures::StreamExt;
use rentlens_protocol::ChatRequest;
use rentlens_protocol::StreamEvent;
use rentlens_protocol::ThreadId;
use rentlens_protocol::report::CanonicalReport;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::accumulator::Draft;
use crate::accumulator::ReportAccumulator;
use crate::classify::Chunk;
use crate::classify::classify;
use crate::client::AnalysisClient;
use crate::conversation::Conversation;
use crate::error::RentlensErr;
use crate::normalize::normalize_text;
use crate::normalize::normalize_value;
use crate::prompt::analysis_message;

#[derive(Debug)]
pub enum SessionUpdate {
    Connected { run_id: Option<String> },
    Status(String),
    /// The draft text grew. Carries the whole accumulated text.
    Text(String),
    /// A complete structured report arrived; later messages are ignored.
    Finalized(CanonicalReport),
    /// The stream ended normally.
    Completed {
        report: CanonicalReport,
        thread_id: Option<ThreadId>,
    },
    Failed(RentlensErr),
    Cancelled,
}

impl SessionUpdate {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Completed { .. } | Self::Failed(_) | Self::Cancelled
        )
    }
}

pub struct ReportSession {
    client: AnalysisClient,
    conversation: Conversation,
    accumulator: ReportAccumulator,
    cancel: CancellationToken,
    address: Option<String>,
}

impl ReportSession {
    pub fn new(client: AnalysisClient) -> Self {
        Self::with_conversation(client, Conversation::new())
    }

    pub fn with_conversation(client: AnalysisClient, conversation: Conversation) -> Self {
        Self {
            client,
            conversation,
            accumulator: ReportAccumulator::new(),
            cancel: CancellationToken::new(),
            address: None,
        }
    }

    pub fn thread_id(&self) -> Option<&ThreadId> {
        self.conversation.thread_id()
    }

    pub fn draft(&self) -> Draft<'_> {
        self.accumulator.current_draft()
    }

    /// Token of the request in flight. Cancelling it ends the current run.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Abort the request in flight and discard its draft.
    pub fn cancel(&mut self) {
        self.cancel.cancel();
        self.accumulator.reset();
    }

    /// Request a transparency report for `address`.
    pub fn start_analysis(&mut self, address: &str) -> ReportRun<'_> {
        self.address = Some(address.to_string());
        let request = self.conversation.chat_request(analysis_message(address));
        self.run(request)
    }

    /// Send a follow-up chat message on the current thread.
    pub fn send(&mut self, message: &str) -> ReportRun<'_> {
        let request = self.conversation.chat_request(message);
        self.run(request)
    }

    fn run(&mut self, request: ChatRequest) -> ReportRun<'_> {
        self.cancel.cancel();
        self.cancel = CancellationToken::new();
        self.accumulator.reset();

        let token = self.cancel.clone();
        let run_token = token.clone();
        let session = self;
        let updates = async_stream::stream! {
            info!(
                "starting analysis request (thread: {})",
                request.thread_id.as_ref().map_or("new", ThreadId::as_str)
            );
            let opened = tokio::select! {
                biased;
                _ = run_token.cancelled() => None,
                opened = session.client.stream_chat(&request) => Some(opened),
            };
            let mut events = match opened {
                None => {
                    session.accumulator.reset();
                    yield SessionUpdate::Cancelled;
                    return;
                }
                Some(Err(e)) => {
                    yield SessionUpdate::Failed(e);
                    return;
                }
                Some(Ok(events)) => events,
            };

            let mut saw_done = false;
            loop {
                let next = tokio::select! {
                    biased;
                    _ = run_token.cancelled() => None,
                    next = events.next() => Some(next),
                };
                let event = match next {
                    None => {
                        // Dropping `events` closes the connection.
                        session.accumulator.reset();
                        yield SessionUpdate::Cancelled;
                        return;
                    }
                    Some(Some(Ok(event))) => event,
                    Some(Some(Err(e))) => {
                        warn!("analysis stream failed: {e}");
                        yield SessionUpdate::Failed(e);
                        return;
                    }
                    Some(None) => break,
                };

                session.conversation.observe(&event);
                match event {
                    StreamEvent::Connected { run_id } => {
                        yield SessionUpdate::Connected { run_id };
                    }
                    StreamEvent::Status { status } => {
                        if let Some(status) = status {
                            yield SessionUpdate::Status(status);
                        }
                    }
                    StreamEvent::Message { content } => {
                        if let Some(update) = session.apply_message(&content) {
                            yield update;
                        }
                    }
                    StreamEvent::Done { .. } => {
                        saw_done = true;
                        break;
                    }
                    StreamEvent::Error { error } => {
                        yield SessionUpdate::Failed(RentlensErr::Upstream(error));
                        return;
                    }
                }
            }

            if !saw_done {
                if !session.accumulator.is_finalized() && session.accumulator.text().is_empty() {
                    yield SessionUpdate::Failed(RentlensErr::Stream(
                        "stream closed before any report content".to_string(),
                    ));
                    return;
                }
                warn!("analysis stream ended without a done event");
            }

            let report = session.finish_report();
            yield SessionUpdate::Completed {
                report,
                thread_id: session.conversation.thread_id().cloned(),
            };
        };

        ReportRun {
            token,
            inner: Box::pin(updates),
        }
    }

    fn apply_message(&mut self, content: &str) -> Option<SessionUpdate> {
        if self.accumulator.is_finalized() {
            debug!("report already final; ignoring message");
            return None;
        }
        match classify(content) {
            Chunk::Final(value) => {
                let mut report = normalize_value(&value);
                self.fill_address(&mut report);
                self.accumulator.replace_final(report.clone());
                Some(SessionUpdate::Finalized(report))
            }
            Chunk::Partial => {
                debug!("discarding partial report fragment");
                None
            }
            Chunk::Incremental(text) => self
                .accumulator
                .append_incremental(&text)
                .then(|| SessionUpdate::Text(self.accumulator.text().to_string())),
        }
    }

    /// The final report of a run: the structured one when it arrived,
    /// otherwise whatever can be recovered from the accumulated text.
    fn finish_report(&mut self) -> CanonicalReport {
        if let Some(report) = self.accumulator.report() {
            return report.clone();
        }
        let mut report = normalize_text(self.accumulator.text());
        self.fill_address(&mut report);
        self.accumulator.replace_final(report.clone());
        report
    }

    fn fill_address(&self, report: &mut CanonicalReport) {
        if report.full_text.is_none()
            && report.property.address.is_empty()
            && let Some(address) = &self.address
        {
            report.property.address.clone_from(address);
        }
    }
}

/// Updates of one request. Ends after its terminal update.
pub struct ReportRun<'a> {
    token: CancellationToken,
    inner: Pin<Box<dyn Stream<Item = SessionUpdate> + Send + 'a>>,
}

impl ReportRun<'_> {
    /// Cancelling this token from anywhere ends the run with
    /// [`SessionUpdate::Cancelled`].
    pub fn cancellation_token(&self) -> CancellationToken {
        self.token.clone()
    }
}

impl Stream for ReportRun<'_> {
    type Item = SessionUpdate;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.poll_next_unpin(cx)
    }
}
