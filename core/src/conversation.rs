use rentlens_protocol::ChatRequest;
use rentlens_protocol::StreamEvent;
use rentlens_protocol::ThreadId;
use tracing::info;

/// Thread identity of one property view's chat. Deliberately not `Clone`:
/// two views must never share a thread.
#[derive(Debug, Default)]
pub struct Conversation {
    thread_id: Option<ThreadId>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resume an existing thread.
    pub fn with_thread_id(thread_id: ThreadId) -> Self {
        Self {
            thread_id: Some(thread_id),
        }
    }

    pub fn thread_id(&self) -> Option<&ThreadId> {
        self.thread_id.as_ref()
    }

    /// Record the thread id carried by a `done` event. Other events, and a
    /// `done` without an id, leave the state untouched.
    pub fn observe(&mut self, event: &StreamEvent) {
        if let StreamEvent::Done {
            thread_id: Some(id),
            ..
        } = event
        {
            self.update(id.clone());
        }
    }

    pub fn update(&mut self, thread_id: ThreadId) {
        match &self.thread_id {
            Some(current) if *current == thread_id => {}
            Some(current) => {
                info!("thread id changed from {current} to {thread_id}");
                self.thread_id = Some(thread_id);
            }
            None => self.thread_id = Some(thread_id),
        }
    }

    pub fn chat_request(&self, message: impl Into<String>) -> ChatRequest {
        ChatRequest::new(message).with_thread_id(self.thread_id.clone())
    }
}
