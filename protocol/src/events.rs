use serde::Deserialize;
use serde::Serialize;

use crate::ThreadId;

/// One decoded event of the analysis stream. The `type` field of each
/// `data:` payload selects the variant.
///
/// Within a stream events are totally ordered and `Done` / `Error` are
/// terminal: nothing is delivered after either of them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    Connected {
        #[serde(default)]
        run_id: Option<String>,
    },
    Status {
        #[serde(default)]
        status: Option<String>,
    },
    /// Markdown narration or a JSON document encoded as a string.
    Message { content: String },
    Done {
        #[serde(default)]
        thread_id: Option<ThreadId>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        run_id: Option<String>,
    },
    Error {
        // The backend reports failures under `message`.
        #[serde(alias = "message")]
        error: String,
    },
}

impl StreamEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done { .. } | Self::Error { .. })
    }
}
