//! Wire types shared between the rentlens pipeline and its collaborators: the
//! analysis event stream, the canonical transparency report and the listing
//! service payloads.

pub mod chat;
pub mod events;
pub mod listing;
pub mod number;
pub mod report;
pub mod thread_id;

pub use chat::ChatRequest;
pub use events::StreamEvent;
pub use thread_id::ThreadId;
