//! Root of the `rentlens-core` library: the streaming report pipeline and
//! its HTTP collaborators.

// Library code reports through `tracing`; only the CLI writes to the
// terminal.
#![deny(clippy::print_stdout, clippy::print_stderr)]

pub mod accumulator;
pub mod classify;
pub mod client;
pub mod config;
pub mod conversation;
pub mod error;
pub mod extract;
pub mod listings;
pub mod normalize;
pub mod prompt;
pub mod session;
pub mod sse;
pub mod view;

pub use client::AnalysisClient;
pub use conversation::Conversation;
pub use listings::ListingClient;
pub use session::ReportRun;
pub use session::ReportSession;
pub use session::SessionUpdate;
