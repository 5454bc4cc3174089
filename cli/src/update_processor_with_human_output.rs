use std::io::Write;

use rentlens_core::SessionUpdate;

use crate::render;
use crate::update_processor::RunStatus;
use crate::update_processor::UpdateProcessor;
use crate::update_processor::terminal_status;

/// Streams draft text to stdout as it grows, then prints the rendered
/// report. Progress goes to stderr.
pub(crate) struct UpdateProcessorWithHumanOutput {
    printed: usize,
    show_report: bool,
}

impl UpdateProcessorWithHumanOutput {
    /// `show_report` controls whether the final report is rendered after the
    /// streamed text. Chat replies only need the text.
    pub(crate) fn new(show_report: bool) -> Self {
        Self {
            printed: 0,
            show_report,
        }
    }
}

impl UpdateProcessor for UpdateProcessorWithHumanOutput {
    fn process_update(&mut self, update: SessionUpdate) -> RunStatus {
        let status = terminal_status(&update);
        match update {
            SessionUpdate::Connected { run_id } => {
                eprintln!("connected (run {})", run_id.as_deref().unwrap_or("?"));
            }
            SessionUpdate::Status(status) => eprintln!("status: {status}"),
            SessionUpdate::Text(text) => {
                // Draft text only ever grows, so print the new suffix.
                if let Some(delta) = text.get(self.printed..) {
                    print!("{delta}");
                    let _ = std::io::stdout().flush();
                }
                self.printed = text.len();
            }
            SessionUpdate::Finalized(_) => eprintln!("report received"),
            SessionUpdate::Completed { report, thread_id } => {
                if self.printed > 0 {
                    println!();
                }
                if self.show_report || self.printed == 0 {
                    println!("{}", render::report(&report));
                }
                if let Some(thread_id) = thread_id {
                    eprintln!("thread: {thread_id}");
                }
            }
            SessionUpdate::Failed(err) => eprintln!("ERROR: {err}"),
            SessionUpdate::Cancelled => eprintln!("cancelled"),
        }
        status
    }
}
