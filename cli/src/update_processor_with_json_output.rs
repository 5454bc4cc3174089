use rentlens_core::SessionUpdate;
use serde_json::json;

use crate::update_processor::RunStatus;
use crate::update_processor::UpdateProcessor;
use crate::update_processor::terminal_status;

/// Prints only the outcome, as one JSON object on stdout.
pub(crate) struct UpdateProcessorWithJsonOutput;

impl UpdateProcessor for UpdateProcessorWithJsonOutput {
    fn process_update(&mut self, update: SessionUpdate) -> RunStatus {
        let status = terminal_status(&update);
        match update {
            SessionUpdate::Completed { report, thread_id } => {
                let out = json!({ "report": report, "thread_id": thread_id });
                if let Ok(line) = serde_json::to_string(&out) {
                    println!("{line}");
                }
            }
            SessionUpdate::Failed(err) => {
                let out = json!({ "error": err.to_string() });
                println!("{out}");
            }
            SessionUpdate::Cancelled => println!("{}", json!({ "error": "cancelled" })),
            _ => {}
        }
        status
    }
}
