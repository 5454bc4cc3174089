use rentlens_core::SessionUpdate;

/// Whether the CLI keeps reading updates after this one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RunStatus {
    Running,
    Finished,
    Failed,
}

pub(crate) trait UpdateProcessor {
    fn process_update(&mut self, update: SessionUpdate) -> RunStatus;
}

pub(crate) fn terminal_status(update: &SessionUpdate) -> RunStatus {
    match update {
        SessionUpdate::Completed { .. } => RunStatus::Finished,
        SessionUpdate::Failed(_) | SessionUpdate::Cancelled => RunStatus::Failed,
        _ => RunStatus::Running,
    }
}
