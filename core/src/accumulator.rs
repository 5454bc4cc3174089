use rentlens_protocol::report::CanonicalReport;
use tracing::trace;

/// What the presentation layer should show right now.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Draft<'a> {
    Text(&'a str),
    Report(&'a CanonicalReport),
}

/// Growing state of the report for one analysis request.
///
/// Incremental text is appended until a complete report replaces it. The
/// replacement latches: after [`ReportAccumulator::replace_final`] nothing
/// but [`ReportAccumulator::reset`] changes the draft.
///
/// Duplicate suppression is substring based. A chunk that happens to occur
/// verbatim inside earlier text (a short word, a repeated bullet) is dropped
/// even when the producer meant to repeat it.
#[derive(Debug, Default)]
pub struct ReportAccumulator {
    text: String,
    report: Option<CanonicalReport>,
}

impl ReportAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_finalized(&self) -> bool {
        self.report.is_some()
    }

    /// Returns whether the draft changed.
    pub fn append_incremental(&mut self, text: &str) -> bool {
        if self.is_finalized() || text.is_empty() || self.text.contains(text) {
            trace!("ignoring chunk of {} bytes", text.len());
            return false;
        }
        self.text.push_str(text);
        true
    }

    /// Returns whether the report was installed; a second final report is
    /// ignored.
    pub fn replace_final(&mut self, report: CanonicalReport) -> bool {
        if self.is_finalized() {
            return false;
        }
        self.report = Some(report);
        true
    }

    pub fn current_draft(&self) -> Draft<'_> {
        match &self.report {
            Some(report) => Draft::Report(report),
            None => Draft::Text(&self.text),
        }
    }

    /// Accumulated incremental text, kept even after finalization.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn report(&self) -> Option<&CanonicalReport> {
        self.report.as_ref()
    }

    pub fn reset(&mut self) {
        self.text.clear();
        self.report = None;
    }
}
