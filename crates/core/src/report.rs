//! Classification report assembly.
//!
//! Reports are plain text, one tab-separated line per booklet, written to
//! `reports/<subject>/<subject>_<timestamp>.txt` after a classification run.

use chrono::Utc;

/// Outcome of classifying one booklet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ClassificationOutcome {
    Accepted,
    Rejected,
}

impl ClassificationOutcome {
    pub fn label(self) -> &'static str {
        match self {
            ClassificationOutcome::Accepted => "Accepted",
            ClassificationOutcome::Rejected => "Rejected",
        }
    }
}

/// Accumulates per-file results into the final report body.
#[derive(Debug)]
pub struct ClassificationReport {
    subject_code: String,
    body: String,
}

impl ClassificationReport {
    pub fn new(subject_code: &str) -> Self {
        Self {
            subject_code: subject_code.to_string(),
            body: format!(
                "Classification report for subject: {subject_code}\n\nFile Name\tOutcome\tTotal Pages\n"
            ),
        }
    }

    pub fn record(&mut self, file_name: &str, outcome: ClassificationOutcome, pages: usize) {
        self.body
            .push_str(&format!("{file_name}\t{}\t{pages}\n", outcome.label()));
    }

    /// Record a booklet that could not be opened at all.
    pub fn record_failure(&mut self, file_name: &str, reason: &str) {
        self.body.push_str(&format!("{file_name}\tFailed\t{reason}\n"));
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    /// `<subject>_<timestamp>.txt`, timestamp compacted to digits only.
    pub fn file_name(&self) -> String {
        let timestamp = Utc::now().format("%Y%m%d%H%M%S%3f");
        format!("{}_{timestamp}.txt", self.subject_code)
    }
}
