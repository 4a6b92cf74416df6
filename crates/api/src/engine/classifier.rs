//! Ingestion classification of raw scanned booklets.
//!
//! A classification run snapshots the subject's raw-scan directory once,
//! sorts each booklet into `accepted/` or `rejected/` by comparing its page
//! count against the rubric's expected count, then clears the snapshot from
//! the raw directory, folds the result into the subject's progress
//! counters, and writes a tab-separated report. Per-file progress streams
//! over the event bus to the subject's classification topic.

use std::path::Path;
use std::sync::Arc;

use examark_core::layout::SubjectDirs;
use examark_core::pdf;
use examark_core::report::{ClassificationOutcome, ClassificationReport};
use examark_db::repositories::ProgressRepo;
use examark_db::DbPool;
use examark_events::{EventBus, WorkflowEvent};
use serde_json::json;

/// Run one classification pass over the subject's raw-scan snapshot.
///
/// `snapshot` is the list of booklet names captured by the handler before
/// spawning; files dropped into the directory after the snapshot are left
/// for the next run. Per-file failures are reported and skipped; filesystem
/// and counter effects already applied are never rolled back.
pub async fn run(
    pool: DbPool,
    bus: Arc<EventBus>,
    dirs: SubjectDirs,
    expected_pages: i32,
    snapshot: Vec<String>,
) {
    let subject_code = dirs.subject_code().to_string();
    let total = snapshot.len();
    tracing::info!(subject = %subject_code, total, "Classification started");

    publish_status(&bus, &subject_code, "classification.started", json!({ "total": total }));

    let raw_dir = dirs.raw_scans();
    let mut report = ClassificationReport::new(&subject_code);
    let mut accepted = 0i32;

    for (index, file_name) in snapshot.iter().enumerate() {
        match classify_file(&dirs, file_name, expected_pages).await {
            Ok((outcome, pages)) => {
                if outcome == ClassificationOutcome::Accepted {
                    accepted += 1;
                }
                report.record(file_name, outcome, pages);
                publish_status(
                    &bus,
                    &subject_code,
                    "classification.progress",
                    json!({
                        "fileName": file_name,
                        "outcome": outcome,
                        "pages": pages,
                        "index": index + 1,
                        "total": total,
                    }),
                );
            }
            Err(reason) => {
                tracing::warn!(
                    subject = %subject_code,
                    file = %file_name,
                    error = %reason,
                    "Skipping unreadable booklet"
                );
                report.record_failure(file_name, &reason);
                publish_status(
                    &bus,
                    &subject_code,
                    "classification.progress",
                    json!({
                        "fileName": file_name,
                        "outcome": "failed",
                        "reason": reason,
                        "index": index + 1,
                        "total": total,
                    }),
                );
            }
        }
    }

    // Clear the snapshot from the raw directory. Files that arrived after
    // the snapshot survive and show up in the leftover recount.
    for file_name in &snapshot {
        if let Err(e) = tokio::fs::remove_file(raw_dir.join(file_name)).await {
            tracing::warn!(file = %file_name, error = %e, "Failed to remove classified scan");
        }
    }

    let leftover = examark_core::layout::list_pdfs(&raw_dir)
        .map(|names| names.len() as i32)
        .unwrap_or(0);

    match ProgressRepo::apply_classification(&pool, &subject_code, leftover, accepted).await {
        Ok(Some(progress)) => {
            bus.publish(
                WorkflowEvent::new("progress.updated")
                    .with_subject(&subject_code)
                    .with_entity(progress.id)
                    .with_payload(serde_json::to_value(&progress).unwrap_or_default()),
            );
        }
        Ok(None) => {
            tracing::warn!(subject = %subject_code, "No progress row to update after classification");
        }
        Err(e) => {
            tracing::error!(subject = %subject_code, error = %e, "Failed to update progress counters");
        }
    }

    if let Err(e) = write_report(&dirs, &report).await {
        tracing::error!(subject = %subject_code, error = %e, "Failed to write classification report");
    }

    tracing::info!(subject = %subject_code, accepted, total, "Classification completed");
    publish_status(
        &bus,
        &subject_code,
        "classification.finished",
        json!({ "accepted": accepted, "total": total }),
    );
}

/// Count pages, pick the destination, and copy one booklet.
async fn classify_file(
    dirs: &SubjectDirs,
    file_name: &str,
    expected_pages: i32,
) -> Result<(ClassificationOutcome, usize), String> {
    let source = dirs.raw_scans().join(file_name);
    let pages = pdf::page_count(&source).map_err(|e| e.to_string())?;

    let outcome = if pages as i32 == expected_pages {
        ClassificationOutcome::Accepted
    } else {
        ClassificationOutcome::Rejected
    };
    let dest_dir = match outcome {
        ClassificationOutcome::Accepted => dirs.accepted(),
        ClassificationOutcome::Rejected => dirs.rejected(),
    };

    copy_into(&source, &dest_dir, file_name)
        .await
        .map_err(|e| e.to_string())?;

    Ok((outcome, pages))
}

async fn copy_into(source: &Path, dest_dir: &Path, file_name: &str) -> std::io::Result<()> {
    tokio::fs::create_dir_all(dest_dir).await?;
    tokio::fs::copy(source, dest_dir.join(file_name)).await?;
    Ok(())
}

async fn write_report(dirs: &SubjectDirs, report: &ClassificationReport) -> std::io::Result<()> {
    let report_dir = dirs.reports();
    tokio::fs::create_dir_all(&report_dir).await?;
    tokio::fs::write(report_dir.join(report.file_name()), report.body()).await
}

/// Publish a subject-scoped classification event.
pub fn publish_status(
    bus: &EventBus,
    subject_code: &str,
    event_type: &str,
    payload: serde_json::Value,
) {
    bus.publish(
        WorkflowEvent::new(event_type)
            .with_subject(subject_code)
            .with_payload(payload),
    );
}
