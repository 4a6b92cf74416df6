//! Filesystem-state bridge for the raw-scan tree.
//!
//! Polls `rawScans/<subject>/*.pdf` (depth 2) on a fixed interval, diffs
//! consecutive snapshots into typed [`FsEvent`]s, and reconciles each event
//! against `subject_progress`: PDF activity inside a subject folder upserts
//! the row with a fresh scan count, a removed subject folder deletes it.
//! Every change is published on the event bus for the dashboard.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::time::Duration;

use examark_core::layout::{self, raw_scans_root};
use examark_db::repositories::ProgressRepo;
use examark_db::DbPool;
use examark_events::{EventBus, WorkflowEvent};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Snapshot of the raw-scan tree: subject folder name → PDF names.
pub type ScanSnapshot = BTreeMap<String, BTreeSet<String>>;

/// A change observed between two snapshots of the raw-scan tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FsEvent {
    DirAdded { subject: String },
    DirRemoved { subject: String },
    FileAdded { subject: String, file: String },
    FileRemoved { subject: String, file: String },
}

/// Run the scan watcher loop until `cancel` is triggered.
pub async fn run(
    pool: DbPool,
    bus: Arc<EventBus>,
    data_root: PathBuf,
    interval: Duration,
    cancel: CancellationToken,
) {
    let raw_root = raw_scans_root(&data_root);
    tracing::info!(
        root = %raw_root.display(),
        interval_secs = interval.as_secs(),
        "Scan watcher started"
    );

    let mut previous = take_snapshot(&raw_root);
    // Reconcile whatever already exists at startup.
    for (subject, files) in &previous {
        if !files.is_empty() {
            reconcile_subject(&pool, &bus, subject, files.len() as i32).await;
        }
    }

    let mut ticker = tokio::time::interval(interval);
    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Scan watcher stopping");
                break;
            }
            _ = ticker.tick() => {
                let current = take_snapshot(&raw_root);
                let events = diff_snapshots(&previous, &current);
                for event in &events {
                    apply_event(&pool, &bus, &current, event).await;
                }
                previous = current;
            }
        }
    }
}

/// Read the raw-scan tree: one level of subject folders, PDFs inside each.
pub fn take_snapshot(raw_root: &Path) -> ScanSnapshot {
    let mut snapshot = ScanSnapshot::new();
    let Ok(entries) = std::fs::read_dir(raw_root) else {
        return snapshot;
    };
    for entry in entries.filter_map(|e| e.ok()) {
        if !entry.path().is_dir() {
            continue;
        }
        let Ok(subject) = entry.file_name().into_string() else {
            continue;
        };
        let files = layout::list_pdfs(&entry.path())
            .unwrap_or_default()
            .into_iter()
            .collect();
        snapshot.insert(subject, files);
    }
    snapshot
}

/// Diff two snapshots into typed events, directories before their files.
pub fn diff_snapshots(previous: &ScanSnapshot, current: &ScanSnapshot) -> Vec<FsEvent> {
    let mut events = Vec::new();

    for (subject, files) in current {
        match previous.get(subject) {
            None => {
                events.push(FsEvent::DirAdded {
                    subject: subject.clone(),
                });
                for file in files {
                    events.push(FsEvent::FileAdded {
                        subject: subject.clone(),
                        file: file.clone(),
                    });
                }
            }
            Some(old_files) => {
                for file in files.difference(old_files) {
                    events.push(FsEvent::FileAdded {
                        subject: subject.clone(),
                        file: file.clone(),
                    });
                }
                for file in old_files.difference(files) {
                    events.push(FsEvent::FileRemoved {
                        subject: subject.clone(),
                        file: file.clone(),
                    });
                }
            }
        }
    }

    for subject in previous.keys() {
        if !current.contains_key(subject) {
            events.push(FsEvent::DirRemoved {
                subject: subject.clone(),
            });
        }
    }

    events
}

/// Reconcile one event against the database and publish the change.
async fn apply_event(pool: &DbPool, bus: &EventBus, current: &ScanSnapshot, event: &FsEvent) {
    match event {
        FsEvent::DirAdded { subject } | FsEvent::FileAdded { subject, .. }
        | FsEvent::FileRemoved { subject, .. } => {
            let count = current
                .get(subject)
                .map(|files| files.len() as i32)
                .unwrap_or(0);
            // An empty folder never creates a row; an emptied folder still
            // gets its count refreshed.
            if count == 0 && matches!(event, FsEvent::DirAdded { .. } | FsEvent::FileAdded { .. }) {
                return;
            }
            if count == 0 {
                let exists = ProgressRepo::find_by_code(pool, subject)
                    .await
                    .ok()
                    .flatten()
                    .is_some();
                if !exists {
                    return;
                }
            }
            reconcile_subject(pool, bus, subject, count).await;
        }
        FsEvent::DirRemoved { subject } => {
            match ProgressRepo::delete_by_code(pool, subject).await {
                Ok(true) => {
                    tracing::info!(subject = %subject, "Subject folder removed, progress deleted");
                    bus.publish(WorkflowEvent::new("progress.removed").with_subject(subject));
                }
                Ok(false) => {}
                Err(e) => {
                    tracing::error!(subject = %subject, error = %e, "Failed to delete progress");
                }
            }
        }
    }
}

/// Upsert a subject's scan count and publish added/updated.
async fn reconcile_subject(pool: &DbPool, bus: &EventBus, subject: &str, count: i32) {
    let existed = match ProgressRepo::find_by_code(pool, subject).await {
        Ok(row) => row.is_some(),
        Err(e) => {
            tracing::error!(subject = %subject, error = %e, "Failed to read progress");
            return;
        }
    };

    match ProgressRepo::upsert_scanned(pool, subject, count).await {
        Ok(progress) => {
            let event_type = if existed {
                "progress.updated"
            } else {
                "progress.added"
            };
            tracing::debug!(subject = %subject, count, event = event_type, "Scan count reconciled");
            bus.publish(
                WorkflowEvent::new(event_type)
                    .with_subject(subject)
                    .with_entity(progress.id)
                    .with_payload(serde_json::to_value(&progress).unwrap_or_default()),
            );
        }
        Err(e) => {
            tracing::error!(subject = %subject, error = %e, "Failed to upsert progress");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snap(entries: &[(&str, &[&str])]) -> ScanSnapshot {
        entries
            .iter()
            .map(|(subject, files)| {
                (
                    subject.to_string(),
                    files.iter().map(|f| f.to_string()).collect(),
                )
            })
            .collect()
    }

    #[test]
    fn new_folder_emits_dir_then_files() {
        let events = diff_snapshots(&snap(&[]), &snap(&[("PHY101", &["a.pdf", "b.pdf"])]));
        assert_eq!(
            events,
            vec![
                FsEvent::DirAdded {
                    subject: "PHY101".into()
                },
                FsEvent::FileAdded {
                    subject: "PHY101".into(),
                    file: "a.pdf".into()
                },
                FsEvent::FileAdded {
                    subject: "PHY101".into(),
                    file: "b.pdf".into()
                },
            ]
        );
    }

    #[test]
    fn file_level_changes_are_per_subject() {
        let before = snap(&[("PHY101", &["a.pdf", "b.pdf"]), ("MTH101", &["x.pdf"])]);
        let after = snap(&[("PHY101", &["b.pdf", "c.pdf"]), ("MTH101", &["x.pdf"])]);
        let events = diff_snapshots(&before, &after);
        assert_eq!(
            events,
            vec![
                FsEvent::FileAdded {
                    subject: "PHY101".into(),
                    file: "c.pdf".into()
                },
                FsEvent::FileRemoved {
                    subject: "PHY101".into(),
                    file: "a.pdf".into()
                },
            ]
        );
    }

    #[test]
    fn removed_folder_emits_dir_removed_only() {
        let before = snap(&[("PHY101", &["a.pdf"])]);
        let events = diff_snapshots(&before, &snap(&[]));
        assert_eq!(
            events,
            vec![FsEvent::DirRemoved {
                subject: "PHY101".into()
            }]
        );
    }

    #[test]
    fn identical_snapshots_emit_nothing() {
        let s = snap(&[("PHY101", &["a.pdf"])]);
        assert!(diff_snapshots(&s, &s).is_empty());
    }

    #[test]
    fn snapshot_skips_non_pdf_and_plain_files() {
        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir(root.path().join("PHY101")).unwrap();
        std::fs::write(root.path().join("PHY101").join("a.pdf"), b"x").unwrap();
        std::fs::write(root.path().join("PHY101").join("notes.txt"), b"x").unwrap();
        std::fs::write(root.path().join("stray.pdf"), b"x").unwrap();

        let snapshot = take_snapshot(root.path());
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot["PHY101"].len(), 1);
        assert!(snapshot["PHY101"].contains("a.pdf"));
    }
}
