//! Subject-wide progress counters driving the dashboard.

use examark_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `subject_progress` table.
///
/// Counters are eventually consistent: the ingestion classifier, the
/// allocation coordinator, and completion rollup each rewrite the slice
/// they own, reconciling drift at the next mutating event.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SubjectProgress {
    pub id: DbId,
    pub subject_code: String,
    pub scanned_count: i32,
    pub allocated_count: i32,
    pub unallocated_count: i32,
    pub evaluated_count: i32,
    pub evaluation_pending_count: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
