//! Task and work-item entities for the allocation coordinator.

use examark_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Lifecycle of a task. Monotonic: inactive → active → success (terminal).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Inactive,
    Active,
    Success,
}

/// A row from the `tasks` table: one evaluator's assigned batch.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Task {
    pub id: DbId,
    pub subject_code: String,
    pub evaluator_id: DbId,
    pub total_booklets: i32,
    /// 1-based pointer into the task's ordered work items.
    pub current_index: i32,
    pub status: TaskStatus,
    pub created_at: Timestamp,
}

/// A row from the `work_items` table: one booklet assigned within a task.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct WorkItem {
    pub id: DbId,
    pub task_id: DbId,
    pub file_name: String,
    pub completed: bool,
}

/// DTO for `POST /tasks` (allocation request).
#[derive(Debug, Deserialize)]
pub struct AllocateRequest {
    pub evaluator_id: DbId,
    pub subject_code: String,
    /// Number of booklets to assign in this batch. Defaults to 2.
    pub batch_size: Option<usize>,
}

/// DTO for `PUT /tasks/{id}/current-index`.
#[derive(Debug, Deserialize)]
pub struct UpdateCurrentIndex {
    pub current_index: i32,
}

/// Subject-wide booklet totals used by completion rollup.
#[derive(Debug, Clone, Copy, FromRow, Serialize)]
pub struct SubjectTotals {
    pub total_booklets: i64,
    pub completed_booklets: i64,
}
