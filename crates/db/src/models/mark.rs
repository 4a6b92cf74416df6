//! Mark tally entity: the current allotted score per (booklet, question).

use examark_core::types::DbId;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `mark_tallies` table. At most one per
/// (work item, question), enforced by a unique index.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct MarkTally {
    pub id: DbId,
    pub work_item_id: DbId,
    pub question_id: DbId,
    pub allotted_marks: f32,
    pub time_label: String,
    pub is_finalized: bool,
}

/// DTO for `POST /marks` (the evaluator's direct score-entry path).
#[derive(Debug, Deserialize)]
pub struct SetMark {
    pub work_item_id: DbId,
    pub question_id: DbId,
    pub allotted_marks: f32,
    pub time_label: String,
    pub is_finalized: bool,
}
