//! Repository for the `mark_tallies` table.

use examark_core::types::DbId;
use sqlx::PgPool;

use crate::models::mark::{MarkTally, SetMark};

const COLUMNS: &str = "id, work_item_id, question_id, allotted_marks, time_label, is_finalized";

pub struct MarkRepo;

impl MarkRepo {
    /// Direct score entry: one tally per (booklet, question), replaced on
    /// re-entry.
    pub async fn upsert(pool: &PgPool, req: &SetMark) -> Result<MarkTally, sqlx::Error> {
        let query = format!(
            "INSERT INTO mark_tallies \
             (work_item_id, question_id, allotted_marks, time_label, is_finalized) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (work_item_id, question_id) DO UPDATE \
             SET allotted_marks = EXCLUDED.allotted_marks, \
                 time_label = EXCLUDED.time_label, \
                 is_finalized = EXCLUDED.is_finalized \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, MarkTally>(&query)
            .bind(req.work_item_id)
            .bind(req.question_id)
            .bind(req.allotted_marks)
            .bind(&req.time_label)
            .bind(req.is_finalized)
            .fetch_one(pool)
            .await
    }

    pub async fn find(
        pool: &PgPool,
        work_item_id: DbId,
        question_id: DbId,
    ) -> Result<Option<MarkTally>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM mark_tallies WHERE work_item_id = $1 AND question_id = $2"
        );
        sqlx::query_as::<_, MarkTally>(&query)
            .bind(work_item_id)
            .bind(question_id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list_by_work_item(
        pool: &PgPool,
        work_item_id: DbId,
    ) -> Result<Vec<MarkTally>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM mark_tallies WHERE work_item_id = $1 ORDER BY question_id ASC"
        );
        sqlx::query_as::<_, MarkTally>(&query)
            .bind(work_item_id)
            .fetch_all(pool)
            .await
    }
}
