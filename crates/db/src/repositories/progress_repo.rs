//! Repository for the `subject_progress` table.
//!
//! The filesystem-state bridge upserts rows as scan folders appear, the
//! ingestion classifier folds in accepted counts, and allocation /
//! completion rewrite their counter slices by full recount.

use examark_core::types::DbId;
use sqlx::{PgExecutor, PgPool};

use crate::models::progress::SubjectProgress;

const COLUMNS: &str = "\
    id, subject_code, scanned_count, allocated_count, unallocated_count, \
    evaluated_count, evaluation_pending_count, created_at, updated_at";

/// CRUD and counter maintenance for subject progress.
pub struct ProgressRepo;

impl ProgressRepo {
    /// Full dashboard list, ordered by subject code.
    pub async fn list_all(pool: &PgPool) -> Result<Vec<SubjectProgress>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM subject_progress ORDER BY subject_code ASC");
        sqlx::query_as::<_, SubjectProgress>(&query)
            .fetch_all(pool)
            .await
    }

    /// Find by subject code.
    pub async fn find_by_code(
        pool: &PgPool,
        subject_code: &str,
    ) -> Result<Option<SubjectProgress>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM subject_progress WHERE subject_code = $1");
        sqlx::query_as::<_, SubjectProgress>(&query)
            .bind(subject_code)
            .fetch_optional(pool)
            .await
    }

    /// Upsert from scan-folder observation: insert a zeroed row on first
    /// sight, then keep `scanned_count` current. Other counters are left
    /// untouched on conflict.
    pub async fn upsert_scanned(
        pool: &PgPool,
        subject_code: &str,
        scanned_count: i32,
    ) -> Result<SubjectProgress, sqlx::Error> {
        let query = format!(
            "INSERT INTO subject_progress (subject_code, scanned_count) \
             VALUES ($1, $2) \
             ON CONFLICT (subject_code) DO UPDATE \
             SET scanned_count = EXCLUDED.scanned_count, updated_at = NOW() \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, SubjectProgress>(&query)
            .bind(subject_code)
            .bind(scanned_count)
            .fetch_one(pool)
            .await
    }

    /// Fold in one classification run: set the leftover scanned count and
    /// add the accepted booklets to the unallocated pool.
    pub async fn apply_classification(
        pool: &PgPool,
        subject_code: &str,
        scanned_remaining: i32,
        accepted_delta: i32,
    ) -> Result<Option<SubjectProgress>, sqlx::Error> {
        let query = format!(
            "UPDATE subject_progress \
             SET scanned_count = $2, \
                 unallocated_count = unallocated_count + $3, \
                 updated_at = NOW() \
             WHERE subject_code = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, SubjectProgress>(&query)
            .bind(subject_code)
            .bind(scanned_remaining)
            .bind(accepted_delta)
            .fetch_optional(pool)
            .await
    }

    /// Rewrite the allocation counters (full recount, executed inside the
    /// allocation transaction).
    pub async fn set_allocation_counts<'e, E>(
        executor: E,
        subject_code: &str,
        allocated: i32,
        unallocated: i32,
        evaluated: i32,
        evaluation_pending: i32,
    ) -> Result<(), sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query(
            "UPDATE subject_progress \
             SET allocated_count = $2, unallocated_count = $3, \
                 evaluated_count = $4, evaluation_pending_count = $5, \
                 updated_at = NOW() \
             WHERE subject_code = $1",
        )
        .bind(subject_code)
        .bind(allocated)
        .bind(unallocated)
        .bind(evaluated)
        .bind(evaluation_pending)
        .execute(executor)
        .await?;
        Ok(())
    }

    /// Rewrite the evaluation counters from a subject-wide recount.
    pub async fn set_rollup_counts<'e, E>(
        executor: E,
        subject_code: &str,
        evaluated: i32,
        evaluation_pending: i32,
    ) -> Result<(), sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query(
            "UPDATE subject_progress \
             SET evaluated_count = $2, evaluation_pending_count = $3, updated_at = NOW() \
             WHERE subject_code = $1",
        )
        .bind(subject_code)
        .bind(evaluated)
        .bind(evaluation_pending)
        .execute(executor)
        .await?;
        Ok(())
    }

    /// Delete the record for a vanished subject folder. Returns `true`
    /// when a row was removed.
    pub async fn delete_by_code(
        pool: &PgPool,
        subject_code: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM subject_progress WHERE subject_code = $1")
            .bind(subject_code)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Find by primary key (used by notification payload refreshes).
    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<SubjectProgress>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM subject_progress WHERE id = $1");
        sqlx::query_as::<_, SubjectProgress>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }
}
