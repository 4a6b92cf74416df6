//! Repository for the `tasks` table and the allocation transaction.

use examark_core::rubric::unassigned_booklets;
use examark_core::types::DbId;
use sqlx::{FromRow, PgPool};

use crate::models::task::{SubjectTotals, Task, TaskStatus};
use crate::repositories::progress_repo::ProgressRepo;

const COLUMNS: &str =
    "id, subject_code, evaluator_id, total_booklets, current_index, status, created_at";

/// Task lifecycle plus the batch allocation transaction.
pub struct TaskRepo;

impl TaskRepo {
    /// Allocate the next batch of unassigned booklets to an evaluator.
    ///
    /// The whole pick runs in one transaction under a per-subject advisory
    /// lock: the assigned set is re-read inside the transaction, the first
    /// `batch_size` names of `accepted` that no existing work item holds
    /// are chosen, the task and items are inserted, and the subject's
    /// progress counters are rewritten from a full recount. Two
    /// interleaved allocations therefore never hand out the same booklet.
    ///
    /// Returns `None` when every accepted booklet is already assigned.
    pub async fn allocate(
        pool: &PgPool,
        evaluator_id: DbId,
        subject_code: &str,
        accepted: &[String],
        batch_size: usize,
    ) -> Result<Option<Task>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        // Serialize concurrent picks for the same subject.
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
            .bind(subject_code)
            .execute(&mut *tx)
            .await?;

        let assigned: Vec<String> = sqlx::query_scalar(
            "SELECT w.file_name FROM work_items w \
             JOIN tasks t ON t.id = w.task_id \
             WHERE t.subject_code = $1",
        )
        .bind(subject_code)
        .fetch_all(&mut *tx)
        .await?;

        let chosen: Vec<String> = unassigned_booklets(accepted, &assigned)
            .into_iter()
            .take(batch_size)
            .collect();
        if chosen.is_empty() {
            return Ok(None);
        }

        let insert = format!(
            "INSERT INTO tasks (subject_code, evaluator_id, total_booklets) \
             VALUES ($1, $2, $3) \
             RETURNING {COLUMNS}"
        );
        let task = sqlx::query_as::<_, Task>(&insert)
            .bind(subject_code)
            .bind(evaluator_id)
            .bind(chosen.len() as i32)
            .fetch_one(&mut *tx)
            .await?;

        for file_name in chosen {
            sqlx::query("INSERT INTO work_items (task_id, file_name) VALUES ($1, $2)")
                .bind(task.id)
                .bind(file_name)
                .execute(&mut *tx)
                .await?;
        }

        #[derive(FromRow)]
        struct Recount {
            allocated: i64,
            evaluated: i64,
        }
        let recount = sqlx::query_as::<_, Recount>(
            "SELECT COUNT(*) AS allocated, \
                    COUNT(*) FILTER (WHERE w.completed) AS evaluated \
             FROM work_items w \
             JOIN tasks t ON t.id = w.task_id \
             WHERE t.subject_code = $1",
        )
        .bind(subject_code)
        .fetch_one(&mut *tx)
        .await?;

        let allocated = recount.allocated as i32;
        let evaluated = recount.evaluated as i32;
        let unallocated = (accepted.len() as i32 - allocated).max(0);
        ProgressRepo::set_allocation_counts(
            &mut *tx,
            subject_code,
            allocated,
            unallocated,
            evaluated,
            allocated - evaluated,
        )
        .await?;

        tx.commit().await?;
        Ok(Some(task))
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Task>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM tasks WHERE id = $1");
        sqlx::query_as::<_, Task>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list_all(pool: &PgPool) -> Result<Vec<Task>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM tasks ORDER BY created_at DESC");
        sqlx::query_as::<_, Task>(&query).fetch_all(pool).await
    }

    pub async fn list_by_subject(
        pool: &PgPool,
        subject_code: &str,
    ) -> Result<Vec<Task>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM tasks WHERE subject_code = $1 ORDER BY created_at DESC");
        sqlx::query_as::<_, Task>(&query)
            .bind(subject_code)
            .fetch_all(pool)
            .await
    }

    /// Tasks an evaluator still has open (anything not yet successful).
    pub async fn list_open_by_evaluator(
        pool: &PgPool,
        evaluator_id: DbId,
    ) -> Result<Vec<Task>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM tasks \
             WHERE evaluator_id = $1 AND status <> 'success' \
             ORDER BY created_at ASC"
        );
        sqlx::query_as::<_, Task>(&query)
            .bind(evaluator_id)
            .fetch_all(pool)
            .await
    }

    /// Booklet file names already assigned within a subject, across all
    /// tasks.
    pub async fn assigned_names(
        pool: &PgPool,
        subject_code: &str,
    ) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar::<_, String>(
            "SELECT w.file_name FROM work_items w \
             JOIN tasks t ON t.id = w.task_id \
             WHERE t.subject_code = $1",
        )
        .bind(subject_code)
        .fetch_all(pool)
        .await
    }

    /// Move the evaluator's 1-based cursor within the task.
    pub async fn set_current_index(
        pool: &PgPool,
        id: DbId,
        current_index: i32,
    ) -> Result<Option<Task>, sqlx::Error> {
        let query = format!(
            "UPDATE tasks SET current_index = $2 WHERE id = $1 RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Task>(&query)
            .bind(id)
            .bind(current_index)
            .fetch_optional(pool)
            .await
    }

    pub async fn set_status(
        pool: &PgPool,
        id: DbId,
        status: TaskStatus,
    ) -> Result<Option<Task>, sqlx::Error> {
        let query = format!("UPDATE tasks SET status = $2 WHERE id = $1 RETURNING {COLUMNS}");
        sqlx::query_as::<_, Task>(&query)
            .bind(id)
            .bind(status)
            .fetch_optional(pool)
            .await
    }

    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Subject-wide totals across every task: assigned booklets and how
    /// many of them are fully evaluated. Generic over the executor so the
    /// completion transaction can recount on its own connection.
    pub async fn subject_totals<'e, E>(
        executor: E,
        subject_code: &str,
    ) -> Result<SubjectTotals, sqlx::Error>
    where
        E: sqlx::PgExecutor<'e>,
    {
        sqlx::query_as::<_, SubjectTotals>(
            "SELECT COUNT(*) AS total_booklets, \
                    COUNT(*) FILTER (WHERE w.completed) AS completed_booklets \
             FROM work_items w \
             JOIN tasks t ON t.id = w.task_id \
             WHERE t.subject_code = $1",
        )
        .bind(subject_code)
        .fetch_one(executor)
        .await
    }
}
