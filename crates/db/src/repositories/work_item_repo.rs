//! Repository for the `work_items` table.

use examark_core::types::DbId;
use sqlx::PgPool;

use crate::models::task::{SubjectTotals, WorkItem};
use crate::repositories::progress_repo::ProgressRepo;
use crate::repositories::task_repo::TaskRepo;

const COLUMNS: &str = "id, task_id, file_name, completed";

pub struct WorkItemRepo;

impl WorkItemRepo {
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<WorkItem>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM work_items WHERE id = $1");
        sqlx::query_as::<_, WorkItem>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// A task's booklets in assignment order (insertion order, so the
    /// 1-based task cursor indexes into this list).
    pub async fn list_by_task(pool: &PgPool, task_id: DbId) -> Result<Vec<WorkItem>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM work_items WHERE task_id = $1 ORDER BY id ASC");
        sqlx::query_as::<_, WorkItem>(&query)
            .bind(task_id)
            .fetch_all(pool)
            .await
    }

    /// Resolve the booklet under a task's 1-based cursor.
    pub async fn item_at_index(
        pool: &PgPool,
        task_id: DbId,
        index: i32,
    ) -> Result<Option<WorkItem>, sqlx::Error> {
        if index < 1 {
            return Ok(None);
        }
        let query = format!(
            "SELECT {COLUMNS} FROM work_items WHERE task_id = $1 \
             ORDER BY id ASC OFFSET $2 LIMIT 1"
        );
        sqlx::query_as::<_, WorkItem>(&query)
            .bind(task_id)
            .bind(i64::from(index) - 1)
            .fetch_optional(pool)
            .await
    }

    pub async fn mark_completed(pool: &PgPool, id: DbId) -> Result<Option<WorkItem>, sqlx::Error> {
        let query =
            format!("UPDATE work_items SET completed = TRUE WHERE id = $1 RETURNING {COLUMNS}");
        sqlx::query_as::<_, WorkItem>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Finish a booklet and roll the subject up atomically: flip the
    /// completed flag, recount the subject, rewrite the evaluation
    /// counters, and flip the owning task to `success` once every booklet
    /// in the subject is done. A crash mid-way leaves all of them at their
    /// previous state rather than a flagged item with stale counters.
    pub async fn complete(
        pool: &PgPool,
        id: DbId,
        task_id: DbId,
        subject_code: &str,
    ) -> Result<SubjectTotals, sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query("UPDATE work_items SET completed = TRUE WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let totals = TaskRepo::subject_totals(&mut *tx, subject_code).await?;
        ProgressRepo::set_rollup_counts(
            &mut *tx,
            subject_code,
            totals.completed_booklets as i32,
            (totals.total_booklets - totals.completed_booklets) as i32,
        )
        .await?;

        if totals.total_booklets > 0 && totals.completed_booklets == totals.total_booklets {
            sqlx::query("UPDATE tasks SET status = 'success' WHERE id = $1")
                .bind(task_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(totals)
    }

    /// Booklets still open on a task. Zero means the task can be closed.
    pub async fn incomplete_count_for_task(
        pool: &PgPool,
        task_id: DbId,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM work_items WHERE task_id = $1 AND completed = FALSE",
        )
        .bind(task_id)
        .fetch_one(pool)
        .await
    }
}
