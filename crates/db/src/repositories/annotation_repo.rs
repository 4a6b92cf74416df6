//! Repository for the `annotations` table.
//!
//! Creation, the clear-sentinel sweep, and deletion each run as a single
//! transaction because they touch pages and mark tallies alongside the
//! annotation rows themselves.

use examark_core::types::DbId;
use sqlx::PgPool;

use crate::models::annotation::{Annotation, CreateAnnotation};
use crate::models::page::{Page, PageVisit};

const COLUMNS: &str = "\
    id, page_id, question_id, icon_url, x, y, width, height, \
    mark_value, comment, time_label, is_clear, created_at";

/// What happened during an annotation delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveOutcome {
    /// No annotation with that id.
    NotFoundAnnotation,
    /// The (booklet, question) pair has no tally to subtract from; the
    /// delete is rolled back.
    TallyMissing,
    /// Deleted. `demoted` is set when this was the last annotation for
    /// its (page, question) pair and the page dropped back to `visited`.
    Removed { demoted: bool },
}

pub struct AnnotationRepo;

impl AnnotationRepo {
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Annotation>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM annotations WHERE id = $1");
        sqlx::query_as::<_, Annotation>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list_by_page(
        pool: &PgPool,
        page_id: DbId,
    ) -> Result<Vec<Annotation>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM annotations WHERE page_id = $1 ORDER BY id ASC");
        sqlx::query_as::<_, Annotation>(&query)
            .bind(page_id)
            .fetch_all(pool)
            .await
    }

    /// Place an annotation and mark its page `submitted`, atomically.
    ///
    /// The tally is deliberately not touched here: scores reach the tally
    /// only through the explicit mark-entry path, while a later delete of
    /// this annotation will subtract its `mark_value`.
    pub async fn create(
        pool: &PgPool,
        req: &CreateAnnotation,
    ) -> Result<Option<Annotation>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let insert = format!(
            "INSERT INTO annotations \
             (page_id, question_id, icon_url, x, y, width, height, \
              mark_value, comment, time_label, is_clear) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, FALSE) \
             RETURNING {COLUMNS}"
        );
        let annotation = sqlx::query_as::<_, Annotation>(&insert)
            .bind(req.page_id)
            .bind(req.question_id)
            .bind(&req.icon_url)
            .bind(req.x)
            .bind(req.y)
            .bind(req.width)
            .bind(req.height)
            .bind(req.mark_value.unwrap_or(0.0))
            .bind(req.comment.as_deref().unwrap_or(""))
            .bind(&req.time_label)
            .fetch_one(&mut *tx)
            .await?;

        let page = sqlx::query_as::<_, Page>(&format!(
            "UPDATE pages SET visit_state = 'submitted' WHERE id = $1 \
             RETURNING id, work_item_id, image_name, visit_state"
        ))
        .bind(req.page_id)
        .fetch_optional(&mut *tx)
        .await?;
        if page.is_none() {
            tx.rollback().await?;
            return Ok(None);
        }

        tx.commit().await?;
        Ok(Some(annotation))
    }

    /// Clear sweep: remove every annotation for the question across all
    /// pages of the booklet, zero the question's tally, and store the
    /// sentinel row as the audit record. Requires an existing tally;
    /// without one the whole operation rolls back and `None` is returned.
    pub async fn clear(
        pool: &PgPool,
        work_item_id: DbId,
        req: &CreateAnnotation,
    ) -> Result<Option<Annotation>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query(
            "DELETE FROM annotations a USING pages p \
             WHERE a.page_id = p.id \
               AND p.work_item_id = $1 \
               AND a.question_id = $2",
        )
        .bind(work_item_id)
        .bind(req.question_id)
        .execute(&mut *tx)
        .await?;

        let zeroed = sqlx::query(
            "UPDATE mark_tallies \
             SET allotted_marks = 0, time_label = $3 \
             WHERE work_item_id = $1 AND question_id = $2",
        )
        .bind(work_item_id)
        .bind(req.question_id)
        .bind(&req.time_label)
        .execute(&mut *tx)
        .await?;
        if zeroed.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(None);
        }

        let insert = format!(
            "INSERT INTO annotations \
             (page_id, question_id, icon_url, x, y, width, height, \
              mark_value, comment, time_label, is_clear) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, 0, '', $8, TRUE) \
             RETURNING {COLUMNS}"
        );
        let sentinel = sqlx::query_as::<_, Annotation>(&insert)
            .bind(req.page_id)
            .bind(req.question_id)
            .bind(&req.icon_url)
            .bind(req.x)
            .bind(req.y)
            .bind(req.width)
            .bind(req.height)
            .bind(&req.time_label)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(sentinel))
    }

    /// Delete one annotation. A non-zero mark value is subtracted from the
    /// booklet's tally for that question (the tally must exist), and the
    /// page drops back to `visited` when no annotations remain for the
    /// (page, question) pair.
    pub async fn remove(
        pool: &PgPool,
        id: DbId,
        work_item_id: DbId,
    ) -> Result<RemoveOutcome, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let select = format!("SELECT {COLUMNS} FROM annotations WHERE id = $1");
        let Some(annotation) = sqlx::query_as::<_, Annotation>(&select)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
        else {
            return Ok(RemoveOutcome::NotFoundAnnotation);
        };

        sqlx::query("DELETE FROM annotations WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if annotation.mark_value != 0.0 {
            let adjusted = sqlx::query(
                "UPDATE mark_tallies \
                 SET allotted_marks = allotted_marks - $3 \
                 WHERE work_item_id = $1 AND question_id = $2",
            )
            .bind(work_item_id)
            .bind(annotation.question_id)
            .bind(annotation.mark_value)
            .execute(&mut *tx)
            .await?;
            if adjusted.rows_affected() == 0 {
                tx.rollback().await?;
                return Ok(RemoveOutcome::TallyMissing);
            }
        }

        let remaining = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM annotations \
             WHERE page_id = $1 AND question_id = $2",
        )
        .bind(annotation.page_id)
        .bind(annotation.question_id)
        .fetch_one(&mut *tx)
        .await?;

        let demoted = remaining == 0;
        if demoted {
            sqlx::query("UPDATE pages SET visit_state = $2 WHERE id = $1")
                .bind(annotation.page_id)
                .bind(PageVisit::Visited)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(RemoveOutcome::Removed { demoted })
    }
}
