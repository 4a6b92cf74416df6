//! Repository for the `pages` table (extracted booklet page images).

use examark_core::types::DbId;
use sqlx::PgPool;

use crate::models::page::{Page, PageVisit};

const COLUMNS: &str = "id, work_item_id, image_name, visit_state";

pub struct PageRepo;

impl PageRepo {
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Page>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM pages WHERE id = $1");
        sqlx::query_as::<_, Page>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Pages of a booklet in reading order (image names are
    /// zero-padded-free `page_<n>.png`, so we order by insertion id).
    pub async fn list_by_work_item(
        pool: &PgPool,
        work_item_id: DbId,
    ) -> Result<Vec<Page>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM pages WHERE work_item_id = $1 ORDER BY id ASC");
        sqlx::query_as::<_, Page>(&query)
            .bind(work_item_id)
            .fetch_all(pool)
            .await
    }

    /// Record a freshly-extracted booklet: the first page starts out
    /// `visited` (the viewer opens on it), the rest `not_visited`.
    pub async fn insert_batch(
        pool: &PgPool,
        work_item_id: DbId,
        image_names: &[String],
    ) -> Result<Vec<Page>, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let mut pages = Vec::with_capacity(image_names.len());
        let insert = format!(
            "INSERT INTO pages (work_item_id, image_name, visit_state) \
             VALUES ($1, $2, $3) RETURNING {COLUMNS}"
        );
        for (i, image_name) in image_names.iter().enumerate() {
            let state = if i == 0 {
                PageVisit::Visited
            } else {
                PageVisit::NotVisited
            };
            let page = sqlx::query_as::<_, Page>(&insert)
                .bind(work_item_id)
                .bind(image_name)
                .bind(state)
                .fetch_one(&mut *tx)
                .await?;
            pages.push(page);
        }
        tx.commit().await?;
        Ok(pages)
    }

    pub async fn set_visit_state(
        pool: &PgPool,
        id: DbId,
        state: PageVisit,
    ) -> Result<Option<Page>, sqlx::Error> {
        let query = format!("UPDATE pages SET visit_state = $2 WHERE id = $1 RETURNING {COLUMNS}");
        sqlx::query_as::<_, Page>(&query)
            .bind(id)
            .bind(state)
            .fetch_optional(pool)
            .await
    }

    /// True while any page of the booklet has no annotations at all.
    /// Gates booklet completion.
    pub async fn has_unannotated_page(
        pool: &PgPool,
        work_item_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS ( \
                 SELECT 1 FROM pages p \
                 LEFT JOIN annotations a ON a.page_id = p.id \
                 WHERE p.work_item_id = $1 \
                 GROUP BY p.id \
                 HAVING COUNT(a.id) = 0 \
             )",
        )
        .bind(work_item_id)
        .fetch_one(pool)
        .await
    }
}
