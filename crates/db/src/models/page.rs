//! Extracted page entity.

use examark_core::types::DbId;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Annotation-visitation state of a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "page_visit", rename_all = "snake_case")]
#[serde(rename_all = "camelCase")]
pub enum PageVisit {
    NotVisited,
    Visited,
    Submitted,
}

/// A row from the `pages` table: one extracted page image of a booklet.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Page {
    pub id: DbId,
    pub work_item_id: DbId,
    pub image_name: String,
    pub visit_state: PageVisit,
}

/// DTO for `PUT /pages/{id}/visit-state`.
#[derive(Debug, Deserialize)]
pub struct UpdateVisitState {
    pub visit_state: PageVisit,
}
