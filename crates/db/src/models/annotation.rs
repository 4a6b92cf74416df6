//! Annotation entity: evaluator-placed markers on pages.

use examark_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Icon URL that turns a create request into a clear operation.
pub const CLEAR_SENTINEL_URL: &str = "/close.png";

/// A row from the `annotations` table.
///
/// `is_clear` rows are the stored audit record of a clear request; they do
/// not mark the page as submitted and carry no mark value of their own.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Annotation {
    pub id: DbId,
    pub page_id: DbId,
    pub question_id: DbId,
    pub icon_url: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub mark_value: f32,
    pub comment: String,
    pub time_label: String,
    pub is_clear: bool,
    pub created_at: Timestamp,
}

/// DTO for `POST /annotations`.
#[derive(Debug, Deserialize)]
pub struct CreateAnnotation {
    pub page_id: DbId,
    pub question_id: DbId,
    pub icon_url: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub mark_value: Option<f32>,
    pub comment: Option<String>,
    pub time_label: String,
}

impl CreateAnnotation {
    /// The clear sentinel is signalled through the icon URL, as the
    /// evaluation client has always done.
    pub fn is_clear_request(&self) -> bool {
        self.icon_url == CLEAR_SENTINEL_URL
    }
}

/// Query parameters for `DELETE /annotations/{id}`.
#[derive(Debug, Deserialize)]
pub struct DeleteAnnotationQuery {
    pub work_item_id: DbId,
}
