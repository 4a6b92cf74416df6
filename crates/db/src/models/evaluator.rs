//! Evaluator entity (read-only master data).

use examark_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `evaluators` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Evaluator {
    pub id: DbId,
    pub name: String,
    pub email: String,
    pub created_at: Timestamp,
}
