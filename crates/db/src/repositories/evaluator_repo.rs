//! Repository for the `evaluators` and `evaluator_subjects` tables.

use examark_core::types::DbId;
use sqlx::PgPool;

use crate::models::evaluator::Evaluator;

const COLUMNS: &str = "id, name, email, created_at";

/// Read access to evaluator master data.
pub struct EvaluatorRepo;

impl EvaluatorRepo {
    /// Find an evaluator by ID.
    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<Evaluator>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM evaluators WHERE id = $1");
        sqlx::query_as::<_, Evaluator>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Whether the evaluator is bound to the subject with the given code.
    pub async fn is_bound_to_subject(
        pool: &PgPool,
        evaluator_id: DbId,
        subject_code: &str,
    ) -> Result<bool, sqlx::Error> {
        let row: (bool,) = sqlx::query_as(
            "SELECT EXISTS ( \
                 SELECT 1 FROM evaluator_subjects es \
                 JOIN subjects s ON s.id = es.subject_id \
                 WHERE es.evaluator_id = $1 AND s.code = $2 \
             )",
        )
        .bind(evaluator_id)
        .bind(subject_code)
        .fetch_one(pool)
        .await?;
        Ok(row.0)
    }
}
