//! Repository for the `subjects`, `rubrics`, and `rubric_questions` tables.
//!
//! All three are master data maintained elsewhere; this engine only reads
//! them to validate scans and drive delivery.

use examark_core::types::DbId;
use sqlx::PgPool;

use crate::models::subject::{QuestionWithTally, Rubric, RubricQuestion, Subject};

const SUBJECT_COLUMNS: &str = "id, code, name, created_at";

const RUBRIC_COLUMNS: &str =
    "id, subject_id, expected_pages, hidden_pages, evaluation_minutes, created_at";

/// Provides read access to subjects and their rubric bindings.
pub struct SubjectRepo;

impl SubjectRepo {
    /// Find a subject by its unique code.
    pub async fn find_by_code(
        pool: &PgPool,
        code: &str,
    ) -> Result<Option<Subject>, sqlx::Error> {
        let query = format!("SELECT {SUBJECT_COLUMNS} FROM subjects WHERE code = $1");
        sqlx::query_as::<_, Subject>(&query)
            .bind(code)
            .fetch_optional(pool)
            .await
    }

    /// The rubric bound to a subject, if any.
    pub async fn rubric_for_subject(
        pool: &PgPool,
        subject_id: DbId,
    ) -> Result<Option<Rubric>, sqlx::Error> {
        let query = format!("SELECT {RUBRIC_COLUMNS} FROM rubrics WHERE subject_id = $1");
        sqlx::query_as::<_, Rubric>(&query)
            .bind(subject_id)
            .fetch_optional(pool)
            .await
    }

    /// Resolve a subject code straight to its rubric.
    pub async fn rubric_for_code(
        pool: &PgPool,
        code: &str,
    ) -> Result<Option<Rubric>, sqlx::Error> {
        sqlx::query_as::<_, Rubric>(
            "SELECT r.id, r.subject_id, r.expected_pages, r.hidden_pages, \
                    r.evaluation_minutes, r.created_at \
             FROM rubrics r JOIN subjects s ON s.id = r.subject_id \
             WHERE s.code = $1",
        )
        .bind(code)
        .fetch_optional(pool)
        .await
    }

    /// All question definitions of a rubric, top-level questions first.
    pub async fn questions(
        pool: &PgPool,
        rubric_id: DbId,
    ) -> Result<Vec<RubricQuestion>, sqlx::Error> {
        sqlx::query_as::<_, RubricQuestion>(
            "SELECT id, rubric_id, parent_question_id, label, max_marks, min_marks, \
                    bonus_marks, marks_step, is_sub_question, sub_question_count, \
                    compulsory_sub_questions \
             FROM rubric_questions WHERE rubric_id = $1 \
             ORDER BY is_sub_question ASC, id ASC",
        )
        .bind(rubric_id)
        .fetch_all(pool)
        .await
    }

    /// Questions enriched with one booklet's mark tallies; questions
    /// without a tally report zero marks.
    pub async fn questions_with_tallies(
        pool: &PgPool,
        rubric_id: DbId,
        work_item_id: DbId,
    ) -> Result<Vec<QuestionWithTally>, sqlx::Error> {
        #[derive(sqlx::FromRow)]
        struct Row {
            #[sqlx(flatten)]
            question: RubricQuestion,
            allotted_marks: Option<f32>,
            time_label: Option<String>,
            is_finalized: Option<bool>,
        }

        let rows = sqlx::query_as::<_, Row>(
            "SELECT q.id, q.rubric_id, q.parent_question_id, q.label, q.max_marks, \
                    q.min_marks, q.bonus_marks, q.marks_step, q.is_sub_question, \
                    q.sub_question_count, q.compulsory_sub_questions, \
                    t.allotted_marks, t.time_label, t.is_finalized \
             FROM rubric_questions q \
             LEFT JOIN mark_tallies t \
               ON t.question_id = q.id AND t.work_item_id = $2 \
             WHERE q.rubric_id = $1 \
             ORDER BY q.is_sub_question ASC, q.id ASC",
        )
        .bind(rubric_id)
        .bind(work_item_id)
        .fetch_all(pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| QuestionWithTally {
                question: row.question,
                allotted_marks: row.allotted_marks.unwrap_or(0.0),
                time_label: row.time_label.unwrap_or_default(),
                is_finalized: row.is_finalized.unwrap_or(false),
            })
            .collect())
    }
}
