//! Subject and rubric entities (read-only master data).

use examark_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `subjects` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Subject {
    pub id: DbId,
    pub code: String,
    pub name: String,
    pub created_at: Timestamp,
}

/// A row from the `rubrics` table: the grading scheme bound to a subject.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Rubric {
    pub id: DbId,
    pub subject_id: DbId,
    /// Scanned booklets must have exactly this many pages to be accepted.
    pub expected_pages: i32,
    /// Zero-based page indices withheld from the evaluator's view.
    pub hidden_pages: Vec<i32>,
    pub evaluation_minutes: i32,
    pub created_at: Timestamp,
}

/// A row from the `rubric_questions` table (one level of sub-questions).
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct RubricQuestion {
    pub id: DbId,
    pub rubric_id: DbId,
    pub parent_question_id: Option<DbId>,
    pub label: String,
    pub max_marks: f32,
    pub min_marks: f32,
    pub bonus_marks: f32,
    /// Minimum step between achievable scores; `None` for sub-questions.
    pub marks_step: Option<f32>,
    pub is_sub_question: bool,
    pub sub_question_count: i32,
    pub compulsory_sub_questions: i32,
}

/// A rubric question enriched with the mark tally of one booklet.
///
/// Questions without a tally yet report zero marks, unfinalized.
#[derive(Debug, Clone, Serialize)]
pub struct QuestionWithTally {
    #[serde(flatten)]
    pub question: RubricQuestion,
    pub allotted_marks: f32,
    pub time_label: String,
    pub is_finalized: bool,
}
