//! Handlers for the `/tasks` resource: allocation, lifecycle, delivery,
//! and completion checks.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use examark_core::error::{validate_id, validate_subject_code, CoreError};
use examark_core::layout::{list_pdfs, SubjectDirs};
use examark_core::types::DbId;
use examark_db::models::subject::QuestionWithTally;
use examark_db::models::task::{AllocateRequest, Task, TaskStatus, UpdateCurrentIndex};
use examark_db::repositories::{EvaluatorRepo, SubjectRepo, TaskRepo, WorkItemRepo};
use examark_events::WorkflowEvent;
use serde::Deserialize;
use serde_json::json;

use crate::engine::extraction;
use crate::error::{AppError, AppResult};
use crate::handlers::work_item::rollup_subject;
use crate::response::DataResponse;
use crate::state::AppState;

/// Default number of booklets handed out per allocation.
const DEFAULT_BATCH_SIZE: usize = 2;

#[derive(Debug, Deserialize)]
pub struct ListTasksQuery {
    pub subject_code: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct QuestionsQuery {
    pub work_item_id: DbId,
}

/// POST /api/v1/tasks — allocate a batch of booklets to an evaluator.
pub async fn allocate(
    State(state): State<AppState>,
    Json(input): Json<AllocateRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<Task>>)> {
    validate_id("Evaluator", input.evaluator_id)?;
    validate_subject_code(&input.subject_code)?;
    let batch_size = input.batch_size.unwrap_or(DEFAULT_BATCH_SIZE);
    if batch_size == 0 {
        return Err(AppError::Core(CoreError::Validation(
            "batch_size must be at least 1".into(),
        )));
    }

    EvaluatorRepo::find_by_id(&state.pool, input.evaluator_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Evaluator",
            id: input.evaluator_id,
        }))?;
    if !EvaluatorRepo::is_bound_to_subject(&state.pool, input.evaluator_id, &input.subject_code)
        .await?
    {
        return Err(AppError::Core(CoreError::Conflict(format!(
            "evaluator {} is not assigned to subject {}",
            input.evaluator_id, input.subject_code
        ))));
    }

    let dirs = SubjectDirs::new(&state.storage.data_root, &input.subject_code);
    let accepted = list_pdfs(&dirs.accepted())
        .map_err(|e| AppError::InternalError(format!("accepted: {e}")))?;
    if accepted.is_empty() {
        return Err(AppError::Core(CoreError::Missing(format!(
            "no accepted booklets for subject {}",
            input.subject_code
        ))));
    }

    // The repository picks the batch inside its own transaction; the
    // handler only supplies the accepted universe.
    let task = TaskRepo::allocate(
        &state.pool,
        input.evaluator_id,
        &input.subject_code,
        &accepted,
        batch_size,
    )
    .await?
    .ok_or(AppError::Core(CoreError::Conflict(
        "all booklets are already assigned".into(),
    )))?;

    tracing::info!(
        task_id = task.id,
        subject = %input.subject_code,
        evaluator_id = input.evaluator_id,
        booklets = task.total_booklets,
        "Allocated booklets"
    );
    publish_progress(&state, &input.subject_code).await;

    Ok((StatusCode::CREATED, Json(DataResponse { data: task })))
}

/// GET /api/v1/tasks (optionally `?subject_code=`)
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListTasksQuery>,
) -> AppResult<Json<DataResponse<Vec<Task>>>> {
    let tasks = match query.subject_code {
        Some(code) => {
            validate_subject_code(&code)?;
            TaskRepo::list_by_subject(&state.pool, &code).await?
        }
        None => TaskRepo::list_all(&state.pool).await?,
    };
    Ok(Json(DataResponse { data: tasks }))
}

/// GET /api/v1/tasks/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Task>>> {
    validate_id("Task", id)?;
    let task = find_task(&state, id).await?;
    Ok(Json(DataResponse { data: task }))
}

/// DELETE /api/v1/tasks/{id} — removes the task and its work items.
pub async fn delete(State(state): State<AppState>, Path(id): Path<DbId>) -> AppResult<StatusCode> {
    validate_id("Task", id)?;
    if TaskRepo::delete(&state.pool, id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::Core(CoreError::NotFound { entity: "Task", id }))
    }
}

/// PUT /api/v1/tasks/{id}/current-index
pub async fn set_current_index(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateCurrentIndex>,
) -> AppResult<Json<DataResponse<Task>>> {
    validate_id("Task", id)?;
    let task = find_task(&state, id).await?;
    if input.current_index < 1 || input.current_index > task.total_booklets {
        return Err(AppError::Core(CoreError::Validation(format!(
            "current_index must be between 1 and {}",
            task.total_booklets
        ))));
    }
    let task = TaskRepo::set_current_index(&state.pool, id, input.current_index)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Task", id }))?;
    Ok(Json(DataResponse { data: task }))
}

/// GET /api/v1/tasks/{id}/current-booklet
///
/// Resolves the work item under the task's cursor, marks the task active,
/// extracts pages on first access, and returns the non-hidden page set
/// alongside the task, work item, and rubric.
pub async fn current_booklet(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<serde_json::Value>>> {
    validate_id("Task", id)?;
    let task = find_task(&state, id).await?;

    let work_item = WorkItemRepo::item_at_index(&state.pool, task.id, task.current_index)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::Missing(format!(
                "no booklet at index {} of task {}",
                task.current_index, task.id
            )))
        })?;

    let rubric = SubjectRepo::rubric_for_code(&state.pool, &task.subject_code)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::Missing(format!(
                "no rubric bound to subject {}",
                task.subject_code
            )))
        })?;

    let dirs = SubjectDirs::new(&state.storage.data_root, &task.subject_code);
    if !dirs.accepted().join(&work_item.file_name).exists() {
        return Err(AppError::Core(CoreError::Missing(format!(
            "booklet {} not found in accepted directory",
            work_item.file_name
        ))));
    }

    // Serving a booklet makes the task active. Plain set, idempotent.
    let task = TaskRepo::set_status(&state.pool, task.id, TaskStatus::Active)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Task", id }))?;

    let pages = extraction::visible_pages(&state.pool, &dirs, &work_item, &rubric.hidden_pages).await?;

    Ok(Json(DataResponse {
        data: json!({
            "task": task,
            "workItem": work_item,
            "rubric": rubric,
            "pages": pages,
        }),
    }))
}

/// GET /api/v1/tasks/{id}/completion
///
/// Subject-wide recount: writes the evaluated/pending counters and reports
/// the task complete when the subject-wide completed count equals the
/// subject-wide total, flipping this task to `success` in that case.
pub async fn completion(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<serde_json::Value>>> {
    validate_id("Task", id)?;
    let task = find_task(&state, id).await?;

    let totals = rollup_subject(&state, &task.subject_code).await?;
    let complete = totals.total_booklets > 0 && totals.completed_booklets == totals.total_booklets;
    if complete {
        TaskRepo::set_status(&state.pool, task.id, TaskStatus::Success).await?;
        tracing::info!(task_id = task.id, subject = %task.subject_code, "Task completed");
    }

    Ok(Json(DataResponse {
        data: json!({
            "completed": complete,
            "totalBooklets": totals.total_booklets,
            "completedBooklets": totals.completed_booklets,
        }),
    }))
}

/// GET /api/v1/tasks/{id}/questions?work_item_id=
///
/// Rubric questions enriched with the booklet's current mark tallies.
pub async fn questions(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Query(query): Query<QuestionsQuery>,
) -> AppResult<Json<DataResponse<Vec<QuestionWithTally>>>> {
    validate_id("Task", id)?;
    validate_id("WorkItem", query.work_item_id)?;
    let task = find_task(&state, id).await?;

    let rubric = SubjectRepo::rubric_for_code(&state.pool, &task.subject_code)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::Missing(format!(
                "no rubric bound to subject {}",
                task.subject_code
            )))
        })?;

    let questions =
        SubjectRepo::questions_with_tallies(&state.pool, rubric.id, query.work_item_id).await?;
    Ok(Json(DataResponse { data: questions }))
}

async fn find_task(state: &AppState, id: DbId) -> AppResult<Task> {
    TaskRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Task", id }))
}

/// Push the refreshed progress row for a subject onto the event bus.
pub(crate) async fn publish_progress(state: &AppState, subject_code: &str) {
    match examark_db::repositories::ProgressRepo::find_by_code(&state.pool, subject_code).await {
        Ok(Some(progress)) => {
            state.event_bus.publish(
                WorkflowEvent::new("progress.updated")
                    .with_subject(subject_code)
                    .with_entity(progress.id)
                    .with_payload(serde_json::to_value(&progress).unwrap_or_default()),
            );
        }
        Ok(None) => {}
        Err(e) => {
            tracing::error!(subject = %subject_code, error = %e, "Failed to refresh progress");
        }
    }
}
