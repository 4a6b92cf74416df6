//! Handlers for the `/work-items` resource: page listing and booklet
//! completion.

use axum::extract::{Path, State};
use axum::Json;
use examark_core::error::{validate_id, CoreError};
use examark_core::types::DbId;
use examark_db::models::page::Page;
use examark_db::models::task::{SubjectTotals, WorkItem};
use examark_db::repositories::{PageRepo, ProgressRepo, TaskRepo, WorkItemRepo};
use serde_json::json;

use crate::error::{AppError, AppResult};
use crate::handlers::task::publish_progress;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/work-items/{id}/pages — all pages, hidden included.
pub async fn pages(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<Page>>>> {
    validate_id("WorkItem", id)?;
    find_work_item(&state, id).await?;
    let pages = PageRepo::list_by_work_item(&state.pool, id).await?;
    Ok(Json(DataResponse { data: pages }))
}

/// POST /api/v1/work-items/{id}/complete
///
/// A booklet completes only when every one of its pages carries at least
/// one annotation; an unready booklet returns `completed: false` with no
/// mutation. The completed flag, the subject-wide counter rewrite, and
/// the task's `success` flip all land in one repository transaction.
pub async fn complete(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<serde_json::Value>>> {
    validate_id("WorkItem", id)?;
    let work_item = find_work_item(&state, id).await?;
    let task = TaskRepo::find_by_id(&state.pool, work_item.task_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Task",
            id: work_item.task_id,
        }))?;

    if PageRepo::has_unannotated_page(&state.pool, work_item.id).await? {
        return Ok(Json(DataResponse {
            data: json!({
                "completed": false,
                "message": "booklet has pages without annotations",
            }),
        }));
    }

    let totals =
        WorkItemRepo::complete(&state.pool, work_item.id, task.id, &task.subject_code).await?;
    tracing::info!(
        work_item_id = work_item.id,
        booklet = %work_item.file_name,
        "Booklet completed"
    );
    if totals.total_booklets > 0 && totals.completed_booklets == totals.total_booklets {
        tracing::info!(task_id = task.id, subject = %task.subject_code, "Subject fully evaluated");
    }
    publish_progress(&state, &task.subject_code).await;

    Ok(Json(DataResponse {
        data: json!({
            "completed": true,
            "totalBooklets": totals.total_booklets,
            "completedBooklets": totals.completed_booklets,
        }),
    }))
}

/// Recount the subject's booklets across all tasks and write the
/// evaluated/pending counters.
pub(crate) async fn rollup_subject(
    state: &AppState,
    subject_code: &str,
) -> AppResult<SubjectTotals> {
    let totals = TaskRepo::subject_totals(&state.pool, subject_code).await?;
    ProgressRepo::set_rollup_counts(
        &state.pool,
        subject_code,
        totals.completed_booklets as i32,
        (totals.total_booklets - totals.completed_booklets) as i32,
    )
    .await?;
    Ok(totals)
}

async fn find_work_item(state: &AppState, id: DbId) -> AppResult<WorkItem> {
    WorkItemRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "WorkItem",
            id,
        }))
}
