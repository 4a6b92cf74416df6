//! Handlers for the `/evaluators` resource.

use axum::extract::{Path, State};
use axum::Json;
use examark_core::error::{validate_id, CoreError};
use examark_core::types::DbId;
use examark_db::models::task::Task;
use examark_db::repositories::{EvaluatorRepo, TaskRepo};

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/evaluators/{id}/tasks — the evaluator's open (non-success)
/// tasks.
pub async fn open_tasks(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<Task>>>> {
    validate_id("Evaluator", id)?;
    EvaluatorRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Evaluator",
            id,
        }))?;
    let tasks = TaskRepo::list_open_by_evaluator(&state.pool, id).await?;
    Ok(Json(DataResponse { data: tasks }))
}
