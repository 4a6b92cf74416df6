//! Handler for the dashboard's `/progress` feed.

use axum::extract::State;
use axum::Json;
use examark_db::models::progress::SubjectProgress;
use examark_db::repositories::ProgressRepo;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/progress
pub async fn list(State(state): State<AppState>) -> AppResult<Json<DataResponse<Vec<SubjectProgress>>>> {
    let progress = ProgressRepo::list_all(&state.pool).await?;
    Ok(Json(DataResponse { data: progress }))
}
