//! Handler for the `/marks` direct score-entry path.

use axum::extract::State;
use axum::Json;
use examark_core::error::validate_id;
use examark_db::models::mark::{MarkTally, SetMark};
use examark_db::repositories::MarkRepo;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/marks — upserts the (booklet, question) tally.
pub async fn set(
    State(state): State<AppState>,
    Json(input): Json<SetMark>,
) -> AppResult<Json<DataResponse<MarkTally>>> {
    validate_id("WorkItem", input.work_item_id)?;
    validate_id("Question", input.question_id)?;
    let tally = MarkRepo::upsert(&state.pool, &input).await?;
    Ok(Json(DataResponse { data: tally }))
}
