//! Handlers for the `/pages` resource.

use axum::extract::{Path, State};
use axum::Json;
use examark_core::error::{validate_id, CoreError};
use examark_core::types::DbId;
use examark_db::models::annotation::Annotation;
use examark_db::models::page::{Page, UpdateVisitState};
use examark_db::repositories::{AnnotationRepo, PageRepo};

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// PUT /api/v1/pages/{id}/visit-state
pub async fn set_visit_state(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateVisitState>,
) -> AppResult<Json<DataResponse<Page>>> {
    validate_id("Page", id)?;
    let page = PageRepo::set_visit_state(&state.pool, id, input.visit_state)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Page", id }))?;
    Ok(Json(DataResponse { data: page }))
}

/// GET /api/v1/pages/{id}/annotations
pub async fn annotations(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<Annotation>>>> {
    validate_id("Page", id)?;
    PageRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Page", id }))?;
    let annotations = AnnotationRepo::list_by_page(&state.pool, id).await?;
    Ok(Json(DataResponse { data: annotations }))
}
