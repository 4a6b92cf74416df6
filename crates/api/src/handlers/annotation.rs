//! Handlers for the `/annotations` resource.
//!
//! Creation doubles as the clear path: a request whose icon URL is the
//! clear sentinel sweeps the question's annotations for the whole booklet
//! instead of adding one.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use examark_core::error::{validate_id, CoreError};
use examark_core::types::DbId;
use examark_db::models::annotation::{Annotation, CreateAnnotation, DeleteAnnotationQuery};
use examark_db::repositories::{AnnotationRepo, PageRepo, RemoveOutcome};
use serde_json::json;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/annotations
pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<CreateAnnotation>,
) -> AppResult<(StatusCode, Json<DataResponse<Annotation>>)> {
    validate_id("Page", input.page_id)?;
    validate_id("Question", input.question_id)?;

    if input.is_clear_request() {
        let page = PageRepo::find_by_id(&state.pool, input.page_id)
            .await?
            .ok_or(AppError::Core(CoreError::NotFound {
                entity: "Page",
                id: input.page_id,
            }))?;

        let sentinel = AnnotationRepo::clear(&state.pool, page.work_item_id, &input)
            .await?
            .ok_or_else(|| {
                AppError::Core(CoreError::Missing(format!(
                    "no mark tally for question {} on this booklet",
                    input.question_id
                )))
            })?;
        tracing::info!(
            page_id = input.page_id,
            question_id = input.question_id,
            "Cleared question annotations"
        );
        return Ok((StatusCode::CREATED, Json(DataResponse { data: sentinel })));
    }

    let annotation = AnnotationRepo::create(&state.pool, &input)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Page",
            id: input.page_id,
        }))?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: annotation })))
}

/// GET /api/v1/annotations/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Annotation>>> {
    validate_id("Annotation", id)?;
    let annotation = AnnotationRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Annotation",
            id,
        }))?;
    Ok(Json(DataResponse { data: annotation }))
}

/// DELETE /api/v1/annotations/{id}?work_item_id=
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Query(query): Query<DeleteAnnotationQuery>,
) -> AppResult<Json<DataResponse<serde_json::Value>>> {
    validate_id("Annotation", id)?;
    validate_id("WorkItem", query.work_item_id)?;

    match AnnotationRepo::remove(&state.pool, id, query.work_item_id).await? {
        RemoveOutcome::NotFoundAnnotation => Err(AppError::Core(CoreError::NotFound {
            entity: "Annotation",
            id,
        })),
        RemoveOutcome::TallyMissing => Err(AppError::Core(CoreError::Missing(format!(
            "no mark tally to adjust for annotation {id}"
        )))),
        RemoveOutcome::Removed { demoted } => Ok(Json(DataResponse {
            data: json!({ "deleted": true, "pageDemoted": demoted }),
        })),
    }
}
