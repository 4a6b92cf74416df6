//! Handlers for the `/subjects/{code}` ingestion surface.

use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use examark_core::error::{validate_booklet_name, validate_subject_code, CoreError};
use examark_core::layout::{list_pdfs, SubjectDirs};
use examark_db::repositories::SubjectRepo;
use serde_json::json;

use crate::engine::classifier;
use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/subjects/{code}/classify
///
/// Kicks off a classification run as a detached task; per-file progress
/// streams over the subject's classification topic. Missing preconditions
/// (no rubric, no scans) publish a terminal event and still return 200.
pub async fn classify(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> AppResult<(StatusCode, Json<DataResponse<serde_json::Value>>)> {
    validate_subject_code(&code)?;
    let dirs = SubjectDirs::new(&state.storage.data_root, &code);

    let Some(rubric) = SubjectRepo::rubric_for_code(&state.pool, &code).await? else {
        classifier::publish_status(
            &state.event_bus,
            &code,
            "classification.finished",
            json!({ "status": "skipped", "reason": "no rubric bound to subject" }),
        );
        return Ok((
            StatusCode::OK,
            Json(DataResponse {
                data: json!({ "status": "skipped", "reason": "no rubric bound to subject" }),
            }),
        ));
    };

    let snapshot = list_pdfs(&dirs.raw_scans())
        .map_err(|e| AppError::InternalError(format!("raw scans: {e}")))?;
    if snapshot.is_empty() {
        classifier::publish_status(
            &state.event_bus,
            &code,
            "classification.finished",
            json!({ "status": "skipped", "reason": "no scans to classify" }),
        );
        return Ok((
            StatusCode::OK,
            Json(DataResponse {
                data: json!({ "status": "skipped", "reason": "no scans to classify" }),
            }),
        ));
    }

    let total = snapshot.len();
    tokio::spawn(classifier::run(
        state.pool.clone(),
        state.event_bus.clone(),
        dirs,
        rubric.expected_pages,
        snapshot,
    ));

    Ok((
        StatusCode::ACCEPTED,
        Json(DataResponse {
            data: json!({ "status": "started", "total": total }),
        }),
    ))
}

/// GET /api/v1/subjects/{code}/booklets
///
/// Raw-scan booklet names awaiting classification.
pub async fn list_booklets(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> AppResult<Json<DataResponse<Vec<String>>>> {
    validate_subject_code(&code)?;
    require_rubric(&state, &code).await?;

    let dirs = SubjectDirs::new(&state.storage.data_root, &code);
    let names = list_pdfs(&dirs.raw_scans())
        .map_err(|e| AppError::InternalError(format!("raw scans: {e}")))?;
    if names.is_empty() {
        return Err(AppError::Core(CoreError::Missing(format!(
            "no scanned booklets for subject {code}"
        ))));
    }
    Ok(Json(DataResponse { data: names }))
}

/// GET /api/v1/subjects/{code}/accepted
pub async fn list_accepted(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> AppResult<Json<DataResponse<Vec<String>>>> {
    validate_subject_code(&code)?;
    let dirs = SubjectDirs::new(&state.storage.data_root, &code);
    let names = list_pdfs(&dirs.accepted())
        .map_err(|e| AppError::InternalError(format!("accepted: {e}")))?;
    Ok(Json(DataResponse { data: names }))
}

/// DELETE /api/v1/subjects/{code}/rejected
///
/// Removes every rejected booklet from both the rejected and raw-scan
/// directories.
pub async fn remove_rejected(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> AppResult<Json<DataResponse<serde_json::Value>>> {
    validate_subject_code(&code)?;
    let dirs = SubjectDirs::new(&state.storage.data_root, &code);

    let rejected_dir = dirs.rejected();
    let names = list_pdfs(&rejected_dir)
        .map_err(|e| AppError::InternalError(format!("rejected: {e}")))?;

    let mut removed = Vec::with_capacity(names.len());
    for name in &names {
        tokio::fs::remove_file(rejected_dir.join(name))
            .await
            .map_err(|e| AppError::InternalError(format!("remove {name}: {e}")))?;
        // The raw copy may already be gone; that is fine.
        let _ = tokio::fs::remove_file(dirs.raw_scans().join(name)).await;
        removed.push(name.clone());
    }

    tracing::info!(subject = %code, count = removed.len(), "Removed rejected booklets");
    Ok(Json(DataResponse {
        data: json!({ "removed": removed }),
    }))
}

/// GET /api/v1/subjects/{code}/raw/{file}
///
/// Streams a raw scan PDF inline.
pub async fn serve_raw(
    State(state): State<AppState>,
    Path((code, file)): Path<(String, String)>,
) -> AppResult<impl IntoResponse> {
    validate_subject_code(&code)?;
    validate_booklet_name(&file)?;

    let dirs = SubjectDirs::new(&state.storage.data_root, &code);
    let path = dirs.raw_scans().join(&file);
    let bytes = tokio::fs::read(&path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            AppError::Core(CoreError::Missing(format!("booklet {file} not found")))
        } else {
            AppError::InternalError(format!("read {file}: {e}"))
        }
    })?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("inline; filename=\"{file}\""),
            ),
        ],
        bytes,
    ))
}

/// 404 unless the subject has a rubric bound.
async fn require_rubric(state: &AppState, code: &str) -> AppResult<()> {
    if SubjectRepo::rubric_for_code(&state.pool, code).await?.is_none() {
        return Err(AppError::Core(CoreError::Missing(format!(
            "no rubric bound to subject {code}"
        ))));
    }
    Ok(())
}
