//! HTTP-level integration tests for allocation and task lifecycle.
//!
//! Uses Axum's tower::ServiceExt to send requests directly to the router.
//! Master data is seeded through raw SQL, booklets through a temp data
//! root, then behaviour is verified through the HTTP API.

mod common;

use std::path::Path;

use axum::http::StatusCode;
use common::{body_json, build_test_app, get, post_json, put_json};
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn seed_subject(pool: &PgPool, code: &str) -> i64 {
    let subject_id: i64 =
        sqlx::query_scalar("INSERT INTO subjects (code, name) VALUES ($1, $1) RETURNING id")
            .bind(code)
            .fetch_one(pool)
            .await
            .unwrap();
    sqlx::query("INSERT INTO rubrics (subject_id, expected_pages) VALUES ($1, 4)")
        .bind(subject_id)
        .execute(pool)
        .await
        .unwrap();
    subject_id
}

async fn seed_evaluator(pool: &PgPool, subject_id: i64, email: &str) -> i64 {
    let evaluator_id: i64 =
        sqlx::query_scalar("INSERT INTO evaluators (name, email) VALUES ($1, $1) RETURNING id")
            .bind(email)
            .fetch_one(pool)
            .await
            .unwrap();
    sqlx::query("INSERT INTO evaluator_subjects (evaluator_id, subject_id) VALUES ($1, $2)")
        .bind(evaluator_id)
        .bind(subject_id)
        .execute(pool)
        .await
        .unwrap();
    evaluator_id
}

/// Drop placeholder booklets into `accepted/<code>/`. Allocation only
/// lists names, so the content never matters.
fn seed_accepted(data_root: &Path, code: &str, names: &[&str]) {
    let dir = data_root.join("accepted").join(code);
    std::fs::create_dir_all(&dir).unwrap();
    for name in names {
        std::fs::write(dir.join(name), b"%PDF-1.4").unwrap();
    }
}

async fn seed_progress(pool: &PgPool, code: &str, scanned: i32) {
    sqlx::query("INSERT INTO subject_progress (subject_code, scanned_count) VALUES ($1, $2)")
        .bind(code)
        .bind(scanned)
        .execute(pool)
        .await
        .unwrap();
}

// ---------------------------------------------------------------------------
// Allocation
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn test_allocate_assigns_first_unassigned_batch(pool: PgPool) {
    let data_root = tempfile::tempdir().unwrap();
    let subject_id = seed_subject(&pool, "MTH101").await;
    let evaluator_id = seed_evaluator(&pool, subject_id, "a@example.com").await;
    seed_accepted(data_root.path(), "MTH101", &["a.pdf", "b.pdf", "c.pdf"]);
    seed_progress(&pool, "MTH101", 0).await;

    let app = build_test_app(pool.clone(), data_root.path());
    let response = post_json(
        app,
        "/api/v1/tasks",
        serde_json::json!({ "evaluator_id": evaluator_id, "subject_code": "MTH101" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let json = body_json(response).await;
    let task = &json["data"];
    assert_eq!(task["subject_code"], "MTH101");
    assert_eq!(task["total_booklets"], 2);
    assert_eq!(task["current_index"], 1);
    assert_eq!(task["status"], "inactive");

    // Counters reflect the batch: 2 allocated of 3 accepted.
    let app = build_test_app(pool, data_root.path());
    let json = body_json(get(app, "/api/v1/progress").await).await;
    let row = &json["data"][0];
    assert_eq!(row["allocated_count"], 2);
    assert_eq!(row["unallocated_count"], 1);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_allocate_conflicts_when_everything_assigned(pool: PgPool) {
    let data_root = tempfile::tempdir().unwrap();
    let subject_id = seed_subject(&pool, "PHY201").await;
    let evaluator_id = seed_evaluator(&pool, subject_id, "p@example.com").await;
    seed_accepted(data_root.path(), "PHY201", &["a.pdf"]);
    seed_progress(&pool, "PHY201", 0).await;

    let body = serde_json::json!({ "evaluator_id": evaluator_id, "subject_code": "PHY201" });
    let app = build_test_app(pool.clone(), data_root.path());
    assert_eq!(
        post_json(app, "/api/v1/tasks", body.clone()).await.status(),
        StatusCode::CREATED
    );

    let app = build_test_app(pool, data_root.path());
    let response = post_json(app, "/api/v1/tasks", body).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let json = body_json(response).await;
    assert_eq!(json["code"], "CONFLICT");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_allocate_unknown_evaluator_is_404(pool: PgPool) {
    let data_root = tempfile::tempdir().unwrap();
    seed_subject(&pool, "CHM110").await;
    seed_accepted(data_root.path(), "CHM110", &["a.pdf"]);

    let app = build_test_app(pool, data_root.path());
    let response = post_json(
        app,
        "/api/v1/tasks",
        serde_json::json!({ "evaluator_id": 4242, "subject_code": "CHM110" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_allocate_unbound_evaluator_is_conflict(pool: PgPool) {
    let data_root = tempfile::tempdir().unwrap();
    seed_subject(&pool, "BIO150").await;
    // Evaluator exists but is not bound to the subject.
    let evaluator_id: i64 = sqlx::query_scalar(
        "INSERT INTO evaluators (name, email) VALUES ('x', 'x@example.com') RETURNING id",
    )
    .fetch_one(&pool)
    .await
    .unwrap();
    seed_accepted(data_root.path(), "BIO150", &["a.pdf"]);

    let app = build_test_app(pool, data_root.path());
    let response = post_json(
        app,
        "/api/v1/tasks",
        serde_json::json!({ "evaluator_id": evaluator_id, "subject_code": "BIO150" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_allocate_rejects_bad_subject_code(pool: PgPool) {
    let data_root = tempfile::tempdir().unwrap();
    let app = build_test_app(pool, data_root.path());
    let response = post_json(
        app,
        "/api/v1/tasks",
        serde_json::json!({ "evaluator_id": 1, "subject_code": "../etc" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "VALIDATION_ERROR");
}

// ---------------------------------------------------------------------------
// Task lifecycle
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn test_current_index_is_bounds_checked(pool: PgPool) {
    let data_root = tempfile::tempdir().unwrap();
    let subject_id = seed_subject(&pool, "ENG101").await;
    let evaluator_id = seed_evaluator(&pool, subject_id, "e@example.com").await;
    seed_accepted(data_root.path(), "ENG101", &["a.pdf", "b.pdf"]);
    seed_progress(&pool, "ENG101", 0).await;

    let app = build_test_app(pool.clone(), data_root.path());
    let json = body_json(
        post_json(
            app,
            "/api/v1/tasks",
            serde_json::json!({ "evaluator_id": evaluator_id, "subject_code": "ENG101" }),
        )
        .await,
    )
    .await;
    let task_id = json["data"]["id"].as_i64().unwrap();

    let app = build_test_app(pool.clone(), data_root.path());
    let response = put_json(
        app,
        &format!("/api/v1/tasks/{task_id}/current-index"),
        serde_json::json!({ "current_index": 3 }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let app = build_test_app(pool, data_root.path());
    let response = put_json(
        app,
        &format!("/api/v1/tasks/{task_id}/current-index"),
        serde_json::json!({ "current_index": 2 }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["current_index"], 2);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_get_task_with_nonpositive_id_is_400(pool: PgPool) {
    let data_root = tempfile::tempdir().unwrap();
    let app = build_test_app(pool, data_root.path());
    let response = get(app, "/api/v1/tasks/0").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_completion_empty_task_set_is_incomplete(pool: PgPool) {
    let data_root = tempfile::tempdir().unwrap();
    let subject_id = seed_subject(&pool, "HIS120").await;
    let evaluator_id = seed_evaluator(&pool, subject_id, "h@example.com").await;
    seed_accepted(data_root.path(), "HIS120", &["a.pdf"]);
    seed_progress(&pool, "HIS120", 0).await;

    let app = build_test_app(pool.clone(), data_root.path());
    let json = body_json(
        post_json(
            app,
            "/api/v1/tasks",
            serde_json::json!({ "evaluator_id": evaluator_id, "subject_code": "HIS120" }),
        )
        .await,
    )
    .await;
    let task_id = json["data"]["id"].as_i64().unwrap();

    let app = build_test_app(pool, data_root.path());
    let response = get(app, &format!("/api/v1/tasks/{task_id}/completion")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["completed"], false);
    assert_eq!(json["data"]["totalBooklets"], 1);
    assert_eq!(json["data"]["completedBooklets"], 0);
}
