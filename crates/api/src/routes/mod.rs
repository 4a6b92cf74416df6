pub mod health;

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::{annotation, evaluator, mark, page, progress, subject, task, work_item};
use crate::state::AppState;
use crate::ws;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /ws                                  WebSocket (topic subscriptions)
///
/// /subjects/{code}/classify            start classification run (POST)
/// /subjects/{code}/booklets            raw-scan names (GET)
/// /subjects/{code}/accepted            accepted names (GET)
/// /subjects/{code}/rejected            purge rejected booklets (DELETE)
/// /subjects/{code}/raw/{file}          stream a raw scan PDF (GET)
///
/// /progress                            full dashboard list (GET)
///
/// /tasks                               allocate (POST), list (GET, ?subject_code=)
/// /tasks/{id}                          get, delete
/// /tasks/{id}/current-index            move the cursor (PUT)
/// /tasks/{id}/current-booklet          deliver + extract (GET)
/// /tasks/{id}/completion               subject-wide completion check (GET)
/// /tasks/{id}/questions                questions with tallies (GET, ?work_item_id=)
///
/// /evaluators/{id}/tasks               open tasks (GET)
///
/// /work-items/{id}/pages               all pages, hidden included (GET)
/// /work-items/{id}/complete            try to complete the booklet (POST)
///
/// /pages/{id}/visit-state              set visit state (PUT)
/// /pages/{id}/annotations              list annotations (GET)
///
/// /annotations                         create / clear sentinel (POST)
/// /annotations/{id}                    get (GET), delete (DELETE, ?work_item_id=)
///
/// /marks                               upsert a tally (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/ws", get(ws::ws_handler))
        .route("/subjects/{code}/classify", post(subject::classify))
        .route("/subjects/{code}/booklets", get(subject::list_booklets))
        .route("/subjects/{code}/accepted", get(subject::list_accepted))
        .route(
            "/subjects/{code}/rejected",
            axum::routing::delete(subject::remove_rejected),
        )
        .route("/subjects/{code}/raw/{file}", get(subject::serve_raw))
        .route("/progress", get(progress::list))
        .route("/tasks", post(task::allocate).get(task::list))
        .route("/tasks/{id}", get(task::get_by_id).delete(task::delete))
        .route("/tasks/{id}/current-index", put(task::set_current_index))
        .route("/tasks/{id}/current-booklet", get(task::current_booklet))
        .route("/tasks/{id}/completion", get(task::completion))
        .route("/tasks/{id}/questions", get(task::questions))
        .route("/evaluators/{id}/tasks", get(evaluator::open_tasks))
        .route("/work-items/{id}/pages", get(work_item::pages))
        .route("/work-items/{id}/complete", post(work_item::complete))
        .route("/pages/{id}/visit-state", put(page::set_visit_state))
        .route("/pages/{id}/annotations", get(page::annotations))
        .route("/annotations", post(annotation::create))
        .route(
            "/annotations/{id}",
            get(annotation::get_by_id).delete(annotation::delete),
        )
        .route("/marks", post(mark::set))
}
