use crate::handlers;
use crate::state::AppState;
use axum::{
    routing::{get, patch, post, put},
    Router,
};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/sessions", get(handlers::list_sessions))
        .route(
            "/api/sessions/:id",
            patch(handlers::edit_session).delete(handlers::delete_session),
        )
        .route("/api/sleep/active", get(handlers::get_active))
        .route("/api/sleep/start", post(handlers::start_sleep))
        .route("/api/sleep/stop", post(handlers::stop_sleep))
        .route("/api/metrics", get(handlers::get_metrics))
        .route("/api/charts", get(handlers::get_charts))
        .route(
            "/api/dreams",
            get(handlers::list_dreams).post(handlers::create_dream),
        )
        .route(
            "/api/dreams/:id",
            put(handlers::update_dream).delete(handlers::delete_dream),
        )
        .route("/api/journal", get(handlers::list_journal))
        .route(
            "/api/journal/:date",
            get(handlers::get_journal).put(handlers::put_journal),
        )
        .route(
            "/api/preferences",
            get(handlers::get_preferences).put(handlers::put_preferences),
        )
        .route(
            "/api/rituals/:date",
            get(handlers::get_ritual).put(handlers::put_ritual),
        )
        .route("/api/analysis", post(handlers::analyze))
        .with_state(state)
}
