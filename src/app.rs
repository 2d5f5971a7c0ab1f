use crate::handlers;
use crate::state::AppState;
use axum::{routing::{get, post, put}, Router};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/signup", post(handlers::signup))
        .route("/api/login", post(handlers::login))
        .route("/api/logout", post(handlers::logout))
        .route("/api/session", get(handlers::get_session))
        .route("/api/widget-types", get(handlers::widget_types))
        .route("/api/users/:id/progress", get(handlers::get_progress))
        .route("/api/users/:id/current-day", put(handlers::save_current_day))
        .route("/api/users/:id/archive", post(handlers::archive_day))
        .route("/api/users/:id/widgets", post(handlers::add_widget))
        .route(
            "/api/users/:id/widgets/:widget_id",
            put(handlers::update_widget).delete(handlers::remove_widget),
        )
        .route("/api/users/:id/report", post(handlers::generate_report))
        .route("/api/users/:id/history", get(handlers::history))
        .with_state(state)
}
