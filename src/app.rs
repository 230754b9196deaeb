use crate::handlers;
use crate::state::AppState;
use axum::{
    routing::{delete, get, patch, post},
    Router,
};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route(
            "/api/categories",
            get(handlers::list_categories).post(handlers::create_category),
        )
        .route(
            "/api/categories/:id",
            patch(handlers::update_category).delete(handlers::delete_category),
        )
        .route(
            "/api/points",
            get(handlers::list_points).post(handlers::create_point),
        )
        .route(
            "/api/points/:id",
            patch(handlers::update_point).delete(handlers::delete_point),
        )
        .route("/api/points/:id/restore", post(handlers::restore_point))
        .route("/api/trash", get(handlers::get_trash))
        .route("/api/trash/:id", delete(handlers::purge_point))
        .route(
            "/api/ratings",
            get(handlers::list_ratings).post(handlers::create_rating),
        )
        .route("/api/ratings/:id", delete(handlers::delete_rating))
        .route("/api/ratings/day/:date", delete(handlers::delete_ratings_day))
        .route("/api/stats", get(handlers::get_stats))
        .route("/api/export", get(handlers::export))
        .route("/api/import", post(handlers::import))
        .route("/api/reset", post(handlers::reset))
        .with_state(state)
}
