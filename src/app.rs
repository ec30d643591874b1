use crate::handlers;
use crate::state::AppState;
use axum::{routing::{delete, get, post}, Router};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/products", post(handlers::add_product_form))
        .route("/products/delete", post(handlers::delete_product_form))
        .route("/export", post(handlers::export_form))
        .route("/api/products", get(handlers::list_products).post(handlers::add_product))
        .route("/api/products/:index", delete(handlers::delete_product))
        .route("/api/export", post(handlers::export))
        .route("/api/score", get(handlers::get_score))
        .route("/api/stats", get(handlers::get_stats))
        .with_state(state)
}
