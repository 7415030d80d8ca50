use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use super::handlers;
use super::state::AppState;

pub fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        // Welcome / health
        .route("/", get(handlers::api::welcome))
        // The resolve pipeline
        .route("/ask", post(handlers::api::ask))
        // System status
        .route("/status", get(handlers::api::system_status))
}
