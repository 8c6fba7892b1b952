// Thin namespace wrapper for API-layer components
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

pub mod handlers {
    pub use crate::handlers::*;
}

/// Chat, session and dashboard routes, without rate limiting or state.
pub fn api_routes() -> Router<Arc<handlers::AppState>> {
    Router::new()
        .route("/api/chat", post(handlers::chat))
        .route("/api/chat/sessions", get(handlers::list_sessions))
        .route(
            "/api/chat/sessions/:id",
            get(handlers::get_session).delete(handlers::delete_session),
        )
        .route("/api/dashboard/stats", get(handlers::dashboard_stats))
}
