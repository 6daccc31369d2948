pub mod auth;
pub mod error;
mod identity;
mod interviews;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // Session routes (public; they read and write the session cookie)
    let auth_routes = Router::new()
        .route("/sign-up", post(auth::sign_up))
        .route("/sign-in", post(auth::sign_in))
        .route("/sign-out", post(auth::sign_out))
        .route("/me", get(auth::me))
        .route("/status", get(auth::status));

    // Local identity provider
    let identity_routes = Router::new()
        .route("/accounts", post(identity::create_account))
        .route("/token", post(identity::issue_token));

    Router::new()
        .route("/health", get(health_check))
        .route("/interview", get(interviews::generator_page))
        .route("/interview/:id", get(interviews::interview_detail))
        .nest("/api/auth", auth_routes)
        .nest("/api/identity", identity_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
