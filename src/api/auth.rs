use axum::{
    async_trait,
    extract::{FromRequestParts, State},
    http::request::Parts,
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::CookieJar;
use serde::Serialize;
use std::convert::Infallible;
use std::sync::Arc;

use crate::auth::{AuthError, AuthOutcome};
use crate::db::{SignInParams, SignUpParams, User};
use crate::AppState;

/// The signed-in user, if the request carries a usable session cookie
pub struct CurrentUser(pub Option<User>);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        Ok(CurrentUser(state.auth.get_current_user(&jar).await))
    }
}

#[derive(Serialize)]
pub struct AuthStatusResponse {
    pub authenticated: bool,
}

fn failure(err: &AuthError) -> Response {
    let outcome = AuthOutcome::from(err);
    (outcome.status_code(), Json(outcome)).into_response()
}

/// POST /api/auth/sign-up
pub async fn sign_up(
    State(state): State<Arc<AppState>>,
    Json(params): Json<SignUpParams>,
) -> Response {
    match state.auth.sign_up(params).await {
        Ok(_) => Json(AuthOutcome::ok("User created successfully. Please sign in now.")).into_response(),
        Err(e) => failure(&e),
    }
}

/// POST /api/auth/sign-in
pub async fn sign_in(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(params): Json<SignInParams>,
) -> Response {
    match state.auth.sign_in(jar, &params).await {
        Ok(jar) => (jar, Json(AuthOutcome::ok("Signed in successfully"))).into_response(),
        Err(e) => failure(&e),
    }
}

/// POST /api/auth/sign-out
pub async fn sign_out(State(state): State<Arc<AppState>>, jar: CookieJar) -> Response {
    let jar = state.auth.sign_out(jar);
    (jar, Json(AuthOutcome::ok("Signed out"))).into_response()
}

/// GET /api/auth/me
pub async fn me(CurrentUser(user): CurrentUser) -> Json<Option<User>> {
    Json(user)
}

/// GET /api/auth/status
pub async fn status(CurrentUser(user): CurrentUser) -> Json<AuthStatusResponse> {
    Json(AuthStatusResponse {
        authenticated: user.is_some(),
    })
}
