use axum::{
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
    Json,
};
use axum_extra::extract::CookieJar;
use std::sync::Arc;

use super::auth::CurrentUser;
use super::error::ApiError;
use crate::interview::{load_interview_detail, DetailError, InterviewGeneratorFormData};
use crate::AppState;

/// Initial wizard fields for the signed-in user
///
/// GET /interview
pub async fn generator_page(CurrentUser(user): CurrentUser) -> Json<InterviewGeneratorFormData> {
    let userid = user.map(|u| u.id).unwrap_or_default();
    Json(InterviewGeneratorFormData::new(userid))
}

/// Interview plus agent props, or a redirect home when the interview is gone
///
/// GET /interview/:id
pub async fn interview_detail(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    match load_interview_detail(&state.auth, state.interviews.as_ref(), &jar, &id).await {
        Ok(detail) => Ok(Json(detail).into_response()),
        Err(DetailError::NotFound(_)) => {
            tracing::debug!(interview_id = %id, "Interview not found, redirecting home");
            Ok(Redirect::to("/").into_response())
        }
        Err(DetailError::Store(e)) => Err(e.into()),
    }
}
