//! Data behind the interview detail page.

use axum_extra::extract::CookieJar;
use serde::Serialize;
use thiserror::Error;

use crate::auth::AuthService;
use crate::db::{InterviewResponse, InterviewStore, StoreError};

const ANONYMOUS_NAME: &str = "User";

/// Props handed to the interview agent
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentProps {
    pub user_name: String,
    pub user_id: Option<String>,
    pub interview_id: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub questions: Vec<String>,
    pub feedback_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct InterviewDetail {
    pub interview: InterviewResponse,
    pub agent: AgentProps,
}

#[derive(Debug, Error)]
pub enum DetailError {
    #[error("interview {0} not found")]
    NotFound(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Load user, then interview, then feedback. A missing interview stops the
/// sequence before feedback is looked up.
pub async fn load_interview_detail(
    auth: &AuthService,
    interviews: &dyn InterviewStore,
    jar: &CookieJar,
    interview_id: &str,
) -> Result<InterviewDetail, DetailError> {
    let user = auth.get_current_user(jar).await;

    let interview = interviews
        .get_interview(interview_id)
        .await?
        .ok_or_else(|| DetailError::NotFound(interview_id.to_string()))?;

    let feedback = match &user {
        Some(user) => interviews.get_feedback(interview_id, &user.id).await?,
        None => None,
    };

    let interview = InterviewResponse::from(interview);
    let agent = AgentProps {
        user_name: user
            .as_ref()
            .map_or_else(|| ANONYMOUS_NAME.to_string(), |u| u.name.clone()),
        user_id: user.map(|u| u.id),
        interview_id: interview.id.clone(),
        kind: "interview",
        questions: interview.questions.clone(),
        feedback_id: feedback.map(|f| f.id),
    };

    Ok(InterviewDetail { interview, agent })
}
