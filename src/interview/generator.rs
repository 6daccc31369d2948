//! Client for the question-generation endpoint and the wizard's submit driver.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

use super::form::{FormEvent, GenerationRequest, TransitionError, Wizard};
use crate::config::GenerationConfig;

pub const GENERATE_PATH: &str = "/api/vapi/generate";

/// Shown when a failed response carries no usable `error` field
pub const FALLBACK_ERROR: &str = "Failed to generate questions";

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("{message}")]
    Rejected { status: u16, message: String },
    #[error("{0}")]
    Transport(String),
}

#[derive(Deserialize)]
struct ErrorPayload {
    error: Option<String>,
}

#[async_trait]
pub trait GenerationClient: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<(), GenerationError>;
}

pub struct HttpGenerationClient {
    client: Client,
    endpoint: String,
}

impl HttpGenerationClient {
    pub fn new(config: &GenerationConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            endpoint: format!("{}{}", config.base_url.trim_end_matches('/'), GENERATE_PATH),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl GenerationClient for HttpGenerationClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<(), GenerationError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .map_err(|e| GenerationError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let message = response
            .json::<ErrorPayload>()
            .await
            .ok()
            .and_then(|body| body.error)
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| FALLBACK_ERROR.to_string());

        Err(GenerationError::Rejected {
            status: status.as_u16(),
            message,
        })
    }
}

/// Returns the wizard to step three if an in-flight submission is dropped
struct InFlight<'a> {
    wizard: &'a mut Wizard,
    settled: bool,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.settled {
            tracing::debug!("Generation request abandoned");
            let _ = self.wizard.dispatch(FormEvent::Abandoned);
        }
    }
}

impl Wizard {
    /// Submit the wizard and settle it into `Success` or back onto step three
    /// with the failure message.
    pub async fn submit<C>(&mut self, client: &C) -> Result<(), TransitionError>
    where
        C: GenerationClient + ?Sized,
    {
        let request = self.begin_submit()?;
        let mut in_flight = InFlight {
            wizard: self,
            settled: false,
        };

        let result = client.generate(&request).await;
        in_flight.settled = true;

        let event = match result {
            Ok(()) => {
                tracing::info!(role = %request.role, amount = request.amount, "Interview questions generated");
                FormEvent::Succeeded
            }
            Err(e) => {
                tracing::error!(error = %e, "Submission error");
                FormEvent::Failed(e.to_string())
            }
        };
        in_flight.wizard.dispatch(event)
    }
}
