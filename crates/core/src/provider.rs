//! Completion provider client and the analysis service.
//!
//! The service is a strict pass-through: it builds exactly one request from
//! the fixed template, sends it, parses the completion content as JSON, and
//! returns that value verbatim. There is no retry, caching, or response
//! validation beyond JSON well-formedness; the renderer trusts the shape the
//! prompt demands.

use crate::prompt::{self, ChatRequest};
use crate::{AdvisorError, AdvisorResult, ProviderConfig};
use advisor_types::NonEmptyText;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info};

/// Seam between the analysis service and the completion provider. Handler
/// tests substitute a recording mock here.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Sends one completion request and returns the completion content parsed
    /// as JSON.
    async fn complete(&self, request: &ChatRequest) -> AdvisorResult<Value>;
}

/// OpenAI-compatible chat-completions backend.
pub struct OpenAiBackend {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl OpenAiBackend {
    pub fn new(provider: &ProviderConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: provider.api_key.clone(),
            base_url: provider.base_url.trim_end_matches('/').to_owned(),
        }
    }
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Error envelope OpenAI-compatible providers return on failure.
#[derive(Deserialize)]
struct ProviderErrorBody {
    error: ProviderErrorDetail,
}

#[derive(Deserialize)]
struct ProviderErrorDetail {
    message: String,
}

#[async_trait]
impl CompletionBackend for OpenAiBackend {
    async fn complete(&self, request: &ChatRequest) -> AdvisorResult<Value> {
        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ProviderErrorBody>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            error!(status = status.as_u16(), %detail, "provider call failed");
            return Err(AdvisorError::Provider {
                status: status.as_u16(),
                detail,
            });
        }

        let body: ChatResponse = response.json().await?;
        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(AdvisorError::EmptyCompletion)?;

        Ok(serde_json::from_str(&content)?)
    }
}

/// One analysis = one provider call.
#[derive(Clone)]
pub struct AnalysisService {
    backend: Arc<dyn CompletionBackend>,
    model: String,
}

impl AnalysisService {
    pub fn new(provider: &ProviderConfig) -> Self {
        Self {
            backend: Arc::new(OpenAiBackend::new(provider)),
            model: provider.model.clone(),
        }
    }

    /// Builds the service over an arbitrary backend. Used by tests.
    pub fn with_backend(model: impl Into<String>, backend: Arc<dyn CompletionBackend>) -> Self {
        Self {
            backend,
            model: model.into(),
        }
    }

    /// Runs one analysis and returns the provider's JSON verbatim.
    ///
    /// Both inputs have already passed non-empty validation; absence of either
    /// is a caller error and never reaches this point.
    pub async fn analyze(
        &self,
        user_feeling: &NonEmptyText,
        tongue_image: &NonEmptyText,
    ) -> AdvisorResult<Value> {
        let request = prompt::build_request(&self.model, user_feeling, tongue_image);
        info!(model = %self.model, "requesting analysis");
        self.backend.complete(&request).await
    }
}
