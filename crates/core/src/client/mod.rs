//! Model-call collaborators.
//!
//! The dispatcher only sees [`ModelClient`]: a prompt and payload go in, text or a
//! [`CandidateError`] comes out. Request shaping per backend family lives in the
//! submodules.

mod anthropic;
mod gemini;
mod openai;

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::{
    error::{CandidateError, CandidateErrorKind},
    provider::Provider,
    types::Payload,
};

#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Send `payload` with the system `prompt` to `model` and return the raw text.
    async fn call(&self, payload: &Payload, prompt: &str, model: &str)
    -> Result<String, CandidateError>;
}

/// Identifiers attached to every outgoing request so usage can be attributed.
#[derive(Debug, Clone, Default)]
pub struct RequestTags {
    pub team: Option<String>,
    pub use_case: Option<String>,
}

/// Routes each call to the HTTP API of the model's backend family.
pub struct HttpModelClient {
    http: reqwest::Client,
    tags: RequestTags,
}

impl HttpModelClient {
    pub fn new(timeout: Duration, tags: RequestTags) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http, tags })
    }

    fn tagged(&self, mut request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if let Some(team) = &self.tags.team {
            request = request.header("X-LLM-Team", team);
        }
        if let Some(use_case) = &self.tags.use_case {
            request = request.header("X-LLM-Use-Case", use_case);
        }
        request
    }

    /// Send a JSON request and classify non-2xx answers by status.
    async fn send_json(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<serde_json::Value, CandidateError> {
        let response = self.tagged(request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CandidateError::new(
                CandidateErrorKind::from_status(status.as_u16()),
                format!("HTTP {}: {}", status, truncate(&body, 300)),
            ));
        }

        Ok(response.json::<serde_json::Value>().await?)
    }
}

#[async_trait]
impl ModelClient for HttpModelClient {
    async fn call(
        &self,
        payload: &Payload,
        prompt: &str,
        model: &str,
    ) -> Result<String, CandidateError> {
        let provider = Provider::for_model(model).ok_or_else(|| {
            CandidateError::new(
                CandidateErrorKind::Unsupported,
                format!("no backend known for model {}", model),
            )
        })?;

        if payload.is_video() && !provider.accepts_video() {
            return Err(CandidateError::new(
                CandidateErrorKind::Unsupported,
                format!("{} models do not accept video input", provider.name()),
            ));
        }

        let api_key = provider.validate_api_key()?;
        debug!(model, provider = provider.name(), "sending request");

        match provider {
            Provider::Gemini => gemini::generate(self, &api_key, payload, prompt, model).await,
            Provider::Anthropic => {
                anthropic::create_message(self, &api_key, payload, prompt, model).await
            }
            Provider::Openai | Provider::Grok => {
                openai::chat_completion(self, provider, &api_key, payload, prompt, model).await
            }
        }
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}…", &text[..idx]),
        None => text.to_string(),
    }
}

fn malformed(response: &serde_json::Value) -> CandidateError {
    CandidateError::new(
        CandidateErrorKind::MalformedResponse,
        format!(
            "Invalid API response structure: {}",
            truncate(&response.to_string(), 300)
        ),
    )
}
