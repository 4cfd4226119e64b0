use crate::error::{CandidateError, CandidateErrorKind};

/// Backend family a model identifier belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Provider {
    Gemini,
    Anthropic,
    Openai,
    Grok,
}

pub struct ProviderConfig {
    pub api_url: &'static str,
    pub env_var: &'static str,
}

impl Provider {
    /// Resolve the backend family from a model name such as `gemini-2.5-pro`
    /// or `anthropic.claude-3-sonnet-20240229-v1:0`.
    pub fn for_model(model: &str) -> Option<Provider> {
        let model = model.to_lowercase();
        if model.contains("gemini") {
            Some(Provider::Gemini)
        } else if model.contains("claude") || model.starts_with("anthropic.") {
            Some(Provider::Anthropic)
        } else if model.contains("grok") {
            Some(Provider::Grok)
        } else if model.starts_with("gpt")
            || model.starts_with("o1")
            || model.starts_with("o3")
            || model.starts_with("o4")
        {
            Some(Provider::Openai)
        } else {
            None
        }
    }

    pub fn config(&self) -> ProviderConfig {
        match self {
            Provider::Gemini => ProviderConfig {
                api_url: "https://generativelanguage.googleapis.com/v1beta/models",
                env_var: "GEMINI_API_KEY",
            },
            Provider::Anthropic => ProviderConfig {
                api_url: "https://api.anthropic.com/v1/messages",
                env_var: "ANTHROPIC_API_KEY",
            },
            Provider::Openai => ProviderConfig {
                api_url: "https://api.openai.com/v1/chat/completions",
                env_var: "OPENAI_API_KEY",
            },
            Provider::Grok => ProviderConfig {
                api_url: "https://api.x.ai/v1/chat/completions",
                env_var: "XAI_API_KEY",
            },
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Provider::Gemini => "Gemini",
            Provider::Anthropic => "Anthropic",
            Provider::Openai => "OpenAI",
            Provider::Grok => "Grok",
        }
    }

    /// Whether the backend accepts video input directly.
    pub fn accepts_video(&self) -> bool {
        matches!(self, Provider::Gemini)
    }

    /// Validate that the API key is set for this provider
    pub fn validate_api_key(&self) -> Result<String, CandidateError> {
        let config = self.config();
        match std::env::var(config.env_var) {
            Ok(key) if !key.trim().is_empty() => Ok(key),
            _ => Err(CandidateError::new(
                CandidateErrorKind::MissingApiKey,
                format!("{} is not set for {}", config.env_var, self.name()),
            )),
        }
    }
}
