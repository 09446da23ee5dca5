use crate::ProviderError;
use crate::http::default_agent;

use super::{ChatProvider, ChatRequest, ChatResponse};

const GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";
const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";

/// Known OpenAI-compatible endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    Groq,
    OpenRouter,
}

impl Preset {
    fn name(self) -> &'static str {
        match self {
            Preset::Groq => "groq",
            Preset::OpenRouter => "openrouter",
        }
    }

    fn base_url(self) -> &'static str {
        match self {
            Preset::Groq => GROQ_BASE_URL,
            Preset::OpenRouter => OPENROUTER_BASE_URL,
        }
    }
}

/// Chat provider speaking the `/chat/completions` protocol over ureq.
pub struct OpenAiCompatProvider {
    preset: Preset,
    base_url: String,
    api_key: String,
    agent: ureq::Agent,
}

impl OpenAiCompatProvider {
    pub fn new(
        preset: Preset,
        base_url: Option<&str>,
        api_key: Option<&str>,
    ) -> Result<Self, ProviderError> {
        let api_key = api_key
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or_else(|| ProviderError::Config(format!("{} API key not set", preset.name())))?
            .to_string();
        let base_url = base_url
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .unwrap_or(preset.base_url())
            .trim_end_matches('/')
            .to_string();
        Ok(Self {
            preset,
            base_url,
            api_key,
            agent: default_agent(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    fn parse_response(body: &str) -> Result<ChatResponse, ProviderError> {
        serde_json::from_str(body).map_err(|e| ProviderError::InvalidResponse(e.to_string()))
    }
}

impl ChatProvider for OpenAiCompatProvider {
    fn name(&self) -> &'static str {
        self.preset.name()
    }

    fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, ProviderError> {
        let url = self.endpoint();
        let response = self
            .agent
            .post(&url)
            .header("Authorization", &format!("Bearer {}", self.api_key))
            .send_json(request)
            .map_err(|e| ProviderError::Network(format!("{e}")))?;

        let status = response.status();
        let raw = response
            .into_body()
            .read_to_string()
            .map_err(|e| ProviderError::Network(format!("{e}")))?;

        if !status.is_success() {
            tracing::error!(
                provider = self.name(),
                status = status.as_u16(),
                body = %raw,
                "chat completion failed"
            );
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body: raw,
            });
        }

        tracing::debug!(provider = self.name(), body = %raw, "chat completion response");
        Self::parse_response(raw.trim())
    }
}
