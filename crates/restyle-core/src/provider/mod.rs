pub mod openai_compat;

use serde::{Deserialize, Serialize};

use crate::ProviderError;

/// A role-tagged chat message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    #[serde(default)]
    pub role: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Body of an OpenAI-compatible chat completion request.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub max_completion_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
    pub n: u32,
}

/// The provider's response envelope, kept whole until extraction.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatChoice {
    #[serde(default)]
    pub message: ChatMessage,
}

impl ChatResponse {
    /// Content of the first choice, if the model returned any.
    pub fn first_content(&self) -> Option<&str> {
        self.choices
            .first()
            .map(|choice| choice.message.content.as_str())
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Chat completion provider abstraction.
pub trait ChatProvider: Send + Sync {
    fn name(&self) -> &'static str;
    fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, ProviderError>;
}

/// Create a chat provider by name.
///
/// - `"groq"` and `"openrouter"` use their public OpenAI-compatible endpoints
///   unless `base_url` overrides it.
/// - Both require an API key.
pub fn create_chat_provider(
    provider: &str,
    base_url: Option<&str>,
    api_key: Option<&str>,
) -> Result<Box<dyn ChatProvider>, ProviderError> {
    let preset = match provider {
        "groq" => openai_compat::Preset::Groq,
        "openrouter" => openai_compat::Preset::OpenRouter,
        other => {
            return Err(ProviderError::Config(format!(
                "unknown chat provider: {other}"
            )));
        }
    };
    Ok(Box::new(openai_compat::OpenAiCompatProvider::new(
        preset, base_url, api_key,
    )?))
}
