use crate::ProviderError;
use crate::provider::{ChatMessage, ChatProvider, ChatRequest, ChatResponse};
use crate::studio::SamplingParams;
use crate::transcript::Transcript;

const SYSTEM_PROMPT: &str = "You are an AI assistant that analyzes text.";

pub(crate) fn build_analysis_prompt(transcript: &str) -> String {
    const PROFILE_TEMPLATE: &str = r#"{
  "tone": "Formal/Casual/Humorous/Serious/etc.",
  "sentence_length": "Short/Medium/Long/Mixed",
  "vocabulary": "Simple/Technical/Sophisticated",
  "hooks": ["List of hooks used, e.g., questions, exclamations"],
  "sentiment": "Positive/Negative/Neutral/Mixed",
  "structure": "Describe the structure (e.g., introduction, body, conclusion)",
  "repetition": "Yes/No, describe any repeated phrases or ideas"
}"#;

    format!(
        r#"
Analyze the following script for its writing style, tone, and structure:

{transcript}

Provide ONLY the following breakdown in JSON format (do not include any additional explanations or reasoning):
{template}
"#,
        transcript = transcript,
        template = PROFILE_TEMPLATE
    )
}

pub(crate) fn analysis_request(
    model: &str,
    params: &SamplingParams,
    transcript: &Transcript,
) -> ChatRequest {
    ChatRequest {
        model: model.to_string(),
        messages: vec![
            ChatMessage::system(SYSTEM_PROMPT),
            ChatMessage::user(build_analysis_prompt(transcript.as_str())),
        ],
        max_completion_tokens: params.max_tokens,
        temperature: params.temperature,
        top_p: params.top_p,
        n: 1,
    }
}

/// Ask the model for a style breakdown of `transcript`.
///
/// The envelope is returned untouched; interpreting it is the extractor's job.
pub fn analyze_style(
    provider: &dyn ChatProvider,
    model: &str,
    params: &SamplingParams,
    transcript: &Transcript,
) -> Result<ChatResponse, ProviderError> {
    let request = analysis_request(model, params, transcript);
    tracing::debug!(
        provider = provider.name(),
        model,
        transcript_chars = transcript.char_len(),
        "requesting style analysis"
    );
    provider.complete(&request)
}
