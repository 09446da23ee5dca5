use crate::GenerateError;
use crate::extract::strip_reasoning;
use crate::provider::{ChatMessage, ChatProvider, ChatRequest};
use crate::studio::SamplingParams;
use crate::types::StyleProfile;

const SYSTEM_PROMPT: &str = "You are an AI assistant that generates video scripts.";

pub(crate) fn build_generation_prompt(profile: &StyleProfile, topic: &str) -> String {
    let tone = profile.field_or_unknown("tone");
    let sentence_length = profile.field_or_unknown("sentence_length");
    let vocabulary = profile.field_or_unknown("vocabulary");
    let hooks = profile.field_or_unknown("hooks");
    let sentiment = profile.field_or_unknown("sentiment");
    let structure = profile.field_or_unknown("structure");
    let repetition = profile.field_or_unknown("repetition");

    format!(
        r#"
Generate a video script for the following topic: "{topic}". Use the exact style and structure learned from the previous analysis:

Analysis Result:
Tone: {tone}
Sentence Length: {sentence_length}
Vocabulary: {vocabulary}
Hooks: {hooks}
Sentiment: {sentiment}
Structure: {structure}
Repetition: {repetition}

Instructions:
- Match the tone ({tone}).
- Use sentences of {sentence_length} length.
- Use {vocabulary} vocabulary.
- Include hooks like {hooks}.
- Maintain a {sentiment} sentiment.
- Follow the structure: {structure}.
- Repeat phrases or ideas for emphasis if repetition was noted.
- DO NOT include scene descriptions or visual cues. Focus only on generating plain text that matches the original transcript's format.

New Video Script:
"#
    )
}

pub(crate) fn generation_request(
    model: &str,
    params: &SamplingParams,
    profile: &StyleProfile,
    topic: &str,
) -> ChatRequest {
    ChatRequest {
        model: model.to_string(),
        messages: vec![
            ChatMessage::system(SYSTEM_PROMPT),
            ChatMessage::user(build_generation_prompt(profile, topic)),
        ],
        max_completion_tokens: params.max_tokens,
        temperature: params.temperature,
        top_p: params.top_p,
        n: 1,
    }
}

/// Write a new script on `topic` in the style captured by `profile`.
pub fn generate_script(
    provider: &dyn ChatProvider,
    model: &str,
    params: &SamplingParams,
    profile: &StyleProfile,
    topic: &str,
) -> Result<String, GenerateError> {
    let request = generation_request(model, params, profile, topic);
    let response = provider.complete(&request)?;
    let script = response
        .first_content()
        .map(strip_reasoning)
        .unwrap_or_default();
    if script.is_empty() {
        tracing::warn!(
            provider = provider.name(),
            choices = response.choices.len(),
            "model returned no script text"
        );
        return Err(GenerateError::EmptyScript);
    }
    Ok(script)
}
