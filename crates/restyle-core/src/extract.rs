//! Best-effort recovery of a [`StyleProfile`] from free-form model output.
//!
//! Model text goes through three stages: reasoning blocks are stripped, the
//! remainder is read as a JSON object, and when that fails each `key: value`
//! line becomes a field. Nothing here returns an error; an unusable response
//! ends as [`Extraction::Failed`].

use regex::Regex;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::LazyLock;

use crate::ExtractionFailure;
use crate::provider::ChatResponse;
use crate::types::{StyleProfile, StyleValue};

static REASONING_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<think>.*?</think>").expect("reasoning pattern is valid"));

/// Outcome of interpreting one model response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    /// The response (or an object embedded in it) parsed as a JSON object.
    Structured(StyleProfile),
    /// Recovered from `key: value` lines.
    Loose(StyleProfile),
    Failed(ExtractionFailure),
}

impl Extraction {
    /// Interpret the first choice of a chat completion envelope.
    pub fn from_response(response: &ChatResponse) -> Self {
        match response.first_content() {
            Some(content) => Self::from_text(content),
            None => Extraction::Failed(ExtractionFailure::NoChoices),
        }
    }

    pub fn from_text(raw: &str) -> Self {
        let text = strip_reasoning(raw);
        if let Some(fields) = parse_structured(&text) {
            return StyleProfile::new(fields)
                .map(Extraction::Structured)
                .unwrap_or(Extraction::Failed(ExtractionFailure::Empty));
        }
        StyleProfile::new(parse_loose(&text))
            .map(Extraction::Loose)
            .unwrap_or(Extraction::Failed(ExtractionFailure::Empty))
    }

    pub fn profile(&self) -> Option<&StyleProfile> {
        match self {
            Extraction::Structured(profile) | Extraction::Loose(profile) => Some(profile),
            Extraction::Failed(_) => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Extraction::Structured(_) => "structured",
            Extraction::Loose(_) => "loose",
            Extraction::Failed(_) => "failed",
        }
    }

    pub fn into_result(self) -> Result<StyleProfile, ExtractionFailure> {
        match self {
            Extraction::Structured(profile) | Extraction::Loose(profile) => Ok(profile),
            Extraction::Failed(failure) => Err(failure),
        }
    }
}

/// Remove every well-formed `<think>...</think>` block and trim the rest.
///
/// Unmatched markers are left in place.
pub fn strip_reasoning(text: &str) -> String {
    REASONING_BLOCK.replace_all(text, "").trim().to_string()
}

/// The whole text as a JSON object, or an object embedded in prose or a code
/// fence. An embedded object is only taken when the text around it carries no
/// labelled `key: value` lines; otherwise the object is just one field's value.
fn parse_structured(text: &str) -> Option<BTreeMap<String, StyleValue>> {
    if let Some(fields) = parse_object(text) {
        return Some(fields);
    }
    let (start, end) = json_object_bounds(text)?;
    let surrounding = format!("{}\n{}", &text[..start], &text[end + 1..]);
    if has_labelled_lines(&surrounding) {
        return None;
    }
    parse_object(&text[start..=end])
}

fn parse_object(text: &str) -> Option<BTreeMap<String, StyleValue>> {
    let object: Map<String, Value> = serde_json::from_str(text).ok()?;
    Some(
        object
            .into_iter()
            .map(|(key, value)| (key, StyleValue::from_json(value)))
            .collect(),
    )
}

fn parse_loose(text: &str) -> BTreeMap<String, StyleValue> {
    text.lines()
        .filter_map(|line| line.split_once(':'))
        .map(|(key, value)| {
            (
                key.trim().to_lowercase(),
                StyleValue::Text(value.trim().to_string()),
            )
        })
        .collect()
}

fn has_labelled_lines(text: &str) -> bool {
    text.lines()
        .filter_map(|line| line.split_once(':'))
        .any(|(key, value)| !key.trim().is_empty() && !value.trim().is_empty())
}

/// Byte offsets of the first `{` and the last `}`.
fn json_object_bounds(input: &str) -> Option<(usize, usize)> {
    let start = input.find('{')?;
    let end = input.rfind('}')?;
    (end > start).then_some((start, end))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{ChatChoice, ChatMessage};

    fn loose(pairs: &[(&str, &str)]) -> Extraction {
        let fields = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), StyleValue::from(*value)))
            .collect();
        Extraction::Loose(StyleProfile::new(fields).unwrap())
    }

    fn envelope(contents: &[&str]) -> ChatResponse {
        ChatResponse {
            choices: contents
                .iter()
                .map(|content| ChatChoice {
                    message: ChatMessage {
                        role: "assistant".to_string(),
                        content: content.to_string(),
                    },
                })
                .collect(),
        }
    }

    #[test]
    fn strip_reasoning_removes_block_and_trims() {
        let text = "<think>\nThe user wants JSON.\n</think>\n\n  {\"tone\": \"casual\"}  ";
        assert_eq!(strip_reasoning(text), "{\"tone\": \"casual\"}");
    }

    #[test]
    fn strip_reasoning_removes_every_matched_pair() {
        let text = "<think>a</think>keep<think>b\nc</think> this";
        assert_eq!(strip_reasoning(text), "keep this");
    }

    #[test]
    fn strip_reasoning_leaves_unmatched_markers() {
        assert_eq!(strip_reasoning("<think>never closed"), "<think>never closed");
        assert_eq!(strip_reasoning("stray</think> tail"), "stray</think> tail");
        assert_eq!(
            strip_reasoning("<think>a<think>b</think>c</think>"),
            "c</think>"
        );
    }

    #[test]
    fn structured_json_is_returned_intact() {
        let text = r#"{"tone": "Casual", "hooks": ["questions", "exclamations"], "sentiment": "Positive"}"#;
        let extraction = Extraction::from_text(text);
        assert_eq!(extraction.kind(), "structured");
        let profile = extraction.profile().unwrap();
        assert_eq!(profile.len(), 3);
        assert_eq!(profile.get("tone"), Some(&StyleValue::from("Casual")));
        assert_eq!(
            profile.get("hooks"),
            Some(&StyleValue::List(vec![
                "questions".to_string(),
                "exclamations".to_string()
            ]))
        );
    }

    #[test]
    fn extraction_is_idempotent() {
        let text = "<think>hm</think>{\"tone\": \"dry\", \"structure\": \"list\"}";
        assert_eq!(Extraction::from_text(text), Extraction::from_text(text));
        let loose_text = "Tone: dry\nStructure: list";
        assert_eq!(
            Extraction::from_text(loose_text),
            Extraction::from_text(loose_text)
        );
    }

    #[test]
    fn json_wrapped_in_prose_is_structured() {
        let text = "Here is the analysis:\n```json\n{\"tone\": \"Serious\"}\n```\nHope it helps.";
        let extraction = Extraction::from_text(text);
        assert_eq!(extraction.kind(), "structured");
        assert_eq!(
            extraction.profile().unwrap().get("tone"),
            Some(&StyleValue::from("Serious"))
        );
    }

    #[test]
    fn labelled_lines_with_an_object_value_stay_loose() {
        let text = "Tone: casual\nHooks: {\"q\": \"why?\"}\nSentiment: upbeat";
        let extraction = Extraction::from_text(text);
        assert_eq!(extraction.kind(), "loose");
        let profile = extraction.profile().unwrap();
        assert_eq!(profile.field_or_unknown("tone"), "casual");
        assert_eq!(profile.field_or_unknown("hooks"), "{\"q\": \"why?\"}");
        assert_eq!(profile.field_or_unknown("sentiment"), "upbeat");
        assert_eq!(profile.get("q"), None);
    }

    #[test]
    fn json_object_bounds_need_both_braces_in_order() {
        assert_eq!(json_object_bounds("x {\"a\": 1} y"), Some((2, 9)));
        assert_eq!(json_object_bounds("} nothing {"), None);
        assert_eq!(json_object_bounds("no braces"), None);
    }

    #[test]
    fn fallback_lowercases_keys_and_drops_unlabelled_lines() {
        let extraction = Extraction::from_text("A: 1\nB: two words\nignored line");
        assert_eq!(extraction, loose(&[("a", "1"), ("b", "two words")]));
    }

    #[test]
    fn fallback_splits_on_first_separator_only() {
        let extraction = Extraction::from_text("Structure: intro: hook, body");
        assert_eq!(extraction, loose(&[("structure", "intro: hook, body")]));
    }

    #[test]
    fn json_arrays_fall_back_to_lines() {
        let extraction = Extraction::from_text("[\"tone: casual\"]");
        assert_eq!(extraction.kind(), "loose");
    }

    #[test]
    fn empty_inputs_fail() {
        for text in ["", "   \n\t", "no separators here\nnor here", "<think>only: thoughts</think>"] {
            assert_eq!(
                Extraction::from_text(text),
                Extraction::Failed(ExtractionFailure::Empty),
                "input {text:?}"
            );
        }
    }

    #[test]
    fn empty_json_object_fails() {
        assert_eq!(
            Extraction::from_text("{}"),
            Extraction::Failed(ExtractionFailure::Empty)
        );
    }

    #[test]
    fn zero_choices_fail_immediately() {
        assert_eq!(
            Extraction::from_response(&ChatResponse::default()),
            Extraction::Failed(ExtractionFailure::NoChoices)
        );
    }

    #[test]
    fn from_response_reads_first_choice() {
        let response = envelope(&["Tone: upbeat", "Tone: gloomy"]);
        let profile = Extraction::from_response(&response).into_result().unwrap();
        assert_eq!(profile.field_or_unknown("tone"), "upbeat");
    }
}
