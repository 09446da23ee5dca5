use crate::{TranscriptError, VideoId};

/// Default number of characters of caption text sent to the model.
pub const DEFAULT_TRANSCRIPT_LIMIT: usize = 5000;

/// Caption provider abstraction.
pub trait TranscriptSource: Send + Sync {
    fn name(&self) -> &'static str;

    /// Caption lines for the video, in playback order.
    fn fetch(&self, video_id: &VideoId) -> Result<Vec<String>, TranscriptError>;
}

/// Caption text joined into a single prompt-ready string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transcript {
    text: String,
}

impl Transcript {
    /// Join caption lines with single spaces and keep at most `limit`
    /// characters.
    pub fn from_lines<I, S>(lines: I, limit: usize) -> Result<Self, TranscriptError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let joined = lines
            .into_iter()
            .filter_map(|line| {
                let line = line.as_ref().trim();
                (!line.is_empty()).then(|| line.to_string())
            })
            .collect::<Vec<_>>()
            .join(" ");
        let text = truncate_chars(&joined, limit).to_string();
        if text.trim().is_empty() {
            return Err(TranscriptError::Empty);
        }
        Ok(Self { text })
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// Longest prefix of `text` holding at most `limit` characters.
pub fn truncate_chars(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_lines_with_single_spaces() {
        let transcript =
            Transcript::from_lines(["hello there", "  ", " general kenobi "], 5000).unwrap();
        assert_eq!(transcript.as_str(), "hello there general kenobi");
    }

    #[test]
    fn truncates_to_exact_limit() {
        let lines = vec!["abcdefghij"; 600];
        let transcript = Transcript::from_lines(&lines, DEFAULT_TRANSCRIPT_LIMIT).unwrap();
        assert_eq!(transcript.char_len(), DEFAULT_TRANSCRIPT_LIMIT);
        assert!(transcript.as_str().starts_with("abcdefghij abcdefghij"));
    }

    #[test]
    fn short_transcript_is_untouched() {
        let transcript = Transcript::from_lines(["short"], DEFAULT_TRANSCRIPT_LIMIT).unwrap();
        assert_eq!(transcript.as_str(), "short");
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo wörld", 4), "héll");
        assert_eq!(truncate_chars("日本語のテキスト", 3), "日本語");
        assert_eq!(truncate_chars("abc", 10), "abc");
    }

    #[test]
    fn empty_captions_are_an_error() {
        let err = Transcript::from_lines(Vec::<String>::new(), 5000).unwrap_err();
        assert!(matches!(err, TranscriptError::Empty));
        assert!(Transcript::from_lines([" ", ""], 5000).is_err());
    }
}
