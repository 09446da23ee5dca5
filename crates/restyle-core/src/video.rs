use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

use crate::VideoIdError;

static LINK_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?:v=|/videos/|embed/|youtu\.be/|/v/|/e/|/shorts/|watch\?v=|&v=|/)([a-zA-Z0-9_-]{11})",
    )
    .expect("video link pattern is valid")
});

static BARE_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_-]{11}$").expect("bare id pattern is valid"));

/// An 11-character YouTube video identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VideoId(String);

impl VideoId {
    /// Extract the id from a watch, embed, short-link or shorts URL, or accept
    /// a bare id.
    pub fn parse(link: &str) -> Result<Self, VideoIdError> {
        let link = link.trim();
        if BARE_ID.is_match(link) {
            return Ok(Self(link.to_string()));
        }
        LINK_PATTERN
            .captures(link)
            .and_then(|captures| captures.get(1))
            .map(|id| Self(id.as_str().to_string()))
            .ok_or_else(|| VideoIdError::NotFound(link.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::VideoId;

    fn id(link: &str) -> Option<String> {
        VideoId::parse(link).ok().map(|id| id.as_str().to_string())
    }

    #[test]
    fn parses_known_link_shapes() {
        let expected = Some("dQw4w9WgXcQ".to_string());
        assert_eq!(id("https://www.youtube.com/watch?v=dQw4w9WgXcQ"), expected);
        assert_eq!(id("https://youtu.be/dQw4w9WgXcQ?feature=shared"), expected);
        assert_eq!(id("https://www.youtube.com/embed/dQw4w9WgXcQ"), expected);
        assert_eq!(id("https://www.youtube.com/shorts/dQw4w9WgXcQ"), expected);
        assert_eq!(id("https://www.youtube.com/v/dQw4w9WgXcQ"), expected);
        assert_eq!(
            id("https://www.youtube.com/watch?list=PL123&v=dQw4w9WgXcQ"),
            expected
        );
    }

    #[test]
    fn accepts_bare_id() {
        assert_eq!(id("  5_EJwYeQusM "), Some("5_EJwYeQusM".to_string()));
    }

    #[test]
    fn rejects_links_without_id() {
        assert!(VideoId::parse("not a link").is_err());
        assert!(VideoId::parse("https://www.youtube.com/watch?v=short").is_err());
        assert!(VideoId::parse("").is_err());
    }
}
