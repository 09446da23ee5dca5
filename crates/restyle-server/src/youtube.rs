use restyle_core::TranscriptError;
use restyle_core::VideoId;
use restyle_core::transcript::TranscriptSource;
use tokio::runtime::Handle;
use yt_transcript_rs::api::YouTubeTranscriptApi;

/// Caption source backed by YouTube's public transcript endpoints.
///
/// `fetch` blocks the calling thread on the runtime behind `handle`, so it
/// must run on a blocking thread (`spawn_blocking`), never on a worker.
pub struct YoutubeTranscripts {
    api: YouTubeTranscriptApi,
    handle: Handle,
    languages: Vec<String>,
}

impl YoutubeTranscripts {
    pub fn new(handle: Handle, languages: Vec<String>) -> Result<Self, TranscriptError> {
        let api = YouTubeTranscriptApi::new(None, None, None)
            .map_err(|err| TranscriptError::Unavailable(err.to_string()))?;
        Ok(Self {
            api,
            handle,
            languages,
        })
    }

    async fn fetch_lines(&self, video_id: &str) -> Result<Vec<String>, TranscriptError> {
        let languages: Vec<&str> = self.languages.iter().map(String::as_str).collect();
        let transcript = self
            .api
            .fetch_transcript(video_id, &languages, false)
            .await
            .map_err(|err| TranscriptError::Unavailable(err.to_string()))?;
        tracing::debug!(
            video_id,
            language = %transcript.language_code,
            generated = transcript.is_generated,
            snippets = transcript.snippets.len(),
            "captions fetched"
        );
        Ok(transcript
            .snippets
            .into_iter()
            .map(|snippet| snippet.text)
            .collect())
    }
}

impl TranscriptSource for YoutubeTranscripts {
    fn name(&self) -> &'static str {
        "youtube"
    }

    fn fetch(&self, video_id: &VideoId) -> Result<Vec<String>, TranscriptError> {
        self.handle.block_on(self.fetch_lines(video_id.as_str()))
    }
}
