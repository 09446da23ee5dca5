use std::sync::Arc;

use crate::analyze::analyze_style;
use crate::extract::Extraction;
use crate::generate::generate_script;
use crate::provider::ChatProvider;
use crate::transcript::{DEFAULT_TRANSCRIPT_LIMIT, Transcript, TranscriptSource};
use crate::types::StyleProfile;
use crate::video::VideoId;
use crate::{AnalyzeError, GenerateError};

pub const DEFAULT_MODEL: &str = "deepseek-r1-distill-llama-70b";

/// Sampling parameters for one kind of completion call.
#[derive(Debug, Clone, PartialEq)]
pub struct SamplingParams {
    pub temperature: f32,
    pub top_p: f32,
    pub max_tokens: u32,
}

impl SamplingParams {
    pub fn analysis() -> Self {
        Self {
            temperature: 0.7,
            top_p: 1.0,
            max_tokens: 500,
        }
    }

    pub fn generation() -> Self {
        Self {
            temperature: 0.7,
            top_p: 1.0,
            max_tokens: 1000,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StudioSettings {
    pub model: String,
    pub analysis: SamplingParams,
    pub generation: SamplingParams,
    pub transcript_limit: usize,
}

impl Default for StudioSettings {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            analysis: SamplingParams::analysis(),
            generation: SamplingParams::generation(),
            transcript_limit: DEFAULT_TRANSCRIPT_LIMIT,
        }
    }
}

/// The analyze and generate pipelines over a chat provider and a caption
/// source.
pub struct Studio {
    provider: Arc<dyn ChatProvider>,
    transcripts: Arc<dyn TranscriptSource>,
    settings: StudioSettings,
}

impl Studio {
    pub fn new(
        provider: Arc<dyn ChatProvider>,
        transcripts: Arc<dyn TranscriptSource>,
        settings: StudioSettings,
    ) -> Self {
        Self {
            provider,
            transcripts,
            settings,
        }
    }

    pub fn settings(&self) -> &StudioSettings {
        &self.settings
    }

    /// Learn a style profile from the video behind `video_link`.
    ///
    /// Stages run in order and stop at the first failure: link parsing,
    /// caption fetch, style analysis, extraction. The link is validated before
    /// any network call.
    pub fn analyze(&self, video_link: &str) -> Result<StyleProfile, AnalyzeError> {
        let video_id = VideoId::parse(video_link)?;

        let lines = self.transcripts.fetch(&video_id).inspect_err(|err| {
            tracing::warn!(
                source = self.transcripts.name(),
                video_id = %video_id,
                error = %err,
                "transcript fetch failed"
            );
        })?;
        let transcript = Transcript::from_lines(lines, self.settings.transcript_limit)?;

        let response = analyze_style(
            self.provider.as_ref(),
            &self.settings.model,
            &self.settings.analysis,
            &transcript,
        )
        .inspect_err(|err| {
            tracing::error!(provider = self.provider.name(), error = %err, "style analysis failed");
        })?;

        let extraction = Extraction::from_response(&response);
        tracing::debug!(video_id = %video_id, kind = extraction.kind(), "style extraction");
        let profile = extraction.into_result().inspect_err(|failure| {
            tracing::error!(video_id = %video_id, error = %failure, "style extraction failed");
        })?;
        tracing::info!(video_id = %video_id, fields = profile.len(), "style profile ready");
        Ok(profile)
    }

    /// Write a script on `topic` in the style of `profile`.
    pub fn generate(&self, profile: &StyleProfile, topic: &str) -> Result<String, GenerateError> {
        generate_script(
            self.provider.as_ref(),
            &self.settings.model,
            &self.settings.generation,
            profile,
            topic.trim(),
        )
        .inspect_err(|err| {
            tracing::error!(provider = self.provider.name(), error = %err, "script generation failed");
        })
    }
}
