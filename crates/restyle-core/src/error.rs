use thiserror::Error;

/// The user-supplied link does not contain a recognizable video id.
#[derive(Debug, Error)]
pub enum VideoIdError {
    #[error("no video id found in link: {0}")]
    NotFound(String),
}

/// Errors from transcript sources.
#[derive(Debug, Error)]
pub enum TranscriptError {
    #[error("transcript unavailable: {0}")]
    Unavailable(String),

    #[error("transcript has no caption text")]
    Empty,
}

/// Errors from chat completion providers.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("provider configuration error: {0}")]
    Config(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("provider returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// Why no style profile could be recovered from a model response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ExtractionFailure {
    #[error("model response contained no choices")]
    NoChoices,

    #[error("model response contained no interpretable fields")]
    Empty,
}

/// Errors from the analyze pipeline, one variant per stage.
#[derive(Debug, Error)]
pub enum AnalyzeError {
    #[error(transparent)]
    InvalidLink(#[from] VideoIdError),

    #[error(transparent)]
    Transcript(#[from] TranscriptError),

    #[error("style analysis failed: {0}")]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Extraction(#[from] ExtractionFailure),
}

/// Errors from script generation.
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("no style profile for this session")]
    AnalysisMissing,

    #[error("script generation failed: {0}")]
    Provider(#[from] ProviderError),

    #[error("model returned an empty script")]
    EmptyScript,
}
