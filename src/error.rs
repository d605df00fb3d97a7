//! Error handling for the resume matcher application

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ResumeMatcherError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("PDF extraction error: {0}")]
    PdfExtraction(String),

    #[error("Resume looks empty or unreadable: {chars} characters extracted, at least {min} required")]
    UnreadableResume { chars: usize, min: usize },

    #[error("Invalid API credential: {0}")]
    Credential(String),

    #[error("LLM API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Could not parse LLM response: {message}\nResponse: {raw}")]
    Parse { message: String, raw: String },

    #[error("LLM response does not match the expected schema at `{field}`: {reason}")]
    Schema { field: String, reason: String },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("File format not supported: {0}")]
    UnsupportedFormat(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("History error: {0}")]
    History(String),

    #[error("No analysis available in this session, run an analysis first")]
    NoAnalysis,

    #[error("Output formatting error: {0}")]
    OutputFormatting(String),
}

pub type Result<T> = std::result::Result<T, ResumeMatcherError>;

/// Convert anyhow errors to our custom error type
impl From<anyhow::Error> for ResumeMatcherError {
    fn from(err: anyhow::Error) -> Self {
        ResumeMatcherError::InvalidInput(err.to_string())
    }
}

impl ResumeMatcherError {
    pub(crate) fn parse(message: impl Into<String>, raw: &str) -> Self {
        ResumeMatcherError::Parse {
            message: message.into(),
            raw: raw.to_string(),
        }
    }

    pub(crate) fn schema(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ResumeMatcherError::Schema {
            field: field.into(),
            reason: reason.into(),
        }
    }
}
