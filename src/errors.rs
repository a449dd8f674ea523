//! Typed error hierarchy for the review pipeline.
//!
//! Three enums cover the three failure surfaces:
//! - `ExtractionError` — a reviewer payload carried no usable feedback
//! - `GenerationError` — the external text-generation call failed
//! - `ReviewerFailure` — one reviewer's slice of a review pass failed
//!
//! All of these are recovered locally: a failed reviewer contributes zero
//! comments and the pass continues with the remaining reviewers.

use thiserror::Error;

/// How many characters of a raw payload to keep in error values.
/// Full payloads go to the log, not into error strings.
const PAYLOAD_PREVIEW_CHARS: usize = 120;

/// Errors from extracting structured feedback out of a raw payload.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("no brace-delimited span found in payload: {preview:?}")]
    NoStructuredSpan { preview: String },

    #[error("payload JSON unparseable after repair pass: {message}")]
    Unparseable { message: String, preview: String },

    #[error("decoded payload has no list-valued `comments` field")]
    MissingCommentsList { preview: String },
}

impl ExtractionError {
    /// Truncate a raw payload for embedding in an error value.
    pub fn preview_of(raw: &str) -> String {
        if raw.chars().count() <= PAYLOAD_PREVIEW_CHARS {
            raw.to_string()
        } else {
            let cut: String = raw.chars().take(PAYLOAD_PREVIEW_CHARS).collect();
            format!("{cut}…")
        }
    }

    /// The truncated payload this error was raised for.
    pub fn preview(&self) -> &str {
        match self {
            Self::NoStructuredSpan { preview }
            | Self::Unparseable { preview, .. }
            | Self::MissingCommentsList { preview } => preview,
        }
    }
}

/// Errors from the external text-generation call.
///
/// The core never retries these; retry policy belongs to the caller that
/// owns the network relay.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("generation request rejected{}: {message}", fmt_status(.status))]
    Rejected { message: String, status: Option<u16> },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl GenerationError {
    /// Create a rejection without a transport status code.
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected {
            message: message.into(),
            status: None,
        }
    }

    /// Create a rejection carrying a transport status code.
    pub fn rejected_with_status(message: impl Into<String>, status: u16) -> Self {
        Self::Rejected {
            message: message.into(),
            status: Some(status),
        }
    }

    /// The transport status code, when the backend supplied one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Rejected { status, .. } => *status,
            Self::Other(_) => None,
        }
    }
}

fn fmt_status(status: &Option<u16>) -> String {
    match status {
        Some(code) => format!(" (status {code})"),
        None => String::new(),
    }
}

/// A single reviewer's failure within a review pass.
///
/// Wraps the two recoverable failure kinds so the dispatcher can report
/// them uniformly without aborting the remaining reviewers.
#[derive(Debug, Error)]
pub enum ReviewerFailure {
    #[error("generation failed: {0}")]
    Generation(#[from] GenerationError),

    #[error("extraction failed: {0}")]
    Extraction(#[from] ExtractionError),
}
