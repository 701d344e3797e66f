// Copyright 2026 Brand Audit Contributors
// SPDX-License-Identifier: Apache-2.0

//! Error taxonomy for the audit pipeline.
//!
//! Request-level errors stop a batch before any network activity. Per-URL
//! errors are recorded on the URL's `AuditResult` and never abort siblings.
//! Capture errors are the most permissive tier: a skipped selector is only
//! logged.

/// All errors the audit core can produce.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AuditError {
    /// Bad input shape. Fatal to the whole batch.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// One URL could not be parsed. It is dropped from the working set.
    #[error("Invalid URL '{input}': {reason}")]
    InvalidUrl { input: String, reason: String },

    /// HTTP or transport failure while fetching one page.
    #[error("Fetch failed{}: {cause}", status_suffix(.status_code))]
    FetchFailed {
        status_code: Option<u16>,
        cause: String,
    },

    /// Extraction yielded no analyzable text.
    #[error("No content: page has no extractable body text")]
    NoContent,

    /// The analysis service failed or returned an invalid shape.
    #[error("Analysis failed: {0}")]
    AnalysisFailed(String),

    /// A single selector could not be captured. Logged only.
    #[error("Capture skipped for '{selector}': {reason}")]
    CaptureSkipped { selector: String, reason: String },

    /// The capture call as a whole failed (browser launch, navigation).
    #[error("Capture failed: {0}")]
    CaptureFailed(String),
}

fn status_suffix(code: &Option<u16>) -> String {
    match code {
        Some(c) => format!(" (HTTP {c})"),
        None => String::new(),
    }
}

impl AuditError {
    /// Stable machine-readable code, used by the REST layer.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidRequest(_) => "E_INVALID_REQUEST",
            Self::InvalidUrl { .. } => "E_INVALID_URL",
            Self::FetchFailed { .. } => "E_FETCH_FAILED",
            Self::NoContent => "E_NO_CONTENT",
            Self::AnalysisFailed(_) => "E_ANALYSIS_FAILED",
            Self::CaptureSkipped { .. } => "E_CAPTURE_SKIPPED",
            Self::CaptureFailed(_) => "E_CAPTURE_FAILED",
        }
    }

    /// Whether this error is fatal to a whole batch.
    pub fn is_batch_fatal(&self) -> bool {
        matches!(self, Self::InvalidRequest(_))
    }
}
