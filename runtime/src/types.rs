// Copyright 2026 Brand Audit Contributors
// SPDX-License-Identifier: Apache-2.0

//! Core data model: requests, reports, per-URL results, and snapshots.
//!
//! Every type serializes with camelCase field names so the JSON produced by
//! the REST layer and the exporters matches the batch submission contract.

use crate::error::AuditError;
use serde::{Deserialize, Serialize};

/// A submitted audit. Immutable once built.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditRequest {
    /// The brand guideline text every page is checked against.
    pub guideline_text: String,
    /// Raw URLs as entered, in submission order.
    pub target_urls: Vec<String>,
    /// Expand the URL set with same-domain links from the first URL.
    #[serde(default)]
    pub auto_discover: bool,
}

impl AuditRequest {
    pub fn new(guideline_text: impl Into<String>, target_urls: Vec<String>) -> Self {
        Self {
            guideline_text: guideline_text.into(),
            target_urls,
            auto_discover: false,
        }
    }

    pub fn with_auto_discover(mut self, enabled: bool) -> Self {
        self.auto_discover = enabled;
        self
    }
}

/// Split a free-form URL list on newlines and commas.
///
/// Blank entries are dropped; everything else is kept verbatim (trimmed) so
/// normalization can report bad inputs individually.
pub fn parse_url_list(raw: &str) -> Vec<String> {
    raw.split(['\n', ','])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// One flagged issue, rewrite suggestion, or recommendation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditItem {
    pub text: String,
    /// Advisory element selector. May fail to resolve at capture time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selector: Option<String>,
}

impl AuditItem {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            selector: None,
        }
    }

    pub fn with_selector(mut self, selector: impl Into<String>) -> Self {
        self.selector = Some(selector.into());
        self
    }
}

/// Validated analysis output for one page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceReport {
    /// Always within 0..=100.
    pub compliance_score: u8,
    pub flagged_issues: Vec<AuditItem>,
    pub suggested_rewrites: Vec<AuditItem>,
    pub recommendations: Vec<AuditItem>,
}

impl ComplianceReport {
    /// Distinct selectors referenced by any item, in first-seen order.
    pub fn selectors(&self) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        self.flagged_issues
            .iter()
            .chain(&self.suggested_rewrites)
            .chain(&self.recommendations)
            .filter_map(|item| item.selector.as_deref())
            .filter(|s| seen.insert(*s))
            .map(String::from)
            .collect()
    }
}

/// A captured image of one element, keyed by the selector it was taken for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Screenshot {
    pub selector: String,
    /// PNG bytes; base64 encoded on the wire.
    #[serde(with = "base64_bytes")]
    pub image_bytes: Vec<u8>,
}

mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(d)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}

/// Lifecycle state of one URL's audit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditStatus {
    Pending,
    Success,
    Error,
}

impl std::fmt::Display for AuditStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Success => write!(f, "success"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Outcome of auditing one URL.
///
/// Created `pending`, then completed exactly once. `report` is present iff
/// the status is `success`; `error_message` is present iff it is `error`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditResult {
    pub url: String,
    pub status: AuditStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report: Option<ComplianceReport>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screenshots: Option<Vec<Screenshot>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl AuditResult {
    /// A URL that has entered the pipeline.
    pub fn pending(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            status: AuditStatus::Pending,
            report: None,
            screenshots: None,
            error_message: None,
        }
    }

    /// Move a pending result to its terminal state.
    ///
    /// A result that is already terminal is returned unchanged.
    pub fn complete(mut self, outcome: Result<ComplianceReport, AuditError>) -> Self {
        if self.status != AuditStatus::Pending {
            tracing::warn!(url = %self.url, "ignoring second completion of audit result");
            return self;
        }
        match outcome {
            Ok(report) => {
                self.status = AuditStatus::Success;
                self.report = Some(report);
            }
            Err(e) => {
                self.status = AuditStatus::Error;
                self.error_message = Some(e.to_string());
            }
        }
        self
    }

    pub fn is_success(&self) -> bool {
        self.status == AuditStatus::Success
    }

    pub fn score(&self) -> Option<u8> {
        self.report.as_ref().map(|r| r.compliance_score)
    }
}

/// Ordered results of one batch: original URLs first, discovered ones after.
pub type AuditBatch = Vec<AuditResult>;
