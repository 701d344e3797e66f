// Copyright 2026 Brand Audit Contributors
// SPDX-License-Identifier: Apache-2.0

//! Boundary to the external text-analysis service.
//!
//! The service is opaque: guideline text, page text, and URL go in; a
//! structured report comes out. Every back-end funnels its response through
//! [`validate_report`] so the core only ever sees well-formed reports.

pub mod chat;
pub mod prompt;
pub mod service;

use crate::config::{AnalyzerKind, AuditConfig};
use crate::error::AuditError;
use crate::types::{AuditItem, ComplianceReport};
use anyhow::{bail, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Request body of the analysis contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRequest {
    pub guideline_text: String,
    pub page_text: String,
    pub url: String,
}

/// Unvalidated response as received from a service.
///
/// Every field is optional here so a missing array can be reported as an
/// analysis failure rather than a deserialization panic upstream.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawReport {
    pub compliance_score: Option<serde_json::Number>,
    pub flagged_issues: Option<Vec<RawItem>>,
    pub suggested_rewrites: Option<Vec<RawItem>>,
    pub recommendations: Option<Vec<RawItem>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawItem {
    /// Bare string item without a selector.
    Text(String),
    Object {
        text: String,
        #[serde(default)]
        selector: Option<String>,
    },
}

/// A text-analysis back-end.
#[async_trait]
pub trait Analyzer: Send + Sync {
    /// Analyze one page. No retries happen here.
    async fn analyze(
        &self,
        guideline_text: &str,
        page_text: &str,
        url: &str,
    ) -> Result<ComplianceReport, AuditError>;

    /// Short name for logs.
    fn name(&self) -> &str;
}

/// Validate and normalize a raw service response.
pub fn validate_report(raw: RawReport) -> Result<ComplianceReport, AuditError> {
    let score = raw
        .compliance_score
        .ok_or_else(|| failed("response has no complianceScore"))?;
    let score = score
        .as_i64()
        .or_else(|| {
            score
                .as_f64()
                .filter(|f| f.fract() == 0.0)
                .map(|f| f as i64)
        })
        .ok_or_else(|| failed(format!("complianceScore {score} is not an integer")))?;
    if !(0..=100).contains(&score) {
        return Err(failed(format!("complianceScore {score} is outside 0..=100")));
    }

    let flagged_issues = require_items(raw.flagged_issues, "flaggedIssues")?;
    let suggested_rewrites = require_items(raw.suggested_rewrites, "suggestedRewrites")?;
    let recommendations = require_items(raw.recommendations, "recommendations")?;

    Ok(ComplianceReport {
        compliance_score: score as u8,
        flagged_issues,
        suggested_rewrites,
        recommendations,
    })
}

/// Parse a JSON body and validate it.
pub fn parse_report(body: &str) -> Result<ComplianceReport, AuditError> {
    let raw: RawReport = serde_json::from_str(body)
        .map_err(|e| failed(format!("malformed analysis response: {e}")))?;
    validate_report(raw)
}

fn require_items(items: Option<Vec<RawItem>>, field: &str) -> Result<Vec<AuditItem>, AuditError> {
    let items = items.ok_or_else(|| failed(format!("response has no {field}")))?;
    Ok(items.into_iter().map(normalize_item).collect())
}

fn normalize_item(raw: RawItem) -> AuditItem {
    match raw {
        RawItem::Text(text) => AuditItem {
            text,
            selector: None,
        },
        RawItem::Object { text, selector } => AuditItem {
            text,
            // Selectors are opaque; only blank ones are discarded.
            selector: selector
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
        },
    }
}

fn failed(msg: impl Into<String>) -> AuditError {
    AuditError::AnalysisFailed(msg.into())
}

/// Build the configured analyzer.
pub fn from_config(config: &AuditConfig) -> Result<Arc<dyn Analyzer>> {
    match config.analyzer {
        AnalyzerKind::Service => {
            let Some(url) = config.analyzer_url.clone() else {
                bail!("BRAND_AUDIT_ANALYZER_URL must be set for the service analyzer");
            };
            Ok(Arc::new(service::ServiceAnalyzer::new(
                url,
                config.analyzer_api_key.clone(),
                config.analysis_timeout_ms,
            )))
        }
        AnalyzerKind::Chat => {
            let Some(key) = config.analyzer_api_key.clone() else {
                bail!("BRAND_AUDIT_ANALYZER_API_KEY must be set for the chat analyzer");
            };
            let analyzer = match config.analyzer_url.clone() {
                Some(url) => chat::ChatAnalyzer::with_url(key, url),
                None => chat::ChatAnalyzer::new(key),
            };
            Ok(Arc::new(
                analyzer
                    .with_model(&config.analyzer_model)
                    .with_timeout_ms(config.analysis_timeout_ms),
            ))
        }
    }
}
