// Copyright 2026 Brand Audit Contributors
// SPDX-License-Identifier: Apache-2.0

//! Analyzer that speaks the analysis contract directly over HTTP.

use super::{parse_report, AnalysisRequest, Analyzer};
use crate::error::AuditError;
use crate::types::ComplianceReport;
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

/// POSTs `{guidelineText, pageText, url}` and expects the report JSON back.
pub struct ServiceAnalyzer {
    endpoint: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl ServiceAnalyzer {
    pub fn new(endpoint: String, api_key: Option<String>, timeout_ms: u64) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .unwrap_or_default();
        Self {
            endpoint,
            api_key,
            client,
        }
    }
}

#[async_trait]
impl Analyzer for ServiceAnalyzer {
    async fn analyze(
        &self,
        guideline_text: &str,
        page_text: &str,
        url: &str,
    ) -> Result<ComplianceReport, AuditError> {
        let body = AnalysisRequest {
            guideline_text: guideline_text.to_string(),
            page_text: page_text.to_string(),
            url: url.to_string(),
        };

        let mut req = self.client.post(&self.endpoint).json(&body);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }

        let resp = req
            .send()
            .await
            .map_err(|e| AuditError::AnalysisFailed(format!("service unreachable: {e}")))?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| AuditError::AnalysisFailed(format!("failed to read response: {e}")))?;

        if !status.is_success() {
            return Err(AuditError::AnalysisFailed(format!(
                "service returned HTTP {}: {}",
                status.as_u16(),
                snippet(&text)
            )));
        }

        debug!(url, bytes = text.len(), "analysis response received");
        parse_report(&text)
    }

    fn name(&self) -> &str {
        "service"
    }
}

/// First 200 characters of an error body.
pub(crate) fn snippet(text: &str) -> String {
    let trimmed = text.trim();
    match trimmed.char_indices().nth(200) {
        Some((idx, _)) => format!("{}...", &trimmed[..idx]),
        None => trimmed.to_string(),
    }
}
