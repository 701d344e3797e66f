// Copyright 2026 Brand Audit Contributors
// SPDX-License-Identifier: Apache-2.0

//! Audit orchestration: one request in, one ordered batch out.
//!
//! Validate, normalize, optionally expand the URL set from the first page,
//! then run fetch -> extract -> analyze per URL. Per-URL failures become
//! `error` results; only request validation can fail the batch.

use crate::acquisition::http_client::HttpClient;
use crate::acquisition::links;
use crate::acquisition::text::extract_text_with_limit;
use crate::acquisition::url_norm::{discovery_key, normalize};
use crate::analysis::Analyzer;
use crate::config::AuditConfig;
use crate::error::AuditError;
use crate::progress::{Narrator, PipelineStep, ProgressEventKind, ProgressSender};
use crate::renderer::BrowserLauncher;
use crate::snapshot::{capture_elements, CaptureOptions};
use crate::types::{AuditBatch, AuditRequest, AuditResult, ComplianceReport};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// A finished batch plus its narrative log.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditRun {
    pub request_id: String,
    pub results: AuditBatch,
    pub logs: Vec<String>,
}

impl AuditRun {
    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.results.len() - self.succeeded()
    }
}

/// Drives the audit pipeline.
#[derive(Clone)]
pub struct Orchestrator {
    client: HttpClient,
    analyzer: Arc<dyn Analyzer>,
    max_text_chars: usize,
    concurrency: usize,
    capture: CaptureOptions,
    progress: Option<ProgressSender>,
}

impl Orchestrator {
    pub fn new(config: &AuditConfig, analyzer: Arc<dyn Analyzer>) -> Self {
        Self {
            client: HttpClient::new(config.fetch_timeout_ms),
            analyzer,
            max_text_chars: config.max_text_chars,
            concurrency: config.effective_concurrency(),
            capture: CaptureOptions {
                timeout_ms: config.capture_timeout_ms,
                network_idle_ms: config.network_idle_ms,
            },
            progress: None,
        }
    }

    /// Broadcast progress events to `tx` while batches run.
    pub fn with_progress(mut self, tx: ProgressSender) -> Self {
        self.progress = Some(tx);
        self
    }

    pub fn capture_options(&self) -> CaptureOptions {
        self.capture
    }

    /// Run a full batch.
    pub async fn run(&self, request: &AuditRequest) -> Result<AuditRun, AuditError> {
        self.run_with_id(request, &new_request_id()).await
    }

    /// Run a full batch under a caller-chosen request id.
    pub async fn run_with_id(
        &self,
        request: &AuditRequest,
        request_id: &str,
    ) -> Result<AuditRun, AuditError> {
        let started = Instant::now();
        let narrator = Narrator::new(request_id, self.progress.clone());
        let mut logs = Vec::new();

        let guideline = validate_guideline(&request.guideline_text)?;
        if request.target_urls.iter().all(|u| u.trim().is_empty()) {
            return Err(AuditError::InvalidRequest("no URLs submitted".into()));
        }

        // Normalize, dropping unparseable inputs and literal duplicates.
        let mut working: Vec<String> = Vec::new();
        let mut identities = HashSet::new();
        let mut rejected = Vec::new();
        for raw in &request.target_urls {
            match normalize(raw) {
                Ok(url) => {
                    if identities.insert(url.clone()) {
                        working.push(url);
                    }
                }
                Err(AuditError::InvalidUrl { input, reason }) => rejected.push((input, reason)),
                Err(other) => rejected.push((raw.clone(), other.to_string())),
            }
        }
        if working.is_empty() {
            return Err(AuditError::InvalidRequest(format!(
                "none of the {} submitted URL(s) could be parsed",
                request.target_urls.len()
            )));
        }

        info!(request_id, urls = working.len(), rejected = rejected.len(), "audit batch started");
        narrator.emit(
            &mut logs,
            ProgressEventKind::BatchStarted {
                url_count: working.len(),
                dropped: rejected.len(),
            },
        );
        for (input, reason) in rejected {
            narrator.emit(&mut logs, ProgressEventKind::UrlRejected { input, reason });
        }

        if request.auto_discover {
            self.expand_frontier(&mut working, &narrator, &mut logs).await;
        }

        // Each pipeline future owns its handles so the batch stays Send.
        let concurrency = self.concurrency.max(1);
        let guideline: Arc<str> = Arc::from(guideline);
        let outcomes: Vec<(AuditResult, Vec<String>)> = stream::iter(working)
            .map(|url| {
                let this = self.clone();
                let guideline = Arc::clone(&guideline);
                let narrator = narrator.clone();
                async move { this.pipeline(&guideline, url, &narrator).await }
            })
            .buffered(concurrency)
            .collect()
            .await;

        let mut results = Vec::with_capacity(outcomes.len());
        for (result, lines) in outcomes {
            logs.extend(lines);
            results.push(result);
        }

        let succeeded = results.iter().filter(|r| r.is_success()).count();
        let failed = results.len() - succeeded;
        let elapsed_ms = started.elapsed().as_millis() as u64;
        info!(request_id, succeeded, failed, elapsed_ms, "audit batch finished");
        narrator.emit(
            &mut logs,
            ProgressEventKind::BatchComplete {
                succeeded,
                failed,
                elapsed_ms,
            },
        );

        Ok(AuditRun {
            request_id: request_id.to_string(),
            results,
            logs,
        })
    }

    /// Audit a single URL. Every failure is reported on the result.
    pub async fn audit_url(&self, guideline_text: &str, raw_url: &str) -> AuditResult {
        let guideline = match validate_guideline(guideline_text) {
            Ok(g) => g,
            Err(e) => return AuditResult::pending(raw_url.trim()).complete(Err(e)),
        };
        let url = match normalize(raw_url) {
            Ok(u) => u,
            Err(e) => return AuditResult::pending(raw_url.trim()).complete(Err(e)),
        };
        let narrator = Narrator::new(new_request_id(), self.progress.clone());
        let (result, _) = self.pipeline(guideline, url, &narrator).await;
        result
    }

    /// Same-domain links of one page. Fetch failures are returned.
    pub async fn discover(&self, raw_url: &str) -> Result<Vec<String>, AuditError> {
        let url = normalize(raw_url)?;
        links::discover_links(&self.client, &url).await
    }

    /// Capture snapshots for every selector referenced by a successful
    /// result. Capture failures leave `screenshots` unset.
    pub async fn attach_screenshots(&self, launcher: &dyn BrowserLauncher, result: &mut AuditResult) {
        let Some(report) = result.report.as_ref() else {
            return;
        };
        let selectors = report.selectors();
        if selectors.is_empty() {
            result.screenshots = Some(Vec::new());
            return;
        }
        match capture_elements(launcher, &result.url, &selectors, self.capture).await {
            Ok(shots) => result.screenshots = Some(shots),
            Err(e) => warn!(url = %result.url, "screenshots unavailable: {e}"),
        }
    }

    /// Append links discovered from the first URL, deduplicated on their
    /// query- and fragment-free form.
    async fn expand_frontier(&self, working: &mut Vec<String>, narrator: &Narrator, logs: &mut Vec<String>) {
        let start_url = working[0].clone();
        let found = match links::discover_links(&self.client, &start_url).await {
            Ok(found) => found,
            Err(e) => {
                warn!(start_url, "link discovery failed: {e}");
                narrator.emit(
                    logs,
                    ProgressEventKind::Warning {
                        message: format!("link discovery from {start_url} failed: {e}"),
                    },
                );
                Vec::new()
            }
        };

        let mut keys: HashSet<String> = working
            .iter()
            .filter_map(|u| discovery_key(u).ok())
            .collect();
        let before = working.len();
        for link in found {
            if keys.insert(link.clone()) {
                working.push(link);
            }
        }

        let added = working.len() - before;
        debug!(start_url, added, "frontier expanded");
        narrator.emit(logs, ProgressEventKind::DiscoveryCompleted { start_url, added });
    }

    /// fetch -> extract -> analyze for one URL, with its log lines.
    async fn pipeline(&self, guideline: &str, url: String, narrator: &Narrator) -> (AuditResult, Vec<String>) {
        let mut log = Vec::new();
        let pending = AuditResult::pending(url.clone());
        let outcome = self.run_steps(guideline, &url, narrator, &mut log).await;

        match &outcome {
            Ok(report) => {
                info!(url, score = report.compliance_score, "audit succeeded");
                narrator.emit(
                    &mut log,
                    ProgressEventKind::UrlSucceeded {
                        url: url.clone(),
                        score: report.compliance_score,
                    },
                );
            }
            Err(e) => {
                warn!(url, "audit failed: {e}");
                narrator.emit(
                    &mut log,
                    ProgressEventKind::UrlFailed {
                        url: url.clone(),
                        message: e.to_string(),
                    },
                );
            }
        }

        (pending.complete(outcome), log)
    }

    async fn run_steps(
        &self,
        guideline: &str,
        url: &str,
        narrator: &Narrator,
        log: &mut Vec<String>,
    ) -> Result<ComplianceReport, AuditError> {
        let markup = self.client.fetch_markup(url).await?;
        narrator.emit(
            log,
            step(url, PipelineStep::Fetch, format!("fetched {} bytes", markup.len())),
        );

        let text = extract_text_with_limit(&markup, self.max_text_chars);
        drop(markup);
        if text.is_empty() {
            return Err(AuditError::NoContent);
        }
        narrator.emit(
            log,
            step(
                url,
                PipelineStep::Extract,
                format!("extracted {} characters", text.chars().count()),
            ),
        );

        let report = self.analyzer.analyze(guideline, &text, url).await?;
        narrator.emit(
            log,
            step(
                url,
                PipelineStep::Analyze,
                format!(
                    "{} analysis returned {} issue(s), {} rewrite(s), {} recommendation(s)",
                    self.analyzer.name(),
                    report.flagged_issues.len(),
                    report.suggested_rewrites.len(),
                    report.recommendations.len()
                ),
            ),
        );
        Ok(report)
    }
}

fn step(url: &str, step: PipelineStep, detail: String) -> ProgressEventKind {
    ProgressEventKind::Step {
        url: url.to_string(),
        step,
        detail,
    }
}

fn validate_guideline(text: &str) -> Result<&str, AuditError> {
    if text.trim().is_empty() {
        return Err(AuditError::InvalidRequest("guideline text is empty".into()));
    }
    Ok(text)
}

fn new_request_id() -> String {
    format!("audit-{}", uuid::Uuid::new_v4().simple())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct Unreachable;

    #[async_trait]
    impl Analyzer for Unreachable {
        async fn analyze(&self, _: &str, _: &str, _: &str) -> Result<ComplianceReport, AuditError> {
            panic!("analysis must not run for rejected requests");
        }
        fn name(&self) -> &str {
            "unreachable"
        }
    }

    fn orchestrator() -> Orchestrator {
        Orchestrator::new(&AuditConfig::default(), Arc::new(Unreachable))
    }

    #[tokio::test]
    async fn test_empty_guideline_rejected_before_io() {
        let req = AuditRequest::new("   ", vec!["https://127.0.0.1:9/".into()]);
        let err = orchestrator().run(&req).await.unwrap_err();
        assert!(matches!(err, AuditError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn test_no_urls_rejected() {
        let req = AuditRequest::new("Be kind", vec![]);
        assert!(matches!(
            orchestrator().run(&req).await,
            Err(AuditError::InvalidRequest(_))
        ));
    }

    #[tokio::test]
    async fn test_all_unparseable_urls_rejected() {
        let req = AuditRequest::new("Be kind", vec!["http://".into(), "ftp://x.org".into()]);
        let err = orchestrator().run(&req).await.unwrap_err();
        assert!(err.to_string().contains("could be parsed"));
    }

    #[tokio::test]
    async fn test_single_url_reports_invalid_url_on_result() {
        let result = orchestrator().audit_url("Be kind", "http://").await;
        assert_eq!(result.status, crate::types::AuditStatus::Error);
        assert!(result.error_message.unwrap().contains("Invalid URL"));
    }

    #[tokio::test]
    async fn test_single_url_reports_empty_guideline_on_result() {
        let result = orchestrator().audit_url("", "example.com").await;
        assert!(result.error_message.unwrap().contains("guideline"));
    }

    #[test]
    fn test_request_ids_unique() {
        assert_ne!(new_request_id(), new_request_id());
    }
}
