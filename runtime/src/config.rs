// Copyright 2026 Brand Audit Contributors
// SPDX-License-Identifier: Apache-2.0

//! Runtime configuration.
//!
//! Resolution order: built-in defaults, then `BRAND_AUDIT_*` environment
//! variables, then CLI flags (applied by the caller on top of [`AuditConfig::from_env`]).

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::warn;

/// Maximum characters of extracted text handed to the analysis service.
pub const DEFAULT_MAX_TEXT_CHARS: usize = 15_000;

/// Upper bound on concurrent per-URL pipelines.
pub const MAX_CONCURRENCY: usize = 8;

/// Which analysis back-end to call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AnalyzerKind {
    /// Plain JSON endpoint implementing the analysis contract directly.
    #[default]
    Service,
    /// OpenAI-compatible chat-completions endpoint.
    Chat,
}

impl std::str::FromStr for AnalyzerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "service" => Ok(Self::Service),
            "chat" => Ok(Self::Chat),
            other => Err(format!("unknown analyzer '{other}' (expected service or chat)")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    pub fetch_timeout_ms: u64,
    pub analysis_timeout_ms: u64,
    pub capture_timeout_ms: u64,
    /// Quiet period with no new network resources before capture starts.
    pub network_idle_ms: u64,
    pub max_text_chars: usize,
    /// Per-URL pipelines in flight. 1 is strictly sequential.
    pub concurrency: usize,
    pub analyzer: AnalyzerKind,
    pub analyzer_url: Option<String>,
    pub analyzer_api_key: Option<String>,
    pub analyzer_model: String,
    pub chromium_path: Option<PathBuf>,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            fetch_timeout_ms: 30_000,
            analysis_timeout_ms: 120_000,
            capture_timeout_ms: 30_000,
            network_idle_ms: 500,
            max_text_chars: DEFAULT_MAX_TEXT_CHARS,
            concurrency: 1,
            analyzer: AnalyzerKind::Service,
            analyzer_url: None,
            analyzer_api_key: None,
            analyzer_model: "gpt-4o-mini".to_string(),
            chromium_path: None,
        }
    }
}

impl AuditConfig {
    /// Defaults overlaid with the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overlaid with values from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut cfg = Self::default();

        read_num(&lookup, "BRAND_AUDIT_FETCH_TIMEOUT_MS", &mut cfg.fetch_timeout_ms);
        read_num(
            &lookup,
            "BRAND_AUDIT_ANALYSIS_TIMEOUT_MS",
            &mut cfg.analysis_timeout_ms,
        );
        read_num(
            &lookup,
            "BRAND_AUDIT_CAPTURE_TIMEOUT_MS",
            &mut cfg.capture_timeout_ms,
        );
        read_num(&lookup, "BRAND_AUDIT_NETWORK_IDLE_MS", &mut cfg.network_idle_ms);
        read_num(&lookup, "BRAND_AUDIT_MAX_TEXT_CHARS", &mut cfg.max_text_chars);
        read_num(&lookup, "BRAND_AUDIT_CONCURRENCY", &mut cfg.concurrency);

        if let Some(v) = lookup("BRAND_AUDIT_ANALYZER") {
            match v.parse() {
                Ok(kind) => cfg.analyzer = kind,
                Err(e) => warn!("ignoring BRAND_AUDIT_ANALYZER: {e}"),
            }
        }
        if let Some(v) = non_empty(lookup("BRAND_AUDIT_ANALYZER_URL")) {
            cfg.analyzer_url = Some(v);
        }
        if let Some(v) = non_empty(lookup("BRAND_AUDIT_ANALYZER_API_KEY")) {
            cfg.analyzer_api_key = Some(v);
        }
        if let Some(v) = non_empty(lookup("BRAND_AUDIT_ANALYZER_MODEL")) {
            cfg.analyzer_model = v;
        }
        if let Some(v) = non_empty(lookup("BRAND_AUDIT_CHROMIUM_PATH")) {
            cfg.chromium_path = Some(PathBuf::from(v));
        }

        cfg.concurrency = cfg.effective_concurrency();
        cfg
    }

    /// Concurrency clamped to `1..=MAX_CONCURRENCY`.
    pub fn effective_concurrency(&self) -> usize {
        self.concurrency.clamp(1, MAX_CONCURRENCY)
    }
}

fn non_empty(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

fn read_num<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    slot: &mut T,
) {
    if let Some(raw) = lookup(key) {
        match raw.trim().parse::<T>() {
            Ok(v) => *slot = v,
            Err(_) => warn!("ignoring {key}={raw:?}: not a number"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn test_defaults() {
        let cfg = AuditConfig::default();
        assert_eq!(cfg.max_text_chars, 15_000);
        assert_eq!(cfg.concurrency, 1);
        assert_eq!(cfg.analyzer, AnalyzerKind::Service);
    }

    #[test]
    fn test_env_overrides() {
        let cfg = AuditConfig::from_lookup(lookup_from(&[
            ("BRAND_AUDIT_FETCH_TIMEOUT_MS", "5000"),
            ("BRAND_AUDIT_ANALYZER", "chat"),
            ("BRAND_AUDIT_ANALYZER_URL", "http://localhost:9000/v1/chat/completions"),
            ("BRAND_AUDIT_ANALYZER_MODEL", "local-model"),
        ]));
        assert_eq!(cfg.fetch_timeout_ms, 5000);
        assert_eq!(cfg.analyzer, AnalyzerKind::Chat);
        assert_eq!(cfg.analyzer_model, "local-model");
        assert!(cfg.analyzer_url.is_some());
    }

    #[test]
    fn test_bad_numbers_are_ignored() {
        let cfg = AuditConfig::from_lookup(lookup_from(&[(
            "BRAND_AUDIT_FETCH_TIMEOUT_MS",
            "soon",
        )]));
        assert_eq!(cfg.fetch_timeout_ms, 30_000);
    }

    #[test]
    fn test_concurrency_is_clamped() {
        let cfg = AuditConfig::from_lookup(lookup_from(&[("BRAND_AUDIT_CONCURRENCY", "64")]));
        assert_eq!(cfg.concurrency, MAX_CONCURRENCY);
        let cfg = AuditConfig::from_lookup(lookup_from(&[("BRAND_AUDIT_CONCURRENCY", "0")]));
        assert_eq!(cfg.concurrency, 1);
    }

    #[test]
    fn test_blank_values_are_unset() {
        let cfg = AuditConfig::from_lookup(lookup_from(&[("BRAND_AUDIT_ANALYZER_API_KEY", "  ")]));
        assert!(cfg.analyzer_api_key.is_none());
    }
}
