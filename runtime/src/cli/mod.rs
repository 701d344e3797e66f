// Copyright 2026 Brand Audit Contributors
// SPDX-License-Identifier: Apache-2.0

//! CLI subcommand implementations for the `brand-audit` binary.

pub mod audit_cmd;
pub mod capture_cmd;
pub mod discover_cmd;
pub mod doctor;
pub mod output;
pub mod serve_cmd;

use crate::config::{AnalyzerKind, AuditConfig};
use clap::Args;
use std::path::PathBuf;

/// Configuration overrides accepted by commands that talk to the network.
///
/// Anything left unset falls back to `BRAND_AUDIT_*` and then the defaults.
#[derive(Debug, Clone, Default, Args)]
pub struct ConfigArgs {
    /// Analysis back-end (service or chat)
    #[arg(long)]
    pub analyzer: Option<AnalyzerKind>,
    /// Analysis endpoint URL
    #[arg(long)]
    pub analyzer_url: Option<String>,
    /// Model name for the chat analyzer
    #[arg(long)]
    pub model: Option<String>,
    /// Path to a Chromium or Chrome binary
    #[arg(long)]
    pub chromium: Option<PathBuf>,
    /// Page fetch timeout in milliseconds
    #[arg(long)]
    pub fetch_timeout: Option<u64>,
}

impl ConfigArgs {
    /// Environment configuration with these flags layered on top.
    pub fn resolve(&self) -> AuditConfig {
        let mut config = AuditConfig::from_env();
        self.apply(&mut config);
        config
    }

    pub fn apply(&self, config: &mut AuditConfig) {
        if let Some(kind) = self.analyzer {
            config.analyzer = kind;
        }
        if let Some(ref url) = self.analyzer_url {
            config.analyzer_url = Some(url.clone());
        }
        if let Some(ref model) = self.model {
            config.analyzer_model = model.clone();
        }
        if let Some(ref path) = self.chromium {
            config.chromium_path = Some(path.clone());
        }
        if let Some(ms) = self.fetch_timeout {
            config.fetch_timeout_ms = ms;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_config() {
        let mut config = AuditConfig::default();
        let args = ConfigArgs {
            analyzer: Some(AnalyzerKind::Chat),
            model: Some("small".into()),
            fetch_timeout: Some(1_000),
            ..Default::default()
        };
        args.apply(&mut config);
        assert_eq!(config.analyzer, AnalyzerKind::Chat);
        assert_eq!(config.analyzer_model, "small");
        assert_eq!(config.fetch_timeout_ms, 1_000);
        assert!(config.analyzer_url.is_none());
    }
}
