// Copyright 2026 Brand Audit Contributors
// SPDX-License-Identifier: Apache-2.0

//! `brand-audit serve`: run the HTTP API.

use crate::analysis;
use crate::cli::{output, ConfigArgs};
use crate::orchestrator::Orchestrator;
use crate::progress;
use crate::renderer::chromium::ChromiumLauncher;
use crate::rest::{self, AppState};
use anyhow::Result;
use std::sync::Arc;

/// Run the serve command until interrupted.
pub async fn run(port: u16, args: &ConfigArgs) -> Result<()> {
    let config = args.resolve();
    let analyzer = analysis::from_config(&config)?;
    let analyzer_name = analyzer.name().to_string();
    let launcher = Arc::new(ChromiumLauncher::new(config.chromium_path.clone()));
    let (tx, _rx) = progress::channel();

    let state = Arc::new(AppState::new(
        Orchestrator::new(&config, analyzer),
        launcher,
        tx,
        analyzer_name,
    ));

    if !output::is_quiet() {
        eprintln!("  Brand audit API on http://127.0.0.1:{port} (Ctrl-C to stop)");
    }

    tokio::select! {
        served = rest::start(port, state) => served,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutting down");
            Ok(())
        }
    }
}
