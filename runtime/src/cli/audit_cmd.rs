// Copyright 2026 Brand Audit Contributors
// SPDX-License-Identifier: Apache-2.0

//! `brand-audit audit`: run a compliance batch from the terminal.

use crate::analysis;
use crate::cli::capture_cmd::write_screenshots;
use crate::cli::{output, ConfigArgs};
use crate::export::{self, ExportFormat};
use crate::orchestrator::{AuditRun, Orchestrator};
use crate::progress;
use crate::renderer::chromium::ChromiumLauncher;
use crate::types::{parse_url_list, AuditRequest};
use anyhow::{bail, Context, Result};
use clap::Args;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct AuditArgs {
    /// File containing the brand guideline text
    #[arg(long, short = 'g')]
    pub guideline: PathBuf,
    /// URLs to audit
    pub urls: Vec<String>,
    /// File with more URLs, separated by newlines or commas
    #[arg(long)]
    pub urls_file: Option<PathBuf>,
    /// Also audit same-domain pages linked from the first URL
    #[arg(long)]
    pub discover: bool,
    /// Pages audited in parallel (1-8)
    #[arg(long)]
    pub concurrency: Option<usize>,
    /// Output format (pretty, json, csv, markdown)
    #[arg(long, default_value = "pretty")]
    pub format: String,
    /// Write the rendered report to this file instead of stdout
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
    /// Capture flagged elements of successful pages into this directory
    #[arg(long)]
    pub screenshots: Option<PathBuf>,
    #[command(flatten)]
    pub config: ConfigArgs,
}

/// Run the audit command.
pub async fn run(args: AuditArgs) -> Result<()> {
    let guideline = tokio::fs::read_to_string(&args.guideline)
        .await
        .with_context(|| format!("cannot read guideline file {}", args.guideline.display()))?;

    let mut urls = args.urls.clone();
    if let Some(ref path) = args.urls_file {
        let raw = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("cannot read URL file {}", path.display()))?;
        urls.extend(parse_url_list(&raw));
    }
    if urls.is_empty() {
        bail!("no URLs given. Pass them as arguments or with --urls-file");
    }

    let format = if output::is_json() {
        "json".to_string()
    } else {
        args.format.to_ascii_lowercase()
    };
    if !matches!(format.as_str(), "pretty" | "json") {
        format.parse::<ExportFormat>().map_err(anyhow::Error::msg)?;
    }

    let mut config = args.config.resolve();
    if let Some(n) = args.concurrency {
        config.concurrency = n;
    }
    let analyzer = analysis::from_config(&config)?;

    let (tx, rx) = progress::channel();
    let printer = spawn_progress_printer(rx);
    let orchestrator = Orchestrator::new(&config, analyzer).with_progress(tx);

    let request = AuditRequest::new(guideline, urls).with_auto_discover(args.discover);
    let outcome = orchestrator.run(&request).await;

    let mut run = match outcome {
        Ok(run) => run,
        Err(e) => {
            drop(orchestrator);
            let _ = printer.await;
            return Err(e.into());
        }
    };

    if let Some(ref dir) = args.screenshots {
        let launcher = ChromiumLauncher::new(config.chromium_path.clone());
        for result in run.results.iter_mut().filter(|r| r.is_success()) {
            orchestrator.attach_screenshots(&launcher, result).await;
            if let Some(ref shots) = result.screenshots {
                write_screenshots(dir, &result.url, shots).await?;
            }
        }
    }

    // Closing the channel ends the printer.
    drop(orchestrator);
    let _ = printer.await;

    let rendered = render(&run, &format)?;
    match args.output {
        Some(ref path) => {
            tokio::fs::write(path, rendered)
                .await
                .with_context(|| format!("cannot write {}", path.display()))?;
            if !output::is_quiet() {
                eprintln!("  Report written to {}", path.display());
            }
        }
        None => print!("{rendered}"),
    }
    Ok(())
}

fn spawn_progress_printer(mut rx: progress::ProgressReceiver) -> tokio::task::JoinHandle<()> {
    let show = !output::is_quiet() && !output::is_json();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    if show {
                        eprintln!("  {}", event.event);
                    }
                }
                Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => continue,
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}

fn render(run: &AuditRun, format: &str) -> Result<String> {
    match format {
        "pretty" => Ok(render_pretty(run)),
        "json" => Ok(format!("{}\n", serde_json::to_string_pretty(run)?)),
        other => {
            let format: ExportFormat = other.parse().map_err(anyhow::Error::msg)?;
            export::render(&run.results, format)
        }
    }
}

fn render_pretty(run: &AuditRun) -> String {
    let mut out = String::new();
    out.push('\n');
    for result in &run.results {
        let url = output::truncate(&result.url, 50);
        match (&result.report, &result.error_message) {
            (Some(report), _) => out.push_str(&format!(
                "  [OK] {url:<50} {:>3}/100  {} issue(s), {} rewrite(s)\n",
                report.compliance_score,
                report.flagged_issues.len(),
                report.suggested_rewrites.len(),
            )),
            (None, Some(message)) => {
                out.push_str(&format!("  [!!] {url:<50} {message}\n"));
            }
            (None, None) => out.push_str(&format!("  [??] {url:<50} pending\n")),
        }
    }
    out.push_str(&format!(
        "\n  {} succeeded, {} failed\n",
        run.succeeded(),
        run.failed()
    ));
    out
}
