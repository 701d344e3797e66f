// Copyright 2026 Brand Audit Contributors
// SPDX-License-Identifier: Apache-2.0

//! Environment readiness check.

use crate::analysis;
use crate::cli::{output, ConfigArgs};
use crate::config::AuditConfig;
use crate::renderer::chromium::find_chromium;
use anyhow::Result;

/// Outcome of one readiness check.
#[derive(Debug, serde::Serialize)]
struct Check {
    name: &'static str,
    ok: bool,
    detail: String,
}

/// Check Chromium availability and analyzer configuration.
pub async fn run(args: &ConfigArgs) -> Result<()> {
    let config = args.resolve();
    let checks = collect(&config);
    let ready = checks.iter().all(|c| c.ok);

    if output::is_json() {
        output::print_json(&serde_json::json!({
            "ready": ready,
            "os": std::env::consts::OS,
            "arch": std::env::consts::ARCH,
            "checks": checks,
        }));
        return Ok(());
    }

    println!("Brand Audit Doctor");
    println!("==================");
    println!();
    println!("OS:   {}", std::env::consts::OS);
    println!("Arch: {}", std::env::consts::ARCH);
    println!();
    for check in &checks {
        let mark = if check.ok { "[OK]" } else { "[!!]" };
        println!("{mark} {}: {}", check.name, check.detail);
    }
    println!();
    if ready {
        println!("Status: READY");
    } else {
        println!("Status: NOT READY");
    }
    Ok(())
}

fn collect(config: &AuditConfig) -> Vec<Check> {
    let chromium = match find_chromium(config.chromium_path.as_ref()) {
        Some(path) => Check {
            name: "chromium",
            ok: true,
            detail: path.display().to_string(),
        },
        None => Check {
            name: "chromium",
            ok: false,
            detail: "not found; set BRAND_AUDIT_CHROMIUM_PATH or install Chrome (needed for screenshots)"
                .into(),
        },
    };

    let analyzer = match analysis::from_config(config) {
        Ok(a) => Check {
            name: "analyzer",
            ok: true,
            detail: match config.analyzer_url.as_deref() {
                Some(url) => format!("{} at {url}", a.name()),
                None => format!("{} at default endpoint", a.name()),
            },
        },
        Err(e) => Check {
            name: "analyzer",
            ok: false,
            detail: e.to_string(),
        },
    };

    vec![chromium, analyzer]
}
