// Copyright 2026 Brand Audit Contributors
// SPDX-License-Identifier: Apache-2.0

//! `brand-audit capture <url> --selector ...`: snapshot page elements.

use crate::acquisition::url_norm::normalize;
use crate::cli::{output, ConfigArgs};
use crate::renderer::chromium::ChromiumLauncher;
use crate::snapshot::{capture_elements, CaptureOptions};
use crate::types::Screenshot;
use anyhow::{bail, Context, Result};
use std::hash::Hasher;
use std::path::{Path, PathBuf};

/// Run the capture command.
pub async fn run(url: &str, selectors: &[String], out_dir: &Path, args: &ConfigArgs) -> Result<()> {
    if selectors.is_empty() {
        bail!("at least one --selector is required");
    }
    let config = args.resolve();
    let url = normalize(url)?;
    let launcher = ChromiumLauncher::new(config.chromium_path.clone());
    let opts = CaptureOptions {
        timeout_ms: config.capture_timeout_ms,
        network_idle_ms: config.network_idle_ms,
    };

    if !output::is_quiet() && !output::is_json() {
        eprintln!("  Capturing {} selector(s) on {url}...", selectors.len());
    }

    let shots = capture_elements(&launcher, &url, selectors, opts).await?;
    let written = write_screenshots(out_dir, &url, &shots).await?;

    if output::is_json() {
        let files: Vec<serde_json::Value> = shots
            .iter()
            .zip(&written)
            .map(|(shot, path)| {
                serde_json::json!({
                    "selector": shot.selector,
                    "path": path.display().to_string(),
                    "bytes": shot.image_bytes.len(),
                })
            })
            .collect();
        output::print_json(&serde_json::json!({
            "url": url,
            "requested": selectors.len(),
            "captured": files,
        }));
        return Ok(());
    }

    if !output::is_quiet() {
        for (shot, path) in shots.iter().zip(&written) {
            eprintln!("  [OK] {:<30} {}", shot.selector, path.display());
        }
        let missing = selectors.len().saturating_sub(shots.len());
        if missing > 0 {
            eprintln!("  [--] {missing} selector(s) matched nothing or could not be captured");
        }
    }
    Ok(())
}

/// Write each screenshot as `<out_dir>/<page-slug>-<url-hash>-<n>.png`.
pub async fn write_screenshots(out_dir: &Path, url: &str, shots: &[Screenshot]) -> Result<Vec<PathBuf>> {
    if shots.is_empty() {
        return Ok(Vec::new());
    }
    tokio::fs::create_dir_all(out_dir)
        .await
        .with_context(|| format!("cannot create {}", out_dir.display()))?;

    let slug = slugify(url);
    let mut paths = Vec::with_capacity(shots.len());
    for (i, shot) in shots.iter().enumerate() {
        let path = out_dir.join(format!("{slug}-{}.png", i + 1));
        tokio::fs::write(&path, &shot.image_bytes)
            .await
            .with_context(|| format!("cannot write {}", path.display()))?;
        paths.push(path);
    }
    Ok(paths)
}

/// File-name-safe form of a URL.
///
/// The readable part is lossy, so a hash of the full URL keeps distinct
/// pages (`http` vs `https`, `/a-b` vs `/a_b`) from sharing a name.
fn slugify(url: &str) -> String {
    let stripped = url
        .trim_start_matches("https://")
        .trim_start_matches("http://");
    let mut slug: String = stripped
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    while slug.ends_with('_') {
        slug.pop();
    }
    slug.truncate(80);
    if slug.is_empty() {
        slug.push_str("page");
    }

    let mut hasher = fnv::FnvHasher::default();
    hasher.write(url.as_bytes());
    format!("{slug}-{:08x}", hasher.finish() as u32)
}
