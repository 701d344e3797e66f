// Copyright 2026 Brand Audit Contributors
// SPDX-License-Identifier: Apache-2.0

//! `brand-audit discover <url>`: list same-domain links of one page.

use crate::acquisition::http_client::HttpClient;
use crate::acquisition::links::discover_links;
use crate::acquisition::url_norm::normalize;
use crate::cli::{output, ConfigArgs};
use anyhow::Result;

/// Run the discover command.
pub async fn run(url: &str, args: &ConfigArgs) -> Result<()> {
    let config = args.resolve();
    let start_url = normalize(url)?;
    let client = HttpClient::new(config.fetch_timeout_ms);
    let links = discover_links(&client, &start_url).await?;

    if output::is_json() {
        output::print_json(&serde_json::json!({
            "startUrl": start_url,
            "links": links,
        }));
        return Ok(());
    }

    if !output::is_quiet() {
        eprintln!("  Found {} same-domain link(s) on {start_url}:", links.len());
        eprintln!();
    }
    for link in &links {
        println!("{link}");
    }
    Ok(())
}
