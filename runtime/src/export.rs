// Copyright 2026 Brand Audit Contributors
// SPDX-License-Identifier: Apache-2.0

//! Batch export: CSV, JSON and Markdown renderings of audit results.

use crate::types::{AuditItem, AuditResult};
use anyhow::{Context, Result};
use std::fmt::Write as _;
use std::str::FromStr;

/// Supported export formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Csv,
    Json,
    Markdown,
}

impl ExportFormat {
    pub fn content_type(self) -> &'static str {
        match self {
            Self::Csv => "text/csv; charset=utf-8",
            Self::Json => "application/json",
            Self::Markdown => "text/markdown; charset=utf-8",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
            Self::Markdown => "md",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            "markdown" | "md" => Ok(Self::Markdown),
            other => Err(format!("unknown export format '{other}' (csv, json, markdown)")),
        }
    }
}

/// Render `results` in `format`.
pub fn render(results: &[AuditResult], format: ExportFormat) -> Result<String> {
    match format {
        ExportFormat::Csv => to_csv(results),
        ExportFormat::Json => to_json(results),
        ExportFormat::Markdown => Ok(to_markdown(results)),
    }
}

/// One row per result, error rows included.
pub fn to_csv(results: &[AuditResult]) -> Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record([
        "URL",
        "Status",
        "Score",
        "Recommendations",
        "FlaggedIssues",
        "SuggestedRewrites",
    ])?;

    for result in results {
        let status = result.status.to_string();
        let row = match &result.report {
            Some(report) => [
                result.url.clone(),
                status,
                report.compliance_score.to_string(),
                join_items(&report.recommendations),
                join_items(&report.flagged_issues),
                join_items(&report.suggested_rewrites),
            ],
            None => [
                result.url.clone(),
                status,
                String::new(),
                String::new(),
                String::new(),
                String::new(),
            ],
        };
        writer.write_record(&row)?;
    }

    let bytes = writer.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(bytes).context("CSV output was not UTF-8")
}

/// Pretty JSON array of the successful results.
pub fn to_json(results: &[AuditResult]) -> Result<String> {
    let successful: Vec<&AuditResult> = results.iter().filter(|r| r.is_success()).collect();
    Ok(serde_json::to_string_pretty(&successful)?)
}

/// Markdown report, one section per successful result.
pub fn to_markdown(results: &[AuditResult]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# Brand Compliance Audit");
    let _ = writeln!(
        out,
        "\n_Generated {}_",
        chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
    );

    for result in results {
        let Some(report) = result.report.as_ref() else {
            continue;
        };
        let _ = writeln!(out, "\n## {}\n", result.url);
        let _ = writeln!(out, "**Compliance score:** {}/100", report.compliance_score);

        bullet_section(&mut out, "Recommendations", &report.recommendations);
        bullet_section(&mut out, "Flagged issues", &report.flagged_issues);

        if !report.suggested_rewrites.is_empty() {
            let _ = writeln!(out, "\n### Suggested rewrites");
            for item in &report.suggested_rewrites {
                let _ = writeln!(out, "\n```\n{}\n```", item.text);
            }
        }
    }
    out
}

fn bullet_section(out: &mut String, title: &str, items: &[AuditItem]) {
    if items.is_empty() {
        return;
    }
    let _ = writeln!(out, "\n### {title}\n");
    for item in items {
        match item.selector.as_deref() {
            Some(sel) => {
                let _ = writeln!(out, "- {} (`{sel}`)", item.text);
            }
            None => {
                let _ = writeln!(out, "- {}", item.text);
            }
        }
    }
}

fn join_items(items: &[AuditItem]) -> String {
    items
        .iter()
        .map(|i| i.text.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AuditError;
    use crate::types::ComplianceReport;

    fn sample() -> Vec<AuditResult> {
        let report = ComplianceReport {
            compliance_score: 72,
            flagged_issues: vec![AuditItem::new("Uses \"cheap\"").with_selector("#hero h1")],
            suggested_rewrites: vec![AuditItem::new("Affordable, premium quality")],
            recommendations: vec![AuditItem::new("Soften tone"), AuditItem::new("Add CTA, above fold")],
        };
        vec![
            AuditResult::pending("https://a.com/").complete(Ok(report)),
            AuditResult::pending("https://a.com/broken").complete(Err(AuditError::NoContent)),
        ]
    }

    #[test]
    fn test_csv_layout_and_quoting() {
        let csv = to_csv(&sample()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(
            lines[0],
            "URL,Status,Score,Recommendations,FlaggedIssues,SuggestedRewrites"
        );
        assert_eq!(
            lines[1],
            "https://a.com/,success,72,\"Soften tone; Add CTA, above fold\",\"Uses \"\"cheap\"\"\",\"Affordable, premium quality\""
        );
        assert_eq!(lines[2], "https://a.com/broken,error,,,,");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_json_keeps_only_successes() {
        let json = to_json(&sample()).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        let arr = parsed.as_array().unwrap();
        assert_eq!(arr.len(), 1);
        assert_eq!(arr[0]["url"], "https://a.com/");
        assert_eq!(arr[0]["report"]["complianceScore"], 72);
    }

    #[test]
    fn test_markdown_sections() {
        let md = to_markdown(&sample());
        assert!(md.starts_with("# Brand Compliance Audit"));
        assert!(md.contains("## https://a.com/\n"));
        assert!(md.contains("**Compliance score:** 72/100"));
        assert!(md.contains("### Recommendations\n\n- Soften tone\n- Add CTA, above fold"));
        assert!(md.contains("- Uses \"cheap\" (`#hero h1`)"));
        assert!(md.contains("```\nAffordable, premium quality\n```"));
        assert!(!md.contains("broken"));
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("CSV".parse::<ExportFormat>().unwrap(), ExportFormat::Csv);
        assert_eq!("md".parse::<ExportFormat>().unwrap(), ExportFormat::Markdown);
        assert!("xml".parse::<ExportFormat>().is_err());
    }
}
