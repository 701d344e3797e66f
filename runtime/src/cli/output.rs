// Copyright 2026 Brand Audit Contributors
// SPDX-License-Identifier: Apache-2.0

//! Output mode flags shared by every subcommand.
//!
//! `main` exports the global `--json` and `--quiet` switches as
//! environment variables so commands can consult them without threading
//! them through every signature.

use serde::Serialize;

pub const JSON_VAR: &str = "BRAND_AUDIT_JSON";
pub const QUIET_VAR: &str = "BRAND_AUDIT_QUIET";

fn flag(var: &str) -> bool {
    std::env::var(var).map(|v| v == "1").unwrap_or(false)
}

/// Machine-readable JSON on stdout instead of human text.
pub fn is_json() -> bool {
    flag(JSON_VAR)
}

/// Suppress progress and decoration.
pub fn is_quiet() -> bool {
    flag(QUIET_VAR)
}

/// Print `value` as pretty JSON on stdout.
pub fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{s}"),
        Err(e) => eprintln!("  Error: could not serialize output: {e}"),
    }
}

/// Shorten `s` to at most `max` characters, marking the cut with `...`.
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let kept: String = s.chars().take(max.saturating_sub(3)).collect();
    format!("{kept}...")
}
