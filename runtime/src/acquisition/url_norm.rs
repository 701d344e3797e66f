// Copyright 2026 Brand Audit Contributors
// SPDX-License-Identifier: Apache-2.0

//! Canonicalize user input and discovered links into absolute URLs.

use crate::error::AuditError;
use regex::Regex;
use std::sync::OnceLock;
use url::Url;

fn scheme_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*://").expect("static regex"))
}

/// Normalize a raw URL string.
///
/// Adds `https://` when no scheme is present and requires a host. Query and
/// fragment are preserved: this is the identity stored on results.
pub fn normalize(raw: &str) -> Result<String, AuditError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(invalid(raw, "empty input"));
    }

    let with_scheme = if scheme_re().is_match(trimmed) {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };

    let parsed = Url::parse(&with_scheme).map_err(|e| invalid(raw, &e.to_string()))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(invalid(raw, "only http and https URLs can be audited"));
    }
    if parsed.host_str().map_or(true, str::is_empty) {
        return Err(invalid(raw, "missing host"));
    }
    Ok(parsed.to_string())
}

/// Discovery dedup key: the normalized URL without query or fragment.
pub fn discovery_key(normalized: &str) -> Result<String, AuditError> {
    let mut parsed = Url::parse(normalized).map_err(|e| invalid(normalized, &e.to_string()))?;
    parsed.set_query(None);
    parsed.set_fragment(None);
    Ok(parsed.to_string())
}

/// Scheme + host (+ port when non-default) of a URL, e.g. `https://a.com`.
pub fn origin_of(normalized: &str) -> Result<String, AuditError> {
    let parsed = Url::parse(normalized).map_err(|e| invalid(normalized, &e.to_string()))?;
    Ok(parsed.origin().ascii_serialization())
}

fn invalid(input: &str, reason: &str) -> AuditError {
    AuditError::InvalidUrl {
        input: input.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scheme_added() {
        assert_eq!(normalize("example.com").unwrap(), "https://example.com/");
    }

    #[test]
    fn test_existing_scheme_kept() {
        assert_eq!(
            normalize("http://example.com/a").unwrap(),
            "http://example.com/a"
        );
    }

    #[test]
    fn test_idempotent() {
        for raw in ["example.com", "https://a.com/p?x=1#y", "HTTP://A.COM:8080/x"] {
            let once = normalize(raw).unwrap();
            assert_eq!(normalize(&once).unwrap(), once);
        }
    }

    #[test]
    fn test_identity_keeps_query_and_fragment() {
        assert_eq!(
            normalize("https://example.com/a?x=1#y").unwrap(),
            "https://example.com/a?x=1#y"
        );
    }

    #[test]
    fn test_discovery_key_strips_query_and_fragment() {
        let n = normalize("https://example.com/a?x=1#y").unwrap();
        assert_eq!(discovery_key(&n).unwrap(), "https://example.com/a");
    }

    #[test]
    fn test_invalid_inputs() {
        for raw in ["", "   ", "http://", "https://exa mple.com", "ftp://files.example.com"] {
            assert!(
                matches!(normalize(raw), Err(AuditError::InvalidUrl { .. })),
                "{raw:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_origin() {
        assert_eq!(origin_of("https://a.com/p/q?x=1").unwrap(), "https://a.com");
        assert_eq!(origin_of("http://a.com:8080/").unwrap(), "http://a.com:8080");
    }
}
