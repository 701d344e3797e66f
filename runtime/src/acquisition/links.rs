// Copyright 2026 Brand Audit Contributors
// SPDX-License-Identifier: Apache-2.0

//! Same-domain link discovery for crawl expansion.
//!
//! Origin policy: a link is kept only when its resolved origin (scheme, host
//! and port) equals the crawl's base origin exactly. Subdomains and `www.`
//! variants are different origins and are excluded.

use super::http_client::HttpClient;
use super::url_norm::{discovery_key, origin_of};
use crate::error::AuditError;
use scraper::{Html, Selector};
use std::collections::HashSet;
use tracing::debug;
use url::Url;

/// Extract same-origin links from one page's markup.
///
/// Hrefs are resolved against `page_url`, stripped of query and fragment,
/// and de-duplicated. Output keeps document order.
pub fn extract_same_origin_links(html: &str, page_url: &str, base_origin: &str) -> Vec<String> {
    let Ok(base) = Url::parse(page_url) else {
        return Vec::new();
    };
    let Ok(origin) = Url::parse(base_origin).map(|u| u.origin()) else {
        return Vec::new();
    };

    let document = Html::parse_document(html);
    let sel = Selector::parse("a[href]").unwrap();

    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for element in document.select(&sel) {
        let href = element.value().attr("href").unwrap_or("").trim();
        if href.is_empty() || href.starts_with('#') {
            continue;
        }

        let Ok(resolved) = base.join(href) else {
            continue;
        };
        if resolved.origin() != origin {
            continue;
        }

        let Ok(key) = discovery_key(resolved.as_str()) else {
            continue;
        };
        if seen.insert(key.clone()) {
            links.push(key);
        }
    }

    links
}

/// Fetch `start_url` and return its same-origin links.
///
/// Fetch failures are returned to the caller.
pub async fn discover_links(client: &HttpClient, start_url: &str) -> Result<Vec<String>, AuditError> {
    let origin = origin_of(start_url)?;
    let markup = client.fetch_markup(start_url).await?;
    let links = extract_same_origin_links(&markup, start_url, &origin);
    debug!(start_url, count = links.len(), "links discovered");
    Ok(links)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_same_origin_filter_with_relative_and_fragment() {
        let html = r#"<html><body>
            <a href="https://a.com/q#frag">Q</a>
            <a href="https://b.com/r">R</a>
            <a href="/s">S</a>
        </body></html>"#;
        let links = extract_same_origin_links(html, "https://a.com/p", "https://a.com");
        assert_eq!(links, vec!["https://a.com/q", "https://a.com/s"]);
    }

    #[test]
    fn test_query_stripped_and_deduplicated() {
        let html = r#"<html><body>
            <a href="/q?page=1">1</a>
            <a href="/q?page=2">2</a>
            <a href="q#top">3</a>
        </body></html>"#;
        let links = extract_same_origin_links(html, "https://a.com/", "https://a.com");
        assert_eq!(links, vec!["https://a.com/q"]);
    }

    #[test]
    fn test_subdomains_and_other_schemes_excluded() {
        let html = r##"<html><body>
            <a href="https://blog.a.com/post">blog</a>
            <a href="https://www.a.com/x">www</a>
            <a href="http://a.com/insecure">http</a>
            <a href="mailto:hi@a.com">mail</a>
            <a href="javascript:void(0)">js</a>
            <a href="#section">anchor</a>
        </body></html>"##;
        let links = extract_same_origin_links(html, "https://a.com/", "https://a.com");
        assert!(links.is_empty(), "unexpected links: {links:?}");
    }

    #[test]
    fn test_relative_resolution_uses_page_path() {
        let html = r#"<a href="child">c</a><a href="../up">u</a>"#;
        let links = extract_same_origin_links(html, "https://a.com/dir/page", "https://a.com");
        assert_eq!(links, vec!["https://a.com/dir/child", "https://a.com/up"]);
    }

    #[tokio::test]
    async fn test_discover_links_fetches_start_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"<html><body><a href="/about">About</a><a href="https://elsewhere.org/">x</a></body></html>"#,
            ))
            .mount(&server)
            .await;

        let client = HttpClient::new(5_000);
        let start = format!("{}/", server.uri());
        let links = discover_links(&client, &start).await.unwrap();
        assert_eq!(links, vec![format!("{}/about", server.uri())]);
    }

    #[tokio::test]
    async fn test_discovery_fetch_failure_is_returned() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = HttpClient::new(5_000);
        let err = discover_links(&client, &server.uri()).await.unwrap_err();
        assert_eq!(err.code(), "E_FETCH_FAILED");
    }
}
