// Copyright 2026 Brand Audit Contributors
// SPDX-License-Identifier: Apache-2.0

//! Reduce raw page markup to plain, analyzable body text.
//!
//! Boilerplate regions (`style`, `script`, `nav`, `footer`) are dropped with
//! everything nested inside them. Output is whitespace-collapsed and capped
//! at a fixed character budget; truncation is silent.

use crate::config::DEFAULT_MAX_TEXT_CHARS;
use regex::Regex;
use scraper::{ElementRef, Html, Node, Selector};
use std::sync::OnceLock;

/// Elements removed together with their whole subtree.
const STRIPPED_ELEMENTS: &[&str] = &["style", "script", "nav", "footer", "noscript", "template"];

fn body_tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)<body[\s>/]").expect("static regex"))
}

/// Extract body text using the default budget.
pub fn extract_text(html: &str) -> String {
    extract_text_with_limit(html, DEFAULT_MAX_TEXT_CHARS)
}

/// Extract body text, keeping at most `max_chars` characters.
///
/// Markup with no `<body>` element yields an empty string.
pub fn extract_text_with_limit(html: &str, max_chars: usize) -> String {
    // html5ever synthesizes a body for any document, so check the source.
    if !body_tag_re().is_match(html) {
        return String::new();
    }

    let document = Html::parse_document(html);
    let body_sel = Selector::parse("body").unwrap();
    let Some(body) = document.select(&body_sel).next() else {
        return String::new();
    };

    let mut raw = String::with_capacity(html.len() / 4);
    collect_text(body, &mut raw);

    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    truncate_chars(collapsed, max_chars)
}

fn collect_text(body: ElementRef<'_>, out: &mut String) {
    // Explicit stack: page nesting depth is attacker-controlled. `None` marks
    // the end of an element, where a separating space is due.
    let mut stack: Vec<Option<_>> = body.children().rev().map(Some).collect();
    while let Some(entry) = stack.pop() {
        let Some(node) = entry else {
            out.push(' ');
            continue;
        };
        match node.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) => {
                if STRIPPED_ELEMENTS.contains(&el.name()) {
                    continue;
                }
                // Tag boundaries separate words, as in "a<br>b".
                out.push(' ');
                stack.push(None);
                stack.extend(node.children().rev().map(Some));
            }
            _ => {}
        }
    }
}

fn truncate_chars(text: String, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => text[..byte_idx].to_string(),
        None => text,
    }
}
