//! Post-processing for CMS-authored rich text before it is handed to templates.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use reqwest::Url;
use serde_json::Value;
use std::ops::Range;

use crate::data_models::Document;

// Attribute runs skip over quoted values so a `>` inside one does not end the tag.
static ANCHOR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)<a\b((?:"[^"]*"|'[^']*'|[^'">])*)>(.*?)</a\s*>"#).expect("valid anchor regex")
});
static ATTR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"([^\s"'>/=]+)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+)))?"#)
        .expect("valid attribute regex")
});
static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[A-Za-z0-9._%+\-]+@[A-Za-z0-9.\-]+\.[A-Za-z]{2,}").expect("valid email regex")
});

/// Screen reader hint appended to links that open in a new tab.
pub const NEW_TAB_HINT: &str = r#"<span class="sr-only"> (åpnes i ny fane)</span>"#;

/// Both rewrites, in the order the loaders apply them.
pub fn process_rich_text(html: &str, site_host: Option<&str>) -> String {
    obfuscate_emails(&annotate_external_links(html, site_host))
}

/// Rewrites the `content` of every block item in place.
pub fn process_document(doc: &mut Document, site_host: Option<&str>) {
    for block in &mut doc.blocks {
        let Some(Value::Object(item)) = block.item.as_mut() else {
            continue;
        };
        if let Some(Value::String(content)) = item.get_mut("content") {
            *content = process_rich_text(content, site_host);
        }
    }
}

/// Makes links to other sites open in a new tab, safely, and announces it to
/// screen readers. Relative and same-host links are left alone.
pub fn annotate_external_links(html: &str, site_host: Option<&str>) -> String {
    ANCHOR_RE
        .replace_all(html, |caps: &Captures| {
            let attrs = &caps[1];
            let inner = &caps[2];

            let href = find_attr(attrs, "href").map(|attr| attr.value);
            if !href.is_some_and(|h| is_external(h, site_host)) {
                return caps[0].to_string();
            }

            let mut attrs = attrs.to_string();
            if find_attr(&attrs, "target").is_none() {
                attrs.push_str(r#" target="_blank""#);
            }
            attrs = with_noopener(&attrs);

            let mut inner = inner.to_string();
            if !inner.contains("sr-only") {
                inner.push_str(NEW_TAB_HINT);
            }

            format!("<a{attrs}>{inner}</a>")
        })
        .into_owned()
}

/// One `name[=value]` pair from the inside of a start tag.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Attr<'a> {
    name: &'a str,
    value: &'a str,
    span: Range<usize>,
}

fn attributes(attrs: &str) -> impl Iterator<Item = Attr<'_>> {
    ATTR_RE.captures_iter(attrs).filter_map(|caps| {
        let whole = caps.get(0)?;
        let value = caps
            .get(2)
            .or_else(|| caps.get(3))
            .or_else(|| caps.get(4))
            .map_or("", |m| m.as_str());
        Some(Attr {
            name: caps.get(1)?.as_str(),
            value,
            span: whole.range(),
        })
    })
}

fn find_attr<'a>(attrs: &'a str, name: &str) -> Option<Attr<'a>> {
    attributes(attrs).find(|attr| attr.name.eq_ignore_ascii_case(name))
}

fn with_noopener(attrs: &str) -> String {
    let Some(rel) = find_attr(attrs, "rel") else {
        return format!(r#"{attrs} rel="noopener noreferrer""#);
    };
    if rel
        .value
        .split_whitespace()
        .any(|token| token.eq_ignore_ascii_case("noopener"))
    {
        return attrs.to_string();
    }

    let value = rel.value.trim();
    let rewritten = if value.is_empty() {
        r#"rel="noopener""#.to_string()
    } else {
        format!(r#"rel="{value} noopener""#)
    };
    format!("{}{rewritten}{}", &attrs[..rel.span.start], &attrs[rel.span.end..])
}

/// Absolute http(s) URL on a different host than the site.
pub fn is_external(href: &str, site_host: Option<&str>) -> bool {
    let Ok(url) = Url::parse(href.trim()) else {
        return false;
    };
    if url.scheme() != "http" && url.scheme() != "https" {
        return false;
    }
    match (url.host_str(), site_host) {
        (Some(host), Some(site)) => !host.eq_ignore_ascii_case(site),
        (Some(_), None) => true,
        (None, _) => false,
    }
}

/// Host part of the configured public site URL.
pub fn site_host(public_site_url: &str) -> Option<String> {
    Url::parse(public_site_url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
}

/// Encodes every email address as decimal character references. Browsers render
/// the same text and `mailto:` still works, but the raw markup holds no address.
pub fn obfuscate_emails(html: &str) -> String {
    EMAIL_RE
        .replace_all(html, |caps: &Captures| {
            caps[0]
                .chars()
                .map(|c| format!("&#{};", c as u32))
                .collect::<String>()
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_external_link_gets_target_rel_and_hint() {
        let html = r#"<p>Se <a href="https://example.org/x">her</a>.</p>"#;
        let out = annotate_external_links(html, Some("nettsted.no"));
        assert_eq!(
            out,
            r#"<p>Se <a href="https://example.org/x" target="_blank" rel="noopener noreferrer">her<span class="sr-only"> (åpnes i ny fane)</span></a>.</p>"#
        );
    }

    #[test]
    fn test_internal_and_relative_links_untouched() {
        let html = r#"<a href="/om-oss">Om</a> <a href="https://Nettsted.no/kontakt">K</a> <a href="mailto:a@b.no">M</a> <a name="x">anker</a>"#;
        assert_eq!(annotate_external_links(html, Some("nettsted.no")), html);
    }

    #[test]
    fn test_every_absolute_link_is_external_without_site_host() {
        let out = annotate_external_links(r#"<a href='http://nettsted.no'>x</a>"#, None);
        assert!(out.contains(r#"target="_blank""#));
        assert!(out.contains("sr-only"));
    }

    #[test]
    fn test_existing_rel_and_target_are_kept() {
        let html = r#"<a href="https://ex.com" target="_self" rel="external">x</a>"#;
        let out = annotate_external_links(html, None);
        assert!(out.contains(r#"target="_self""#));
        assert!(!out.contains("_blank"));
        assert!(out.contains(r#"rel="external noopener""#));
    }

    #[test]
    fn test_annotation_is_idempotent() {
        let html = r#"<a href="https://ex.com">x</a> og <a href="https://ex.com/y" rel="nofollow">y</a>"#;
        let once = annotate_external_links(html, None);
        let twice = annotate_external_links(&once, None);
        assert_eq!(once, twice);
        assert_eq!(once.matches("sr-only").count(), 2);
    }

    #[test]
    fn test_quoted_gt_does_not_end_the_tag() {
        let html = r#"<a href="https://ex.com" title="1 > 0">x</a>"#;
        assert_eq!(
            annotate_external_links(html, None),
            r#"<a href="https://ex.com" title="1 > 0" target="_blank" rel="noopener noreferrer">x<span class="sr-only"> (åpnes i ny fane)</span></a>"#
        );
    }

    #[test]
    fn test_attribute_names_inside_values_are_ignored() {
        let html = r#"<a title='rel="x" target=y' href=https://ex.com>x</a>"#;
        let out = annotate_external_links(html, None);
        assert!(out.starts_with(r#"<a title='rel="x" target=y' href=https://ex.com target="_blank" rel="noopener noreferrer">"#));
    }

    #[test]
    fn test_attributes() {
        let attrs = r#" href="/a" data-x='1 > 2' download rel=nofollow"#;
        let found: Vec<(&str, &str)> = attributes(attrs).map(|a| (a.name, a.value)).collect();
        assert_eq!(
            found,
            vec![("href", "/a"), ("data-x", "1 > 2"), ("download", ""), ("rel", "nofollow")]
        );
        assert_eq!(with_noopener(attrs), r#" href="/a" data-x='1 > 2' download rel="nofollow noopener""#);
    }

    #[test]
    fn test_obfuscate_emails() {
        let out = obfuscate_emails(r#"<a href="mailto:ola@ex.no">ola@ex.no</a>"#);
        assert!(!out.contains("ola@ex.no"));
        assert!(out.contains("mailto:&#111;&#108;&#97;&#64;"));
        assert_eq!(obfuscate_emails(&out), out);
        assert_eq!(obfuscate_emails("ingen e-post her"), "ingen e-post her");
    }

    #[test]
    fn test_process_document_rewrites_block_content_only() {
        let mut doc: Document = serde_json::from_value(json!({
            "id": 1,
            "blocks": [
                {"item": {"content": "<a href=\"https://ex.com\">x</a> post@ex.no", "title": "post@ex.no"}},
                {"item": "unexpanded"}
            ]
        }))
        .unwrap();
        process_document(&mut doc, Some("nettsted.no"));

        let item = doc.blocks[0].item.as_ref().unwrap();
        let content = item["content"].as_str().unwrap();
        assert!(content.contains("sr-only"));
        assert!(!content.contains("post@ex.no"));
        assert_eq!(item["title"], "post@ex.no");
    }

    #[test]
    fn test_site_host() {
        assert_eq!(site_host("https://nettsted.no/"), Some("nettsted.no".to_string()));
        assert_eq!(site_host("ikke en url"), None);
    }
}
