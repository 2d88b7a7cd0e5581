//! Parse the SEO-relevant parts of a page without rendering it.

use scraper::{Html, Selector};
use serde_json::Value;
use url::Url;

use crate::acquisition::PageMetadata;
use crate::text::collapse_whitespace;

/// An `<img>` element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    pub src: String,
    /// `None` when the attribute is absent, `Some("")` when empty.
    pub alt: Option<String>,
}

impl ImageRef {
    pub fn has_alt(&self) -> bool {
        self.alt.as_deref().map(|a| !a.trim().is_empty()).unwrap_or(false)
    }
}

/// An `<a href>` element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkRef {
    pub href: String,
    pub is_internal: bool,
}

/// Parsed page, ready for [`super::analyze_seo`].
#[derive(Debug, Clone, Default)]
pub struct SeoDocument {
    pub metadata: PageMetadata,
    /// (level, text) in document order per level.
    pub headings: Vec<(u8, String)>,
    /// Whether a parseable JSON-LD block exists.
    pub has_json_ld: bool,
    /// Every `@type` found in JSON-LD, including `@graph` members.
    pub schema_types: Vec<String>,
    pub images: Vec<ImageRef>,
    pub links: Vec<LinkRef>,
}

impl SeoDocument {
    /// Parse markup. Relative links count as internal.
    pub fn parse(html: &str) -> Self {
        Self::parse_inner(html, None)
    }

    /// Parse markup, classifying links against the host of `base_url`.
    pub fn parse_with_base(html: &str, base_url: &str) -> Self {
        Self::parse_inner(html, Url::parse(base_url).ok())
    }

    fn parse_inner(html: &str, base: Option<Url>) -> Self {
        let document = Html::parse_document(html);

        let mut doc = Self {
            metadata: PageMetadata::from_document(&document),
            ..Default::default()
        };

        extract_headings(&document, &mut doc);
        extract_json_ld(&document, &mut doc);
        extract_images(&document, &mut doc);
        extract_links(&document, base.as_ref(), &mut doc);

        doc
    }

    pub fn h1s(&self) -> impl Iterator<Item = &str> {
        self.headings
            .iter()
            .filter(|(level, _)| *level == 1)
            .map(|(_, text)| text.as_str())
    }

    pub fn count_level(&self, level: u8) -> usize {
        self.headings.iter().filter(|(l, _)| *l == level).count()
    }

    pub fn internal_link_count(&self) -> usize {
        self.links.iter().filter(|l| l.is_internal).count()
    }

    pub fn external_link_count(&self) -> usize {
        self.links.len() - self.internal_link_count()
    }
}

fn extract_headings(document: &Html, doc: &mut SeoDocument) {
    for level in 1..=6u8 {
        let sel = match Selector::parse(&format!("h{level}")) {
            Ok(s) => s,
            Err(_) => continue,
        };
        for element in document.select(&sel) {
            let text = collapse_whitespace(&element.text().collect::<Vec<_>>().join(" "));
            if !text.is_empty() {
                doc.headings.push((level, text));
            }
        }
    }
}

fn extract_json_ld(document: &Html, doc: &mut SeoDocument) {
    let Ok(sel) = Selector::parse(r#"script[type="application/ld+json"]"#) else {
        return;
    };

    for element in document.select(&sel) {
        let text = element.inner_html();
        let text = text.trim();
        if text.is_empty() {
            continue;
        }
        if let Ok(value) = serde_json::from_str::<Value>(text) {
            doc.has_json_ld = true;
            collect_types(&value, &mut doc.schema_types);
        }
    }
}

fn collect_types(value: &Value, types: &mut Vec<String>) {
    match value {
        Value::Array(items) => {
            for item in items {
                collect_types(item, types);
            }
        }
        Value::Object(map) => {
            match map.get("@type") {
                Some(Value::String(t)) => push_type(types, t),
                Some(Value::Array(ts)) => {
                    for t in ts.iter().filter_map(Value::as_str) {
                        push_type(types, t);
                    }
                }
                _ => {}
            }
            if let Some(graph) = map.get("@graph") {
                collect_types(graph, types);
            }
        }
        _ => {}
    }
}

fn push_type(types: &mut Vec<String>, t: &str) {
    // "https://schema.org/Product" -> "Product"
    let name = t.rsplit('/').next().unwrap_or(t).trim();
    if !name.is_empty() && !types.iter().any(|existing| existing == name) {
        types.push(name.to_string());
    }
}

fn extract_images(document: &Html, doc: &mut SeoDocument) {
    let Ok(sel) = Selector::parse("img") else {
        return;
    };
    for element in document.select(&sel) {
        doc.images.push(ImageRef {
            src: element.value().attr("src").unwrap_or_default().trim().to_string(),
            alt: element.value().attr("alt").map(|a| a.to_string()),
        });
    }
}

fn extract_links(document: &Html, base: Option<&Url>, doc: &mut SeoDocument) {
    let Ok(sel) = Selector::parse("a[href]") else {
        return;
    };
    let base_host = base.and_then(|b| b.host_str()).map(strip_www);

    for element in document.select(&sel) {
        let href = element.value().attr("href").unwrap_or_default().trim();
        if href.is_empty()
            || href.starts_with('#')
            || href.starts_with("javascript:")
            || href.starts_with("mailto:")
            || href.starts_with("tel:")
        {
            continue;
        }

        let resolved = match base {
            Some(b) => b.join(href).ok(),
            None => Url::parse(href).ok(),
        };

        let is_internal = match (resolved.as_ref().and_then(|u| u.host_str()), base_host) {
            (Some(host), Some(base_host)) => strip_www(host) == base_host,
            (Some(_), None) => false,
            (None, _) => true,
        };

        doc.links.push(LinkRef {
            href: href.to_string(),
            is_internal,
        });
    }
}

fn strip_www(host: &str) -> &str {
    host.strip_prefix("www.").unwrap_or(host)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r##"<html lang="en"><head>
<title>Summer Offers</title>
<script type="application/ld+json">
{"@context":"https://schema.org","@graph":[{"@type":"Organization"},{"@type":["WebSite","Thing"]}]}
</script>
<script type="application/ld+json">{ not json</script>
</head><body>
<h1>Summer   Offers</h1><h2>Rooms</h2><h2>Dining</h2>
<img src="/a.png" alt="Pool"><img src="/b.png" alt=""><img src="/c.png">
<a href="/rooms">Rooms</a>
<a href="https://www.example.com/dining">Dining</a>
<a href="https://partner.com/">Partner</a>
<a href="#top">Top</a>
<a href="mailto:hi@example.com">Mail</a>
</body></html>"##;

    #[test]
    fn test_headings_in_level_order() {
        let doc = SeoDocument::parse(PAGE);

        assert_eq!(doc.h1s().collect::<Vec<_>>(), vec!["Summer Offers"]);
        assert_eq!(doc.count_level(2), 2);
    }

    #[test]
    fn test_json_ld_graph_types() {
        let doc = SeoDocument::parse(PAGE);

        assert!(doc.has_json_ld);
        assert_eq!(doc.schema_types, vec!["Organization", "WebSite", "Thing"]);
    }

    #[test]
    fn test_images_alt() {
        let doc = SeoDocument::parse(PAGE);

        assert_eq!(doc.images.len(), 3);
        assert!(doc.images[0].has_alt());
        assert!(!doc.images[1].has_alt());
        assert_eq!(doc.images[2].alt, None);
    }

    #[test]
    fn test_links_classified_against_base() {
        let doc = SeoDocument::parse_with_base(PAGE, "https://example.com/offers");

        assert_eq!(doc.links.len(), 3);
        assert_eq!(doc.internal_link_count(), 2);
        assert_eq!(doc.external_link_count(), 1);
    }

    #[test]
    fn test_links_without_base() {
        let doc = SeoDocument::parse(PAGE);

        assert_eq!(doc.internal_link_count(), 1);
        assert_eq!(doc.external_link_count(), 2);
    }
}
