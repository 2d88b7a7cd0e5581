//! Metadata capture and main-content extraction from fetched markup.

use scraper::{ElementRef, Html, Selector};

use super::PageMetadata;

/// Elements that never carry page content.
const NON_CONTENT: &[&str] = &[
    "script",
    "style",
    "noscript",
    "iframe",
    "template",
    "nav",
    "header",
    "footer",
    "aside",
    ".nav",
    ".navbar",
    ".menu",
    ".sidebar",
    ".advertisement",
    ".ads",
    ".ad-slot",
    "[id*='cookie']",
    "[class*='cookie']",
    "[id*='consent']",
    "[class*='consent']",
    "#onetrust-banner-sdk",
];

/// Main-content containers, most specific first.
const MAIN_CONTAINERS: &[&str] = &[
    "main",
    "article",
    "[role='main']",
    "#content",
    "#main",
    ".content",
    ".main-content",
];

fn first_attr(document: &Html, selector: &str, attr: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    document
        .select(&selector)
        .filter_map(|el| el.value().attr(attr))
        .map(|v| v.trim().to_string())
        .find(|v| !v.is_empty())
}

impl PageMetadata {
    /// Capture metadata from a parsed document.
    pub fn from_document(document: &Html) -> Self {
        let title = Selector::parse("title").ok().and_then(|sel| {
            document
                .select(&sel)
                .next()
                .map(|el| el.text().collect::<String>().trim().to_string())
                .filter(|t| !t.is_empty())
        });

        let mut metadata = Self {
            title,
            description: first_attr(document, r#"meta[name="description"]"#, "content"),
            canonical: first_attr(document, r#"link[rel="canonical"]"#, "href"),
            robots: first_attr(document, r#"meta[name="robots"]"#, "content"),
            viewport: first_attr(document, r#"meta[name="viewport"]"#, "content"),
            lang: first_attr(document, "html", "lang"),
            favicon: first_attr(document, r#"link[rel~="icon"]"#, "href"),
            ..Default::default()
        };

        if let Ok(sel) = Selector::parse(r#"meta[property^="og:"]"#) {
            for el in document.select(&sel) {
                if let (Some(property), Some(content)) = (el.value().attr("property"), el.value().attr("content")) {
                    metadata
                        .open_graph
                        .entry(property.to_lowercase())
                        .or_insert_with(|| content.trim().to_string());
                }
            }
        }

        if let Ok(sel) = Selector::parse(r#"meta[name^="twitter:"], meta[property^="twitter:"]"#) {
            for el in document.select(&sel) {
                let key = el.value().attr("name").or_else(|| el.value().attr("property"));
                if let (Some(key), Some(content)) = (key, el.value().attr("content")) {
                    metadata
                        .twitter
                        .entry(key.to_lowercase())
                        .or_insert_with(|| content.trim().to_string());
                }
            }
        }

        metadata
    }
}

/// Document-level elements and anything wrapping the main content are kept
/// even when a class or id matches a non-content pattern, e.g.
/// `<body class="cookie-consent-pending">`.
fn is_protected(element: ElementRef<'_>) -> bool {
    if matches!(element.value().name(), "html" | "head" | "body" | "main" | "article") {
        return true;
    }
    MAIN_CONTAINERS
        .iter()
        .filter_map(|s| Selector::parse(s).ok())
        .any(|selector| selector.matches(&element) || element.select(&selector).next().is_some())
}

/// Remove non-content elements from a document, returning the remaining markup.
pub fn strip_non_content(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut result = document.html();

    for selector_str in NON_CONTENT {
        if let Ok(selector) = Selector::parse(selector_str) {
            for element in document.select(&selector).filter(|el| !is_protected(*el)) {
                let element_html = element.html();
                result = result.replace(&element_html, "");
            }
        }
    }

    result
}

fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Visible text of the main-content container, falling back to the body.
pub fn main_text(html: &str) -> String {
    let document = Html::parse_document(html);

    for selector_str in MAIN_CONTAINERS {
        if let Ok(selector) = Selector::parse(selector_str) {
            if let Some(main) = document.select(&selector).next() {
                let text = element_text(main);
                if !text.is_empty() {
                    return text;
                }
            }
        }
    }

    Selector::parse("body")
        .ok()
        .and_then(|sel| document.select(&sel).next().map(element_text))
        .unwrap_or_else(|| element_text(document.root_element()))
}

/// Metadata (captured first) and main-content text of a page.
pub fn extract_page(html: &str) -> (PageMetadata, String) {
    let metadata = PageMetadata::from_document(&Html::parse_document(html));
    let text = main_text(&strip_non_content(html));
    (metadata, text)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <title>Summer Offers | Example Hotels</title>
  <meta name="description" content="Save on summer stays.">
  <meta name="robots" content="index, follow">
  <meta name="viewport" content="width=device-width">
  <meta property="og:title" content="Summer Offers">
  <meta name="twitter:card" content="summary">
  <link rel="canonical" href="https://example.com/en/offers">
  <link rel="shortcut icon" href="/favicon.ico">
  <script>var tracking = "ignore me";</script>
</head>
<body>
  <nav>Home About Contact</nav>
  <div class="cookie-banner">We use cookies</div>
  <main><h1>Summer Offers</h1><p>Stay three nights, pay for two.</p></main>
  <footer>Copyright</footer>
</body>
</html>"#;

    #[test]
    fn test_metadata_captured() {
        let (metadata, _) = extract_page(PAGE);

        assert_eq!(metadata.title.as_deref(), Some("Summer Offers | Example Hotels"));
        assert_eq!(metadata.description.as_deref(), Some("Save on summer stays."));
        assert_eq!(metadata.canonical.as_deref(), Some("https://example.com/en/offers"));
        assert_eq!(metadata.lang.as_deref(), Some("en"));
        assert_eq!(metadata.favicon.as_deref(), Some("/favicon.ico"));
        assert_eq!(metadata.open_graph.get("og:title").map(String::as_str), Some("Summer Offers"));
        assert_eq!(metadata.twitter.get("twitter:card").map(String::as_str), Some("summary"));
    }

    #[test]
    fn test_main_text_prefers_main_container() {
        let (_, text) = extract_page(PAGE);

        assert_eq!(text, "Summer Offers\nStay three nights, pay for two.");
    }

    #[test]
    fn test_body_fallback_strips_boilerplate() {
        let html = "<html><body><nav>Menu</nav><p>Real content</p><script>x()</script><footer>Foot</footer></body></html>";
        let text = main_text(&strip_non_content(html));

        assert_eq!(text, "Real content");
    }

    #[test]
    fn test_consent_class_on_body_keeps_page() {
        let html = r#"<html><body class="home cookie-consent-pending"><div id="cookie-notice">We use cookies</div><p>Real offer copy for summer stays.</p></body></html>"#;
        let (_, text) = extract_page(html);

        assert_eq!(text, "Real offer copy for summer stays.");
    }

    #[test]
    fn test_consent_wrapper_around_main_is_kept() {
        let html = r#"<html><body><div class="consent-gate"><main><p>Two nights free in Dubai.</p></main></div></body></html>"#;
        let (_, text) = extract_page(html);

        assert_eq!(text, "Two nights free in Dubai.");
    }
}
