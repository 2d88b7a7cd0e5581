//! Small text helpers shared by the rule engine, validators and segmenter.

use scraper::node::Node;
use scraper::{ElementRef, Html};

/// Elements whose content never reaches the reader.
const HIDDEN: &[&str] = &["script", "style", "noscript", "template"];

/// Elements that start a new line of visible text.
const BLOCKS: &[&str] = &[
    "address", "article", "aside", "blockquote", "br", "dd", "div", "dl", "dt", "figcaption",
    "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li", "main",
    "nav", "ol", "p", "pre", "section", "table", "td", "th", "title", "tr", "ul",
];

/// Slice of `text` covering `radius` characters on either side of
/// `start..end`. Offsets are byte offsets on char boundaries.
pub(crate) fn char_window(text: &str, start: usize, end: usize, radius: usize) -> &str {
    let start = start.min(text.len());
    let end = end.clamp(start, text.len());

    let lo = text[..start]
        .char_indices()
        .rev()
        .take(radius)
        .last()
        .map(|(i, _)| i)
        .unwrap_or(start);
    let hi = text[end..]
        .char_indices()
        .nth(radius)
        .map(|(i, _)| end + i)
        .unwrap_or(text.len());

    &text[lo..hi]
}

/// Collapse runs of whitespace into single spaces.
pub(crate) fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Strip markup to visible text, keeping block boundaries as line breaks.
pub(crate) fn strip_markup(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut text = String::new();
    collect_text(document.root_element(), &mut text);

    text.lines()
        .map(collapse_whitespace)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn collect_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) => {
                let name = el.name();
                if HIDDEN.contains(&name) {
                    continue;
                }
                let block = BLOCKS.contains(&name);
                if block {
                    out.push('\n');
                }
                if let Some(child) = ElementRef::wrap(child) {
                    collect_text(child, out);
                }
                if block {
                    out.push('\n');
                }
            }
            _ => {}
        }
    }
}

/// Visible text of a fragment with whitespace collapsed (link text, alt text).
pub(crate) fn fragment_text(fragment: &str) -> String {
    let document = Html::parse_fragment(fragment);
    let mut text = String::new();
    collect_text(document.root_element(), &mut text);
    collapse_whitespace(&text)
}

/// Truncate to at most `max` characters.
pub(crate) fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((i, _)) => &text[..i],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_char_window_clamps_at_edges() {
        let text = "abcdefghij";
        assert_eq!(char_window(text, 4, 5, 2), "cdefg");
        assert_eq!(char_window(text, 0, 1, 3), "abcd");
        assert_eq!(char_window(text, 9, 10, 3), "ghij");
    }

    #[test]
    fn test_char_window_respects_multibyte_chars() {
        let text = "مرحبا AED500 بكم";
        let start = text.find("AED").unwrap();
        let window = char_window(text, start, start + 6, 3);
        assert_eq!(window, "با AED500 بك");
    }

    #[test]
    fn test_strip_markup_keeps_block_lines() {
        let html = "<html><head><style>p{}</style></head><body><p>Hello &amp; welcome</p><p>Second</p></body></html>";
        assert_eq!(strip_markup(html), "Hello & welcome\nSecond");
    }

    #[test]
    fn test_strip_markup_decodes_numeric_entities() {
        assert_eq!(strip_markup("<p>&#x627;&#1605; &euro;5</p>"), "ام €5");
    }

    #[test]
    fn test_strip_markup_drops_comments() {
        let html = "<p>Live</p><!-- <p>Retired offer 50% off</p> -->";
        assert_eq!(strip_markup(html), "Live");
    }

    #[test]
    fn test_strip_markup_plain_text_lines() {
        assert_eq!(strip_markup("First line\n\n  Second   line "), "First line\nSecond line");
    }

    #[test]
    fn test_fragment_text() {
        assert_eq!(fragment_text("  <b>Book</b>\n now "), "Book now");
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("hello", 3), "hel");
        assert_eq!(truncate_chars("hi", 3), "hi");
    }
}
