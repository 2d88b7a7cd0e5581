//! Source positions for parsed markup.
//!
//! `scraper` gives us attributes and text with entities decoded, but no
//! byte offsets. Issues have to point back into the markup the user
//! uploaded, so a forward scan over the source finds each live start tag
//! (outside comments, raw-text elements and quoted attribute values) and
//! pairs it, in document order, with the element the parser produced.

use std::ops::Range;

use lazy_static::lazy_static;
use scraper::{ElementRef, Html, Selector};

lazy_static! {
    static ref ANCHOR: Selector = Selector::parse("a").unwrap();
    static ref IMAGE: Selector = Selector::parse("img").unwrap();
}

/// Elements whose content the parser treats as text, not markup.
const RAW_TEXT: &[&str] = &[
    "script", "style", "textarea", "title", "noscript", "xmp", "iframe", "noembed", "noframes",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Tag {
    Anchor,
    Image,
}

impl Tag {
    fn name(self) -> &'static str {
        match self {
            Tag::Anchor => "a",
            Tag::Image => "img",
        }
    }

    fn selector(self) -> &'static Selector {
        match self {
            Tag::Anchor => &ANCHOR,
            Tag::Image => &IMAGE,
        }
    }

    fn is_void(self) -> bool {
        matches!(self, Tag::Image)
    }
}

/// A parsed element and, when it could be matched to the source, the byte
/// range it occupies there.
pub(crate) struct Located<'a> {
    pub element: ElementRef<'a>,
    pub span: Option<Range<usize>>,
}

/// Every `tag` element of `document`, paired with its source span.
///
/// Elements the parser synthesized (misnested markup) have no span.
pub(crate) fn locate<'a>(document: &'a Html, source: &str, tag: Tag) -> Vec<Located<'a>> {
    let starts = start_tags(source, tag.name());

    let spans = starts.iter().enumerate().map(|(i, start)| {
        if tag.is_void() {
            return start.clone();
        }
        let limit = starts.get(i + 1).map_or(source.len(), |next| next.start);
        let end = closing_tag_end(source, start.end, limit, tag.name()).unwrap_or(start.end);
        start.start..end
    });

    let mut spans = spans.collect::<Vec<_>>().into_iter();
    document
        .select(tag.selector())
        .map(|element| Located {
            element,
            span: spans.next(),
        })
        .collect()
}

/// Byte ranges of text between tags, outside comments and raw-text elements.
pub(crate) fn text_ranges(source: &str) -> Vec<Range<usize>> {
    let mut ranges = Vec::new();
    let mut text_start = 0;

    scan(source, |token| {
        if token.start > text_start {
            ranges.push(text_start..token.start);
        }
        text_start = token.end;
    });

    if text_start < source.len() {
        ranges.push(text_start..source.len());
    }
    ranges
}

/// Start-tag ranges of `name` elements, in source order.
fn start_tags(source: &str, name: &str) -> Vec<Range<usize>> {
    let mut found = Vec::new();
    scan(source, |token| {
        if token.kind == TokenKind::StartTag && token.name.eq_ignore_ascii_case(name) {
            found.push(token.start..token.tag_end);
        }
    });
    found
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokenKind {
    StartTag,
    EndTag,
    /// Comment, doctype or processing instruction
    Other,
}

/// One non-text token. `end` includes any raw-text content after a start
/// tag; `tag_end` is the end of the tag itself.
struct Token<'a> {
    kind: TokenKind,
    name: &'a str,
    start: usize,
    tag_end: usize,
    end: usize,
}

fn scan<'s>(source: &'s str, mut visit: impl FnMut(Token<'s>)) {
    let bytes = source.as_bytes();
    let mut i = 0;

    while let Some(offset) = source[i..].find('<') {
        let start = i + offset;
        let rest = &source[start..];

        if rest.starts_with("<!--") {
            let end = rest[4..].find("-->").map_or(source.len(), |e| start + 4 + e + 3);
            visit(Token {
                kind: TokenKind::Other,
                name: "",
                start,
                tag_end: end,
                end,
            });
            i = end;
            continue;
        }

        let next = bytes.get(start + 1).copied();
        let (kind, name_start) = match next {
            Some(b'/') => (TokenKind::EndTag, start + 2),
            Some(b'!' | b'?') => (TokenKind::Other, start + 1),
            Some(c) if c.is_ascii_alphabetic() => (TokenKind::StartTag, start + 1),
            _ => {
                i = start + 1;
                continue;
            }
        };

        let name_len = source[name_start..]
            .bytes()
            .take_while(|b| b.is_ascii_alphanumeric() || *b == b'-')
            .count();
        let name = &source[name_start..name_start + name_len];
        let tag_end = tag_end(source, start);

        let end = if kind == TokenKind::StartTag
            && RAW_TEXT.iter().any(|raw| raw.eq_ignore_ascii_case(name))
        {
            closing_tag_end(source, tag_end, source.len(), name).unwrap_or(source.len())
        } else {
            tag_end
        };

        visit(Token {
            kind,
            name,
            start,
            tag_end,
            end,
        });
        i = end.max(start + 1);
    }
}

/// End (exclusive) of the tag opening at `start`, skipping `>` inside
/// quoted attribute values.
fn tag_end(source: &str, start: usize) -> usize {
    let mut quote = None;
    for (i, b) in source.as_bytes()[start..].iter().enumerate() {
        match (quote, *b) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, b'"' | b'\'') => quote = Some(*b),
            (None, b'>') => return start + i + 1,
            _ => {}
        }
    }
    source.len()
}

/// End of the first `</name>` in `from..limit`.
fn closing_tag_end(source: &str, from: usize, limit: usize, name: &str) -> Option<usize> {
    let window = source.get(from..limit)?.to_ascii_lowercase();
    let needle = format!("</{}", name.to_ascii_lowercase());

    let mut search = 0;
    while let Some(offset) = window[search..].find(&needle) {
        let at = search + offset;
        let after = window.as_bytes().get(at + needle.len()).copied();
        if after.map_or(true, |b| b == b'>' || b == b'/' || b.is_ascii_whitespace()) {
            return Some(tag_end(source, from + at));
        }
        search = at + needle.len();
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spans(source: &str, tag: Tag) -> Vec<Option<&str>> {
        let document = Html::parse_fragment(source);
        locate(&document, source, tag)
            .into_iter()
            .map(|l| l.span.map(|s| &source[s]))
            .collect()
    }

    #[test]
    fn test_anchor_spans_skip_comments_and_scripts() {
        let source = r##"<!-- <a href="#">old</a> --><script>var s = "<a href='x'>";</script><p><a href="/a">A</a> <A HREF="/b">B</A></p>"##;

        assert_eq!(
            spans(source, Tag::Anchor),
            vec![Some(r#"<a href="/a">A</a>"#), Some(r#"<A HREF="/b">B</A>"#)]
        );
    }

    #[test]
    fn test_quoted_angle_brackets() {
        let source = r#"<img alt="a > b" src="x.png"><a title="<a>" href="/y">Y</a>"#;

        assert_eq!(spans(source, Tag::Image), vec![Some(r#"<img alt="a > b" src="x.png">"#)]);
        assert_eq!(spans(source, Tag::Anchor), vec![Some(r#"<a title="<a>" href="/y">Y</a>"#)]);
    }

    #[test]
    fn test_abbr_is_not_anchor_close() {
        let source = "<a href=\"/x\">Read <abbr>FAQ</abbr></a>";

        assert_eq!(spans(source, Tag::Anchor), vec![Some(source)]);
    }

    #[test]
    fn test_text_ranges() {
        let source = r#"<p style="width:300px">Win 1500000</p><!-- 99999 --><b>ok</b>"#;
        let texts: Vec<&str> = text_ranges(source).into_iter().map(|r| &source[r]).collect();

        assert_eq!(texts, vec!["Win 1500000", "ok"]);
    }

    #[test]
    fn test_plain_text_is_one_range() {
        let source = "Prices < 500 and > 100";
        assert_eq!(text_ranges(source), vec![0..source.len()]);
    }
}
