//! Language detection and primary/secondary section split.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::script::{Composition, Script};
use crate::text::{fragment_text, strip_markup};

lazy_static! {
    static ref HTML_LANG: Regex =
        Regex::new(r#"(?i)<html\b[^>]*?\b(?:xml:)?lang\s*=\s*["']?([a-z]{2,3}(?:[-_][a-z0-9]+)*)"#).unwrap();
    static ref META_LANG: Regex = Regex::new(
        r#"(?i)<meta\b[^>]*http-equiv\s*=\s*["']?content-language["']?[^>]*\bcontent\s*=\s*["']?([a-z]{2,3}(?:[-_][a-z0-9]+)*)"#
    )
    .unwrap();
    static ref SECTION_ANCHOR: Regex = Regex::new(
        r#"(?i)<[a-z][a-z0-9]*\b[^>]*\b(?:id|name)\s*=\s*["']?(?:arabic-section|arabic|ar|secondary)["'\s/>]"#
    )
    .unwrap();
    static ref RTL_ELEMENT: Regex =
        Regex::new(r#"(?i)<([a-z][a-z0-9]*)\b[^>]*\bdir\s*=\s*["']?rtl\b"#).unwrap();
}

/// Languages present in a piece of content, primary first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectedLanguages {
    pub languages: Vec<Script>,
    pub is_bilingual: bool,
}

impl DetectedLanguages {
    fn single(script: Script) -> Self {
        Self {
            languages: vec![script],
            is_bilingual: false,
        }
    }

    fn pair(primary: Script) -> Self {
        Self {
            languages: vec![primary, primary.other()],
            is_bilingual: true,
        }
    }

    pub fn primary(&self) -> Script {
        self.languages.first().copied().unwrap_or(Script::Latin)
    }

    pub fn secondary(&self) -> Option<Script> {
        self.languages.get(1).copied()
    }

    /// Reported language codes, e.g. `["en", "ar"]`.
    pub fn codes(&self) -> Vec<String> {
        self.languages.iter().map(|s| s.code().to_string()).collect()
    }
}

/// Declared document language, if any.
fn declared_script(content: &str) -> Option<Script> {
    HTML_LANG
        .captures(content)
        .or_else(|| META_LANG.captures(content))
        .and_then(|caps| caps.get(1))
        .and_then(|m| Script::from_lang_tag(m.as_str()))
}

/// First character offset of each script in `text`.
fn first_offsets(text: &str) -> (Option<usize>, Option<usize>) {
    let mut latin = None;
    let mut non_latin = None;

    for (i, c) in text.char_indices() {
        match Script::of(c) {
            Some(Script::Latin) if latin.is_none() => latin = Some(i),
            Some(Script::Arabic) if non_latin.is_none() => non_latin = Some(i),
            _ => {}
        }
        if latin.is_some() && non_latin.is_some() {
            break;
        }
    }

    (latin, non_latin)
}

/// Detect which scripts appear in `content` (markup or plain text).
pub fn detect_languages(content: &str) -> DetectedLanguages {
    let body = strip_markup(content);
    let (latin, non_latin) = first_offsets(&body);

    if let Some(declared) = declared_script(content) {
        let other_present = match declared {
            Script::Latin => non_latin.is_some(),
            Script::Arabic => latin.is_some(),
        };
        debug!(declared = %declared, other_present, "Using declared document language");
        return if other_present {
            DetectedLanguages::pair(declared)
        } else {
            DetectedLanguages::single(declared)
        };
    }

    match (latin, non_latin) {
        (Some(l), Some(n)) if n < l => DetectedLanguages::pair(Script::Arabic),
        (Some(_), Some(_)) => DetectedLanguages::pair(Script::Latin),
        (None, Some(_)) => DetectedLanguages::single(Script::Arabic),
        _ => DetectedLanguages::single(Script::Latin),
    }
}

/// How the section boundary was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitMethod {
    /// Named anchor such as `id="arabic"`
    Anchor,
    /// Element carrying `dir="rtl"`
    RtlAttribute,
    /// First line written in the other script
    LineScan,
    /// No secondary section found
    None,
}

/// Content split into primary and secondary language blocks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sections {
    pub primary: String,
    pub secondary: String,
    /// Byte offset in the original content where the secondary block starts.
    pub split_offset: Option<usize>,
    pub method: SplitMethod,
    /// Script of the block before the split.
    pub leading_script: Script,
    /// Script the report treats as primary. Defaults to `leading_script`.
    pub primary_script: Script,
}

impl Sections {
    fn unsplit(content: &str, leading_script: Script) -> Self {
        Self {
            primary: content.to_string(),
            secondary: String::new(),
            split_offset: None,
            method: SplitMethod::None,
            leading_script,
            primary_script: leading_script,
        }
    }

    fn at(content: &str, offset: usize, method: SplitMethod, leading_script: Script) -> Self {
        Self {
            primary: content[..offset].to_string(),
            secondary: content[offset..].to_string(),
            split_offset: Some(offset),
            method,
            leading_script,
            primary_script: leading_script,
        }
    }

    /// Align with the document's detected primary language, so that
    /// `Primary` tags mean the same audience as the reported language order.
    pub fn with_primary(mut self, primary: Script) -> Self {
        self.primary_script = primary;
        self
    }

    pub fn secondary_script(&self) -> Script {
        self.primary_script.other()
    }

    /// Script of the block containing byte `position`.
    pub fn script_at(&self, position: usize) -> Script {
        match self.split_offset {
            Some(split) if position >= split => self.leading_script.other(),
            _ => self.leading_script,
        }
    }

    pub fn is_split(&self) -> bool {
        self.split_offset.is_some()
    }
}

/// Majority script of the visible text in `content`, `None` without letters.
fn majority_script(content: &str) -> Option<Script> {
    let composition = Composition::of(&strip_markup(content));
    if composition.letters() == 0 {
        return None;
    }
    Some(if composition.non_latin > composition.latin {
        Script::Arabic
    } else {
        Script::Latin
    })
}

/// Split content into primary and secondary blocks.
///
/// Tries, in order: a named section anchor, an element with `dir="rtl"`
/// (other than `<html>`/`<body>`) that follows Latin copy, then a line scan.
/// A marker with no visible text before it opens the document rather than
/// separating two blocks, so it is passed over.
pub fn split_sections(html: &str) -> Sections {
    if let Some(m) = SECTION_ANCHOR.find(html) {
        if let Some(leading) = majority_script(&html[..m.start()]) {
            debug!(offset = m.start(), leading = %leading, "Split at named section anchor");
            return Sections::at(html, m.start(), SplitMethod::Anchor, leading);
        }
    }

    let rtl = RTL_ELEMENT.captures_iter(html).find(|caps| {
        caps.get(1)
            .is_some_and(|tag| !tag.as_str().eq_ignore_ascii_case("html") && !tag.as_str().eq_ignore_ascii_case("body"))
    });
    if let Some(m) = rtl.and_then(|caps| caps.get(0)) {
        if majority_script(&html[..m.start()]) == Some(Script::Latin) {
            debug!(offset = m.start(), "Split at dir=rtl element");
            return Sections::at(html, m.start(), SplitMethod::RtlAttribute, Script::Latin);
        }
    }

    line_scan(html)
}

/// Start the secondary block at the first line written in the other script.
///
/// After Latin copy, any non-Latin letter starts the secondary block. After
/// non-Latin copy, a line must be mostly Latin, since Arabic copy embeds
/// Latin brand names.
fn line_scan(html: &str) -> Sections {
    let mut first: Option<Script> = None;
    let mut offset = 0;

    for line in html.split_inclusive('\n') {
        let visible = fragment_text(line);
        let composition = Composition::of(&visible);

        if composition.letters() > 0 {
            match first {
                None => {
                    first = Some(if composition.non_latin > composition.latin {
                        Script::Arabic
                    } else {
                        Script::Latin
                    });
                }
                Some(Script::Latin) if composition.non_latin > 0 => {
                    return Sections::at(html, offset, SplitMethod::LineScan, Script::Latin);
                }
                Some(Script::Arabic) if composition.latin > composition.non_latin => {
                    return Sections::at(html, offset, SplitMethod::LineScan, Script::Arabic);
                }
                _ => {}
            }
        }

        offset += line.len();
    }

    Sections::unsplit(html, first.unwrap_or(Script::Latin))
}
