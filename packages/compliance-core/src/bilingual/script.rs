//! Writing-script classification.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A writing script. Non-Latin letters of any script are grouped with
/// `Arabic`, the secondary audience script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Script {
    Latin,
    Arabic,
}

impl Script {
    /// Language code reported for this script.
    pub fn code(self) -> &'static str {
        match self {
            Script::Latin => "en",
            Script::Arabic => "ar",
        }
    }

    pub fn other(self) -> Script {
        match self {
            Script::Latin => Script::Arabic,
            Script::Arabic => Script::Latin,
        }
    }

    /// Map a declared language tag (`en-US`, `ar`, `fa-IR`) to a script.
    pub fn from_lang_tag(tag: &str) -> Option<Script> {
        let primary = tag
            .trim()
            .split(['-', '_'])
            .next()
            .unwrap_or_default()
            .to_lowercase();

        match primary.as_str() {
            "" => None,
            "ar" | "fa" | "ur" | "he" | "ps" | "ku" => Some(Script::Arabic),
            _ => Some(Script::Latin),
        }
    }

    /// Script of a single character, if it is a letter.
    pub fn of(c: char) -> Option<Script> {
        if is_latin_letter(c) {
            Some(Script::Latin)
        } else if is_non_latin_letter(c) {
            Some(Script::Arabic)
        } else {
            None
        }
    }
}

impl fmt::Display for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

pub fn is_latin_letter(c: char) -> bool {
    c.is_ascii_alphabetic() || (c.is_alphabetic() && ('\u{00C0}'..='\u{024F}').contains(&c))
}

pub fn is_non_latin_letter(c: char) -> bool {
    c.is_alphabetic() && !is_latin_letter(c)
}

/// Explicit right-to-left marks and embeddings.
pub fn has_rtl_marker(text: &str) -> bool {
    if text.contains(['\u{200F}', '\u{202B}', '\u{202E}', '\u{061C}']) {
        return true;
    }
    let lower = text.to_lowercase();
    lower.contains("dir=\"rtl\"") || lower.contains("dir='rtl'")
}

/// Letter counts per script.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Composition {
    pub latin: usize,
    pub non_latin: usize,
}

impl Composition {
    pub fn of(text: &str) -> Self {
        text.chars().fold(Self::default(), |mut acc, c| {
            match Script::of(c) {
                Some(Script::Latin) => acc.latin += 1,
                Some(Script::Arabic) => acc.non_latin += 1,
                None => {}
            }
            acc
        })
    }

    pub fn letters(&self) -> usize {
        self.latin + self.non_latin
    }

    /// Share of non-Latin letters, 0.0 when there are no letters.
    pub fn non_latin_ratio(&self) -> f64 {
        if self.letters() == 0 {
            0.0
        } else {
            self.non_latin as f64 / self.letters() as f64
        }
    }

    /// Script holding at least `threshold` of the letters, if any.
    pub fn dominant(&self, threshold: f64) -> Option<Script> {
        if self.letters() == 0 {
            return None;
        }
        let ratio = self.non_latin_ratio();
        if ratio >= threshold {
            Some(Script::Arabic)
        } else if 1.0 - ratio >= threshold {
            Some(Script::Latin)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_of() {
        assert_eq!(Script::of('a'), Some(Script::Latin));
        assert_eq!(Script::of('é'), Some(Script::Latin));
        assert_eq!(Script::of('م'), Some(Script::Arabic));
        assert_eq!(Script::of('5'), None);
        assert_eq!(Script::of(' '), None);
    }

    #[test]
    fn test_lang_tags() {
        assert_eq!(Script::from_lang_tag("ar-AE"), Some(Script::Arabic));
        assert_eq!(Script::from_lang_tag("en_GB"), Some(Script::Latin));
        assert_eq!(Script::from_lang_tag(""), None);
    }

    #[test]
    fn test_composition_ratio() {
        let c = Composition::of("Hello مرحبا");
        assert_eq!(c.latin, 5);
        assert_eq!(c.non_latin, 5);
        assert!((c.non_latin_ratio() - 0.5).abs() < f64::EPSILON);
        assert_eq!(c.dominant(0.7), None);
        assert_eq!(Composition::of("مرحبا بكم").dominant(0.7), Some(Script::Arabic));
        assert_eq!(Composition::of("1234").dominant(0.7), None);
    }

    #[test]
    fn test_rtl_markers() {
        assert!(has_rtl_marker("<div dir=\"RTL\">"));
        assert!(has_rtl_marker("text \u{200F}"));
        assert!(!has_rtl_marker("plain"));
    }
}
