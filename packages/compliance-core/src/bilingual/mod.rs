//! Bilingual (Latin / Arabic) content handling.

pub mod script;
pub mod segmenter;
pub mod tagging;

pub use script::{has_rtl_marker, Composition, Script};
pub use segmenter::{detect_languages, split_sections, DetectedLanguages, Sections, SplitMethod};
pub use tagging::{
    group_by_language, tag_issue, tag_issue_with, tag_issues, ContextStrategy, LanguageGroups,
    MatchedTextStrategy, OffsetStrategy, TaggingStrategy,
};
