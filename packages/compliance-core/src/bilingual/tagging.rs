//! Assigning issues to a language audience.
//!
//! Tagging is a prioritized chain of strategies. The first strategy that
//! returns a tag wins; if none does, the issue is tagged `Both`.

use super::script::{Composition, Script};
use super::segmenter::Sections;
use crate::types::{Issue, LanguageCounts, LanguageTag};

/// Share of letters a script must hold for a snippet to count as that script.
pub const DOMINANCE_THRESHOLD: f64 = 0.7;

/// One way of deciding which audience an issue belongs to.
pub trait TaggingStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// `None` means this strategy cannot decide.
    fn tag(&self, issue: &Issue, sections: &Sections, full_content: &str) -> Option<LanguageTag>;
}

fn tag_for_script(script: Script, sections: &Sections) -> LanguageTag {
    if script == sections.primary_script {
        LanguageTag::Primary
    } else {
        LanguageTag::Secondary
    }
}

/// Uses the issue's recorded offset: the block it falls in decides its script.
pub struct OffsetStrategy;

impl TaggingStrategy for OffsetStrategy {
    fn name(&self) -> &'static str {
        "offset"
    }

    fn tag(&self, issue: &Issue, sections: &Sections, full_content: &str) -> Option<LanguageTag> {
        sections.split_offset?;
        let position = issue.position?;
        if position >= full_content.len() {
            return None;
        }

        Some(tag_for_script(sections.script_at(position), sections))
    }
}

/// Uses the script composition of the issue's context snippet.
pub struct ContextStrategy;

impl TaggingStrategy for ContextStrategy {
    fn name(&self) -> &'static str {
        "context"
    }

    fn tag(&self, issue: &Issue, sections: &Sections, _full_content: &str) -> Option<LanguageTag> {
        let context = issue.context.as_deref()?;
        Composition::of(context)
            .dominant(DOMINANCE_THRESHOLD)
            .map(|script| tag_for_script(script, sections))
    }
}

/// Uses the script composition of the matched text itself.
pub struct MatchedTextStrategy;

impl TaggingStrategy for MatchedTextStrategy {
    fn name(&self) -> &'static str {
        "matched_text"
    }

    fn tag(&self, issue: &Issue, sections: &Sections, _full_content: &str) -> Option<LanguageTag> {
        let text = issue.found.as_deref().unwrap_or(&issue.original);
        Composition::of(text)
            .dominant(DOMINANCE_THRESHOLD)
            .map(|script| tag_for_script(script, sections))
    }
}

/// The default chain: offset, then context, then matched text.
pub fn default_strategies() -> [&'static dyn TaggingStrategy; 3] {
    [&OffsetStrategy, &ContextStrategy, &MatchedTextStrategy]
}

/// Resolve the audience of one issue. Falls back to `Both`.
pub fn tag_issue(issue: &Issue, sections: &Sections, full_content: &str) -> LanguageTag {
    tag_issue_with(&default_strategies(), issue, sections, full_content)
}

/// Resolve with a custom strategy chain.
pub fn tag_issue_with(
    strategies: &[&dyn TaggingStrategy],
    issue: &Issue,
    sections: &Sections,
    full_content: &str,
) -> LanguageTag {
    strategies
        .iter()
        .find_map(|s| s.tag(issue, sections, full_content))
        .unwrap_or(LanguageTag::Both)
}

/// Tag a batch in place. Single-language content tags everything primary.
pub fn tag_issues(issues: &mut [Issue], sections: &Sections, full_content: &str, is_bilingual: bool) {
    for issue in issues.iter_mut() {
        issue.language = if is_bilingual {
            tag_issue(issue, sections, full_content)
        } else {
            LanguageTag::Primary
        };
    }
}

/// Issues partitioned by audience.
#[derive(Debug, Default)]
pub struct LanguageGroups<'a> {
    pub primary: Vec<&'a Issue>,
    pub secondary: Vec<&'a Issue>,
    pub both: Vec<&'a Issue>,
}

impl LanguageGroups<'_> {
    pub fn counts(&self) -> LanguageCounts {
        LanguageCounts {
            primary: self.primary.len(),
            secondary: self.secondary.len(),
            both: self.both.len(),
        }
    }
}

pub fn group_by_language<'a>(issues: impl IntoIterator<Item = &'a Issue>) -> LanguageGroups<'a> {
    let mut groups = LanguageGroups::default();
    for issue in issues {
        match issue.language {
            LanguageTag::Primary => groups.primary.push(issue),
            LanguageTag::Secondary => groups.secondary.push(issue),
            LanguageTag::Both => groups.both.push(issue),
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bilingual::split_sections;
    use crate::types::Severity;

    const CONTENT: &str = "Welcome to the sale\nClick here now\nمرحبا بكم في التخفيضات\nاضغط هنا";

    fn issue() -> Issue {
        Issue::new("r", "brand", Severity::Low, "m", "x")
    }

    #[test]
    fn test_offset_strategy_uses_split() {
        let sections = split_sections(CONTENT);
        let split = sections.split_offset.unwrap();

        let before = issue().at(3, 2);
        let after = issue().at(split + 2, 2);

        assert_eq!(tag_issue(&before, &sections, CONTENT), LanguageTag::Primary);
        assert_eq!(tag_issue(&after, &sections, CONTENT), LanguageTag::Secondary);
    }

    #[test]
    fn test_offset_strategy_follows_reported_primary() {
        let sections = split_sections(CONTENT).with_primary(Script::Arabic);
        let split = sections.split_offset.unwrap();

        let latin = issue().at(3, 2);
        let arabic = issue().at(split + 2, 2);

        assert_eq!(tag_issue(&latin, &sections, CONTENT), LanguageTag::Secondary);
        assert_eq!(tag_issue(&arabic, &sections, CONTENT), LanguageTag::Primary);
    }

    #[test]
    fn test_offset_out_of_range_falls_through() {
        let sections = split_sections(CONTENT);
        let stray = issue().at(CONTENT.len() + 10, 1);
        assert_eq!(OffsetStrategy.tag(&stray, &sections, CONTENT), None);
    }

    #[test]
    fn test_context_strategy() {
        let sections = split_sections(CONTENT);
        let arabic = issue().with_context("مرحبا بكم في التخفيضات");
        let mixed = issue().with_context("Hello مرحبا");

        assert_eq!(ContextStrategy.tag(&arabic, &sections, CONTENT), Some(LanguageTag::Secondary));
        assert_eq!(ContextStrategy.tag(&mixed, &sections, CONTENT), None);
    }

    #[test]
    fn test_matched_text_strategy() {
        let sections = split_sections(CONTENT);
        let latin = Issue::new("r", "brand", Severity::Low, "m", "Click here");

        assert_eq!(
            MatchedTextStrategy.tag(&latin, &sections, CONTENT),
            Some(LanguageTag::Primary)
        );
    }

    #[test]
    fn test_default_is_both() {
        let sections = split_sections(CONTENT);
        let undecidable = Issue::new("r", "brand", Severity::Low, "m", "12345");
        assert_eq!(tag_issue(&undecidable, &sections, CONTENT), LanguageTag::Both);
    }

    #[test]
    fn test_single_language_tags_primary() {
        let sections = split_sections("Only English");
        let mut issues = vec![Issue::new("r", "brand", Severity::Low, "m", "!!!")];

        tag_issues(&mut issues, &sections, "Only English", false);

        assert_eq!(issues[0].language, LanguageTag::Primary);
    }

    #[test]
    fn test_group_counts() {
        let issues = vec![
            issue().with_language(LanguageTag::Primary),
            issue().with_language(LanguageTag::Secondary),
            issue().with_language(LanguageTag::Secondary),
            issue(),
        ];

        let counts = group_by_language(&issues).counts();

        assert_eq!(counts, LanguageCounts { primary: 1, secondary: 2, both: 1 });
    }
}
