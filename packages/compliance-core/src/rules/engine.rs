//! Rule compilation and evaluation.
//!
//! A [`RuleSet`] is an immutable, compiled snapshot. The [`RuleEngine`]
//! handle owns the active snapshot behind `RwLock<Arc<_>>`: readers clone
//! the `Arc` and drop the lock immediately, so a reload swaps the pointer
//! without ever blocking or mutating an evaluation already in flight.

use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};

use regex::{Match, Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::Windows;
use crate::error::RuleConfigError;
use crate::text::{char_window, collapse_whitespace};
use crate::types::{ContentType, Issue, Rule};

/// Outcome of loading a rule list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadSummary {
    pub loaded: usize,
    pub skipped: Vec<SkippedRule>,
}

/// A rule that was dropped at load time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedRule {
    pub rule_id: String,
    pub reason: String,
}

#[derive(Debug)]
struct CompiledRule {
    rule: Rule,
    regex: Regex,
}

impl CompiledRule {
    fn compile(rule: Rule) -> Result<Self, RuleConfigError> {
        let regex = RegexBuilder::new(&rule.pattern)
            .case_insensitive(rule.case_insensitive)
            .build()
            .map_err(|source| RuleConfigError::InvalidPattern {
                rule_id: rule.id.clone(),
                source,
            })?;
        Ok(Self { rule, regex })
    }

    fn issue_for(&self, text: &str, m: Match<'_>, context_radius: usize) -> Issue {
        let rule = &self.rule;
        let snippet = m.as_str();

        let message = rule
            .message
            .clone()
            .unwrap_or_else(|| format!("{}: \"{}\" should be revised", rule.category, snippet));

        let suggestion = match (&rule.replacement, &rule.suggestion) {
            (Some(replacement), _) => Some(self.regex.replace(snippet, replacement.as_str()).into_owned()),
            (None, Some(suggestion)) => Some(suggestion.clone()),
            (None, None) => None,
        };

        let context = collapse_whitespace(char_window(text, m.start(), m.end(), context_radius));

        let mut issue = Issue::new(&rule.id, &rule.category, rule.severity, message, snippet)
            .at(m.start(), m.len())
            .with_context(context)
            .with_found(snippet);
        issue.suggestion = suggestion;
        issue
    }
}

/// An immutable, compiled rule-set.
#[derive(Debug, Default)]
pub struct RuleSet {
    rules: Vec<CompiledRule>,
    windows: Windows,
}

impl RuleSet {
    /// Compile rules, skipping (and logging) any whose pattern is invalid.
    pub fn compile(rules: impl IntoIterator<Item = Rule>, windows: Windows) -> (Self, LoadSummary) {
        let mut compiled = Vec::new();
        let mut summary = LoadSummary::default();

        for rule in rules {
            match CompiledRule::compile(rule) {
                Ok(c) => compiled.push(c),
                Err(RuleConfigError::InvalidPattern { rule_id, source }) => {
                    warn!(rule_id = %rule_id, error = %source, "Skipping rule with invalid pattern");
                    summary.skipped.push(SkippedRule {
                        rule_id,
                        reason: source.to_string(),
                    });
                }
                Err(e) => {
                    warn!(error = %e, "Skipping rule");
                }
            }
        }

        summary.loaded = compiled.len();
        (
            Self {
                rules: compiled,
                windows,
            },
            summary,
        )
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Ids of the compiled rules, in evaluation order.
    pub fn rule_ids(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(|c| c.rule.id.as_str())
    }

    /// Evaluate every applicable rule against `text`.
    ///
    /// Pure: the same (rule-set, text, content type) always yields the
    /// same issues in the same order.
    pub fn evaluate(&self, text: &str, content_type: &ContentType) -> Vec<Issue> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        let mut issues = Vec::new();

        for compiled in self.rules.iter().filter(|c| c.rule.applies(content_type)) {
            for m in compiled.regex.find_iter(text) {
                if m.as_str().is_empty() {
                    continue;
                }

                if let Some(exception) = self.vetoing_exception(text, &m, &compiled.rule) {
                    debug!(
                        rule_id = %compiled.rule.id,
                        exception = %exception,
                        position = m.start(),
                        "Match suppressed by context exception"
                    );
                    continue;
                }

                issues.push(compiled.issue_for(text, m, self.windows.issue_context_radius));
            }
        }

        issues
    }

    fn vetoing_exception<'r>(&self, text: &str, m: &Match<'_>, rule: &'r Rule) -> Option<&'r str> {
        if rule.context_exceptions.is_empty() {
            return None;
        }

        let window = char_window(text, m.start(), m.end(), self.windows.exception_radius).to_lowercase();

        rule.context_exceptions
            .iter()
            .filter(|e| !e.trim().is_empty())
            .find(|e| window.contains(&e.to_lowercase()))
            .map(String::as_str)
    }
}

/// On-disk rule file: a bare array or `{ "rules": [...] }`.
#[derive(Deserialize)]
#[serde(untagged)]
enum RuleFile {
    List(Vec<Rule>),
    Wrapped { rules: Vec<Rule> },
}

impl RuleFile {
    fn into_rules(self) -> Vec<Rule> {
        match self {
            RuleFile::List(rules) | RuleFile::Wrapped { rules } => rules,
        }
    }
}

/// Injectable handle to the active rule-set.
#[derive(Debug)]
pub struct RuleEngine {
    active: RwLock<Arc<RuleSet>>,
    windows: Windows,
}

impl Default for RuleEngine {
    fn default() -> Self {
        Self::empty()
    }
}

impl RuleEngine {
    /// Engine with no rules.
    pub fn empty() -> Self {
        Self::with_windows(Vec::new(), Windows::default())
    }

    /// Engine with the given rules and default windows.
    pub fn new(rules: Vec<Rule>) -> Self {
        Self::with_windows(rules, Windows::default())
    }

    /// Engine loaded with the built-in catalogue.
    pub fn with_default_rules() -> Self {
        Self::new(super::catalogue::default_rules())
    }

    /// Engine with custom context windows.
    pub fn with_windows(rules: Vec<Rule>, windows: Windows) -> Self {
        let (set, _) = RuleSet::compile(rules, windows);
        Self {
            active: RwLock::new(Arc::new(set)),
            windows,
        }
    }

    /// Replace the active rule-set. Invalid patterns are skipped.
    pub fn load(&self, rules: Vec<Rule>) -> LoadSummary {
        let (set, summary) = RuleSet::compile(rules, self.windows);
        let set = Arc::new(set);

        *self.active.write().unwrap_or_else(PoisonError::into_inner) = set;

        info!(
            loaded = summary.loaded,
            skipped = summary.skipped.len(),
            "Rule-set reloaded"
        );
        summary
    }

    /// Replace the active rule-set from a JSON file.
    ///
    /// If the file cannot be read or parsed, the current rule-set stays
    /// active and the error is returned for reporting.
    pub fn load_from_path(&self, path: impl AsRef<Path>) -> Result<LoadSummary, RuleConfigError> {
        let path = path.as_ref();

        let raw = std::fs::read_to_string(path).map_err(|source| {
            let err = RuleConfigError::Io {
                path: path.to_path_buf(),
                source,
            };
            warn!(error = %err, "Keeping previous rule-set");
            err
        })?;

        let file: RuleFile = serde_json::from_str(&raw).map_err(|source| {
            let err = RuleConfigError::Parse {
                path: path.to_path_buf(),
                source,
            };
            warn!(error = %err, "Keeping previous rule-set");
            err
        })?;

        Ok(self.load(file.into_rules()))
    }

    /// The active rule-set. Holders keep a consistent view across reloads.
    pub fn snapshot(&self) -> Arc<RuleSet> {
        self.active
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Evaluate against the active rule-set.
    pub fn evaluate(&self, text: &str, content_type: &ContentType) -> Vec<Issue> {
        self.snapshot().evaluate(text, content_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Severity;

    fn guarantee_rule() -> Rule {
        Rule::new("legal_guarantee", "legal", Severity::High, r"\bguaranteed?\b")
            .with_suggestion("Avoid absolute guarantees")
            .with_exceptions(["terms and conditions apply"])
    }

    #[test]
    fn test_evaluate_is_deterministic() {
        let engine = RuleEngine::new(vec![
            guarantee_rule(),
            Rule::new("spelling_receive", "spelling", Severity::Low, r"\brecieve\b")
                .with_replacement("receive"),
        ]);
        let text = "Recieve a guaranteed return. We guarantee it. You will recieve more.";

        let first = engine.evaluate(text, &ContentType::Edm);
        let second = engine.evaluate(text, &ContentType::Edm);

        assert_eq!(first, second);
        assert_eq!(first.len(), 4);
    }

    #[test]
    fn test_context_exception_vetoes_nearby_match_only() {
        let engine = RuleEngine::new(vec![guarantee_rule()]);
        let filler = "x".repeat(150);
        let text = format!(
            "Guaranteed savings. Terms and conditions apply. {} We guarantee delivery.",
            filler
        );

        let issues = engine.evaluate(&text, &ContentType::Edm);

        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].original, "guarantee");
    }

    #[test]
    fn test_replacement_expands_capture_groups() {
        let engine = RuleEngine::new(vec![Rule::new(
            "brand_exclamation",
            "brand",
            Severity::Medium,
            r"(\w+)!{2,}",
        )
        .with_replacement("$1!")]);

        let issues = engine.evaluate("Hurry!!! Sale ends", &ContentType::Edm);

        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].suggestion.as_deref(), Some("Hurry!"));
        assert_eq!(issues[0].position, Some(0));
        assert_eq!(issues[0].length, Some(8));
    }

    #[test]
    fn test_applies_to_filters_rules() {
        let engine = RuleEngine::new(vec![
            Rule::new("font_comic", "brand", Severity::Medium, "comic sans").applies_to([ContentType::Edm]),
        ]);

        assert_eq!(engine.evaluate("font: Comic Sans", &ContentType::Edm).len(), 1);
        assert!(engine.evaluate("font: Comic Sans", &ContentType::Webpage).is_empty());
    }

    #[test]
    fn test_invalid_pattern_is_skipped_not_fatal() {
        let engine = RuleEngine::empty();
        let summary = engine.load(vec![
            Rule::new("broken", "brand", Severity::Low, "(unclosed"),
            guarantee_rule(),
        ]);

        assert_eq!(summary.loaded, 1);
        assert_eq!(summary.skipped.len(), 1);
        assert_eq!(summary.skipped[0].rule_id, "broken");
        assert_eq!(engine.evaluate("guaranteed", &ContentType::Edm).len(), 1);
    }

    #[test]
    fn test_empty_text_short_circuits() {
        let engine = RuleEngine::new(vec![Rule::new("any", "brand", Severity::Low, ".*")]);
        assert!(engine.evaluate("   \n", &ContentType::Edm).is_empty());
    }

    #[test]
    fn test_snapshot_survives_reload() {
        let engine = RuleEngine::new(vec![guarantee_rule()]);
        let before = engine.snapshot();

        engine.load(vec![]);

        assert_eq!(before.evaluate("guaranteed", &ContentType::Edm).len(), 1);
        assert!(engine.evaluate("guaranteed", &ContentType::Edm).is_empty());
    }

    #[test]
    fn test_load_from_missing_path_keeps_rules() {
        let engine = RuleEngine::new(vec![guarantee_rule()]);

        let result = engine.load_from_path("/definitely/not/here/rules.json");

        assert!(matches!(result, Err(RuleConfigError::Io { .. })));
        assert_eq!(engine.snapshot().len(), 1);
    }

    #[test]
    fn test_load_from_path_accepts_wrapped_file() {
        let path = std::env::temp_dir().join(format!("rules-{}.json", uuid::Uuid::new_v4()));
        std::fs::write(
            &path,
            r#"{"rules": [{"id": "legal_free", "category": "legal", "severity": "high", "pattern": "risk[- ]free"}]}"#,
        )
        .unwrap();

        let engine = RuleEngine::empty();
        let summary = engine.load_from_path(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(summary.loaded, 1);
        assert_eq!(engine.evaluate("A risk-free trial", &ContentType::Webpage).len(), 1);
    }

    #[test]
    fn test_concurrent_evaluation_during_reload() {
        let engine = Arc::new(RuleEngine::new(vec![guarantee_rule()]));
        let mut handles = Vec::new();

        for i in 0..8 {
            let engine = engine.clone();
            handles.push(std::thread::spawn(move || {
                for _ in 0..50 {
                    if i % 4 == 0 {
                        engine.load(vec![guarantee_rule()]);
                    }
                    let issues = engine.evaluate("guaranteed", &ContentType::Edm);
                    assert_eq!(issues.len(), 1);
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }
    }
}
