//! Built-in rule catalogue.
//!
//! Deployments normally load their own JSON rule file; these defaults
//! cover the common legal, brand and spelling checks so an engine is
//! useful out of the box. Rule ids prefixed with `merge_`, `font_`,
//! `brand_color_` or `staging_` are template-only and are excluded from
//! public-URL checks.

use crate::types::{ContentType, Rule, Severity};

pub fn default_rules() -> Vec<Rule> {
    vec![
        Rule::new("legal_guarantee_claim", "legal", Severity::High, r"\bguarantee[ds]?\b")
            .with_message("Absolute guarantee claims need legal approval")
            .with_suggestion("Qualify the claim or reference the applicable terms")
            .with_exceptions([
                "terms and conditions",
                "t&cs apply",
                "subject to",
                "money-back guarantee policy",
            ]),
        Rule::new("legal_risk_free", "legal", Severity::High, r"\brisk[- ]free\b")
            .with_message("\"Risk-free\" is a regulated claim")
            .with_suggestion("Describe the actual cancellation or refund terms"),
        Rule::new(
            "legal_best_in_market",
            "legal",
            Severity::Medium,
            r"\b(the )?(best|cheapest|lowest) (price|rate)s? in the (market|country|region)\b",
        )
        .with_message("Comparative superlatives must be substantiated")
        .with_exceptions(["source:", "according to", "*based on"]),
        Rule::new("brand_exclamation_overuse", "brand", Severity::Medium, r"(\w+)!{2,}")
            .with_replacement("$1!")
            .with_message("Use at most one exclamation mark"),
        Rule::new("brand_all_caps_shouting", "brand", Severity::Low, r"\b[A-Z]{6,}(?:\s+[A-Z]{4,}){2,}\b")
            .case_sensitive()
            .with_message("Avoid long runs of capitals")
            .with_suggestion("Use sentence case for emphasis"),
        Rule::new("tone_urgency_pressure", "tone", Severity::Medium, r"\b(act now|hurry|last chance|don't miss out|only \d+ left)\b")
            .with_message("High-pressure urgency language")
            .with_suggestion("State the actual deadline instead"),
        Rule::new(
            "staging_domain_link",
            "links",
            Severity::Critical,
            r#"https?://(?:localhost|(?:[a-z0-9-]+\.)*(?:staging|stage|uat|dev|preview)(?:[.-][a-z0-9-]+)*\.[a-z]{2,})(?::\d+)?(?:/[^\s"'<>]*)?"#,
        )
        .with_message("Link points at a non-production host")
        .with_suggestion("Replace with the production URL before sending")
        .applies_to([ContentType::Edm]),
        Rule::new("font_family_inline", "brand", Severity::Medium, r"font-family\s*:\s*[^;]*(comic sans|papyrus|times new roman)")
            .with_message("Off-brand font family in inline style")
            .with_suggestion("Use the brand font stack")
            .applies_to([ContentType::Edm]),
        Rule::new("brand_color_deprecated", "brand", Severity::Medium, r"#(ff0000|00ff00|0000ff)\b")
            .with_message("Deprecated brand color")
            .with_suggestion("Use a color from the current brand palette")
            .applies_to([ContentType::Edm]),
        Rule::new("spelling_receive", "spelling", Severity::Low, r"\brecieve(d|s)?\b")
            .with_replacement("receive$1"),
        Rule::new("spelling_separate", "spelling", Severity::Low, r"\bseperate(d|ly)?\b")
            .with_replacement("separate$1"),
        Rule::new("spelling_accommodation", "spelling", Severity::Low, r"\baccomodation(s)?\b")
            .with_replacement("accommodation$1"),
        Rule::new("accessibility_color_only", "accessibility", Severity::Low, r"\b(click|tap) the (red|green|blue) (button|link)\b")
            .with_message("Instructions should not rely on color alone")
            .with_suggestion("Refer to the button by its label"),
    ]
}
