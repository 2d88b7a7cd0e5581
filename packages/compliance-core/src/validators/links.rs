//! Anchor validation: hrefs, tracking parameters, locale and link text.

use std::ops::Range;

use lazy_static::lazy_static;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;
use url::Url;

use crate::bilingual::{has_rtl_marker, Composition, Script};
use crate::config::CheckConfig;
use crate::markup::{locate, Tag};
use crate::rules::merge_fields::merge_field_spans;
use crate::text::{char_window, collapse_whitespace, fragment_text};
use crate::types::{Issue, Severity};

lazy_static! {
    static ref IMG: Selector = Selector::parse("img").unwrap();
    static ref LOCALE_SEGMENT: Regex = Regex::new(r"(?i)^(en|ar)([-_][a-z]{2})?$").unwrap();
    static ref STRAY_DASH: Regex = Regex::new(r"(?i)^-+|^[a-z]+-+:").unwrap();
    static ref DOUBLE_COLON: Regex = Regex::new(r"(?i)^[a-z][a-z0-9+.-]*::").unwrap();
    static ref SINGLE_SLASH: Regex = Regex::new(r"(?i)^https?:/[^/]").unwrap();
    static ref TRIPLE_SLASH: Regex = Regex::new(r"(?i)^https?:///").unwrap();
}

/// Link texts that tell the reader nothing about the destination.
const GENERIC_LINK_TEXT: &[&str] = &["click here", "here", "click", "this link", "link"];

/// Hosts whose paths carry no locale of ours.
pub const SOCIAL_DOMAINS: &[&str] = &[
    "facebook.com",
    "instagram.com",
    "twitter.com",
    "x.com",
    "linkedin.com",
    "youtube.com",
    "youtu.be",
    "tiktok.com",
    "snapchat.com",
    "whatsapp.com",
    "wa.me",
];

/// Link validation settings.
#[derive(Debug, Clone)]
pub struct LinkValidationOptions {
    pub require_utm: bool,
    pub locale_radius: usize,
    pub context_radius: usize,
    pub non_latin_ratio_threshold: f64,
    pub social_domains: Vec<String>,
}

impl Default for LinkValidationOptions {
    fn default() -> Self {
        Self::from_config(&CheckConfig::default())
    }
}

impl LinkValidationOptions {
    pub fn from_config(config: &CheckConfig) -> Self {
        Self {
            require_utm: config.require_utm,
            locale_radius: config.windows.locale_radius,
            context_radius: config.windows.issue_context_radius,
            non_latin_ratio_threshold: config.non_latin_ratio_threshold,
            social_domains: SOCIAL_DOMAINS.iter().map(|d| d.to_string()).collect(),
        }
    }

    fn is_social(&self, host: &str) -> bool {
        let host = host.trim_start_matches("www.");
        self.social_domains
            .iter()
            .any(|d| host == d || host.ends_with(&format!(".{}", d)))
    }
}

/// Validate every anchor in `html` with default options.
///
/// `dominant` is the document's primary script, used when the text around
/// a link is too sparse to decide its locale.
pub fn validate_links(html: &str, dominant: Script) -> Vec<Issue> {
    validate_links_with(html, dominant, &LinkValidationOptions::default())
}

pub fn validate_links_with(html: &str, dominant: Script, options: &LinkValidationOptions) -> Vec<Issue> {
    let mut issues = Vec::new();

    let document = Html::parse_fragment(html);

    for located in locate(&document, html, Tag::Anchor) {
        let element = located.element.value();
        let anchor = Anchor {
            html,
            markup: match &located.span {
                Some(span) => html[span.clone()].to_string(),
                None => located.element.html(),
            },
            span: located.span,
            text: link_text(located.element),
            options,
        };

        let href = element.attr("href");
        check_text(&anchor, href.is_some(), &mut issues);

        let href = match href {
            Some(href) => href,
            None if element.attr("name").is_some() || element.attr("id").is_some() => {
                continue;
            }
            None => {
                issues.push(anchor.issue(
                    "link_missing_href",
                    "missing_href",
                    Severity::Critical,
                    "Link has no href attribute".to_string(),
                    String::new(),
                ));
                continue;
            }
        };

        check_href(&anchor, href.trim(), dominant, &mut issues);
    }

    debug!(issues = issues.len(), "Link validation complete");
    issues
}

struct Anchor<'a> {
    html: &'a str,
    /// `None` when the parser synthesized the element
    span: Option<Range<usize>>,
    markup: String,
    text: String,
    options: &'a LinkValidationOptions,
}

impl Anchor<'_> {
    fn window(&self, radius: usize) -> &str {
        match &self.span {
            Some(span) => char_window(self.html, span.start, span.end, radius),
            None => "",
        }
    }

    fn issue(
        &self,
        rule_id: &str,
        issue_type: &str,
        severity: Severity,
        message: String,
        found: String,
    ) -> Issue {
        let context = fragment_text(self.window(self.options.context_radius));

        let issue = Issue::new(rule_id, "links", severity, message, self.markup.clone())
            .with_type(issue_type)
            .with_found(found)
            .with_link_text(self.text.clone())
            .with_context(context);
        match &self.span {
            Some(span) => issue.at(span.start, span.len()),
            None => issue,
        }
    }

    /// Script of the content surrounding this anchor, if decidable.
    fn surrounding_script(&self) -> Option<Script> {
        let window = self.window(self.options.locale_radius);
        if has_rtl_marker(window) {
            return Some(Script::Arabic);
        }

        let composition = Composition::of(&fragment_text(window));
        if composition.letters() == 0 {
            return None;
        }
        Some(if composition.non_latin_ratio() > self.options.non_latin_ratio_threshold {
            Script::Arabic
        } else {
            Script::Latin
        })
    }
}

/// Visible text of a link, falling back to the alt text of a linked image.
fn link_text(anchor: ElementRef<'_>) -> String {
    let text = collapse_whitespace(&anchor.text().collect::<String>());
    if !text.is_empty() {
        return text;
    }

    anchor
        .select(&IMG)
        .filter_map(|img| img.value().attr("alt"))
        .map(str::trim)
        .find(|alt| !alt.is_empty())
        .map(str::to_string)
        .unwrap_or_default()
}

fn check_text(anchor: &Anchor<'_>, has_href: bool, issues: &mut Vec<Issue>) {
    if !has_href {
        return;
    }

    if anchor.text.is_empty() {
        issues.push(anchor.issue(
            "link_text_empty",
            "empty_link_text",
            Severity::High,
            "Link has no text or image alt text".to_string(),
            String::new(),
        ));
        return;
    }

    let normalized = anchor.text.trim_end_matches(['.', '!', '>', '»']).trim().to_lowercase();
    if GENERIC_LINK_TEXT.contains(&normalized.as_str()) {
        issues.push(
            anchor
                .issue(
                    "link_text_generic",
                    "generic_link_text",
                    Severity::Medium,
                    format!("Link text \"{}\" does not describe the destination", anchor.text),
                    anchor.text.clone(),
                )
                .with_suggestion("Describe where the link goes, e.g. \"View the offer details\""),
        );
    }
}

/// Reasons an href is structurally broken.
fn malformation(href: &str) -> Option<&'static str> {
    if STRAY_DASH.is_match(href) {
        return Some("stray dash before the scheme");
    }
    if DOUBLE_COLON.is_match(href) {
        return Some("doubled colon after the scheme");
    }
    if TRIPLE_SLASH.is_match(href) {
        return Some("triple slash after the scheme");
    }
    if SINGLE_SLASH.is_match(href) {
        return Some("single slash after the scheme");
    }
    if href.contains(['<', '>']) {
        return Some("angle brackets in URL");
    }

    let mut outside_tokens = String::with_capacity(href.len());
    let mut last = 0;
    for span in merge_field_spans(href) {
        outside_tokens.push_str(&href[last..span.start]);
        last = span.end;
    }
    outside_tokens.push_str(&href[last..]);
    if outside_tokens.chars().any(char::is_whitespace) {
        return Some("whitespace in URL");
    }

    None
}

fn is_merge_field_only(href: &str) -> bool {
    let spans = merge_field_spans(href);
    spans.len() == 1 && spans[0].start == 0 && spans[0].end == href.len()
}

fn check_href(anchor: &Anchor<'_>, href: &str, dominant: Script, issues: &mut Vec<Issue>) {
    if href.is_empty() {
        issues.push(anchor.issue(
            "link_missing_href",
            "missing_href",
            Severity::Critical,
            "Link has an empty href".to_string(),
            String::new(),
        ));
        return;
    }

    let lower = href.to_lowercase();
    if href == "#" || lower.starts_with("javascript:") {
        issues.push(
            anchor
                .issue(
                    "link_placeholder",
                    "placeholder_link",
                    Severity::Critical,
                    format!("Placeholder link \"{}\"", href),
                    href.to_string(),
                )
                .with_suggestion("Replace with the final destination URL"),
        );
        return;
    }

    if let Some(reason) = malformation(href) {
        issues.push(anchor.issue(
            "link_malformed",
            "malformed_url",
            Severity::Critical,
            format!("Malformed URL ({}): {}", reason, href),
            href.to_string(),
        ));
        return;
    }

    if is_merge_field_only(href) || lower.starts_with("mailto:") || lower.starts_with("tel:") {
        return;
    }

    if !(lower.starts_with("http://") || lower.starts_with("https://")) {
        return;
    }

    let url = match Url::parse(href) {
        Ok(url) => url,
        Err(e) => {
            issues.push(anchor.issue(
                "link_malformed",
                "malformed_url",
                Severity::Critical,
                format!("Malformed URL ({}): {}", e, href),
                href.to_string(),
            ));
            return;
        }
    };

    let host = url.host_str().unwrap_or_default().to_lowercase();

    if anchor.options.require_utm && !url.query().is_some_and(|q| q.contains("utm_")) {
        issues.push(
            anchor
                .issue(
                    "link_no_utm",
                    "missing_utm",
                    Severity::Medium,
                    format!("Link to {} has no UTM parameters", host),
                    href.to_string(),
                )
                .with_suggestion("Add utm_source, utm_medium and utm_campaign parameters"),
        );
    }

    if anchor.options.is_social(&host) {
        return;
    }

    let Some((segment, link_script)) = locale_segment(&url) else {
        return;
    };
    let context_script = anchor.surrounding_script().unwrap_or(dominant);

    if link_script != context_script {
        let swapped = swap_locale(href, &segment, context_script);
        issues.push(
            anchor
                .issue(
                    "link_locale_mismatch",
                    "locale_mismatch",
                    Severity::Critical,
                    format!(
                        "Link points to the /{}/ version but sits in {} content",
                        segment,
                        match context_script {
                            Script::Latin => "English",
                            Script::Arabic => "Arabic",
                        }
                    ),
                    href.to_string(),
                )
                .with_suggestion(swapped),
        );
    }
}

/// First locale path segment and the script it targets.
fn locale_segment(url: &Url) -> Option<(String, Script)> {
    url.path_segments()?
        .find(|segment| LOCALE_SEGMENT.is_match(segment))
        .map(|segment| {
            let script = if segment[..2].eq_ignore_ascii_case("ar") {
                Script::Arabic
            } else {
                Script::Latin
            };
            (segment.to_string(), script)
        })
}

/// Replace the locale segment's language, keeping any region suffix.
fn swap_locale(href: &str, segment: &str, target: Script) -> String {
    let replacement = format!("{}{}", target.code(), &segment[2..]);
    href.replacen(&format!("/{}/", segment), &format!("/{}/", replacement), 1)
        .replacen(&format!("/{}?", segment), &format!("/{}?", replacement), 1)
        .replacen(&format!("/{}#", segment), &format!("/{}#", replacement), 1)
}
