//! Currency and number formatting checks.

use lazy_static::lazy_static;
use regex::Regex;

use crate::markup::text_ranges;
use crate::text::{char_window, collapse_whitespace};
use crate::types::{Issue, Severity};

/// ISO currency codes checked for missing spacing.
pub const CURRENCY_CODES: &[&str] = &[
    "AED", "USD", "EUR", "GBP", "SAR", "QAR", "KWD", "BHD", "OMR", "INR",
];

lazy_static! {
    static ref CODE_THEN_AMOUNT: Regex = Regex::new(&format!(
        r"\b({})(\d[\d,]*(?:\.\d+)?)",
        CURRENCY_CODES.join("|")
    ))
    .unwrap();
    static ref AMOUNT_THEN_CODE: Regex = Regex::new(&format!(
        r"\b(\d[\d,]*(?:\.\d+)?)({})\b",
        CURRENCY_CODES.join("|")
    ))
    .unwrap();
    static ref DIGIT_RUN: Regex = Regex::new(r"\d{5,}").unwrap();
}

const CONTEXT_RADIUS: usize = 30;

/// Flag currency codes glued to amounts and long unseparated numbers.
///
/// Only text between tags is scanned, so attribute values such as
/// `width="300"` or `data-id="120000"` never count. Currency codes are
/// matched case-sensitively; "aed500" is left alone.
pub fn check_numerical_formatting(text: &str) -> Vec<Issue> {
    let mut issues = Vec::new();

    for range in text_ranges(text) {
        scan_segment(&text[range.clone()], range.start, &mut issues);
    }

    issues.sort_by_key(|issue| issue.position);
    issues
}

/// Checks one run of text starting at byte `offset` of the document.
fn scan_segment(segment: &str, offset: usize, issues: &mut Vec<Issue>) {
    for caps in CODE_THEN_AMOUNT.captures_iter(segment) {
        let (Some(whole), Some(code), Some(amount)) = (caps.get(0), caps.get(1), caps.get(2)) else {
            continue;
        };
        issues.push(currency_issue(
            segment,
            offset,
            whole.start(),
            whole.as_str(),
            format!("{} {}", code.as_str(), amount.as_str()),
        ));
    }

    for caps in AMOUNT_THEN_CODE.captures_iter(segment) {
        let (Some(whole), Some(amount), Some(code)) = (caps.get(0), caps.get(1), caps.get(2)) else {
            continue;
        };
        issues.push(currency_issue(
            segment,
            offset,
            whole.start(),
            whole.as_str(),
            format!("{} {}", amount.as_str(), code.as_str()),
        ));
    }

    for m in DIGIT_RUN.find_iter(segment) {
        if !is_standalone_amount(segment, m.start(), m.end()) {
            continue;
        }
        let digits = m.as_str();
        issues.push(
            Issue::new(
                "numerical_thousands_separator",
                "numerical",
                Severity::Medium,
                format!("Large number {} is missing thousands separators", digits),
                digits,
            )
            .with_type("number_format")
            .with_suggestion(group_thousands(digits))
            .with_context(collapse_whitespace(char_window(segment, m.start(), m.end(), CONTEXT_RADIUS)))
            .at(offset + m.start(), m.len()),
        );
    }
}

fn currency_issue(segment: &str, offset: usize, start: usize, found: &str, suggestion: String) -> Issue {
    Issue::new(
        "numerical_currency_spacing",
        "numerical",
        Severity::High,
        format!("Currency code and amount should be separated by a space: \"{}\"", found),
        found,
    )
    .with_type("currency_format")
    .with_suggestion(suggestion)
    .with_found(found)
    .with_context(collapse_whitespace(char_window(
        segment,
        start,
        start + found.len(),
        CONTEXT_RADIUS,
    )))
    .at(offset + start, found.len())
}

/// True if the digit run at `start..end` reads as a free-standing amount
/// rather than part of an identifier, URL, color, decimal or phone number.
fn is_standalone_amount(text: &str, start: usize, end: usize) -> bool {
    let before = text[..start].chars().next_back();
    let after = text[end..].chars().next();

    let glued_before = before.is_some_and(|c| {
        c.is_alphanumeric() || "/=#.-_:+,?&%".contains(c)
    });
    let glued_after = after.is_some_and(|c| c.is_alphabetic() || "/_-".contains(c));
    let leading_zero = text[start..].starts_with('0');

    !glued_before && !glued_after && !leading_zero
}

/// 1234567 -> 1,234,567
fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
