//! Image source and alt-text checks.

use scraper::Html;

use crate::markup::{locate, Tag};
use crate::types::{Issue, Severity};

/// Prefix of a base64 1x1 GIF, the usual tracking-pixel or spacer placeholder.
const ONE_PIXEL_GIF: &str = "data:image/gif;base64,R0lGODlhAQABA";

fn is_placeholder_src(src: &str) -> bool {
    let src = src.trim();
    src.is_empty()
        || src == "#"
        || src.eq_ignore_ascii_case("about:blank")
        || src
            .get(..ONE_PIXEL_GIF.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(ONE_PIXEL_GIF))
}

/// Validate every `<img>` in `html`.
pub fn validate_images(html: &str) -> Vec<Issue> {
    let mut issues = Vec::new();

    let document = Html::parse_fragment(html);

    for located in locate(&document, html, Tag::Image) {
        let element = located.element.value();
        let src = element.attr("src").unwrap_or_default().to_string();
        let alt = element.attr("alt");
        let original = match &located.span {
            Some(span) => html[span.clone()].to_string(),
            None => located.element.html(),
        };

        let issue = |rule_id: &str, issue_type: &str, severity: Severity, message: String| {
            let issue = Issue::new(rule_id, "images", severity, message, original.clone())
                .with_type(issue_type)
                .with_found(src.clone());
            match &located.span {
                Some(span) => issue.at(span.start, span.len()),
                None => issue,
            }
        };

        if is_placeholder_src(&src) {
            issues.push(
                issue(
                    "image_broken_src",
                    "broken_image",
                    Severity::Critical,
                    format!("Image has a broken or placeholder source \"{}\"", src),
                )
                .with_suggestion("Point the image at its final hosted asset"),
            );
        }

        if alt.map(str::trim).unwrap_or_default().is_empty() {
            issues.push(
                issue(
                    "image_missing_alt",
                    "missing_alt",
                    Severity::High,
                    "Image is missing alt text".to_string(),
                )
                .with_suggestion("Describe the image content in the alt attribute"),
            );
        }
    }

    issues
}
