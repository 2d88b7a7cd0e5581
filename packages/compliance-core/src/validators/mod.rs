//! Structural checks over markup: links and images.
//!
//! Both validators are pure functions over the raw markup. They read
//! attributes and text through `scraper` and report byte offsets into the
//! markup they were given. Commented-out markup is never checked.

pub mod images;
pub mod links;

pub use images::validate_images;
pub use links::{validate_links, validate_links_with, LinkValidationOptions};
