//! Pattern rule engine and specialized checks.
//!
//! - [`engine`] - compiled rule-sets behind an atomically swappable handle
//! - [`catalogue`] - built-in rules and JSON rule files
//! - [`numerical`] - currency spacing and thousands separators
//! - [`cta`] - weak call-to-action phrases
//! - [`merge_fields`] - `[Field: Name]` token validation

pub mod catalogue;
pub mod cta;
pub mod engine;
pub mod merge_fields;
pub mod numerical;

pub use catalogue::default_rules;
pub use cta::check_weak_cta;
pub use engine::{LoadSummary, RuleEngine, RuleSet, SkippedRule};
pub use merge_fields::check_merge_fields;
pub use numerical::check_numerical_formatting;
