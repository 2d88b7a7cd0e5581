pub mod issue;
pub mod report;
pub mod rule;

pub use issue::{Issue, LanguageTag, Severity};
pub use report::{AcquisitionSummary, CheckTarget, ComplianceReport, IssueCategory, LanguageCounts};
pub use rule::{ContentType, Rule};
