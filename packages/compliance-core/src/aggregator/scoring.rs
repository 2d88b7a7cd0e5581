use serde::{Deserialize, Serialize};

use crate::types::{Issue, Severity};

/// Number of issues per severity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityCounts {
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

impl SeverityCounts {
    pub fn from_issues<'a>(issues: impl IntoIterator<Item = &'a Issue>) -> Self {
        let mut counts = Self::default();
        for issue in issues {
            counts.add(issue.severity);
        }
        counts
    }

    pub fn add(&mut self, severity: Severity) {
        match severity {
            Severity::Critical => self.critical += 1,
            Severity::High => self.high += 1,
            Severity::Medium => self.medium += 1,
            Severity::Low => self.low += 1,
        }
    }

    pub fn get(&self, severity: Severity) -> usize {
        match severity {
            Severity::Critical => self.critical,
            Severity::High => self.high,
            Severity::Medium => self.medium,
            Severity::Low => self.low,
        }
    }

    pub fn total(&self) -> usize {
        self.critical + self.high + self.medium + self.low
    }
}

/// `max(0, 100 - (20c + 10h + 5m + 2l))`
pub fn compliance_score(counts: &SeverityCounts) -> u8 {
    let penalty: usize = Severity::ALL
        .iter()
        .map(|s| counts.get(*s) * s.penalty() as usize)
        .sum();
    100usize.saturating_sub(penalty) as u8
}

/// Order issues critical → high → medium → low, keeping the relative
/// order of equal severities.
pub fn sort_by_severity(issues: &mut [Issue]) {
    issues.sort_by_key(|issue| issue.severity);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issues(severities: &[Severity]) -> Vec<Issue> {
        severities
            .iter()
            .enumerate()
            .map(|(i, s)| Issue::new(format!("r{i}"), "brand", *s, "m", "o"))
            .collect()
    }

    #[test]
    fn test_score_one_critical_two_high_three_low() {
        use Severity::*;
        let counts = SeverityCounts::from_issues(&issues(&[Critical, High, High, Low, Low, Low]));

        assert_eq!(counts.total(), 6);
        assert_eq!(compliance_score(&counts), 54);
    }

    #[test]
    fn test_score_floors_at_zero() {
        let counts = SeverityCounts {
            critical: 6,
            ..Default::default()
        };
        assert_eq!(compliance_score(&counts), 0);
    }

    #[test]
    fn test_no_issues_is_perfect() {
        assert_eq!(compliance_score(&SeverityCounts::default()), 100);
    }

    #[test]
    fn test_sort_is_stable() {
        use Severity::*;
        let mut list = issues(&[Low, High, Critical, High, Low]);
        sort_by_severity(&mut list);

        let ids: Vec<&str> = list.iter().map(|i| i.rule_id.as_str()).collect();
        assert_eq!(ids, vec!["r2", "r1", "r3", "r0", "r4"]);
    }
}
