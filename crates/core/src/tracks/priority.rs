//! Ordered name rules scoring track candidates.

use regex_lite::{Regex, RegexBuilder};
use tracing::warn;

/// Score of a candidate no rule matches.
pub const UNMATCHED: i32 = -1;

#[derive(Debug, Clone)]
enum Rule {
    Pattern(Regex),
    /// Lower-cased fragment, used when the pattern is not a valid regex.
    Literal(String),
}

impl Rule {
    fn compile(pattern: &str) -> Self {
        match RegexBuilder::new(pattern).case_insensitive(true).build() {
            Ok(re) => Rule::Pattern(re),
            Err(e) => {
                warn!(pattern = %pattern, "Invalid priority pattern, matching literally: {}", e);
                Rule::Literal(pattern.to_lowercase())
            }
        }
    }

    fn matches(&self, candidate: &str) -> bool {
        match self {
            Rule::Pattern(re) => re.is_match(candidate),
            Rule::Literal(fragment) => candidate.to_lowercase().contains(fragment.as_str()),
        }
    }
}

/// Ordered rule table. Index 0 is the least preferred rule.
#[derive(Debug, Clone, Default)]
pub struct PriorityMatcher {
    rules: Vec<Rule>,
}

impl PriorityMatcher {
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Self {
        Self {
            rules: patterns.iter().map(|p| Rule::compile(p.as_ref())).collect(),
        }
    }

    /// Highest index of a rule matching `candidate`, or [`UNMATCHED`].
    pub fn score(&self, candidate: &str) -> i32 {
        self.rules
            .iter()
            .rposition(|rule| rule.matches(candidate))
            .map(|idx| idx as i32)
            .unwrap_or(UNMATCHED)
    }
}
