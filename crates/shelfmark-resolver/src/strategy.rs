use serde::{Deserialize, Serialize};
use std::fmt;

use shelfmark_taxonomy::TaxonomyRecord;

/// Matching strategies, in cascade order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Strategy {
    Exact,
    PatternOverride,
    DomainAware,
    Keyword,
    Fuzzy,
}

impl Strategy {
    pub const CASCADE: [Strategy; 5] = [
        Strategy::Exact,
        Strategy::PatternOverride,
        Strategy::DomainAware,
        Strategy::Keyword,
        Strategy::Fuzzy,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Exact => "EXACT",
            Strategy::PatternOverride => "PATTERN_OVERRIDE",
            Strategy::DomainAware => "DOMAIN_AWARE",
            Strategy::Keyword => "KEYWORD",
            Strategy::Fuzzy => "FUZZY",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accepted resolution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchResult {
    pub record: TaxonomyRecord,
    /// In `[0, 1]`, normalized per strategy.
    pub confidence: f64,
    pub strategy: Strategy,
    /// Strategy-internal score; not comparable across strategies.
    pub raw_score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cascade_order_matches_ordering() {
        let mut sorted = Strategy::CASCADE;
        sorted.sort();
        assert_eq!(sorted, Strategy::CASCADE);
        assert_eq!(Strategy::DomainAware.to_string(), "DOMAIN_AWARE");
        assert_eq!(
            serde_json::to_string(&Strategy::PatternOverride).unwrap(),
            "\"PATTERN_OVERRIDE\""
        );
    }
}
