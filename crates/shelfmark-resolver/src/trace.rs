use serde::Serialize;
use std::fmt;

use crate::{MatchResult, Strategy};

/// One strategy's attempt during a resolution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrategyAttempt {
    pub strategy: Strategy,
    /// Why the strategy did not score at all (missing inputs, no trigger).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skipped: Option<String>,
    /// `DEPARTMENT > FAMILY > CATEGORY` of the best candidate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub best: Option<String>,
    pub raw_score: f64,
    pub confidence: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,
    pub accepted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl StrategyAttempt {
    pub(crate) fn skipped(strategy: Strategy, reason: impl Into<String>) -> Self {
        Self {
            strategy,
            skipped: Some(reason.into()),
            best: None,
            raw_score: 0.0,
            confidence: 0.0,
            threshold: None,
            accepted: false,
            detail: None,
        }
    }
}

/// Every attempt made for one descriptor and the final outcome.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolutionTrace {
    pub attempts: Vec<StrategyAttempt>,
    pub result: Option<MatchResult>,
}

impl fmt::Display for ResolutionTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for a in &self.attempts {
            write!(f, "{:<17}", a.strategy.as_str())?;
            if let Some(reason) = &a.skipped {
                writeln!(f, "skipped ({reason})")?;
                continue;
            }
            let verdict = if a.accepted { "accepted" } else { "rejected" };
            write!(
                f,
                "{verdict} score={:.1} confidence={:.2}",
                a.raw_score, a.confidence
            )?;
            if let Some(t) = a.threshold {
                write!(f, " threshold=>{t:.2}")?;
            }
            if let Some(best) = &a.best {
                write!(f, " best={best}")?;
            }
            if let Some(detail) = &a.detail {
                write!(f, " [{detail}]")?;
            }
            writeln!(f)?;
        }
        match &self.result {
            Some(m) => writeln!(
                f,
                "→ {} via {} ({:.2})",
                m.record.path(),
                m.strategy,
                m.confidence
            ),
            None => writeln!(f, "→ NO_MATCH"),
        }
    }
}
