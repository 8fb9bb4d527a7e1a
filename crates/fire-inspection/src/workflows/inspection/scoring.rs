use serde::{Deserialize, Serialize};

use super::domain::{ComplianceStatus, RiskLevel};

/// Scores at or above this threshold classify as low risk.
pub const LOW_RISK_THRESHOLD: u8 = 85;
/// Scores at or above this threshold (and below the low threshold) classify as medium risk.
pub const MEDIUM_RISK_THRESHOLD: u8 = 70;

/// Result of scoring a report's checklist responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreOutcome {
    pub overall_score: u8,
    pub risk_assessment: RiskLevel,
    pub fire_hazard_level: RiskLevel,
}

/// Pure scorer turning per-item observations into a compliance score.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScoringEngine;

impl ScoringEngine {
    /// Rounded mean of every non-N/A score; zero (and high risk) when nothing is scored.
    pub fn compute_score<I>(&self, responses: I) -> ScoreOutcome
    where
        I: IntoIterator<Item = (ComplianceStatus, u8)>,
    {
        let (sum, count) = responses
            .into_iter()
            .filter(|(status, _)| status.is_scored())
            .fold((0u64, 0u64), |(sum, count), (_, score)| {
                (sum + u64::from(score.min(100)), count + 1)
            });

        let overall_score = if count == 0 {
            0
        } else {
            (sum as f64 / count as f64).round().clamp(0.0, 100.0) as u8
        };

        let level = classify_score(overall_score);
        ScoreOutcome {
            overall_score,
            risk_assessment: level,
            fire_hazard_level: level,
        }
    }
}

pub fn classify_score(score: u8) -> RiskLevel {
    if score >= LOW_RISK_THRESHOLD {
        RiskLevel::Low
    } else if score >= MEDIUM_RISK_THRESHOLD {
        RiskLevel::Medium
    } else {
        RiskLevel::High
    }
}
