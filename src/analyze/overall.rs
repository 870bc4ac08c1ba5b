//! Overall risk: a first-match decision table over the health score and the
//! adulteration level. Confidence is a fixed value per branch.

use crate::report::{OverallAssessment, RiskLevel};

pub const HIGH_CONFIDENCE: u8 = 9;
pub const MEDIUM_CONFIDENCE: u8 = 7;
pub const LOW_CONFIDENCE: u8 = 8;

pub fn assess_overall(health_score: i32, adulteration: RiskLevel) -> OverallAssessment {
    let (level, confidence) = if health_score < -2 || adulteration == RiskLevel::High {
        (RiskLevel::High, HIGH_CONFIDENCE)
    } else if health_score < 0 || adulteration == RiskLevel::Medium {
        (RiskLevel::Medium, MEDIUM_CONFIDENCE)
    } else {
        (RiskLevel::Low, LOW_CONFIDENCE)
    };

    OverallAssessment {
        level,
        confidence,
        consumption_recommendation: consumption_advice(level),
    }
}

pub fn consumption_advice(level: RiskLevel) -> &'static str {
    match level {
        RiskLevel::High => "Avoid or consume only occasionally. Consider safer alternatives.",
        RiskLevel::Medium => "Consume in moderation and verify quality with home tests.",
        RiskLevel::Low => "Suitable for regular consumption as part of a balanced diet.",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decision_table_first_match_wins() {
        let cases = [
            (-3, RiskLevel::Low, RiskLevel::High, 9),
            (5, RiskLevel::High, RiskLevel::High, 9),
            (-2, RiskLevel::Low, RiskLevel::Medium, 7),
            (-1, RiskLevel::Low, RiskLevel::Medium, 7),
            (3, RiskLevel::Medium, RiskLevel::Medium, 7),
            (0, RiskLevel::Low, RiskLevel::Low, 8),
            (4, RiskLevel::Low, RiskLevel::Low, 8),
        ];
        for (score, adult, want, conf) in cases {
            let o = assess_overall(score, adult);
            assert_eq!(o.level, want, "score {score}, adulteration {adult}");
            assert_eq!(o.confidence, conf);
        }
    }

    #[test]
    fn advice_tracks_level() {
        assert!(assess_overall(-10, RiskLevel::Low)
            .consumption_recommendation
            .starts_with("Avoid"));
        assert!(assess_overall(0, RiskLevel::Low)
            .consumption_recommendation
            .starts_with("Suitable"));
    }
}
