//! User-facing recommendations derived from the assessments.

use super::adulteration::ADDITIVE_COUNT_LIMIT;
use super::nutrients::{SALT_HIGH_G, SUGAR_HIGH_G};
use crate::report::{AdulterationAssessment, HealthAssessment, RiskLevel};

/// Always appended, in this order, after the conditional advice.
pub const GENERAL_ADVICE: [&str; 4] = [
    "Always check the expiry date and packaging seal before consumption",
    "Store the product according to the instructions on the package",
    "Buy from reputable sources and trusted brands",
    "Report suspected adulteration to your local food safety authority",
];

pub fn recommendations(
    health: &HealthAssessment,
    adulteration: &AdulterationAssessment,
) -> Vec<String> {
    let mut out = Vec::new();

    if health.score < 0 {
        out.push("Consider choosing products with better Nutri-Score grades (A or B)".to_string());
    }
    if health.nutrition.sugars_100g > SUGAR_HIGH_G {
        out.push("Limit consumption due to high sugar content".to_string());
    }
    if health.nutrition.salt_100g > SALT_HIGH_G {
        out.push("Watch your salt intake; this product is high in salt".to_string());
    }
    if adulteration.level == RiskLevel::High {
        out.push("Consider alternative products with fewer risk factors".to_string());
    }
    if adulteration.additives_count > ADDITIVE_COUNT_LIMIT {
        out.push("Look for products with fewer additives".to_string());
    }

    out.extend(GENERAL_ADVICE.iter().map(|s| s.to_string()));
    out
}
