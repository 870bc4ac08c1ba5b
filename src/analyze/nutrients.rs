//! Per-100g nutrient thresholds. Each check is independent; values between the
//! low and high bounds contribute nothing.

use super::rules::{reduce, Finding, Rule, Tally};
use crate::product::Nutriments;
use crate::report::NutritionValues;

pub const SUGAR_HIGH_G: f64 = 15.0;
pub const SUGAR_LOW_G: f64 = 5.0;
pub const SALT_HIGH_G: f64 = 1.5;
pub const SALT_LOW_G: f64 = 0.3;
pub const SATURATED_FAT_HIGH_G: f64 = 5.0;
pub const FIBER_GOOD_G: f64 = 3.0;
pub const PROTEIN_GOOD_G: f64 = 10.0;

#[derive(Debug, Clone, PartialEq)]
pub struct NutritionScore {
    pub tally: Tally,
    pub values: NutritionValues,
}

static NUTRIENT_RULES: [Rule<Nutriments>; 7] = [
    Rule::new("sugar_high", sugar_high),
    Rule::new("sugar_low", sugar_low),
    Rule::new("salt_high", salt_high),
    Rule::new("salt_low", salt_low),
    Rule::new("saturated_fat_high", saturated_fat_high),
    Rule::new("fiber_good", fiber_good),
    Rule::new("protein_good", protein_good),
];

pub fn score_nutrients(n: &Nutriments) -> NutritionScore {
    NutritionScore {
        tally: reduce(&NUTRIENT_RULES, n),
        values: NutritionValues::from(*n),
    }
}

fn sugar_high(n: &Nutriments) -> Option<Finding> {
    (n.sugars > SUGAR_HIGH_G).then(|| {
        Finding::issue(-2, format!("High sugar content ({:.1}g per 100g)", n.sugars))
    })
}

fn sugar_low(n: &Nutriments) -> Option<Finding> {
    (n.sugars < SUGAR_LOW_G).then(|| {
        Finding::benefit(1, format!("Low sugar content ({:.1}g per 100g)", n.sugars))
    })
}

fn salt_high(n: &Nutriments) -> Option<Finding> {
    (n.salt > SALT_HIGH_G)
        .then(|| Finding::issue(-2, format!("High salt content ({:.2}g per 100g)", n.salt)))
}

fn salt_low(n: &Nutriments) -> Option<Finding> {
    (n.salt < SALT_LOW_G)
        .then(|| Finding::benefit(1, format!("Low salt content ({:.2}g per 100g)", n.salt)))
}

fn saturated_fat_high(n: &Nutriments) -> Option<Finding> {
    (n.saturated_fat > SATURATED_FAT_HIGH_G).then(|| {
        Finding::issue(
            -1,
            format!(
                "High saturated fat content ({:.1}g per 100g)",
                n.saturated_fat
            ),
        )
    })
}

fn fiber_good(n: &Nutriments) -> Option<Finding> {
    (n.fiber > FIBER_GOOD_G)
        .then(|| Finding::benefit(1, format!("Good source of fiber ({:.1}g per 100g)", n.fiber)))
}

fn protein_good(n: &Nutriments) -> Option<Finding> {
    (n.proteins > PROTEIN_GOOD_G).then(|| {
        Finding::benefit(
            1,
            format!("Good source of protein ({:.1}g per 100g)", n.proteins),
        )
    })
}
