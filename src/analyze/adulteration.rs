//! Adulteration risk scorer.
//!
//! Reasons come from two places: suspicious keywords in the ingredient text
//! (one reason per keyword present, regardless of how often it occurs; a
//! keyword consumes its text, so "high fructose corn syrup" is one reason) and a
//! fixed set of tag checks. The final level is decided by the reason count
//! alone. Some tag checks also carry a "at least Medium" floor; that floor is
//! kept on the assessment for inspection but never overrides the count rule.

use tracing::debug;

use super::health::display_code;
use crate::product::ProductRecord;
use crate::report::{AdulterationAssessment, RiskLevel};

pub const SUSPICIOUS_KEYWORDS: &[&str] = &[
    "artificial",
    "synthetic",
    "hydrogenated",
    "high fructose corn syrup",
    "high fructose",
    "corn syrup",
    "modified starch",
    "flavour enhancer",
    "flavor enhancer",
];

/// More than this many additive tags is itself a risk signal.
pub const ADDITIVE_COUNT_LIMIT: usize = 10;

pub const PRESERVATIVES: &[&str] = &[
    "en:e200", "en:e202", "en:e210", "en:e211", "en:e220", "en:e223", "en:e224", "en:e249",
    "en:e250", "en:e251", "en:e252", "en:e282",
];

struct TagRule {
    name: &'static str,
    check: fn(&ProductRecord) -> Option<String>,
    floor: Option<RiskLevel>,
}

static TAG_RULES: [TagRule; 5] = [
    TagRule {
        name: "additive_count",
        check: too_many_additives,
        floor: Some(RiskLevel::Medium),
    },
    TagRule {
        name: "artificial_colours",
        check: artificial_colours,
        floor: Some(RiskLevel::Medium),
    },
    TagRule {
        name: "preservatives",
        check: preservatives,
        floor: None,
    },
    TagRule {
        name: "plastic_packaging",
        check: plastic_packaging,
        floor: None,
    },
    TagRule {
        name: "undisclosed_origin",
        check: undisclosed_origin,
        floor: Some(RiskLevel::Medium),
    },
];

pub fn assess_adulteration(product: &ProductRecord) -> AdulterationAssessment {
    let keywords = matched_keywords(&product.ingredients_text);
    let mut reasons: Vec<String> = keywords
        .iter()
        .map(|kw| format!("Suspicious ingredient detected: {kw}"))
        .collect();

    let mut floor = RiskLevel::Low;
    let mut packaging_concerns = 0usize;
    for rule in &TAG_RULES {
        if let Some(reason) = (rule.check)(product) {
            if let Some(f) = rule.floor {
                floor = floor.max(f);
            }
            if rule.name == "plastic_packaging" {
                packaging_concerns += 1;
            }
            reasons.push(reason);
        }
    }

    let level = level_for_reason_count(reasons.len());
    if floor > level {
        debug!(
            barcode = %product.barcode,
            reasons = reasons.len(),
            floor = %floor,
            level = %level,
            "per-rule escalation disagrees with count-based level; count-based level kept"
        );
    }

    AdulterationAssessment {
        level,
        reasons,
        additives_count: product.additives_tags.len(),
        suspicious_ingredients: keywords.len(),
        packaging_concerns,
        escalation_floor: floor,
    }
}

/// `> 3` reasons is High, `> 1` is Medium, otherwise Low.
pub fn level_for_reason_count(count: usize) -> RiskLevel {
    if count > 3 {
        RiskLevel::High
    } else if count > 1 {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}

/// Keywords present in `ingredients` (case-insensitive), in list order.
/// Longer keywords come first in the list and blank out their matches, so an
/// ingredient is never counted under two overlapping keywords.
pub fn matched_keywords(ingredients: &str) -> Vec<&'static str> {
    let mut text = ingredients.to_lowercase();
    let mut hits = Vec::new();
    for kw in SUSPICIOUS_KEYWORDS.iter().copied() {
        if text.contains(kw) {
            hits.push(kw);
            text = text.replace(kw, " | ");
        }
    }
    hits
}

fn too_many_additives(p: &ProductRecord) -> Option<String> {
    let n = p.additives_tags.len();
    (n > ADDITIVE_COUNT_LIMIT).then(|| format!("High number of additives ({n})"))
}

fn artificial_colours(p: &ProductRecord) -> Option<String> {
    let hits: Vec<String> = p
        .additives_tags
        .iter()
        .filter(|t| is_colour_code(t))
        .map(|t| display_code(t))
        .collect();
    (!hits.is_empty()).then(|| format!("Contains artificial colours: {}", hits.join(", ")))
}

fn preservatives(p: &ProductRecord) -> Option<String> {
    let hits: Vec<String> = p
        .additives_tags
        .iter()
        .filter(|t| PRESERVATIVES.contains(&t.to_ascii_lowercase().as_str()))
        .map(|t| display_code(t))
        .collect();
    (!hits.is_empty()).then(|| format!("Contains preservatives: {}", hits.join(", ")))
}

fn plastic_packaging(p: &ProductRecord) -> Option<String> {
    p.packaging_tags
        .iter()
        .any(|t| t.to_ascii_lowercase().contains("plastic"))
        .then(|| "Plastic packaging may leach chemicals into food".to_string())
}

fn undisclosed_origin(p: &ProductRecord) -> Option<String> {
    p.manufacturing_places_tags
        .is_empty()
        .then(|| "Manufacturing location not disclosed".to_string())
}

/// Colour additives are E100–E199, optionally with a letter/roman suffix
/// ("en:e150d", "en:e160aii"). E1000+ codes (e.g. E1422 starches) are not colours.
fn is_colour_code(tag: &str) -> bool {
    let lower = tag.to_ascii_lowercase();
    let Some(code) = lower.strip_prefix("en:e") else {
        return false;
    };
    let digits: String = code.chars().take_while(|c| c.is_ascii_digit()).collect();
    matches!(digits.parse::<u32>(), Ok(n) if (100..=199).contains(&n) && digits.len() == 3)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Disclosed origin, no additives, no packaging: zero reasons.
    fn clean() -> ProductRecord {
        ProductRecord {
            manufacturing_places_tags: vec!["france".into()],
            ..Default::default()
        }
    }

    #[test]
    fn clean_product_is_low_with_no_reasons() {
        let a = assess_adulteration(&clean());
        assert_eq!(a.level, RiskLevel::Low);
        assert!(a.reasons.is_empty());
        assert_eq!(a.escalation_floor, RiskLevel::Low);
    }

    #[test]
    fn keywords_match_once_each_case_insensitively() {
        let mut p = clean();
        p.ingredients_text =
            "Sugar, ARTIFICIAL flavour, artificial colour, Hydrogenated palm oil".into();
        let a = assess_adulteration(&p);
        assert_eq!(a.suspicious_ingredients, 2);
        assert_eq!(
            a.reasons,
            vec![
                "Suspicious ingredient detected: artificial".to_string(),
                "Suspicious ingredient detected: hydrogenated".to_string(),
            ]
        );
        assert_eq!(a.level, RiskLevel::Medium);
    }

    #[test]
    fn exactly_ten_additives_does_not_trigger_count_reason() {
        let mut p = clean();
        p.additives_tags = (0..10).map(|i| format!("en:e40{i}")).collect();
        let a = assess_adulteration(&p);
        assert!(!a.reasons.iter().any(|r| r.starts_with("High number")));

        p.additives_tags.push("en:e415".into());
        let a = assess_adulteration(&p);
        assert!(a.reasons.iter().any(|r| r == "High number of additives (11)"));
    }

    #[test]
    fn colour_codes_are_e100_to_e199_only() {
        assert!(is_colour_code("en:e102"));
        assert!(is_colour_code("en:e150d"));
        assert!(is_colour_code("en:E160aii"));
        assert!(!is_colour_code("en:e1422"));
        assert!(!is_colour_code("en:e200"));
        assert!(!is_colour_code("e102"));
    }

    #[test]
    fn preservatives_and_plastic_add_reasons_without_floor() {
        let mut p = clean();
        p.additives_tags = vec!["en:e211".into()];
        p.packaging_tags = vec!["en:plastic-bottle".into()];
        let a = assess_adulteration(&p);
        assert_eq!(a.reasons.len(), 2);
        assert_eq!(a.packaging_concerns, 1);
        assert_eq!(a.escalation_floor, RiskLevel::Low);
        assert_eq!(a.level, RiskLevel::Medium);
    }

    #[test]
    fn undisclosed_origin_is_a_reason() {
        let a = assess_adulteration(&ProductRecord::default());
        assert_eq!(
            a.reasons,
            vec!["Manufacturing location not disclosed".to_string()]
        );
    }

    // A single colourant reason escalates to "at least Medium" per rule, but one
    // reason is Low under the count policy. The count policy wins.
    #[test]
    fn count_based_level_overrides_rule_escalation() {
        let mut p = clean();
        p.additives_tags = vec!["en:e129".into()];
        let a = assess_adulteration(&p);
        assert_eq!(a.reasons.len(), 1);
        assert_eq!(a.escalation_floor, RiskLevel::Medium);
        assert_eq!(a.level, RiskLevel::Low);
    }

    #[test]
    fn fourth_reason_flips_medium_to_high() {
        let mut p = clean();
        p.ingredients_text = "artificial, synthetic, hydrogenated".into();
        assert_eq!(assess_adulteration(&p).level, RiskLevel::Medium);

        p.ingredients_text.push_str(", high fructose corn syrup");
        let a = assess_adulteration(&p);
        assert_eq!(a.reasons.len(), 4);
        assert_eq!(a.level, RiskLevel::High);
    }

    #[test]
    fn compound_syrup_is_one_reason() {
        let mut p = clean();
        p.ingredients_text = "Water, High Fructose Corn Syrup, citric acid".into();
        let a = assess_adulteration(&p);
        assert_eq!(
            a.reasons,
            vec!["Suspicious ingredient detected: high fructose corn syrup".to_string()]
        );
        assert_eq!(a.level, RiskLevel::Low);

        p.ingredients_text = "glucose syrup, corn syrup, high fructose syrup".into();
        assert_eq!(
            matched_keywords(&p.ingredients_text),
            vec!["high fructose", "corn syrup"]
        );
    }

    #[test]
    fn level_thresholds() {
        assert_eq!(level_for_reason_count(0), RiskLevel::Low);
        assert_eq!(level_for_reason_count(1), RiskLevel::Low);
        assert_eq!(level_for_reason_count(2), RiskLevel::Medium);
        assert_eq!(level_for_reason_count(3), RiskLevel::Medium);
        assert_eq!(level_for_reason_count(4), RiskLevel::High);
    }
}
