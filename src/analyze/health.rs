//! Health scorer: Nutri-Score, NOVA group, nutrients, harmful additives, allergens.

use super::nutrients::score_nutrients;
use super::rules::{reduce, Finding, Rule};
use crate::product::{NutriGrade, ProductRecord};
use crate::report::HealthAssessment;

/// Additive codes flagged as potentially harmful (colourants linked to
/// hyperactivity, nitrite/benzoate preservatives, MSG, aspartame, BHA/BHT).
pub const HARMFUL_ADDITIVES: &[&str] = &[
    "en:e102", "en:e110", "en:e122", "en:e124", "en:e129", "en:e211", "en:e250", "en:e320",
    "en:e321", "en:e621", "en:e951",
];

static GRADE_RULES: [Rule<ProductRecord>; 2] = [
    Rule::new("nutriscore", nutriscore),
    Rule::new("nova_group", nova_group),
];

static TAG_RULES: [Rule<ProductRecord>; 2] = [
    Rule::new("harmful_additives", harmful_additives),
    Rule::new("allergens", allergens),
];

pub fn assess_health(product: &ProductRecord) -> HealthAssessment {
    let mut tally = reduce(&GRADE_RULES, product);
    let nutrition = score_nutrients(&product.nutriments);
    tally.absorb(nutrition.tally);
    tally.absorb(reduce(&TAG_RULES, product));

    HealthAssessment {
        score: tally.score,
        issues: tally.issues,
        benefits: tally.benefits,
        nutriscore: product.nutrition_grade,
        nova_group: product.nova_group,
        additives_count: product.additives_tags.len(),
        nutrition: nutrition.values,
    }
}

fn nutriscore(p: &ProductRecord) -> Option<Finding> {
    let grade = p.nutrition_grade?;
    let letter = grade.letter();
    Some(match grade {
        NutriGrade::A | NutriGrade::B => {
            Finding::benefit(2, format!("Good Nutri-Score grade ({letter})"))
        }
        NutriGrade::C => Finding::issue(1, format!("Moderate Nutri-Score grade ({letter})")),
        NutriGrade::D | NutriGrade::E => {
            Finding::issue(-2, format!("Poor Nutri-Score grade ({letter})"))
        }
    })
}

fn nova_group(p: &ProductRecord) -> Option<Finding> {
    let level = p.nova_group?.level();
    match level {
        1 => Some(Finding::benefit(
            2,
            "Unprocessed or minimally processed food (NOVA 1)",
        )),
        2 => Some(Finding::benefit(1, "Processed culinary ingredient (NOVA 2)")),
        3 => Some(Finding::issue(-1, "Processed food (NOVA 3)")),
        4 => Some(Finding::issue(-2, "Ultra-processed food (NOVA 4)")),
        _ => None,
    }
}

fn harmful_additives(p: &ProductRecord) -> Option<Finding> {
    let hits: Vec<String> = p
        .additives_tags
        .iter()
        .filter(|t| HARMFUL_ADDITIVES.contains(&t.to_ascii_lowercase().as_str()))
        .map(|t| display_code(t))
        .collect();
    if hits.is_empty() {
        return None;
    }
    Some(Finding::issue(
        -1,
        format!("Contains potentially harmful additives: {}", hits.join(", ")),
    ))
}

fn allergens(p: &ProductRecord) -> Option<Finding> {
    if p.allergens_tags.is_empty() {
        return None;
    }
    let names: Vec<String> = p.allergens_tags.iter().map(|t| strip_lang(t)).collect();
    Some(Finding::issue(
        0,
        format!("Contains allergens: {}", names.join(", ")),
    ))
}

/// "en:e621" -> "E621"
pub(crate) fn display_code(tag: &str) -> String {
    strip_lang(tag).to_ascii_uppercase()
}

/// "en:milk" -> "milk"
pub(crate) fn strip_lang(tag: &str) -> String {
    match tag.split_once(':') {
        Some((_, rest)) => rest.to_string(),
        None => tag.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::product::{NovaGroup, Nutriments};

    /// Middle-band nutriments so the sub-scorer contributes nothing.
    fn neutral() -> Nutriments {
        Nutriments {
            sugars: 10.0,
            salt: 1.0,
            ..Default::default()
        }
    }

    fn product(grade: Option<NutriGrade>, nova: Option<u8>) -> ProductRecord {
        ProductRecord {
            nutrition_grade: grade,
            nova_group: nova.and_then(NovaGroup::new),
            nutriments: neutral(),
            ..Default::default()
        }
    }

    #[test]
    fn good_grades_add_two_with_benefit() {
        for g in [NutriGrade::A, NutriGrade::B] {
            let h = assess_health(&product(Some(g), None));
            assert_eq!(h.score, 2);
            assert!(h.benefits[0].contains(g.letter()));
        }
    }

    #[test]
    fn grade_c_is_plus_one_with_moderate_issue() {
        let h = assess_health(&product(Some(NutriGrade::C), None));
        assert_eq!(h.score, 1);
        assert!(h.issues[0].starts_with("Moderate"));
    }

    #[test]
    fn poor_grades_subtract_two() {
        for g in [NutriGrade::D, NutriGrade::E] {
            let h = assess_health(&product(Some(g), None));
            assert_eq!(h.score, -2);
            assert!(h.issues[0].starts_with("Poor"));
        }
    }

    #[test]
    fn nova_levels_map_to_fixed_deltas() {
        let expected = [(1, 2), (2, 1), (3, -1), (4, -2)];
        for (level, delta) in expected {
            let h = assess_health(&product(None, Some(level)));
            assert_eq!(h.score, delta, "nova {level}");
        }
    }

    #[test]
    fn missing_everything_scores_zero() {
        let h = assess_health(&product(None, None));
        assert_eq!(h.score, 0);
        assert!(h.issues.is_empty());
        assert!(h.benefits.is_empty());
    }

    #[test]
    fn harmful_additives_combine_into_one_issue() {
        let mut p = product(None, None);
        p.additives_tags = vec!["en:e621".into(), "en:e330".into(), "en:E102".into()];
        let h = assess_health(&p);
        assert_eq!(h.score, -1);
        assert_eq!(
            h.issues,
            vec!["Contains potentially harmful additives: E621, E102".to_string()]
        );
        assert_eq!(h.additives_count, 3);
    }

    #[test]
    fn allergens_are_listed_without_penalty() {
        let mut p = product(None, None);
        p.allergens_tags = vec!["en:milk".into(), "en:gluten".into()];
        let h = assess_health(&p);
        assert_eq!(h.score, 0);
        assert_eq!(h.issues, vec!["Contains allergens: milk, gluten".to_string()]);
    }

    #[test]
    fn issue_order_follows_rule_order() {
        let mut p = product(Some(NutriGrade::E), Some(4));
        p.nutriments.sugars = 30.0;
        p.allergens_tags = vec!["en:soy".into()];
        let h = assess_health(&p);
        assert!(h.issues[0].starts_with("Poor Nutri-Score"));
        assert!(h.issues[1].starts_with("Ultra-processed"));
        assert!(h.issues[2].starts_with("High sugar"));
        assert!(h.issues[3].starts_with("Contains allergens"));
    }
}
