// src/analyze/mod.rs
//! Product risk scoring pipeline.
//! Order: health score, adulteration risk, overall decision table, then
//! recommendations and home tests. Every stage is a pure function of the
//! `ProductRecord`, so the same input always yields the same report.

pub mod adulteration;
pub mod advice;
pub mod health;
pub mod nutrients;
pub mod overall;
pub mod rules;

pub use crate::analyze::adulteration::assess_adulteration;
pub use crate::analyze::health::assess_health;
pub use crate::analyze::overall::assess_overall;

use crate::product::ProductRecord;
use crate::report::{ProductInfo, RiskReport};

pub fn build_report(product: &ProductRecord) -> RiskReport {
    let health = assess_health(product);
    let adulteration = assess_adulteration(product);
    let overall = assess_overall(health.score, adulteration.level);
    let recommendations = advice::recommendations(&health, &adulteration);
    let home_tests = home_tests::select_home_tests(&product.categories);

    RiskReport {
        product_info: ProductInfo::from(product),
        health_analysis: health,
        adulteration_analysis: adulteration,
        risk_assessment: overall,
        recommendations,
        home_tests,
    }
}
