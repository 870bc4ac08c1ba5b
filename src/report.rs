//! report.rs — Serializable shapes for the barcode risk report.
//!
//! Field names follow the JSON the browser frontend reads (`product_info`,
//! `health_analysis`, `adulteration_analysis`, `risk_assessment`, ...), so the
//! structs here double as the wire format.

use serde::{Deserialize, Serialize};

use crate::product::{NovaGroup, NutriGrade, ProductRecord};

/// Ordered risk label. `Low < Medium < High`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
        }
    }

    /// Case-insensitive parse of "low" / "medium" / "high".
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "low" => Some(RiskLevel::Low),
            "medium" => Some(RiskLevel::Medium),
            "high" => Some(RiskLevel::High),
            _ => None,
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw per-100g values echoed back for display.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NutritionValues {
    pub sugars_100g: f64,
    pub salt_100g: f64,
    pub fat_100g: f64,
    pub saturated_fat_100g: f64,
    pub fiber_100g: f64,
    pub proteins_100g: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthAssessment {
    #[serde(rename = "overall_score")]
    pub score: i32,
    #[serde(rename = "health_issues")]
    pub issues: Vec<String>,
    #[serde(rename = "health_benefits")]
    pub benefits: Vec<String>,
    pub nutriscore: Option<NutriGrade>,
    pub nova_group: Option<NovaGroup>,
    pub additives_count: usize,
    pub nutrition: NutritionValues,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdulterationAssessment {
    #[serde(rename = "risk_level")]
    pub level: RiskLevel,
    #[serde(rename = "risks")]
    pub reasons: Vec<String>,
    pub additives_count: usize,
    pub suspicious_ingredients: usize,
    pub packaging_concerns: usize,
    /// Level implied by the per-rule "at least Medium" escalations alone.
    /// Informational; `level` is the authoritative, count-based result.
    #[serde(skip)]
    pub escalation_floor: RiskLevel,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverallAssessment {
    #[serde(rename = "overall_risk")]
    pub level: RiskLevel,
    #[serde(rename = "confidence_score")]
    pub confidence: u8,
    pub consumption_recommendation: &'static str,
}

/// Qualitative reliability of a home test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Accuracy {
    High,
    Medium,
    Low,
}

/// Static advisory record. Instances are compile-time templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HomeTest {
    #[serde(rename = "test_name")]
    pub name: &'static str,
    #[serde(rename = "materials_needed")]
    pub materials: &'static [&'static str],
    pub procedure: &'static str,
    pub expected_result: &'static str,
    pub adulteration_indicator: &'static str,
    #[serde(rename = "safety_notes")]
    pub safety_note: &'static str,
    #[serde(rename = "accuracy_level")]
    pub accuracy: Accuracy,
}

/// Product fields shown in the "Product Information" panel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductInfo {
    pub product_name: String,
    pub brands: String,
    pub categories: String,
    pub quantity: String,
    pub ingredients_text: String,
}

impl From<&ProductRecord> for ProductInfo {
    fn from(p: &ProductRecord) -> Self {
        Self {
            product_name: p.product_name.clone(),
            brands: p.brands.clone(),
            categories: p.categories.clone(),
            quantity: p.quantity.clone(),
            ingredients_text: p.ingredients_text.clone(),
        }
    }
}

/// Complete, successful analysis of one product.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskReport {
    pub product_info: ProductInfo,
    pub health_analysis: HealthAssessment,
    pub adulteration_analysis: AdulterationAssessment,
    pub risk_assessment: OverallAssessment,
    pub recommendations: Vec<String>,
    pub home_tests: Vec<HomeTest>,
}

/// The `analysis` member of the barcode response.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BarcodeAnalysis {
    Success(Box<RiskReport>),
    NotFound { message: String },
}

impl BarcodeAnalysis {
    pub fn not_found() -> Self {
        BarcodeAnalysis::NotFound {
            message: "Product not found in the nutrition database".to_string(),
        }
    }
}
