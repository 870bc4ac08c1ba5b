//! Product records as fetched from the open nutrition database.
//!
//! The upstream payload is loosely typed (numbers sometimes arrive as strings,
//! grades as "unknown", tag lists as `null`). Everything is normalised here so
//! the scorers only ever see concrete values: zero for missing numbers, empty
//! collections for missing tags, `None` for missing grades.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::report::NutritionValues;

/// Nutri-Score letter grade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NutriGrade {
    A,
    B,
    C,
    D,
    E,
}

impl NutriGrade {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "A" => Some(NutriGrade::A),
            "B" => Some(NutriGrade::B),
            "C" => Some(NutriGrade::C),
            "D" => Some(NutriGrade::D),
            "E" => Some(NutriGrade::E),
            _ => None,
        }
    }

    pub fn letter(self) -> char {
        match self {
            NutriGrade::A => 'A',
            NutriGrade::B => 'B',
            NutriGrade::C => 'C',
            NutriGrade::D => 'D',
            NutriGrade::E => 'E',
        }
    }
}

impl Serialize for NutriGrade {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_char(self.letter())
    }
}

/// NOVA processing group, 1 (unprocessed) ..= 4 (ultra-processed).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct NovaGroup(u8);

impl NovaGroup {
    pub fn new(level: u8) -> Option<Self> {
        (1..=4).contains(&level).then_some(NovaGroup(level))
    }

    pub fn level(self) -> u8 {
        self.0
    }
}

/// Per-100g numeric fields. Missing values are zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
pub struct Nutriments {
    #[serde(default, rename = "sugars_100g", deserialize_with = "lenient_f64")]
    pub sugars: f64,
    #[serde(default, rename = "salt_100g", deserialize_with = "lenient_f64")]
    pub salt: f64,
    #[serde(default, rename = "fat_100g", deserialize_with = "lenient_f64")]
    pub fat: f64,
    #[serde(default, rename = "saturated-fat_100g", deserialize_with = "lenient_f64")]
    pub saturated_fat: f64,
    #[serde(default, rename = "fiber_100g", deserialize_with = "lenient_f64")]
    pub fiber: f64,
    #[serde(default, rename = "proteins_100g", deserialize_with = "lenient_f64")]
    pub proteins: f64,
}

impl From<Nutriments> for NutritionValues {
    fn from(n: Nutriments) -> Self {
        Self {
            sugars_100g: n.sugars,
            salt_100g: n.salt,
            fat_100g: n.fat,
            saturated_fat_100g: n.saturated_fat,
            fiber_100g: n.fiber,
            proteins_100g: n.proteins,
        }
    }
}

/// Normalised product data for one barcode. Lives for a single request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductRecord {
    pub barcode: String,
    pub product_name: String,
    pub brands: String,
    pub categories: String,
    pub quantity: String,
    pub ingredients_text: String,
    pub nutrition_grade: Option<NutriGrade>,
    pub nova_group: Option<NovaGroup>,
    pub additives_tags: Vec<String>,
    pub allergens_tags: Vec<String>,
    pub packaging_tags: Vec<String>,
    pub manufacturing_places_tags: Vec<String>,
    pub nutriments: Nutriments,
}

/// Upstream `product` object, every field optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawProduct {
    product_name: Option<String>,
    brands: Option<String>,
    categories: Option<String>,
    quantity: Option<String>,
    ingredients_text: Option<String>,
    nutriscore_grade: Option<String>,
    nova_group: Option<Value>,
    additives_tags: Option<Vec<String>>,
    allergens_tags: Option<Vec<String>>,
    packaging_tags: Option<Vec<String>>,
    manufacturing_places_tags: Option<Vec<String>>,
    nutriments: Option<Nutriments>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawLookup {
    status: Option<Value>,
    product: Option<RawProduct>,
}

impl ProductRecord {
    /// Parse a full lookup response (`{"status": 1, "product": {...}}`).
    /// Returns `None` when the database reports no product or the payload is unusable.
    pub fn from_lookup_json(barcode: &str, body: &str) -> Option<Self> {
        let raw: RawLookup = serde_json::from_str(body).ok()?;
        if raw.status.as_ref().and_then(value_as_f64) == Some(0.0) {
            return None;
        }
        raw.product.map(|p| Self::from_raw(barcode, p))
    }

    fn from_raw(barcode: &str, p: RawProduct) -> Self {
        Self {
            barcode: barcode.to_string(),
            product_name: trimmed(p.product_name),
            brands: trimmed(p.brands),
            categories: trimmed(p.categories),
            quantity: trimmed(p.quantity),
            ingredients_text: trimmed(p.ingredients_text),
            nutrition_grade: p.nutriscore_grade.as_deref().and_then(NutriGrade::parse),
            nova_group: p
                .nova_group
                .as_ref()
                .and_then(value_as_f64)
                .filter(|v| v.fract() == 0.0 && (1.0..=4.0).contains(v))
                .and_then(|v| NovaGroup::new(v as u8)),
            additives_tags: clean_tags(p.additives_tags),
            allergens_tags: clean_tags(p.allergens_tags),
            packaging_tags: clean_tags(p.packaging_tags),
            manufacturing_places_tags: clean_tags(p.manufacturing_places_tags),
            nutriments: p.nutriments.unwrap_or_default(),
        }
    }
}

fn trimmed(s: Option<String>) -> String {
    s.map(|v| v.trim().to_string()).unwrap_or_default()
}

/// Drop blank entries, keep upstream order.
fn clean_tags(tags: Option<Vec<String>>) -> Vec<String> {
    tags.unwrap_or_default()
        .into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

fn value_as_f64(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|x| x.is_finite())
}

/// Accept a number, a numeric string, or null; anything else becomes 0.
fn lenient_f64<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
    let v = Option::<Value>::deserialize(d)?;
    Ok(v.as_ref().and_then(value_as_f64).unwrap_or(0.0))
}
