//! Turning model output into the sectioned report text.
//!
//! The prompt asks for strict JSON; models still wrap it in markdown fences or
//! answer in prose. JSON that parses into `AiFindings` is re-rendered into a
//! fixed section layout; anything else is passed through verbatim, with a
//! best-effort heading/bullet parse for the structured `sections` payload.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::report::RiskLevel;

/// Structured image findings. Field names match the JSON schema in the prompt.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiFindings {
    #[serde(default, deserialize_with = "text_lenient")]
    pub summary: String,
    #[serde(default, deserialize_with = "risk_level_lenient")]
    pub risk_level: Option<RiskLevel>,
    #[serde(default, deserialize_with = "text_items")]
    pub key_findings: Vec<String>,
    #[serde(default, deserialize_with = "text_items")]
    pub indicators: Vec<String>,
    #[serde(default, deserialize_with = "text_items")]
    pub recommendations: Vec<String>,
    #[serde(default, deserialize_with = "text_items")]
    pub home_tests: Vec<String>,
}

impl AiFindings {
    pub fn is_empty(&self) -> bool {
        self.summary.trim().is_empty()
            && self.risk_level.is_none()
            && self.key_findings.is_empty()
            && self.indicators.is_empty()
            && self.recommendations.is_empty()
            && self.home_tests.is_empty()
    }
}

/// Remove a leading "```" / "```json" fence and a trailing "```", then trim.
pub fn strip_code_fences(raw: &str) -> &str {
    let mut s = raw.trim();
    if let Some(rest) = s.strip_prefix("```") {
        // drop the info string ("json", "JSON", ...) up to the first newline
        s = match rest.find('\n') {
            Some(i) => &rest[i + 1..],
            None => rest.trim_start_matches(|c: char| c.is_ascii_alphabetic()),
        };
    }
    if let Some(rest) = s.trim_end().strip_suffix("```") {
        s = rest;
    }
    s.trim()
}

/// Parse the model's JSON answer. `None` when it is not a usable JSON object.
pub fn parse_findings(raw: &str) -> Option<AiFindings> {
    let body = strip_code_fences(raw);
    let value: Value = serde_json::from_str(body).ok()?;
    if !value.is_object() {
        return None;
    }
    let findings: AiFindings = serde_json::from_value(value).ok()?;
    (!findings.is_empty()).then_some(findings)
}

/// Fixed section layout; empty sections are omitted.
pub fn render_sections(f: &AiFindings) -> String {
    let mut blocks: Vec<String> = Vec::new();

    let summary = f.summary.trim();
    if !summary.is_empty() {
        blocks.push(format!("Summary:\n{summary}"));
    }
    if let Some(level) = f.risk_level {
        blocks.push(format!("Risk Level: {level}"));
    }
    for (title, items) in [
        ("Key Findings", &f.key_findings),
        ("Adulteration Indicators", &f.indicators),
        ("Recommendations", &f.recommendations),
        ("Home Tests", &f.home_tests),
    ] {
        if items.is_empty() {
            continue;
        }
        let lines: Vec<String> = items.iter().map(|i| format!("- {i}")).collect();
        blocks.push(format!("{title}:\n{}", lines.join("\n")));
    }

    blocks.join("\n\n")
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Section {
    Summary,
    Risk,
    KeyFindings,
    Indicators,
    Recommendations,
    HomeTests,
}

static HEADING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(summary|key findings|findings|adulteration indicators|indicators|recommendations|home tests|tests|risk level|overall risk|risk)\s*[:\-]?$",
    )
    .expect("heading regex")
});
static INLINE_RISK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:risk\s*level|overall\s*risk)\s*[:\-]?\s*(low|medium|high)\b")
        .expect("inline risk regex")
});
static LEVEL_WORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(low|medium|high)\b").expect("level regex"));
static BULLET: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:[-•*]|\d+\.)\s+").expect("bullet regex"));
static TEST_WORDS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)test|procedure|mix|drop|observe").expect("test regex"));
static ADVICE_WORDS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)recommend|should|avoid|consider|suggest").expect("advice regex")
});
static INDICATOR_WORDS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)colou?r|texture|odou?r|smell|packaging|sediment|foam|contaminant|impurity")
        .expect("indicator regex")
});

/// Best-effort structure for free-form answers: headings switch the current
/// section, bullets go to the current section, loose sentences are classified
/// by keyword, and anything unclassified joins the summary.
pub fn parse_plain_text(text: &str) -> AiFindings {
    let mut out = AiFindings::default();
    let mut summary: Vec<&str> = Vec::new();
    let mut current = Section::Summary;

    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let heading_candidate = line.trim_start_matches('#').trim().trim_matches('*').trim();
        if let Some(caps) = HEADING.captures(heading_candidate) {
            let key = caps[1].to_ascii_lowercase();
            current = if key.contains("risk") {
                Section::Risk
            } else if key.contains("test") {
                Section::HomeTests
            } else if key.contains("recommend") {
                Section::Recommendations
            } else if key.contains("indicator") {
                Section::Indicators
            } else if key.contains("finding") {
                Section::KeyFindings
            } else {
                Section::Summary
            };
            continue;
        }

        if out.risk_level.is_none() {
            if let Some(caps) = INLINE_RISK.captures(line) {
                out.risk_level = RiskLevel::parse(&caps[1]);
                continue;
            }
        }

        if current == Section::Risk {
            if out.risk_level.is_none() {
                out.risk_level = LEVEL_WORD
                    .captures(line)
                    .and_then(|c| RiskLevel::parse(&c[1]));
            }
            continue;
        }

        if BULLET.is_match(line) {
            let item = BULLET.replace(line, "").trim().to_string();
            match current {
                Section::HomeTests => out.home_tests.push(item),
                Section::Recommendations => out.recommendations.push(item),
                Section::Indicators => out.indicators.push(item),
                Section::KeyFindings | Section::Summary | Section::Risk => {
                    out.key_findings.push(item)
                }
            }
        } else if TEST_WORDS.is_match(line) {
            out.home_tests.push(line.to_string());
        } else if ADVICE_WORDS.is_match(line) {
            out.recommendations.push(line.to_string());
        } else if INDICATOR_WORDS.is_match(line) {
            out.indicators.push(line.to_string());
        } else {
            summary.push(line);
        }
    }

    out.summary = summary.join(" ");
    out
}

fn risk_level_lenient<'de, D>(d: D) -> Result<Option<RiskLevel>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let v = Option::<Value>::deserialize(d)?;
    Ok(v.as_ref()
        .and_then(Value::as_str)
        .and_then(RiskLevel::parse))
}

/// Strings, numbers and small objects become text; null, arrays and booleans become empty.
fn text_lenient<'de, D>(d: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let v = Option::<Value>::deserialize(d)?;
    Ok(v.as_ref().and_then(item_text).unwrap_or_default())
}

/// Lists may hold plain strings or small objects (e.g. `{"name":..,"procedure":..}`).
fn text_items<'de, D>(d: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let v = Option::<Value>::deserialize(d)?;
    let items = match v {
        Some(Value::Array(items)) => items,
        Some(other) => vec![other],
        None => Vec::new(),
    };
    Ok(items.iter().filter_map(item_text).collect())
}

fn item_text(v: &Value) -> Option<String> {
    let text = match v {
        Value::String(s) => s.trim().to_string(),
        Value::Object(map) => map
            .values()
            .filter_map(|x| match x {
                Value::String(s) => Some(s.trim().to_string()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(": "),
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    };
    (!text.is_empty()).then_some(text)
}
