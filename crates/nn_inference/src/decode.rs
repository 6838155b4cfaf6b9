//! Strict decoding of model answers. Required fields must be present; the
//! rest default to empty so a terse but valid answer is still usable.

use nn_core::{
    nullable, BiasDirection, DisputedPoint, Error, FramingTechnique, MissingInformation,
    NarrativeDifference, Result, SourceCredibility, TrustRanking, UniqueAngle, VerifiedDetails,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BiasResponse {
    pub bias_score: Value,
    pub bias_direction: String,
    pub loaded_words: Vec<String>,
    pub overall_assessment: String,
    #[serde(default, deserialize_with = "nullable")]
    pub framing_techniques: Vec<FramingTechnique>,
    #[serde(default, deserialize_with = "nullable")]
    pub source_credibility: Option<SourceCredibility>,
    #[serde(default, deserialize_with = "nullable")]
    pub credibility_factors: Vec<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub recommendations: Vec<String>,
}

impl BiasResponse {
    pub fn direction(&self) -> Result<BiasDirection> {
        parse_direction(&self.bias_direction)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NarrativeResponse {
    pub consensus_points: Vec<String>,
    pub narrative_consistency: Value,
    pub overall_summary: String,
    #[serde(default, deserialize_with = "nullable")]
    pub differences: Vec<NarrativeDifference>,
    #[serde(default, deserialize_with = "nullable")]
    pub unique_angles: Vec<UniqueAngle>,
    #[serde(default, deserialize_with = "nullable")]
    pub missing_information: Vec<MissingInformation>,
    #[serde(default, deserialize_with = "nullable")]
    pub trustworthiness_ranking: Vec<RawTrustRanking>,
}

#[derive(Debug, Deserialize)]
pub struct RawTrustRanking {
    #[serde(default, deserialize_with = "nullable")]
    pub source: String,
    #[serde(default)]
    pub score: Value,
    #[serde(default, deserialize_with = "nullable")]
    pub reasoning: String,
}

impl From<RawTrustRanking> for TrustRanking {
    fn from(raw: RawTrustRanking) -> Self {
        TrustRanking {
            source: raw.source,
            score: clamp_score(&raw.score),
            reasoning: raw.reasoning,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct DisputedSides {
    #[serde(rename = "Supporting", alias = "supporting", default, deserialize_with = "nullable")]
    pub supporting: Vec<String>,
    #[serde(rename = "Opposing", alias = "opposing", default, deserialize_with = "nullable")]
    pub opposing: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct RawDisputedPoint {
    #[serde(default, deserialize_with = "nullable")]
    pub claim: String,
    #[serde(default, deserialize_with = "nullable")]
    pub sources: DisputedSides,
}

impl From<RawDisputedPoint> for DisputedPoint {
    fn from(raw: RawDisputedPoint) -> Self {
        DisputedPoint {
            claim: raw.claim,
            supporting: raw.sources.supporting,
            opposing: raw.sources.opposing,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryResponse {
    pub neutral_summary: String,
    pub confidence: Value,
    #[serde(default, deserialize_with = "nullable")]
    pub consensus_facts: Vec<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub disputed_points: Vec<RawDisputedPoint>,
    #[serde(default, deserialize_with = "nullable")]
    pub verified_details: VerifiedDetails,
    #[serde(default, deserialize_with = "nullable")]
    pub missing_info: Vec<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub recommended_action: String,
}

/// Decodes a parsed model answer into `T`, reporting shape mismatches as
/// parse errors so callers fall back.
pub fn decode<T: DeserializeOwned>(value: Value) -> Result<T> {
    serde_json::from_value(value)
        .map_err(|e| Error::Parse(format!("unexpected response shape: {}", e)))
}

pub fn parse_direction(raw: &str) -> Result<BiasDirection> {
    match raw.trim().to_lowercase().as_str() {
        "neutral" => Ok(BiasDirection::Neutral),
        "left-leaning" => Ok(BiasDirection::LeftLeaning),
        "right-leaning" => Ok(BiasDirection::RightLeaning),
        "sensationalist" => Ok(BiasDirection::Sensationalist),
        other => Err(Error::Parse(format!("unknown bias direction: {}", other))),
    }
}

/// Reads a score from a number or a numeric string and clamps it to [0, 1].
/// Anything else reads as 0.
pub fn clamp_score(value: &Value) -> f64 {
    let raw = match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => leading_number(s).unwrap_or(0.0),
        _ => 0.0,
    };
    if raw.is_nan() {
        0.0
    } else {
        raw.clamp(0.0, 1.0)
    }
}

/// Parses the longest numeric prefix of `s`, e.g. `"0.7 (high)"` reads as 0.7.
fn leading_number(s: &str) -> Option<f64> {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;
    if end < bytes.len() && (bytes[end] == b'+' || bytes[end] == b'-') {
        end += 1;
    }
    let digits_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if end < bytes.len() && bytes[end] == b'.' {
        end += 1;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
        }
    }
    if end == digits_start || &s[digits_start..end] == "." {
        return None;
    }
    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && (bytes[exp_end] == b'+' || bytes[exp_end] == b'-') {
            exp_end += 1;
        }
        let exp_digits = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits {
            end = exp_end;
        }
    }
    s[..end].parse().ok()
}
