// src/scoring/tmt.rs

use serde::{Deserialize, Serialize};

use crate::models::cognitive::{ScoredTest, TmtClick, TmtOutcome, TmtSummary};

/// Trail-making payload. Completion times and error counts are measured
/// client-side; the click log is kept for reanalysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrailMakingData {
    #[serde(rename = "partACompletionTime", default)]
    pub part_a_completion_time: f64,
    #[serde(rename = "partAErrors", default)]
    pub part_a_errors: i32,
    #[serde(rename = "partBCompletionTime", default)]
    pub part_b_completion_time: f64,
    #[serde(rename = "partBErrors", default)]
    pub part_b_errors: i32,
    #[serde(default)]
    pub clicks: Vec<TmtClick>,
    #[serde(default)]
    pub settings: serde_json::Map<String, serde_json::Value>,
}

pub fn b_to_a_ratio(part_a: f64, part_b: f64) -> f64 {
    if part_a <= 0.0 {
        return 0.0;
    }
    part_b / part_a
}

pub fn summarize(data: &TrailMakingData) -> TmtSummary {
    TmtSummary {
        part_a_completion_time: data.part_a_completion_time,
        part_a_errors: data.part_a_errors,
        part_b_completion_time: data.part_b_completion_time,
        part_b_errors: data.part_b_errors,
        b_to_a_ratio: b_to_a_ratio(data.part_a_completion_time, data.part_b_completion_time),
    }
}

/// Scores a raw trail-making payload, keeping it verbatim as `raw_data`.
pub fn score(raw: serde_json::Value) -> Result<TmtOutcome, serde_json::Error> {
    let data: TrailMakingData = serde_json::from_value(raw.clone())?;
    Ok(ScoredTest {
        summary: summarize(&data),
        details: data.clicks,
        raw_data: raw,
    })
}
