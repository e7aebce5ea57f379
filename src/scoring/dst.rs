// src/scoring/dst.rs

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::cognitive::{DstAttempt, DstOutcome, DstSummary, ScoredTest};

pub const DEFAULT_INITIAL_SPAN: i32 = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DigitSpanRawData {
    #[serde(default)]
    pub test_start_time: f64,
    #[serde(default)]
    pub test_end_time: f64,
    #[serde(default)]
    pub results: Vec<DstAttempt>,
    #[serde(default)]
    pub settings: serde_json::Map<String, Value>,
}

impl DigitSpanRawData {
    /// `settings.initialSpan`, accepted as a number or a numeric string.
    pub fn initial_span(&self) -> i32 {
        let parsed = match self.settings.get("initialSpan") {
            Some(Value::Number(n)) => n.as_i64(),
            Some(Value::String(s)) => s.trim().parse::<i64>().ok(),
            _ => None,
        };
        parsed
            .and_then(|n| i32::try_from(n).ok())
            .unwrap_or(DEFAULT_INITIAL_SPAN)
    }
}

pub fn highest_span(data: &DigitSpanRawData) -> i32 {
    let best_correct = data.results.iter().filter(|a| a.correct).map(|a| a.span).max();
    let span = match best_correct {
        Some(span) => span,
        None => match data.results.iter().map(|a| a.span).min() {
            Some(lowest) => lowest - 1,
            None => data.initial_span() - 1,
        },
    };
    span.max(0)
}

pub fn summarize(data: &DigitSpanRawData) -> DstSummary {
    let total = data.results.len();
    let correct = data.results.iter().filter(|a| a.correct).count();

    DstSummary {
        highest_span_achieved: highest_span(data),
        total_trials: i32::try_from(total).unwrap_or(i32::MAX),
        correct_trials: i32::try_from(correct).unwrap_or(i32::MAX),
    }
}

/// Scores a raw digit-span payload, keeping it verbatim as `raw_data`.
pub fn score(raw: Value) -> Result<DstOutcome, serde_json::Error> {
    let data: DigitSpanRawData = serde_json::from_value(raw.clone())?;
    Ok(ScoredTest {
        summary: summarize(&data),
        details: data.results,
        raw_data: raw,
    })
}
