// src/models/cognitive.rs

use serde::{Deserialize, Serialize};

/// A scored cognitive test: the summary row, its detail rows, and the raw
/// payload kept for audit. Always persisted together.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredTest<S, D> {
    pub summary: S,
    pub details: Vec<D>,
    pub raw_data: serde_json::Value,
}

/// Summary columns of 'cpt_results'.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CptSummary {
    pub correct_detections: i32,
    pub commission_errors: i32,
    pub omission_errors: i32,
    pub average_reaction_time: f64,
    pub reaction_time_sd: f64,
    pub detection_rate: f64,
    pub omission_error_rate: f64,
    pub commission_error_rate: f64,
}

/// One row of 'cpt_events'.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CptEvent {
    pub stimulus_value: String,
    pub is_target: bool,
    #[serde(flatten)]
    pub kind: CptEventKind,
}

/// Fields that only exist for one of the two event kinds.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "eventType", rename_all = "lowercase")]
pub enum CptEventKind {
    Stimulus { presented_at: f64 },
    Response { response_time: f64, stimulus_index: i32 },
}

impl CptEventKind {
    pub fn label(&self) -> &'static str {
        match self {
            CptEventKind::Stimulus { .. } => "stimulus",
            CptEventKind::Response { .. } => "response",
        }
    }

    pub fn presented_at(&self) -> Option<f64> {
        match self {
            CptEventKind::Stimulus { presented_at } => Some(*presented_at),
            CptEventKind::Response { .. } => None,
        }
    }

    pub fn response_time(&self) -> Option<f64> {
        match self {
            CptEventKind::Response { response_time, .. } => Some(*response_time),
            CptEventKind::Stimulus { .. } => None,
        }
    }

    pub fn stimulus_index(&self) -> Option<i32> {
        match self {
            CptEventKind::Response { stimulus_index, .. } => Some(*stimulus_index),
            CptEventKind::Stimulus { .. } => None,
        }
    }
}

/// Summary columns of 'dst_results'.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DstSummary {
    pub highest_span_achieved: i32,
    pub total_trials: i32,
    pub correct_trials: i32,
}

/// One digit-span trial, as submitted by the client and stored in 'dst_attempts'.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DstAttempt {
    #[serde(default)]
    pub span: i32,
    #[serde(default)]
    pub trial: i32,
    #[serde(default)]
    pub sequence: String,
    #[serde(default)]
    pub input: String,
    #[serde(default)]
    pub correct: bool,
    #[serde(default)]
    pub timestamp: f64,
}

/// Summary columns of 'tmt_results'.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TmtSummary {
    pub part_a_completion_time: f64,
    pub part_a_errors: i32,
    pub part_b_completion_time: f64,
    pub part_b_errors: i32,
    pub b_to_a_ratio: f64,
}

/// One trail-making click, as submitted by the client and stored in 'tmt_clicks'.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TmtClick {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub time: f64,
    #[serde(default)]
    pub target_item: i32,
    #[serde(default, alias = "part")]
    pub current_part: String,
}

pub type CptOutcome = ScoredTest<CptSummary, CptEvent>;
pub type DstOutcome = ScoredTest<DstSummary, DstAttempt>;
pub type TmtOutcome = ScoredTest<TmtSummary, TmtClick>;
