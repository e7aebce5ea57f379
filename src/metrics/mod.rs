// src/metrics/mod.rs

//! Interaction metrics engine.
//!
//! Pure functions turning raw pointer and keyboard telemetry into behavioral
//! metrics. Nothing here touches the database or mutates its input.

pub mod keyboard;
pub mod pointer;
pub mod stats;

use std::collections::BTreeMap;

use serde::Serialize;

use crate::models::{assessment::NewAssessmentMetric, interaction::InteractionData};

/// Question id under which metrics of the unfiltered global bucket are stored.
pub const GLOBAL_QUESTION_ID: &str = "global";

pub const CLICK_PRECISION: &str = "click_precision";
pub const PATH_EFFICIENCY: &str = "path_efficiency";
pub const OVERSHOOT_RATE: &str = "overshoot_rate";
pub const AVERAGE_VELOCITY: &str = "average_velocity";
pub const VELOCITY_VARIABILITY: &str = "velocity_variability";

pub const TYPING_SPEED: &str = "typing_speed";
pub const AVERAGE_INTER_KEY_INTERVAL: &str = "average_inter_key_interval";
pub const TYPING_RHYTHM_VARIABILITY: &str = "typing_rhythm_variability";
pub const AVERAGE_KEY_HOLD_TIME: &str = "average_key_hold_time";
pub const KEY_PRESS_VARIABILITY: &str = "key_press_variability";
pub const CORRECTION_RATE: &str = "correction_rate";
pub const IMMEDIATE_CORRECTION_TENDENCY: &str = "immediate_correction_tendency";
pub const PAUSE_RATE: &str = "pause_rate";
pub const DEEP_THINKING_PAUSE_RATE: &str = "deep_thinking_pause_rate";
pub const KEYBOARD_FLUENCY: &str = "keyboard_fluency";

/// Outcome of a single metric calculation.
///
/// When `calculated` is false the sample was too small and `value` carries no
/// meaning; such results are never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricResult {
    pub value: f64,
    pub calculated: bool,
    pub sample_size: usize,
}

impl MetricResult {
    pub fn calculated(value: f64, sample_size: usize) -> Self {
        Self {
            value,
            calculated: true,
            sample_size,
        }
    }

    pub fn insufficient(sample_size: usize) -> Self {
        Self {
            value: 0.0,
            calculated: false,
            sample_size,
        }
    }

    /// The value, if the metric was calculated.
    pub fn get(&self) -> Option<f64> {
        self.calculated.then_some(self.value)
    }
}

pub type MetricSet = BTreeMap<&'static str, MetricResult>;

/// Calculated metrics split by scope.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CalculatedMetrics {
    pub global_metrics: Vec<NewAssessmentMetric>,
    pub question_metrics: Vec<NewAssessmentMetric>,
}

impl CalculatedMetrics {
    pub fn is_empty(&self) -> bool {
        self.global_metrics.is_empty() && self.question_metrics.is_empty()
    }

    pub fn into_rows(self) -> Vec<NewAssessmentMetric> {
        let mut rows = self.global_metrics;
        rows.extend(self.question_metrics);
        rows
    }
}

/// Every pointer and keyboard metric for one bucket of events.
pub fn compute_metrics(data: &InteractionData) -> MetricSet {
    let mut metrics = MetricSet::new();
    metrics.insert(CLICK_PRECISION, pointer::click_precision(data));
    metrics.insert(PATH_EFFICIENCY, pointer::path_efficiency(data));
    metrics.insert(OVERSHOOT_RATE, pointer::overshoot_rate(data));
    metrics.insert(AVERAGE_VELOCITY, pointer::average_velocity(data));
    metrics.insert(VELOCITY_VARIABILITY, pointer::velocity_variability(data));
    metrics.extend(keyboard::keyboard_metrics(data));
    metrics
}

/// Computes metrics for the global bucket and for every question bucket,
/// keeping only the calculated ones.
pub fn calculate_interaction_metrics(data: &InteractionData) -> CalculatedMetrics {
    let (global, questions) = data.partition();

    let global_metrics = to_rows(GLOBAL_QUESTION_ID, &compute_metrics(&global));
    let question_metrics = questions
        .iter()
        .flat_map(|(question_id, bucket)| to_rows(question_id, &compute_metrics(bucket)))
        .collect();

    CalculatedMetrics {
        global_metrics,
        question_metrics,
    }
}

fn to_rows(question_id: &str, metrics: &MetricSet) -> Vec<NewAssessmentMetric> {
    metrics
        .iter()
        .filter(|(_, result)| result.calculated)
        .map(|(key, result)| NewAssessmentMetric {
            question_id: question_id.to_string(),
            metric_key: (*key).to_string(),
            metric_value: result.value,
            sample_size: i32::try_from(result.sample_size).unwrap_or(i32::MAX),
        })
        .collect()
}
