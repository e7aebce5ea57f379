// src/scoring/cpt.rs

//! Continuous-performance test scoring.

use serde::{Deserialize, Serialize};

use crate::{
    metrics::stats,
    models::cognitive::{CptEvent, CptEventKind, CptOutcome, CptSummary, ScoredTest},
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CptStimulus {
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub is_target: bool,
    #[serde(default)]
    pub presented_at: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CptResponse {
    #[serde(default)]
    pub stimulus: String,
    #[serde(default)]
    pub is_target: bool,
    #[serde(default)]
    pub response_time: f64,
    #[serde(default)]
    pub stimulus_index: i32,
}

/// Raw trial log posted by the client-side CPT runner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CptRawData {
    #[serde(default)]
    pub test_start_time: f64,
    #[serde(default)]
    pub test_end_time: f64,
    #[serde(default)]
    pub stimuli_presented: Vec<CptStimulus>,
    #[serde(default)]
    pub responses: Vec<CptResponse>,
    #[serde(default)]
    pub settings: serde_json::Map<String, serde_json::Value>,
}

impl CptRawData {
    pub fn total_targets(&self) -> usize {
        self.stimuli_presented.iter().filter(|s| s.is_target).count()
    }

    pub fn total_non_targets(&self) -> usize {
        self.stimuli_presented.len() - self.total_targets()
    }

    pub fn correct_detections(&self) -> usize {
        self.responses.iter().filter(|r| r.is_target).count()
    }

    pub fn commission_errors(&self) -> usize {
        self.responses.iter().filter(|r| !r.is_target).count()
    }

    /// Targets with no response. Never negative, even if the client logged
    /// more target responses than targets.
    pub fn omission_errors(&self) -> usize {
        self.total_targets().saturating_sub(self.correct_detections())
    }

    fn target_reaction_times(&self) -> Vec<f64> {
        self.responses
            .iter()
            .filter(|r| r.is_target)
            .map(|r| r.response_time)
            .collect()
    }
}

fn rate(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        return 0.0;
    }
    numerator as f64 / denominator as f64
}

fn count(n: usize) -> i32 {
    i32::try_from(n).unwrap_or(i32::MAX)
}

pub fn summarize(data: &CptRawData) -> CptSummary {
    let targets = data.total_targets();
    let reaction_times = data.target_reaction_times();

    CptSummary {
        correct_detections: count(data.correct_detections()),
        commission_errors: count(data.commission_errors()),
        omission_errors: count(data.omission_errors()),
        average_reaction_time: stats::mean(&reaction_times).unwrap_or(0.0),
        reaction_time_sd: stats::sample_std_dev(&reaction_times).unwrap_or(0.0),
        detection_rate: rate(data.correct_detections(), targets),
        omission_error_rate: rate(data.omission_errors(), targets),
        commission_error_rate: rate(data.commission_errors(), data.total_non_targets()),
    }
}

/// One stimulus event per presentation followed by one response event per response.
pub fn events(data: &CptRawData) -> Vec<CptEvent> {
    let stimuli = data.stimuli_presented.iter().map(|s| CptEvent {
        stimulus_value: s.value.clone(),
        is_target: s.is_target,
        kind: CptEventKind::Stimulus {
            presented_at: s.presented_at,
        },
    });
    let responses = data.responses.iter().map(|r| CptEvent {
        stimulus_value: r.stimulus.clone(),
        is_target: r.is_target,
        kind: CptEventKind::Response {
            response_time: r.response_time,
            stimulus_index: r.stimulus_index,
        },
    });
    stimuli.chain(responses).collect()
}

/// Scores a raw CPT payload, keeping it verbatim as `raw_data`.
pub fn score(raw: serde_json::Value) -> Result<CptOutcome, serde_json::Error> {
    let data: CptRawData = serde_json::from_value(raw.clone())?;
    Ok(ScoredTest {
        summary: summarize(&data),
        details: events(&data),
        raw_data: raw,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stimulus(value: &str, is_target: bool, at: f64) -> CptStimulus {
        CptStimulus {
            value: value.to_string(),
            is_target,
            presented_at: at,
        }
    }

    fn response(is_target: bool, rt: f64, index: i32) -> CptResponse {
        CptResponse {
            stimulus: if is_target { "X".into() } else { "A".into() },
            is_target,
            response_time: rt,
            stimulus_index: index,
        }
    }

    /// 10 targets, 10 non-targets, 8 hits and 1 false alarm.
    fn scenario() -> CptRawData {
        let mut stimuli = Vec::new();
        for i in 0..20 {
            let is_target = i % 2 == 0;
            let value = if is_target { "X" } else { "A" };
            stimuli.push(stimulus(value, is_target, i as f64 * 1000.0));
        }
        let mut responses: Vec<CptResponse> = (0..8)
            .map(|i| response(true, 400.0 + i as f64 * 10.0, i * 2))
            .collect();
        responses.push(response(false, 350.0, 1));

        CptRawData {
            test_start_time: 0.0,
            test_end_time: 20_000.0,
            stimuli_presented: stimuli,
            responses,
            settings: Default::default(),
        }
    }

    #[test]
    fn test_scenario_rates() {
        let summary = summarize(&scenario());
        assert_eq!(summary.correct_detections, 8);
        assert_eq!(summary.omission_errors, 2);
        assert_eq!(summary.commission_errors, 1);
        assert!((summary.detection_rate - 0.8).abs() < 1e-9);
        assert!((summary.omission_error_rate - 0.2).abs() < 1e-9);
        assert!((summary.commission_error_rate - 0.1).abs() < 1e-9);
        assert_eq!(summary.omission_errors + summary.correct_detections, 10);
    }

    #[test]
    fn test_reaction_time_uses_only_target_responses() {
        let summary = summarize(&scenario());
        // Hits at 400..=470 ms; the 350 ms false alarm is excluded.
        assert!((summary.average_reaction_time - 435.0).abs() < 1e-9);
        // Sample SD of 400, 410, ..., 470.
        assert!((summary.reaction_time_sd - 24.494_897).abs() < 1e-5);
    }

    #[test]
    fn test_zero_denominators_yield_zero() {
        let summary = summarize(&CptRawData {
            test_start_time: 0.0,
            test_end_time: 0.0,
            stimuli_presented: vec![],
            responses: vec![],
            settings: Default::default(),
        });
        assert_eq!(summary.detection_rate, 0.0);
        assert_eq!(summary.omission_error_rate, 0.0);
        assert_eq!(summary.commission_error_rate, 0.0);
        assert_eq!(summary.average_reaction_time, 0.0);
        assert_eq!(summary.reaction_time_sd, 0.0);
    }

    #[test]
    fn test_events_cover_stimuli_and_responses() {
        let data = scenario();
        let events = events(&data);
        assert_eq!(events.len(), 29);
        assert_eq!(events[0].kind.label(), "stimulus");
        assert_eq!(events[0].kind.presented_at(), Some(0.0));
        assert_eq!(events[0].kind.response_time(), None);

        let last = events.last().unwrap();
        assert_eq!(last.kind.label(), "response");
        assert_eq!(last.kind.stimulus_index(), Some(1));
        assert!(!last.is_target);
    }

    #[test]
    fn test_parses_client_payload() {
        let raw = r#"{
            "testStartTime": 10.5, "testEndTime": 900.0,
            "stimuliPresented": [{"value": "X", "isTarget": true, "presentedAt": 12.0}],
            "responses": [{"stimulus": "X", "isTarget": true, "responseTime": 321.0, "stimulusIndex": 0}],
            "settings": {"targetLetter": "X"}
        }"#;
        let outcome = score(serde_json::from_str(raw).unwrap()).unwrap();
        assert_eq!(outcome.summary.detection_rate, 1.0);
        assert_eq!(outcome.details.len(), 2);
        assert_eq!(outcome.raw_data["settings"]["targetLetter"], "X");
    }

    #[test]
    fn test_response_without_index_still_scores() {
        let raw = r#"{
            "stimuliPresented": [{"value": "X", "isTarget": true}],
            "responses": [{"isTarget": true, "responseTime": 300.0}],
            "sessionId": "abc"
        }"#;
        let outcome = score(serde_json::from_str(raw).unwrap()).unwrap();
        assert_eq!(outcome.summary.correct_detections, 1);
        assert_eq!(outcome.details[0].kind.presented_at(), Some(0.0));
        assert_eq!(outcome.details[1].kind.stimulus_index(), Some(0));
        assert_eq!(outcome.raw_data["sessionId"], "abc");
    }
}
