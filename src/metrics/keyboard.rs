// src/metrics/keyboard.rs

//! Keystroke dynamics: speed, rhythm, hold times, corrections and pauses.

use std::collections::HashMap;

use crate::{
    metrics::{
        AVERAGE_INTER_KEY_INTERVAL, AVERAGE_KEY_HOLD_TIME, CORRECTION_RATE,
        DEEP_THINKING_PAUSE_RATE, IMMEDIATE_CORRECTION_TENDENCY, KEY_PRESS_VARIABILITY,
        KEYBOARD_FLUENCY, MetricResult, MetricSet, PAUSE_RATE, TYPING_RHYTHM_VARIABILITY,
        TYPING_SPEED, stats,
    },
    models::interaction::{InteractionData, KeyEventType, KeyboardEvent},
};

const MIN_EVENTS: usize = 3;
const MIN_KEYDOWNS: usize = 5;
const MIN_INTERVALS: usize = 3;
const MIN_PAUSE_INTERVALS: usize = 5;
const MIN_HOLD_TIMES: usize = 5;
const MIN_CONTENT_KEYS: usize = 3;

const HOLD_TIME_RANGE_MS: (f64, f64) = (20.0, 1000.0);
const PAUSE_FLOOR_MS: f64 = 1000.0;
const DEEP_PAUSE_MS: f64 = 5000.0;
/// Corrections this many key-downs apart or closer count as immediate.
const IMMEDIATE_CORRECTION_WINDOW: usize = 3;

/// All keyboard metrics for one bucket. Metrics whose thresholds are not met
/// are returned uncalculated.
pub fn keyboard_metrics(data: &InteractionData) -> MetricSet {
    let mut metrics = MetricSet::new();
    for key in [
        TYPING_SPEED,
        AVERAGE_INTER_KEY_INTERVAL,
        TYPING_RHYTHM_VARIABILITY,
        AVERAGE_KEY_HOLD_TIME,
        KEY_PRESS_VARIABILITY,
        CORRECTION_RATE,
        IMMEDIATE_CORRECTION_TENDENCY,
        PAUSE_RATE,
        DEEP_THINKING_PAUSE_RATE,
        KEYBOARD_FLUENCY,
    ] {
        metrics.insert(key, MetricResult::insufficient(0));
    }

    if data.keyboard_events.len() < MIN_EVENTS {
        return metrics;
    }

    let mut events: Vec<&KeyboardEvent> = data.keyboard_events.iter().collect();
    events.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));

    let keydowns: Vec<&KeyboardEvent> = events
        .iter()
        .copied()
        .filter(|e| e.event_type == KeyEventType::Keydown)
        .collect();

    if let Some(speed) = typing_speed(&keydowns) {
        metrics.insert(TYPING_SPEED, speed);
    }

    let intervals: Vec<f64> = keydowns
        .windows(2)
        .map(|pair| pair[1].timestamp - pair[0].timestamp)
        .collect();

    if let Some((avg, variability)) = rhythm(&intervals) {
        metrics.insert(AVERAGE_INTER_KEY_INTERVAL, avg);
        if let Some(variability) = variability {
            metrics.insert(TYPING_RHYTHM_VARIABILITY, variability);
        }
    }

    if let Some((pauses, deep)) = pauses(&intervals) {
        metrics.insert(PAUSE_RATE, pauses);
        metrics.insert(DEEP_THINKING_PAUSE_RATE, deep);
    }

    if let Some((avg, variability)) = hold_times(&events) {
        metrics.insert(AVERAGE_KEY_HOLD_TIME, avg);
        metrics.insert(KEY_PRESS_VARIABILITY, variability);
    }

    let (correction_rate, immediate) = corrections(&keydowns);
    if let Some(rate) = correction_rate {
        metrics.insert(CORRECTION_RATE, rate);
    }
    if let Some(tendency) = immediate {
        metrics.insert(IMMEDIATE_CORRECTION_TENDENCY, tendency);
    }

    if let Some(fluency) = fluency(&metrics) {
        metrics.insert(KEYBOARD_FLUENCY, fluency);
    }

    metrics
}

/// Content keys per second between the first and last key-down.
fn typing_speed(keydowns: &[&KeyboardEvent]) -> Option<MetricResult> {
    if keydowns.len() < MIN_KEYDOWNS {
        return None;
    }
    let content_keys = keydowns.iter().filter(|e| e.is_content_key()).count();
    let elapsed_secs = (keydowns[keydowns.len() - 1].timestamp - keydowns[0].timestamp) / 1000.0;
    if elapsed_secs <= 0.0 || content_keys == 0 {
        return None;
    }
    Some(MetricResult::calculated(
        content_keys as f64 / elapsed_secs,
        content_keys,
    ))
}

/// Mean inter-key interval and its coefficient of variation, with intervals
/// beyond 1.5× the 95th percentile excluded. The variation is undefined for a
/// zero mean; the mean is still reported.
fn rhythm(intervals: &[f64]) -> Option<(MetricResult, Option<MetricResult>)> {
    if intervals.len() < MIN_INTERVALS {
        return None;
    }
    let ceiling = stats::percentile(intervals, 0.95)? * 1.5;
    let filtered: Vec<f64> = intervals.iter().copied().filter(|i| *i <= ceiling).collect();
    if filtered.len() < MIN_INTERVALS {
        return None;
    }

    let avg = stats::mean(&filtered)?;
    let cv = stats::coefficient_of_variation(&filtered)
        .map(|cv| MetricResult::calculated(cv, filtered.len()));
    Some((MetricResult::calculated(avg, filtered.len()), cv))
}

fn pauses(intervals: &[f64]) -> Option<(MetricResult, MetricResult)> {
    if intervals.len() < MIN_PAUSE_INTERVALS {
        return None;
    }
    let avg = stats::mean(intervals)?;
    let threshold = (avg * 3.0).max(PAUSE_FLOOR_MS);

    let pauses: Vec<f64> = intervals.iter().copied().filter(|i| *i > threshold).collect();
    let deep = pauses.iter().filter(|i| **i > DEEP_PAUSE_MS).count();

    let n = intervals.len();
    Some((
        MetricResult::calculated(pauses.len() as f64 / n as f64, n),
        MetricResult::calculated(deep as f64 / n as f64, n),
    ))
}

/// Key hold durations matched key-down to key-up per key.
fn hold_times(events: &[&KeyboardEvent]) -> Option<(MetricResult, MetricResult)> {
    let mut pressed: HashMap<&str, f64> = HashMap::new();
    let mut holds = Vec::new();

    for event in events {
        match event.event_type {
            KeyEventType::Keydown => {
                pressed.insert(event.key.as_str(), event.timestamp);
            }
            KeyEventType::Keyup => {
                if let Some(down) = pressed.remove(event.key.as_str()) {
                    let hold = event.timestamp - down;
                    if (HOLD_TIME_RANGE_MS.0..=HOLD_TIME_RANGE_MS.1).contains(&hold) {
                        holds.push(hold);
                    }
                }
            }
            KeyEventType::Other => {}
        }
    }

    if holds.len() < MIN_HOLD_TIMES {
        return None;
    }
    let filtered = stats::iqr_filter(&holds);
    if filtered.len() < MIN_HOLD_TIMES {
        return None;
    }

    let avg = stats::mean(&filtered)?;
    let cv = stats::coefficient_of_variation(&filtered)?;
    Some((
        MetricResult::calculated(avg, filtered.len()),
        MetricResult::calculated(cv, filtered.len()),
    ))
}

/// Correction rate per content key, and the share of corrections that
/// closely follow another correction.
fn corrections(keydowns: &[&KeyboardEvent]) -> (Option<MetricResult>, Option<MetricResult>) {
    if keydowns.len() < MIN_KEYDOWNS {
        return (None, None);
    }

    let mut correction_count = 0usize;
    let mut immediate = 0usize;
    let mut last_correction: Option<usize> = None;
    let mut char_count = 0usize;

    for (i, event) in keydowns.iter().enumerate() {
        if event.is_correction() {
            correction_count += 1;
            if let Some(last) = last_correction {
                if i - last <= IMMEDIATE_CORRECTION_WINDOW {
                    immediate += 1;
                }
            }
            last_correction = Some(i);
        } else if event.is_content_key() {
            char_count += 1;
        }
    }

    if char_count < MIN_CONTENT_KEYS {
        return (None, None);
    }

    let rate = MetricResult::calculated(correction_count as f64 / char_count as f64, char_count);
    let tendency = (correction_count > 0).then(|| {
        MetricResult::calculated(immediate as f64 / correction_count as f64, correction_count)
    });
    (Some(rate), tendency)
}

/// Composite 0-100 score blending speed, rhythm consistency and correction quality.
fn fluency(metrics: &MetricSet) -> Option<MetricResult> {
    let speed = metrics.get(TYPING_SPEED)?;
    let speed_value = speed.get()?;
    metrics.get(AVERAGE_INTER_KEY_INTERVAL)?.get()?;
    let rhythm = metrics.get(TYPING_RHYTHM_VARIABILITY)?.get()?;

    let correction_quality = metrics
        .get(CORRECTION_RATE)
        .and_then(MetricResult::get)
        .map_or(1.0, |rate| 1.0 / (1.0 + rate));

    let score = 100.0
        * ((speed_value / 5.0).min(1.0) * 0.4
            + (1.0 / (1.0 + rhythm)) * 0.4
            + correction_quality * 0.2);

    Some(MetricResult::calculated(score.min(100.0), speed.sample_size))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(event_type: KeyEventType, key: &str, t: f64) -> KeyboardEvent {
        KeyboardEvent {
            event_type,
            key: key.to_string(),
            is_modifier: false,
            timestamp: t,
            question_id: String::new(),
        }
    }

    /// Types `text` with a key-down every `gap` ms and a `hold` ms key-up.
    fn typed(text: &[&str], gap: f64, hold: f64) -> InteractionData {
        let mut events = Vec::new();
        for (i, k) in text.iter().enumerate() {
            let t = i as f64 * gap;
            events.push(key(KeyEventType::Keydown, k, t));
            events.push(key(KeyEventType::Keyup, k, t + hold));
        }
        InteractionData {
            keyboard_events: events,
            ..Default::default()
        }
    }

    #[test]
    fn test_too_few_events_calculates_nothing() {
        let data = typed(&["a"], 100.0, 50.0);
        let metrics = keyboard_metrics(&data);
        assert_eq!(metrics.len(), 10);
        assert!(metrics.values().all(|m| !m.calculated));
    }

    #[test]
    fn test_steady_typing() {
        let data = typed(&["h", "e", "l", "l", "o", " ", "w", "o", "r", "l", "d"], 200.0, 80.0);
        let metrics = keyboard_metrics(&data);

        // 11 content keys over 2 seconds.
        let speed = metrics[TYPING_SPEED];
        assert!(speed.calculated);
        assert!((speed.value - 5.5).abs() < 1e-9);

        assert!((metrics[AVERAGE_INTER_KEY_INTERVAL].value - 200.0).abs() < 1e-9);
        assert!(metrics[TYPING_RHYTHM_VARIABILITY].value.abs() < 1e-9);
        assert!((metrics[AVERAGE_KEY_HOLD_TIME].value - 80.0).abs() < 1e-9);
        assert_eq!(metrics[CORRECTION_RATE].value, 0.0);
        assert!(!metrics[IMMEDIATE_CORRECTION_TENDENCY].calculated);
        assert_eq!(metrics[PAUSE_RATE].value, 0.0);

        // Speed contribution capped at 1, perfect rhythm and no corrections.
        let fluency = metrics[KEYBOARD_FLUENCY];
        assert!(fluency.calculated);
        assert!((fluency.value - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_corrections_and_immediate_tendency() {
        let data = typed(
            &["a", "b", "Backspace", "c", "Backspace", "d", "e", "f", "g", "h", "Backspace"],
            150.0,
            60.0,
        );
        let metrics = keyboard_metrics(&data);

        // 3 corrections over 8 content keys.
        assert!((metrics[CORRECTION_RATE].value - 3.0 / 8.0).abs() < 1e-9);
        // Second backspace is 2 positions after the first; the third is 6 after.
        assert!((metrics[IMMEDIATE_CORRECTION_TENDENCY].value - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_pause_rates() {
        let mut events = Vec::new();
        let times = [0.0, 100.0, 200.0, 300.0, 400.0, 6400.0, 6500.0, 6600.0];
        for t in times {
            events.push(key(KeyEventType::Keydown, "x", t));
        }
        let data = InteractionData {
            keyboard_events: events,
            ..Default::default()
        };
        let metrics = keyboard_metrics(&data);

        // 7 intervals, one of 6000 ms: above max(3 * mean, 1000) and above 5000.
        assert!((metrics[PAUSE_RATE].value - 1.0 / 7.0).abs() < 1e-9);
        assert!((metrics[DEEP_THINKING_PAUSE_RATE].value - 1.0 / 7.0).abs() < 1e-9);
    }

    #[test]
    fn test_hold_times_outside_range_are_dropped() {
        let mut events = Vec::new();
        for i in 0..6 {
            let t = i as f64 * 300.0;
            events.push(key(KeyEventType::Keydown, "k", t));
            // 10 ms is below the plausible hold range.
            events.push(key(KeyEventType::Keyup, "k", t + 10.0));
        }
        let data = InteractionData {
            keyboard_events: events,
            ..Default::default()
        };
        let metrics = keyboard_metrics(&data);
        assert!(!metrics[AVERAGE_KEY_HOLD_TIME].calculated);
        assert!(!metrics[KEY_PRESS_VARIABILITY].calculated);
    }

    #[test]
    fn test_simultaneous_keydowns_keep_the_average_interval() {
        let events = ["a", "b", "c", "d", "e", "f"]
            .iter()
            .map(|k| key(KeyEventType::Keydown, k, 1000.0))
            .collect();
        let data = InteractionData {
            keyboard_events: events,
            ..Default::default()
        };
        let metrics = keyboard_metrics(&data);

        let avg = metrics[AVERAGE_INTER_KEY_INTERVAL];
        assert!(avg.calculated);
        assert_eq!(avg.value, 0.0);
        assert_eq!(avg.sample_size, 5);
        assert!(!metrics[TYPING_RHYTHM_VARIABILITY].calculated);
        assert!(!metrics[KEYBOARD_FLUENCY].calculated);
    }

    #[test]
    fn test_fluency_requires_rhythm() {
        // Only keyups: no keydowns, so no speed and no fluency.
        let events = (0..5)
            .map(|i| key(KeyEventType::Keyup, "a", i as f64 * 100.0))
            .collect();
        let data = InteractionData {
            keyboard_events: events,
            ..Default::default()
        };
        assert!(!keyboard_metrics(&data)[KEYBOARD_FLUENCY].calculated);
    }
}
