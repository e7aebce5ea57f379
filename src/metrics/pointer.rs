// src/metrics/pointer.rs

//! Pointer dynamics: click precision, path efficiency, overshoot and velocity.

use std::collections::HashMap;

use crate::{
    metrics::{MetricResult, stats},
    models::interaction::{InteractionData, PointerMovement},
};

/// Steps shorter than this are sensor jitter.
const MIN_SEGMENT_DISTANCE: f64 = 1.0;
/// Below this direct distance a path is too short to judge.
const MIN_DIRECT_DISTANCE: f64 = 10.0;
/// Velocities at or above this (units/s) are treated as sensor noise.
const MAX_VELOCITY: f64 = 10_000.0;
const MIN_OVERSHOOT_MOVEMENTS: usize = 5;
const OVERSHOOT_TOLERANCE: f64 = 1.1;
const OVERSHOOT_SCALE: f64 = 50.0;

/// 1 minus the mean normalized click-to-target distance.
pub fn click_precision(data: &InteractionData) -> MetricResult {
    let clicks = &data.interactions;
    if clicks.is_empty() {
        return MetricResult::insufficient(0);
    }

    let total: f64 = clicks
        .iter()
        .map(|c| {
            let dist = stats::distance(c.click_x, c.click_y, c.target_x, c.target_y);
            // Half the diagonal implied by the target coordinates.
            let max_distance = ((c.target_x.powi(2) + c.target_y.powi(2)).sqrt() / 2.0).max(1.0);
            (dist / max_distance).min(1.0)
        })
        .sum();

    let precision = 1.0 - total / clicks.len() as f64;
    MetricResult::calculated(precision, clicks.len())
}

/// Movements grouped by target id, each group sorted by time.
fn movements_by_target(movements: &[PointerMovement]) -> HashMap<&str, Vec<&PointerMovement>> {
    let mut grouped: HashMap<&str, Vec<&PointerMovement>> = HashMap::new();
    for m in movements.iter().filter(|m| !m.target_id.is_empty()) {
        grouped.entry(m.target_id.as_str()).or_default().push(m);
    }
    for group in grouped.values_mut() {
        group.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));
    }
    grouped
}

/// Ratio of straight-line to travelled distance on the way to each clicked target.
pub fn path_efficiency(data: &InteractionData) -> MetricResult {
    if data.movements.is_empty() {
        return MetricResult::insufficient(0);
    }

    let grouped = movements_by_target(&data.movements);
    let mut efficiencies = Vec::new();

    for click in &data.interactions {
        let Some(path) = grouped.get(click.target_id.as_str()) else {
            continue;
        };
        if path.len() < 2 {
            continue;
        }

        let first = path[0];
        let direct = stats::distance(first.x, first.y, click.click_x, click.click_y);
        if direct < MIN_DIRECT_DISTANCE {
            continue;
        }

        let mut actual = 0.0;
        let (mut last_x, mut last_y) = (first.x, first.y);
        for m in &path[1..] {
            let segment = stats::distance(last_x, last_y, m.x, m.y);
            // Sub-pixel steps keep the previous anchor so they cannot add up unnoticed.
            if segment > MIN_SEGMENT_DISTANCE {
                actual += segment;
                last_x = m.x;
                last_y = m.y;
            }
        }

        let final_segment = stats::distance(last_x, last_y, click.click_x, click.click_y);
        if final_segment > MIN_SEGMENT_DISTANCE {
            actual += final_segment;
        }

        if actual > 0.0 {
            efficiencies.push((direct / actual).min(1.0));
        }
    }

    match stats::mean(&efficiencies) {
        Some(avg) => MetricResult::calculated(avg, efficiencies.len()),
        None => MetricResult::insufficient(0),
    }
}

/// How far the pointer drifted back out after its closest approach to a target.
pub fn overshoot_rate(data: &InteractionData) -> MetricResult {
    if data.movements.is_empty() || data.interactions.is_empty() {
        return MetricResult::insufficient(0);
    }

    let grouped = movements_by_target(&data.movements);
    let mut scores = Vec::new();

    for click in &data.interactions {
        let Some(path) = grouped.get(click.target_id.as_str()) else {
            continue;
        };
        if path.len() < MIN_OVERSHOOT_MOVEMENTS {
            continue;
        }

        let distances: Vec<f64> = path
            .iter()
            .map(|m| stats::distance(m.x, m.y, click.target_x, click.target_y))
            .collect();

        let (min_idx, min_distance) = distances
            .iter()
            .copied()
            .enumerate()
            .fold((0, f64::INFINITY), |best, (i, d)| if d < best.1 { (i, d) } else { best });

        let mut score = 0.0;
        if min_idx > 0 && min_idx < distances.len() - 1 {
            let final_distance = distances[distances.len() - 1];
            if final_distance > min_distance * OVERSHOOT_TOLERANCE {
                score = ((final_distance - min_distance) / OVERSHOOT_SCALE).min(1.0);
            }
        }
        scores.push(score);
    }

    match stats::mean(&scores) {
        Some(avg) => MetricResult::calculated(avg, scores.len()),
        None => MetricResult::insufficient(0),
    }
}

/// Per-step velocities (units per second) in time order, noise removed.
fn velocities(movements: &[PointerMovement]) -> Vec<f64> {
    let mut sorted: Vec<&PointerMovement> = movements.iter().collect();
    sorted.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));

    sorted
        .windows(2)
        .filter_map(|pair| {
            let dt = (pair[1].timestamp - pair[0].timestamp) / 1000.0;
            if dt <= 0.0 {
                return None;
            }
            let dist = stats::distance(pair[0].x, pair[0].y, pair[1].x, pair[1].y);
            if dist < MIN_SEGMENT_DISTANCE {
                return None;
            }
            let velocity = dist / dt;
            (velocity > 0.0 && velocity < MAX_VELOCITY).then_some(velocity)
        })
        .collect()
}

pub fn average_velocity(data: &InteractionData) -> MetricResult {
    if data.movements.len() < 2 {
        return MetricResult::insufficient(0);
    }

    let samples = velocities(&data.movements);
    if samples.is_empty() {
        return MetricResult::insufficient(0);
    }

    if samples.len() > 10 {
        let trim = (samples.len() as f64 * 0.05).floor() as usize;
        let kept = samples.len() - 2 * trim;
        return match stats::trimmed_mean(&samples, 0.05) {
            Some(avg) => MetricResult::calculated(avg, kept),
            None => MetricResult::insufficient(samples.len()),
        };
    }

    match stats::mean(&samples) {
        Some(avg) => MetricResult::calculated(avg, samples.len()),
        None => MetricResult::insufficient(0),
    }
}

/// Coefficient of variation of pointer velocity.
pub fn velocity_variability(data: &InteractionData) -> MetricResult {
    if data.movements.len() < 3 {
        return MetricResult::insufficient(0);
    }

    let mut samples = velocities(&data.movements);
    if samples.len() < 3 {
        return MetricResult::insufficient(samples.len());
    }

    if samples.len() > 10 {
        let filtered = stats::iqr_filter(&samples);
        if filtered.len() > samples.len() / 2 {
            samples = filtered;
        }
    }

    match stats::coefficient_of_variation(&samples) {
        Some(cv) => MetricResult::calculated(cv, samples.len()),
        None => MetricResult::insufficient(samples.len()),
    }
}
