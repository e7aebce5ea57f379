// src/models/interaction.rs

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Raw telemetry bundle captured by the client tracker.
///
/// Timestamps are milliseconds relative to an arbitrary session epoch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionData {
    #[serde(default)]
    pub movements: Vec<PointerMovement>,
    #[serde(default)]
    pub interactions: Vec<PointerInteraction>,
    #[serde(default)]
    pub keyboard_events: Vec<KeyboardEvent>,
    #[serde(default)]
    pub start_time: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointerMovement {
    pub x: f64,
    pub y: f64,
    pub timestamp: f64,
    #[serde(default)]
    pub target_id: String,
    #[serde(default)]
    pub question_id: String,
}

/// A click on a tracked element, with the element's reference point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointerInteraction {
    pub target_id: String,
    #[serde(default)]
    pub target_type: String,
    #[serde(default)]
    pub question_id: String,
    pub click_x: f64,
    pub click_y: f64,
    pub target_x: f64,
    pub target_y: f64,
    pub timestamp: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyEventType {
    Keydown,
    Keyup,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyboardEvent {
    #[serde(rename = "type")]
    pub event_type: KeyEventType,
    pub key: String,
    #[serde(default)]
    pub is_modifier: bool,
    pub timestamp: f64,
    #[serde(default)]
    pub question_id: String,
}

impl KeyboardEvent {
    /// Single visible characters plus Space and Enter count as typed content.
    pub fn is_content_key(&self) -> bool {
        self.key.chars().count() == 1 || self.key == "Space" || self.key == "Enter"
    }

    pub fn is_correction(&self) -> bool {
        self.key == "Backspace" || self.key == "Delete"
    }
}

impl InteractionData {
    /// Splits the bundle into the global bucket (events without a question id)
    /// and one bucket per question id.
    pub fn partition(&self) -> (InteractionData, BTreeMap<String, InteractionData>) {
        let mut global = InteractionData {
            start_time: self.start_time,
            ..Default::default()
        };
        let mut questions: BTreeMap<String, InteractionData> = BTreeMap::new();

        for m in &self.movements {
            if m.question_id.is_empty() {
                global.movements.push(m.clone());
            } else {
                questions
                    .entry(m.question_id.clone())
                    .or_default()
                    .movements
                    .push(m.clone());
            }
        }

        for i in &self.interactions {
            if i.question_id.is_empty() {
                global.interactions.push(i.clone());
            } else {
                questions
                    .entry(i.question_id.clone())
                    .or_default()
                    .interactions
                    .push(i.clone());
            }
        }

        for k in &self.keyboard_events {
            if k.question_id.is_empty() {
                global.keyboard_events.push(k.clone());
            } else {
                questions
                    .entry(k.question_id.clone())
                    .or_default()
                    .keyboard_events
                    .push(k.clone());
            }
        }

        (global, questions)
    }
}
