// src/models/question.rs

use std::{collections::HashSet, fs, path::Path};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The kind of a catalog question.
/// Standard kinds collect a textual answer; `Cpt`, `Dst` and `Tmt` collect a
/// structured trial payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionType {
    Radio,
    Dropdown,
    Checkbox,
    Text,
    Textarea,
    Cpt,
    Dst,
    Tmt,
}

impl QuestionType {
    pub fn is_cognitive_test(self) -> bool {
        matches!(self, QuestionType::Cpt | QuestionType::Dst | QuestionType::Tmt)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            QuestionType::Radio => "radio",
            QuestionType::Dropdown => "dropdown",
            QuestionType::Checkbox => "checkbox",
            QuestionType::Text => "text",
            QuestionType::Textarea => "textarea",
            QuestionType::Cpt => "cpt",
            QuestionType::Dst => "dst",
            QuestionType::Tmt => "tmt",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionOption {
    pub value: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A question definition from the catalog file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,

    #[serde(rename = "type")]
    pub question_type: QuestionType,

    /// Which interaction metrics are meaningful here: "mouse" or "keyboard".
    #[serde(default)]
    pub metrics_type: Option<String>,

    #[serde(default)]
    pub required: bool,

    /// Answer choices for standard questions, test settings for cognitive tests.
    #[serde(default)]
    pub options: Vec<QuestionOption>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u32>,
}

impl Question {
    /// Settings object handed to the client-side test runner (option label -> value).
    /// Standard questions have none.
    pub fn settings(&self) -> Option<serde_json::Value> {
        if !self.question_type.is_cognitive_test() {
            return None;
        }
        let settings: serde_json::Map<String, serde_json::Value> = self
            .options
            .iter()
            .map(|o| (o.label.clone(), serde_json::Value::String(o.value.clone())))
            .collect();
        Some(serde_json::Value::Object(settings))
    }

    /// Group used by the results page selector.
    pub fn group(&self) -> String {
        match self.question_type {
            QuestionType::Radio => "symptom".to_string(),
            QuestionType::Cpt | QuestionType::Dst | QuestionType::Tmt => {
                self.question_type.as_str().to_string()
            }
            _ => self.metrics_type.clone().unwrap_or_default(),
        }
    }
}

/// A selectable metric for the results views.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricOption {
    pub value: &'static str,
    pub label: &'static str,
}

const CPT_METRICS: &[MetricOption] = &[
    MetricOption { value: "reaction_time", label: "Reaction Time (ms)" },
    MetricOption { value: "detection_rate", label: "Detection Rate (%)" },
    MetricOption { value: "omission_error_rate", label: "Omission Error Rate (%)" },
    MetricOption { value: "commission_error_rate", label: "Commission Error Rate (%)" },
];

const TMT_METRICS: &[MetricOption] = &[
    MetricOption { value: "part_a_time", label: "Part A Time (ms)" },
    MetricOption { value: "part_b_time", label: "Part B Time (ms)" },
    MetricOption { value: "b_a_ratio", label: "B/A Ratio" },
    MetricOption { value: "part_a_errors", label: "Part A Errors" },
    MetricOption { value: "part_b_errors", label: "Part B Errors" },
];

const DST_METRICS: &[MetricOption] = &[
    MetricOption { value: "highest_span", label: "Highest Span Achieved" },
    MetricOption { value: "correct_trials", label: "Correct Trials" },
    MetricOption { value: "total_trials", label: "Total Trials" },
];

const KEYBOARD_METRICS: &[MetricOption] = &[
    MetricOption { value: "typing_speed", label: "Typing Speed" },
    MetricOption { value: "average_inter_key_interval", label: "Inter-Key Interval" },
    MetricOption { value: "typing_rhythm_variability", label: "Typing Rhythm Variability" },
    MetricOption { value: "correction_rate", label: "Correction Rate" },
    MetricOption { value: "keyboard_fluency", label: "Keyboard Fluency Score" },
];

const MOUSE_METRICS: &[MetricOption] = &[
    MetricOption { value: "click_precision", label: "Click Precision" },
    MetricOption { value: "path_efficiency", label: "Path Efficiency" },
    MetricOption { value: "overshoot_rate", label: "Overshoot Rate" },
    MetricOption { value: "average_velocity", label: "Average Velocity" },
    MetricOption { value: "velocity_variability", label: "Velocity Variability" },
];

/// Metrics that can be charted for a question. Cognitive tests expose their
/// summary scores; other questions expose interaction metrics by `metrics_type`,
/// falling back to pointer metrics.
pub fn metric_options(question: &Question) -> &'static [MetricOption] {
    match question.question_type {
        QuestionType::Cpt => CPT_METRICS,
        QuestionType::Tmt => TMT_METRICS,
        QuestionType::Dst => DST_METRICS,
        _ => match question.metrics_type.as_deref() {
            Some("keyboard") => KEYBOARD_METRICS,
            _ => MOUSE_METRICS,
        },
    }
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read question catalog: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse question catalog: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("question catalog has no questions")]
    Empty,

    #[error("duplicate question id '{0}'")]
    DuplicateId(String),
}

/// The ordered question list, loaded once at start-up and shared read-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Catalog {
    pub questions: Vec<Question>,
}

impl Catalog {
    pub fn new(questions: Vec<Question>) -> Result<Self, CatalogError> {
        if questions.is_empty() {
            return Err(CatalogError::Empty);
        }
        let mut seen = HashSet::new();
        for q in &questions {
            if !seen.insert(q.id.as_str()) {
                return Err(CatalogError::DuplicateId(q.id.clone()));
            }
        }
        Ok(Self { questions })
    }

    pub fn from_json(raw: &str) -> Result<Self, CatalogError> {
        let parsed: Catalog = serde_json::from_str(raw)?;
        Self::new(parsed.questions)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let raw = fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }

    pub fn find(&self, id: &str) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == id)
    }
}
