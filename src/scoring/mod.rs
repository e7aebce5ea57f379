// src/scoring/mod.rs

//! Cognitive test scorers.
//!
//! Each scorer reduces a raw client trial log into a summary record plus a
//! list of detail records. Scoring is pure; persistence happens elsewhere.

pub mod cpt;
pub mod dst;
pub mod tmt;

use crate::models::{
    cognitive::{CptOutcome, DstOutcome, TmtOutcome},
    question::QuestionType,
};

/// A scored cognitive test of any kind.
#[derive(Debug, Clone, PartialEq)]
pub enum TestOutcome {
    Cpt(CptOutcome),
    Dst(DstOutcome),
    Tmt(TmtOutcome),
}

impl TestOutcome {
    pub fn question_type(&self) -> QuestionType {
        match self {
            TestOutcome::Cpt(_) => QuestionType::Cpt,
            TestOutcome::Dst(_) => QuestionType::Dst,
            TestOutcome::Tmt(_) => QuestionType::Tmt,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ScoringError {
    #[error("question type '{0}' is not a cognitive test")]
    NotATest(&'static str),
    #[error("malformed test payload: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Parses `payload` as the raw data of the given test type and scores it.
/// The parsed document is stored unchanged as the outcome's `raw_data`.
pub fn score_payload(
    question_type: QuestionType,
    payload: &str,
) -> Result<TestOutcome, ScoringError> {
    let raw: serde_json::Value = serde_json::from_str(payload)?;
    let outcome = match question_type {
        QuestionType::Cpt => TestOutcome::Cpt(cpt::score(raw)?),
        QuestionType::Dst => TestOutcome::Dst(dst::score(raw)?),
        QuestionType::Tmt => TestOutcome::Tmt(tmt::score(raw)?),
        other => return Err(ScoringError::NotATest(other.as_str())),
    };
    Ok(outcome)
}
