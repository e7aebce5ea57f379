// src/handlers/results.rs

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Query, State},
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};

use crate::{
    error::AppError,
    models::question::{Catalog, MetricOption, Question, QuestionType, metric_options},
    repository::PgStore,
    utils::jwt::Claims,
};

#[derive(Debug, Serialize)]
pub struct ChartQuestion {
    pub id: String,
    pub title: String,
    pub group: String,
    pub metrics: &'static [MetricOption],
}

#[derive(Debug, Serialize)]
pub struct ChartOptions {
    /// Radio questions whose numeric answers serve as symptom scores.
    pub symptoms: Vec<ChartQuestion>,
    /// Questions with chartable metrics.
    pub questions: Vec<ChartQuestion>,
}

#[derive(Debug, Deserialize)]
pub struct TimelineParams {
    pub question: String,
    pub metric: String,
}

#[derive(Debug, Deserialize)]
pub struct CorrelationParams {
    pub symptom: String,
    pub question: String,
    pub metric: String,
}

fn chart_options(catalog: &Catalog) -> ChartOptions {
    let mut symptoms = Vec::new();
    let mut questions = Vec::new();
    for q in &catalog.questions {
        let entry = ChartQuestion {
            id: q.id.clone(),
            title: q.title.clone(),
            group: q.group(),
            metrics: metric_options(q),
        };
        if q.question_type == QuestionType::Radio {
            symptoms.push(entry);
        } else if q.question_type.is_cognitive_test() || q.metrics_type.is_some() {
            questions.push(entry);
        }
    }
    ChartOptions { symptoms, questions }
}

fn known_question<'a>(catalog: &'a Catalog, id: &str) -> Result<&'a Question, AppError> {
    catalog
        .find(id)
        .ok_or_else(|| AppError::NotFound(format!("Unknown question '{id}'")))
}

fn symptom_question<'a>(catalog: &'a Catalog, id: &str) -> Result<&'a Question, AppError> {
    let question = known_question(catalog, id)?;
    if question.question_type != QuestionType::Radio {
        return Err(AppError::BadRequest(format!("'{id}' is not a symptom question")));
    }
    Ok(question)
}

/// Selectable questions and metrics for the charts.
pub async fn options(State(catalog): State<Arc<Catalog>>) -> impl IntoResponse {
    Json(chart_options(&catalog))
}

/// One metric over the user's completed attempts.
pub async fn timeline(
    State(store): State<PgStore>,
    State(catalog): State<Arc<Catalog>>,
    Extension(claims): Extension<Claims>,
    Query(params): Query<TimelineParams>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    known_question(&catalog, &params.question)?;
    let points = store
        .timeline(user_id, &params.question, &params.metric)
        .await?;
    Ok(Json(points))
}

/// One metric paired with a symptom score, per completed attempt.
pub async fn correlation(
    State(store): State<PgStore>,
    State(catalog): State<Arc<Catalog>>,
    Extension(claims): Extension<Claims>,
    Query(params): Query<CorrelationParams>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    symptom_question(&catalog, &params.symptom)?;
    known_question(&catalog, &params.question)?;
    let points = store
        .correlation(user_id, &params.symptom, &params.question, &params.metric)
        .await?;
    Ok(Json(points))
}
