// src/handlers/assessment.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use validator::Validate;

use crate::{
    error::AppError,
    models::assessment::AdvanceRequest,
    repository::PgStore,
    services::assessment::AssessmentService,
    utils::jwt::Claims,
};

/// Current question of the user's attempt, starting one if needed.
pub async fn current(
    State(service): State<AssessmentService<PgStore>>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    let view = service.current(user_id).await?;
    Ok(Json(view))
}

/// Answer the current question.
///
/// Returns the next question, or the collected answers once the last
/// question is answered. A required question submitted empty yields 422 with
/// the same question re-served.
pub async fn next(
    State(service): State<AssessmentService<PgStore>>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<AdvanceRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let user_id = claims.user_id()?;
    let step = service.advance(user_id, payload).await?;
    Ok(Json(step))
}

/// Go back one question.
pub async fn prev(
    State(service): State<AssessmentService<PgStore>>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    let view = service.retreat(user_id).await?;
    Ok(Json(view))
}

/// Collected answers of one of the user's attempts.
pub async fn results(
    State(service): State<AssessmentService<PgStore>>,
    Extension(claims): Extension<Claims>,
    Path(assessment_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    let results = service.results(user_id, assessment_id).await?;
    Ok(Json(results))
}
