use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};

use crate::{
    error::AppError, models::interaction::InteractionData, repository::PgStore,
    services::assessment::AssessmentService, utils::jwt::Claims,
};

/// Ingest a pointer/keyboard telemetry bundle.
pub async fn save_metrics(
    State(service): State<AssessmentService<PgStore>>,
    Extension(claims): Extension<Claims>,
    Json(data): Json<InteractionData>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    let recorded = service.record_interactions(user_id, &data).await?;
    Ok((StatusCode::CREATED, Json(recorded)))
}
