//! # API Endpoint Handlers

use super::{
    AppState,
    types::{
        ApiError, AverageRequest, FieldReport, FieldRequest, FormAdvanceRequest, FormApplyRequest,
        FormResponse, HealthResponse, PredictRequest, PredictResponse, StepRequest, StepResponse,
    },
};
use axum::{Json, extract::State, extract::rejection::JsonRejection, response::IntoResponse};
use diores_core::{Averages, FormState, Step};

// =============================================================================
// HEALTH HANDLER
// =============================================================================

/// Health check endpoint.
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse::default())
}

// =============================================================================
// ENGINE HANDLERS
// =============================================================================

/// Compute every average of a record.
pub async fn average_handler(
    body: Result<Json<AverageRequest>, JsonRejection>,
) -> Result<Json<Averages>, ApiError> {
    let Json(request) = body?;
    let (track, unfit) = request.resolve()?;
    let averages = Averages::compute(track, &request.record, unfit);
    tracing::debug!(%track, unfit, average = ?averages.track_average, "Averages computed");
    Ok(Json(averages))
}

/// Validate one field value.
pub async fn validate_field_handler(
    State(state): State<AppState>,
    body: Result<Json<FieldRequest>, JsonRejection>,
) -> Result<Json<FieldReport>, ApiError> {
    let Json(request) = body?;
    let value = request.value.map(|value| value.for_field(request.field));
    let error = state.validator.validate_field(request.field, value.as_ref());
    Ok(Json(FieldReport {
        field: request.field,
        error,
    }))
}

/// Check whether a step is complete.
pub async fn validate_step_handler(
    State(state): State<AppState>,
    body: Result<Json<StepRequest>, JsonRejection>,
) -> Result<Json<StepResponse>, ApiError> {
    let Json(request) = body?;
    Ok(Json(StepResponse::evaluate(&state.validator, &request)))
}

// =============================================================================
// FORM HANDLERS
// =============================================================================

/// Apply edits to a form state.
pub async fn form_apply_handler(
    State(state): State<AppState>,
    body: Result<Json<FormApplyRequest>, JsonRejection>,
) -> Result<Json<FormResponse>, ApiError> {
    let Json(request) = body?;
    let form = normalize(request.state).apply_all(request.changes)?;
    Ok(Json(FormResponse::describe(&state.validator, form)))
}

/// Move a form to its next step; 422 while the current step is incomplete.
pub async fn form_advance_handler(
    State(state): State<AppState>,
    body: Result<Json<FormAdvanceRequest>, JsonRejection>,
) -> Result<Json<FormResponse>, ApiError> {
    let Json(request) = body?;
    let form = normalize(request.state).advance(&state.validator)?;
    tracing::debug!(step = %form.step(), "Form advanced");
    Ok(Json(FormResponse::describe(&state.validator, form)))
}

/// Client-held states may carry stale derived fields.
fn normalize(form: FormState) -> FormState {
    let step = form.step();
    FormState::from_record(form.record().clone(), step)
}

// =============================================================================
// PREDICTION HANDLER
// =============================================================================

/// Finalize a record and forward it to the prediction service.
pub async fn predict_handler(
    State(state): State<AppState>,
    body: Result<Json<PredictRequest>, JsonRejection>,
) -> Result<Json<PredictResponse>, ApiError> {
    let Json(request) = body?;
    let form = FormState::from_record(request.record, Step::ExamInfo);
    let submitted = form.finalize(&state.validator, &state.config.payload)?;

    let prediction = state.client.predict(&submitted).await.map_err(|e| {
        tracing::error!("Prediction failed: {}", e);
        ApiError::from(e)
    })?;
    tracing::info!(
        track = %submitted.track,
        success = %prediction.success_probability,
        orientation = %prediction.orientation_probability,
        "Prediction received"
    );

    Ok(Json(PredictResponse::new(submitted, prediction)))
}
