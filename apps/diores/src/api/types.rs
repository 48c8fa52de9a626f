//! # API Request/Response Types
//!
//! JSON bodies of the HTTP API, and the mapping of failures to status codes.

use crate::client::ClientError;
use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use diores_core::{
    Averages, DioresError, ExamCheckFailure, Field, FieldChange, FieldError, FieldValue,
    FieldValidator, FormState, PredictionRequest, PredictionResponse, ProbabilityBand, Score,
    Step, StudentRecord, Track,
};
use serde::{Deserialize, Serialize};

// =============================================================================
// HEALTH RESPONSE
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

// =============================================================================
// AVERAGE
// =============================================================================

/// `POST /average` body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AverageRequest {
    /// Track to average for; defaults to the record's `Série`.
    #[serde(default)]
    pub track: Option<Track>,
    pub record: StudentRecord,
    /// Overrides the record's `Inapte_EPS` flag.
    #[serde(default)]
    pub unfit_for_pe: Option<bool>,
}

impl AverageRequest {
    /// Track and unfit flag, falling back on the record.
    pub fn resolve(&self) -> Result<(Track, bool), ApiError> {
        let track = self
            .track
            .or_else(|| self.record.track())
            .ok_or_else(|| ApiError::bad_request("No track given and record has no Série"))?;
        let unfit = self
            .unfit_for_pe
            .unwrap_or_else(|| self.record.unfit_for_pe());
        Ok((track, unfit))
    }
}

// =============================================================================
// FIELD VALIDATION
// =============================================================================

/// `POST /validate/field` body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldRequest {
    pub field: Field,
    #[serde(default)]
    pub value: Option<FieldValue>,
}

/// One field and its error, `null` when valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldReport {
    pub field: Field,
    pub error: Option<FieldError>,
}

// =============================================================================
// STEP VALIDATION
// =============================================================================

/// `POST /validate/step` body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepRequest {
    pub step: Step,
    pub record: StudentRecord,
    #[serde(default)]
    pub track: Option<Track>,
    #[serde(default)]
    pub unfit_for_pe: Option<bool>,
}

/// Outcome of a step check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepResponse {
    pub step: Step,
    pub valid: bool,
    /// Step fields that are missing or out of range.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub invalid_fields: Vec<Field>,
    /// First failed exam condition.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<ExamCheckFailure>,
    /// Computed track average, when the exam step validates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub computed_average: Option<Score>,
}

impl StepResponse {
    /// Evaluate `request` with `validator`.
    #[must_use]
    pub fn evaluate(validator: &FieldValidator, request: &StepRequest) -> Self {
        let record = &request.record;
        let track = request.track.or_else(|| record.track());
        let unfit = request.unfit_for_pe.unwrap_or_else(|| record.unfit_for_pe());

        let step = request.step;
        let valid = validator.step_complete(step, record, track, unfit);

        // The listing below only explains the verdict.
        let (failure, computed_average) = match step {
            Step::ExamInfo => match validator.check_exam(record, track, unfit) {
                Ok(average) => (None, Some(average)),
                Err(failure) => (Some(failure), None),
            },
            _ => (None, None),
        };
        let invalid_fields = step
            .fields()
            .iter()
            .copied()
            .filter(|&field| {
                !record.is_present(field) || validator.validate_record_field(record, field).is_some()
            })
            .collect();

        Self {
            step,
            valid,
            invalid_fields,
            failure,
            computed_average,
        }
    }
}

// =============================================================================
// FORM REDUCER
// =============================================================================

/// `POST /form/apply` body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormApplyRequest {
    #[serde(default)]
    pub state: FormState,
    pub changes: Vec<FieldChange>,
}

/// `POST /form/advance` body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormAdvanceRequest {
    pub state: FormState,
}

/// Form state plus everything the form renders next to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormResponse {
    pub state: FormState,
    pub averages: Option<Averages>,
    pub can_advance: bool,
    /// Errors of the fields present in the record.
    pub errors: Vec<FieldReport>,
}

impl FormResponse {
    /// Describe `state` under `validator`.
    #[must_use]
    pub fn describe(validator: &FieldValidator, state: FormState) -> Self {
        let errors = validator
            .field_errors(state.record())
            .into_iter()
            .map(|(field, error)| FieldReport {
                field,
                error: Some(error),
            })
            .collect();
        Self {
            averages: state.averages(),
            can_advance: state.can_advance(validator),
            errors,
            state,
        }
    }
}

// =============================================================================
// PREDICTION
// =============================================================================

/// `POST /predict` body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictRequest {
    pub record: StudentRecord,
}

/// Prediction result as rendered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictResponse {
    /// The submitted snapshot.
    pub submitted: PredictionRequest,
    pub prediction: PredictionResponse,
    pub favourable: bool,
    pub success_band: ProbabilityBand,
    pub orientation_band: ProbabilityBand,
    /// e.g. "supérieur à 70.00%".
    pub success_label: String,
}

impl PredictResponse {
    /// Wrap the service response with its display bands.
    #[must_use]
    pub fn new(submitted: PredictionRequest, prediction: PredictionResponse) -> Self {
        Self {
            favourable: prediction.is_favourable(),
            success_band: prediction.success_band(),
            orientation_band: prediction.orientation_band(),
            success_label: prediction.displayed_success_probability().to_string(),
            submitted,
            prediction,
        }
    }
}

// =============================================================================
// ERRORS
// =============================================================================

/// Error body returned with every non-2xx status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<Step>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<ExamCheckFailure>,
}

/// Handler error: a status code and a JSON body.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorResponse,
}

impl ApiError {
    fn new(status: StatusCode, error: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorResponse {
                error: error.into(),
                step: None,
                failure: None,
            },
        }
    }

    /// 400 with `message`.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl From<DioresError> for ApiError {
    fn from(err: DioresError) -> Self {
        let message = err.to_string();
        match err {
            DioresError::StepIncomplete(step) => {
                let mut api = Self::new(StatusCode::UNPROCESSABLE_ENTITY, message);
                api.body.step = Some(step);
                api
            }
            DioresError::Ineligible(failure) => {
                let mut api = Self::new(StatusCode::UNPROCESSABLE_ENTITY, message);
                api.body.failure = Some(failure);
                api
            }
            DioresError::InvalidScore(_)
            | DioresError::UnknownTrack(_)
            | DioresError::UnknownField(_)
            | DioresError::DerivedField(_)
            | DioresError::SerializationError(_) => Self::bad_request(message),
            DioresError::ConfigError(_) | DioresError::IoError(_) => {
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
            }
        }
    }
}

impl From<ClientError> for ApiError {
    fn from(err: ClientError) -> Self {
        let status = match err {
            ClientError::Build(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_GATEWAY,
        };
        Self::new(status, err.to_string())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ineligible_maps_to_422_with_reason() {
        let api: ApiError =
            DioresError::Ineligible(ExamCheckFailure::DeclaredAverageMissing).into();
        assert_eq!(api.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(api.body.failure, Some(ExamCheckFailure::DeclaredAverageMissing));
    }

    #[test]
    fn derived_field_maps_to_400() {
        let api: ApiError = DioresError::DerivedField(Field::MoyGle).into();
        assert_eq!(api.status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn upstream_failures_map_to_502() {
        let api: ApiError = ClientError::Timeout(10).into();
        assert_eq!(api.status, StatusCode::BAD_GATEWAY);
        let api: ApiError = ClientError::UpstreamStatus(500, "boom".to_string()).into();
        assert_eq!(api.status, StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn average_request_falls_back_on_record() {
        let request = AverageRequest {
            track: None,
            record: StudentRecord::with_defaults().with(Field::InapteEps, true),
            unfit_for_pe: None,
        };
        let (track, unfit) = request.resolve().expect("resolve");
        assert_eq!(track, Track::S1);
        assert!(unfit);
    }

    #[test]
    fn average_request_without_track_is_rejected() {
        let request = AverageRequest {
            track: None,
            record: StudentRecord::new(),
            unfit_for_pe: Some(false),
        };
        assert!(request.resolve().is_err());
    }

    #[test]
    fn personal_step_lists_missing_fields() {
        let request = StepRequest {
            step: Step::PersonalInfo,
            record: StudentRecord::with_defaults().with(Field::Residence, "Thiès"),
            track: None,
            unfit_for_pe: None,
        };
        let response = StepResponse::evaluate(&FieldValidator::default(), &request);
        assert!(!response.valid);
        assert_eq!(response.invalid_fields, vec![Field::Academie]);
    }

    #[test]
    fn verdict_matches_step_completion() {
        let validator = FieldValidator::default();
        let records = [
            StudentRecord::new(),
            StudentRecord::with_defaults()
                .with(Field::Residence, "Thiès")
                .with(Field::Academie, "Thiès")
                .with(Field::MoyNde, "9.499"),
            StudentRecord::with_defaults()
                .with(Field::MoyNde, "9.5")
                .with(Field::MoyEre, "12")
                .with(Field::MoySTerm, "12")
                .with(Field::MoySTerm1, "12")
                .with(Field::InapteEps, true),
        ];
        for record in records {
            for step in Step::ALL {
                let request = StepRequest {
                    step,
                    record: record.clone(),
                    track: None,
                    unfit_for_pe: None,
                };
                let expected =
                    validator.step_complete(step, &record, record.track(), record.unfit_for_pe());
                assert_eq!(StepResponse::evaluate(&validator, &request).valid, expected);
            }
        }
    }
}
