//! Unit tests for API types serialization/deserialization.

// Allow unwrap and panic in tests - these are standard for test code
#![allow(clippy::unwrap_used, clippy::panic)]

use diores::api::{
    AverageRequest, ErrorResponse, FieldReport, FieldRequest, FormApplyRequest, HealthResponse,
    PredictResponse, StepRequest,
};
use diores_core::{
    ExamCheckFailure, Field, FieldError, FieldValue, PredictionResponse, Score, Step, Track,
};

// =============================================================================
// HEALTH RESPONSE TESTS
// =============================================================================

#[test]
fn test_health_response_default() {
    let health = HealthResponse::default();
    assert_eq!(health.status, "ok");
    assert!(!health.version.is_empty());
}

#[test]
fn test_health_response_deserialization() {
    let json = r#"{"status":"healthy","version":"1.0.0"}"#;
    let health: HealthResponse = serde_json::from_str(json).unwrap();

    assert_eq!(health.status, "healthy");
    assert_eq!(health.version, "1.0.0");
}

// =============================================================================
// REQUEST TESTS
// =============================================================================

#[test]
fn test_average_request_optional_fields() {
    let json = r#"{"record": {"Série": "S3", "Inapte_EPS": true}}"#;
    let request: AverageRequest = serde_json::from_str(json).unwrap();

    assert_eq!(request.track, None);
    assert_eq!(request.unfit_for_pe, None);
    assert_eq!(request.resolve().unwrap(), (Track::S3, true));
}

#[test]
fn test_field_request_value_is_coerced_per_field() {
    let request: FieldRequest =
        serde_json::from_str(r#"{"field": "Age_en_Décembre_2018", "value": "17,5"}"#).unwrap();
    assert_eq!(request.field, Field::Age);
    assert_eq!(request.value, Some(FieldValue::Text("17,5".to_string())));
    assert_eq!(
        request.value.map(|v| v.for_field(request.field)),
        Some(FieldValue::from(Score::from_hundredths(1750)))
    );

    let request: FieldRequest = serde_json::from_str(r#"{"field": "SVT"}"#).unwrap();
    assert_eq!(request.value, None);
}

#[test]
fn test_field_request_unknown_field() {
    let result = serde_json::from_str::<FieldRequest>(r#"{"field": "BIO", "value": 12}"#);
    assert!(result.is_err());
}

#[test]
fn test_step_request_snake_case_step() {
    let json = r#"{"step": "prior_averages", "record": {}, "track": "S2"}"#;
    let request: StepRequest = serde_json::from_str(json).unwrap();

    assert_eq!(request.step, Step::PriorAverages);
    assert_eq!(request.track, Some(Track::S2));
}

#[test]
fn test_form_apply_request_clear_change() {
    let json = r#"{"changes": [{"field": "HG", "value": null}, {"field": "HG"}]}"#;
    let request: FormApplyRequest = serde_json::from_str(json).unwrap();

    assert_eq!(request.changes.len(), 2);
    assert!(request.changes.iter().all(|c| c.field == Field::Hg && c.value.is_none()));
    assert_eq!(request.state.step(), Step::PersonalInfo);
}

// =============================================================================
// RESPONSE TESTS
// =============================================================================

#[test]
fn test_field_report_serialization() {
    let report = FieldReport {
        field: Field::MoyNde,
        error: Some(FieldError::BelowPromotionThreshold),
    };
    let json = serde_json::to_value(&report).unwrap();

    assert_eq!(json["field"], "Moy_nde");
    assert_eq!(json["error"], "BelowPromotionThreshold");
}

#[test]
fn test_error_response_omits_empty_details() {
    let error = ErrorResponse {
        error: "bad".to_string(),
        step: None,
        failure: None,
    };
    let json = serde_json::to_string(&error).unwrap();
    assert_eq!(json, r#"{"error":"bad"}"#);
}

#[test]
fn test_error_response_failure_reason() {
    let error = ErrorResponse {
        error: "Record is not eligible".to_string(),
        step: None,
        failure: Some(ExamCheckFailure::SubjectMissing { field: Field::Come }),
    };
    let json = serde_json::to_value(&error).unwrap();

    assert_eq!(json["failure"]["reason"], "subject_missing");
    assert_eq!(json["failure"]["field"], "COME");
}

#[test]
fn test_predict_response_labels() {
    let prediction: PredictionResponse = serde_json::from_str(
        r#"{
            "status": "success",
            "score": 0.2,
            "orientation_probability": 20,
            "success_probability": 49,
            "orientation_probability_message": "Orientation peu probable",
            "success_probability_message": "Réussite incertaine"
        }"#,
    )
    .unwrap();
    let submitted = serde_json::from_value(serde_json::json!({
        "Sexe": "M", "Série": "S1", "Age_en_Décembre_2018": 18,
        "MATH": 10, "SCPH": 10, "FR": 10, "PHILO": 10, "AN": 10,
        "Moy_nde": 10, "Moy_ère": 10, "Moy_S_Term": 10, "Moy_S_Term_1": 10,
        "Moy_Gle": 10, "Moy_sur_Mat_Fond": 10, "Année_BAC": 2018,
        "Nbre_Fois_au_BAC": 1, "Mention": "Passable", "Groupe_Résultat": 1,
        "Tot_Pts_au_Grp": 280, "Moyenne_au_Grp": 10, "Résidence": "Thiès",
        "Ets_de_provenance": "", "Centre_Ec": "", "Académie_de_Ets_Prov": "Thiès",
        "REGION_DE_NAISSANCE": "THIES"
    }))
    .unwrap();

    let response = PredictResponse::new(submitted, prediction);
    let json = serde_json::to_value(&response).unwrap();

    assert_eq!(json["success_label"], "inférieur à 50.00%");
    assert_eq!(json["success_band"], "warning");
    assert_eq!(json["orientation_band"], "destructive");
    assert_eq!(json["favourable"], false);
}
