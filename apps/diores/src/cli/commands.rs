//! # CLI Command Implementations

use super::StepArg;
use crate::api;
use crate::client::PredictionClient;
use crate::config::AppConfig;
use diores_core::{
    Averages, DioresError, Field, FieldValidator, FieldValue, FormState, Step, StudentRecord,
    Track,
};
use std::path::{Path, PathBuf};

// =============================================================================
// RECORD FILES
// =============================================================================

/// Maximum size of a record file (1 MB).
const MAX_RECORD_FILE_SIZE: u64 = 1024 * 1024;

/// Canonicalize `path` and make sure it is a regular file.
fn validate_file_path(path: &Path) -> Result<PathBuf, DioresError> {
    let canonical = path.canonicalize().map_err(|e| {
        DioresError::IoError(format!("Invalid file path '{}': {}", path.display(), e))
    })?;

    if !canonical.is_file() {
        return Err(DioresError::IoError(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }
    Ok(canonical)
}

/// Read a JSON record file.
pub fn load_record(path: &Path) -> Result<StudentRecord, DioresError> {
    let path = validate_file_path(path)?;

    let metadata = std::fs::metadata(&path)
        .map_err(|e| DioresError::IoError(format!("Cannot read file metadata: {}", e)))?;
    if metadata.len() > MAX_RECORD_FILE_SIZE {
        return Err(DioresError::SerializationError(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            MAX_RECORD_FILE_SIZE
        )));
    }

    let text = std::fs::read_to_string(&path)
        .map_err(|e| DioresError::IoError(format!("Cannot read {}: {}", path.display(), e)))?;
    serde_json::from_str(&text).map_err(|e| {
        DioresError::SerializationError(format!("Invalid record in {}: {}", path.display(), e))
    })
}

fn print_json(value: &impl serde::Serialize) -> Result<(), DioresError> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| DioresError::SerializationError(e.to_string()))?;
    println!("{}", text);
    Ok(())
}

fn show(score: Option<diores_core::Score>) -> String {
    score.map_or_else(|| "-".to_string(), |s| s.to_string())
}

// =============================================================================
// SERVE COMMAND
// =============================================================================

/// Start the HTTP server.
pub async fn cmd_serve(
    mut config: AppConfig,
    host: Option<String>,
    port: Option<u16>,
) -> Result<(), DioresError> {
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    println!("DIORES Server Starting...");
    println!();
    println!("Configuration:");
    println!("  Address:    {}", config.bind_address());
    println!(
        "  Prediction: {}{}",
        config.prediction.base_url, config.prediction.endpoint
    );
    println!("  Exam year:  {}", config.payload.exam_year);
    println!();
    println!("Endpoints:");
    println!("  POST /average         - Averages of a record");
    println!("  POST /validate/field  - Range check of a value");
    println!("  POST /validate/step   - Step completion");
    println!("  POST /form/apply      - Apply form edits");
    println!("  POST /form/advance    - Next form step");
    println!("  POST /predict         - Prediction");
    println!("  GET  /health          - Health check");
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    api::run_server(config).await
}

// =============================================================================
// AVERAGE COMMAND
// =============================================================================

/// Print the averages of a record file.
pub fn cmd_average(
    file: &Path,
    track: Option<Track>,
    unfit: bool,
    json_mode: bool,
) -> Result<(), DioresError> {
    let record = load_record(file)?;
    let track = track
        .or_else(|| record.track())
        .ok_or_else(|| DioresError::UnknownTrack("record has no Série".to_string()))?;
    let unfit = unfit || record.unfit_for_pe();
    let averages = Averages::compute(track, &record, unfit);

    if json_mode {
        return print_json(&averages);
    }

    println!("DIORES Averages");
    println!("===============");
    println!("Track:               {}", track);
    println!("EPS exempt:          {}", if unfit { "yes" } else { "no" });
    println!();
    println!("Track average:       {}", show(averages.track_average));
    println!("Fundamental average: {}", averages.fundamental_average);
    println!("Total points:        {}", show(averages.total_points));
    println!(
        "Mention:             {}",
        averages.mention.map_or("-", |m| m.label())
    );

    if averages.track_average.is_none() {
        println!();
        println!("Track average needs every graded subject of {}.", track);
    }
    Ok(())
}

// =============================================================================
// CHECK-FIELD COMMAND
// =============================================================================

/// Range-check one raw value.
pub fn cmd_check_field(
    config: &AppConfig,
    field: Field,
    value: Option<&str>,
    json_mode: bool,
) -> Result<(), DioresError> {
    let validator = FieldValidator::new(config.validation);
    let value = value.map(|raw| FieldValue::from_input(field, raw));
    let error = validator.validate_field(field, value.as_ref());

    if json_mode {
        return print_json(&serde_json::json!({
            "field": field,
            "value": value,
            "error": error,
        }));
    }

    match error {
        Some(error) => println!("{}: {}", field, error),
        None => println!("{}: ok", field),
    }
    Ok(())
}

// =============================================================================
// VALIDATE COMMAND
// =============================================================================

/// Check the selected steps of a record file.
///
/// Fails with the first incomplete step once every report is printed.
pub fn cmd_validate(
    config: &AppConfig,
    file: &Path,
    steps: StepArg,
    json_mode: bool,
) -> Result<(), DioresError> {
    let record = load_record(file)?;
    let validator = FieldValidator::new(config.validation);
    let request_for = |step: Step| api::StepRequest {
        step,
        record: record.clone(),
        track: None,
        unfit_for_pe: None,
    };
    let reports: Vec<api::StepResponse> = steps
        .steps()
        .into_iter()
        .map(|step| api::StepResponse::evaluate(&validator, &request_for(step)))
        .collect();

    let first_incomplete = reports.iter().find(|report| !report.valid).map(|report| report.step);
    let verdict = first_incomplete.map_or(Ok(()), |step| Err(DioresError::StepIncomplete(step)));

    if json_mode {
        print_json(&reports)?;
        return verdict;
    }

    println!("DIORES Step Validation");
    println!("======================");
    for report in &reports {
        let verdict = if report.valid { "complete" } else { "incomplete" };
        println!("{:<15} {}", report.step.to_string(), verdict);
        for field in &report.invalid_fields {
            match validator.validate_record_field(&record, *field) {
                Some(error) => println!("  {}: {}", field, error),
                None => println!("  {}: missing", field),
            }
        }
        if let Some(failure) = report.failure {
            println!("  {}", failure);
        }
        if let Some(average) = report.computed_average {
            println!("  computed average {}", average);
        }
    }

    let field_errors = validator.field_errors(&record);
    if !field_errors.is_empty() {
        println!();
        println!("Field errors:");
        for (field, error) in field_errors {
            println!("  {}: {}", field, error);
        }
    }
    verdict
}

// =============================================================================
// PREDICT COMMAND
// =============================================================================

/// Finalize a record file and send it to the prediction service.
pub async fn cmd_predict(
    config: &AppConfig,
    file: &Path,
    dry_run: bool,
    json_mode: bool,
) -> Result<(), DioresError> {
    let record = load_record(file)?;
    let validator = FieldValidator::new(config.validation);
    let submitted =
        FormState::from_record(record, Step::ExamInfo).finalize(&validator, &config.payload)?;

    if dry_run {
        return print_json(&submitted);
    }

    let client = PredictionClient::new(&config.prediction)
        .map_err(|e| DioresError::ConfigError(e.to_string()))?;
    tracing::info!("Sending record to {}", client.url());
    let prediction = client
        .predict(&submitted)
        .await
        .map_err(|e| DioresError::IoError(e.to_string()))?;
    let response = api::PredictResponse::new(submitted, prediction);

    if json_mode {
        return print_json(&response);
    }

    println!("DIORES Prediction");
    println!("=================");
    println!(
        "Orientation: {}% ({})",
        response.prediction.orientation_probability,
        response.prediction.orientation_probability_message
    );
    println!(
        "Success:     {} ({})",
        response.success_label, response.prediction.success_probability_message
    );
    println!();
    if response.favourable {
        println!("Outlook: favourable");
    } else {
        println!("Outlook: uncertain");
    }
    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================
