//! # diores-core
//!
//! The grade-averaging and step validation engine of DIORES - THE ENGINE.
//!
//! The DIORES form collects a student's academic record in three steps,
//! computes the track-weighted averages, checks eligibility and submits the
//! record to a remote prediction service. This crate holds every rule of
//! that process; the binary only moves records in and out.
//!
//! ## Architectural Constraints
//!
//! - Pure functions over immutable record snapshots; no shared state
//! - NO async, NO network dependencies
//! - Integer arithmetic only: scores are fixed-point hundredths
//! - Never fails on malformed numeric input: unparseable grades read as 0

// =============================================================================
// MODULES
// =============================================================================

pub mod coefficients;
pub mod engine;
pub mod payload;
pub mod primitives;
pub mod reducer;
pub mod types;
pub mod validation;

// =============================================================================
// RE-EXPORTS: Core Types
// =============================================================================

pub use types::{
    Decimal, DioresError, Field, FieldError, FieldKind, FieldValue, Score, StudentRecord, Track,
};

// =============================================================================
// RE-EXPORTS: Engine
// =============================================================================

pub use coefficients::{BASE_SUBJECTS, Coefficient, CoefficientTable, PE_FIELD};
pub use engine::{
    Averages, Mention, compute_fundamental_average, compute_total_points, compute_track_average,
};
pub use validation::{
    ExamCheckFailure, FieldValidator, Step, ValidationPolicy, check_exam_step,
    validate_field_range, validate_step_completion,
};

// =============================================================================
// RE-EXPORTS: Form Controller
// =============================================================================

pub use payload::{
    Bound, DisplayedProbability, PayloadConstants, PredictionRequest, PredictionResponse,
    ProbabilityBand,
};
pub use reducer::{FieldChange, FormState};
