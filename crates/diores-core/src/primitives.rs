//! # Engine Primitives
//!
//! Hardcoded rule constants for the averaging and validation engine.
//!
//! Every score constant is expressed in hundredths of a point, the unit of
//! [`Score`](crate::Score). These values are compiled into the binary and are
//! immutable at runtime.

/// Number of fixed-point units per point (two decimal places).
pub const SCORE_SCALE: i64 = 100;

// =============================================================================
// FIELD RANGES
// =============================================================================

/// Lowest accepted subject grade (1.00).
pub const GRADE_MIN: i64 = 100;

/// Highest accepted subject grade or average (20.00).
pub const GRADE_MAX: i64 = 2000;

/// Minimum prior-year average required to advance (9.50).
///
/// A value exactly at the threshold is accepted.
pub const PROMOTION_THRESHOLD: i64 = 950;

/// Youngest accepted age, in years (15).
pub const AGE_MIN: i64 = 1500;

/// Oldest accepted age, in years (23).
pub const AGE_MAX: i64 = 2300;

// =============================================================================
// EXAM STEP CHECKS
// =============================================================================

/// Maximum gap between the computed and the declared official average (0.01).
pub const AVERAGE_TOLERANCE: i64 = 1;

/// Lowest track average eligible for orientation (10.00).
pub const ORIENTATION_FLOOR: i64 = 1000;

// =============================================================================
// MENTION BANDS
// =============================================================================

/// Lower bound of the "Assez Bien" mention (12.00).
pub const MENTION_ASSEZ_BIEN: i64 = 1200;

/// Lower bound of the "Bien" mention (14.00).
pub const MENTION_BIEN: i64 = 1400;

/// Lower bound of the "Très Bien" mention (16.00).
pub const MENTION_TRES_BIEN: i64 = 1600;

// =============================================================================
// PAYLOAD CONSTANTS
// =============================================================================

/// Exam session year sent with every prediction request.
pub const EXAM_YEAR: u16 = 2018;

/// Number of attempts at the exam sent with every prediction request.
pub const ATTEMPT_COUNT: u8 = 1;

/// Result group sent with every prediction request.
pub const RESULT_GROUP: u8 = 1;
