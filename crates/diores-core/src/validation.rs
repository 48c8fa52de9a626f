//! # Field and Step Validation
//!
//! Stateless checks run by the form controller on every change and before
//! every step transition.
//!
//! ## Presence
//!
//! The generic field validator reports [`FieldError::Required`] only when the
//! [`ValidationPolicy`] asks for it (off by default). Step completion always
//! enforces presence of the fields it covers, so an incomplete step never
//! validates regardless of the policy.

use crate::coefficients::{BASE_SUBJECTS, PE_FIELD};
use crate::engine::compute_track_average;
use crate::primitives::{
    AGE_MAX, AGE_MIN, AVERAGE_TOLERANCE, GRADE_MAX, GRADE_MIN, ORIENTATION_FLOOR,
    PROMOTION_THRESHOLD,
};
use crate::{Field, FieldError, FieldKind, FieldValue, Score, StudentRecord, Track};
use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// STEPS
// =============================================================================

/// A page of the multi-step form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    /// Sex, age, residence, academy.
    PersonalInfo,
    /// The four prior-year averages.
    PriorAverages,
    /// Exam grades and declared official average.
    ExamInfo,
}

impl Step {
    /// Steps in form order.
    pub const ALL: [Step; 3] = [Step::PersonalInfo, Step::PriorAverages, Step::ExamInfo];

    /// Next step, if any.
    #[must_use]
    pub fn next(&self) -> Option<Step> {
        match self {
            Step::PersonalInfo => Some(Step::PriorAverages),
            Step::PriorAverages => Some(Step::ExamInfo),
            Step::ExamInfo => None,
        }
    }

    /// Previous step, if any.
    #[must_use]
    pub fn previous(&self) -> Option<Step> {
        match self {
            Step::PersonalInfo => None,
            Step::PriorAverages => Some(Step::PersonalInfo),
            Step::ExamInfo => Some(Step::PriorAverages),
        }
    }

    /// Fields that must be present and in range for the step to complete.
    ///
    /// Empty for [`Step::ExamInfo`], whose fields depend on the track.
    #[must_use]
    pub fn fields(&self) -> &'static [Field] {
        match self {
            Step::PersonalInfo => &[Field::Sexe, Field::Age, Field::Residence, Field::Academie],
            Step::PriorAverages => &[Field::MoyNde, Field::MoyEre, Field::MoySTerm, Field::MoySTerm1],
            Step::ExamInfo => &[],
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Step::PersonalInfo => "personal_info",
            Step::PriorAverages => "prior_averages",
            Step::ExamInfo => "exam_info",
        };
        f.write_str(name)
    }
}

// =============================================================================
// EXAM CHECK FAILURES
// =============================================================================

/// First condition that failed on the exam step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum ExamCheckFailure {
    TrackMissing,
    SubjectMissing { field: Field },
    SubjectInvalid { field: Field, error: FieldError },
    PeMissing,
    DeclaredAverageMissing,
    AverageNotComputable,
    /// Computed and declared averages differ by more than 0.01.
    Inconsistent { computed: Score, declared: Score },
    /// Computed average below 10.
    BelowOrientationFloor { computed: Score },
}

impl fmt::Display for ExamCheckFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TrackMissing => write!(f, "no track selected"),
            Self::SubjectMissing { field } => write!(f, "grade {field} is missing"),
            Self::SubjectInvalid { field, error } => write!(f, "grade {field}: {error}"),
            Self::PeMissing => write!(f, "grade EPS is missing and no exemption is set"),
            Self::DeclaredAverageMissing => write!(f, "official average is missing"),
            Self::AverageNotComputable => write!(f, "track average cannot be computed"),
            Self::Inconsistent { computed, declared } => write!(
                f,
                "computed average {computed} does not match declared average {declared}"
            ),
            Self::BelowOrientationFloor { computed } => {
                write!(f, "average {computed} is below the orientation floor")
            }
        }
    }
}

// =============================================================================
// FIELD VALIDATOR
// =============================================================================

/// Tunable behaviour of the field validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationPolicy {
    /// Report [`FieldError::Required`] for empty values.
    pub enforce_required: bool,
}

/// Field and step validator bound to a [`ValidationPolicy`].
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldValidator {
    policy: ValidationPolicy,
}

impl FieldValidator {
    /// Create a validator with the given policy.
    #[must_use]
    pub fn new(policy: ValidationPolicy) -> Self {
        Self { policy }
    }

    /// Policy in use.
    #[must_use]
    pub fn policy(&self) -> ValidationPolicy {
        self.policy
    }

    /// Check one value against its field's domain.
    #[must_use]
    pub fn validate_field(&self, field: Field, value: Option<&FieldValue>) -> Option<FieldError> {
        let Some(value) = value.filter(|v| v.is_present()) else {
            return self.policy.enforce_required.then_some(FieldError::Required);
        };

        // Bounds apply to the value as typed, never to its rounding.
        let exact = value.exact();
        match field.kind() {
            FieldKind::SubjectGrade | FieldKind::PriorAverage => {
                (!exact.within(GRADE_MIN, GRADE_MAX)).then_some(FieldError::OutOfRange)
            }
            FieldKind::PromotionAverage if exact.cmp_hundredths(PROMOTION_THRESHOLD).is_lt() => {
                Some(FieldError::BelowPromotionThreshold)
            }
            FieldKind::PromotionAverage => {
                exact.cmp_hundredths(GRADE_MAX).is_gt().then_some(FieldError::OutOfRange)
            }
            FieldKind::Age => (!exact.within(AGE_MIN, AGE_MAX)).then_some(FieldError::OutOfRange),
            _ => None,
        }
    }

    /// Check a field of `record`.
    #[must_use]
    pub fn validate_record_field(&self, record: &StudentRecord, field: Field) -> Option<FieldError> {
        self.validate_field(field, record.get(field))
    }

    /// All field errors of a record, in field order.
    #[must_use]
    pub fn field_errors(&self, record: &StudentRecord) -> Vec<(Field, FieldError)> {
        record
            .iter()
            .filter_map(|(field, value)| self.validate_field(field, Some(value)).map(|e| (field, e)))
            .collect()
    }

    /// Whether `step` is complete for `record`.
    #[must_use]
    pub fn step_complete(
        &self,
        step: Step,
        record: &StudentRecord,
        track: Option<Track>,
        unfit_for_pe: bool,
    ) -> bool {
        match step {
            Step::PersonalInfo | Step::PriorAverages => step.fields().iter().all(|&field| {
                record.is_present(field) && self.validate_record_field(record, field).is_none()
            }),
            Step::ExamInfo => self.check_exam(record, track, unfit_for_pe).is_ok(),
        }
    }

    /// Run the exam step checks in order, stopping at the first failure.
    ///
    /// On success returns the computed track average.
    pub fn check_exam(
        &self,
        record: &StudentRecord,
        track: Option<Track>,
        unfit_for_pe: bool,
    ) -> Result<Score, ExamCheckFailure> {
        let track = track.ok_or(ExamCheckFailure::TrackMissing)?;

        let subjects = BASE_SUBJECTS
            .into_iter()
            .chain(track.coefficients().additional_subjects());
        for field in subjects {
            self.check_subject(record, field)?;
        }

        if !unfit_for_pe {
            if !record.is_present(PE_FIELD) {
                return Err(ExamCheckFailure::PeMissing);
            }
            self.check_subject(record, PE_FIELD)?;
        }

        let declared = record
            .get(Field::MoyenneAuGrp)
            .filter(|value| value.is_present())
            .map(FieldValue::exact)
            .ok_or(ExamCheckFailure::DeclaredAverageMissing)?;
        let computed = compute_track_average(track, record, unfit_for_pe)
            .ok_or(ExamCheckFailure::AverageNotComputable)?;

        if !declared.is_near(computed, AVERAGE_TOLERANCE) {
            return Err(ExamCheckFailure::Inconsistent {
                computed,
                declared: declared.to_score(),
            });
        }
        if computed.hundredths() < ORIENTATION_FLOOR {
            return Err(ExamCheckFailure::BelowOrientationFloor { computed });
        }
        Ok(computed)
    }

    fn check_subject(&self, record: &StudentRecord, field: Field) -> Result<(), ExamCheckFailure> {
        if !record.is_present(field) {
            return Err(ExamCheckFailure::SubjectMissing { field });
        }
        match self.validate_record_field(record, field) {
            Some(error) => Err(ExamCheckFailure::SubjectInvalid { field, error }),
            None => Ok(()),
        }
    }
}

// =============================================================================
// FREE FUNCTIONS (default policy)
// =============================================================================

/// Check one value against its field's domain with the default policy.
#[must_use]
pub fn validate_field_range(field: Field, value: Option<&FieldValue>) -> Option<FieldError> {
    FieldValidator::default().validate_field(field, value)
}

/// Whether `step` is complete, with the default policy.
#[must_use]
pub fn validate_step_completion(
    step: Step,
    record: &StudentRecord,
    track: Option<Track>,
    unfit_for_pe: bool,
) -> bool {
    FieldValidator::default().step_complete(step, record, track, unfit_for_pe)
}

/// Exam step checks with the default policy, reporting the failing condition.
pub fn check_exam_step(
    record: &StudentRecord,
    track: Option<Track>,
    unfit_for_pe: bool,
) -> Result<Score, ExamCheckFailure> {
    FieldValidator::default().check_exam(record, track, unfit_for_pe)
}

// =============================================================================
// TESTS
// =============================================================================
