//! # Form Reducer
//!
//! The form controller's state is a [`FormState`] value. Every user action
//! goes through one pure transition that returns a new state with all
//! derived fields recomputed, so there is no ordering between separate
//! update hooks to reason about.
//!
//! ```
//! use diores_core::{Field, FieldChange, FormState, Score};
//!
//! let state = FormState::new()
//!     .apply(FieldChange::set(Field::Math, Score::from_points(16)))
//!     .expect("math is an input field");
//! assert_eq!(state.record().score(Field::MoySurMatFond), Some(Score::from_points(8)));
//! ```

use crate::engine::Averages;
use crate::payload::{PayloadConstants, PredictionRequest};
use crate::validation::{ExamCheckFailure, FieldValidator, Step};
use crate::{DioresError, Field, FieldError, FieldKind, FieldValue, StudentRecord};
use serde::{Deserialize, Serialize};

/// One edit of the form: set a field, or clear it with `value: None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldChange {
    pub field: Field,
    #[serde(default)]
    pub value: Option<FieldValue>,
}

impl FieldChange {
    /// Set `field` to `value`.
    #[must_use]
    pub fn set(field: Field, value: impl Into<FieldValue>) -> Self {
        Self {
            field,
            value: Some(value.into()),
        }
    }

    /// Clear `field`.
    #[must_use]
    pub fn clear(field: Field) -> Self {
        Self { field, value: None }
    }
}

/// Snapshot of the form: the record (derived fields included) and the
/// current step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormState {
    record: StudentRecord,
    step: Step,
}

impl Default for FormState {
    fn default() -> Self {
        Self::new()
    }
}

impl FormState {
    /// Initial state: default record, first step.
    #[must_use]
    pub fn new() -> Self {
        Self::from_record(StudentRecord::with_defaults(), Step::PersonalInfo)
    }

    /// Wrap an existing record, recomputing its derived fields.
    #[must_use]
    pub fn from_record(record: StudentRecord, step: Step) -> Self {
        Self {
            record: recompute(record),
            step,
        }
    }

    /// Current record.
    #[must_use]
    pub fn record(&self) -> &StudentRecord {
        &self.record
    }

    /// Current step.
    #[must_use]
    pub fn step(&self) -> Step {
        self.step
    }

    /// Averages of the current record, if a track is selected.
    #[must_use]
    pub fn averages(&self) -> Option<Averages> {
        self.record
            .track()
            .map(|track| Averages::compute(track, &self.record, self.record.unfit_for_pe()))
    }

    /// Apply one edit and recompute every derived field.
    pub fn apply(&self, change: FieldChange) -> Result<FormState, DioresError> {
        if change.field.kind() == FieldKind::Derived {
            return Err(DioresError::DerivedField(change.field));
        }

        let mut record = self.record.clone();
        match change.value {
            Some(value) => record.set(change.field, value),
            None => {
                record.remove(change.field);
            }
        }

        Ok(Self {
            record: recompute(record),
            step: self.step,
        })
    }

    /// Apply several edits in order.
    pub fn apply_all(
        &self,
        changes: impl IntoIterator<Item = FieldChange>,
    ) -> Result<FormState, DioresError> {
        changes
            .into_iter()
            .try_fold(self.clone(), |state, change| state.apply(change))
    }

    /// Field error for `field` under `validator`, for inline messages.
    #[must_use]
    pub fn field_error(&self, validator: &FieldValidator, field: Field) -> Option<FieldError> {
        validator.validate_record_field(&self.record, field)
    }

    /// Whether the current step validates.
    #[must_use]
    pub fn can_advance(&self, validator: &FieldValidator) -> bool {
        validator.step_complete(
            self.step,
            &self.record,
            self.record.track(),
            self.record.unfit_for_pe(),
        )
    }

    /// Move to the next step if the current one validates.
    ///
    /// On the last step the state is returned unchanged.
    pub fn advance(&self, validator: &FieldValidator) -> Result<FormState, DioresError> {
        if !self.can_advance(validator) {
            return Err(DioresError::StepIncomplete(self.step));
        }
        Ok(Self {
            record: self.record.clone(),
            step: self.step.next().unwrap_or(self.step),
        })
    }

    /// Move to the previous step; no validation.
    #[must_use]
    pub fn back(&self) -> FormState {
        Self {
            record: self.record.clone(),
            step: self.step.previous().unwrap_or(self.step),
        }
    }

    /// Validate every step and build the submitted request.
    pub fn finalize(
        &self,
        validator: &FieldValidator,
        constants: &PayloadConstants,
    ) -> Result<PredictionRequest, DioresError> {
        let track = self.record.track();
        let unfit = self.record.unfit_for_pe();

        for step in [Step::PersonalInfo, Step::PriorAverages] {
            if !validator.step_complete(step, &self.record, track, unfit) {
                return Err(DioresError::StepIncomplete(step));
            }
        }
        validator
            .check_exam(&self.record, track, unfit)
            .map_err(DioresError::Ineligible)?;

        let track = track.ok_or(DioresError::Ineligible(ExamCheckFailure::TrackMissing))?;
        PredictionRequest::from_record(&self.record, track, constants)
    }
}

/// Rewrite the derived fields of `record` from its inputs.
fn recompute(mut record: StudentRecord) -> StudentRecord {
    let averages = record
        .track()
        .map(|track| Averages::compute(track, &record, record.unfit_for_pe()));

    let derived: [(Field, Option<FieldValue>); 4] = [
        (
            Field::MoyGle,
            averages.and_then(|a| a.track_average).map(FieldValue::from),
        ),
        (
            Field::MoySurMatFond,
            averages.map(|a| FieldValue::from(a.fundamental_average)),
        ),
        (
            Field::TotPtsAuGrp,
            averages.and_then(|a| a.total_points).map(FieldValue::from),
        ),
        (
            Field::Mention,
            averages
                .and_then(|a| a.mention)
                .map(|m| FieldValue::Text(m.label().to_string())),
        ),
    ];

    for (field, value) in derived {
        match value {
            Some(value) => record.set(field, value),
            None => {
                record.remove(field);
            }
        }
    }
    record
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Score, Track};

    fn grades() -> Vec<FieldChange> {
        vec![
            FieldChange::set(Field::Math, Score::from_points(16)),
            FieldChange::set(Field::Scph, Score::from_points(14)),
            FieldChange::set(Field::Svt, Score::from_points(12)),
            FieldChange::set(Field::Fr, Score::from_points(13)),
            FieldChange::set(Field::An, Score::from_points(15)),
            FieldChange::set(Field::Philo, Score::from_points(10)),
            FieldChange::set(Field::Eps, Score::from_points(12)),
            FieldChange::set(Field::Hg, Score::from_points(11)),
        ]
    }

    fn personal_info() -> Vec<FieldChange> {
        vec![
            FieldChange::set(Field::Residence, "Dakar"),
            FieldChange::set(Field::Academie, "Dakar"),
        ]
    }

    fn prior_averages() -> Vec<FieldChange> {
        vec![
            FieldChange::set(Field::MoyNde, Score::from_points(12)),
            FieldChange::set(Field::MoyEre, Score::from_points(12)),
            FieldChange::set(Field::MoySTerm, Score::from_points(13)),
            FieldChange::set(Field::MoySTerm1, Score::from_points(13)),
        ]
    }

    #[test]
    fn derived_fields_follow_every_change() {
        let state = FormState::new().apply_all(grades()).expect("grades");
        let record = state.record();
        assert_eq!(record.score(Field::MoyGle), Some(Score::from_hundredths(1382)));
        assert_eq!(record.score(Field::MoySurMatFond), Some(Score::from_points(15)));
        assert_eq!(record.score(Field::TotPtsAuGrp), Some(Score::from_points(387)));
        assert_eq!(record.text(Field::Mention).as_deref(), Some("Assez Bien"));

        let exempt = state.apply(FieldChange::set(Field::InapteEps, true)).expect("flag");
        assert_eq!(exempt.record().score(Field::MoyGle), Some(Score::from_hundredths(1389)));

        let cleared = state.apply(FieldChange::clear(Field::Hg)).expect("clear");
        assert_eq!(cleared.record().score(Field::MoyGle), None);
        assert_eq!(cleared.record().text(Field::Mention), None);
    }

    #[test]
    fn switching_track_recomputes() {
        let state = FormState::new().apply_all(grades()).expect("grades");
        let s2 = state
            .apply(FieldChange::set(Field::Serie, Track::S2.code()))
            .expect("track");
        // (80 + 84 + 72 + 39 + 30 + 20 + 12 + 22) / 27 = 359 / 27
        assert_eq!(s2.record().score(Field::MoyGle), Some(Score::from_hundredths(1330)));

        let s3 = state
            .apply(FieldChange::set(Field::Serie, Track::S3.code()))
            .expect("track");
        assert_eq!(s3.record().score(Field::MoyGle), None);
    }

    #[test]
    fn derived_fields_are_read_only() {
        let result = FormState::new().apply(FieldChange::set(Field::MoyGle, Score::from_points(20)));
        assert!(matches!(result, Err(DioresError::DerivedField(Field::MoyGle))));
    }

    #[test]
    fn apply_does_not_touch_the_previous_state() {
        let before = FormState::new();
        let after = before
            .apply(FieldChange::set(Field::Math, Score::from_points(16)))
            .expect("math");
        assert_ne!(before, after);
        assert!(before.record().get(Field::Math).is_none());
    }

    #[test]
    fn advance_is_gated_by_step_validation() {
        let validator = FieldValidator::default();
        let state = FormState::new();
        assert!(matches!(
            state.advance(&validator),
            Err(DioresError::StepIncomplete(Step::PersonalInfo))
        ));

        let state = state
            .apply_all(personal_info())
            .and_then(|s| s.advance(&validator))
            .expect("personal info");
        assert_eq!(state.step(), Step::PriorAverages);
        assert_eq!(state.back().step(), Step::PersonalInfo);

        let state = state
            .apply_all(prior_averages())
            .and_then(|s| s.advance(&validator))
            .expect("averages");
        assert_eq!(state.step(), Step::ExamInfo);
    }

    #[test]
    fn finalize_requires_every_step() {
        let validator = FieldValidator::default();
        let constants = PayloadConstants::default();

        let partial = FormState::new().apply_all(grades()).expect("grades");
        assert!(matches!(
            partial.finalize(&validator, &constants),
            Err(DioresError::StepIncomplete(Step::PersonalInfo))
        ));

        let state = partial
            .apply_all(personal_info())
            .and_then(|s| s.apply_all(prior_averages()))
            .expect("inputs");
        assert!(matches!(
            state.finalize(&validator, &constants),
            Err(DioresError::Ineligible(ExamCheckFailure::DeclaredAverageMissing))
        ));

        let complete = state
            .apply(FieldChange::set(Field::MoyenneAuGrp, Score::from_hundredths(1382)))
            .expect("declared");
        let request = complete.finalize(&validator, &constants).expect("request");
        assert_eq!(request.track_average, Score::from_hundredths(1382));
    }

    #[test]
    fn from_record_overwrites_stale_derived_values() {
        let mut record = StudentRecord::with_defaults();
        record.set(Field::MoyGle, Score::from_points(19));
        let state = FormState::from_record(record, Step::PersonalInfo);
        assert_eq!(state.record().get(Field::MoyGle), None);
    }
}
