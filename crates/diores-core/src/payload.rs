//! # Prediction Service Contract
//!
//! Request and response bodies of the remote prediction service.
//!
//! The request is the finalized record with every numeric field sent as a
//! JSON number and the fixed exam-session constants filled in. The response
//! carries two probabilities (0 to 100) and their messages.

use crate::engine::{Averages, Mention};
use crate::primitives::{ATTEMPT_COUNT, EXAM_YEAR, RESULT_GROUP};
use crate::validation::ExamCheckFailure;
use crate::{DioresError, Field, Score, StudentRecord, Track};
use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// REQUEST
// =============================================================================

/// Exam-session constants injected in every request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PayloadConstants {
    pub exam_year: u16,
    pub attempt_count: u8,
    pub result_group: u8,
}

impl Default for PayloadConstants {
    fn default() -> Self {
        Self {
            exam_year: EXAM_YEAR,
            attempt_count: ATTEMPT_COUNT,
            result_group: RESULT_GROUP,
        }
    }
}

/// Body of `POST /predict_v2`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionRequest {
    #[serde(rename = "Sexe")]
    pub sex: String,
    #[serde(rename = "Série")]
    pub track: Track,
    #[serde(rename = "Age_en_Décembre_2018")]
    pub age: Score,
    #[serde(rename = "MATH")]
    pub math: Score,
    #[serde(rename = "SCPH")]
    pub scph: Score,
    #[serde(rename = "FR")]
    pub fr: Score,
    #[serde(rename = "PHILO")]
    pub philo: Score,
    #[serde(rename = "AN")]
    pub an: Score,
    #[serde(rename = "SVT", default, skip_serializing_if = "Option::is_none")]
    pub svt: Option<Score>,
    #[serde(rename = "HG", default, skip_serializing_if = "Option::is_none")]
    pub hg: Option<Score>,
    #[serde(rename = "COME", default, skip_serializing_if = "Option::is_none")]
    pub come: Option<Score>,
    #[serde(rename = "AFTA", default, skip_serializing_if = "Option::is_none")]
    pub afta: Option<Score>,
    #[serde(rename = "EPS", default, skip_serializing_if = "Option::is_none")]
    pub eps: Option<Score>,
    #[serde(rename = "Moy_nde")]
    pub moy_nde: Score,
    #[serde(rename = "Moy_ère")]
    pub moy_ere: Score,
    #[serde(rename = "Moy_S_Term")]
    pub moy_s_term: Score,
    #[serde(rename = "Moy_S_Term_1")]
    pub moy_s_term_1: Score,
    #[serde(rename = "Moy_Gle")]
    pub track_average: Score,
    #[serde(rename = "Moy_sur_Mat_Fond")]
    pub fundamental_average: Score,
    #[serde(rename = "Année_BAC")]
    pub exam_year: u16,
    #[serde(rename = "Nbre_Fois_au_BAC")]
    pub attempt_count: u8,
    #[serde(rename = "Mention")]
    pub mention: Mention,
    #[serde(rename = "Groupe_Résultat")]
    pub result_group: u8,
    #[serde(rename = "Tot_Pts_au_Grp")]
    pub total_points: Score,
    #[serde(rename = "Moyenne_au_Grp")]
    pub official_average: Score,
    #[serde(rename = "Résidence")]
    pub residence: String,
    #[serde(rename = "Ets_de_provenance")]
    pub school: String,
    #[serde(rename = "Centre_Ec")]
    pub exam_centre: String,
    #[serde(rename = "Académie_de_Ets_Prov")]
    pub academy: String,
    #[serde(rename = "REGION_DE_NAISSANCE")]
    pub birth_region: String,
}

impl PredictionRequest {
    /// Build the request body from a record whose averages are computable.
    ///
    /// Step validation is the caller's job; this only refuses records whose
    /// track average or mention cannot be derived.
    pub fn from_record(
        record: &StudentRecord,
        track: Track,
        constants: &PayloadConstants,
    ) -> Result<Self, DioresError> {
        let averages = Averages::compute(track, record, record.unfit_for_pe());
        let track_average = averages
            .track_average
            .ok_or(DioresError::Ineligible(ExamCheckFailure::AverageNotComputable))?;
        let total_points = averages
            .total_points
            .ok_or(DioresError::Ineligible(ExamCheckFailure::AverageNotComputable))?;
        let mention = averages.mention.ok_or(DioresError::Ineligible(
            ExamCheckFailure::BelowOrientationFloor { computed: track_average },
        ))?;

        let number = |field: Field| record.score_or_zero(field);
        let optional = |field: Field| record.score(field);
        let text = |field: Field| record.text(field).unwrap_or_default();
        let unfit = record.unfit_for_pe();

        Ok(Self {
            sex: text(Field::Sexe),
            track,
            age: number(Field::Age),
            math: number(Field::Math),
            scph: number(Field::Scph),
            fr: number(Field::Fr),
            philo: number(Field::Philo),
            an: number(Field::An),
            svt: optional(Field::Svt),
            hg: optional(Field::Hg),
            come: optional(Field::Come),
            afta: optional(Field::Afta),
            eps: optional(Field::Eps).filter(|_| !unfit),
            moy_nde: number(Field::MoyNde),
            moy_ere: number(Field::MoyEre),
            moy_s_term: number(Field::MoySTerm),
            moy_s_term_1: number(Field::MoySTerm1),
            track_average,
            fundamental_average: averages.fundamental_average,
            exam_year: constants.exam_year,
            attempt_count: constants.attempt_count,
            mention,
            result_group: constants.result_group,
            total_points,
            official_average: number(Field::MoyenneAuGrp),
            residence: text(Field::Residence),
            school: text(Field::EtsDeProvenance),
            exam_centre: text(Field::CentreEc),
            academy: text(Field::Academie),
            birth_region: text(Field::RegionDeNaissance),
        })
    }
}

// =============================================================================
// RESPONSE
// =============================================================================

/// Body returned by the prediction service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub status: String,
    pub score: Score,
    pub orientation_probability: Score,
    pub success_probability: Score,
    pub orientation_probability_message: String,
    pub success_probability_message: String,
}

/// Colour band of a probability, as rendered next to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProbabilityBand {
    /// 75 % and above.
    Success,
    /// 50 % to 75 %.
    SuccessLight,
    /// 25 % to 50 %.
    Warning,
    /// Below 25 %.
    Destructive,
}

impl ProbabilityBand {
    /// Band of a percentage.
    #[must_use]
    pub fn from_percent(percent: Score) -> Self {
        match percent.hundredths() {
            v if v >= 7500 => ProbabilityBand::Success,
            v if v >= 5000 => ProbabilityBand::SuccessLight,
            v if v >= 2500 => ProbabilityBand::Warning,
            _ => ProbabilityBand::Destructive,
        }
    }
}

/// Side of the bound a displayed probability sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bound {
    Below,
    Above,
}

/// A probability as shown to the student: "supérieur à 70 %".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayedProbability {
    pub bound: Bound,
    pub percent: Score,
}

impl fmt::Display for DisplayedProbability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bound = match self.bound {
            Bound::Below => "inférieur à",
            Bound::Above => "supérieur à",
        };
        write!(f, "{} {}%", bound, self.percent)
    }
}

impl PredictionResponse {
    /// Whether the success probability reaches 50 %.
    #[must_use]
    pub fn is_favourable(&self) -> bool {
        self.success_probability.hundredths() >= 5000
    }

    /// Band of the success probability.
    #[must_use]
    pub fn success_band(&self) -> ProbabilityBand {
        ProbabilityBand::from_percent(self.success_probability)
    }

    /// Band of the orientation probability.
    #[must_use]
    pub fn orientation_band(&self) -> ProbabilityBand {
        ProbabilityBand::from_percent(self.orientation_probability)
    }

    /// Success probability as displayed.
    ///
    /// The service reports "under 50 %" as exactly 49; it is shown as
    /// "inférieur à 50%".
    #[must_use]
    pub fn displayed_success_probability(&self) -> DisplayedProbability {
        if self.success_probability == Score::from_points(49) {
            DisplayedProbability {
                bound: Bound::Below,
                percent: Score::from_points(50),
            }
        } else {
            DisplayedProbability {
                bound: Bound::Above,
                percent: self.success_probability,
            }
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
