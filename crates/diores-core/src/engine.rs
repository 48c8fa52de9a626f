//! # Average Engine
//!
//! Pure functions computing the averages of a [`StudentRecord`].
//!
//! - The fundamental average never fails: missing subjects count as 0 but
//!   keep their weight in the divisor.
//! - The track average is `None` until every counted subject is present.
//!
//! All sums are integer hundredths; rounding happens once, on the final
//! division.

use crate::coefficients::Coefficient;
use crate::primitives::{MENTION_ASSEZ_BIEN, MENTION_BIEN, MENTION_TRES_BIEN, ORIENTATION_FLOOR};
use crate::{Score, StudentRecord, Track};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Weighted sum of the given coefficients, absent subjects read as 0.
fn weighted_sum<'a>(
    record: &StudentRecord,
    coefficients: impl Iterator<Item = &'a Coefficient>,
) -> i64 {
    coefficients.fold(0i64, |acc, c| {
        acc.saturating_add(record.score_or_zero(c.field).hundredths().saturating_mul(c.weight))
    })
}

/// Average of the core science subjects of `track`.
///
/// S1: (MATH×8 + SCPH×8) / 16, S2: (MATH×5 + SCPH×6 + SVT×6) / 17,
/// S3: (MATH×8 + SCPH×8 + COME×8) / 24.
#[must_use]
pub fn compute_fundamental_average(track: Track, record: &StudentRecord) -> Score {
    let table = track.coefficients();
    let sum = weighted_sum(record, table.fundamental().iter());
    Score::from_ratio(sum, table.fundamental_denominator()).unwrap_or(Score::ZERO)
}

/// Weighted points of the track average, or `None` while a counted subject
/// is missing.
#[must_use]
pub fn compute_total_points(track: Track, record: &StudentRecord, unfit_for_pe: bool) -> Option<Score> {
    let table = track.coefficients();
    if !table.counted(unfit_for_pe).all(|c| record.is_present(c.field)) {
        return None;
    }
    Some(Score::from_hundredths(weighted_sum(record, table.counted(unfit_for_pe))))
}

/// Track average, or `None` while a counted subject is missing.
///
/// When `unfit_for_pe` is set, EPS leaves both the numerator and the
/// denominator.
#[must_use]
pub fn compute_track_average(track: Track, record: &StudentRecord, unfit_for_pe: bool) -> Option<Score> {
    let points = compute_total_points(track, record, unfit_for_pe)?;
    Score::from_ratio(points.hundredths(), track.coefficients().denominator(unfit_for_pe))
}

// =============================================================================
// MENTION
// =============================================================================

/// Honours band of an average.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Mention {
    #[serde(rename = "Passable")]
    Passable,
    #[serde(rename = "Assez Bien")]
    AssezBien,
    #[serde(rename = "Bien")]
    Bien,
    #[serde(rename = "Très Bien")]
    TresBien,
}

impl Mention {
    /// Band of `average`; `None` below 10.
    #[must_use]
    pub fn from_average(average: Score) -> Option<Mention> {
        match average.hundredths() {
            v if v >= MENTION_TRES_BIEN => Some(Mention::TresBien),
            v if v >= MENTION_BIEN => Some(Mention::Bien),
            v if v >= MENTION_ASSEZ_BIEN => Some(Mention::AssezBien),
            v if v >= ORIENTATION_FLOOR => Some(Mention::Passable),
            _ => None,
        }
    }

    /// Label as sent to the prediction service.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Mention::Passable => "Passable",
            Mention::AssezBien => "Assez Bien",
            Mention::Bien => "Bien",
            Mention::TresBien => "Très Bien",
        }
    }
}

impl fmt::Display for Mention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// =============================================================================
// SUMMARY
// =============================================================================

/// Every derived value of a record, computed in one pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Averages {
    pub track: Track,
    pub track_average: Option<Score>,
    pub fundamental_average: Score,
    pub total_points: Option<Score>,
    pub mention: Option<Mention>,
}

impl Averages {
    /// Compute all averages of `record` for `track`.
    #[must_use]
    pub fn compute(track: Track, record: &StudentRecord, unfit_for_pe: bool) -> Self {
        let total_points = compute_total_points(track, record, unfit_for_pe);
        let track_average = total_points.and_then(|points| {
            Score::from_ratio(points.hundredths(), track.coefficients().denominator(unfit_for_pe))
        });
        Self {
            track,
            track_average,
            fundamental_average: compute_fundamental_average(track, record),
            total_points,
            mention: track_average.and_then(Mention::from_average),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
