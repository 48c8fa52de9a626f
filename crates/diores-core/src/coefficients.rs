//! # Coefficient Tables
//!
//! One table per [`Track`], shared by the averaging engine and the exam step
//! validator so that both always agree on which subjects count.
//!
//! | Track | Subjects (coefficient) | Total | Exempt |
//! |-------|------------------------|-------|--------|
//! | S1 | MATH 8, SCPH 8, SVT 2, FR 3, AN 2, PHILO 2, EPS 1, HG 2 | 28 | 27 |
//! | S2 | MATH 5, SCPH 6, SVT 6, FR 3, AN 2, PHILO 2, EPS 1, HG 2 | 27 | 26 |
//! | S3 | MATH 8, SCPH 8, COME 8, AFTA 3, FR 3, AN 2, PHILO 2, EPS 1 | 35 | 34 |

use crate::{Field, Track};

/// Subjects required on every track.
pub const BASE_SUBJECTS: [Field; 5] = [Field::Math, Field::Scph, Field::Fr, Field::Philo, Field::An];

/// The physical-education field, dropped when the student is exempt.
pub const PE_FIELD: Field = Field::Eps;

/// A subject and its weight in an average.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Coefficient {
    pub field: Field,
    pub weight: i64,
}

const fn coef(field: Field, weight: i64) -> Coefficient {
    Coefficient { field, weight }
}

/// Ordered coefficient list of a track.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoefficientTable {
    track: Track,
    entries: &'static [Coefficient],
    fundamental: &'static [Coefficient],
}

const S1_TABLE: CoefficientTable = CoefficientTable {
    track: Track::S1,
    entries: &[
        coef(Field::Math, 8),
        coef(Field::Scph, 8),
        coef(Field::Svt, 2),
        coef(Field::Fr, 3),
        coef(Field::An, 2),
        coef(Field::Philo, 2),
        coef(Field::Eps, 1),
        coef(Field::Hg, 2),
    ],
    fundamental: &[coef(Field::Math, 8), coef(Field::Scph, 8)],
};

const S2_TABLE: CoefficientTable = CoefficientTable {
    track: Track::S2,
    entries: &[
        coef(Field::Math, 5),
        coef(Field::Scph, 6),
        coef(Field::Svt, 6),
        coef(Field::Fr, 3),
        coef(Field::An, 2),
        coef(Field::Philo, 2),
        coef(Field::Eps, 1),
        coef(Field::Hg, 2),
    ],
    fundamental: &[coef(Field::Math, 5), coef(Field::Scph, 6), coef(Field::Svt, 6)],
};

const S3_TABLE: CoefficientTable = CoefficientTable {
    track: Track::S3,
    entries: &[
        coef(Field::Math, 8),
        coef(Field::Scph, 8),
        coef(Field::Come, 8),
        coef(Field::Afta, 3),
        coef(Field::Fr, 3),
        coef(Field::An, 2),
        coef(Field::Philo, 2),
        coef(Field::Eps, 1),
    ],
    fundamental: &[coef(Field::Math, 8), coef(Field::Scph, 8), coef(Field::Come, 8)],
};

impl Track {
    /// Coefficient table of the track.
    #[must_use]
    pub fn coefficients(&self) -> &'static CoefficientTable {
        match self {
            Track::S1 => &S1_TABLE,
            Track::S2 => &S2_TABLE,
            Track::S3 => &S3_TABLE,
        }
    }
}

impl CoefficientTable {
    /// Track this table belongs to.
    #[must_use]
    pub fn track(&self) -> Track {
        self.track
    }

    /// Every entry, PE included.
    #[must_use]
    pub fn entries(&self) -> &'static [Coefficient] {
        self.entries
    }

    /// Core science subjects used by the fundamental average.
    #[must_use]
    pub fn fundamental(&self) -> &'static [Coefficient] {
        self.fundamental
    }

    /// Entries that count toward the track average.
    ///
    /// The PE entry is skipped when the student is exempt.
    pub fn counted(&self, unfit_for_pe: bool) -> impl Iterator<Item = &'static Coefficient> {
        self.entries
            .iter()
            .filter(move |c| !(unfit_for_pe && c.field == PE_FIELD))
    }

    /// Sum of the weights of [`counted`](Self::counted) entries.
    #[must_use]
    pub fn denominator(&self, unfit_for_pe: bool) -> i64 {
        self.counted(unfit_for_pe).map(|c| c.weight).sum()
    }

    /// Sum of the fundamental weights.
    #[must_use]
    pub fn fundamental_denominator(&self) -> i64 {
        self.fundamental.iter().map(|c| c.weight).sum()
    }

    /// Subjects this track requires on top of [`BASE_SUBJECTS`] and PE.
    pub fn additional_subjects(&self) -> impl Iterator<Item = Field> {
        self.entries
            .iter()
            .map(|c| c.field)
            .filter(|field| *field != PE_FIELD && !BASE_SUBJECTS.contains(field))
    }

    /// Weight of a field in this table, if it counts at all.
    #[must_use]
    pub fn weight_of(&self, field: Field) -> Option<i64> {
        self.entries.iter().find(|c| c.field == field).map(|c| c.weight)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn denominators_match_published_totals() {
        assert_eq!(Track::S1.coefficients().denominator(false), 28);
        assert_eq!(Track::S1.coefficients().denominator(true), 27);
        assert_eq!(Track::S2.coefficients().denominator(false), 27);
        assert_eq!(Track::S2.coefficients().denominator(true), 26);
        assert_eq!(Track::S3.coefficients().denominator(false), 35);
        assert_eq!(Track::S3.coefficients().denominator(true), 34);
    }

    #[test]
    fn fundamental_denominators() {
        assert_eq!(Track::S1.coefficients().fundamental_denominator(), 16);
        assert_eq!(Track::S2.coefficients().fundamental_denominator(), 17);
        assert_eq!(Track::S3.coefficients().fundamental_denominator(), 24);
    }

    #[test]
    fn every_track_contains_base_subjects_and_pe() {
        for track in Track::ALL {
            let table = track.coefficients();
            assert_eq!(table.track(), track);
            for field in BASE_SUBJECTS {
                assert!(table.weight_of(field).is_some(), "{track} lacks {field}");
            }
            assert_eq!(table.weight_of(PE_FIELD), Some(1));
        }
    }

    #[test]
    fn additional_subjects_per_track() {
        let s1: Vec<_> = Track::S1.coefficients().additional_subjects().collect();
        let s3: Vec<_> = Track::S3.coefficients().additional_subjects().collect();
        assert_eq!(s1, vec![Field::Svt, Field::Hg]);
        assert_eq!(s3, vec![Field::Come, Field::Afta]);
    }

    #[test]
    fn exempt_drops_only_pe() {
        let table = Track::S2.coefficients();
        let counted: Vec<_> = table.counted(true).map(|c| c.field).collect();
        assert_eq!(counted.len(), table.entries().len() - 1);
        assert!(!counted.contains(&PE_FIELD));
    }
}
