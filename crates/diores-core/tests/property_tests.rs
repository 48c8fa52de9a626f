//! # Property-Based Tests
//!
//! Determinism and monotonicity invariants of the averaging engine.

use diores_core::{
    Field, Score, Step, StudentRecord, Track, compute_fundamental_average, compute_total_points,
    compute_track_average, validate_step_completion,
};
use proptest::prelude::*;

/// Grades in hundredths, within the accepted 1..=20 range.
fn grade() -> impl Strategy<Value = i64> {
    100i64..=2000
}

fn track() -> impl Strategy<Value = Track> {
    prop_oneof![Just(Track::S1), Just(Track::S2), Just(Track::S3)]
}

/// An S1 record with the given MATH and SCPH and fixed other subjects.
fn s1_record(math: i64, scph: i64, rest: &[i64; 6]) -> StudentRecord {
    let others = [Field::Svt, Field::Fr, Field::An, Field::Philo, Field::Eps, Field::Hg];
    let mut record = StudentRecord::new()
        .with(Field::Math, Score::from_hundredths(math))
        .with(Field::Scph, Score::from_hundredths(scph));
    for (field, value) in others.into_iter().zip(rest) {
        record.set(field, Score::from_hundredths(*value));
    }
    record
}

fn filled_record(track: Track, grades: &[i64; 8]) -> StudentRecord {
    let mut record = StudentRecord::new();
    for (coefficient, value) in track.coefficients().entries().iter().zip(grades) {
        record.set(coefficient.field, Score::from_hundredths(*value));
    }
    record
}

// =============================================================================
// PROPERTY TESTS
// =============================================================================

proptest! {
    /// Raising MATH never lowers the S1 average.
    #[test]
    fn s1_average_monotonic_in_math(
        low in grade(),
        high in grade(),
        scph in grade(),
        rest in prop::array::uniform6(grade()),
        unfit in any::<bool>(),
    ) {
        let (low, high) = (low.min(high), low.max(high));
        let a = compute_track_average(Track::S1, &s1_record(low, scph, &rest), unfit);
        let b = compute_track_average(Track::S1, &s1_record(high, scph, &rest), unfit);
        prop_assert!(a.is_some() && b.is_some());
        prop_assert!(a <= b);
    }

    /// Raising SCPH never lowers the S1 average.
    #[test]
    fn s1_average_monotonic_in_scph(
        math in grade(),
        low in grade(),
        high in grade(),
        rest in prop::array::uniform6(grade()),
    ) {
        let (low, high) = (low.min(high), low.max(high));
        let a = compute_track_average(Track::S1, &s1_record(math, low, &rest), false);
        let b = compute_track_average(Track::S1, &s1_record(math, high, &rest), false);
        prop_assert!(a <= b);
    }

    /// Same record, same result.
    #[test]
    fn track_average_is_deterministic(
        track in track(),
        grades in prop::array::uniform8(grade()),
        unfit in any::<bool>(),
    ) {
        let record = filled_record(track, &grades);
        let first = compute_track_average(track, &record, unfit);
        let second = compute_track_average(track, &record.clone(), unfit);
        prop_assert_eq!(first, second);
    }

    /// Uniform grades yield that grade whatever the coefficients.
    #[test]
    fn uniform_grades_yield_the_grade(track in track(), value in grade(), unfit in any::<bool>()) {
        let record = filled_record(track, &[value; 8]);
        let expected = Score::from_hundredths(value);
        prop_assert_eq!(compute_track_average(track, &record, unfit), Some(expected));
        prop_assert_eq!(compute_fundamental_average(track, &record), expected);
    }

    /// The average stays inside the range of its inputs.
    #[test]
    fn average_is_bounded_by_its_grades(
        track in track(),
        grades in prop::array::uniform8(grade()),
    ) {
        let record = filled_record(track, &grades);
        let average = compute_track_average(track, &record, false).map(Score::hundredths);
        let min = grades.iter().copied().min();
        let max = grades.iter().copied().max();
        prop_assert!(average >= min && average <= max);
    }

    /// Total points divided by the counted coefficients gives the average.
    #[test]
    fn denominator_matches_counted_fields(
        track in track(),
        grades in prop::array::uniform8(grade()),
        unfit in any::<bool>(),
    ) {
        let record = filled_record(track, &grades);
        let points = compute_total_points(track, &record, unfit).map(Score::hundredths);
        let expected: i64 = track
            .coefficients()
            .counted(unfit)
            .map(|c| record.score_or_zero(c.field).hundredths() * c.weight)
            .sum();
        prop_assert_eq!(points, Some(expected));
        prop_assert_eq!(
            compute_track_average(track, &record, unfit),
            Score::from_ratio(expected, track.coefficients().denominator(unfit))
        );
    }

    /// Declaring exactly the computed average passes the exam step when the
    /// average reaches 10.
    #[test]
    fn declaring_the_computed_average_validates(
        track in track(),
        grades in prop::array::uniform8(1000i64..=2000),
    ) {
        let mut record = filled_record(track, &grades);
        let computed = compute_track_average(track, &record, false);
        prop_assert!(computed.is_some());
        if let Some(average) = computed {
            record.set(Field::MoyenneAuGrp, average);
        }
        prop_assert!(validate_step_completion(Step::ExamInfo, &record, Some(track), false));
    }

    /// Display then parse gives back the same score.
    #[test]
    fn score_text_is_stable(hundredths in -100_000i64..100_000) {
        let score = Score::from_hundredths(hundredths);
        let parsed: Score = score.to_string().parse().expect("own output parses");
        prop_assert_eq!(parsed, score);
    }
}
