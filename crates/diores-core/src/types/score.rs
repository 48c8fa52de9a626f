//! # Fixed-Point Scores
//!
//! Grades, averages and ages are carried as integer hundredths so that every
//! average is reproducible bit-for-bit. Floats only appear at the serde
//! boundary, where they are converted through their decimal representation.
//!
//! Values typed in the form are kept as a [`Decimal`] at the precision they
//! were entered with. Range checks compare that exact value; rounding to a
//! [`Score`] only happens when a value feeds an average.

use super::DioresError;
use crate::primitives::SCORE_SCALE;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Most fractional digits a [`Decimal`] accepts.
const MAX_FRACTION_DIGITS: u32 = 18;

/// Fractional digits of a [`Score`].
const SCORE_DIGITS: u32 = 2;

/// A decimal score with two fractional digits, stored as hundredths.
///
/// `Score::from_hundredths(1350)` is 13.50.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Score(i64);

impl Score {
    /// 0.00
    pub const ZERO: Score = Score(0);

    /// Build a score from raw hundredths.
    #[must_use]
    pub const fn from_hundredths(hundredths: i64) -> Self {
        Self(hundredths)
    }

    /// Build a score from a whole number of points.
    #[must_use]
    pub const fn from_points(points: i64) -> Self {
        Self(points.saturating_mul(SCORE_SCALE))
    }

    /// Raw value in hundredths.
    #[must_use]
    pub const fn hundredths(self) -> i64 {
        self.0
    }

    /// Divide a weighted sum (in hundredths) by a coefficient total,
    /// rounding half away from zero on the third decimal.
    ///
    /// Returns `None` when the denominator is not positive.
    #[must_use]
    pub fn from_ratio(numerator: i64, denominator: i64) -> Option<Self> {
        if denominator <= 0 {
            return None;
        }
        let quotient = numerator / denominator;
        let remainder = numerator % denominator;
        let away = if remainder.unsigned_abs().saturating_mul(2) >= denominator.unsigned_abs() {
            numerator.signum()
        } else {
            0
        };
        Some(Self(quotient.saturating_add(away)))
    }

    /// Lossy conversion for the JSON boundary.
    ///
    /// Goes through the decimal text so that 13.82 maps to the nearest
    /// `f64` of "13.82" rather than to an accumulated product.
    #[must_use]
    pub fn to_f64(self) -> f64 {
        self.to_string().parse().unwrap_or_default()
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let magnitude = self.0.unsigned_abs();
        let scale = SCORE_SCALE as u64;
        write!(f, "{}{}.{:02}", sign, magnitude / scale, magnitude % scale)
    }
}

impl FromStr for Score {
    type Err = DioresError;

    /// Parse `"13"`, `"13.5"`, `"13,5"` or `"-0.25"`.
    ///
    /// Digits past the second decimal are rounded half away from zero.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<Decimal>().map(Decimal::to_score)
    }
}

// =============================================================================
// EXACT DECIMALS
// =============================================================================

/// A decimal at the precision it was entered with: `units / 10^scale`.
///
/// Always normalized (no trailing fractional zeros), so `9.50` and `9.5`
/// compare equal. `9.499` stays below the 9.50 threshold even though it
/// rounds to 9.50 as a [`Score`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Decimal {
    units: i128,
    scale: u32,
}

impl Decimal {
    /// 0
    pub const ZERO: Decimal = Decimal { units: 0, scale: 0 };

    fn normalized(mut units: i128, mut scale: u32) -> Self {
        while scale > 0 && units % 10 == 0 {
            units /= 10;
            scale -= 1;
        }
        Self { units, scale }
    }

    /// Units at `scale` fractional digits, with `scale >= self.scale`.
    ///
    /// Parsing caps the magnitude so this never overflows.
    fn units_at(self, scale: u32) -> i128 {
        self.units
            .saturating_mul(10_i128.pow(scale.saturating_sub(self.scale)))
    }

    /// Round half away from zero to two decimals.
    #[must_use]
    pub fn to_score(self) -> Score {
        if self.scale <= SCORE_DIGITS {
            return Score(saturate(self.units_at(SCORE_DIGITS)));
        }
        let divisor = 10_i128.pow(self.scale - SCORE_DIGITS);
        let quotient = self.units / divisor;
        let remainder = self.units % divisor;
        let away = if remainder.unsigned_abs().saturating_mul(2) >= divisor.unsigned_abs() {
            self.units.signum()
        } else {
            0
        };
        Score(saturate(quotient.saturating_add(away)))
    }

    /// Compare with a value in hundredths, without rounding.
    #[must_use]
    pub fn cmp_hundredths(self, hundredths: i64) -> Ordering {
        let scale = self.scale.max(SCORE_DIGITS);
        self.units_at(scale)
            .cmp(&Decimal::from(Score(hundredths)).units_at(scale))
    }

    /// Whether the value lies in `[min, max]` (both in hundredths).
    #[must_use]
    pub fn within(self, min: i64, max: i64) -> bool {
        self.cmp_hundredths(min).is_ge() && self.cmp_hundredths(max).is_le()
    }

    /// Whether the value lies at most `tolerance` hundredths from `center`.
    #[must_use]
    pub fn is_near(self, center: Score, tolerance: i64) -> bool {
        let scale = self.scale.max(SCORE_DIGITS);
        let gap = self
            .units_at(scale)
            .abs_diff(Decimal::from(center).units_at(scale));
        gap <= Decimal::from(Score(tolerance)).units_at(scale).unsigned_abs()
    }
}

fn saturate(value: i128) -> i64 {
    i64::try_from(value).unwrap_or(if value < 0 { i64::MIN } else { i64::MAX })
}

impl From<Score> for Decimal {
    fn from(score: Score) -> Self {
        Self::normalized(i128::from(score.0), SCORE_DIGITS)
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.units < 0 { "-" } else { "" };
        let magnitude = self.units.unsigned_abs();
        let divisor = 10_u128.pow(self.scale);
        write!(f, "{}{}", sign, magnitude / divisor)?;
        if self.scale > 0 {
            let width = self.scale as usize;
            write!(f, ".{:0width$}", magnitude % divisor)?;
        }
        Ok(())
    }
}

impl FromStr for Decimal {
    type Err = DioresError;

    /// Parse `"13"`, `"13.5"`, `"13,5"` or `"-0.25"`, keeping every digit.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || DioresError::InvalidScore(s.to_string());
        let trimmed = s.trim();

        let (negative, unsigned) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
        };
        let (whole_digits, frac_digits) = unsigned.split_once(['.', ',']).unwrap_or((unsigned, ""));

        if whole_digits.is_empty() && frac_digits.is_empty() {
            return Err(invalid());
        }
        let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if !all_digits(whole_digits) || !all_digits(frac_digits) {
            return Err(invalid());
        }
        let scale = u32::try_from(frac_digits.len()).map_err(|_| invalid())?;
        if scale > MAX_FRACTION_DIGITS {
            return Err(invalid());
        }

        // Same magnitude bound as a score in hundredths.
        let whole: i64 = if whole_digits.is_empty() {
            0
        } else {
            whole_digits.parse().map_err(|_| invalid())?
        };
        whole.checked_mul(SCORE_SCALE).ok_or_else(invalid)?;

        let fraction = frac_digits
            .bytes()
            .fold(0_i128, |acc, b| acc * 10 + i128::from(b - b'0'));
        let magnitude = i128::from(whole) * 10_i128.pow(scale) + fraction;

        Ok(Self::normalized(if negative { -magnitude } else { magnitude }, scale))
    }
}

// =============================================================================
// SERDE
// =============================================================================

impl Serialize for Score {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.to_f64())
    }
}

struct ScoreVisitor;

impl Visitor<'_> for ScoreVisitor {
    type Value = Score;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a number or a decimal string")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Score, E> {
        v.checked_mul(SCORE_SCALE)
            .map(Score)
            .ok_or_else(|| E::custom(format!("score out of bounds: {v}")))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Score, E> {
        let signed = i64::try_from(v).map_err(|_| E::custom(format!("score out of bounds: {v}")))?;
        self.visit_i64(signed)
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Score, E> {
        if !v.is_finite() {
            return Err(E::custom("score must be finite"));
        }
        format!("{v}").parse().map_err(E::custom)
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Score, E> {
        v.parse().map_err(E::custom)
    }
}

impl<'de> Deserialize<'de> for Score {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(ScoreVisitor)
    }
}

impl Serialize for Decimal {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.to_string().parse().unwrap_or_default())
    }
}

struct DecimalVisitor;

impl Visitor<'_> for DecimalVisitor {
    type Value = Decimal;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a number or a decimal string")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Decimal, E> {
        v.to_string().parse().map_err(E::custom)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Decimal, E> {
        v.to_string().parse().map_err(E::custom)
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Decimal, E> {
        if !v.is_finite() {
            return Err(E::custom("score must be finite"));
        }
        format!("{v}").parse().map_err(E::custom)
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Decimal, E> {
        v.parse().map_err(E::custom)
    }
}

impl<'de> Deserialize<'de> for Decimal {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(DecimalVisitor)
    }
}

// =============================================================================
// TESTS
// =============================================================================
