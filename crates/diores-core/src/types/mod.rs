//! # Core Type Definitions
//!
//! This module contains the record model shared by the engine, the validator
//! and the reducer:
//! - Fixed-point scores (`Score`)
//! - Field names and their validation domains (`Field`, `FieldKind`)
//! - Record values and the record itself (`FieldValue`, `StudentRecord`)
//! - Track selection (`Track`)
//! - Error types (`FieldError`, `DioresError`)
//!
//! ## Determinism Guarantees
//!
//! - Scores are integer hundredths, never floats
//! - Records are `BTreeMap`s, so iteration and serialization order is stable

mod score;

pub use score::{Decimal, Score};

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// =============================================================================
// TRACK
// =============================================================================

/// Specialization branch of the student. Selects the required subjects and
/// their coefficients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Track {
    S1,
    S2,
    S3,
}

impl Track {
    /// All tracks, in order.
    pub const ALL: [Track; 3] = [Track::S1, Track::S2, Track::S3];

    /// Wire code of the track.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Track::S1 => "S1",
            Track::S2 => "S2",
            Track::S3 => "S3",
        }
    }
}

impl fmt::Display for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Track {
    type Err = DioresError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "S1" => Ok(Track::S1),
            "S2" => Ok(Track::S2),
            "S3" => Ok(Track::S3),
            _ => Err(DioresError::UnknownTrack(s.to_string())),
        }
    }
}

// =============================================================================
// FIELDS
// =============================================================================

/// Validation domain of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Exam subject grade, 1 to 20.
    SubjectGrade,
    /// Prior-year average subject to the 1 to 20 range.
    PriorAverage,
    /// Prior-year average gating promotion (9.5 minimum).
    PromotionAverage,
    /// Age in years, 15 to 23.
    Age,
    /// Average declared by the student.
    OfficialAverage,
    /// Computed by the reducer; never entered by hand.
    Derived,
    /// Free text or enumerated choice.
    Categorical,
    /// Boolean toggle.
    Flag,
    /// Fixed value injected at submission.
    Constant,
}

macro_rules! fields {
    ($( $(#[$doc:meta])* $variant:ident => $wire:literal : $kind:ident ),+ $(,)?) => {
        /// A named field of the student record.
        ///
        /// Serialized under the names used by the form and the prediction
        /// service.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub enum Field {
            $( $(#[$doc])* #[serde(rename = $wire)] $variant, )+
        }

        impl Field {
            /// Every field, in declaration order.
            pub const ALL: &'static [Field] = &[$( Field::$variant ),+];

            /// Wire name of the field.
            #[must_use]
            pub fn name(&self) -> &'static str {
                match self {
                    $( Field::$variant => $wire, )+
                }
            }

            /// Validation domain of the field.
            #[must_use]
            pub fn kind(&self) -> FieldKind {
                match self {
                    $( Field::$variant => FieldKind::$kind, )+
                }
            }
        }
    };
}

fields! {
    /// Mathematics.
    Math => "MATH": SubjectGrade,
    /// Physics and chemistry.
    Scph => "SCPH": SubjectGrade,
    /// Life and earth sciences.
    Svt => "SVT": SubjectGrade,
    /// Industrial construction (S3).
    Come => "COME": SubjectGrade,
    /// Applied technology (S3).
    Afta => "AFTA": SubjectGrade,
    /// French.
    Fr => "FR": SubjectGrade,
    /// English.
    An => "AN": SubjectGrade,
    /// Philosophy.
    Philo => "PHILO": SubjectGrade,
    /// Physical education; exemptible.
    Eps => "EPS": SubjectGrade,
    /// History and geography.
    Hg => "HG": SubjectGrade,
    /// Average of the second-to-last pre-university year.
    MoyNde => "Moy_nde": PromotionAverage,
    /// Average of the last pre-university year.
    MoyEre => "Moy_ère": PriorAverage,
    /// First-term average of the final year.
    MoySTerm => "Moy_S_Term": PriorAverage,
    /// Second-term average of the final year.
    MoySTerm1 => "Moy_S_Term_1": PriorAverage,
    /// Track average.
    MoyGle => "Moy_Gle": Derived,
    /// Fundamental average.
    MoySurMatFond => "Moy_sur_Mat_Fond": Derived,
    /// Weighted points behind the track average.
    TotPtsAuGrp => "Tot_Pts_au_Grp": Derived,
    /// Honours band of the track average.
    Mention => "Mention": Derived,
    /// Official average declared by the student.
    MoyenneAuGrp => "Moyenne_au_Grp": OfficialAverage,
    Sexe => "Sexe": Categorical,
    Serie => "Série": Categorical,
    Age => "Age_en_Décembre_2018": Age,
    Residence => "Résidence": Categorical,
    EtsDeProvenance => "Ets_de_provenance": Categorical,
    CentreEc => "Centre_Ec": Categorical,
    Academie => "Académie_de_Ets_Prov": Categorical,
    RegionDeNaissance => "REGION_DE_NAISSANCE": Categorical,
    /// Student is excused from physical education.
    InapteEps => "Inapte_EPS": Flag,
    AnneeBac => "Année_BAC": Constant,
    NbreFoisAuBac => "Nbre_Fois_au_BAC": Constant,
    GroupeResultat => "Groupe_Résultat": Constant,
}

impl Field {
    /// Whether the field holds a number.
    #[must_use]
    pub fn is_numeric(&self) -> bool {
        match self.kind() {
            FieldKind::Categorical | FieldKind::Flag => false,
            FieldKind::Derived => *self != Field::Mention,
            _ => true,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Field {
    type Err = DioresError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Field::ALL
            .iter()
            .copied()
            .find(|field| field.name() == s)
            .ok_or_else(|| DioresError::UnknownField(s.to_string()))
    }
}

// =============================================================================
// FIELD VALUES
// =============================================================================

/// A value entered in the form.
///
/// Numbers keep the precision they were typed with. Whether text becomes a
/// number depends on the field: see [`FieldValue::for_field`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Number(Decimal),
    Text(String),
    Flag(bool),
}

impl FieldValue {
    /// Build a value for `field` from raw form text.
    #[must_use]
    pub fn from_input(field: Field, raw: &str) -> Self {
        FieldValue::Text(raw.to_string()).for_field(field)
    }

    /// Reshape the value for the domain of `field`.
    ///
    /// Numeric fields turn numeric text into a number. Text fields keep codes
    /// such as `"007"` verbatim and read a bare number as its decimal text.
    #[must_use]
    pub fn for_field(self, field: Field) -> Self {
        match self {
            FieldValue::Text(text) if field.is_numeric() => match text.parse::<Decimal>() {
                Ok(number) => FieldValue::Number(number),
                Err(_) => FieldValue::Text(text),
            },
            FieldValue::Number(number)
                if !field.is_numeric() && field.kind() != FieldKind::Flag =>
            {
                FieldValue::Text(number.to_string())
            }
            other => other,
        }
    }

    /// Defined and non-empty.
    #[must_use]
    pub fn is_present(&self) -> bool {
        match self {
            FieldValue::Text(text) => !text.trim().is_empty(),
            FieldValue::Number(_) | FieldValue::Flag(_) => true,
        }
    }

    /// Unrounded numeric reading; anything unparseable reads as 0.
    #[must_use]
    pub fn exact(&self) -> Decimal {
        match self {
            FieldValue::Number(number) => *number,
            FieldValue::Text(text) => text.parse().unwrap_or(Decimal::ZERO),
            FieldValue::Flag(_) => Decimal::ZERO,
        }
    }

    /// Numeric reading rounded to hundredths, as fed to the averages.
    #[must_use]
    pub fn coerce_score(&self) -> Score {
        self.exact().to_score()
    }

    /// Textual reading of the value.
    #[must_use]
    pub fn as_text(&self) -> String {
        match self {
            FieldValue::Number(number) => number.to_string(),
            FieldValue::Text(text) => text.trim().to_string(),
            FieldValue::Flag(flag) => flag.to_string(),
        }
    }
}

impl From<Score> for FieldValue {
    fn from(score: Score) -> Self {
        FieldValue::Number(score.into())
    }
}

impl From<Decimal> for FieldValue {
    fn from(number: Decimal) -> Self {
        FieldValue::Number(number)
    }
}

impl From<&str> for FieldValue {
    fn from(raw: &str) -> Self {
        FieldValue::Text(raw.to_string())
    }
}

impl From<bool> for FieldValue {
    fn from(flag: bool) -> Self {
        FieldValue::Flag(flag)
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FieldValue::Number(number) => number.serialize(serializer),
            FieldValue::Text(text) => serializer.serialize_str(text),
            FieldValue::Flag(flag) => serializer.serialize_bool(*flag),
        }
    }
}

struct FieldValueVisitor;

impl Visitor<'_> for FieldValueVisitor {
    type Value = FieldValue;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a number, a string or a boolean")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<FieldValue, E> {
        Ok(FieldValue::Flag(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<FieldValue, E> {
        Decimal::deserialize(de::value::I64Deserializer::<E>::new(v)).map(FieldValue::Number)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<FieldValue, E> {
        Decimal::deserialize(de::value::U64Deserializer::<E>::new(v)).map(FieldValue::Number)
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<FieldValue, E> {
        Decimal::deserialize(de::value::F64Deserializer::<E>::new(v)).map(FieldValue::Number)
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<FieldValue, E> {
        Ok(FieldValue::Text(v.to_string()))
    }
}

impl<'de> Deserialize<'de> for FieldValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(FieldValueVisitor)
    }
}

// =============================================================================
// STUDENT RECORD
// =============================================================================

/// The academic record collected by the form.
///
/// Absent keys mean "undefined". Deserializing maps JSON `null` to absent.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct StudentRecord {
    values: BTreeMap<Field, FieldValue>,
}

impl StudentRecord {
    /// An empty record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The record the form starts from.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new()
            .with(Field::Sexe, "M")
            .with(Field::Serie, Track::S1.code())
            .with(Field::Age, Score::from_points(18))
            .with(Field::InapteEps, false)
    }

    /// Builder-style setter.
    #[must_use]
    pub fn with(mut self, field: Field, value: impl Into<FieldValue>) -> Self {
        self.set(field, value);
        self
    }

    /// Set a field, replacing any previous value.
    ///
    /// The value is reshaped for the field's domain first.
    pub fn set(&mut self, field: Field, value: impl Into<FieldValue>) {
        self.values.insert(field, value.into().for_field(field));
    }

    /// Remove a field, returning its previous value.
    pub fn remove(&mut self, field: Field) -> Option<FieldValue> {
        self.values.remove(&field)
    }

    /// Raw value of a field.
    #[must_use]
    pub fn get(&self, field: Field) -> Option<&FieldValue> {
        self.values.get(&field)
    }

    /// Defined and non-empty.
    #[must_use]
    pub fn is_present(&self, field: Field) -> bool {
        self.get(field).is_some_and(FieldValue::is_present)
    }

    /// Numeric reading of a present field.
    #[must_use]
    pub fn score(&self, field: Field) -> Option<Score> {
        self.get(field)
            .filter(|value| value.is_present())
            .map(FieldValue::coerce_score)
    }

    /// Numeric reading of a field, 0 when absent.
    #[must_use]
    pub fn score_or_zero(&self, field: Field) -> Score {
        self.score(field).unwrap_or(Score::ZERO)
    }

    /// Textual reading of a present field.
    #[must_use]
    pub fn text(&self, field: Field) -> Option<String> {
        self.get(field)
            .filter(|value| value.is_present())
            .map(FieldValue::as_text)
    }

    /// Selected track, if the `Série` field names one.
    #[must_use]
    pub fn track(&self) -> Option<Track> {
        self.text(Field::Serie).and_then(|code| code.parse().ok())
    }

    /// Whether the PE exemption flag is set.
    #[must_use]
    pub fn unfit_for_pe(&self) -> bool {
        match self.get(Field::InapteEps) {
            Some(FieldValue::Flag(flag)) => *flag,
            Some(FieldValue::Text(text)) => text.trim().eq_ignore_ascii_case("true"),
            _ => false,
        }
    }

    /// Iterate fields in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = (Field, &FieldValue)> {
        self.values.iter().map(|(field, value)| (*field, value))
    }

    /// Number of defined fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no field is defined.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<'de> Deserialize<'de> for StudentRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = BTreeMap::<Field, Option<FieldValue>>::deserialize(deserializer)?;
        let values = raw
            .into_iter()
            .filter_map(|(field, value)| value.map(|v| (field, v.for_field(field))))
            .collect();
        Ok(Self { values })
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Per-field validation error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum FieldError {
    /// Numeric value outside its domain.
    #[error("value out of range")]
    OutOfRange,

    /// Prior-year average below 9.5.
    #[error("average below the promotion threshold")]
    BelowPromotionThreshold,

    /// Missing mandatory value.
    #[error("value required")]
    Required,
}

/// Errors that can occur in the DIORES engine and its hosts.
///
/// Validation failures are not errors: they are reported as
/// [`FieldError`] values or `false` step checks.
#[derive(Debug, Error)]
pub enum DioresError {
    /// A score could not be parsed.
    #[error("Invalid score: {0:?}")]
    InvalidScore(String),

    /// An unknown track code was given.
    #[error("Unknown track: {0:?}")]
    UnknownTrack(String),

    /// An unknown field name was given.
    #[error("Unknown field: {0:?}")]
    UnknownField(String),

    /// A computed field was written directly.
    #[error("Field {0} is computed and cannot be set")]
    DerivedField(Field),

    /// A step transition was attempted before the step validated.
    #[error("Step {0} is incomplete")]
    StepIncomplete(crate::validation::Step),

    /// The record fails the exam consistency checks.
    #[error("Record is not eligible: {0}")]
    Ineligible(crate::validation::ExamCheckFailure),

    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// A serialization or deserialization error occurred.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    IoError(String),
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_names_round_trip() {
        for field in Field::ALL {
            assert_eq!(field.name().parse::<Field>().expect("known"), *field);
        }
        assert!("NOPE".parse::<Field>().is_err());
    }

    #[test]
    fn track_parsing_is_case_insensitive() {
        assert_eq!(" s2 ".parse::<Track>().expect("track"), Track::S2);
        assert!("S4".parse::<Track>().is_err());
    }

    #[test]
    fn numeric_strings_are_coerced_for_numeric_fields_only() {
        assert_eq!(
            FieldValue::from_input(Field::Math, "12,5"),
            FieldValue::from(Score::from_hundredths(1250))
        );
        assert_eq!(
            FieldValue::from_input(Field::Residence, "Dakar"),
            FieldValue::Text("Dakar".to_string())
        );
        assert_eq!(
            FieldValue::from_input(Field::EtsDeProvenance, "007"),
            FieldValue::Text("007".to_string())
        );
        assert_eq!(
            FieldValue::from(Score::from_points(105)).for_field(Field::CentreEc),
            FieldValue::Text("105".to_string())
        );
    }

    #[test]
    fn typed_precision_is_kept() {
        let value = FieldValue::from_input(Field::MoyNde, "9.499");
        assert_eq!(value.as_text(), "9.499");
        assert_eq!(value.coerce_score(), Score::from_hundredths(950));
    }

    #[test]
    fn presence_ignores_blank_text() {
        let record = StudentRecord::new()
            .with(Field::Residence, "   ")
            .with(Field::Academie, "Thiès");
        assert!(!record.is_present(Field::Residence));
        assert!(record.is_present(Field::Academie));
        assert!(!record.is_present(Field::Math));
    }

    #[test]
    fn invalid_number_reads_as_zero() {
        let record = StudentRecord::new().with(Field::Math, FieldValue::Text("n/a".into()));
        assert_eq!(record.score(Field::Math), Some(Score::ZERO));
        assert_eq!(record.score_or_zero(Field::Scph), Score::ZERO);
    }

    #[test]
    fn defaults_select_s1() {
        let record = StudentRecord::with_defaults();
        assert_eq!(record.track(), Some(Track::S1));
        assert!(!record.unfit_for_pe());
        assert_eq!(record.score(Field::Age), Some(Score::from_points(18)));
    }

    #[test]
    fn record_json_uses_wire_names_and_drops_nulls() {
        let json = r#"{"MATH": 16, "Moy_ère": "12.5", "Résidence": "Dakar", "SVT": null, "Inapte_EPS": true}"#;
        let record: StudentRecord = serde_json::from_str(json).expect("record");

        assert_eq!(record.score(Field::Math), Some(Score::from_points(16)));
        assert_eq!(record.score(Field::MoyEre), Some(Score::from_hundredths(1250)));
        assert_eq!(record.text(Field::Residence).as_deref(), Some("Dakar"));
        assert_eq!(record.get(Field::MoyEre), Some(&FieldValue::from(Score::from_hundredths(1250))));
        assert!(record.get(Field::Svt).is_none());
        assert!(record.unfit_for_pe());

        let out = serde_json::to_string(&record).expect("ser");
        assert!(out.contains("\"MATH\":16.0"));
        assert!(out.contains("\"Résidence\":\"Dakar\""));
    }

    #[test]
    fn unknown_record_key_is_rejected() {
        let result: Result<StudentRecord, _> = serde_json::from_str(r#"{"SPORT": 12}"#);
        assert!(result.is_err());
    }
}
