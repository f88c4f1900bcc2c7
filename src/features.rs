//! Named feature groups and the columns they resolve to.
//!
//! Column identifiers are the logical (whitespace-trimmed) names produced by
//! the loader. The three continuous features carry a per-variant suffix; the
//! one-hot groups are shared by both variants.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Raw shelter duration in days, present in both variants.
pub const RAW_TIME_IN_SHELTER: &str = "time_in_shelter_days";

/// Raw age at outcome in years, present in both variants.
pub const RAW_AGE_UPON_OUTCOME: &str = "age_upon_outcome_(years)";

/// Encoding of the continuous features.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatasetVariant {
    /// Min-max normalized.
    Normalized,
    /// Z-score standardized.
    Standardized,
}

impl DatasetVariant {
    fn suffix(self) -> &'static str {
        match self {
            DatasetVariant::Normalized => "_normalized",
            DatasetVariant::Standardized => "_scaled",
        }
    }
}

impl fmt::Display for DatasetVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatasetVariant::Normalized => f.write_str("normalized"),
            DatasetVariant::Standardized => f.write_str("standardized"),
        }
    }
}

impl FromStr for DatasetVariant {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "normalized" => Ok(DatasetVariant::Normalized),
            "standardized" | "scaled" => Ok(DatasetVariant::Standardized),
            _ => Err(Error::InvalidParameter {
                name: "variant",
                message: "expected `normalized` or `standardized`",
            }),
        }
    }
}

/// A table column together with its display label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnDescriptor {
    pub column: String,
    pub label: String,
}

impl ColumnDescriptor {
    pub fn new(column: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            label: label.into(),
        }
    }
}

/// A named group of feature columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FeatureGroup {
    AgeUponIntake,
    AgeUponOutcome,
    TimeInShelter,
    OutcomeType,
    SexUponOutcome,
    AnimalType,
    IntakeCondition,
    SexUponIntake,
    MixBreed,
    Color,
}

const OUTCOME_TYPE: &[(&str, &str)] = &[
    ("outcome_type_Adoption", "Adopted"),
    ("outcome_type_Died", "Died"),
    ("outcome_type_Euthanasia", "Euthanasia"),
    ("outcome_type_Missing", "Missing"),
    ("outcome_type_Return to Owner", "Returned to owner"),
    ("outcome_type_Transfer", "Transferred to partner shelter"),
];

const SEX_UPON_OUTCOME: &[(&str, &str)] = &[
    ("sex_upon_outcome_Intact Female", "Intact female"),
    ("sex_upon_outcome_Intact Male", "Intact male"),
    ("sex_upon_outcome_Neutered Male", "Neutered male"),
    ("sex_upon_outcome_Spayed Female", "Spayed female"),
    ("sex_upon_outcome_Unknown", "Unknown"),
];

const ANIMAL_TYPE: &[(&str, &str)] = &[
    ("animal_type_Bir", "Bird"),
    ("animal_type_Cat", "Cat"),
    ("animal_type_Dog", "Dog"),
    ("animal_type_Oth", "Other animals"),
];

const INTAKE_CONDITION: &[(&str, &str)] = &[
    ("intake_condition_Aged", "Aged"),
    ("intake_condition_Feral", "Feral"),
    ("intake_condition_Injured", "Injured"),
    ("intake_condition_Normal", "Normal"),
    ("intake_condition_Nursing", "Nursing"),
    ("intake_condition_Other", "Other"),
    ("intake_condition_Pregnan", "Pregnant"),
    ("intake_condition_Sick", "Sick"),
];

const SEX_UPON_INTAKE: &[(&str, &str)] = &[
    ("sex_upon_intake_Intact Female", "Intact female"),
    ("sex_upon_intake_Intact Male", "Intact male"),
    ("sex_upon_intake_Neutered Male", "Neutered male"),
    ("sex_upon_intake_Spayed Female", "Spayed female"),
    ("sex_upon_intake_Unknown", "Unknown"),
];

const MIX_BREED: &[(&str, &str)] = &[("is_mix_breed", "Mixed breed")];

const COLOR: &[(&str, &str)] = &[
    ("color_Black", "Black"),
    ("color_Brown/Chocolate", "Brown/Chocolate"),
    ("color_Gray/Blue", "Gray/Blue"),
    ("color_Other_Colors", "Other colors"),
    ("color_Patterned", "Patterned"),
    ("color_Red/Orange", "Red/Orange"),
    ("color_White", "White"),
    ("color_Yellow/Gold/Cream", "Yellow/Gold/Cream"),
];

impl FeatureGroup {
    /// Every group, in the order the full feature set lists them.
    pub const ALL: [FeatureGroup; 10] = [
        FeatureGroup::AgeUponIntake,
        FeatureGroup::AgeUponOutcome,
        FeatureGroup::TimeInShelter,
        FeatureGroup::OutcomeType,
        FeatureGroup::SexUponOutcome,
        FeatureGroup::AnimalType,
        FeatureGroup::IntakeCondition,
        FeatureGroup::SexUponIntake,
        FeatureGroup::MixBreed,
        FeatureGroup::Color,
    ];

    pub fn id(self) -> &'static str {
        match self {
            FeatureGroup::AgeUponIntake => "age-upon-intake",
            FeatureGroup::AgeUponOutcome => "age-upon-outcome",
            FeatureGroup::TimeInShelter => "time-in-shelter",
            FeatureGroup::OutcomeType => "outcome-type",
            FeatureGroup::SexUponOutcome => "sex-upon-outcome",
            FeatureGroup::AnimalType => "animal-type",
            FeatureGroup::IntakeCondition => "intake-condition",
            FeatureGroup::SexUponIntake => "sex-upon-intake",
            FeatureGroup::MixBreed => "mix-breed",
            FeatureGroup::Color => "color",
        }
    }

    /// Ordered column descriptors for `variant`.
    pub fn columns(self, variant: DatasetVariant) -> Vec<ColumnDescriptor> {
        match self {
            FeatureGroup::AgeUponIntake => {
                continuous("age_upon_intake_(years)", "Age at intake", variant)
            }
            FeatureGroup::AgeUponOutcome => {
                continuous(RAW_AGE_UPON_OUTCOME, "Age at outcome", variant)
            }
            FeatureGroup::TimeInShelter => {
                continuous(RAW_TIME_IN_SHELTER, "Days in shelter", variant)
            }
            FeatureGroup::OutcomeType => one_hot(OUTCOME_TYPE),
            FeatureGroup::SexUponOutcome => one_hot(SEX_UPON_OUTCOME),
            FeatureGroup::AnimalType => one_hot(ANIMAL_TYPE),
            FeatureGroup::IntakeCondition => one_hot(INTAKE_CONDITION),
            FeatureGroup::SexUponIntake => one_hot(SEX_UPON_INTAKE),
            FeatureGroup::MixBreed => one_hot(MIX_BREED),
            FeatureGroup::Color => one_hot(COLOR),
        }
    }
}

fn continuous(base: &str, label: &str, variant: DatasetVariant) -> Vec<ColumnDescriptor> {
    vec![ColumnDescriptor::new(
        format!("{base}{}", variant.suffix()),
        label,
    )]
}

fn one_hot(entries: &[(&str, &str)]) -> Vec<ColumnDescriptor> {
    entries
        .iter()
        .map(|&(c, l)| ColumnDescriptor::new(c, l))
        .collect()
}

impl fmt::Display for FeatureGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for FeatureGroup {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        FeatureGroup::ALL
            .into_iter()
            .find(|g| g.id() == s)
            .ok_or_else(|| Error::UnknownFeatureGroup(s.to_string()))
    }
}

/// Column names for `groups` under `variant`, in group order, first
/// occurrence wins.
pub fn resolve_features(groups: &[FeatureGroup], variant: DatasetVariant) -> Result<Vec<String>> {
    if groups.is_empty() {
        return Err(Error::EmptyFeatureSubset);
    }
    let mut out: Vec<String> = Vec::new();
    for group in groups {
        for desc in group.columns(variant) {
            if !out.contains(&desc.column) {
                out.push(desc.column);
            }
        }
    }
    Ok(out)
}
