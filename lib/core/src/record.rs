use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use crate::units;
use crate::{Error, Result};

/// A scored attribute of a case
///
/// Declaration order is the canonical attribute order used for iteration,
/// serialization of maps and explanations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Attribute {
    /// Length of gestation in days
    Gestation,
    /// Number of previous pregnancies
    Parity,
    /// Mother's age in years
    Age,
    /// Mother's height in inches
    Height,
    /// Mother's pre-pregnancy weight in pounds
    Weight,
    /// Smoking status, 0 or 1
    Smoke,
}

impl Attribute {
    pub const ALL: [Attribute; 6] = [
        Attribute::Gestation,
        Attribute::Parity,
        Attribute::Age,
        Attribute::Height,
        Attribute::Weight,
        Attribute::Smoke,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Attribute::Gestation => "gestation",
            Attribute::Parity => "parity",
            Attribute::Age => "age",
            Attribute::Height => "height",
            Attribute::Weight => "weight",
            Attribute::Smoke => "smoke",
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Attribute {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Attribute::ALL
            .into_iter()
            .find(|attr| attr.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::InvalidConfig(format!("unknown attribute '{}'", s)))
    }
}

/// Identifier of a case in the dataset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CaseId(pub u64);

impl fmt::Display for CaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for CaseId {
    fn from(id: u64) -> Self {
        CaseId(id)
    }
}

/// The scored attribute values of a case, in canonical units
/// (days, count, years, inches, pounds, 0/1)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Features {
    pub gestation: f64,
    pub parity: f64,
    pub age: f64,
    pub height: f64,
    pub weight: f64,
    pub smoke: f64,
}

impl Features {
    #[inline]
    pub fn get(&self, attr: Attribute) -> f64 {
        match attr {
            Attribute::Gestation => self.gestation,
            Attribute::Parity => self.parity,
            Attribute::Age => self.age,
            Attribute::Height => self.height,
            Attribute::Weight => self.weight,
            Attribute::Smoke => self.smoke,
        }
    }

    #[inline]
    pub fn set(&mut self, attr: Attribute, value: f64) {
        match attr {
            Attribute::Gestation => self.gestation = value,
            Attribute::Parity => self.parity = value,
            Attribute::Age => self.age = value,
            Attribute::Height => self.height = value,
            Attribute::Weight => self.weight = value,
            Attribute::Smoke => self.smoke = value,
        }
    }

    #[inline]
    #[must_use]
    pub fn with(mut self, attr: Attribute, value: f64) -> Self {
        self.set(attr, value);
        self
    }

    /// First attribute holding a NaN or infinite value, if any
    pub fn first_non_finite(&self) -> Option<Attribute> {
        Attribute::ALL.into_iter().find(|attr| !self.get(*attr).is_finite())
    }
}

/// A historical case
///
/// `birth_weight` (grams) is carried for display only and never scored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: CaseId,
    #[serde(flatten)]
    pub features: Features,
    pub birth_weight: f64,
}

impl Record {
    #[inline]
    #[must_use]
    pub fn new(id: u64, features: Features, birth_weight: f64) -> Self {
        Self {
            id: CaseId(id),
            features,
            birth_weight,
        }
    }

    pub fn height_cm(&self) -> f64 {
        units::in_to_cm(self.features.height)
    }

    pub fn weight_kg(&self) -> f64 {
        units::lb_to_kg(self.features.weight)
    }

    pub fn is_smoker(&self) -> bool {
        self.features.smoke != 0.0
    }
}

/// A user-described case in canonical units
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Query {
    pub features: Features,
}

impl Query {
    #[inline]
    #[must_use]
    pub fn new(features: Features) -> Self {
        Self { features }
    }

    #[inline]
    pub fn get(&self, attr: Attribute) -> f64 {
        self.features.get(attr)
    }

    pub fn validate(&self) -> Result<()> {
        match self.features.first_non_finite() {
            Some(attr) => Err(Error::InvalidQuery(format!("'{}' must be a finite number", attr))),
            None => Ok(()),
        }
    }
}

impl From<Features> for Query {
    fn from(features: Features) -> Self {
        Query::new(features)
    }
}

impl From<Record> for Query {
    fn from(record: Record) -> Self {
        Query::new(record.features)
    }
}
