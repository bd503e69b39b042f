//! Engine configuration
//!
//! Declares how cases are compared: the aggregation mode, how each
//! attribute is compared (continuous scale or exact match), the default
//! attribute weights and the page size.

use casebase_core::{Attribute, Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::num::NonZeroUsize;
use std::str::FromStr;

/// How per-attribute comparisons are aggregated into one score
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SimilarityMode {
    /// `Σ s_a·w_a / Σ w_a` with `s_a = 1 - |q - r| / max_a`; ranked descending
    #[default]
    #[serde(alias = "local")]
    WeightedLocalSimilarity,
    /// `sqrt(Σ w_a·(q̂ - r̂)²)` over min-max normalized values; ranked ascending
    #[serde(alias = "euclidean")]
    WeightedEuclideanDistance,
}

impl fmt::Display for SimilarityMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimilarityMode::WeightedLocalSimilarity => f.write_str("weighted_local_similarity"),
            SimilarityMode::WeightedEuclideanDistance => f.write_str("weighted_euclidean_distance"),
        }
    }
}

impl FromStr for SimilarityMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" | "weighted_local_similarity" => Ok(SimilarityMode::WeightedLocalSimilarity),
            "euclidean" | "weighted_euclidean_distance" => Ok(SimilarityMode::WeightedEuclideanDistance),
            other => Err(Error::InvalidConfig(format!("unknown similarity mode '{}'", other))),
        }
    }
}

/// How a single attribute is compared
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Scale {
    /// Distance along the attribute's observed range
    #[default]
    Continuous,
    /// 1 if equal, 0 otherwise
    Match,
}

/// Per-attribute comparison policy
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct AttributeScales {
    scales: BTreeMap<Attribute, Scale>,
}

impl Default for AttributeScales {
    /// Smoking status is categorical, everything else continuous
    fn default() -> Self {
        Self {
            scales: BTreeMap::from([(Attribute::Smoke, Scale::Match)]),
        }
    }
}

impl AttributeScales {
    pub fn get(&self, attr: Attribute) -> Scale {
        self.scales.get(&attr).copied().unwrap_or_default()
    }

    #[must_use]
    pub fn with(mut self, attr: Attribute, scale: Scale) -> Self {
        self.scales.insert(attr, scale);
        self
    }
}

/// Non-negative importance of each attribute
///
/// Weights need not sum to 1; local mode divides by their sum. Attributes
/// absent from the map weigh 0.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(transparent)]
pub struct WeightVector {
    weights: BTreeMap<Attribute, f64>,
}

impl WeightVector {
    pub fn new(weights: BTreeMap<Attribute, f64>) -> Self {
        Self { weights }
    }

    /// Every attribute with weight 1
    pub fn uniform() -> Self {
        Self {
            weights: Attribute::ALL.into_iter().map(|attr| (attr, 1.0)).collect(),
        }
    }

    pub fn get(&self, attr: Attribute) -> f64 {
        self.weights.get(&attr).copied().unwrap_or(0.0)
    }

    pub fn set(&mut self, attr: Attribute, weight: f64) {
        self.weights.insert(attr, weight);
    }

    #[must_use]
    pub fn with(mut self, attr: Attribute, weight: f64) -> Self {
        self.set(attr, weight);
        self
    }

    /// Apply overrides on top of these weights
    #[must_use]
    pub fn merged(&self, overrides: &WeightVector) -> WeightVector {
        let mut merged = self.clone();
        for (attr, weight) in &overrides.weights {
            merged.set(*attr, *weight);
        }
        merged
    }

    pub fn total(&self) -> f64 {
        self.weights.values().sum()
    }

    /// Check every weight is finite and non-negative with a positive sum.
    /// Returns the sum.
    pub fn validate(&self) -> Result<f64> {
        for (attr, weight) in &self.weights {
            if !weight.is_finite() {
                return Err(Error::InvalidWeights(format!("weight for '{}' is not finite", attr)));
            }
            if *weight < 0.0 {
                return Err(Error::InvalidWeights(format!("weight for '{}' is negative", attr)));
            }
        }

        let total = self.total();
        if total <= 0.0 {
            return Err(Error::InvalidWeights("weights must not all be zero".to_string()));
        }
        Ok(total)
    }
}

impl FromIterator<(Attribute, f64)> for WeightVector {
    fn from_iter<I: IntoIterator<Item = (Attribute, f64)>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Engine configuration, version 1
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EngineConfig {
    /// Config version for future compatibility
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default)]
    pub mode: SimilarityMode,

    #[serde(default = "default_page_size")]
    pub page_size: usize,

    #[serde(default)]
    pub scales: AttributeScales,

    /// Weights used when a request supplies none
    #[serde(default = "WeightVector::uniform")]
    pub default_weights: WeightVector,
}

fn default_version() -> u32 {
    1
}

fn default_page_size() -> usize {
    5
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            mode: SimilarityMode::default(),
            page_size: default_page_size(),
            scales: AttributeScales::default(),
            default_weights: WeightVector::uniform(),
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(Error::InvalidConfig(format!("unsupported config version {}", self.version)));
        }
        self.page_size_nonzero()?;
        self.default_weights.validate()?;
        Ok(())
    }

    pub fn page_size_nonzero(&self) -> Result<NonZeroUsize> {
        NonZeroUsize::new(self.page_size)
            .ok_or_else(|| Error::InvalidConfig("page_size must be positive".to_string()))
    }
}
