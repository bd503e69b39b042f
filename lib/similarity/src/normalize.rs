//! Min-max normalization
//!
//! Scaling parameters are computed once from the dataset and applied
//! unchanged to both dataset records and queries. A query never widens the
//! scale.

use casebase_core::{Attribute, Error, Record, Result};
use serde::Serialize;
use std::collections::BTreeMap;

/// Observed `[min, max]` of one attribute
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AttributeRange {
    pub min: f64,
    pub max: f64,
}

impl AttributeRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Zero spread: the attribute carries no discriminative signal
    #[inline]
    pub fn is_degenerate(&self) -> bool {
        self.max == self.min
    }

    #[inline]
    pub fn span(&self) -> f64 {
        self.max - self.min
    }
}

/// Map `value` into `[0, 1]` along `range`
///
/// Degenerate ranges map everything to 0. Values outside the range are
/// clamped.
#[inline]
pub fn normalize(value: f64, range: AttributeRange) -> f64 {
    if range.is_degenerate() {
        return 0.0;
    }
    ((value - range.min) / range.span()).clamp(0.0, 1.0)
}

/// Per-attribute scaling parameters of a dataset
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct NormalizationParams {
    ranges: BTreeMap<Attribute, AttributeRange>,
}

impl NormalizationParams {
    /// Scan `records` for the min and max of each of `attributes`
    pub fn compute(records: &[Record], attributes: &[Attribute]) -> Result<Self> {
        let (first, rest) = records.split_first().ok_or(Error::EmptyDataset)?;

        let mut ranges: BTreeMap<Attribute, AttributeRange> = attributes
            .iter()
            .map(|attr| {
                let v = first.features.get(*attr);
                (*attr, AttributeRange::new(v, v))
            })
            .collect();

        for record in rest {
            for (attr, range) in ranges.iter_mut() {
                let v = record.features.get(*attr);
                range.min = range.min.min(v);
                range.max = range.max.max(v);
            }
        }

        Ok(Self { ranges })
    }

    pub fn range(&self, attr: Attribute) -> Option<AttributeRange> {
        self.ranges.get(&attr).copied()
    }

    /// Normalize `value` of `attr`; attributes without parameters map to 0
    pub fn normalize(&self, attr: Attribute, value: f64) -> f64 {
        self.range(attr).map_or(0.0, |range| normalize(value, range))
    }

    pub fn degenerate_attributes(&self) -> Vec<Attribute> {
        self.ranges
            .iter()
            .filter(|(_, range)| range.is_degenerate())
            .map(|(attr, _)| *attr)
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Attribute, AttributeRange)> + '_ {
        self.ranges.iter().map(|(attr, range)| (*attr, *range))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use casebase_core::Features;

    fn record(id: u64, gestation: f64, parity: f64) -> Record {
        Record::new(id, Features { gestation, parity, ..Default::default() }, 3000.0)
    }

    #[test]
    fn test_normalize_bounds() {
        let range = AttributeRange::new(250.0, 300.0);
        assert_eq!(normalize(250.0, range), 0.0);
        assert_eq!(normalize(300.0, range), 1.0);
        assert!((normalize(275.0, range) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_normalize_degenerate_range() {
        let range = AttributeRange::new(3.0, 3.0);
        assert!(range.is_degenerate());
        assert_eq!(normalize(3.0, range), 0.0);
        assert_eq!(normalize(10.0, range), 0.0);
    }

    #[test]
    fn test_normalize_clamps_out_of_range() {
        let range = AttributeRange::new(0.0, 10.0);
        assert_eq!(normalize(-5.0, range), 0.0);
        assert_eq!(normalize(15.0, range), 1.0);
    }

    #[test]
    fn test_compute_params() {
        let records = vec![record(1, 280.0, 0.0), record(2, 260.0, 0.0), record(3, 301.0, 0.0)];
        let params =
            NormalizationParams::compute(&records, &[Attribute::Gestation, Attribute::Parity]).unwrap();

        assert_eq!(params.range(Attribute::Gestation), Some(AttributeRange::new(260.0, 301.0)));
        assert_eq!(params.degenerate_attributes(), vec![Attribute::Parity]);
        assert!(params.range(Attribute::Age).is_none());
        assert_eq!(params.normalize(Attribute::Age, 30.0), 0.0);
        assert_eq!(params.normalize(Attribute::Gestation, 301.0), 1.0);
    }

    #[test]
    fn test_compute_params_empty_dataset() {
        assert!(matches!(
            NormalizationParams::compute(&[], &Attribute::ALL),
            Err(Error::EmptyDataset)
        ));
    }
}
