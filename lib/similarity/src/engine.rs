//! Similarity engine
//!
//! Scores every case of a dataset against a query with a weight vector, in
//! one of two aggregation modes, and keeps a per-attribute breakdown of each
//! score.

use crate::distance::{local_similarity, match_gap, match_similarity, relative_similarity, squared_gap};
use crate::normalize::NormalizationParams;
use crate::schema::{AttributeScales, EngineConfig, Scale, SimilarityMode, WeightVector};
use casebase_core::{Attribute, Query, Record, Result};
use serde::Serialize;
use std::collections::BTreeMap;

/// Raw score of one case
#[derive(Debug, Clone, PartialEq)]
pub struct Score {
    /// Similarity in [0, 1] (local mode) or distance >= 0 (Euclidean mode)
    pub value: f64,
    /// Weighted per-attribute terms. They sum to `value` in local mode and
    /// to `value²` in Euclidean mode.
    pub contributions: BTreeMap<Attribute, f64>,
}

/// A case with its computed score
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredRecord {
    pub record: Record,
    /// Display similarity in [0, 100]
    pub similarity: f64,
    /// Raw distance, Euclidean mode only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
    /// 1-based position after ranking, 0 before
    pub rank: usize,
    pub contributions: BTreeMap<Attribute, f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityEngine {
    mode: SimilarityMode,
    scales: AttributeScales,
}

impl SimilarityEngine {
    pub fn new(mode: SimilarityMode, scales: AttributeScales) -> Self {
        Self { mode, scales }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.mode, config.scales.clone())
    }

    pub fn mode(&self) -> SimilarityMode {
        self.mode
    }

    pub fn scales(&self) -> &AttributeScales {
        &self.scales
    }

    #[must_use]
    pub fn with_mode(&self, mode: SimilarityMode) -> Self {
        Self::new(mode, self.scales.clone())
    }

    /// Score a single case
    ///
    /// Fails with `InvalidWeights` unless the weights have a positive sum.
    pub fn score(
        &self,
        query: &Query,
        record: &Record,
        weights: &WeightVector,
        params: &NormalizationParams,
    ) -> Result<Score> {
        let total = weights.validate()?;
        Ok(self.score_with_total(query, record, weights, total, params))
    }

    /// Score every case, with display similarities
    ///
    /// In Euclidean mode the display similarity is relative to the largest
    /// distance among `records`, so it is only comparable within one call.
    pub fn score_all(
        &self,
        query: &Query,
        records: &[Record],
        weights: &WeightVector,
        params: &NormalizationParams,
    ) -> Result<Vec<ScoredRecord>> {
        query.validate()?;
        let total = weights.validate()?;

        let scores: Vec<(Record, Score)> = records
            .iter()
            .map(|record| (*record, self.score_with_total(query, record, weights, total, params)))
            .collect();

        let scored = match self.mode {
            SimilarityMode::WeightedLocalSimilarity => scores
                .into_iter()
                .map(|(record, score)| ScoredRecord {
                    record,
                    similarity: score.value * 100.0,
                    distance: None,
                    rank: 0,
                    contributions: score.contributions,
                })
                .collect(),
            SimilarityMode::WeightedEuclideanDistance => {
                let max_distance = scores.iter().map(|(_, s)| s.value).fold(0.0, f64::max);
                scores
                    .into_iter()
                    .map(|(record, score)| ScoredRecord {
                        record,
                        similarity: relative_similarity(score.value, max_distance),
                        distance: Some(score.value),
                        rank: 0,
                        contributions: score.contributions,
                    })
                    .collect()
            }
        };

        Ok(scored)
    }

    fn score_with_total(
        &self,
        query: &Query,
        record: &Record,
        weights: &WeightVector,
        total: f64,
        params: &NormalizationParams,
    ) -> Score {
        let mut contributions = BTreeMap::new();
        let mut sum = 0.0;

        for attr in Attribute::ALL {
            let weight = weights.get(attr);
            let q = query.get(attr);
            let c = record.features.get(attr);

            let term = match (self.mode, self.scales.get(attr)) {
                (SimilarityMode::WeightedLocalSimilarity, Scale::Match) => match_similarity(q, c),
                (SimilarityMode::WeightedLocalSimilarity, Scale::Continuous) => {
                    let max = params.range(attr).map_or(0.0, |r| r.max);
                    local_similarity(q, c, max)
                }
                (SimilarityMode::WeightedEuclideanDistance, Scale::Match) => match_gap(q, c),
                (SimilarityMode::WeightedEuclideanDistance, Scale::Continuous) => {
                    squared_gap(params.normalize(attr, q), params.normalize(attr, c))
                }
            } * weight;

            let contribution = match self.mode {
                SimilarityMode::WeightedLocalSimilarity => term / total,
                SimilarityMode::WeightedEuclideanDistance => term,
            };
            contributions.insert(attr, contribution);
            sum += term;
        }

        let value = match self.mode {
            SimilarityMode::WeightedLocalSimilarity => (sum / total).clamp(0.0, 1.0),
            SimilarityMode::WeightedEuclideanDistance => sum.sqrt(),
        };

        Score { value, contributions }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use casebase_core::{Error, Features};

    fn features(gestation: f64, parity: f64, age: f64, height: f64, weight: f64, smoke: f64) -> Features {
        Features { gestation, parity, age, height, weight, smoke }
    }

    fn dataset() -> Vec<Record> {
        vec![
            Record::new(1, features(280.0, 0.0, 30.0, 65.0, 120.0, 0.0), 3400.0),
            Record::new(2, features(260.0, 1.0, 22.0, 60.0, 100.0, 1.0), 2900.0),
        ]
    }

    fn setup(mode: SimilarityMode) -> (SimilarityEngine, NormalizationParams, Vec<Record>) {
        let records = dataset();
        let params = NormalizationParams::compute(&records, &Attribute::ALL).unwrap();
        (SimilarityEngine::new(mode, AttributeScales::default()), params, records)
    }

    #[test]
    fn test_local_exact_match_scores_one() {
        let (engine, params, records) = setup(SimilarityMode::WeightedLocalSimilarity);
        let query = Query::from(records[0]);

        let score = engine.score(&query, &records[0], &WeightVector::uniform(), &params).unwrap();
        assert_eq!(score.value, 1.0);
        assert_eq!(score.contributions.len(), 6);
    }

    #[test]
    fn test_local_partial_match() {
        let (engine, params, records) = setup(SimilarityMode::WeightedLocalSimilarity);
        let query = Query::from(records[0]);

        let score = engine.score(&query, &records[1], &WeightVector::uniform(), &params).unwrap();
        let expected = ((1.0 - 20.0 / 280.0)
            + (1.0 - 1.0 / 1.0)
            + (1.0 - 8.0 / 30.0)
            + (1.0 - 5.0 / 65.0)
            + (1.0 - 20.0 / 120.0)
            + 0.0)
            / 6.0;
        assert!((score.value - expected).abs() < 1e-12);

        let sum: f64 = score.contributions.values().sum();
        assert!((sum - score.value).abs() < 1e-12);
    }

    #[test]
    fn test_local_weights_are_normalized_by_sum() {
        let (engine, params, records) = setup(SimilarityMode::WeightedLocalSimilarity);
        let query = Query::from(records[0]);

        let single = WeightVector::default().with(Attribute::Smoke, 1.0);
        let scaled = WeightVector::default().with(Attribute::Smoke, 40.0);
        let a = engine.score(&query, &records[1], &single, &params).unwrap();
        let b = engine.score(&query, &records[1], &scaled, &params).unwrap();
        assert_eq!(a.value, 0.0);
        assert_eq!(a, b);
    }

    #[test]
    fn test_local_degenerate_attribute_is_neutral() {
        let records = vec![
            Record::new(1, features(280.0, 0.0, 30.0, 65.0, 120.0, 0.0), 3400.0),
            Record::new(2, features(260.0, 0.0, 22.0, 60.0, 100.0, 1.0), 2900.0),
        ];
        let params = NormalizationParams::compute(&records, &Attribute::ALL).unwrap();
        let engine = SimilarityEngine::new(SimilarityMode::WeightedLocalSimilarity, AttributeScales::default());

        // Parity is 0 everywhere; a query parity of 3 cannot disagree
        let query = Query::new(records[0].features.with(Attribute::Parity, 3.0));
        let weights = WeightVector::default().with(Attribute::Parity, 1.0);
        let score = engine.score(&query, &records[0], &weights, &params).unwrap();
        assert_eq!(score.value, 1.0);
    }

    #[test]
    fn test_local_constant_nonzero_attribute_scores_every_case_alike() {
        let records = vec![
            Record::new(1, features(280.0, 1.0, 30.0, 65.0, 120.0, 0.0), 3400.0),
            Record::new(2, features(260.0, 1.0, 22.0, 60.0, 100.0, 1.0), 2900.0),
        ];
        let params = NormalizationParams::compute(&records, &Attribute::ALL).unwrap();
        let engine = SimilarityEngine::new(SimilarityMode::WeightedLocalSimilarity, AttributeScales::default());

        let query = Query::new(records[0].features.with(Attribute::Parity, 0.0));
        let weights = WeightVector::default().with(Attribute::Parity, 1.0);
        let scored = engine.score_all(&query, &records, &weights, &params).unwrap();

        assert_eq!(params.degenerate_attributes(), vec![Attribute::Parity]);
        assert!(scored.iter().all(|s| s.similarity == 0.0));
        assert_eq!(scored[0].contributions, scored[1].contributions);
    }

    #[test]
    fn test_euclidean_identical_is_zero_distance() {
        let (engine, params, records) = setup(SimilarityMode::WeightedEuclideanDistance);
        let query = Query::from(records[0]);

        let score = engine.score(&query, &records[0], &WeightVector::uniform(), &params).unwrap();
        assert_eq!(score.value, 0.0);

        let scored = engine.score_all(&query, &records, &WeightVector::uniform(), &params).unwrap();
        assert_eq!(scored[0].distance, Some(0.0));
        assert_eq!(scored[0].similarity, 100.0);
        assert_eq!(scored[1].similarity, 0.0);
    }

    #[test]
    fn test_euclidean_distance_value() {
        let (engine, params, records) = setup(SimilarityMode::WeightedEuclideanDistance);
        let query = Query::from(records[0]);

        // Two-record dataset: every continuous attribute sits at opposite
        // ends of its range, smoke differs. Each gap is 1.
        let score = engine.score(&query, &records[1], &WeightVector::uniform(), &params).unwrap();
        assert!((score.value - 6f64.sqrt()).abs() < 1e-12);

        let gestation_heavy = WeightVector::uniform().with(Attribute::Gestation, 4.0);
        let score = engine.score(&query, &records[1], &gestation_heavy, &params).unwrap();
        assert!((score.value - 3.0).abs() < 1e-12);

        let partial = WeightVector::default().with(Attribute::Gestation, 1.0).with(Attribute::Age, 3.0);
        let score = engine.score(&query, &records[1], &partial, &params).unwrap();
        assert!((score.value - 2.0).abs() < 1e-12);
        assert_eq!(score.contributions[&Attribute::Age], 3.0);
        let squared: f64 = score.contributions.values().sum();
        assert!((squared - score.value * score.value).abs() < 1e-12);
    }

    #[test]
    fn test_euclidean_all_equal_distances_show_full_similarity() {
        let records = vec![
            Record::new(1, features(280.0, 0.0, 30.0, 65.0, 120.0, 0.0), 3400.0),
            Record::new(2, features(280.0, 0.0, 30.0, 65.0, 120.0, 0.0), 3100.0),
        ];
        let params = NormalizationParams::compute(&records, &Attribute::ALL).unwrap();
        let engine = SimilarityEngine::new(SimilarityMode::WeightedEuclideanDistance, AttributeScales::default());
        let query = Query::new(features(250.0, 2.0, 40.0, 70.0, 150.0, 0.0));

        let scored = engine.score_all(&query, &records, &WeightVector::uniform(), &params).unwrap();
        assert!(scored.iter().all(|s| s.distance == Some(0.0) && s.similarity == 100.0));
    }

    #[test]
    fn test_scale_policy_for_smoke() {
        let (_, params, records) = setup(SimilarityMode::WeightedEuclideanDistance);
        let query = Query::from(records[0]);
        let weights = WeightVector::default().with(Attribute::Smoke, 1.0);

        let continuous = SimilarityEngine::new(
            SimilarityMode::WeightedEuclideanDistance,
            AttributeScales::default().with(Attribute::Smoke, Scale::Continuous),
        );
        let matched = SimilarityEngine::new(SimilarityMode::WeightedEuclideanDistance, AttributeScales::default());

        // Binary attribute with min 0 and max 1: both policies agree
        let a = continuous.score(&query, &records[1], &weights, &params).unwrap();
        let b = matched.score(&query, &records[1], &weights, &params).unwrap();
        assert_eq!(a.value, b.value);
    }

    #[test]
    fn test_zero_weights_rejected_in_both_modes() {
        let zeros: WeightVector = Attribute::ALL.into_iter().map(|a| (a, 0.0)).collect();
        for mode in [SimilarityMode::WeightedLocalSimilarity, SimilarityMode::WeightedEuclideanDistance] {
            let (engine, params, records) = setup(mode);
            let query = Query::from(records[0]);
            assert!(matches!(
                engine.score(&query, &records[0], &zeros, &params),
                Err(Error::InvalidWeights(_))
            ));
            assert!(matches!(
                engine.score_all(&query, &records, &zeros, &params),
                Err(Error::InvalidWeights(_))
            ));
        }
    }

    #[test]
    fn test_invalid_query_rejected() {
        let (engine, params, records) = setup(SimilarityMode::WeightedLocalSimilarity);
        let query = Query::new(records[0].features.with(Attribute::Age, f64::INFINITY));
        assert!(matches!(
            engine.score_all(&query, &records, &WeightVector::uniform(), &params),
            Err(Error::InvalidQuery(_))
        ));
    }

    #[test]
    fn test_scoring_is_deterministic() {
        for mode in [SimilarityMode::WeightedLocalSimilarity, SimilarityMode::WeightedEuclideanDistance] {
            let (engine, params, records) = setup(mode);
            let query = Query::new(features(270.0, 0.0, 25.0, 63.0, 110.0, 1.0));
            let weights = WeightVector::uniform().with(Attribute::Height, 2.5);

            let first = engine.score_all(&query, &records, &weights, &params).unwrap();
            let second = engine.score_all(&query, &records, &weights, &params).unwrap();
            assert_eq!(first, second);
        }
    }

    #[test]
    fn test_local_scores_within_percentage_bounds() {
        let (engine, params, records) = setup(SimilarityMode::WeightedLocalSimilarity);
        let far = Query::new(features(900.0, 12.0, 99.0, 200.0, 900.0, 1.0));
        let weights = WeightVector::uniform().with(Attribute::Weight, 7.0);

        for scored in engine.score_all(&far, &records, &weights, &params).unwrap() {
            assert!((0.0..=100.0).contains(&scored.similarity));
        }
    }
}
