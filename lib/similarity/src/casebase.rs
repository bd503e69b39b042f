//! Prepared casebase
//!
//! Splits retrieval into two stages: [`Casebase::prepare`] loads the
//! normalization parameters once, [`Casebase::evaluate`] scores, ranks and
//! pages for each request. A prepared casebase is immutable and can be
//! shared across threads behind an `Arc`.

use crate::engine::SimilarityEngine;
use crate::explain::{SimilarityStats, Warning};
use crate::normalize::NormalizationParams;
use crate::rank::{page, rank, Page};
use crate::schema::{EngineConfig, SimilarityMode, WeightVector};
use casebase_core::{Attribute, CaseId, Dataset, Query, Record, Result};
use std::num::NonZeroUsize;

/// Everything one evaluation needs
#[derive(Debug, Clone, PartialEq)]
pub struct SearchContext {
    pub query: Query,
    pub weights: WeightVector,
    pub mode: SimilarityMode,
    /// 1-based; out-of-range values are clamped
    pub page: usize,
    pub page_size: NonZeroUsize,
}

impl SearchContext {
    #[must_use]
    pub fn with_mode(mut self, mode: SimilarityMode) -> Self {
        self.mode = mode;
        self
    }

    #[must_use]
    pub fn with_page(mut self, page: usize) -> Self {
        self.page = page;
        self
    }

    #[must_use]
    pub fn with_page_size(mut self, page_size: NonZeroUsize) -> Self {
        self.page_size = page_size;
        self
    }
}

/// Outcome of one evaluation
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub mode: SimilarityMode,
    pub page: Page,
    pub stats: SimilarityStats,
    pub warnings: Vec<Warning>,
}

#[derive(Debug)]
pub struct Casebase {
    dataset: Dataset,
    params: NormalizationParams,
    config: EngineConfig,
    page_size: NonZeroUsize,
}

impl Casebase {
    /// Validate `config` and compute the dataset's normalization parameters
    pub fn prepare(dataset: Dataset, config: EngineConfig) -> Result<Self> {
        config.validate()?;
        let page_size = config.page_size_nonzero()?;
        let params = NormalizationParams::compute(dataset.records(), &Attribute::ALL)?;

        Ok(Self {
            dataset,
            params,
            config,
            page_size,
        })
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn params(&self) -> &NormalizationParams {
        &self.params
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.dataset.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dataset.is_empty()
    }

    pub fn get(&self, id: CaseId) -> Option<&Record> {
        self.dataset.get(id)
    }

    pub fn warnings(&self) -> Vec<Warning> {
        self.params
            .degenerate_attributes()
            .into_iter()
            .map(Warning::DegenerateAttribute)
            .collect()
    }

    /// A context for `query` seeded with the configured mode and page size,
    /// starting at page 1
    pub fn context(&self, query: Query, weights: WeightVector) -> SearchContext {
        SearchContext {
            query,
            weights,
            mode: self.config.mode,
            page: 1,
            page_size: self.page_size,
        }
    }

    /// Score, rank and page the whole casebase for `ctx`
    pub fn evaluate(&self, ctx: &SearchContext) -> Result<SearchResult> {
        let engine = SimilarityEngine::from_config(&self.config).with_mode(ctx.mode);
        let scored = engine.score_all(&ctx.query, self.dataset.records(), &ctx.weights, &self.params)?;
        let ranked = rank(scored, ctx.mode);

        Ok(SearchResult {
            mode: ctx.mode,
            stats: SimilarityStats::compute(&ranked, self.dataset.len()),
            page: page(&ranked, ctx.page, ctx.page_size),
            warnings: self.warnings(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{AttributeScales, Scale};
    use casebase_core::{DatasetLoader, Error, Features};

    const SAMPLE: &str = "case,bwt,gestation,parity,age,height,weight,smoke\n\
        1,120,284,0,27,62,100,0\n\
        2,113,282,0,33,64,135,0\n\
        3,128,279,0,28,64,115,1\n\
        4,108,282,0,23,67,125,1\n\
        5,136,286,0,25,62,93,0\n\
        6,138,244,0,33,62,178,0\n\
        7,132,245,0,23,65,140,0\n";

    fn casebase() -> Casebase {
        let dataset = DatasetLoader::default().load_str(SAMPLE).unwrap();
        Casebase::prepare(dataset, EngineConfig::default()).unwrap()
    }

    #[test]
    fn test_prepare_reports_degenerate_attributes() {
        let casebase = casebase();
        assert_eq!(casebase.len(), 7);
        assert_eq!(casebase.warnings(), vec![Warning::DegenerateAttribute(Attribute::Parity)]);
    }

    #[test]
    fn test_prepare_empty_dataset() {
        let err = Casebase::prepare(Dataset::default(), EngineConfig::default()).unwrap_err();
        assert!(matches!(err, Error::EmptyDataset));
    }

    #[test]
    fn test_prepare_rejects_bad_config() {
        let dataset = DatasetLoader::default().load_str(SAMPLE).unwrap();
        let config = EngineConfig { page_size: 0, ..Default::default() };
        assert!(matches!(Casebase::prepare(dataset, config), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_evaluate_finds_exact_case_first() {
        let casebase = casebase();
        let query = Query::from(*casebase.get(CaseId(4)).unwrap());

        for mode in [SimilarityMode::WeightedLocalSimilarity, SimilarityMode::WeightedEuclideanDistance] {
            let ctx = casebase.context(query, WeightVector::uniform()).with_mode(mode);
            let result = casebase.evaluate(&ctx).unwrap();

            let best = &result.page.items[0];
            assert_eq!(best.record.id, CaseId(4));
            assert_eq!(best.rank, 1);
            assert_eq!(best.similarity, 100.0);
            assert_eq!(result.mode, mode);
        }
    }

    #[test]
    fn test_evaluate_pages_with_configured_size() {
        let casebase = casebase();
        let query = Query::new(Features { gestation: 280.0, age: 28.0, height: 64.0, weight: 120.0, ..Default::default() });
        let ctx = casebase.context(query, WeightVector::uniform());

        let first = casebase.evaluate(&ctx).unwrap();
        assert_eq!(first.page.items.len(), 5);
        assert_eq!(first.page.total_pages, 2);
        assert_eq!(first.page.total_records, 7);
        assert_eq!(first.stats.candidates_count, 7);

        let second = casebase.evaluate(&ctx.clone().with_page(2)).unwrap();
        assert_eq!(second.page.items.len(), 2);
        assert_eq!(second.page.items[0].rank, 6);

        let wide = casebase.evaluate(&ctx.with_page_size(NonZeroUsize::new(10).unwrap())).unwrap();
        assert_eq!(wide.page.total_pages, 1);
    }

    #[test]
    fn test_evaluate_rejects_zero_weights() {
        let casebase = casebase();
        let ctx = casebase.context(Query::default(), WeightVector::default());
        assert!(matches!(casebase.evaluate(&ctx), Err(Error::InvalidWeights(_))));
    }

    #[test]
    fn test_evaluate_uses_configured_scales() {
        let dataset = DatasetLoader::default().load_str(SAMPLE).unwrap();
        let matched = Casebase::prepare(dataset.clone(), EngineConfig::default()).unwrap();
        let continuous = Casebase::prepare(
            dataset,
            EngineConfig {
                scales: AttributeScales::default().with(Attribute::Smoke, Scale::Continuous),
                ..Default::default()
            },
        )
        .unwrap();

        // Smoke is binary with max 1, so both policies produce the same
        // local similarity for it.
        let query = Query::new(Features { smoke: 1.0, ..Default::default() });
        let weights = WeightVector::default().with(Attribute::Smoke, 1.0);
        let a = matched.evaluate(&matched.context(query, weights.clone())).unwrap();
        let b = continuous.evaluate(&continuous.context(query, weights)).unwrap();
        assert_eq!(a.page.items, b.page.items);
    }
}
