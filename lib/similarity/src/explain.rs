//! Explainability for ranked cases
//!
//! Output structures that show how each similarity was computed, with
//! per-attribute contributions, plus summary statistics and non-fatal
//! warnings for a search.

use crate::casebase::SearchResult;
use crate::engine::ScoredRecord;
use crate::schema::SimilarityMode;
use casebase_core::{Attribute, CaseId};
use serde::Serialize;
use std::collections::BTreeMap;

/// Number of page links offered around the current page
pub const PAGE_LINKS: usize = 5;

/// Non-fatal condition attached to a search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "kind", content = "attribute", rename_all = "snake_case")]
pub enum Warning {
    /// The attribute has zero range across the dataset, so it adds the same
    /// term to every case and cannot change the ranking
    #[error("attribute '{0}' has the same value in every case")]
    DegenerateAttribute(Attribute),
}

/// A ranked case in display units, with its score breakdown
#[derive(Debug, Clone, Serialize)]
pub struct ExplainedResult {
    pub id: CaseId,
    pub rank: usize,
    /// Similarity percentage, rounded to 2 decimals
    pub similarity: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
    pub gestation: f64,
    pub parity: f64,
    pub age: f64,
    pub height_cm: f64,
    pub weight_kg: f64,
    pub smoke: bool,
    pub birth_weight_g: f64,
    /// Per-attribute score contributions (already weighted)
    pub explain: BTreeMap<Attribute, f64>,
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

impl ExplainedResult {
    /// Create an explained result from a scored case
    pub fn from_scored(scored: &ScoredRecord) -> Self {
        let record = &scored.record;
        Self {
            id: record.id,
            rank: scored.rank,
            similarity: round_to(scored.similarity, 2),
            distance: scored.distance,
            gestation: record.features.gestation,
            parity: record.features.parity,
            age: record.features.age,
            height_cm: round_to(record.height_cm(), 1),
            weight_kg: round_to(record.weight_kg(), 1),
            smoke: record.is_smoker(),
            birth_weight_g: record.birth_weight,
            explain: scored.contributions.clone(),
        }
    }

    pub fn from_scored_list(scored: &[ScoredRecord]) -> Vec<Self> {
        scored.iter().map(Self::from_scored).collect()
    }
}

/// Response structure for a similarity search
#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    pub mode: SimilarityMode,
    pub result: Vec<ExplainedResult>,
    pub page: usize,
    pub requested_page: usize,
    pub page_size: usize,
    pub total_pages: usize,
    pub total_records: usize,
    /// Page numbers to offer for navigation
    pub pages: Vec<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<SimilarityStats>,
    pub warnings: Vec<Warning>,
}

impl SearchResponse {
    pub fn from_result(result: &SearchResult) -> Self {
        let page = &result.page;
        Self {
            mode: result.mode,
            result: ExplainedResult::from_scored_list(&page.items),
            page: page.page_number,
            requested_page: page.requested_page,
            page_size: page.page_size,
            total_pages: page.total_pages,
            total_records: page.total_records,
            pages: page.links(PAGE_LINKS).collect(),
            stats: Some(result.stats.clone()),
            warnings: result.warnings.clone(),
        }
    }

    /// Explicit empty result, for a casebase with no usable cases
    pub fn empty(mode: SimilarityMode, requested_page: usize, page_size: usize) -> Self {
        Self {
            mode,
            result: Vec::new(),
            page: 1,
            requested_page,
            page_size,
            total_pages: 0,
            total_records: 0,
            pages: Vec::new(),
            stats: None,
            warnings: Vec::new(),
        }
    }
}

/// Summary statistics for a similarity search
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimilarityStats {
    /// Number of cases considered
    pub candidates_count: usize,
    /// Number of cases ranked
    pub results_count: usize,
    /// Average similarity percentage
    pub avg_score: f64,
    /// Similarity percentage of the best case
    pub best_score: f64,
    /// Attribute that contributed most to the best case
    pub top_contributing_attribute: Option<Attribute>,
}

impl SimilarityStats {
    /// Compute stats from ranked results (best first)
    pub fn compute(results: &[ScoredRecord], candidates_count: usize) -> Self {
        let Some(best) = results.first() else {
            return Self {
                candidates_count,
                results_count: 0,
                avg_score: 0.0,
                best_score: 0.0,
                top_contributing_attribute: None,
            };
        };

        let avg_score = results.iter().map(|r| r.similarity).sum::<f64>() / results.len() as f64;

        // In distance mode the largest term is the attribute pulling the best
        // case away from the query; in similarity mode it pulls it closer.
        let top_contributing_attribute = best
            .contributions
            .iter()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(attr, _)| *attr);

        Self {
            candidates_count,
            results_count: results.len(),
            avg_score,
            best_score: best.similarity,
            top_contributing_attribute,
        }
    }
}
