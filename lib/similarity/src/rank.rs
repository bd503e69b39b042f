//! Ranking and pagination of scored cases

use crate::engine::ScoredRecord;
use crate::schema::SimilarityMode;
use ordered_float::OrderedFloat;
use serde::Serialize;
use std::cmp::Ordering;
use std::num::NonZeroUsize;
use std::ops::RangeInclusive;

/// Sort scored cases into a total order and assign 1-based ranks
///
/// Local mode sorts by similarity descending, Euclidean mode by distance
/// ascending. Equal scores fall back to the case id, ascending.
pub fn rank(mut scored: Vec<ScoredRecord>, mode: SimilarityMode) -> Vec<ScoredRecord> {
    scored.sort_by(|a, b| compare(a, b, mode));
    for (i, item) in scored.iter_mut().enumerate() {
        item.rank = i + 1;
    }
    scored
}

fn compare(a: &ScoredRecord, b: &ScoredRecord, mode: SimilarityMode) -> Ordering {
    let by_score = match mode {
        SimilarityMode::WeightedLocalSimilarity => {
            OrderedFloat(b.similarity).cmp(&OrderedFloat(a.similarity))
        }
        SimilarityMode::WeightedEuclideanDistance => {
            let da = a.distance.unwrap_or(f64::INFINITY);
            let db = b.distance.unwrap_or(f64::INFINITY);
            OrderedFloat(da).cmp(&OrderedFloat(db))
        }
    };
    by_score.then_with(|| a.record.id.cmp(&b.record.id))
}

/// One page of ranked results
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page {
    pub items: Vec<ScoredRecord>,
    /// Page actually served, after clamping
    pub page_number: usize,
    /// Page the caller asked for
    pub requested_page: usize,
    pub page_size: usize,
    pub total_pages: usize,
    pub total_records: usize,
}

impl Page {
    /// The requested page was out of range and got clamped
    pub fn clamped(&self) -> bool {
        self.page_number != self.requested_page
    }

    pub fn has_previous(&self) -> bool {
        self.page_number > 1
    }

    pub fn has_next(&self) -> bool {
        self.page_number < self.total_pages
    }

    /// Page numbers to offer for navigation, at most `max_links` of them,
    /// starting `max_links / 2` before the current page. Empty when there
    /// are no pages.
    pub fn links(&self, max_links: usize) -> RangeInclusive<usize> {
        if self.total_pages == 0 || max_links == 0 {
            return 1..=0;
        }
        let start = self.page_number.saturating_sub(max_links / 2).max(1);
        let end = self.total_pages.min(start + max_links - 1);
        start..=end
    }
}

/// Slice out 1-based page `page_number` of `results`
///
/// The page number is clamped to `[1, total_pages]`; an empty result set
/// yields an empty page 1 with `total_pages == 0`.
pub fn page(results: &[ScoredRecord], page_number: usize, page_size: NonZeroUsize) -> Page {
    let size = page_size.get();
    let total_records = results.len();
    let total_pages = total_records.div_ceil(size);
    let current = page_number.clamp(1, total_pages.max(1));

    let start = (current - 1) * size;
    let items = results.iter().skip(start).take(size).cloned().collect();

    Page {
        items,
        page_number: current,
        requested_page: page_number,
        page_size: size,
        total_pages,
        total_records,
    }
}
