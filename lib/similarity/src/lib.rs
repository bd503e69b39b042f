//! # casebase Similarity
//!
//! A weighted similarity engine for case-based retrieval over tabular cases.
//!
//! ## Features
//!
//! - **Normalizer**: Per-attribute min-max parameters computed once from the dataset
//! - **Two aggregation modes**: Weighted local similarity or weighted Euclidean distance
//! - **Per-attribute scale policy**: Continuous comparison or exact match
//! - **Deterministic ranking**: Ties broken by case id, 1-based clamped pagination
//! - **Explainability**: Per-attribute contribution breakdown for every case
//!
//! ## Example
//!
//! ```rust
//! use casebase_core::{DatasetLoader, MetricQuery};
//! use casebase_similarity::{Casebase, EngineConfig, SimilarityMode, WeightVector};
//!
//! let csv = "case,bwt,gestation,parity,age,height,weight,smoke\n\
//!            1,120,284,0,27,62,100,0\n\
//!            2,113,282,1,33,64,135,0\n\
//!            3,128,279,0,28,64,115,1\n";
//! let dataset = DatasetLoader::default().load_str(csv).unwrap();
//!
//! // Prepare once
//! let casebase = Casebase::prepare(dataset, EngineConfig::default()).unwrap();
//!
//! // Evaluate per request
//! let query = MetricQuery {
//!     gestation: 280.0,
//!     parity: 0.0,
//!     age: 28.0,
//!     height_cm: 162.5,
//!     weight_kg: 52.0,
//!     smoke: 1.0,
//! }
//! .to_query();
//! let ctx = casebase
//!     .context(query, WeightVector::uniform())
//!     .with_mode(SimilarityMode::WeightedEuclideanDistance);
//! let result = casebase.evaluate(&ctx).unwrap();
//!
//! assert_eq!(result.page.items[0].record.id.0, 3);
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │   Dataset   │────>│ Normalizer  │────>│  Casebase   │  prepare (once)
//! │  (records)  │     │ (min, max)  │     │ (immutable) │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!                                                │
//!  SearchContext ─────────────────────────────>  │         evaluate (per request)
//!                                                v
//!                     ┌─────────────┐     ┌─────────────┐
//!                     │   Ranker    │<────│   Engine    │
//!                     │ (sort, page)│     │  (scores)   │
//!                     └─────────────┘     └─────────────┘
//!                            │
//!                     ┌─────────────┐
//!                     │  Explain    │
//!                     │  (results)  │
//!                     └─────────────┘
//! ```

pub mod schema;
pub mod normalize;
pub mod distance;
pub mod engine;
pub mod rank;
pub mod casebase;
pub mod explain;

// Re-export main types for convenience
pub use schema::{
    AttributeScales,
    EngineConfig,
    Scale,
    SimilarityMode,
    WeightVector,
};
pub use normalize::{normalize, AttributeRange, NormalizationParams};
pub use engine::{Score, ScoredRecord, SimilarityEngine};
pub use rank::{page, rank, Page};
pub use casebase::{Casebase, SearchContext, SearchResult};
pub use explain::{ExplainedResult, SearchResponse, SimilarityStats, Warning, PAGE_LINKS};
