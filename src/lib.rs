//! # casebase
//!
//! Case-based retrieval over a birth-weight casebase.
//!
//! Given a user-described case (a mother/newborn profile), casebase ranks the
//! historical cases of a fixed dataset by weighted similarity and returns the
//! closest matches, paginated and explained per attribute.
//!
//! ## Quick Start
//!
//! ### As a Server
//!
//! ```bash
//! casebase --dataset data/babies.csv serve --port 8080
//! ```
//!
//! ### From the Command Line
//!
//! ```bash
//! casebase search --gestation 280 --parity 0 --age 27 \
//!     --height-cm 162 --weight-kg 55 --smoke 0 --weight gestation=2
//! ```
//!
//! ### As a Library
//!
//! ```rust
//! use casebase::prelude::*;
//!
//! let records = vec![
//!     Record::new(1, Features { gestation: 280.0, parity: 0.0, age: 30.0, height: 65.0, weight: 120.0, smoke: 0.0 }, 3402.0),
//!     Record::new(2, Features { gestation: 260.0, parity: 1.0, age: 22.0, height: 60.0, weight: 100.0, smoke: 1.0 }, 2892.0),
//! ];
//! let casebase = Casebase::prepare(Dataset::from_records(records), EngineConfig::default()).unwrap();
//!
//! let query = Query::new(Features { gestation: 280.0, parity: 0.0, age: 30.0, height: 65.0, weight: 120.0, smoke: 0.0 });
//! let result = casebase.evaluate(&casebase.context(query, WeightVector::uniform())).unwrap();
//!
//! assert_eq!(result.page.items[0].record.id, CaseId(1));
//! assert_eq!(result.page.items[0].similarity, 100.0);
//! ```
//!
//! ## Crate Structure
//!
//! - `casebase-core` - Records, attributes, unit conversions, dataset loading
//! - `casebase-similarity` - Normalizer, similarity engine, ranking, explanations
//! - `casebase-api` - REST API

pub mod config;

// Re-export core types
pub use casebase_core::{
    Attribute, CaseId, Features, Query, Record,
    Dataset, DatasetLoader, MetricQuery,
    Error, Result,
};

// Re-export the engine
pub use casebase_similarity::{
    Casebase, SearchContext, SearchResult, SearchResponse,
    EngineConfig, SimilarityMode, Scale, AttributeScales, WeightVector,
    NormalizationParams, SimilarityEngine, ScoredRecord, Page,
};

// Re-export API
pub use casebase_api::{AppState, RestApi};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        Attribute, CaseId, Features, Query, Record,
        Dataset, DatasetLoader, MetricQuery,
        Error, Result,
        Casebase, SearchContext, SearchResult, SearchResponse,
        EngineConfig, SimilarityMode, Scale, AttributeScales, WeightVector,
        AppState, RestApi,
    };
}

/// Unit conversions between metric input and canonical dataset units
pub mod units {
    pub use casebase_core::units::{cm_to_in, in_to_cm, kg_to_lb, lb_to_kg, oz_to_g};
}
