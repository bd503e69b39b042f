//! # casebase Core
//!
//! Core library for the casebase retrieval tool.
//!
//! This crate provides the data side of case-based retrieval:
//!
//! - [`Record`] - An immutable historical case with its scored [`Features`]
//! - [`Query`] - A user-described case in canonical units
//! - [`Attribute`] - The closed set of scored attributes
//! - [`DatasetLoader`] - Parses tabular case data, dropping incomplete rows
//! - [`units`] - Metric/imperial conversions used at the edges
//!
//! ## Example
//!
//! ```rust
//! use casebase_core::{DatasetLoader, Attribute};
//!
//! let csv = "case,bwt,gestation,parity,age,height,weight,smoke\n\
//!            1,120,284,0,27,62,100,0\n\
//!            2,113,282,0,33,64,135,0\n\
//!            3,128,279,0,28,64,,1\n";
//!
//! let dataset = DatasetLoader::default().load_str(csv).unwrap();
//! assert_eq!(dataset.len(), 2);
//! assert_eq!(dataset.skipped().len(), 1);
//! assert_eq!(dataset.records()[0].features.get(Attribute::Gestation), 284.0);
//! ```

pub mod error;
pub mod record;
pub mod units;
pub mod dataset;

pub use error::{Error, Result};
pub use record::{Attribute, CaseId, Features, Query, Record};
pub use units::MetricQuery;
pub use dataset::{Dataset, DatasetLoader, SkipReason, SkippedRow, DEFAULT_MAX_ROWS, REQUIRED_COLUMNS};
