//! REST adapter for a prepared casebase.

pub mod rest;

pub use rest::{AppState, RestApi};
