//! Unit conversions between the metric form input and the dataset's
//! canonical units (inches, pounds, ounces).

use serde::{Deserialize, Serialize};
use crate::record::{Features, Query};

pub const CM_PER_INCH: f64 = 2.54;
pub const KG_PER_POUND: f64 = 0.453592;
pub const GRAMS_PER_OUNCE: f64 = 28.3495;

#[inline]
pub fn cm_to_in(cm: f64) -> f64 {
    cm / CM_PER_INCH
}

#[inline]
pub fn in_to_cm(inches: f64) -> f64 {
    inches * CM_PER_INCH
}

#[inline]
pub fn kg_to_lb(kg: f64) -> f64 {
    kg / KG_PER_POUND
}

#[inline]
pub fn lb_to_kg(lbs: f64) -> f64 {
    lbs * KG_PER_POUND
}

#[inline]
pub fn oz_to_g(oz: f64) -> f64 {
    oz * GRAMS_PER_OUNCE
}

/// A query as entered by a user: height in centimetres, weight in kilograms
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricQuery {
    pub gestation: f64,
    pub parity: f64,
    pub age: f64,
    pub height_cm: f64,
    pub weight_kg: f64,
    pub smoke: f64,
}

impl MetricQuery {
    /// Convert to a query in the dataset's canonical units
    pub fn to_query(&self) -> Query {
        Query::new(Features {
            gestation: self.gestation,
            parity: self.parity,
            age: self.age,
            height: cm_to_in(self.height_cm),
            weight: kg_to_lb(self.weight_kg),
            smoke: self.smoke,
        })
    }
}

impl From<MetricQuery> for Query {
    fn from(metric: MetricQuery) -> Self {
        metric.to_query()
    }
}
