//! Per-attribute comparison functions
//!
//! Similarity functions return a value in [0.0, 1.0] where 1.0 means identical.
//! Gap functions return a value in [0.0, 1.0] where 0.0 means identical.

/// Local similarity of two raw values along an attribute's maximum
///
/// # Arguments
/// * `query` - Query value
/// * `case` - Dataset value
/// * `max` - Largest value of the attribute observed in the dataset
///
/// # Returns
/// `1 - |query - case| / max`, clamped to [0.0, 1.0]. A zero maximum means
/// no variation, which is treated as a perfect match.
pub fn local_similarity(query: f64, case: f64, max: f64) -> f64 {
    if max == 0.0 {
        return 1.0;
    }
    (1.0 - (query - case).abs() / max.abs()).clamp(0.0, 1.0)
}

/// Exact match similarity
///
/// # Returns
/// 1.0 if both values are the same, 0.0 otherwise
pub fn match_similarity(query: f64, case: f64) -> f64 {
    if (query - case).abs() < f64::EPSILON { 1.0 } else { 0.0 }
}

/// Squared gap between two values already normalized to [0.0, 1.0]
#[inline]
pub fn squared_gap(query: f64, case: f64) -> f64 {
    let d = query - case;
    d * d
}

/// Squared gap for match-compared attributes: 0 when equal, 1 otherwise
#[inline]
pub fn match_gap(query: f64, case: f64) -> f64 {
    1.0 - match_similarity(query, case)
}

/// Display similarity of a distance relative to the largest distance in
/// the same result set, as a percentage
///
/// # Returns
/// `100 * (1 - distance / max_distance)`; 100 when `max_distance` is 0
pub fn relative_similarity(distance: f64, max_distance: f64) -> f64 {
    if max_distance <= 0.0 {
        return 100.0;
    }
    (100.0 * (1.0 - distance / max_distance)).clamp(0.0, 100.0)
}
