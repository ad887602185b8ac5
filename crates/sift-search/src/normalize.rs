//! Per-signal score rescaling into a bounded boost range.
//!
//! Each backend scores on its own scale (partial similarity 0–100, cosine
//! 0–1). Before fusion every list is rescaled so that its best item maps to
//! `boost` and the rest scale linearly below it.

/// Rescale `raw` into `[0, boost]` relative to the list maximum.
///
/// - Empty input is returned unchanged.
/// - When the maximum is 0 every item gets `boost * 0.5`, so zero-signal
///   items still participate in fusion.
/// - Non-negative inputs never produce negative outputs.
///
/// ```
/// use sift_search::normalize::rescale;
///
/// assert_eq!(rescale(&[50.0, 100.0], 40.0), vec![20.0, 40.0]);
/// assert_eq!(rescale(&[0.0, 0.0], 40.0), vec![20.0, 20.0]);
/// ```
#[must_use]
pub fn rescale(raw: &[f64], boost: f64) -> Vec<f64> {
    let max = raw.iter().copied().fold(0.0_f64, f64::max);
    if max <= 0.0 {
        return vec![boost * 0.5; raw.len()];
    }
    raw.iter().map(|score| (score / max) * boost).collect()
}
