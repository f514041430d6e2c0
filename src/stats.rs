//! Dataset statistics
//!
//! Aggregates valid/absent counts and the mean of valid effect sizes over
//! the store's current view, and computes the padded value range used by
//! downstream color mapping.

use crate::dataset::DatasetStore;

/// Aggregate statistics over the current (possibly thresholded) view
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DatasetStatistics {
    /// Structures with a numeric current effect size
    pub valid_count: usize,
    /// Structures with an absent (NaN) current effect size
    pub suppressed_count: usize,
    pub total_count: usize,
    /// Arithmetic mean over valid values; 0.0 when there are none
    pub mean_valid: f64,
}

/// Compute counts and mean over the store's current view.
pub fn compute(store: &DatasetStore) -> DatasetStatistics {
    let mut valid_count = 0;
    let mut sum = 0.0;
    let total_count = store.current().len();

    for record in store.current().values() {
        if !record.effect_size.is_nan() {
            valid_count += 1;
            sum += record.effect_size;
        }
    }

    DatasetStatistics {
        valid_count,
        suppressed_count: total_count - valid_count,
        total_count,
        mean_valid: if valid_count > 0 {
            sum / valid_count as f64
        } else {
            0.0
        },
    }
}

/// Padded value range over valid current effect sizes.
///
/// Returns the min/max extended by 10% of the span on each side. An empty
/// valid set or a zero-width span yields `None`: re-ranging is rejected
/// with no change rather than collapsing the scale.
pub fn auto_range(store: &DatasetStore) -> Option<(f64, f64)> {
    let valid: Vec<f64> = store
        .current()
        .values()
        .map(|r| r.effect_size)
        .filter(|v| !v.is_nan())
        .collect();

    let min = valid.iter().copied().fold(f64::INFINITY, f64::min);
    let max = valid.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    if valid.is_empty() || min == max {
        return None;
    }

    let padding = (max - min) * 0.1;
    Some((min - padding, max + padding))
}
