//! NAVR thresholding engine
//!
//! Decides, per structure, whether the observed effect size is statistically
//! indistinguishable from the normative reference band and suppresses it in
//! the dataset store's current view without discarding the original value.
//! The threshold state is not tracked anywhere: a structure is thresholded
//! iff its current value is absent while the original is numeric.

use crate::dataset::DatasetStore;
use crate::navr::ReferenceSet;
use tracing::debug;

/// Critical value for one reference entry: a standard-error-scaled band
/// around the normative estimate. Larger reference cohorts tighten the
/// band, so observed effects must be proportionally larger to survive.
/// A zero population size yields an infinite band, which unconditionally
/// suppresses any finite observed value.
///
/// The raw (uncorrected) NAVR value drives the band; the corrected value
/// only surfaces in exports.
pub fn critical_value(navr: f64, population_size: u64) -> f64 {
    ((2.0 / (population_size as f64).sqrt()) * navr).abs()
}

/// Apply the threshold to every structure with both a numeric current
/// value and a reference entry. Structures without reference coverage are
/// never suppressed. Returns the number of structures suppressed by this
/// call.
pub fn apply(store: &mut DatasetStore, refs: &ReferenceSet) -> usize {
    let mut to_suppress = Vec::new();

    for (name, record) in store.current() {
        if record.effect_size.is_nan() {
            continue;
        }
        let Some(stat) = refs.get(name) else {
            continue;
        };
        let critical = critical_value(stat.navr, stat.population_size);
        if record.effect_size.abs() < critical {
            to_suppress.push(name.clone());
        }
    }

    let suppressed = store.apply_mask(&to_suppress);
    debug!(suppressed, "threshold applied");
    suppressed
}

/// Remove the threshold by restoring every current effect size from the
/// original view. Reference data is untouched; afterwards no structure is
/// thresholded by definition.
pub fn remove(store: &mut DatasetStore) {
    store.restore_original();
    debug!("threshold removed, original values restored");
}

/// Derived threshold state: true iff any structure has an absent current
/// value backed by a numeric original.
pub fn is_thresholded(store: &DatasetStore) -> bool {
    store.current().iter().any(|(name, record)| {
        record.effect_size.is_nan()
            && store
                .original()
                .get(name)
                .is_some_and(|o| !o.effect_size.is_nan())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::RawRow;
    use crate::navr::{Metric, ReferenceStat};
    use std::collections::HashMap;

    fn store_with(values: &[(&str, f64)]) -> DatasetStore {
        let rows: Vec<RawRow> = values
            .iter()
            .map(|(name, d)| {
                HashMap::from([
                    ("Structure".to_string(), name.to_string()),
                    ("Cohen_d".to_string(), d.to_string()),
                ])
            })
            .collect();
        let mut store = DatasetStore::new();
        store.ingest(&rows, None);
        store
    }

    fn refs_with(entries: &[(&str, f64, u64)]) -> ReferenceSet {
        ReferenceSet {
            entries: entries
                .iter()
                .map(|(name, navr, n)| {
                    (
                        name.to_string(),
                        ReferenceStat {
                            navr: *navr,
                            navr_corrected: *navr,
                            correction: 1.0,
                            population_size: *n,
                        },
                    )
                })
                .collect(),
            cortical_ok: true,
            subcortical_ok: true,
            atlas: "desikan".to_string(),
            metric: Metric::Thickness,
        }
    }

    #[test]
    fn test_critical_value_shrinks_with_population() {
        let loose = critical_value(0.5, 25); // 2/5 * 0.5 = 0.2
        let tight = critical_value(0.5, 400); // 2/20 * 0.5 = 0.05
        assert!((loose - 0.2).abs() < 1e-12);
        assert!((tight - 0.05).abs() < 1e-12);
        assert!(tight < loose);
    }

    #[test]
    fn test_critical_value_absolute() {
        assert!(critical_value(-0.5, 25) > 0.0);
    }

    #[test]
    fn test_critical_value_zero_population_is_infinite() {
        assert!(critical_value(0.5, 0).is_infinite());
    }

    #[test]
    fn test_apply_suppresses_below_band() {
        // band = 2/sqrt(100) * 0.5 = 0.1
        let mut store = store_with(&[("lh_insula", 0.05), ("rh_insula", 0.5)]);
        let refs = refs_with(&[("lh_insula", 0.5, 100), ("rh_insula", 0.5, 100)]);

        let suppressed = apply(&mut store, &refs);
        assert_eq!(suppressed, 1);
        assert!(store.current()["lh_insula"].effect_size.is_nan());
        assert_eq!(store.current()["rh_insula"].effect_size, 0.5);
    }

    #[test]
    fn test_apply_ignores_uncovered_structures() {
        let mut store = store_with(&[("lh_insula", 0.0001)]);
        let refs = refs_with(&[("rh_insula", 0.5, 100)]);
        assert_eq!(apply(&mut store, &refs), 0);
        assert_eq!(store.current()["lh_insula"].effect_size, 0.0001);
    }

    #[test]
    fn test_apply_zero_population_suppresses_unconditionally() {
        let mut store = store_with(&[("lh_insula", 1000.0)]);
        let refs = refs_with(&[("lh_insula", 0.5, 0)]);
        assert_eq!(apply(&mut store, &refs), 1);
        assert!(store.current()["lh_insula"].effect_size.is_nan());
    }

    #[test]
    fn test_apply_monotonic_bound() {
        let mut store = store_with(&[
            ("lh_insula", 0.01),
            ("rh_insula", 0.02),
            ("lh_cuneus", 5.0),
        ]);
        let refs = refs_with(&[("lh_insula", 0.5, 100), ("rh_insula", 0.5, 100)]);
        let suppressed = apply(&mut store, &refs);
        // At most the number of structures with both a value and coverage
        assert!(suppressed <= 2);
    }

    #[test]
    fn test_apply_is_idempotent_from_caller_view() {
        let mut store = store_with(&[("lh_insula", 0.05)]);
        let refs = refs_with(&[("lh_insula", 0.5, 100)]);
        assert_eq!(apply(&mut store, &refs), 1);
        // Already suppressed; nothing left to change
        assert_eq!(apply(&mut store, &refs), 0);
    }

    #[test]
    fn test_round_trip_restores_values() {
        let mut store = store_with(&[("lh_insula", 0.05), ("rh_insula", 0.5)]);
        let refs = refs_with(&[("lh_insula", 0.5, 100), ("rh_insula", 0.5, 100)]);

        apply(&mut store, &refs);
        assert!(is_thresholded(&store));
        remove(&mut store);
        assert!(!is_thresholded(&store));
        assert_eq!(store.current()["lh_insula"].effect_size, 0.05);
        assert_eq!(store.current()["rh_insula"].effect_size, 0.5);
    }

    #[test]
    fn test_is_thresholded_ignores_source_missing() {
        // A value absent in the source is not "thresholded"
        let rows = vec![HashMap::from([
            ("Structure".to_string(), "lh_insula".to_string()),
            ("Cohen_d".to_string(), "".to_string()),
        ])];
        let mut store = DatasetStore::new();
        store.ingest(&rows, None);
        assert!(!is_thresholded(&store));
    }
}
