//! Owned analysis session
//!
//! Ties the dataset store, the loaded reference set and the active
//! atlas/metric/view together in one explicit context passed to every
//! component, replacing module-level globals. Reference stats are
//! atlas/metric-specific: any change of dataset, atlas or metric discards
//! them, and a reference load completing after such a change is rejected
//! by its tag instead of being installed.

use crate::atlas::{self, Atlas};
use crate::dataset::{DatasetStore, IngestCounts, RawRow, SnapshotRow};
use crate::export::ExportContext;
use crate::navr::{self, Metric, ReferenceSet};
use crate::stats::{self, DatasetStatistics};
use crate::threshold;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, warn};

/// Typed caller-facing failures; everything else in the pipeline degrades
/// locally (row skips, partial reference loads) instead of erroring.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("unknown atlas: {0}")]
    UnknownAtlas(String),
    #[error("no dataset loaded; ingest a CSV first")]
    NoData,
    #[error("no metric selected; a metric is required to locate reference files")]
    NoMetric,
    #[error("NAVR reference data not loaded; load references before thresholding")]
    ReferencesNotLoaded,
}

/// Outcome of a threshold toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThresholdTransition {
    /// Threshold applied, suppressing this many structures
    Applied(usize),
    /// Threshold removed, original values restored
    Removed,
}

/// One dataset plus its thresholding context
#[derive(Debug)]
pub struct Session {
    store: DatasetStore,
    references: Option<ReferenceSet>,
    atlas_id: String,
    metric: Option<Metric>,
    view: String,
}

impl Session {
    pub fn new(atlas_id: &str) -> Result<Self, SessionError> {
        if atlas::get(atlas_id).is_none() {
            return Err(SessionError::UnknownAtlas(atlas_id.to_string()));
        }
        Ok(Self {
            store: DatasetStore::new(),
            references: None,
            atlas_id: atlas_id.to_string(),
            metric: None,
            view: "cortical".to_string(),
        })
    }

    pub fn atlas_id(&self) -> &str {
        &self.atlas_id
    }

    pub fn atlas(&self) -> Option<&'static Atlas> {
        atlas::get(&self.atlas_id)
    }

    pub fn metric(&self) -> Option<Metric> {
        self.metric
    }

    pub fn store(&self) -> &DatasetStore {
        &self.store
    }

    pub fn references(&self) -> Option<&ReferenceSet> {
        self.references.as_ref()
    }

    /// Replace the dataset with the given rows.
    ///
    /// Any previously loaded references no longer apply and are dropped.
    pub fn ingest_rows(&mut self, rows: &[RawRow]) -> IngestCounts {
        self.invalidate_references("dataset replaced");
        self.store.ingest(rows, self.atlas())
    }

    /// Switch the active atlas, discarding loaded references.
    pub fn set_atlas(&mut self, atlas_id: &str) -> Result<(), SessionError> {
        if atlas::get(atlas_id).is_none() {
            return Err(SessionError::UnknownAtlas(atlas_id.to_string()));
        }
        if atlas_id != self.atlas_id {
            self.atlas_id = atlas_id.to_string();
            self.invalidate_references("atlas changed");
        }
        Ok(())
    }

    /// Switch the active metric, discarding loaded references.
    pub fn set_metric(&mut self, metric: Metric) {
        if self.metric != Some(metric) {
            self.metric = Some(metric);
            self.invalidate_references("metric changed");
        }
    }

    pub fn set_view(&mut self, view: &str) {
        self.view = view.to_string();
    }

    /// Load the NAVR reference files for the active atlas/metric and
    /// install the result.
    ///
    /// Requires a loaded dataset and a selected metric. A partially
    /// loaded set (one of the two files) is still installed; the caller
    /// can inspect `cortical_ok`/`subcortical_ok` on the result.
    pub async fn load_references(
        &mut self,
        data_dir: &Path,
    ) -> Result<&ReferenceSet, SessionError> {
        if self.store.is_empty() {
            return Err(SessionError::NoData);
        }
        let metric = self.metric.ok_or(SessionError::NoMetric)?;

        let paths = navr::reference_paths(data_dir, &self.atlas_id, metric);
        let set = navr::load_references(&paths, &self.atlas_id, metric).await;
        self.install_references(set);
        self.references.as_ref().ok_or(SessionError::ReferencesNotLoaded)
    }

    /// Install a loaded reference set, rejecting one whose atlas/metric tag
    /// no longer matches the session (a fetch that raced a context change).
    /// Returns true when the set was installed.
    pub fn install_references(&mut self, set: ReferenceSet) -> bool {
        if set.atlas != self.atlas_id || Some(set.metric) != self.metric {
            warn!(
                loaded_atlas = %set.atlas,
                active_atlas = %self.atlas_id,
                "discarding stale reference load"
            );
            return false;
        }
        if !set.has_any() {
            debug!("reference load produced no usable files");
            self.references = None;
            return false;
        }
        debug!(entries = set.len(), "references installed");
        self.references = Some(set);
        true
    }

    /// Derived threshold state of the current dataset
    pub fn is_thresholded(&self) -> bool {
        threshold::is_thresholded(&self.store)
    }

    /// Apply or remove the threshold depending on the derived state.
    pub fn toggle_threshold(&mut self) -> Result<ThresholdTransition, SessionError> {
        if self.store.is_empty() {
            return Err(SessionError::NoData);
        }
        if self.is_thresholded() {
            threshold::remove(&mut self.store);
            return Ok(ThresholdTransition::Removed);
        }
        let refs = self
            .references
            .as_ref()
            .ok_or(SessionError::ReferencesNotLoaded)?;
        let suppressed = threshold::apply(&mut self.store, refs);
        Ok(ThresholdTransition::Applied(suppressed))
    }

    pub fn statistics(&self) -> DatasetStatistics {
        stats::compute(&self.store)
    }

    pub fn snapshot(&self) -> Vec<SnapshotRow> {
        self.store.snapshot_for_export()
    }

    pub fn export_context(&self) -> ExportContext {
        ExportContext {
            is_thresholded: self.is_thresholded(),
            navr_data_loaded: self.references.is_some(),
            atlas: self.atlas_id.clone(),
            view: self.view.clone(),
        }
    }

    fn invalidate_references(&mut self, reason: &str) {
        if self.references.take().is_some() {
            debug!(reason, "reference data discarded");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navr::ReferenceStat;
    use std::collections::HashMap;

    fn rows(values: &[(&str, f64)]) -> Vec<RawRow> {
        values
            .iter()
            .map(|(name, d)| {
                HashMap::from([
                    ("Structure".to_string(), name.to_string()),
                    ("Cohen_d".to_string(), d.to_string()),
                ])
            })
            .collect()
    }

    fn reference_set(atlas: &str, metric: Metric, entries: &[(&str, f64, u64)]) -> ReferenceSet {
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
            subcortical_ok: false,
            atlas: atlas.to_string(),
            metric,
        }
    }

    #[test]
    fn test_new_rejects_unknown_atlas() {
        assert_eq!(
            Session::new("nope").unwrap_err(),
            SessionError::UnknownAtlas("nope".to_string())
        );
    }

    #[test]
    fn test_toggle_without_data() {
        let mut session = Session::new("desikan").unwrap();
        assert_eq!(session.toggle_threshold().unwrap_err(), SessionError::NoData);
    }

    #[test]
    fn test_toggle_without_references() {
        let mut session = Session::new("desikan").unwrap();
        session.ingest_rows(&rows(&[("lh_insula", 0.5)]));
        assert_eq!(
            session.toggle_threshold().unwrap_err(),
            SessionError::ReferencesNotLoaded
        );
        // Store left unchanged by the rejected toggle
        assert_eq!(session.store().current()["lh_insula"].effect_size, 0.5);
    }

    #[test]
    fn test_toggle_applies_then_removes() {
        let mut session = Session::new("desikan").unwrap();
        session.set_metric(Metric::Thickness);
        session.ingest_rows(&rows(&[("lh_insula", 0.05), ("rh_insula", 0.9)]));
        session.install_references(reference_set(
            "desikan",
            Metric::Thickness,
            &[("lh_insula", 0.5, 100), ("rh_insula", 0.5, 100)],
        ));

        assert_eq!(
            session.toggle_threshold().unwrap(),
            ThresholdTransition::Applied(1)
        );
        assert!(session.is_thresholded());
        assert_eq!(
            session.toggle_threshold().unwrap(),
            ThresholdTransition::Removed
        );
        assert!(!session.is_thresholded());
    }

    #[test]
    fn test_ingest_discards_references() {
        let mut session = Session::new("desikan").unwrap();
        session.set_metric(Metric::Thickness);
        session.ingest_rows(&rows(&[("lh_insula", 0.5)]));
        session.install_references(reference_set(
            "desikan",
            Metric::Thickness,
            &[("lh_insula", 0.5, 100)],
        ));
        assert!(session.references().is_some());

        session.ingest_rows(&rows(&[("rh_insula", 0.3)]));
        assert!(session.references().is_none());
    }

    #[test]
    fn test_stale_reference_load_discarded_on_atlas_change() {
        let mut session = Session::new("desikan").unwrap();
        session.set_metric(Metric::Thickness);
        session.ingest_rows(&rows(&[("lh_insula", 0.5)]));

        // Fetch tagged with the old atlas completes after a switch
        let stale = reference_set("desikan", Metric::Thickness, &[("lh_insula", 0.5, 100)]);
        session.set_atlas("dkt").unwrap();
        assert!(!session.install_references(stale));
        assert!(session.references().is_none());
    }

    #[test]
    fn test_stale_reference_load_discarded_on_metric_change() {
        let mut session = Session::new("desikan").unwrap();
        session.set_metric(Metric::Thickness);
        session.ingest_rows(&rows(&[("lh_insula", 0.5)]));

        let stale = reference_set("desikan", Metric::Thickness, &[("lh_insula", 0.5, 100)]);
        session.set_metric(Metric::Area);
        assert!(!session.install_references(stale));
    }

    #[test]
    fn test_install_rejects_empty_load() {
        let mut session = Session::new("desikan").unwrap();
        session.set_metric(Metric::Volume);
        session.ingest_rows(&rows(&[("lh_insula", 0.5)]));
        let mut set = reference_set("desikan", Metric::Volume, &[]);
        set.cortical_ok = false;
        assert!(!session.install_references(set));
    }

    #[tokio::test]
    async fn test_load_references_requires_data_and_metric() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = Session::new("desikan").unwrap();
        assert_eq!(
            session.load_references(dir.path()).await.unwrap_err(),
            SessionError::NoData
        );
        session.ingest_rows(&rows(&[("lh_insula", 0.5)]));
        assert_eq!(
            session.load_references(dir.path()).await.unwrap_err(),
            SessionError::NoMetric
        );
    }

    #[test]
    fn test_export_context_reflects_state() {
        let mut session = Session::new("desikan").unwrap();
        session.ingest_rows(&rows(&[("lh_insula", 0.5)]));
        let ctx = session.export_context();
        assert_eq!(ctx.atlas, "desikan");
        assert_eq!(ctx.view, "cortical");
        assert!(!ctx.is_thresholded);
        assert!(!ctx.navr_data_loaded);
    }
}
