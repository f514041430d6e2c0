//! Dataset store for per-structure effect sizes
//!
//! Holds the "current" (possibly thresholded) and "original" (pristine)
//! views of the uploaded dataset. The store is the single source of truth
//! read by the thresholding engine, the statistics module and the
//! exporters. Absent effect sizes are represented as `f64::NAN`; the
//! original view only ever contains NaN when the input itself was empty.

use crate::atlas::Atlas;
use crate::normalize::{self, Hemisphere, StructureType};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Effect-size column aliases, in priority order (first present wins)
pub const EFFECT_COLUMNS: [&str; 4] = [
    "Cohen_d",
    "d_icv",
    "Cohen_d_thresholded",
    "d_icv_thresholded",
];

/// One structure present in the uploaded dataset
#[derive(Debug, Clone)]
pub struct StructureRecord {
    /// Canonical identifier in the atlas vocabulary
    pub name: String,
    /// Raw identifier as supplied in the CSV, retained for display/export
    pub original_name: String,
    /// Cohen's d; NaN marks an absent value
    pub effect_size: f64,
    pub hemisphere: Hemisphere,
    pub structure_type: StructureType,
    pub population_size: Option<u64>,
    pub n_patients: Option<u64>,
    pub n_controls: Option<u64>,
}

/// A raw header-keyed row handed over by the CSV parsing collaborator
pub type RawRow = HashMap<String, String>;

/// Row acceptance counts returned by [`DatasetStore::ingest`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IngestCounts {
    pub accepted: usize,
    pub skipped: usize,
}

/// Snapshot row combining the current and original views of one structure
#[derive(Debug, Clone)]
pub struct SnapshotRow {
    pub structure: String,
    pub effect_original: f64,
    pub effect_current: f64,
    pub hemisphere: Hemisphere,
    pub structure_type: StructureType,
    /// True iff the current value is absent while the original was numeric,
    /// i.e. the value was suppressed by thresholding rather than missing
    /// from the source data.
    pub was_suppressed: bool,
    pub original_name: String,
}

/// Owned current/original dataset state
#[derive(Debug, Default)]
pub struct DatasetStore {
    current: HashMap<String, StructureRecord>,
    original: HashMap<String, StructureRecord>,
}

impl DatasetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the store contents with the given rows.
    ///
    /// Rows missing a structure identifier or every recognized effect-size
    /// column are logged and skipped; per-row failures are never fatal.
    /// Both the current and original maps receive independent copies.
    pub fn ingest(&mut self, rows: &[RawRow], atlas: Option<&Atlas>) -> IngestCounts {
        self.current.clear();
        self.original.clear();

        let mut counts = IngestCounts::default();

        for (index, row) in rows.iter().enumerate() {
            let Some(raw_name) = row.get("Structure").map(|s| s.trim()).filter(|s| !s.is_empty())
            else {
                debug!(row = index + 1, "missing Structure field, skipping");
                counts.skipped += 1;
                continue;
            };

            let Some(effect_raw) = EFFECT_COLUMNS.iter().find_map(|col| row.get(*col)) else {
                debug!(row = index + 1, "no effect-size column found, skipping");
                counts.skipped += 1;
                continue;
            };

            // Present-but-unparseable values become NaN rather than
            // rejecting the row; the structure still exists in the dataset.
            let effect_size = effect_raw.trim().parse::<f64>().unwrap_or(f64::NAN);

            let canonical = normalize::normalize(raw_name);
            let record = StructureRecord {
                name: canonical.clone(),
                original_name: raw_name.to_string(),
                effect_size,
                hemisphere: normalize::hemisphere(&canonical),
                structure_type: normalize::structure_type(&canonical, atlas),
                population_size: parse_count(row.get("population_size")),
                n_patients: parse_count(row.get("n_patients")),
                n_controls: parse_count(row.get("n_controls")),
            };

            self.original.insert(canonical.clone(), record.clone());
            self.current.insert(canonical, record);
            counts.accepted += 1;
        }

        debug!(
            accepted = counts.accepted,
            skipped = counts.skipped,
            "dataset ingest complete"
        );
        counts
    }

    /// Restore every current effect size from the original view.
    ///
    /// All other fields are untouched. Idempotent.
    pub fn restore_original(&mut self) {
        for (name, original) in &self.original {
            if let Some(current) = self.current.get_mut(name) {
                current.effect_size = original.effect_size;
            }
        }
    }

    /// Set the current effect size to absent for each given key.
    ///
    /// Returns the number of entries actually changed; keys that are
    /// unknown or already absent do not count. The original view is never
    /// touched.
    pub fn apply_mask(&mut self, keys: &[String]) -> usize {
        let mut changed = 0;
        for key in keys {
            match self.current.get_mut(key) {
                Some(record) if !record.effect_size.is_nan() => {
                    record.effect_size = f64::NAN;
                    changed += 1;
                }
                Some(_) => {}
                None => warn!(structure = %key, "mask key not present in dataset"),
            }
        }
        changed
    }

    /// Borrow the current (possibly thresholded) view
    pub fn current(&self) -> &HashMap<String, StructureRecord> {
        &self.current
    }

    /// Borrow the pristine original view
    pub fn original(&self) -> &HashMap<String, StructureRecord> {
        &self.original
    }

    pub fn is_empty(&self) -> bool {
        self.current.is_empty()
    }

    pub fn len(&self) -> usize {
        self.current.len()
    }

    /// Combined current/original snapshot, sorted by structure name for
    /// deterministic export output.
    pub fn snapshot_for_export(&self) -> Vec<SnapshotRow> {
        let mut rows: Vec<SnapshotRow> = self
            .current
            .iter()
            .map(|(name, current)| {
                let effect_original = self
                    .original
                    .get(name)
                    .map_or(f64::NAN, |o| o.effect_size);
                SnapshotRow {
                    structure: name.clone(),
                    effect_original,
                    effect_current: current.effect_size,
                    hemisphere: current.hemisphere,
                    structure_type: current.structure_type,
                    was_suppressed: current.effect_size.is_nan() && !effect_original.is_nan(),
                    original_name: current.original_name.clone(),
                }
            })
            .collect();
        rows.sort_by(|a, b| a.structure.cmp(&b.structure));
        rows
    }
}

fn parse_count(value: Option<&String>) -> Option<u64> {
    value.and_then(|v| v.trim().parse::<u64>().ok())
}

/// Read an uploaded CSV into header-keyed rows.
///
/// Empty cells stay present as empty strings so column-presence checks
/// (the effect-size aliases) see the header, not the value.
pub fn read_rows(path: &std::path::Path) -> anyhow::Result<Vec<RawRow>> {
    use anyhow::Context;

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("failed to open {}", path.display()))?;

    let headers: Vec<String> = reader
        .headers()
        .context("unreadable CSV header")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        match record {
            Ok(record) => rows.push(
                headers
                    .iter()
                    .zip(record.iter())
                    .map(|(h, v)| (h.clone(), v.to_string()))
                    .collect(),
            ),
            Err(err) => warn!(%err, "skipping malformed CSV record"),
        }
    }
    Ok(rows)
}
