//! NAVR reference loading and merge
//!
//! Fetches the cortical and subcortical normative-variability reference
//! tables for a chosen metric and merges them into a single map keyed by
//! canonical structure name. The two files are read concurrently and each
//! awaited independently; a missing file degrades to a partial reference
//! set rather than a failure.

use clap::ValueEnum;
use csv::ReaderBuilder;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Metric a reference table is keyed by
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Metric {
    Thickness,
    Area,
    Volume,
}

impl Metric {
    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Thickness => "thickness",
            Metric::Area => "area",
            Metric::Volume => "volume",
        }
    }
}

/// Normative reference statistics for one structure
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReferenceStat {
    /// Reference cohort's own normative effect estimate
    pub navr: f64,
    /// Bias-corrected version of `navr`
    pub navr_corrected: f64,
    pub correction: f64,
    /// Sample size backing the reference estimate
    pub population_size: u64,
}

/// File paths for one atlas/metric combination
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferencePaths {
    pub cortical: PathBuf,
    pub subcortical: PathBuf,
}

/// Merged reference map plus per-file load outcome
#[derive(Debug, Clone)]
pub struct ReferenceSet {
    pub entries: HashMap<String, ReferenceStat>,
    pub cortical_ok: bool,
    pub subcortical_ok: bool,
    /// Atlas/metric active when the load was initiated; lets the caller
    /// discard a result whose context has since changed.
    pub atlas: String,
    pub metric: Metric,
}

impl ReferenceSet {
    /// True when at least one of the two reference files loaded
    pub fn has_any(&self) -> bool {
        self.cortical_ok || self.subcortical_ok
    }

    pub fn get(&self, structure: &str) -> Option<&ReferenceStat> {
        self.entries.get(structure)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Build the reference-file paths for an atlas/metric combination.
///
/// The subcortical table is always the volume variant regardless of the
/// cortical metric; subcortical reference data only exists volumetrically.
pub fn reference_paths(data_dir: &Path, atlas_id: &str, metric: Metric) -> ReferencePaths {
    let base = data_dir.join(atlas_id);
    ReferencePaths {
        cortical: base.join(format!("navr_cortical_{}.csv", metric.as_str())),
        subcortical: base.join("navr_subcortical_volume.csv"),
    }
}

/// Load and merge both reference files.
///
/// The reads are issued concurrently and awaited independently so one
/// missing file never blocks or cancels the other. The result is "no
/// references" only when both files fail.
pub async fn load_references(paths: &ReferencePaths, atlas: &str, metric: Metric) -> ReferenceSet {
    let (cortical_text, subcortical_text) = tokio::join!(
        tokio::fs::read_to_string(&paths.cortical),
        tokio::fs::read_to_string(&paths.subcortical),
    );

    let mut set = ReferenceSet {
        entries: HashMap::new(),
        cortical_ok: false,
        subcortical_ok: false,
        atlas: atlas.to_string(),
        metric,
    };

    match cortical_text {
        Ok(text) => {
            let count = parse_cortical(&text, &mut set.entries);
            set.cortical_ok = true;
            debug!(entries = count, path = %paths.cortical.display(), "cortical references loaded");
        }
        Err(err) => {
            warn!(path = %paths.cortical.display(), %err, "cortical reference file unavailable");
        }
    }

    match subcortical_text {
        Ok(text) => {
            let count = parse_subcortical(&text, &mut set.entries);
            set.subcortical_ok = true;
            debug!(entries = count, path = %paths.subcortical.display(), "subcortical references loaded");
        }
        Err(err) => {
            warn!(path = %paths.subcortical.display(), %err, "subcortical reference file unavailable");
        }
    }

    set
}

/// Parse the cortical reference table.
///
/// Rows are keyed `{hemisphere}_{region}` to line up with canonical
/// cortical naming. Rows missing region, hemisphere or the corrected-NAVR
/// column are skipped; numeric parse failures default the field to zero.
pub fn parse_cortical(text: &str, entries: &mut HashMap<String, ReferenceStat>) -> usize {
    let mut count = 0;
    for row in header_rows(text) {
        let (Some(region), Some(hemisphere)) = (nonempty(&row, "region"), nonempty(&row, "hemisphere"))
        else {
            continue;
        };
        if !row.contains_key("NAVR_corrected") {
            continue;
        }
        entries.insert(format!("{hemisphere}_{region}"), stat_from_row(&row));
        count += 1;
    }
    count
}

/// Parse the subcortical reference table.
///
/// Rows are keyed by the region field alone, which is already in canonical
/// `Left-X`/`Right-X` form.
pub fn parse_subcortical(text: &str, entries: &mut HashMap<String, ReferenceStat>) -> usize {
    let mut count = 0;
    for row in header_rows(text) {
        let Some(region) = nonempty(&row, "region") else {
            continue;
        };
        if !row.contains_key("NAVR_corrected") {
            continue;
        }
        entries.insert(region, stat_from_row(&row));
        count += 1;
    }
    count
}

fn stat_from_row(row: &HashMap<String, String>) -> ReferenceStat {
    ReferenceStat {
        navr: num_or_zero(row.get("NAVR")),
        navr_corrected: num_or_zero(row.get("NAVR_corrected")),
        correction: num_or_zero(row.get("correction")),
        population_size: row
            .get("population_size")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(0),
    }
}

fn num_or_zero(value: Option<&String>) -> f64 {
    value.and_then(|v| v.trim().parse::<f64>().ok()).unwrap_or(0.0)
}

fn nonempty(row: &HashMap<String, String>, key: &str) -> Option<String> {
    row.get(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Read a CSV text into header-keyed rows, tolerating ragged records
fn header_rows(text: &str) -> Vec<HashMap<String, String>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = match reader.headers() {
        Ok(h) => h.iter().map(|s| s.trim().to_string()).collect(),
        Err(err) => {
            warn!(%err, "unreadable CSV header, no rows parsed");
            return Vec::new();
        }
    };

    let mut rows = Vec::new();
    for record in reader.records() {
        match record {
            Ok(record) => {
                let row: HashMap<String, String> = headers
                    .iter()
                    .zip(record.iter())
                    .map(|(h, v)| (h.clone(), v.to_string()))
                    .collect();
                rows.push(row);
            }
            Err(err) => warn!(%err, "skipping malformed CSV record"),
        }
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    const CORTICAL_CSV: &str = "\
region,hemisphere,NAVR,NAVR_corrected,correction,population_size
insula,lh,0.30,0.28,0.95,400
insula,rh,0.31,0.29,0.95,400
,rh,0.5,0.5,1.0,100
cuneus,,0.5,0.5,1.0,100
";

    const SUBCORTICAL_CSV: &str = "\
region,NAVR,NAVR_corrected,correction,population_size
Left-Hippocampus,0.22,0.20,0.91,350
Right-Hippocampus,bad,0.21,0.91,350
";

    #[test]
    fn test_reference_paths() {
        let paths = reference_paths(Path::new("data"), "desikan", Metric::Thickness);
        assert_eq!(
            paths.cortical,
            PathBuf::from("data/desikan/navr_cortical_thickness.csv")
        );
        assert_eq!(
            paths.subcortical,
            PathBuf::from("data/desikan/navr_subcortical_volume.csv")
        );
    }

    #[test]
    fn test_subcortical_path_always_volume() {
        for metric in [Metric::Thickness, Metric::Area, Metric::Volume] {
            let paths = reference_paths(Path::new("data"), "dkt", metric);
            assert!(paths
                .subcortical
                .ends_with("dkt/navr_subcortical_volume.csv"));
        }
    }

    #[test]
    fn test_parse_cortical_keys_and_skips() {
        let mut entries = HashMap::new();
        let count = parse_cortical(CORTICAL_CSV, &mut entries);
        // Rows with empty region or hemisphere are skipped
        assert_eq!(count, 2);
        let lh = entries.get("lh_insula").unwrap();
        assert_eq!(lh.navr, 0.30);
        assert_eq!(lh.navr_corrected, 0.28);
        assert_eq!(lh.population_size, 400);
    }

    #[test]
    fn test_parse_subcortical_keys_by_region() {
        let mut entries = HashMap::new();
        let count = parse_subcortical(SUBCORTICAL_CSV, &mut entries);
        assert_eq!(count, 2);
        assert!(entries.contains_key("Left-Hippocampus"));
        // Unparseable NAVR defaults to zero instead of rejecting the row
        assert_eq!(entries["Right-Hippocampus"].navr, 0.0);
        assert_eq!(entries["Right-Hippocampus"].navr_corrected, 0.21);
    }

    #[test]
    fn test_parse_requires_corrected_column() {
        let csv = "region,hemisphere,NAVR\ninsula,lh,0.3\n";
        let mut entries = HashMap::new();
        assert_eq!(parse_cortical(csv, &mut entries), 0);
        assert!(entries.is_empty());
    }

    #[tokio::test]
    async fn test_load_references_partial_success() {
        let dir = tempfile::tempdir().unwrap();
        let atlas_dir = dir.path().join("desikan");
        std::fs::create_dir_all(&atlas_dir).unwrap();
        std::fs::write(atlas_dir.join("navr_cortical_thickness.csv"), CORTICAL_CSV).unwrap();
        // Subcortical file deliberately absent

        let paths = reference_paths(dir.path(), "desikan", Metric::Thickness);
        let set = load_references(&paths, "desikan", Metric::Thickness).await;

        assert!(set.cortical_ok);
        assert!(!set.subcortical_ok);
        assert!(set.has_any());
        assert_eq!(set.len(), 2);
    }

    #[tokio::test]
    async fn test_load_references_both_missing() {
        let dir = tempfile::tempdir().unwrap();
        let paths = reference_paths(dir.path(), "desikan", Metric::Volume);
        let set = load_references(&paths, "desikan", Metric::Volume).await;
        assert!(!set.has_any());
        assert!(set.is_empty());
    }

    #[tokio::test]
    async fn test_load_references_merges_both_files() {
        let dir = tempfile::tempdir().unwrap();
        let atlas_dir = dir.path().join("desikan");
        std::fs::create_dir_all(&atlas_dir).unwrap();
        std::fs::write(atlas_dir.join("navr_cortical_area.csv"), CORTICAL_CSV).unwrap();
        std::fs::write(atlas_dir.join("navr_subcortical_volume.csv"), SUBCORTICAL_CSV).unwrap();

        let paths = reference_paths(dir.path(), "desikan", Metric::Area);
        let set = load_references(&paths, "desikan", Metric::Area).await;
        assert!(set.cortical_ok && set.subcortical_ok);
        assert_eq!(set.len(), 4);
        assert!(set.get("lh_insula").is_some());
        assert!(set.get("Left-Hippocampus").is_some());
    }
}
