//! Dataset export in tabular (CSV) and structured (JSON) form
//!
//! Both exporters are pure functions of the dataset snapshot plus the
//! loaded reference set; they never touch the network or mutate state.
//! Absent numeric values render as empty CSV fields and JSON nulls.

use crate::dataset::SnapshotRow;
use crate::navr::ReferenceSet;
use chrono::{SecondsFormat, Utc};
use serde::Serialize;

/// Export column order for the tabular form
const HEADER: &str =
    "Structure,Cohen_d_original,Cohen_d_current,Hemisphere,Type,Is_thresholded,NAVR_threshold,Original_name";

/// Escape a CSV field (handle commas, quotes, newlines)
fn escape_field(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Render a possibly-absent number; NaN becomes the empty string
fn number_field(value: f64) -> String {
    if value.is_nan() {
        String::new()
    } else {
        value.to_string()
    }
}

/// Absolute corrected NAVR for a structure, if reference coverage exists
fn navr_threshold(refs: Option<&ReferenceSet>, structure: &str) -> Option<f64> {
    refs.and_then(|r| r.get(structure))
        .map(|stat| stat.navr_corrected.abs())
}

/// Generate the tabular export as a CSV string.
pub fn to_csv(snapshot: &[SnapshotRow], refs: Option<&ReferenceSet>) -> String {
    let mut output = String::new();
    output.push_str(HEADER);
    output.push('\n');

    for row in snapshot {
        let fields = [
            escape_field(&row.structure),
            number_field(row.effect_original),
            number_field(row.effect_current),
            row.hemisphere.as_str().to_string(),
            row.structure_type.as_str().to_string(),
            row.was_suppressed.to_string(),
            navr_threshold(refs, &row.structure)
                .map(|t| t.to_string())
                .unwrap_or_default(),
            escape_field(&row.original_name),
        ];
        output.push_str(&fields.join(","));
        output.push('\n');
    }

    output
}

/// Metadata wrapped around the structured export
#[derive(Debug, Clone, Serialize)]
pub struct ExportMetadata {
    /// ISO-8601 export timestamp
    pub export_date: String,
    pub is_thresholded: bool,
    pub navr_data_loaded: bool,
    pub total_structures: usize,
    pub thresholded_count: usize,
    pub atlas: String,
    pub view: String,
}

/// One structure in the structured export
#[derive(Debug, Clone, Serialize)]
pub struct ExportRecord {
    #[serde(rename = "Structure")]
    pub structure: String,
    #[serde(rename = "Cohen_d_original")]
    pub cohen_d_original: Option<f64>,
    #[serde(rename = "Cohen_d_current")]
    pub cohen_d_current: Option<f64>,
    #[serde(rename = "Hemisphere")]
    pub hemisphere: crate::normalize::Hemisphere,
    #[serde(rename = "Type")]
    pub structure_type: crate::normalize::StructureType,
    #[serde(rename = "Is_thresholded")]
    pub is_thresholded: bool,
    #[serde(rename = "NAVR_threshold")]
    pub navr_threshold: Option<f64>,
    #[serde(rename = "Original_name")]
    pub original_name: String,
}

/// Root structure of the JSON export
#[derive(Debug, Clone, Serialize)]
pub struct ExportDocument {
    pub metadata: ExportMetadata,
    pub data: Vec<ExportRecord>,
}

/// Context the structured export's metadata is built from
#[derive(Debug, Clone)]
pub struct ExportContext {
    pub is_thresholded: bool,
    pub navr_data_loaded: bool,
    pub atlas: String,
    pub view: String,
}

fn finite(value: f64) -> Option<f64> {
    if value.is_nan() {
        None
    } else {
        Some(value)
    }
}

/// Build the structured export document.
pub fn to_document(
    snapshot: &[SnapshotRow],
    refs: Option<&ReferenceSet>,
    ctx: &ExportContext,
) -> ExportDocument {
    let data: Vec<ExportRecord> = snapshot
        .iter()
        .map(|row| ExportRecord {
            structure: row.structure.clone(),
            cohen_d_original: finite(row.effect_original),
            cohen_d_current: finite(row.effect_current),
            hemisphere: row.hemisphere,
            structure_type: row.structure_type,
            is_thresholded: row.was_suppressed,
            navr_threshold: navr_threshold(refs, &row.structure),
            original_name: row.original_name.clone(),
        })
        .collect();

    ExportDocument {
        metadata: ExportMetadata {
            export_date: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            is_thresholded: ctx.is_thresholded,
            navr_data_loaded: ctx.navr_data_loaded,
            total_structures: data.len(),
            thresholded_count: data.iter().filter(|r| r.is_thresholded).count(),
            atlas: ctx.atlas.clone(),
            view: ctx.view.clone(),
        },
        data,
    }
}

/// Serialize the structured export as pretty-printed JSON.
pub fn to_json(
    snapshot: &[SnapshotRow],
    refs: Option<&ReferenceSet>,
    ctx: &ExportContext,
) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&to_document(snapshot, refs, ctx))
}

/// Default export file name: `brain_data_{status}_{YYYY-MM-DD}.{ext}`
pub fn default_filename(is_thresholded: bool, extension: &str) -> String {
    let date = Utc::now().format("%Y-%m-%d");
    let status = if is_thresholded { "thresholded" } else { "original" };
    format!("brain_data_{status}_{date}.{extension}")
}
