//! Structure name normalization
//!
//! Maps raw structure identifiers from heterogeneous naming conventions
//! (ENIGMA cohort abbreviations, legacy `L_`/`R_` hemisphere prefixes) onto
//! the canonical atlas vocabulary, and derives hemisphere and anatomical
//! type from the canonical name.

use crate::atlas::Atlas;
use std::collections::HashMap;
use std::sync::OnceLock;
use tracing::{debug, warn};

/// Hemisphere derived from a canonical structure name
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Hemisphere {
    Left,
    Right,
    Unknown,
}

impl Hemisphere {
    /// Lowercase label used in exports ("left", "right", "unknown")
    pub fn as_str(&self) -> &'static str {
        match self {
            Hemisphere::Left => "left",
            Hemisphere::Right => "right",
            Hemisphere::Unknown => "unknown",
        }
    }
}

/// Anatomical type of a structure, derived from atlas membership
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StructureType {
    Cortical,
    Subcortical,
}

impl StructureType {
    /// Lowercase label used in exports ("cortical", "subcortical")
    pub fn as_str(&self) -> &'static str {
        match self {
            StructureType::Cortical => "cortical",
            StructureType::Subcortical => "subcortical",
        }
    }
}

/// Alias table for legacy ENIGMA-format subcortical abbreviations.
///
/// Legacy cortical names (`L_insula`, `R_cuneus`, ...) are handled by the
/// generic prefix rewrite in [`normalize`]; only the subcortical
/// abbreviations need an explicit dictionary because they are not derivable
/// by prefix substitution.
fn alias_table() -> &'static HashMap<&'static str, &'static str> {
    static TABLE: OnceLock<HashMap<&'static str, &'static str>> = OnceLock::new();
    TABLE.get_or_init(|| {
        HashMap::from([
            ("Laccumb", "Left-Accumbens-area"),
            ("Raccumb", "Right-Accumbens-area"),
            ("Lamyg", "Left-Amygdala"),
            ("Ramyg", "Right-Amygdala"),
            ("Lcaud", "Left-Caudate"),
            ("Rcaud", "Right-Caudate"),
            ("Lhippo", "Left-Hippocampus"),
            ("Rhippo", "Right-Hippocampus"),
            ("Lpal", "Left-Pallidum"),
            ("Rpal", "Right-Pallidum"),
            ("Lput", "Left-Putamen"),
            ("Rput", "Right-Putamen"),
            ("Lthal", "Left-Thalamus"),
            ("Rthal", "Right-Thalamus"),
            ("LLatVent", "Left-Lateral-Ventricle"),
            ("RLatVent", "Right-Lateral-Ventricle"),
        ])
    })
}

/// Normalize a raw structure identifier to the canonical atlas vocabulary.
///
/// Resolution order: alias dictionary, then literal `L_` -> `lh_` /
/// `R_` -> `rh_` prefix substitution, then pass-through. Never fails;
/// unrecognized names are returned unchanged.
pub fn normalize(raw: &str) -> String {
    if raw.is_empty() {
        warn!("empty structure name provided");
        return raw.to_string();
    }

    if let Some(canonical) = alias_table().get(raw) {
        return (*canonical).to_string();
    }

    if let Some(rest) = raw.strip_prefix("L_") {
        return format!("lh_{rest}");
    }
    if let Some(rest) = raw.strip_prefix("R_") {
        return format!("rh_{rest}");
    }

    raw.to_string()
}

/// Derive the hemisphere from a canonical structure name.
///
/// Must be applied to the canonical name, not the raw input: alias
/// expansion can change which prefix is visible.
pub fn hemisphere(canonical: &str) -> Hemisphere {
    if canonical.starts_with("lh_") || canonical.contains("Left-") || canonical.starts_with("L_") {
        Hemisphere::Left
    } else if canonical.starts_with("rh_")
        || canonical.contains("Right-")
        || canonical.starts_with("R_")
    {
        Hemisphere::Right
    } else {
        Hemisphere::Unknown
    }
}

/// Classify a canonical name as cortical or subcortical by atlas membership.
///
/// When no atlas is available the structure defaults to cortical; the
/// fallback is logged rather than silently applied.
pub fn structure_type(canonical: &str, atlas: Option<&Atlas>) -> StructureType {
    let Some(atlas) = atlas else {
        debug!(structure = canonical, "atlas unavailable, defaulting to cortical");
        return StructureType::Cortical;
    };

    if atlas.subcortical.contains(&canonical) {
        StructureType::Subcortical
    } else {
        StructureType::Cortical
    }
}
