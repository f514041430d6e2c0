//! Static brain atlas registry
//!
//! Each atlas defines the canonical vocabulary of cortical and subcortical
//! region names. The registry is read-only after process start and is used
//! both to classify structures and to know the universe of valid names.

/// Canonical region vocabulary for one atlas
#[derive(Debug)]
pub struct Atlas {
    /// Cortical region names in atlas order (`lh_`/`rh_` prefixed)
    pub cortical: &'static [&'static str],
    /// Subcortical region names in atlas order (`Left-`/`Right-` prefixed)
    pub subcortical: &'static [&'static str],
}

static DESIKAN: Atlas = Atlas {
    cortical: &[
        "lh_bankssts", "rh_bankssts", "lh_caudalanteriorcingulate", "rh_caudalanteriorcingulate",
        "lh_caudalmiddlefrontal", "rh_caudalmiddlefrontal", "lh_cuneus", "rh_cuneus",
        "lh_entorhinal", "rh_entorhinal", "lh_fusiform", "rh_fusiform",
        "lh_inferiorparietal", "rh_inferiorparietal", "lh_inferiortemporal", "rh_inferiortemporal",
        "lh_isthmuscingulate", "rh_isthmuscingulate", "lh_lateraloccipital", "rh_lateraloccipital",
        "lh_lateralorbitofrontal", "rh_lateralorbitofrontal", "lh_lingual", "rh_lingual",
        "lh_medialorbitofrontal", "rh_medialorbitofrontal", "lh_middletemporal", "rh_middletemporal",
        "lh_parahippocampal", "rh_parahippocampal", "lh_paracentral", "rh_paracentral",
        "lh_parsopercularis", "rh_parsopercularis", "lh_parsorbitalis", "rh_parsorbitalis",
        "lh_parstriangularis", "rh_parstriangularis", "lh_pericalcarine", "rh_pericalcarine",
        "lh_postcentral", "rh_postcentral", "lh_posteriorcingulate", "rh_posteriorcingulate",
        "lh_precentral", "rh_precentral", "lh_precuneus", "rh_precuneus",
        "lh_rostralanteriorcingulate", "rh_rostralanteriorcingulate",
        "lh_rostralmiddlefrontal", "rh_rostralmiddlefrontal", "lh_superiorfrontal", "rh_superiorfrontal",
        "lh_superiorparietal", "rh_superiorparietal", "lh_superiortemporal", "rh_superiortemporal",
        "lh_supramarginal", "rh_supramarginal", "lh_frontalpole", "rh_frontalpole",
        "lh_temporalpole", "rh_temporalpole", "lh_transversetemporal", "rh_transversetemporal",
        "lh_insula", "rh_insula",
    ],
    subcortical: &[
        "Left-Lateral-Ventricle", "Right-Lateral-Ventricle", "Left-Inf-Lat-Vent", "Right-Inf-Lat-Vent",
        "Left-Cerebellum-White-Matter", "Right-Cerebellum-White-Matter",
        "Left-Cerebellum-Cortex", "Right-Cerebellum-Cortex",
        "Left-Thalamus", "Right-Thalamus", "Left-Caudate", "Right-Caudate",
        "Left-Putamen", "Right-Putamen", "Left-Pallidum", "Right-Pallidum",
        "Left-Hippocampus", "Right-Hippocampus", "Left-Amygdala", "Right-Amygdala",
        "Left-Accumbens-area", "Right-Accumbens-area", "Left-VentralDC", "Right-VentralDC",
    ],
};

static DESTRIEUX: Atlas = Atlas {
    cortical: &[
        "lh_G_and_S_frontomargin", "rh_G_and_S_frontomargin",
        "lh_G_and_S_occipital_inf", "rh_G_and_S_occipital_inf",
        "lh_G_and_S_paracentral", "rh_G_and_S_paracentral",
        "lh_G_and_S_subcentral", "rh_G_and_S_subcentral",
        "lh_G_and_S_transv_frontopol", "rh_G_and_S_transv_frontopol",
        "lh_G_and_S_cingul-Ant", "rh_G_and_S_cingul-Ant",
        "lh_G_and_S_cingul-Mid-Ant", "rh_G_and_S_cingul-Mid-Ant",
        "lh_G_and_S_cingul-Mid-Post", "rh_G_and_S_cingul-Mid-Post",
    ],
    subcortical: &[
        "Left-Thalamus", "Right-Thalamus", "Left-Caudate", "Right-Caudate",
        "Left-Putamen", "Right-Putamen", "Left-Pallidum", "Right-Pallidum",
        "Left-Hippocampus", "Right-Hippocampus", "Left-Amygdala", "Right-Amygdala",
    ],
};

static DKT: Atlas = Atlas {
    cortical: &[
        "lh_caudalanteriorcingulate", "rh_caudalanteriorcingulate",
        "lh_caudalmiddlefrontal", "rh_caudalmiddlefrontal",
        "lh_cuneus", "rh_cuneus", "lh_entorhinal", "rh_entorhinal",
        "lh_fusiform", "rh_fusiform",
        "lh_inferiorparietal", "rh_inferiorparietal",
        "lh_inferiortemporal", "rh_inferiortemporal",
        "lh_isthmuscingulate", "rh_isthmuscingulate",
        "lh_lateraloccipital", "rh_lateraloccipital",
    ],
    subcortical: &[
        "Left-Thalamus", "Right-Thalamus", "Left-Caudate", "Right-Caudate",
        "Left-Putamen", "Right-Putamen", "Left-Hippocampus", "Right-Hippocampus",
        "Left-Amygdala", "Right-Amygdala",
    ],
};

/// Look up an atlas by identifier.
///
/// Unknown identifiers yield `None`; callers choose a fallback atlas or
/// abort rather than this module deciding for them.
pub fn get(atlas_id: &str) -> Option<&'static Atlas> {
    match atlas_id {
        "desikan" => Some(&DESIKAN),
        "destrieux" => Some(&DESTRIEUX),
        "dkt" => Some(&DKT),
        _ => None,
    }
}

/// Identifiers of all registered atlases
pub fn known_ids() -> &'static [&'static str] {
    &["desikan", "destrieux", "dkt"]
}
