//! navrcut - Effect-size normalization and NAVR thresholding for brain atlases
//!
//! This library maps heterogeneous structure-naming conventions (FreeSurfer,
//! ENIGMA, legacy hemisphere prefixes) onto a canonical atlas vocabulary,
//! merges CSV-supplied Cohen's d effect sizes with normative-variability
//! (NAVR) reference data, and computes a reversible per-structure threshold
//! decision over the merged dataset.

pub mod atlas;
pub mod cli;
pub mod dataset;
pub mod export;
pub mod navr;
pub mod normalize;
pub mod session;
pub mod stats;
pub mod threshold;
