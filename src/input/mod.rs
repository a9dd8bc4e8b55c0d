//! Cohort discovery and per-patient artifact locations.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::config::AnalysisConfig;
use crate::zones::Granularity;

pub const IMAGE_FILE: &str = "t2.nii.gz";
pub const GLAND_FILE: &str = "gland.nii.gz";
pub const LESION_FILE: &str = "l_a1.nii.gz";

/// Patient directories under `nii_dir` that carry the configured prefix and
/// are not excluded, sorted by ID.
pub fn discover_patients(cfg: &AnalysisConfig) -> Result<Vec<String>> {
    let entries = std::fs::read_dir(&cfg.nii_dir)
        .with_context(|| format!("failed to list image directory {}", cfg.nii_dir.display()))?;
    let mut ids = Vec::new();
    for entry in entries {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            continue;
        };
        if name.starts_with(&cfg.patient_prefix) && !cfg.is_excluded(&name) {
            ids.push(name);
        }
    }
    ids.sort();
    Ok(ids)
}

pub fn zone_mask_filename(granularity: Granularity, zone_config: &str) -> String {
    format!("gland_zone_{}level_{}.nii.gz", granularity.level(), zone_config)
}

#[derive(Debug, Clone)]
pub struct PatientPaths {
    pub patient_id: String,
    dir: PathBuf,
    tpm_dir: PathBuf,
}

impl PatientPaths {
    pub fn new(cfg: &AnalysisConfig, patient_id: &str) -> Self {
        Self {
            patient_id: patient_id.to_string(),
            dir: cfg.nii_dir.join(patient_id),
            tpm_dir: cfg.tpm_dir.clone(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn image(&self) -> PathBuf {
        self.dir.join(IMAGE_FILE)
    }

    pub fn gland(&self) -> PathBuf {
        self.dir.join(GLAND_FILE)
    }

    pub fn lesions(&self) -> PathBuf {
        self.dir.join(LESION_FILE)
    }

    pub fn zone_mask(&self, granularity: Granularity, zone_config: &str) -> PathBuf {
        self.dir.join(zone_mask_filename(granularity, zone_config))
    }

    /// Biopsy table, named after the upper-cased patient ID.
    pub fn biopsy(&self) -> PathBuf {
        self.tpm_dir
            .join(format!("{}.csv", self.patient_id.to_uppercase()))
    }
}

/// Which inputs a patient has on disk and in the MRI report.
#[derive(Debug, Clone, PartialEq)]
pub struct ArtifactStatus {
    pub patient_id: String,
    pub image: bool,
    pub gland: bool,
    pub lesions: bool,
    pub mri_entry: bool,
    pub biopsy: bool,
    pub zone_masks: Vec<(Granularity, String, bool)>,
}

impl ArtifactStatus {
    pub fn check(
        cfg: &AnalysisConfig,
        patient_id: &str,
        levels: &[Granularity],
        mri_entry: bool,
    ) -> Self {
        let paths = PatientPaths::new(cfg, patient_id);
        let mut wanted = levels.to_vec();
        if !wanted.contains(&Granularity::Barzell) {
            wanted.push(Granularity::Barzell);
        }
        let mut zone_masks = Vec::new();
        for granularity in wanted {
            for name in &cfg.zone_configs {
                let present = paths.zone_mask(granularity, name).exists();
                zone_masks.push((granularity, name.clone(), present));
            }
        }
        Self {
            patient_id: patient_id.to_string(),
            image: paths.image().exists(),
            gland: paths.gland().exists(),
            lesions: paths.lesions().exists(),
            mri_entry,
            biopsy: paths.biopsy().exists(),
            zone_masks,
        }
    }

    /// Zone masks can be generated for this patient.
    pub fn can_partition(&self) -> bool {
        self.image && self.gland
    }

    /// Every artifact the concordance analysis needs is present. The
    /// 20-zone masks are always checked since ratios are measured on them.
    pub fn can_analyse(&self) -> bool {
        self.zone_masks.iter().all(|(_, _, present)| *present) && self.mri_entry && self.biopsy
    }
}
