//! Run-wide analysis settings.
//!
//! Built once per invocation (defaults, then the YAML file, then CLI
//! overrides) and shared read-only by every stage.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    pub nii_dir: PathBuf,
    pub mri_report: PathBuf,
    pub tpm_dir: PathBuf,
    pub rules_file: PathBuf,
    pub zone_config_file: PathBuf,
    pub patient_prefix: String,
    pub excluded_patients: Vec<String>,
    /// Suffix of the biopsy core-length column, `maxcc<flag>`.
    pub ccl_flag: String,
    pub cancer_definitions: Vec<String>,
    pub num_ci_iter: usize,
    pub sample_times: usize,
    pub seed: u64,
    pub iou_thresholds: Vec<f64>,
    pub pirads_thresholds: Vec<f64>,
    pub zone_configs: Vec<String>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            nii_dir: PathBuf::from("nii"),
            mri_report: PathBuf::from("mri_report.csv"),
            tpm_dir: PathBuf::from("tpm"),
            rules_file: PathBuf::from("rules.yml"),
            zone_config_file: PathBuf::from("zone_config.yml"),
            patient_prefix: "P-".to_string(),
            excluded_patients: Vec::new(),
            ccl_flag: "uk".to_string(),
            cancer_definitions: vec!["def1".to_string(), "def2".to_string(), "gs>=7".to_string()],
            num_ci_iter: 100,
            sample_times: 100,
            seed: 42,
            iou_thresholds: vec![f64::MIN_POSITIVE, 1e-5, 1e-3, 1e-2, 5e-2, 1e-1],
            pirads_thresholds: vec![3.0],
            zone_configs: vec!["set1".to_string()],
        }
    }
}

/// Values supplied on the command line; `None` keeps the configured value.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub nii_dir: Option<PathBuf>,
    pub mri_report: Option<PathBuf>,
    pub tpm_dir: Option<PathBuf>,
    pub rules_file: Option<PathBuf>,
    pub zone_config_file: Option<PathBuf>,
    pub seed: Option<u64>,
    pub sample_times: Option<usize>,
    pub num_ci_iter: Option<usize>,
    pub zone_configs: Vec<String>,
}

impl AnalysisConfig {
    /// Reads a YAML config. Relative paths inside it are resolved against
    /// the directory holding the file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let mut cfg: AnalysisConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("{}: malformed analysis config", path.display()))?;
        if let Some(base) = path.parent() {
            cfg.rebase(base);
        }
        Ok(cfg)
    }

    fn rebase(&mut self, base: &Path) {
        for p in [
            &mut self.nii_dir,
            &mut self.mri_report,
            &mut self.tpm_dir,
            &mut self.rules_file,
            &mut self.zone_config_file,
        ] {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        }
    }

    pub fn apply(&mut self, overrides: ConfigOverrides) {
        if let Some(v) = overrides.nii_dir {
            self.nii_dir = v;
        }
        if let Some(v) = overrides.mri_report {
            self.mri_report = v;
        }
        if let Some(v) = overrides.tpm_dir {
            self.tpm_dir = v;
        }
        if let Some(v) = overrides.rules_file {
            self.rules_file = v;
        }
        if let Some(v) = overrides.zone_config_file {
            self.zone_config_file = v;
        }
        if let Some(v) = overrides.seed {
            self.seed = v;
        }
        if let Some(v) = overrides.sample_times {
            self.sample_times = v;
        }
        if let Some(v) = overrides.num_ci_iter {
            self.num_ci_iter = v;
        }
        if !overrides.zone_configs.is_empty() {
            self.zone_configs = overrides.zone_configs;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.sample_times == 0 {
            bail!("sample_times must be at least 1");
        }
        if self.num_ci_iter == 0 {
            bail!("num_ci_iter must be at least 1");
        }
        if self.zone_configs.is_empty() {
            bail!("no zone configuration selected");
        }
        if let Some(t) = self.iou_thresholds.iter().find(|t| !(0.0..1.0).contains(*t)) {
            bail!("IoU threshold {} outside [0, 1)", t);
        }
        if let Some(t) = self.pirads_thresholds.iter().find(|t| !t.is_finite()) {
            bail!("PIRADS threshold {} is not finite", t);
        }
        Ok(())
    }

    pub fn is_excluded(&self, patient_id: &str) -> bool {
        self.excluded_patients.iter().any(|p| p == patient_id)
    }
}
