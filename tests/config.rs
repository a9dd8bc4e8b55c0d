use std::fs;
use std::path::PathBuf;

use kira_zonemap::config::{AnalysisConfig, ConfigOverrides};
use tempfile::TempDir;

#[test]
fn defaults_are_valid() {
    let cfg = AnalysisConfig::default();
    cfg.validate().unwrap();
    assert_eq!(cfg.seed, 42);
    assert_eq!(cfg.sample_times, 100);
    assert_eq!(cfg.num_ci_iter, 100);
    assert_eq!(cfg.pirads_thresholds, vec![3.0]);
    assert_eq!(cfg.iou_thresholds.len(), 6);
    assert_eq!(cfg.zone_configs, vec!["set1".to_string()]);
}

#[test]
fn file_values_override_defaults_and_paths_rebase() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("analysis.yml");
    fs::write(
        &path,
        "nii_dir: cohort\nmri_report: /data/mri.csv\nseed: 7\niou_thresholds: [0.0, 0.2]\n",
    )
    .unwrap();

    let cfg = AnalysisConfig::load(&path).unwrap();
    assert_eq!(cfg.nii_dir, tmp.path().join("cohort"));
    assert_eq!(cfg.mri_report, PathBuf::from("/data/mri.csv"));
    assert_eq!(cfg.tpm_dir, tmp.path().join("tpm"));
    assert_eq!(cfg.seed, 7);
    assert_eq!(cfg.iou_thresholds, vec![0.0, 0.2]);
    assert_eq!(cfg.sample_times, 100);
}

#[test]
fn unknown_keys_are_rejected() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("analysis.yml");
    fs::write(&path, "sampel_times: 5\n").unwrap();
    assert!(AnalysisConfig::load(&path).is_err());
}

#[test]
fn overrides_replace_only_given_values() {
    let mut cfg = AnalysisConfig::default();
    cfg.apply(ConfigOverrides {
        seed: Some(1),
        sample_times: Some(3),
        zone_configs: vec!["set2".to_string(), "set3".to_string()],
        ..ConfigOverrides::default()
    });
    assert_eq!(cfg.seed, 1);
    assert_eq!(cfg.sample_times, 3);
    assert_eq!(cfg.num_ci_iter, 100);
    assert_eq!(cfg.zone_configs, vec!["set2", "set3"]);
    assert_eq!(cfg.nii_dir, PathBuf::from("nii"));
}

#[test]
fn invalid_settings_fail_validation() {
    let mut cfg = AnalysisConfig::default();
    cfg.sample_times = 0;
    assert!(cfg.validate().is_err());

    let mut cfg = AnalysisConfig::default();
    cfg.iou_thresholds = vec![1.0];
    assert!(cfg.validate().is_err());

    let mut cfg = AnalysisConfig::default();
    cfg.zone_configs.clear();
    assert!(cfg.validate().is_err());

    let mut cfg = AnalysisConfig::default();
    cfg.pirads_thresholds = vec![f64::NAN];
    assert!(cfg.validate().is_err());
}

#[test]
fn exclusions_match_exact_ids() {
    let mut cfg = AnalysisConfig::default();
    cfg.excluded_patients = vec!["P-002".to_string()];
    assert!(cfg.is_excluded("P-002"));
    assert!(!cfg.is_excluded("P-0021"));
}
