use std::fs;

use kira_zonemap::zones::{load_zone_configs, parse_zone_configs};
use tempfile::TempDir;

const ZONE_YAML: &str = r#"
set1:
  apex: 0.4
  anterior-cutoff: 0.45
  left-right: 0.2
  anterior: [0.25, 0.25, 0.25, 0.25]
  posterior: [0.2, 0.2, 0.2, 0.2, 0.2]
set2:
  apex: 0.5
  anterior-cutoff: 0.5
  left-right: 0.5
  anterior: [1]
  posterior: [1]
"#;

#[test]
fn parses_named_configurations() {
    let set = parse_zone_configs(ZONE_YAML, "inline").unwrap();
    assert_eq!(set.len(), 2);
    assert_eq!(set.names().collect::<Vec<_>>(), vec!["set1", "set2"]);

    let set1 = set.require("set1").unwrap();
    assert!((set1.apex - 0.4).abs() < 1e-12);
    assert!((set1.anterior_cutoff - 0.45).abs() < 1e-12);
    assert_eq!(set1.anterior.len(), 4);
    let cum = set1.anterior_cumulative();
    assert!((cum[3] - 1.0).abs() < 1e-12);
}

#[test]
fn unknown_name_is_an_error() {
    let set = parse_zone_configs(ZONE_YAML, "inline").unwrap();
    let err = set.require("set9").unwrap_err();
    assert!(err.to_string().contains("set9"));
}

#[test]
fn fractions_must_lie_in_unit_interval() {
    let yaml = r#"
bad:
  apex: 1.5
  anterior-cutoff: 0.5
  left-right: 0.2
  anterior: [1]
  posterior: [1]
"#;
    let err = parse_zone_configs(yaml, "inline").unwrap_err();
    assert!(format!("{:#}", err).contains("apex"));
}

#[test]
fn split_ratios_must_sum_to_one() {
    let yaml = r#"
bad:
  apex: 0.5
  anterior-cutoff: 0.5
  left-right: 0.2
  anterior: [0.5, 0.3]
  posterior: [1]
"#;
    let err = parse_zone_configs(yaml, "inline").unwrap_err();
    assert!(format!("{:#}", err).contains("anterior"));
}

#[test]
fn empty_split_list_is_rejected() {
    let yaml = r#"
bad:
  apex: 0.5
  anterior-cutoff: 0.5
  left-right: 0.2
  anterior: [1]
  posterior: []
"#;
    assert!(parse_zone_configs(yaml, "inline").is_err());
}

#[test]
fn loads_from_file() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("zone_config.yml");
    fs::write(&path, ZONE_YAML).unwrap();
    let set = load_zone_configs(&path).unwrap();
    assert!(set.get("set2").is_some());

    let missing = tmp.path().join("absent.yml");
    assert!(load_zone_configs(&missing).is_err());
}
