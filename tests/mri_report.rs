use std::fs;

use kira_zonemap::io::mri_report::MriReport;
use tempfile::TempDir;

const REPORT_CSV: &str = "\
patientID,lesion,les_all
P001,1,4
P001,2,2
P002,1,5
P003,1,
P001,3,3
";

#[test]
fn scores_are_grouped_per_patient_in_row_order() {
    let report = MriReport::from_reader(REPORT_CSV.as_bytes()).unwrap();
    assert_eq!(report.n_patients(), 3);
    assert_eq!(report.lookup("P001"), Some(&[4.0, 2.0, 3.0][..]));
    assert_eq!(report.lookup("P002"), Some(&[5.0][..]));
}

#[test]
fn patient_with_blank_scores_is_still_reported() {
    let report = MriReport::from_reader(REPORT_CSV.as_bytes()).unwrap();
    assert!(report.contains("P003"));
    assert_eq!(report.lookup("P003"), Some(&[][..]));
    assert!(report.lookup("P404").is_none());
}

#[test]
fn required_columns_must_exist() {
    let csv = "patient,les_all\nP001,4\n";
    assert!(MriReport::from_reader(csv.as_bytes()).is_err());
}

#[test]
fn loads_from_file() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("mri.csv");
    fs::write(&path, REPORT_CSV).unwrap();
    let report = MriReport::load(&path).unwrap();
    assert!(report.contains("P002"));
    assert!(MriReport::load(&tmp.path().join("missing.csv")).is_err());
}
