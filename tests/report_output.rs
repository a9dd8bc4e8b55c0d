use std::path::PathBuf;

use kira_zonemap::config::AnalysisConfig;
use kira_zonemap::ctx::{Command, Ctx, LevelReport, ZoneMaskRun};
use kira_zonemap::io::json_writer::{build_report, write_json};
use kira_zonemap::io::summary::{format_summary, format_zone_summary};
use kira_zonemap::io::tsv_writer::{format_threshold, write_rows, write_tsv};
use kira_zonemap::math::stats::{
    ConfidenceInterval, ConfusionMatrix, MetricIntervals, Metrics,
};
use kira_zonemap::pipeline::stage5_output::report_stem;
use kira_zonemap::schema::v1::{ConcordanceReportV1, ConcordanceRow, format_value, percent};
use kira_zonemap::zones::Granularity;
use tempfile::TempDir;

fn interval(lower: f64, upper: f64) -> ConfidenceInterval {
    ConfidenceInterval { lower, upper }
}

fn sample_row(iou: f64) -> ConcordanceRow {
    let cm = ConfusionMatrix {
        tp: 2,
        tn: 5,
        fp: 1,
        fn_: 2,
    };
    let metrics = Metrics::from_confusion(&cm);
    let intervals = MetricIntervals {
        sensitivity: interval(0.2, 0.8),
        specificity: interval(0.6, 1.0),
        ppv: interval(f64::NAN, f64::NAN),
        npv: interval(0.5, 0.9),
    };
    ConcordanceRow::new("def1", 3.0, iou, &cm, &metrics, &intervals)
}

fn sample_report() -> LevelReport {
    LevelReport {
        granularity: Granularity::Quadrant,
        zone_config: "set1".to_string(),
        patients: vec!["P-001".to_string(), "P-002".to_string()],
        rows: vec![sample_row(f64::MIN_POSITIVE), sample_row(0.05)],
    }
}

fn sample_ctx(out_dir: PathBuf) -> Ctx {
    let mut ctx = Ctx::new(
        Command::Analyze,
        AnalysisConfig::default(),
        vec![Granularity::Quadrant],
        out_dir,
        true,
        "0.1.0",
    );
    ctx.reports.push(sample_report());
    ctx.warn("P-003: not found in MRI report");
    ctx
}

#[test]
fn percentages_round_to_two_decimals() {
    assert_eq!(percent(0.5), Some(50.0));
    assert_eq!(percent(2.0 / 3.0), Some(66.67));
    assert_eq!(percent(f64::NAN), None);
    assert_eq!(format_value(Some(50.0)), "50.0");
    assert_eq!(format_value(Some(66.67)), "66.67");
    assert_eq!(format_value(None), "nan");
}

#[test]
fn row_carries_metrics_and_rendered_intervals() {
    let row = sample_row(0.05);
    assert_eq!(row.tp, 2);
    assert_eq!(row.sensitivity, Some(50.0));
    assert_eq!(row.ppv, Some(66.67));
    assert_eq!(row.sensitivity_with_ci, "50.0 (20.0, 80.0)");
    assert_eq!(row.ppv_with_ci, "66.67 (nan, nan)");
    assert_eq!(row.ppv_ci, [None, None]);
}

#[test]
fn thresholds_render_compactly() {
    assert_eq!(format_threshold(0.05), "0.05");
    assert_eq!(format_threshold(3.0), "3");
    assert_eq!(format_threshold(0.0), "0");
    assert_eq!(format_threshold(1e-5), "1e-5");
    assert!(format_threshold(f64::MIN_POSITIVE).contains("e-308"));
}

#[test]
fn tsv_has_header_and_one_line_per_row() {
    let report = sample_report();
    let mut buf = Vec::new();
    write_rows(&mut buf, &report.rows).unwrap();
    let text = String::from_utf8(buf).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 3);

    let header: Vec<&str> = lines[0].split('\t').collect();
    assert_eq!(header.len(), 19);
    assert_eq!(&header[..4], &["definition", "pirads_thre", "iou_thre", "TP"]);
    assert_eq!(header[18], "NPV_with_ci");

    let cells: Vec<&str> = lines[2].split('\t').collect();
    assert_eq!(cells.len(), 19);
    assert_eq!(cells[0], "def1");
    assert_eq!(cells[2], "0.05");
    assert_eq!(cells[3], "2");
    assert_eq!(cells[7], "50.0");
    assert_eq!(cells[11], "(20.0, 80.0)");
    assert_eq!(cells[13], "(nan, nan)");
}

#[test]
fn json_report_round_trips_through_serde() {
    let tmp = TempDir::new().unwrap();
    let ctx = sample_ctx(tmp.path().to_path_buf());
    let doc = build_report(&ctx, &ctx.reports[0]);
    assert_eq!(doc.level, 4);
    assert_eq!(doc.tool.name, "kira-zonemap");
    assert_eq!(doc.settings.zone_config, "set1");

    let path = tmp.path().join("report.json");
    write_json(&path, &doc).unwrap();
    let text = std::fs::read_to_string(&path).unwrap();
    let value: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(value["rows"][0]["TP"], 2);
    assert_eq!(value["rows"][0]["PPV"], 66.67);
    assert!(value["rows"][0]["PPV_ci"][0].is_null());
    assert_eq!(value["patients"].as_array().unwrap().len(), 2);
    assert_eq!(value["warnings"].as_array().unwrap().len(), 1);

    let parsed: ConcordanceReportV1 = serde_json::from_str(&text).unwrap();
    assert_eq!(parsed.rows[1], ctx.reports[0].rows[1]);
}

#[test]
fn tsv_file_is_written() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join(format!("{}.tsv", report_stem("4_level", "set1")));
    write_tsv(&path, &sample_report()).unwrap();
    assert!(path.ends_with("4_level_0_set1_multiiou.tsv"));
    let text = std::fs::read_to_string(&path).unwrap();
    assert_eq!(text.lines().count(), 3);
}

#[test]
fn summaries_list_levels_and_rows() {
    let tmp = TempDir::new().unwrap();
    let mut ctx = sample_ctx(tmp.path().to_path_buf());
    ctx.written.push(tmp.path().join("4_level_0_set1_multiiou.tsv"));
    let text = format_summary(&ctx);
    assert!(text.starts_with("kira-zonemap v0.1.0\n"));
    assert!(text.contains("Level 4 (set1): 2 patients"));
    assert!(text.contains("def1 pirads>=3.0 iou>0.05: sens 50.0 (20.0, 80.0)"));
    assert!(text.contains("Outputs:"));

    ctx.patients = vec!["P-001".to_string()];
    ctx.zone_runs.push(ZoneMaskRun {
        granularity: Granularity::Barzell,
        zone_config: "set1".to_string(),
        written: 1,
        skipped: 0,
        unassigned_voxels: 0,
    });
    let zones = format_zone_summary(&ctx);
    assert!(zones.contains("Patients: 1"));
    assert!(zones.contains("Level 20 (set1): 1 written, 0 skipped, 0 unassigned voxels"));
}
