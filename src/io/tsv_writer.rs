use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};

use crate::ctx::LevelReport;
use crate::schema::v1::{ConcordanceRow, format_value};

const HEADER: [&str; 19] = [
    "definition",
    "pirads_thre",
    "iou_thre",
    "TP",
    "FP",
    "FN",
    "TN",
    "sensitivity",
    "specificity",
    "PPV",
    "NPV",
    "sensitivity_ci",
    "specificity_ci",
    "PPV_ci",
    "NPV_ci",
    "sensitivity_with_ci",
    "specificity_with_ci",
    "PPV_with_ci",
    "NPV_with_ci",
];

pub fn write_tsv(path: &Path, report: &LevelReport) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    let mut w = BufWriter::new(file);
    write_rows(&mut w, &report.rows)?;
    w.flush()?;
    Ok(())
}

pub fn write_rows<W: Write>(w: &mut W, rows: &[ConcordanceRow]) -> Result<()> {
    writeln!(w, "{}", HEADER.join("\t"))?;
    for row in rows {
        writeln!(
            w,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            row.definition,
            format_threshold(row.pirads_thre),
            format_threshold(row.iou_thre),
            row.tp,
            row.fp,
            row.fn_,
            row.tn,
            format_value(row.sensitivity),
            format_value(row.specificity),
            format_value(row.ppv),
            format_value(row.npv),
            format_ci(row.sensitivity_ci),
            format_ci(row.specificity_ci),
            format_ci(row.ppv_ci),
            format_ci(row.npv_ci),
            row.sensitivity_with_ci,
            row.specificity_with_ci,
            row.ppv_with_ci,
            row.npv_with_ci,
        )?;
    }
    Ok(())
}

/// Plain decimal for ordinary magnitudes, scientific notation for tiny ones.
pub fn format_threshold(v: f64) -> String {
    if v != 0.0 && v.abs() < 1e-4 {
        format!("{:e}", v)
    } else {
        format!("{}", v)
    }
}

fn format_ci(ci: [Option<f64>; 2]) -> String {
    format!("({}, {})", format_value(ci[0]), format_value(ci[1]))
}
