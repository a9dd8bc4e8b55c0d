use crate::ctx::Ctx;
use crate::schema::v1::format_value;

pub fn format_summary(ctx: &Ctx) -> String {
    let mut out = String::new();
    out.push_str(&format!("kira-zonemap v{}\n", ctx.tool_version));
    for report in &ctx.reports {
        out.push_str(&format!(
            "Level {} ({}): {} patients\n",
            report.granularity.level(),
            report.zone_config,
            report.patients.len()
        ));
        for row in &report.rows {
            out.push_str(&format!(
                "  {} pirads>={} iou>{}: sens {} spec {} PPV {} NPV {}\n",
                row.definition,
                format_value(Some(row.pirads_thre)),
                crate::io::tsv_writer::format_threshold(row.iou_thre),
                row.sensitivity_with_ci,
                row.specificity_with_ci,
                row.ppv_with_ci,
                row.npv_with_ci,
            ));
        }
    }
    if !ctx.written.is_empty() {
        out.push_str("Outputs:\n");
        for path in &ctx.written {
            out.push_str(&format!("  {}\n", path.display()));
        }
    }
    out
}

pub fn format_zone_summary(ctx: &Ctx) -> String {
    let mut out = String::new();
    out.push_str(&format!("kira-zonemap v{}\n", ctx.tool_version));
    out.push_str(&format!("Patients: {}\n", ctx.patients.len()));
    for run in &ctx.zone_runs {
        out.push_str(&format!(
            "Level {} ({}): {} written, {} skipped, {} unassigned voxels\n",
            run.granularity.level(),
            run.zone_config,
            run.written,
            run.skipped,
            run.unassigned_voxels
        ));
    }
    out
}
