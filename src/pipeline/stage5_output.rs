use anyhow::Result;
use tracing::info;

use crate::ctx::Ctx;
use crate::io::{json_writer, tsv_writer};
use crate::pipeline::Stage;

pub struct Stage5Output;

impl Stage5Output {
    pub fn new() -> Self {
        Self
    }
}

/// `<level part>_0_<zone config>_multiiou`
pub fn report_stem(level_label: &str, zone_config: &str) -> String {
    format!("{}_0_{}_multiiou", level_label, zone_config)
}

impl Stage for Stage5Output {
    fn name(&self) -> &'static str {
        "stage5_output"
    }

    fn run(&self, ctx: &mut Ctx) -> Result<()> {
        let mut written = Vec::new();
        for report in &ctx.reports {
            let stem = report_stem(report.granularity.report_label(), &report.zone_config);

            let tsv_path = ctx.out_dir.join(format!("{}.tsv", stem));
            tsv_writer::write_tsv(&tsv_path, report)?;
            info!(path = %tsv_path.display(), rows = report.rows.len(), "tsv_written");
            written.push(tsv_path);

            if ctx.write_json {
                let json_path = ctx.out_dir.join(format!("{}.json", stem));
                let doc = json_writer::build_report(ctx, report);
                json_writer::write_json(&json_path, &doc)?;
                info!(path = %json_path.display(), "json_written");
                written.push(json_path);
            }
        }
        ctx.written = written;
        Ok(())
    }
}
