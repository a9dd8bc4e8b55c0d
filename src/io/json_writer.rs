use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use anyhow::{Context, Result};

use crate::ctx::{Ctx, LevelReport};
use crate::schema::v1::{ConcordanceReportV1, RunSettings, ToolInfo};

pub fn build_report(ctx: &Ctx, level: &LevelReport) -> ConcordanceReportV1 {
    ConcordanceReportV1 {
        tool: ToolInfo {
            name: "kira-zonemap".to_string(),
            version: ctx.tool_version.clone(),
            schema: "v1".to_string(),
        },
        level: level.granularity.level(),
        settings: RunSettings {
            seed: ctx.config.seed,
            sample_times: ctx.config.sample_times,
            num_ci_iter: ctx.config.num_ci_iter,
            zone_config: level.zone_config.clone(),
        },
        patients: level.patients.clone(),
        rows: level.rows.clone(),
        warnings: ctx.warnings.clone(),
    }
}

pub fn write_json(path: &Path, report: &ConcordanceReportV1) -> Result<()> {
    let file =
        File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, report)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}
