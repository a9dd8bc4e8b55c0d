use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::ctx::Ctx;
use crate::io::mri_report::MriReport;
use crate::pipeline::Stage;
use crate::rules;
use crate::zones;

pub struct Stage2Sources;

impl Stage2Sources {
    pub fn new() -> Self {
        Self
    }
}

impl Stage for Stage2Sources {
    fn name(&self) -> &'static str {
        "stage2_sources"
    }

    fn run(&self, ctx: &mut Ctx) -> Result<()> {
        let zone_configs = zones::load_zone_configs(&ctx.config.zone_config_file)?;
        for name in &ctx.config.zone_configs {
            zone_configs.require(name)?;
        }
        info!(
            path = %ctx.config.zone_config_file.display(),
            defined = zone_configs.len(),
            "zone configurations loaded"
        );
        ctx.zone_configs = zone_configs;

        if !ctx.command.needs_clinical_sources() {
            return Ok(());
        }

        let book = rules::load_rules(&ctx.config.rules_file)?;
        for def in &ctx.config.cancer_definitions {
            book.require(def)
                .with_context(|| format!("rules file {}", ctx.config.rules_file.display()))?;
        }
        info!(
            path = %ctx.config.rules_file.display(),
            definitions = book.len(),
            "rules loaded"
        );
        ctx.rules = Some(book);

        let report = MriReport::load(&ctx.config.mri_report)?;
        let mut missing = Vec::new();
        for pid in &ctx.patients {
            if !report.contains(pid) {
                missing.push(pid.clone());
            }
        }
        for pid in &missing {
            warn!(patient = %pid, "patient not found in MRI report");
            ctx.warn(format!("{}: not found in MRI report", pid));
        }
        info!(
            path = %ctx.config.mri_report.display(),
            reported = report.n_patients(),
            missing = missing.len(),
            "MRI report loaded"
        );
        ctx.mri = Some(report);
        Ok(())
    }
}
