use anyhow::Result;
use tracing::{info, warn};

use crate::ctx::Ctx;
use crate::input;
use crate::pipeline::Stage;

pub struct Stage1Cohort;

impl Stage1Cohort {
    pub fn new() -> Self {
        Self
    }
}

impl Stage for Stage1Cohort {
    fn name(&self) -> &'static str {
        "stage1_cohort"
    }

    fn run(&self, ctx: &mut Ctx) -> Result<()> {
        ctx.patients = input::discover_patients(&ctx.config)?;
        if ctx.patients.is_empty() {
            let msg = format!(
                "no patient directories with prefix '{}' under {}",
                ctx.config.patient_prefix,
                ctx.config.nii_dir.display()
            );
            warn!("{}", msg);
            ctx.warn(msg);
        }
        info!(
            patients = ctx.patients.len(),
            excluded = ctx.config.excluded_patients.len(),
            nii_dir = %ctx.config.nii_dir.display(),
            "cohort discovered"
        );
        Ok(())
    }
}
