use anyhow::Result;
use std::fs;
use tracing::info;

use crate::ctx::{Command, Ctx};
use crate::pipeline::Stage;

pub struct Stage0Scaffold;

impl Stage0Scaffold {
    pub fn new() -> Self {
        Self
    }
}

impl Stage for Stage0Scaffold {
    fn name(&self) -> &'static str {
        "stage0_scaffold"
    }

    fn run(&self, ctx: &mut Ctx) -> Result<()> {
        ctx.config.validate()?;
        if ctx.levels.is_empty() {
            anyhow::bail!("no zone granularity selected");
        }

        if ctx.command == Command::Analyze {
            fs::create_dir_all(&ctx.out_dir)?;
            info!(out_dir = %ctx.out_dir.display(), "output_dir_ready");
        }

        info!(
            seed = ctx.config.seed,
            sample_times = ctx.config.sample_times,
            num_ci_iter = ctx.config.num_ci_iter,
            levels = ?ctx.levels.iter().map(|g| g.level()).collect::<Vec<_>>(),
            zone_configs = ?ctx.config.zone_configs,
            "run configured"
        );
        Ok(())
    }
}
