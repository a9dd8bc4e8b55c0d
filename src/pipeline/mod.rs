use anyhow::Result;
use std::time::Instant;
use tracing::{info, warn};

use crate::ctx::Ctx;

#[cfg(feature = "mt")]
use rayon::prelude::*;

pub mod stage0_scaffold;
pub mod stage1_cohort;
pub mod stage2_sources;
pub mod stage3_zone_masks;
pub mod stage4_concordance;
pub mod stage5_output;

pub trait Stage {
    fn name(&self) -> &'static str;
    fn run(&self, ctx: &mut Ctx) -> Result<()>;
}

pub struct Pipeline {
    stages: Vec<Box<dyn Stage>>,
}

impl Pipeline {
    pub fn new(stages: Vec<Box<dyn Stage>>) -> Self {
        Self { stages }
    }

    pub fn run(&self, ctx: &mut Ctx) -> Result<()> {
        info!(
            parallel = cfg!(feature = "mt"),
            threads = ctx.threads,
            "compute backend selected"
        );
        for stage in &self.stages {
            let start = Instant::now();
            info!(stage = stage.name(), "stage started");
            if let Err(err) = stage.run(ctx) {
                let elapsed_ms = start.elapsed().as_millis();
                warn!(
                    stage = stage.name(),
                    elapsed_ms = elapsed_ms as u64,
                    "stage failed"
                );
                return Err(err);
            }
            let elapsed_ms = start.elapsed().as_millis();
            info!(
                stage = stage.name(),
                elapsed_ms = elapsed_ms as u64,
                "stage finished"
            );
        }
        Ok(())
    }
}

/// Applies `f` to every patient, returning results in input order.
///
/// With the `mt` feature the work runs on a dedicated pool of `threads`
/// workers (0 = rayon default).
pub(crate) fn map_patients<T, F>(patients: &[String], threads: usize, f: F) -> Result<Vec<T>>
where
    T: Send,
    F: Fn(&str) -> T + Send + Sync,
{
    #[cfg(feature = "mt")]
    {
        let mut builder = rayon::ThreadPoolBuilder::new();
        if threads > 0 {
            builder = builder.num_threads(threads);
        }
        let pool = builder
            .build()
            .map_err(|e| anyhow::anyhow!("failed to build thread pool: {}", e))?;
        Ok(pool.install(|| patients.par_iter().map(|pid| f(pid)).collect()))
    }

    #[cfg(not(feature = "mt"))]
    {
        let _ = threads;
        Ok(patients.iter().map(|pid| f(pid)).collect())
    }
}
