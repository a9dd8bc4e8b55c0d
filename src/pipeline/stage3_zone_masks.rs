use anyhow::{Result, bail};
use tracing::{info, warn};

use crate::ctx::{Ctx, ZoneMaskRun};
use crate::input::PatientPaths;
use crate::io::nifti;
use crate::pipeline::{Stage, map_patients};
use crate::zones::{self, Granularity, ZoneConfig};

pub struct Stage3ZoneMasks;

impl Stage3ZoneMasks {
    pub fn new() -> Self {
        Self
    }
}

/// Result of one patient across every requested (granularity, config).
enum PatientMasks {
    Skipped(String),
    Written(Vec<MaskResult>),
}

enum MaskResult {
    Written { unassigned: usize },
    Failed(String),
}

fn generate_for_patient(
    paths: &PatientPaths,
    jobs: &[(Granularity, String, ZoneConfig)],
) -> PatientMasks {
    let image_path = paths.image();
    if !image_path.exists() {
        return PatientMasks::Skipped("reference image does not exist".to_string());
    }
    let gland_path = paths.gland();
    if !gland_path.exists() {
        return PatientMasks::Skipped("gland mask does not exist".to_string());
    }

    let loaded = nifti::load_volume(&image_path)
        .and_then(|(image, geometry)| Ok((image, geometry, nifti::load_volume(&gland_path)?.0)));
    let (image, geometry, gland) = match loaded {
        Ok(v) => v,
        Err(err) => return PatientMasks::Skipped(format!("{:#}", err)),
    };
    let bbox = match zones::bbox_range(&image, &gland) {
        Ok(b) => b,
        Err(err) => return PatientMasks::Skipped(err.to_string()),
    };

    let results = jobs
        .iter()
        .map(|(granularity, name, config)| {
            let limits = zones::zone_limits(*granularity, config, &bbox);
            let mask = zones::label_zones(&gland, &limits, &bbox);
            let unassigned = zones::count_unassigned(&gland, &mask);
            let out = paths.zone_mask(*granularity, name);
            match nifti::save_volume(&out, &mask, &geometry) {
                Ok(()) => MaskResult::Written { unassigned },
                Err(err) => MaskResult::Failed(format!("{:#}", err)),
            }
        })
        .collect();
    PatientMasks::Written(results)
}

impl Stage for Stage3ZoneMasks {
    fn name(&self) -> &'static str {
        "stage3_zone_masks"
    }

    fn run(&self, ctx: &mut Ctx) -> Result<()> {
        let mut jobs = Vec::new();
        for &granularity in &ctx.levels {
            for name in &ctx.config.zone_configs {
                let config = ctx.zone_configs.require(name)?.clone();
                jobs.push((granularity, name.clone(), config));
            }
        }
        if jobs.is_empty() {
            bail!("nothing to generate");
        }

        let config = &ctx.config;
        let outcomes = map_patients(&ctx.patients, ctx.threads, |pid| {
            generate_for_patient(&PatientPaths::new(config, pid), &jobs)
        })?;

        let mut runs: Vec<ZoneMaskRun> = jobs
            .iter()
            .map(|(granularity, name, _)| ZoneMaskRun {
                granularity: *granularity,
                zone_config: name.clone(),
                written: 0,
                skipped: 0,
                unassigned_voxels: 0,
            })
            .collect();

        let patients = ctx.patients.clone();
        for (pid, outcome) in patients.iter().zip(outcomes) {
            match outcome {
                PatientMasks::Skipped(reason) => {
                    warn!(patient = %pid, reason = %reason, "skipping patient");
                    ctx.warn(format!("{}: {}", pid, reason));
                    for run in runs.iter_mut() {
                        run.skipped += 1;
                    }
                }
                PatientMasks::Written(results) => {
                    for (run, result) in runs.iter_mut().zip(results) {
                        match result {
                            MaskResult::Written { unassigned } => {
                                run.written += 1;
                                run.unassigned_voxels += unassigned;
                                if unassigned > 0 {
                                    warn!(
                                        patient = %pid,
                                        level = run.granularity.level(),
                                        zone_config = %run.zone_config,
                                        unassigned,
                                        "gland voxels left without a zone"
                                    );
                                    ctx.warnings.push(format!(
                                        "{}: {} gland voxels unassigned at level {} ({})",
                                        pid,
                                        unassigned,
                                        run.granularity.level(),
                                        run.zone_config
                                    ));
                                }
                            }
                            MaskResult::Failed(reason) => {
                                run.skipped += 1;
                                warn!(patient = %pid, reason = %reason, "zone mask not written");
                                ctx.warnings.push(format!("{}: {}", pid, reason));
                            }
                        }
                    }
                }
            }
        }

        for run in &runs {
            info!(
                level = run.granularity.level(),
                zone_config = %run.zone_config,
                written = run.written,
                skipped = run.skipped,
                "zone masks generated"
            );
        }
        ctx.zone_runs = runs;
        Ok(())
    }
}
