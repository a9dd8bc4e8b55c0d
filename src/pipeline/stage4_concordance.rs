use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::config::AnalysisConfig;
use crate::ctx::{Ctx, LevelReport};
use crate::input::PatientPaths;
use crate::io::mri_report::MriReport;
use crate::io::nifti;
use crate::io::tpm::BiopsyTable;
use crate::lesion::{self, LesionIouTable};
use crate::mapping::{MappingTables, RatioTable, ZoneMapper, compute_ratios};
use crate::math::stats::{IndicatorMatrix, Metrics, bootstrap_intervals, confusion_matrix};
use crate::pipeline::{Stage, map_patients};
use crate::rng::SeedStream;
use crate::rules::RuleSet;
use crate::schema::v1::ConcordanceRow;
use crate::volume::Volume;
use crate::zones::Granularity;

const CONFIDENCE: f64 = 0.95;

pub struct Stage4Concordance;

impl Stage4Concordance {
    pub fn new() -> Self {
        Self
    }
}

/// Everything one patient contributes for one (granularity, zone config).
struct PatientSources {
    current: Volume<u8>,
    fine: Volume<u8>,
    lesions: Volume<u32>,
    scores: Vec<f64>,
    biopsy: BiopsyTable,
}

/// Indicator rows of one patient.
struct PatientRows {
    /// `[pirads][iou]`: imaging indicator.
    imaging: Vec<Vec<Vec<u8>>>,
    /// `[pirads][definition]`: biopsy replicates.
    biopsy: Vec<Vec<Vec<Vec<u8>>>>,
    notes: Vec<String>,
}

enum PatientOutcome {
    Skipped(String),
    Ready(PatientRows),
}

/// Read-only inputs shared by every patient worker.
struct LevelJob<'a> {
    granularity: Granularity,
    zone_config: &'a str,
    config: &'a AnalysisConfig,
    tables: MappingTables,
    definitions: Vec<&'a RuleSet>,
    mri: &'a MriReport,
    seeds: SeedStream,
}

impl LevelJob<'_> {
    fn replicates(&self) -> usize {
        match self.granularity {
            Granularity::Barzell => 1,
            _ => self.config.sample_times,
        }
    }

    fn load(&self, pid: &str) -> Result<PatientSources, String> {
        let paths = PatientPaths::new(self.config, pid);

        let current_path = paths.zone_mask(self.granularity, self.zone_config);
        let fine_path = paths.zone_mask(Granularity::Barzell, self.zone_config);
        if !current_path.exists() || !fine_path.exists() {
            return Err("missing zone mask files".to_string());
        }
        let Some(scores) = self.mri.lookup(pid).map(<[f64]>::to_vec) else {
            return Err("not found in MRI report".to_string());
        };
        let biopsy_path = paths.biopsy();
        if !biopsy_path.exists() {
            return Err(format!("missing biopsy table {}", biopsy_path.display()));
        }

        let read_mask = |path: &std::path::Path| -> Result<Volume<u8>> {
            let (raw, _) = nifti::load_volume(path)?;
            Ok(raw.map(|v| if v.is_finite() && v > 0.0 { v.round() as u8 } else { 0 }))
        };
        let current = read_mask(&current_path).map_err(|e| format!("{:#}", e))?;
        let fine = if self.granularity == Granularity::Barzell {
            current.clone()
        } else {
            read_mask(&fine_path).map_err(|e| format!("{:#}", e))?
        };

        let lesion_path = paths.lesions();
        let lesions = if lesion_path.exists() {
            let (raw, _) = nifti::load_volume(&lesion_path).map_err(|e| format!("{:#}", e))?;
            lesion::to_label_volume(&raw)
        } else {
            debug!(patient = %pid, "no lesion mask, treating as lesion-free");
            Volume::zeros(current.dims())
        };

        let biopsy = BiopsyTable::load(&biopsy_path, &self.config.ccl_flag)
            .map_err(|e| format!("{:#}", e))?;

        Ok(PatientSources {
            current,
            fine,
            lesions,
            scores,
            biopsy,
        })
    }

    fn analyse(&self, pid: &str, src: &PatientSources) -> Result<PatientRows> {
        let mut notes = Vec::new();
        let n_zones = self.granularity.zone_count();

        let ratios = if self.tables.is_stochastic() {
            compute_ratios(&self.tables, &src.current, &src.fine)?
        } else {
            RatioTable::empty()
        };
        let mapper = ZoneMapper::new(&self.tables, &ratios);

        let unscored = lesion::unscored_labels(&src.lesions, src.scores.len());
        if unscored > 0 {
            notes.push(format!(
                "{}: {} lesion label(s) without an MRI report score ignored",
                pid, unscored
            ));
        }

        let mut positives = Vec::with_capacity(self.definitions.len());
        for rules in &self.definitions {
            positives.push(src.biopsy.zones_meeting(rules)?);
        }

        let mut imaging = Vec::with_capacity(self.config.pirads_thresholds.len());
        let mut biopsy = Vec::with_capacity(self.config.pirads_thresholds.len());
        for &pirads in &self.config.pirads_thresholds {
            let (filtered, kept) = lesion::filter_significant_lesions(&src.lesions, &src.scores, pirads);
            let table = LesionIouTable::compute(&filtered, &src.current, n_zones)?;
            debug!(patient = %pid, pirads, lesions = kept, "lesions matched to zones");
            imaging.push(
                self.config
                    .iou_thresholds
                    .iter()
                    .map(|&t| table.indicator(t))
                    .collect(),
            );

            let mut rng = self.seeds.patient(pid);
            biopsy.push(
                positives
                    .iter()
                    .map(|zones| mapper.sample_replicates(zones, self.replicates(), &mut rng))
                    .collect(),
            );
        }

        Ok(PatientRows {
            imaging,
            biopsy,
            notes,
        })
    }

    fn run_patient(&self, pid: &str) -> PatientOutcome {
        let src = match self.load(pid) {
            Ok(s) => s,
            Err(reason) => return PatientOutcome::Skipped(reason),
        };
        match self.analyse(pid, &src) {
            Ok(rows) => PatientOutcome::Ready(rows),
            Err(err) => PatientOutcome::Skipped(format!("{:#}", err)),
        }
    }
}

impl Stage for Stage4Concordance {
    fn name(&self) -> &'static str {
        "stage4_concordance"
    }

    fn run(&self, ctx: &mut Ctx) -> Result<()> {
        let rules = ctx.rules.as_ref().context("rules not loaded")?;
        let mri = ctx.mri.as_ref().context("MRI report not loaded")?;

        let mut definitions = Vec::with_capacity(ctx.config.cancer_definitions.len());
        for name in &ctx.config.cancer_definitions {
            definitions.push(rules.require(name)?);
        }

        let mut reports = Vec::new();
        let mut warnings = Vec::new();
        for &granularity in &ctx.levels {
            for zone_config in &ctx.config.zone_configs {
                info!(
                    level = granularity.level(),
                    zone_config = %zone_config,
                    "running concordance analysis"
                );
                let job = LevelJob {
                    granularity,
                    zone_config,
                    config: &ctx.config,
                    tables: MappingTables::build(granularity),
                    definitions: definitions.clone(),
                    mri,
                    seeds: ctx.seeds,
                };
                let outcomes =
                    map_patients(&ctx.patients, ctx.threads, |pid| job.run_patient(pid))?;

                let mut patients = Vec::new();
                let mut rows = Vec::new();
                for (pid, outcome) in ctx.patients.iter().zip(outcomes) {
                    match outcome {
                        PatientOutcome::Skipped(reason) => {
                            warn!(patient = %pid, reason = %reason, "skipping patient");
                            warnings.push(format!(
                                "{} (level {}, {}): {}",
                                pid,
                                granularity.level(),
                                zone_config,
                                reason
                            ));
                        }
                        PatientOutcome::Ready(r) => {
                            for note in &r.notes {
                                warn!("{}", note);
                            }
                            warnings.extend(r.notes.iter().cloned());
                            patients.push(pid.clone());
                            rows.push(r);
                        }
                    }
                }
                info!(
                    level = granularity.level(),
                    zone_config = %zone_config,
                    patients = patients.len(),
                    skipped = ctx.patients.len() - patients.len(),
                    "cohort assembled"
                );

                let level_rows = summarise(&job, &rows, &mut warnings)?;
                reports.push(LevelReport {
                    granularity,
                    zone_config: zone_config.clone(),
                    patients,
                    rows: level_rows,
                });
            }
        }

        ctx.reports = reports;
        ctx.warnings.extend(warnings);
        Ok(())
    }
}

fn summarise(
    job: &LevelJob<'_>,
    patients: &[PatientRows],
    warnings: &mut Vec<String>,
) -> Result<Vec<ConcordanceRow>> {
    let cfg = job.config;
    let n_zones = job.granularity.zone_count();
    let mut out = Vec::new();

    for (p, &pirads) in cfg.pirads_thresholds.iter().enumerate() {
        for (i, &iou) in cfg.iou_thresholds.iter().enumerate() {
            for (d, definition) in cfg.cancer_definitions.iter().enumerate() {
                let mut biopsy = IndicatorMatrix::new(n_zones);
                let mut imaging = IndicatorMatrix::new(n_zones);
                for rows in patients {
                    let replicates = &rows.biopsy[p][d];
                    for r in replicates {
                        biopsy.push_row(r)?;
                    }
                    imaging.push_repeated(&rows.imaging[p][i], replicates.len())?;
                }

                let cm = match confusion_matrix(&biopsy, &imaging) {
                    Ok(cm) => cm,
                    Err(err) => {
                        warn!(definition = %definition, error = %err, "skipping definition");
                        warnings.push(format!("{}: {}", definition, err));
                        continue;
                    }
                };
                let metrics = Metrics::from_confusion(&cm);
                let mut rng = job.seeds.bootstrap();
                let intervals =
                    bootstrap_intervals(&biopsy, &imaging, cfg.num_ci_iter, CONFIDENCE, &mut rng)?;

                let per_zone = |v: u64| v as f64 / n_zones as f64;
                info!(
                    definition = %definition,
                    pirads,
                    iou,
                    tp = cm.tp,
                    tn = cm.tn,
                    fp = cm.fp,
                    fn_ = cm.fn_,
                    "raw counts"
                );
                info!(
                    definition = %definition,
                    tp = %format!("{:.2}", per_zone(cm.tp)),
                    tn = %format!("{:.2}", per_zone(cm.tn)),
                    fp = %format!("{:.2}", per_zone(cm.fp)),
                    fn_ = %format!("{:.2}", per_zone(cm.fn_)),
                    "average per zone"
                );
                info!(
                    definition = %definition,
                    sensitivity = %format!("{:.2}", metrics.sensitivity),
                    specificity = %format!("{:.2}", metrics.specificity),
                    ppv = %format!("{:.2}", metrics.ppv),
                    npv = %format!("{:.2}", metrics.npv),
                    "metrics"
                );

                out.push(ConcordanceRow::new(
                    definition, pirads, iou, &cm, &metrics, &intervals,
                ));
            }
        }
    }
    Ok(out)
}
