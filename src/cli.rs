use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::ConfigOverrides;

#[derive(Debug, Parser)]
#[command(
    name = "kira-zonemap",
    version,
    about = "Prostate zone partitioning and MRI/biopsy zone concordance"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Write per-patient zone masks for each granularity.
    Zones(ZonesArgs),
    /// Compare MRI lesions with biopsy findings zone by zone.
    Analyze(AnalyzeArgs),
    /// Check which patients have every input the analysis needs.
    Validate(ValidateArgs),
}

#[derive(Debug, Args)]
pub struct CommonArgs {
    #[arg(long, help = "Analysis config (YAML); built-in defaults when omitted")]
    pub config: Option<PathBuf>,

    #[arg(
        long = "level",
        num_args = 1..,
        help = "Zone granularity: 20, 8, 4 or 2 (repeatable, default all)"
    )]
    pub levels: Vec<u32>,

    #[arg(long, help = "Directory holding one sub-directory per patient")]
    pub nii_dir: Option<PathBuf>,

    #[arg(long, help = "MRI report CSV (patientID, les_all)")]
    pub mri_report: Option<PathBuf>,

    #[arg(long, help = "Directory of per-patient biopsy CSVs")]
    pub tpm_dir: Option<PathBuf>,

    #[arg(long, help = "Cancer definition rules (YAML)")]
    pub rules: Option<PathBuf>,

    #[arg(long, help = "Zone configuration file (YAML)")]
    pub zone_config: Option<PathBuf>,

    #[arg(long = "zone-set", help = "Zone configuration name (repeatable)")]
    pub zone_sets: Vec<String>,

    #[arg(long)]
    pub seed: Option<u64>,

    #[arg(long, help = "Mapper replicates per patient at coarse levels")]
    pub sample_times: Option<usize>,

    #[arg(long, help = "Bootstrap iterations for confidence intervals")]
    pub ci_iter: Option<usize>,

    #[arg(long, default_value_t = 0, help = "Number of threads (0 = auto)")]
    pub threads: usize,
}

impl CommonArgs {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            nii_dir: self.nii_dir.clone(),
            mri_report: self.mri_report.clone(),
            tpm_dir: self.tpm_dir.clone(),
            rules_file: self.rules.clone(),
            zone_config_file: self.zone_config.clone(),
            seed: self.seed,
            sample_times: self.sample_times,
            num_ci_iter: self.ci_iter,
            zone_configs: self.zone_sets.clone(),
        }
    }
}

#[derive(Debug, Args)]
pub struct ZonesArgs {
    #[command(flatten)]
    pub common: CommonArgs,
}

#[derive(Debug, Args)]
pub struct AnalyzeArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    #[arg(long, help = "Output directory for report tables")]
    pub out: PathBuf,

    #[arg(long, default_value_t = false, help = "Also write JSON reports")]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub common: CommonArgs,
}
