use std::path::PathBuf;

use crate::config::AnalysisConfig;
use crate::io::mri_report::MriReport;
use crate::rng::SeedStream;
use crate::rules::RuleBook;
use crate::schema::v1::ConcordanceRow;
use crate::zones::{Granularity, ZoneConfigSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Zones,
    Analyze,
    Validate,
}

impl Command {
    /// Whether the command reads the MRI report and biopsy rules.
    pub fn needs_clinical_sources(self) -> bool {
        matches!(self, Self::Analyze | Self::Validate)
    }
}

/// Zone masks written for one (granularity, zone configuration).
#[derive(Debug, Clone, PartialEq)]
pub struct ZoneMaskRun {
    pub granularity: Granularity,
    pub zone_config: String,
    pub written: usize,
    pub skipped: usize,
    pub unassigned_voxels: usize,
}

/// Concordance rows for one (granularity, zone configuration).
#[derive(Debug, Clone)]
pub struct LevelReport {
    pub granularity: Granularity,
    pub zone_config: String,
    pub patients: Vec<String>,
    pub rows: Vec<ConcordanceRow>,
}

#[derive(Debug)]
pub struct Ctx {
    pub command: Command,
    pub config: AnalysisConfig,
    pub levels: Vec<Granularity>,
    pub out_dir: PathBuf,
    pub write_json: bool,
    pub threads: usize,
    pub tool_version: String,
    pub seeds: SeedStream,
    pub patients: Vec<String>,
    pub zone_configs: ZoneConfigSet,
    pub rules: Option<RuleBook>,
    pub mri: Option<MriReport>,
    pub zone_runs: Vec<ZoneMaskRun>,
    pub reports: Vec<LevelReport>,
    pub written: Vec<PathBuf>,
    pub warnings: Vec<String>,
}

impl Ctx {
    pub fn new(
        command: Command,
        config: AnalysisConfig,
        levels: Vec<Granularity>,
        out_dir: PathBuf,
        write_json: bool,
        tool_version: &str,
    ) -> Self {
        let seeds = SeedStream::new(config.seed);
        Self {
            command,
            config,
            levels,
            out_dir,
            write_json,
            threads: 0,
            tool_version: tool_version.to_string(),
            seeds,
            patients: Vec::new(),
            zone_configs: ZoneConfigSet::default(),
            rules: None,
            mri: None,
            zone_runs: Vec::new(),
            reports: Vec::new(),
            written: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Records a non-fatal problem for the end-of-run summary.
    pub fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }
}
