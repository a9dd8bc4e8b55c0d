//! Template-mapped biopsy (TPM) tables, one CSV per patient.

use std::collections::{HashMap, HashSet};
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use csv::{ReaderBuilder, StringRecord};
use tracing::warn;

use crate::rules::{RuleError, RuleSet};
use crate::zones::BARZELL_ZONES;

/// Stand-in for missing values in a rule record.
pub const MISSING_VALUE: f64 = -99.0;

#[derive(Debug, Clone, PartialEq)]
pub struct BiopsyCore {
    pub zone_id: Option<i64>,
    pub cancer_present: bool,
    pub primary_gleason: Option<f64>,
    pub secondary_gleason: Option<f64>,
    pub core_length: Option<f64>,
}

#[derive(Debug, Clone, Default)]
pub struct BiopsyTable {
    cores: Vec<BiopsyCore>,
}

struct Columns {
    zone_id: usize,
    present: usize,
    primary: Option<usize>,
    secondary: Option<usize>,
    core_length: Option<usize>,
}

impl Columns {
    fn locate(headers: &StringRecord, ccl_flag: &str) -> Result<Self> {
        let find = |name: &str| headers.iter().position(|h| h.trim() == name);
        let length_col = format!("maxcc{}", ccl_flag);
        Ok(Self {
            zone_id: find("zone_id").context("missing column 'zone_id'")?,
            present: find("zprescancer").context("missing column 'zprescancer'")?,
            primary: find("zprimgleason"),
            secondary: find("zsecondgleason"),
            core_length: find(&length_col),
        })
    }
}

fn parse_number(record: &StringRecord, col: Option<usize>) -> Option<f64> {
    let raw = record.get(col?)?.trim();
    if raw.is_empty() {
        return None;
    }
    raw.parse::<f64>().ok().filter(|v| !v.is_nan())
}

impl BiopsyTable {
    pub fn load(path: &Path, ccl_flag: &str) -> Result<Self> {
        let reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(path)
            .with_context(|| format!("failed to open biopsy table {}", path.display()))?;
        Self::from_csv(reader, ccl_flag)
            .with_context(|| format!("invalid biopsy table {}", path.display()))
    }

    pub fn from_reader<R: Read>(reader: R, ccl_flag: &str) -> Result<Self> {
        let reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);
        Self::from_csv(reader, ccl_flag)
    }

    fn from_csv<R: Read>(mut reader: csv::Reader<R>, ccl_flag: &str) -> Result<Self> {
        let headers = reader.headers()?.clone();
        let cols = Columns::locate(&headers, ccl_flag)?;

        let mut cores = Vec::new();
        for record in reader.records() {
            let record = record?;
            cores.push(BiopsyCore {
                zone_id: parse_number(&record, Some(cols.zone_id)).map(|v| v as i64),
                cancer_present: parse_number(&record, Some(cols.present)) == Some(1.0),
                primary_gleason: parse_number(&record, cols.primary),
                secondary_gleason: parse_number(&record, cols.secondary),
                core_length: parse_number(&record, cols.core_length),
            });
        }
        Ok(Self { cores })
    }

    pub fn len(&self) -> usize {
        self.cores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cores.is_empty()
    }

    /// Zones with cancer present, in file order without duplicates.
    /// Zone IDs outside `1..=20` are dropped with a warning.
    pub fn positive_zones(&self) -> Vec<u8> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for core in self.cores.iter().filter(|c| c.cancer_present) {
            let Some(zone) = core.zone_id else { continue };
            if !(1..=BARZELL_ZONES as i64).contains(&zone) {
                warn!(zone_id = zone, "biopsy zone outside 1..=20 dropped");
                continue;
            }
            if seen.insert(zone) {
                out.push(zone as u8);
            }
        }
        out
    }

    /// Rule record (`gg1`, `gg2`, `ccl`) for the first core of `zone`.
    pub fn record(&self, zone: u8) -> HashMap<String, f64> {
        let core = self
            .cores
            .iter()
            .find(|c| c.zone_id == Some(zone as i64));
        let value = |f: fn(&BiopsyCore) -> Option<f64>| core.and_then(f).unwrap_or(MISSING_VALUE);
        HashMap::from([
            ("gg1".to_string(), value(|c| c.primary_gleason)),
            ("gg2".to_string(), value(|c| c.secondary_gleason)),
            ("ccl".to_string(), value(|c| c.core_length)),
        ])
    }

    /// Positive zones whose rule result is `"1"` under `rules`.
    pub fn zones_meeting(&self, rules: &RuleSet) -> Result<Vec<u8>, RuleError> {
        let mut out = Vec::new();
        for zone in self.positive_zones() {
            if rules.is_positive(&self.record(zone))? {
                out.push(zone);
            }
        }
        Ok(out)
    }
}
