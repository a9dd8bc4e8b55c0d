//! MRI report: one row per lesion, scored by `les_all`.

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use csv::ReaderBuilder;

#[derive(Debug, Clone, Default)]
pub struct MriReport {
    scores: BTreeMap<String, Vec<f64>>,
}

impl MriReport {
    pub fn load(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)
            .with_context(|| format!("failed to open MRI report {}", path.display()))?;
        Self::from_reader(file).with_context(|| format!("invalid MRI report {}", path.display()))
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);
        let headers = reader.headers()?.clone();
        let find = |name: &str| headers.iter().position(|h| h.trim() == name);
        let pid_col = find("patientID").context("missing column 'patientID'")?;
        let score_col = find("les_all").context("missing column 'les_all'")?;

        let mut scores: BTreeMap<String, Vec<f64>> = BTreeMap::new();
        for record in reader.records() {
            let record = record?;
            let Some(pid) = record.get(pid_col).map(str::trim).filter(|p| !p.is_empty()) else {
                continue;
            };
            let entry = scores.entry(pid.to_string()).or_default();
            let score = record
                .get(score_col)
                .map(str::trim)
                .and_then(|s| s.parse::<f64>().ok())
                .filter(|v| !v.is_nan());
            if let Some(score) = score {
                entry.push(score);
            }
        }
        Ok(Self { scores })
    }

    pub fn insert(&mut self, patient_id: impl Into<String>, scores: Vec<f64>) {
        self.scores.insert(patient_id.into(), scores);
    }

    /// Lesion significance scores in report order; lesion label `k` is
    /// scored by element `k - 1`. `None` when the patient is not reported.
    pub fn lookup(&self, patient_id: &str) -> Option<&[f64]> {
        self.scores.get(patient_id).map(Vec::as_slice)
    }

    pub fn contains(&self, patient_id: &str) -> bool {
        self.scores.contains_key(patient_id)
    }

    pub fn n_patients(&self) -> usize {
        self.scores.len()
    }
}
