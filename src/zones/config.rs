use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::ZoneError;

const SPLIT_SUM_TOLERANCE: f64 = 1e-6;

/// Fractional cutoffs that place the zone boundaries inside the gland bounding box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ZoneConfig {
    pub apex: f64,
    pub anterior_cutoff: f64,
    pub left_right: f64,
    pub anterior: Vec<f64>,
    pub posterior: Vec<f64>,
}

impl ZoneConfig {
    pub fn validate(&self) -> Result<(), ZoneError> {
        for (name, value) in [
            ("apex", self.apex),
            ("anterior-cutoff", self.anterior_cutoff),
            ("left-right", self.left_right),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ZoneError::InvalidConfig(format!(
                    "{} must be in [0,1], got {}",
                    name, value
                )));
            }
        }
        validate_split("anterior", &self.anterior)?;
        validate_split("posterior", &self.posterior)?;
        Ok(())
    }

    pub fn anterior_cumulative(&self) -> Vec<f64> {
        cumulative(&self.anterior)
    }

    pub fn posterior_cumulative(&self) -> Vec<f64> {
        cumulative(&self.posterior)
    }
}

fn validate_split(name: &str, ratios: &[f64]) -> Result<(), ZoneError> {
    if ratios.is_empty() {
        return Err(ZoneError::InvalidConfig(format!(
            "{} split list is empty",
            name
        )));
    }
    if let Some(bad) = ratios.iter().find(|r| !r.is_finite() || **r < 0.0) {
        return Err(ZoneError::InvalidConfig(format!(
            "{} split ratio {} is negative or not finite",
            name, bad
        )));
    }
    let total: f64 = ratios.iter().sum();
    if (total - 1.0).abs() > SPLIT_SUM_TOLERANCE {
        return Err(ZoneError::InvalidConfig(format!(
            "{} split ratios sum to {}, expected 1",
            name, total
        )));
    }
    Ok(())
}

fn cumulative(ratios: &[f64]) -> Vec<f64> {
    let mut acc = 0.0;
    ratios
        .iter()
        .map(|r| {
            acc += r;
            acc
        })
        .collect()
}

#[derive(Debug, Clone, Default)]
pub struct ZoneConfigSet {
    configs: BTreeMap<String, ZoneConfig>,
}

impl ZoneConfigSet {
    pub fn get(&self, name: &str) -> Option<&ZoneConfig> {
        self.configs.get(name)
    }

    pub fn require(&self, name: &str) -> Result<&ZoneConfig> {
        self.configs
            .get(name)
            .with_context(|| format!("zone configuration '{}' not defined", name))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.configs.keys().map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.configs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }

    pub fn insert(&mut self, name: impl Into<String>, config: ZoneConfig) {
        self.configs.insert(name.into(), config);
    }
}

pub fn load_zone_configs(path: &Path) -> Result<ZoneConfigSet> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read zone config {}", path.display()))?;
    parse_zone_configs(&content, &path.display().to_string())
}

pub fn parse_zone_configs(content: &str, source: &str) -> Result<ZoneConfigSet> {
    let configs: BTreeMap<String, ZoneConfig> = serde_yaml::from_str(content)
        .with_context(|| format!("{}: malformed zone configuration YAML", source))?;
    for (name, cfg) in &configs {
        cfg.validate()
            .with_context(|| format!("{}: zone configuration '{}'", source, name))?;
    }
    Ok(ZoneConfigSet { configs })
}
