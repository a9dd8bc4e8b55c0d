use rand::Rng;
use rand::seq::SliceRandom;

use crate::mapping::{MappingTables, RatioTable, ZoneRoute};

pub struct ZoneMapper<'a> {
    tables: &'a MappingTables,
    ratios: &'a RatioTable,
}

impl<'a> ZoneMapper<'a> {
    pub fn new(tables: &'a MappingTables, ratios: &'a RatioTable) -> Self {
        Self { tables, ratios }
    }

    pub fn zone_count(&self) -> usize {
        self.tables.granularity().zone_count()
    }

    /// Maps one 20-zone label to the coarse granularity.
    ///
    /// Half routes are a coin flip between the candidates, quarter routes are
    /// sampled by inverse CDF over the measured overlap ratios, and direct
    /// routes are deterministic. `None` means the zone has no coarse mapping.
    pub fn map_zone<R: Rng + ?Sized>(&self, fine: u8, rng: &mut R) -> Option<u8> {
        match self.tables.route(fine)? {
            ZoneRoute::Half(candidates) => candidates.choose(rng).copied(),
            ZoneRoute::Quarter(candidates) => {
                if candidates.is_empty() {
                    return None;
                }
                let u: f64 = rng.r#gen();
                match self.ratios.weights(fine) {
                    Some(weights) => sample_from_ratios(weights, u),
                    None => candidates.last().copied(),
                }
            }
            ZoneRoute::Direct(coarse) => Some(*coarse),
            ZoneRoute::Unmapped => None,
        }
    }

    /// One replicate indicator vector for a set of positive 20-zone labels.
    pub fn sample_indicator<R: Rng + ?Sized>(&self, positives: &[u8], rng: &mut R) -> Vec<u8> {
        let mut out = vec![0u8; self.zone_count()];
        for &fine in positives {
            if let Some(coarse) = self.map_zone(fine, rng) {
                if let Some(slot) = (coarse as usize).checked_sub(1).and_then(|i| out.get_mut(i)) {
                    *slot = 1;
                }
            }
        }
        out
    }

    /// `times` independent replicate draws, in draw order.
    pub fn sample_replicates<R: Rng + ?Sized>(
        &self,
        positives: &[u8],
        times: usize,
        rng: &mut R,
    ) -> Vec<Vec<u8>> {
        (0..times)
            .map(|_| self.sample_indicator(positives, rng))
            .collect()
    }
}

/// Picks the first candidate whose cumulative ratio exceeds `u`, clamping to
/// the last candidate when the ratios sum to less than `u`.
pub fn sample_from_ratios(weights: &[(u8, f64)], u: f64) -> Option<u8> {
    let (last, _) = weights.last()?;
    let mut cumulative = 0.0;
    for &(coarse, ratio) in weights {
        cumulative += ratio;
        if cumulative > u {
            return Some(coarse);
        }
    }
    Some(*last)
}
