use crate::error::ZoneError;
use crate::mapping::{MappingTables, ZoneRoute};
use crate::volume::Volume;
use crate::zones::BARZELL_ZONES;

/// Per ambiguous 20-zone ID, the fraction of its volume falling inside each
/// candidate coarse zone, in candidate order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RatioTable {
    entries: Vec<Option<Vec<(u8, f64)>>>,
}

impl RatioTable {
    pub fn empty() -> Self {
        Self {
            entries: vec![None; BARZELL_ZONES],
        }
    }

    pub fn insert(&mut self, fine: u8, weights: Vec<(u8, f64)>) {
        if let Some(slot) = (fine as usize)
            .checked_sub(1)
            .and_then(|i| self.entries.get_mut(i))
        {
            *slot = Some(weights);
        }
    }

    pub fn weights(&self, fine: u8) -> Option<&[(u8, f64)]> {
        (fine as usize)
            .checked_sub(1)
            .and_then(|i| self.entries.get(i))
            .and_then(|e| e.as_deref())
    }

    pub fn ratio(&self, fine: u8, coarse: u8) -> Option<f64> {
        self.weights(fine)?
            .iter()
            .find(|(c, _)| *c == coarse)
            .map(|(_, r)| *r)
    }

    pub fn iter(&self) -> impl Iterator<Item = (u8, &[(u8, f64)])> {
        self.entries
            .iter()
            .enumerate()
            .filter_map(|(i, e)| e.as_deref().map(|w| ((i + 1) as u8, w)))
    }
}

/// Measures `|coarse == c AND fine == f| / |fine == f|` for every half and
/// quarter relation of `tables`. A fine zone with no voxels yields ratio 0.
pub fn compute_ratios(
    tables: &MappingTables,
    coarse_mask: &Volume<u8>,
    fine_mask: &Volume<u8>,
) -> Result<RatioTable, ZoneError> {
    coarse_mask.ensure_same_shape(fine_mask, "coarse vs 20-zone mask")?;

    let mut fine_counts = [0u64; BARZELL_ZONES + 1];
    let mut joint = vec![[0u64; 256]; BARZELL_ZONES + 1];
    for (&coarse, &fine) in coarse_mask.as_slice().iter().zip(fine_mask.as_slice()) {
        let f = fine as usize;
        if f == 0 || f > BARZELL_ZONES {
            continue;
        }
        fine_counts[f] += 1;
        joint[f][coarse as usize] += 1;
    }

    let mut table = RatioTable::empty();
    for (fine, route) in tables.routes() {
        let candidates = match route {
            ZoneRoute::Half(c) | ZoneRoute::Quarter(c) => c,
            _ => continue,
        };
        let total = fine_counts[fine as usize];
        let weights = candidates
            .iter()
            .map(|&coarse| {
                let ratio = if total == 0 {
                    0.0
                } else {
                    joint[fine as usize][coarse as usize] as f64 / total as f64
                };
                (coarse, ratio)
            })
            .collect();
        table.insert(fine, weights);
    }
    Ok(table)
}
