//! Matching imaging lesions against zone masks.

use std::collections::BTreeMap;

use crate::error::ZoneError;
use crate::volume::Volume;

/// Converts a label volume read as floating point into integer lesion IDs.
/// Negative or non-finite values are background.
pub fn to_label_volume(raw: &Volume<f32>) -> Volume<u32> {
    raw.map(|v| {
        if v.is_finite() && v > 0.0 {
            v.round() as u32
        } else {
            0
        }
    })
}

/// Keeps lesions whose score meets `threshold` and relabels them `1..=K` in
/// ascending original-label order. Label `k` is scored by `scores[k - 1]`;
/// labels without a score are dropped.
pub fn filter_significant_lesions(
    lesions: &Volume<u32>,
    scores: &[f64],
    threshold: f64,
) -> (Volume<u32>, usize) {
    let mut remap = vec![0u32; scores.len() + 1];
    let mut kept = 0u32;
    for (i, &score) in scores.iter().enumerate() {
        if score >= threshold {
            kept += 1;
            remap[i + 1] = kept;
        }
    }
    let relabeled = lesions.map(|label| remap.get(label as usize).copied().unwrap_or(0));
    (relabeled, kept as usize)
}

/// Number of lesion labels present with no matching score.
pub fn unscored_labels(lesions: &Volume<u32>, n_scores: usize) -> usize {
    let max = lesions.as_slice().iter().copied().max().unwrap_or(0) as usize;
    max.saturating_sub(n_scores)
}

/// IoU of every (lesion, zone) pair, computed in a single pass.
#[derive(Debug, Clone)]
pub struct LesionIouTable {
    n_zones: usize,
    // Row k-1 holds lesion k; column z-1 holds zone z.
    iou: Vec<Vec<f64>>,
}

impl LesionIouTable {
    pub fn compute(
        lesions: &Volume<u32>,
        zones: &Volume<u8>,
        n_zones: usize,
    ) -> Result<Self, ZoneError> {
        lesions.ensure_same_shape(zones, "lesion mask vs zone mask")?;

        let n_lesions = lesions.as_slice().iter().copied().max().unwrap_or(0) as usize;
        let mut lesion_size = vec![0u64; n_lesions + 1];
        let mut zone_size = vec![0u64; n_zones + 1];
        let mut inter = vec![vec![0u64; n_zones + 1]; n_lesions + 1];

        for (&les, &zone) in lesions.as_slice().iter().zip(zones.as_slice()) {
            let les = les as usize;
            let zone = zone as usize;
            let zone_valid = zone >= 1 && zone <= n_zones;
            if les > 0 {
                lesion_size[les] += 1;
            }
            if zone_valid {
                zone_size[zone] += 1;
            }
            if les > 0 && zone_valid {
                inter[les][zone] += 1;
            }
        }

        let iou = (1..=n_lesions)
            .map(|k| {
                (1..=n_zones)
                    .map(|z| {
                        let i = inter[k][z];
                        let union = lesion_size[k] + zone_size[z] - i;
                        if union == 0 {
                            0.0
                        } else {
                            i as f64 / union as f64
                        }
                    })
                    .collect()
            })
            .collect();

        Ok(Self { n_zones, iou })
    }

    pub fn n_lesions(&self) -> usize {
        self.iou.len()
    }

    pub fn n_zones(&self) -> usize {
        self.n_zones
    }

    pub fn iou(&self, lesion: u32, zone: u8) -> f64 {
        (lesion as usize)
            .checked_sub(1)
            .and_then(|k| self.iou.get(k))
            .and_then(|row| (zone as usize).checked_sub(1).and_then(|z| row.get(z)))
            .copied()
            .unwrap_or(0.0)
    }

    /// For each lesion, the zones whose IoU strictly exceeds `threshold`.
    pub fn overlapping(&self, threshold: f64) -> BTreeMap<u32, Vec<u8>> {
        self.iou
            .iter()
            .enumerate()
            .map(|(k, row)| {
                let zones = row
                    .iter()
                    .enumerate()
                    .filter(|(_, v)| **v > threshold)
                    .map(|(z, _)| (z + 1) as u8)
                    .collect();
                ((k + 1) as u32, zones)
            })
            .collect()
    }

    /// Zone-level indicator: 1 where any lesion overlaps above `threshold`.
    pub fn indicator(&self, threshold: f64) -> Vec<u8> {
        let mut out = vec![0u8; self.n_zones];
        for row in &self.iou {
            for (z, &v) in row.iter().enumerate() {
                if v > threshold {
                    out[z] = 1;
                }
            }
        }
        out
    }
}

/// Zones occupied by each lesion above the IoU threshold.
pub fn lesion_zone_overlaps(
    lesions: &Volume<u32>,
    zones: &Volume<u8>,
    n_zones: usize,
    threshold: f64,
) -> Result<BTreeMap<u32, Vec<u8>>, ZoneError> {
    Ok(LesionIouTable::compute(lesions, zones, n_zones)?.overlapping(threshold))
}

/// IoU of the foreground (non-zero) regions of two masks.
pub fn iou_3d<T, U>(a: &Volume<T>, b: &Volume<U>) -> Result<f64, ZoneError>
where
    T: Copy + Default + PartialEq,
    U: Copy + Default + PartialEq,
{
    a.ensure_same_shape(b, "iou operands")?;
    let (ta, tb) = (T::default(), U::default());
    let mut inter = 0u64;
    let mut union = 0u64;
    for (&va, &vb) in a.as_slice().iter().zip(b.as_slice()) {
        let (fa, fb) = (va != ta, vb != tb);
        if fa && fb {
            inter += 1;
        }
        if fa || fb {
            union += 1;
        }
    }
    Ok(if union == 0 {
        0.0
    } else {
        inter as f64 / union as f64
    })
}
