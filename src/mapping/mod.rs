//! Cross-granularity mapping from Barzell (20-zone) labels to coarser layouts.
//!
//! Every 20-zone ID has exactly one [`ZoneRoute`] per granularity: a direct
//! coarse zone, a binary (half) split, a ratio-weighted (quarter) split, or no
//! mapping at all.

mod mapper;
mod ratio;

use std::collections::BTreeMap;

use crate::zones::{BARZELL_ZONES, Granularity};

pub use mapper::{ZoneMapper, sample_from_ratios};
pub use ratio::{RatioTable, compute_ratios};

type Members = &'static [(u8, &'static [u8])];

const OCTANT_MEMBERS: Members = &[
    (1, &[3, 9, 12]),
    (2, &[1, 7, 11]),
    (3, &[15, 19, 5, 12]),
    (4, &[13, 17, 5, 11]),
    (5, &[10, 4, 12]),
    (6, &[2, 8, 11]),
    (7, &[16, 20, 6, 12]),
    (8, &[14, 18, 6, 11]),
];
const OCTANT_HALF: &[u8] = &[5, 6];
const OCTANT_QUARTER: &[u8] = &[11, 12];

const QUADRANT_MEMBERS: Members = &[
    (1, &[3, 9, 12, 4, 10]),
    (2, &[1, 7, 11, 2, 8]),
    (3, &[15, 19, 5, 12, 20, 16, 6]),
    (4, &[14, 18, 6, 11, 13, 17, 5]),
];
const QUADRANT_HALF: &[u8] = &[5, 6, 11, 12];

const HEMI_MEMBERS: Members = &[
    (1, &[3, 5, 9, 12, 15, 19, 4, 6, 10, 16, 20]),
    (2, &[1, 2, 7, 8, 11, 14, 18, 13, 17, 5, 6]),
];
const HEMI_HALF: &[u8] = &[5, 6];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ZoneRoute {
    Direct(u8),
    Half(Vec<u8>),
    Quarter(Vec<u8>),
    Unmapped,
}

#[derive(Debug, Clone)]
pub struct MappingTables {
    granularity: Granularity,
    routes: Vec<ZoneRoute>,
}

impl MappingTables {
    pub fn build(granularity: Granularity) -> Self {
        let (members, half, quarter): (Members, &[u8], &[u8]) = match granularity {
            Granularity::Barzell => {
                let routes = (1..=BARZELL_ZONES as u8).map(ZoneRoute::Direct).collect();
                return Self {
                    granularity,
                    routes,
                };
            }
            Granularity::Octant => (OCTANT_MEMBERS, OCTANT_HALF, OCTANT_QUARTER),
            Granularity::Quadrant => (QUADRANT_MEMBERS, QUADRANT_HALF, &[]),
            Granularity::Hemi => (HEMI_MEMBERS, HEMI_HALF, &[]),
        };

        // Later coarse zones win when a fine zone is listed more than once.
        let mut reverse = [None; BARZELL_ZONES + 1];
        for (coarse, fines) in members {
            for &fine in *fines {
                reverse[fine as usize] = Some(*coarse);
            }
        }

        let candidates = |fine: u8| -> Vec<u8> {
            members
                .iter()
                .filter(|(_, fines)| fines.contains(&fine))
                .map(|(coarse, _)| *coarse)
                .collect()
        };

        let routes = (1..=BARZELL_ZONES as u8)
            .map(|fine| {
                if half.contains(&fine) {
                    ZoneRoute::Half(candidates(fine))
                } else if quarter.contains(&fine) {
                    ZoneRoute::Quarter(candidates(fine))
                } else {
                    reverse[fine as usize]
                        .map(ZoneRoute::Direct)
                        .unwrap_or(ZoneRoute::Unmapped)
                }
            })
            .collect();

        Self {
            granularity,
            routes,
        }
    }

    pub fn granularity(&self) -> Granularity {
        self.granularity
    }

    pub fn route(&self, fine: u8) -> Option<&ZoneRoute> {
        (fine as usize).checked_sub(1).and_then(|i| self.routes.get(i))
    }

    pub fn routes(&self) -> impl Iterator<Item = (u8, &ZoneRoute)> {
        self.routes.iter().enumerate().map(|(i, r)| ((i + 1) as u8, r))
    }

    /// Unambiguous 20-zone → coarse-zone entries.
    pub fn reverse_map(&self) -> BTreeMap<u8, u8> {
        self.routes()
            .filter_map(|(fine, r)| match r {
                ZoneRoute::Direct(c) => Some((fine, *c)),
                _ => None,
            })
            .collect()
    }

    /// 20-zone IDs split uniformly between candidate coarse zones.
    pub fn half_map(&self) -> BTreeMap<u8, Vec<u8>> {
        self.routes()
            .filter_map(|(fine, r)| match r {
                ZoneRoute::Half(c) => Some((fine, c.clone())),
                _ => None,
            })
            .collect()
    }

    /// 20-zone IDs split by measured overlap ratios (octant level only).
    pub fn quarter_map(&self) -> BTreeMap<u8, Vec<u8>> {
        self.routes()
            .filter_map(|(fine, r)| match r {
                ZoneRoute::Quarter(c) => Some((fine, c.clone())),
                _ => None,
            })
            .collect()
    }

    pub fn is_stochastic(&self) -> bool {
        self.routes
            .iter()
            .any(|r| matches!(r, ZoneRoute::Half(_) | ZoneRoute::Quarter(_)))
    }
}
