//! Geometric zone partitioning of the gland volume.
//!
//! A [`ZoneLimits`] table maps zone IDs `1..=N` to closed, axis-aligned
//! voxel boxes. Boxes may overlap; a voxel belongs to the first zone (by
//! ascending ID) whose box contains it.

mod config;
mod label;
mod partition;

use std::fmt;

use crate::error::ZoneError;

pub use config::{ZoneConfig, ZoneConfigSet, load_zone_configs, parse_zone_configs};
pub use label::{bbox_range, count_unassigned, label_zones};
pub use partition::{round_half_even, zone_limits};

pub const BARZELL_ZONES: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Granularity {
    Barzell,
    Octant,
    Quadrant,
    Hemi,
}

impl Granularity {
    pub const ALL: [Granularity; 4] = [
        Granularity::Barzell,
        Granularity::Octant,
        Granularity::Quadrant,
        Granularity::Hemi,
    ];

    pub fn from_level(level: u32) -> Result<Self, ZoneError> {
        match level {
            20 => Ok(Self::Barzell),
            8 => Ok(Self::Octant),
            4 => Ok(Self::Quadrant),
            2 => Ok(Self::Hemi),
            other => Err(ZoneError::UnsupportedGranularity(other)),
        }
    }

    pub fn zone_count(self) -> usize {
        match self {
            Self::Barzell => 20,
            Self::Octant => 8,
            Self::Quadrant => 4,
            Self::Hemi => 2,
        }
    }

    pub fn level(self) -> u32 {
        self.zone_count() as u32
    }

    /// Filename fragment used for analysis reports.
    pub fn report_label(self) -> &'static str {
        match self {
            Self::Barzell => "barzell_zone_level",
            Self::Octant => "8_level",
            Self::Quadrant => "4_level",
            Self::Hemi => "2_level",
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.level())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    pub x_min: usize,
    pub x_max: usize,
    pub y_min: usize,
    pub y_max: usize,
    pub z_min: usize,
    pub z_max: usize,
}

impl BoundingBox {
    pub fn new(
        x_min: usize,
        x_max: usize,
        y_min: usize,
        y_max: usize,
        z_min: usize,
        z_max: usize,
    ) -> Self {
        Self {
            x_min,
            x_max,
            y_min,
            y_max,
            z_min,
            z_max,
        }
    }

    pub fn x(&self) -> AxisRange {
        AxisRange::new(self.x_min as i64, self.x_max as i64)
    }

    pub fn y(&self) -> AxisRange {
        AxisRange::new(self.y_min as i64, self.y_max as i64)
    }

    pub fn z(&self) -> AxisRange {
        AxisRange::new(self.z_min as i64, self.z_max as i64)
    }
}

/// Closed interval `[lo, hi]` of voxel indices. Empty when `lo > hi`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisRange {
    pub lo: i64,
    pub hi: i64,
}

impl AxisRange {
    pub fn new(lo: i64, hi: i64) -> Self {
        Self { lo, hi }
    }

    #[inline]
    pub fn contains(&self, v: i64) -> bool {
        self.lo <= v && v <= self.hi
    }

    pub fn is_empty(&self) -> bool {
        self.lo > self.hi
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZoneBox {
    pub x: AxisRange,
    pub y: AxisRange,
    pub z: AxisRange,
}

impl ZoneBox {
    #[inline]
    pub fn contains(&self, x: i64, y: i64, z: i64) -> bool {
        self.x.contains(x) && self.y.contains(y) && self.z.contains(z)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ZoneLimits {
    granularity: Granularity,
    boxes: Vec<ZoneBox>,
}

impl ZoneLimits {
    pub(crate) fn new(granularity: Granularity, boxes: Vec<ZoneBox>) -> Self {
        debug_assert_eq!(boxes.len(), granularity.zone_count());
        Self { granularity, boxes }
    }

    pub fn granularity(&self) -> Granularity {
        self.granularity
    }

    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    /// Box of zone `id` (1-based).
    pub fn zone(&self, id: u8) -> Option<&ZoneBox> {
        (id as usize).checked_sub(1).and_then(|i| self.boxes.get(i))
    }

    /// First zone, by ascending ID, whose box contains the voxel.
    pub fn first_match(&self, x: i64, y: i64, z: i64) -> Option<u8> {
        self.boxes
            .iter()
            .position(|b| b.contains(x, y, z))
            .map(|i| (i + 1) as u8)
    }
}
