use crate::zones::{AxisRange, BoundingBox, Granularity, ZoneBox, ZoneConfig, ZoneLimits};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Height {
    Apex,
    Base,
    Full,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Depth {
    Anterior,
    Posterior,
    Full,
}

/// Lateral placement of a zone. Right is the low-x side of the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lateral {
    RightBand,
    LeftBand,
    AnteriorPair(usize),
    PosteriorPair(usize),
    RightHalf,
    LeftHalf,
    Full,
}

#[derive(Debug, Clone, Copy)]
struct ZoneShape {
    height: Height,
    depth: Depth,
    lateral: Lateral,
}

const fn shape(height: Height, depth: Depth, lateral: Lateral) -> ZoneShape {
    ZoneShape {
        height,
        depth,
        lateral,
    }
}

use Depth::{Anterior, Posterior};
use Height::{Apex, Base};
use Lateral::{AnteriorPair, LeftHalf, PosteriorPair, RightHalf};

// Canonical Barzell table, zone IDs 1..=20.
const BARZELL: [ZoneShape; 20] = [
    shape(Apex, Anterior, AnteriorPair(2)),
    shape(Base, Anterior, AnteriorPair(2)),
    shape(Apex, Anterior, AnteriorPair(1)),
    shape(Base, Anterior, AnteriorPair(1)),
    shape(Apex, Posterior, PosteriorPair(2)),
    shape(Base, Posterior, PosteriorPair(2)),
    shape(Apex, Anterior, AnteriorPair(3)),
    shape(Base, Anterior, AnteriorPair(3)),
    shape(Apex, Anterior, AnteriorPair(0)),
    shape(Base, Anterior, AnteriorPair(0)),
    shape(Height::Full, Depth::Full, Lateral::LeftBand),
    shape(Height::Full, Depth::Full, Lateral::RightBand),
    shape(Apex, Posterior, PosteriorPair(3)),
    shape(Base, Posterior, PosteriorPair(3)),
    shape(Apex, Posterior, PosteriorPair(1)),
    shape(Base, Posterior, PosteriorPair(1)),
    shape(Apex, Posterior, PosteriorPair(4)),
    shape(Base, Posterior, PosteriorPair(4)),
    shape(Apex, Posterior, PosteriorPair(0)),
    shape(Base, Posterior, PosteriorPair(0)),
];

const OCTANT: [ZoneShape; 8] = [
    shape(Apex, Anterior, RightHalf),
    shape(Apex, Anterior, LeftHalf),
    shape(Apex, Posterior, RightHalf),
    shape(Apex, Posterior, LeftHalf),
    shape(Base, Anterior, RightHalf),
    shape(Base, Anterior, LeftHalf),
    shape(Base, Posterior, RightHalf),
    shape(Base, Posterior, LeftHalf),
];

const QUADRANT: [ZoneShape; 4] = [
    shape(Height::Full, Anterior, RightHalf),
    shape(Height::Full, Anterior, LeftHalf),
    shape(Height::Full, Posterior, RightHalf),
    shape(Height::Full, Posterior, LeftHalf),
];

const HEMI: [ZoneShape; 2] = [
    shape(Height::Full, Depth::Full, RightHalf),
    shape(Height::Full, Depth::Full, LeftHalf),
];

/// Round half to even; cutoffs landing exactly on .5 go to the even index.
pub fn round_half_even(v: f64) -> i64 {
    v.round_ties_even() as i64
}

fn scaled(frac: f64, lo: i64, hi: i64) -> i64 {
    round_half_even(frac * (hi - lo) as f64 + lo as f64)
}

struct Cutoffs {
    z: i64,
    y: i64,
    // Lateral band edges for Barzell, midline for coarser levels.
    low: i64,
    high: i64,
    mid: i64,
    anterior: Vec<i64>,
    posterior: Vec<i64>,
}

impl Cutoffs {
    fn compute(config: &ZoneConfig, bbox: &BoundingBox) -> Self {
        let (x_min, x_max) = (bbox.x_min as i64, bbox.x_max as i64);
        let (y_min, y_max) = (bbox.y_min as i64, bbox.y_max as i64);
        let (z_min, z_max) = (bbox.z_min as i64, bbox.z_max as i64);

        let low = scaled(config.left_right, x_min, x_max);
        let high = round_half_even(x_max as f64 - config.left_right * (x_max - x_min) as f64);
        let band = |cum: Vec<f64>| -> Vec<i64> {
            cum.into_iter()
                .map(|c| round_half_even(c * (high - low) as f64 + low as f64))
                .collect()
        };

        Self {
            z: scaled(config.apex, z_min, z_max),
            y: scaled(config.anterior_cutoff, y_min, y_max),
            low,
            high,
            mid: scaled(0.5, x_min, x_max),
            anterior: band(config.anterior_cumulative()),
            posterior: band(config.posterior_cumulative()),
        }
    }
}

// Pairs past the end of the split list collapse onto the final cutoff.
fn pair_range(cuts: &[i64], i: usize, start: i64) -> AxisRange {
    let at = |k: usize| cuts.get(k).or(cuts.last()).copied().unwrap_or(start);
    let lo = if i == 0 { start } else { at(i - 1) };
    AxisRange::new(lo, at(i))
}

fn build_box(shape: &ZoneShape, cut: &Cutoffs, bbox: &BoundingBox) -> ZoneBox {
    let z = match shape.height {
        Height::Apex => AxisRange::new(bbox.z_min as i64, cut.z),
        Height::Base => AxisRange::new(cut.z + 1, bbox.z_max as i64),
        Height::Full => bbox.z(),
    };
    let y = match shape.depth {
        Depth::Anterior => AxisRange::new(bbox.y_min as i64, cut.y),
        Depth::Posterior => AxisRange::new(cut.y, bbox.y_max as i64),
        Depth::Full => bbox.y(),
    };
    let x = match shape.lateral {
        Lateral::RightBand => AxisRange::new(bbox.x_min as i64, cut.low),
        Lateral::LeftBand => AxisRange::new(cut.high, bbox.x_max as i64),
        Lateral::AnteriorPair(i) => pair_range(&cut.anterior, i, cut.low),
        Lateral::PosteriorPair(i) => pair_range(&cut.posterior, i, cut.low),
        Lateral::RightHalf => AxisRange::new(bbox.x_min as i64, cut.mid),
        Lateral::LeftHalf => AxisRange::new(cut.mid + 1, bbox.x_max as i64),
        Lateral::Full => bbox.x(),
    };
    ZoneBox { x, y, z }
}

/// Builds the zone limits table for one granularity.
///
/// The Barzell (20-zone) layout uses every cutoff in `config`. The octant
/// layout splits apex/base, anterior/posterior and left/right at the x
/// midpoint; the quadrant layout drops apex/base; the hemi layout keeps only
/// the midline split.
pub fn zone_limits(
    granularity: Granularity,
    config: &ZoneConfig,
    bbox: &BoundingBox,
) -> ZoneLimits {
    let cut = Cutoffs::compute(config, bbox);
    let table: &[ZoneShape] = match granularity {
        Granularity::Barzell => &BARZELL,
        Granularity::Octant => &OCTANT,
        Granularity::Quadrant => &QUADRANT,
        Granularity::Hemi => &HEMI,
    };
    let boxes = table.iter().map(|s| build_box(s, &cut, bbox)).collect();
    ZoneLimits::new(granularity, boxes)
}
