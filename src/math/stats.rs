//! Concordance statistics over per-zone binary indicators.
//!
//! Biopsy is treated as ground truth: TP = biopsy 1 & imaging 1,
//! FP = biopsy 0 & imaging 1, FN = biopsy 1 & imaging 0.

use rand::Rng;

use crate::error::ZoneError;

/// Row-major stack of equal-width 0/1 vectors, one row per patient replicate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndicatorMatrix {
    width: usize,
    data: Vec<u8>,
}

impl IndicatorMatrix {
    pub fn new(width: usize) -> Self {
        Self {
            width,
            data: Vec::new(),
        }
    }

    pub fn from_rows(width: usize, rows: &[Vec<u8>]) -> Result<Self, ZoneError> {
        let mut m = Self::new(width);
        for row in rows {
            m.push_row(row)?;
        }
        Ok(m)
    }

    pub fn push_row(&mut self, row: &[u8]) -> Result<(), ZoneError> {
        if row.len() != self.width {
            return Err(ZoneError::ShapeMismatch {
                context: "indicator row".to_string(),
                left: vec![self.width],
                right: vec![row.len()],
            });
        }
        self.data.extend_from_slice(row);
        Ok(())
    }

    /// Appends `times` identical copies of `row`.
    pub fn push_repeated(&mut self, row: &[u8], times: usize) -> Result<(), ZoneError> {
        for _ in 0..times {
            self.push_row(row)?;
        }
        Ok(())
    }

    pub fn append(&mut self, other: &IndicatorMatrix) -> Result<(), ZoneError> {
        if other.width != self.width {
            return Err(ZoneError::ShapeMismatch {
                context: "indicator append".to_string(),
                left: vec![self.width],
                right: vec![other.width],
            });
        }
        self.data.extend_from_slice(&other.data);
        Ok(())
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn n_rows(&self) -> usize {
        if self.width == 0 {
            0
        } else {
            self.data.len() / self.width
        }
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.n_rows(), self.width)
    }

    pub fn row(&self, i: usize) -> &[u8] {
        &self.data[i * self.width..(i + 1) * self.width]
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConfusionMatrix {
    pub tp: u64,
    pub tn: u64,
    pub fp: u64,
    pub fn_: u64,
}

impl ConfusionMatrix {
    pub fn total(&self) -> u64 {
        self.tp + self.tn + self.fp + self.fn_
    }

    fn add(&mut self, other: &ConfusionMatrix) {
        self.tp += other.tp;
        self.tn += other.tn;
        self.fp += other.fp;
        self.fn_ += other.fn_;
    }

    fn count_row(biopsy: &[u8], imaging: &[u8]) -> Self {
        let mut cm = Self::default();
        for (&b, &m) in biopsy.iter().zip(imaging) {
            match (b == 1, m == 1) {
                (true, true) => cm.tp += 1,
                (false, false) => cm.tn += 1,
                (false, true) => cm.fp += 1,
                (true, false) => cm.fn_ += 1,
            }
        }
        cm
    }
}

fn ensure_aligned(biopsy: &IndicatorMatrix, imaging: &IndicatorMatrix) -> Result<(), ZoneError> {
    if biopsy.shape() != imaging.shape() {
        let (br, bc) = biopsy.shape();
        let (ir, ic) = imaging.shape();
        return Err(ZoneError::ShapeMismatch {
            context: "biopsy vs imaging indicators".to_string(),
            left: vec![br, bc],
            right: vec![ir, ic],
        });
    }
    Ok(())
}

pub fn confusion_matrix(
    biopsy: &IndicatorMatrix,
    imaging: &IndicatorMatrix,
) -> Result<ConfusionMatrix, ZoneError> {
    ensure_aligned(biopsy, imaging)?;
    Ok(ConfusionMatrix::count_row(&biopsy.data, &imaging.data))
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Metrics {
    pub sensitivity: f64,
    pub specificity: f64,
    pub ppv: f64,
    pub npv: f64,
}

impl Metrics {
    pub fn from_confusion(cm: &ConfusionMatrix) -> Self {
        Self {
            sensitivity: ratio(cm.tp, cm.tp + cm.fn_),
            specificity: ratio(cm.tn, cm.tn + cm.fp),
            ppv: ratio(cm.tp, cm.tp + cm.fp),
            npv: ratio(cm.tn, cm.tn + cm.fn_),
        }
    }
}

fn ratio(num: u64, den: u64) -> f64 {
    if den == 0 {
        f64::NAN
    } else {
        num as f64 / den as f64
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfidenceInterval {
    pub lower: f64,
    pub upper: f64,
}

impl ConfidenceInterval {
    /// Percentile interval over `draws`; NaN draws are discarded first.
    pub fn from_draws(draws: &[f64], confidence: f64) -> Self {
        let mut valid: Vec<f64> = draws.iter().copied().filter(|v| !v.is_nan()).collect();
        valid.sort_by(|a, b| a.total_cmp(b));
        let tail = (1.0 - confidence) / 2.0 * 100.0;
        Self {
            lower: percentile(&valid, tail),
            upper: percentile(&valid, 100.0 - tail),
        }
    }

    pub fn contains(&self, v: f64) -> bool {
        self.lower <= v && v <= self.upper
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricIntervals {
    pub sensitivity: ConfidenceInterval,
    pub specificity: ConfidenceInterval,
    pub ppv: ConfidenceInterval,
    pub npv: ConfidenceInterval,
}

/// Percentile `q` (0..=100) of an ascending slice with linear interpolation.
/// Returns NaN for an empty slice.
pub fn percentile(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    let pos = (q / 100.0).clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

/// Percentile bootstrap over the patient-replicate axis.
///
/// Each iteration resamples rows with replacement (the same row indices for
/// both sources) and evaluates all four metrics on the resample.
pub fn bootstrap_intervals<R: Rng + ?Sized>(
    biopsy: &IndicatorMatrix,
    imaging: &IndicatorMatrix,
    iterations: usize,
    confidence: f64,
    rng: &mut R,
) -> Result<MetricIntervals, ZoneError> {
    ensure_aligned(biopsy, imaging)?;
    let n = biopsy.n_rows();

    let per_row: Vec<ConfusionMatrix> = (0..n)
        .map(|i| ConfusionMatrix::count_row(biopsy.row(i), imaging.row(i)))
        .collect();

    let mut sens = Vec::with_capacity(iterations);
    let mut spec = Vec::with_capacity(iterations);
    let mut ppv = Vec::with_capacity(iterations);
    let mut npv = Vec::with_capacity(iterations);

    for _ in 0..iterations {
        let mut cm = ConfusionMatrix::default();
        for _ in 0..n {
            cm.add(&per_row[rng.gen_range(0..n)]);
        }
        let m = Metrics::from_confusion(&cm);
        sens.push(m.sensitivity);
        spec.push(m.specificity);
        ppv.push(m.ppv);
        npv.push(m.npv);
    }

    Ok(MetricIntervals {
        sensitivity: ConfidenceInterval::from_draws(&sens, confidence),
        specificity: ConfidenceInterval::from_draws(&spec, confidence),
        ppv: ConfidenceInterval::from_draws(&ppv, confidence),
        npv: ConfidenceInterval::from_draws(&npv, confidence),
    })
}
