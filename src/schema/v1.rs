use serde::{Deserialize, Serialize};

use crate::math::stats::{ConfidenceInterval, ConfusionMatrix, MetricIntervals, Metrics};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInfo {
    pub name: String,
    pub version: String,
    pub schema: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSettings {
    pub seed: u64,
    pub sample_times: usize,
    pub num_ci_iter: usize,
    pub zone_config: String,
}

/// One (cancer definition, PIRADS threshold, IoU threshold) result.
///
/// Metric values and CI bounds are percentages rounded to two decimals;
/// `None` stands for an undefined metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConcordanceRow {
    pub definition: String,
    pub pirads_thre: f64,
    pub iou_thre: f64,
    #[serde(rename = "TP")]
    pub tp: u64,
    #[serde(rename = "FP")]
    pub fp: u64,
    #[serde(rename = "FN")]
    pub fn_: u64,
    #[serde(rename = "TN")]
    pub tn: u64,
    pub sensitivity: Option<f64>,
    pub specificity: Option<f64>,
    #[serde(rename = "PPV")]
    pub ppv: Option<f64>,
    #[serde(rename = "NPV")]
    pub npv: Option<f64>,
    pub sensitivity_ci: [Option<f64>; 2],
    pub specificity_ci: [Option<f64>; 2],
    #[serde(rename = "PPV_ci")]
    pub ppv_ci: [Option<f64>; 2],
    #[serde(rename = "NPV_ci")]
    pub npv_ci: [Option<f64>; 2],
    pub sensitivity_with_ci: String,
    pub specificity_with_ci: String,
    #[serde(rename = "PPV_with_ci")]
    pub ppv_with_ci: String,
    #[serde(rename = "NPV_with_ci")]
    pub npv_with_ci: String,
}

impl ConcordanceRow {
    pub fn new(
        definition: &str,
        pirads_thre: f64,
        iou_thre: f64,
        cm: &ConfusionMatrix,
        metrics: &Metrics,
        intervals: &MetricIntervals,
    ) -> Self {
        let sensitivity = percent(metrics.sensitivity);
        let specificity = percent(metrics.specificity);
        let ppv = percent(metrics.ppv);
        let npv = percent(metrics.npv);
        let sensitivity_ci = percent_ci(&intervals.sensitivity);
        let specificity_ci = percent_ci(&intervals.specificity);
        let ppv_ci = percent_ci(&intervals.ppv);
        let npv_ci = percent_ci(&intervals.npv);
        Self {
            definition: definition.to_string(),
            pirads_thre,
            iou_thre,
            tp: cm.tp,
            fp: cm.fp,
            fn_: cm.fn_,
            tn: cm.tn,
            sensitivity_with_ci: with_ci(sensitivity, sensitivity_ci),
            specificity_with_ci: with_ci(specificity, specificity_ci),
            ppv_with_ci: with_ci(ppv, ppv_ci),
            npv_with_ci: with_ci(npv, npv_ci),
            sensitivity,
            specificity,
            ppv,
            npv,
            sensitivity_ci,
            specificity_ci,
            ppv_ci,
            npv_ci,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConcordanceReportV1 {
    pub tool: ToolInfo,
    pub level: u32,
    pub settings: RunSettings,
    pub patients: Vec<String>,
    pub rows: Vec<ConcordanceRow>,
    pub warnings: Vec<String>,
}

/// `round(x * 100, 2)`, ties to even; NaN becomes `None`.
pub fn percent(x: f64) -> Option<f64> {
    if x.is_nan() {
        None
    } else {
        Some((x * 100.0 * 100.0).round_ties_even() / 100.0)
    }
}

fn percent_ci(ci: &ConfidenceInterval) -> [Option<f64>; 2] {
    [percent(ci.lower), percent(ci.upper)]
}

/// Renders a value the way a Python float prints: `50.0`, `66.67`, `nan`.
pub fn format_value(v: Option<f64>) -> String {
    match v {
        None => "nan".to_string(),
        Some(v) if v.is_infinite() => if v > 0.0 { "inf" } else { "-inf" }.to_string(),
        Some(v) => format!("{:?}", v),
    }
}

fn with_ci(value: Option<f64>, ci: [Option<f64>; 2]) -> String {
    format!(
        "{} ({}, {})",
        format_value(value),
        format_value(ci[0]),
        format_value(ci[1])
    )
}
