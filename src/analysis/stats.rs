use serde::Serialize;
use statrs::statistics::Statistics;

use crate::data::TreatmentGroup;

/// Mean and spread of a group of values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Summary {
    /// Number of non-missing values the summary was computed over.
    pub n: usize,
    pub mean: f64,
    /// Sample standard deviation (n − 1 denominator); 0 for a single value.
    pub std_dev: f64,
}

/// Summarize `values`, skipping missing (`NaN`) entries.
///
/// An empty group has `NaN` mean and standard deviation.
pub fn summarize<I>(values: I) -> Summary
where
    I: IntoIterator<Item = f64>,
{
    let present: Vec<f64> = values.into_iter().filter(|v| !v.is_nan()).collect();
    let n = present.len();
    let mean = (&present).mean();
    let std_dev = match n {
        0 => f64::NAN,
        1 => 0.0,
        _ => (&present).std_dev(),
    };
    Summary { n, mean, std_dev }
}

/// Summary of one treatment type within a gene row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupSummary {
    pub treatment_type: String,
    pub summary: Summary,
}

/// Summarize every group, keeping group order.
pub fn summarize_groups(groups: &[TreatmentGroup]) -> Vec<GroupSummary> {
    groups
        .iter()
        .map(|g| GroupSummary {
            treatment_type: g.treatment_type.clone(),
            summary: summarize(g.values()),
        })
        .collect()
}
