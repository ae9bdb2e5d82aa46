use std::cmp::Ordering;

use log::debug;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use statrs::statistics::Statistics;

use crate::data::{ExpressionTable, QueryError};

/// Number of correlated genes reported when the caller doesn't ask otherwise.
pub const DEFAULT_TOP_K: usize = 10;

// ---------------------------------------------------------------------------
// Pearson correlation
// ---------------------------------------------------------------------------

/// Pearson correlation of two equally long vectors.
///
/// Only positions where both values are present take part. Returns `NaN` when
/// the lengths differ, fewer than two complete pairs remain, or either side
/// is constant over those pairs. The result is clamped to [-1, 1].
pub fn pearson(x: ArrayView1<'_, f64>, y: ArrayView1<'_, f64>) -> f64 {
    if x.len() != y.len() {
        return f64::NAN;
    }
    let (xs, ys): (Vec<f64>, Vec<f64>) = x
        .iter()
        .zip(y.iter())
        .filter(|(a, b)| !a.is_nan() && !b.is_nan())
        .map(|(&a, &b)| (a, b))
        .unzip();
    if !varies(&xs) || !varies(&ys) {
        return f64::NAN;
    }

    let dx = scaled_deviations(xs);
    let dy = scaled_deviations(ys);

    let sxy = dx.dot(&dy);
    let sxx = dx.dot(&dx);
    let syy = dy.dot(&dy);
    // sqrt of the product keeps r(x, x) exactly 1.0
    (sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0)
}

/// Deviations from the mean divided by the largest absolute deviation.
///
/// Every entry lands in [-1, 1], so the dot products stay finite and nonzero
/// for very large or very small magnitudes. Expects a varying input.
fn scaled_deviations(values: Vec<f64>) -> Array1<f64> {
    let mean = (&values).mean();
    let deviations = Array1::from(values) - mean;
    let scale = deviations.iter().fold(0.0_f64, |m, d| m.max(d.abs()));
    deviations / scale
}

/// At least two values and not all equal.
fn varies(values: &[f64]) -> bool {
    match values.split_first() {
        Some((first, rest)) => !rest.is_empty() && rest.iter().any(|v| v != first),
        None => false,
    }
}

/// Whether correlating this row with anything can give a defined result.
pub fn has_variance(values: ArrayView1<'_, f64>) -> bool {
    let present: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    varies(&present)
}

// ---------------------------------------------------------------------------
// Top-k ranking
// ---------------------------------------------------------------------------

/// One ranked gene and its coefficient against the query gene.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Correlation {
    pub gene: String,
    /// `NaN` (serialized as `null`) when undefined.
    pub coefficient: f64,
}

/// Genes most correlated with `query`, strongest first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationResult {
    pub query: String,
    pub entries: Vec<Correlation>,
}

impl CorrelationResult {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn genes(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|c| c.gene.as_str())
    }
}

/// Descending by coefficient with undefined values last.
fn rank_order(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
    }
}

/// Correlate `gene` with every other gene and keep the `k` strongest.
///
/// The query gene never appears in its own result. Ties keep table row order.
pub fn top_correlated(
    table: &ExpressionTable,
    gene: &str,
    k: usize,
) -> Result<CorrelationResult, QueryError> {
    let query_idx = table
        .position(gene)
        .ok_or_else(|| QueryError::GeneNotFound(gene.to_string()))?;
    let query = table.row_values(query_idx);

    let mut entries: Vec<Correlation> = table
        .rows()
        .enumerate()
        .filter(|(i, _)| *i != query_idx)
        .map(|(_, (other, values))| Correlation {
            gene: other.to_string(),
            coefficient: pearson(query, values),
        })
        .collect();

    // stable: equal coefficients stay in row order
    entries.sort_by(|a, b| rank_order(a.coefficient, b.coefficient));
    entries.truncate(k);

    debug!("Top {} correlations for {gene} computed over {} genes", entries.len(), table.len());
    Ok(CorrelationResult {
        query: gene.to_string(),
        entries,
    })
}

// ---------------------------------------------------------------------------
// Correlation matrix
// ---------------------------------------------------------------------------

/// Square, symmetric matrix of pairwise coefficients between selected genes.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationMatrix {
    genes: Vec<String>,
    values: Array2<f64>,
}

impl CorrelationMatrix {
    /// Row / column labels.
    pub fn genes(&self) -> &[String] {
        &self.genes
    }

    pub fn values(&self) -> ArrayView2<'_, f64> {
        self.values.view()
    }

    /// Number of rows (= columns).
    pub fn size(&self) -> usize {
        self.genes.len()
    }

    /// Coefficient between the first occurrences of `a` and `b`.
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.genes.iter().position(|g| g == a)?;
        let j = self.genes.iter().position(|g| g == b)?;
        Some(self.values[[i, j]])
    }

    /// Rows as nested vectors.
    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        self.values.rows().into_iter().map(|r| r.to_vec()).collect()
    }
}

impl Serialize for CorrelationMatrix {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("CorrelationMatrix", 2)?;
        state.serialize_field("genes", &self.genes)?;
        state.serialize_field("values", &self.to_rows())?;
        state.end()
    }
}

/// Pairwise Pearson correlation between `genes`.
///
/// The upper triangle is computed and mirrored, so `M[i][j] == M[j][i]`
/// exactly. The diagonal is 1.0, or `NaN` for a row without variance.
pub fn correlation_matrix<S: AsRef<str>>(
    table: &ExpressionTable,
    genes: &[S],
) -> Result<CorrelationMatrix, QueryError> {
    let rows = genes
        .iter()
        .map(|g| table.gene_values(g.as_ref()))
        .collect::<Result<Vec<_>, _>>()?;

    let n = rows.len();
    let mut values = Array2::from_elem((n, n), f64::NAN);
    for i in 0..n {
        values[[i, i]] = if has_variance(rows[i]) { 1.0 } else { f64::NAN };
        for j in (i + 1)..n {
            let r = pearson(rows[i], rows[j]);
            values[[i, j]] = r;
            values[[j, i]] = r;
        }
    }

    Ok(CorrelationMatrix {
        genes: genes.iter().map(|g| g.as_ref().to_string()).collect(),
        values,
    })
}
