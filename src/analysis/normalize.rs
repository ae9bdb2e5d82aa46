use crate::data::{GeneRow, Measurement, QueryError};

/// Scale a row so its maximum becomes 1.0.
///
/// The maximum is taken over non-missing values; missing entries stay missing.
/// Rows with no values, or whose maximum is not strictly positive, are
/// rejected with [`QueryError::DegenerateRow`].
pub fn normalize_row(row: &GeneRow) -> Result<GeneRow, QueryError> {
    let max = row
        .values()
        .filter(|v| !v.is_nan())
        .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |m| m.max(v))));

    let max = match max {
        None => return Err(degenerate(row, "row has no values".to_string())),
        Some(m) if m <= 0.0 => {
            return Err(degenerate(row, format!("row maximum is {m}, expected > 0")))
        }
        Some(m) => m,
    };

    let measurements = row
        .measurements
        .iter()
        .map(|m| Measurement::new(m.treatment.clone(), m.value / max))
        .collect();
    Ok(GeneRow::new(row.gene.clone(), measurements))
}

fn degenerate(row: &GeneRow, reason: String) -> QueryError {
    QueryError::DegenerateRow {
        gene: row.gene.clone(),
        reason,
    }
}
