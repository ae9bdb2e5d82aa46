use std::collections::{HashMap, HashSet};

use ndarray::{Array2, ArrayView1, ArrayView2};
use serde::Serialize;

use super::error::{LoadError, QueryError};

/// Name of the row axis (gene identifiers).
pub const GENE_AXIS: &str = "Gene";
/// Name of the column axis (treatment codes).
pub const TREATMENT_AXIS: &str = "Treatment";

// ---------------------------------------------------------------------------
// Measurement / GeneRow – one cell and one row of the table
// ---------------------------------------------------------------------------

/// A single expression value for one treatment code.
/// Missing cells carry `NaN` (serialized as `null`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Measurement {
    pub treatment: String,
    pub value: f64,
}

impl Measurement {
    pub fn new(treatment: impl Into<String>, value: f64) -> Self {
        Self {
            treatment: treatment.into(),
            value,
        }
    }

    pub fn is_missing(&self) -> bool {
        self.value.is_nan()
    }
}

/// The expression values of one gene across all treatments, in column order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneRow {
    pub gene: String,
    pub measurements: Vec<Measurement>,
}

impl GeneRow {
    pub fn new(gene: impl Into<String>, measurements: Vec<Measurement>) -> Self {
        Self {
            gene: gene.into(),
            measurements,
        }
    }

    /// Raw values in column order, missing cells included as `NaN`.
    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.measurements.iter().map(|m| m.value)
    }

    pub fn len(&self) -> usize {
        self.measurements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.measurements.is_empty()
    }
}

// ---------------------------------------------------------------------------
// GeneValidation – partition of requested identifiers
// ---------------------------------------------------------------------------

/// Result of [`ExpressionTable::validate_genes`]: requested identifiers split
/// into those present in the table and those that are not, input order kept.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GeneValidation {
    pub valid: Vec<String>,
    pub invalid: Vec<String>,
}

impl GeneValidation {
    pub fn all_valid(&self) -> bool {
        self.invalid.is_empty()
    }
}

// ---------------------------------------------------------------------------
// ExpressionTable – the complete loaded dataset
// ---------------------------------------------------------------------------

/// Immutable gene × treatment expression matrix.
///
/// Rows are genes (unique, case-sensitive), columns are treatment codes in
/// source order. Every cell is finite or `NaN` for an explicitly missing value.
/// There is no mutation API; share it by reference once loaded.
#[derive(Debug, Clone)]
pub struct ExpressionTable {
    genes: Vec<String>,
    treatments: Vec<String>,
    gene_index: HashMap<String, usize>,
    values: Array2<f64>,
}

impl ExpressionTable {
    /// Build a table from in-memory rows. Line numbers in errors count the
    /// header as line 1.
    pub fn from_rows<G, T>(treatments: T, rows: Vec<(G, Vec<f64>)>) -> Result<Self, LoadError>
    where
        G: Into<String>,
        T: IntoIterator,
        T::Item: Into<String>,
    {
        let mut builder = TableBuilder::new(treatments.into_iter().map(Into::into).collect())?;
        for (i, (gene, values)) in rows.into_iter().enumerate() {
            builder.push_row(i as u64 + 2, gene.into(), values)?;
        }
        builder.build()
    }

    /// Gene identifiers in row order.
    pub fn genes(&self) -> &[String] {
        &self.genes
    }

    /// Treatment codes in column order.
    pub fn treatments(&self) -> &[String] {
        &self.treatments
    }

    /// Number of genes.
    pub fn len(&self) -> usize {
        self.genes.len()
    }

    /// Whether the table has no genes. Always false for a loaded table.
    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }

    pub fn n_treatments(&self) -> usize {
        self.treatments.len()
    }

    /// The full value matrix (genes × treatments).
    pub fn values(&self) -> ArrayView2<'_, f64> {
        self.values.view()
    }

    /// Exact, case-sensitive membership test.
    pub fn contains(&self, gene: &str) -> bool {
        self.gene_index.contains_key(gene)
    }

    /// Row position of `gene`, if present.
    pub fn position(&self, gene: &str) -> Option<usize> {
        self.gene_index.get(gene).copied()
    }

    /// Values of the row at `index`.
    ///
    /// Panics if `index >= self.len()`.
    pub fn row_values(&self, index: usize) -> ArrayView1<'_, f64> {
        self.values.row(index)
    }

    /// Values of `gene`'s row.
    pub fn gene_values(&self, gene: &str) -> Result<ArrayView1<'_, f64>, QueryError> {
        self.position(gene)
            .map(|i| self.values.row(i))
            .ok_or_else(|| QueryError::GeneNotFound(gene.to_string()))
    }

    /// The full row for `gene`, every column in header order.
    pub fn get_row(&self, gene: &str) -> Result<GeneRow, QueryError> {
        let values = self.gene_values(gene)?;
        let measurements = self
            .treatments
            .iter()
            .zip(values.iter())
            .map(|(t, &v)| Measurement::new(t.clone(), v))
            .collect();
        Ok(GeneRow::new(gene, measurements))
    }

    /// Split `ids` into known and unknown identifiers. Order is kept and
    /// duplicates are not removed.
    pub fn validate_genes<S: AsRef<str>>(&self, ids: &[S]) -> GeneValidation {
        let (valid, invalid): (Vec<String>, Vec<String>) = ids
            .iter()
            .map(|id| id.as_ref().to_string())
            .partition(|id| self.contains(id));
        GeneValidation { valid, invalid }
    }

    /// Iterate `(gene, values)` in row order.
    pub fn rows(&self) -> impl Iterator<Item = (&str, ArrayView1<'_, f64>)> {
        self.genes
            .iter()
            .map(String::as_str)
            .zip(self.values.rows())
    }
}

// ---------------------------------------------------------------------------
// TableBuilder – row-by-row construction with integrity checks
// ---------------------------------------------------------------------------

/// Accumulates rows while enforcing the table invariants: unique treatment
/// codes, unique genes, rectangular shape and finite-or-missing cells.
#[derive(Debug)]
pub struct TableBuilder {
    treatments: Vec<String>,
    genes: Vec<String>,
    first_seen: HashMap<String, u64>,
    data: Vec<f64>,
}

impl TableBuilder {
    pub fn new(treatments: Vec<String>) -> Result<Self, LoadError> {
        if treatments.is_empty() {
            return Err(LoadError::MissingTreatments);
        }
        {
            let mut seen = HashSet::with_capacity(treatments.len());
            for t in &treatments {
                if !seen.insert(t.as_str()) {
                    return Err(LoadError::DuplicateTreatment(t.clone()));
                }
            }
        }
        Ok(Self {
            treatments,
            genes: Vec::new(),
            first_seen: HashMap::new(),
            data: Vec::new(),
        })
    }

    pub fn treatments(&self) -> &[String] {
        &self.treatments
    }

    /// Append one gene row. `line` is only used for error reporting.
    pub fn push_row(&mut self, line: u64, gene: String, values: Vec<f64>) -> Result<(), LoadError> {
        if values.len() != self.treatments.len() {
            return Err(LoadError::RaggedRow {
                line,
                expected: self.treatments.len() + 1,
                found: values.len() + 1,
            });
        }
        if let Some(&first_line) = self.first_seen.get(&gene) {
            return Err(LoadError::DuplicateGene {
                gene,
                line,
                first_line,
            });
        }
        if let Some(col) = values.iter().position(|v| v.is_infinite()) {
            return Err(LoadError::InvalidValue {
                line,
                gene,
                treatment: self.treatments[col].clone(),
                value: values[col].to_string(),
            });
        }

        self.first_seen.insert(gene.clone(), line);
        self.genes.push(gene);
        self.data.extend(values);
        Ok(())
    }

    pub fn build(self) -> Result<ExpressionTable, LoadError> {
        if self.genes.is_empty() {
            return Err(LoadError::Empty("no gene rows"));
        }
        let shape = (self.genes.len(), self.treatments.len());
        let values = Array2::from_shape_vec(shape, self.data)
            .map_err(|e| LoadError::Schema(e.to_string()))?;
        let gene_index = self
            .genes
            .iter()
            .enumerate()
            .map(|(i, g)| (g.clone(), i))
            .collect();

        Ok(ExpressionTable {
            genes: self.genes,
            treatments: self.treatments,
            gene_index,
            values,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn abc_table() -> ExpressionTable {
        ExpressionTable::from_rows(
            ["T1", "T2", "T3", "T4"],
            vec![
                ("GeneA", vec![1.0, 2.0, 3.0, 4.0]),
                ("GeneB", vec![4.0, 3.0, 2.0, 1.0]),
                ("GeneC", vec![1.0, 2.0, 3.0, 4.0]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_table_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ExpressionTable>();
    }

    #[test]
    fn test_contains_is_case_sensitive() {
        let table = abc_table();
        assert!(table.contains("GeneA"));
        assert!(!table.contains("genea"));
        assert!(!table.contains("GeneA "));
    }

    #[test]
    fn test_get_row_keeps_header_order() {
        let table = abc_table();
        for gene in table.genes() {
            let row = table.get_row(gene).unwrap();
            let codes: Vec<&str> = row.measurements.iter().map(|m| m.treatment.as_str()).collect();
            assert_eq!(codes, ["T1", "T2", "T3", "T4"]);
            assert_eq!(row.len(), table.n_treatments());
        }
        let b = table.get_row("GeneB").unwrap();
        assert_eq!(b.values().collect::<Vec<_>>(), vec![4.0, 3.0, 2.0, 1.0]);
    }

    #[test]
    fn test_get_row_unknown_gene() {
        let table = abc_table();
        assert_eq!(
            table.get_row("Ghost"),
            Err(QueryError::GeneNotFound("Ghost".into()))
        );
    }

    #[test]
    fn test_validate_genes_partition() {
        let table = abc_table();
        let v = table.validate_genes(&["GeneA", "Ghost"]);
        assert_eq!(v.valid, vec!["GeneA"]);
        assert_eq!(v.invalid, vec!["Ghost"]);
        assert!(!v.all_valid());

        let dup = table.validate_genes(&["GeneC", "GeneC", "x", "GeneA", "x"]);
        assert_eq!(dup.valid, vec!["GeneC", "GeneC", "GeneA"]);
        assert_eq!(dup.invalid, vec!["x", "x"]);

        let empty: [&str; 0] = [];
        assert_eq!(table.validate_genes(&empty), GeneValidation::default());
    }

    #[test]
    fn test_duplicate_gene_rejected() {
        let err = ExpressionTable::from_rows(
            ["T1"],
            vec![("A", vec![1.0]), ("B", vec![2.0]), ("A", vec![3.0])],
        )
        .unwrap_err();
        match err {
            LoadError::DuplicateGene {
                gene,
                line,
                first_line,
            } => {
                assert_eq!(gene, "A");
                assert_eq!(line, 4);
                assert_eq!(first_line, 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_duplicate_treatment_rejected() {
        let err = ExpressionTable::from_rows(["T1", "T1"], vec![("A", vec![1.0, 2.0])]).unwrap_err();
        assert!(matches!(err, LoadError::DuplicateTreatment(t) if t == "T1"));
    }

    #[test]
    fn test_ragged_and_infinite_rows_rejected() {
        let err = ExpressionTable::from_rows(["T1", "T2"], vec![("A", vec![1.0])]).unwrap_err();
        assert!(matches!(
            err,
            LoadError::RaggedRow {
                expected: 3,
                found: 2,
                ..
            }
        ));

        let err =
            ExpressionTable::from_rows(["T1", "T2"], vec![("A", vec![1.0, f64::INFINITY])]).unwrap_err();
        assert!(matches!(err, LoadError::InvalidValue { treatment, .. } if treatment == "T2"));
    }

    #[test]
    fn test_empty_tables_rejected() {
        let no_rows: Vec<(&str, Vec<f64>)> = Vec::new();
        assert!(matches!(
            ExpressionTable::from_rows(["T1"], no_rows),
            Err(LoadError::Empty(_))
        ));
        let no_cols: [&str; 0] = [];
        assert!(matches!(
            ExpressionTable::from_rows(no_cols, vec![("A", vec![])]),
            Err(LoadError::MissingTreatments)
        ));
    }

    #[test]
    fn test_missing_cells_are_kept() {
        let table = ExpressionTable::from_rows(["T1", "T2"], vec![("A", vec![f64::NAN, 2.0])]).unwrap();
        let row = table.get_row("A").unwrap();
        assert!(row.measurements[0].is_missing());
        assert!(!row.measurements[1].is_missing());
    }
}
