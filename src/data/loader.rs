use std::fs::File;
use std::io::Read;
use std::path::Path;

use arrow::array::{Array, ArrayRef, AsArray};
use arrow::datatypes::{DataType, Float32Type, Float64Type, Int32Type, Int64Type};
use log::{debug, info};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use super::error::LoadError;
use super::model::{ExpressionTable, TableBuilder};

/// Tokens that mark an explicitly missing cell.
pub const MISSING_MARKERS: &[&str] = &["", "NA", "N/A", "NaN", "nan"];

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load an expression table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.tsv` / `.txt` / `.tab` – tab-separated, header row of treatment codes,
///   first column gene identifiers
/// * `.csv`                   – same layout, comma-separated
/// * `.parquet`               – first column Utf8 gene identifiers, remaining
///   numeric columns are treatments
pub fn load_file(path: &Path) -> Result<ExpressionTable, LoadError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let table = match ext.as_str() {
        "tsv" | "txt" | "tab" => load_delimited(path, b'\t'),
        "csv" => load_delimited(path, b','),
        "parquet" | "pq" => load_parquet(path),
        other => Err(LoadError::UnsupportedFormat(other.to_string())),
    }?;

    info!(
        "Loaded {} genes x {} treatments from {}",
        table.len(),
        table.n_treatments(),
        path.display()
    );
    Ok(table)
}

fn open(path: &Path) -> Result<File, LoadError> {
    File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

// ---------------------------------------------------------------------------
// Delimited-text loader
// ---------------------------------------------------------------------------

fn load_delimited(path: &Path, delimiter: u8) -> Result<ExpressionTable, LoadError> {
    from_reader(open(path)?, delimiter)
}

/// Parse a delimited table from any reader.
///
/// Layout: the first row holds the treatment codes (its first cell labels the
/// gene column and is ignored), every following row is a gene identifier
/// followed by one value per treatment. No quoting is interpreted.
pub fn from_reader<R: Read>(reader: R, delimiter: u8) -> Result<ExpressionTable, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .from_reader(reader);

    let mut records = reader.records();

    let header = match records.next() {
        Some(record) => record?,
        None => return Err(LoadError::Empty("no header row")),
    };
    let treatments: Vec<String> = header.iter().skip(1).map(str::to_string).collect();
    debug!("Header: {} treatment columns", treatments.len());

    let mut builder = TableBuilder::new(treatments)?;
    let expected = builder.treatments().len() + 1;

    for result in records {
        let record = result?;
        let line = record.position().map_or(0, |p| p.line());

        if record.len() != expected {
            return Err(LoadError::RaggedRow {
                line,
                expected,
                found: record.len(),
            });
        }

        let gene = record.get(0).unwrap_or_default().to_string();
        let values = record
            .iter()
            .skip(1)
            .zip(builder.treatments())
            .map(|(cell, treatment)| {
                parse_cell(cell).ok_or_else(|| LoadError::InvalidValue {
                    line,
                    gene: gene.clone(),
                    treatment: treatment.clone(),
                    value: cell.to_string(),
                })
            })
            .collect::<Result<Vec<f64>, _>>()?;

        builder.push_row(line, gene, values)?;
    }

    builder.build()
}

/// Parse one cell: a number, or `NaN` for a missing marker.
fn parse_cell(cell: &str) -> Option<f64> {
    let tok = cell.trim();
    if MISSING_MARKERS.contains(&tok) {
        return Some(f64::NAN);
    }
    tok.parse::<f64>().ok().filter(|v| v.is_finite())
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file holding an expression table.
///
/// Expected schema:
/// - first column: Utf8 or LargeUtf8 gene identifiers (non-null)
/// - every other column: Float64 / Float32 / Int64 / Int32 values, one column
///   per treatment code. Nulls become missing cells.
fn load_parquet(path: &Path) -> Result<ExpressionTable, LoadError> {
    let file = open(path)?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;

    let schema = builder.schema().clone();
    let fields = schema.fields();
    let Some(gene_field) = fields.first() else {
        return Err(LoadError::Empty("parquet schema has no columns"));
    };
    if !matches!(gene_field.data_type(), DataType::Utf8 | DataType::LargeUtf8) {
        return Err(LoadError::Schema(format!(
            "gene column '{}' must be a string column, got {:?}",
            gene_field.name(),
            gene_field.data_type()
        )));
    }
    for field in fields.iter().skip(1) {
        if !is_numeric(field.data_type()) {
            return Err(LoadError::Schema(format!(
                "treatment column '{}' must be numeric, got {:?}",
                field.name(),
                field.data_type()
            )));
        }
    }

    let treatments = fields.iter().skip(1).map(|f| f.name().clone()).collect();
    let mut table = TableBuilder::new(treatments)?;

    let reader = builder.build()?;
    // Line numbers are 1-based with the schema counted as the header line.
    let mut line: u64 = 1;

    for batch_result in reader {
        let batch = batch_result?;
        let gene_col = batch.column(0);

        for row in 0..batch.num_rows() {
            line += 1;
            let gene = extract_gene(gene_col, row)
                .ok_or_else(|| LoadError::Schema(format!("null gene identifier on line {line}")))?;
            let values = batch
                .columns()
                .iter()
                .skip(1)
                .map(|col| extract_f64(col, row))
                .collect();
            table.push_row(line, gene, values)?;
        }
    }

    table.build()
}

// -- Parquet / Arrow helpers --

fn is_numeric(data_type: &DataType) -> bool {
    matches!(
        data_type,
        DataType::Float64 | DataType::Float32 | DataType::Int64 | DataType::Int32
    )
}

fn extract_gene(col: &ArrayRef, row: usize) -> Option<String> {
    if col.is_null(row) {
        return None;
    }
    match col.data_type() {
        DataType::Utf8 => Some(col.as_string::<i32>().value(row).to_string()),
        DataType::LargeUtf8 => Some(col.as_string::<i64>().value(row).to_string()),
        _ => None,
    }
}

/// Numeric cell as `f64`; null (and any type rejected by the schema check) is missing.
fn extract_f64(col: &ArrayRef, row: usize) -> f64 {
    if col.is_null(row) {
        return f64::NAN;
    }
    match col.data_type() {
        DataType::Float64 => col.as_primitive::<Float64Type>().value(row),
        DataType::Float32 => col.as_primitive::<Float32Type>().value(row) as f64,
        DataType::Int64 => col.as_primitive::<Int64Type>().value(row) as f64,
        DataType::Int32 => col.as_primitive::<Int32Type>().value(row) as f64,
        _ => f64::NAN,
    }
}
