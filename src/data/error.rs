use std::path::PathBuf;

// ---------------------------------------------------------------------------
// Load errors – fatal, the table is never partially built
// ---------------------------------------------------------------------------

/// Errors raised while building an [`ExpressionTable`](super::model::ExpressionTable).
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// I/O error
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Delimited-text parse error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Arrow error
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// Parquet error
    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    /// Source contained no header or no gene rows
    #[error("source is empty: {0}")]
    Empty(&'static str),

    /// Header has a gene column but no treatment columns
    #[error("header row has no treatment columns")]
    MissingTreatments,

    /// Row with a different number of cells than the header
    #[error("line {line}: expected {expected} columns, found {found}")]
    RaggedRow {
        line: u64,
        expected: usize,
        found: usize,
    },

    /// Cell that is neither a finite number nor a missing marker
    #[error("line {line}, gene '{gene}', treatment '{treatment}': '{value}' is not a finite number")]
    InvalidValue {
        line: u64,
        gene: String,
        treatment: String,
        value: String,
    },

    /// Gene identifier appearing twice in the first column
    #[error("duplicate gene '{gene}' on line {line} (first seen on line {first_line})")]
    DuplicateGene {
        gene: String,
        line: u64,
        first_line: u64,
    },

    /// Treatment code appearing twice in the header
    #[error("duplicate treatment code '{0}' in header")]
    DuplicateTreatment(String),

    /// File extension we don't know how to read
    #[error("unsupported file extension: .{0}")]
    UnsupportedFormat(String),

    /// Parquet schema that doesn't look like a gene × treatment table
    #[error("invalid schema: {0}")]
    Schema(String),
}

// ---------------------------------------------------------------------------
// Query errors – local to a single request
// ---------------------------------------------------------------------------

/// Errors raised by per-query operations. None of them invalidate the table.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum QueryError {
    #[error("gene '{0}' not found in the dataset")]
    GeneNotFound(String),

    #[error("cannot normalize gene '{gene}': {reason}")]
    DegenerateRow { gene: String, reason: String },

    #[error("{requested} genes requested, at most {limit} can be compared at once")]
    TooManyGenes { requested: usize, limit: usize },
}
