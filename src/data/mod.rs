//! Data layer: core types, loading, and treatment grouping.
//!
//! Architecture:
//! ```text
//!  .tsv / .csv / .parquet
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  loader   │  parse file → ExpressionTable (rejects ragged / duplicate rows)
//!   └──────────┘
//!        │
//!        ▼
//!   ┌─────────────────┐
//!   │ ExpressionTable  │  genes × treatments, gene index, row lookup
//!   └─────────────────┘
//!        │
//!        ▼
//!   ┌───────────┐
//!   │ treatment  │  treatment code → type, group a row by type
//!   └───────────┘
//! ```

pub mod error;
pub mod loader;
pub mod model;
pub mod treatment;

pub use error::{LoadError, QueryError};
pub use model::{ExpressionTable, GeneRow, GeneValidation, Measurement};
pub use treatment::{group_by_treatment, TreatmentGroup, TreatmentMapping, UNKNOWN_TREATMENT};
