//! Row-level analysis: normalization, summary statistics and Pearson
//! correlation ranking. Every function here is a pure read over the table.

pub mod correlation;
pub mod normalize;
pub mod stats;

pub use correlation::{
    correlation_matrix, pearson, top_correlated, Correlation, CorrelationMatrix,
    CorrelationResult, DEFAULT_TOP_K,
};
pub use normalize::normalize_row;
pub use stats::{summarize, summarize_groups, GroupSummary, Summary};
