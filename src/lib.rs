//! # rusty-helix – gene expression explorer
//!
//! Loads a gene × treatment expression table once and answers read-only
//! queries against it:
//!
//! - **Lookup** – membership, row access and partitioning of requested gene
//!   names into known and unknown ([`data::ExpressionTable`]).
//! - **Profiles** – max-normalization of a row and grouping of its treatment
//!   columns by treatment type ([`analysis::normalize_row`],
//!   [`data::group_by_treatment`]) with per-group mean and standard deviation.
//! - **Correlation** – Pearson ranking of every other gene against a query
//!   gene, and pairwise matrices for small gene sets
//!   ([`analysis::top_correlated`], [`analysis::correlation_matrix`]).
//!
//! [`dashboard::Dashboard`] bundles the table, the treatment mapping and the
//! query limits, and assembles serializable reports for a front end.
//!
//! ```rust,no_run
//! use std::path::Path;
//! use rusty_helix::dashboard::{Dashboard, Settings};
//! use rusty_helix::data::{loader, TreatmentMapping};
//!
//! let table = loader::load_file(Path::new("Anticancer_Drug_Treatment_DATA.txt"))?;
//! let dashboard = Dashboard::new(table, TreatmentMapping::default(), Settings::default());
//!
//! let report = dashboard.gene_report("TP53")?;
//! for c in &report.correlated.entries {
//!     println!("{}\t{:.3}", c.gene, c.coefficient);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod analysis;
pub mod config;
pub mod dashboard;
pub mod data;
