use log::{debug, info, warn};
use serde::Serialize;

use crate::analysis::{
    correlation_matrix, normalize_row, summarize_groups, top_correlated, CorrelationMatrix,
    CorrelationResult, Summary, DEFAULT_TOP_K,
};
use crate::data::{
    group_by_treatment, ExpressionTable, GeneRow, GeneValidation, Measurement, QueryError,
    TreatmentMapping,
};

/// Default number of genes that can be compared in one group query.
pub const DEFAULT_MAX_GROUP_GENES: usize = 5;

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// Per-query limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    /// Number of correlated genes listed in a gene report.
    pub top_k: usize,
    /// Upper bound on non-empty genes in a group query.
    pub max_group_genes: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            max_group_genes: DEFAULT_MAX_GROUP_GENES,
        }
    }
}

// ---------------------------------------------------------------------------
// Report types
// ---------------------------------------------------------------------------

/// Normalized values of one treatment type with their mean and spread.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileGroup {
    pub treatment_type: String,
    pub measurements: Vec<Measurement>,
    pub summary: Summary,
}

/// Max-normalized profile of a gene, or why it couldn't be built.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Profile {
    Normalized { groups: Vec<ProfileGroup> },
    Degenerate { reason: String },
}

/// Everything shown for a single gene: raw row, grouped normalized profile
/// and the most correlated genes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneReport {
    pub gene: String,
    pub expression: GeneRow,
    pub profile: Profile,
    pub correlated: CorrelationResult,
}

/// A requested gene whose row couldn't be normalized.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DegenerateGene {
    pub gene: String,
    pub reason: String,
}

/// Comparison of a small set of genes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupReport {
    /// Non-empty requested genes, in input order.
    pub requested: Vec<String>,
    pub validation: GeneValidation,
    /// Raw rows of the valid genes.
    pub expression: Vec<GeneRow>,
    /// Normalized rows of the valid genes that could be normalized.
    pub normalized: Vec<GeneRow>,
    pub degenerate: Vec<DegenerateGene>,
    /// Present when at least two genes are valid.
    pub correlation: Option<CorrelationMatrix>,
}

/// The treatment codes that make up one treatment type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreatmentTypeCodes {
    pub treatment_type: String,
    pub codes: Vec<String>,
}

/// Shape of the loaded dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatasetOverview {
    pub genes: usize,
    pub treatments: Vec<String>,
    pub treatment_types: Vec<TreatmentTypeCodes>,
    /// Treatment codes without a mapping entry.
    pub unmapped: Vec<String>,
}

// ---------------------------------------------------------------------------
// Dashboard
// ---------------------------------------------------------------------------

/// Read-only query front for one loaded table. Construct once, share by
/// reference; no query mutates it.
#[derive(Debug, Clone)]
pub struct Dashboard {
    table: ExpressionTable,
    mapping: TreatmentMapping,
    settings: Settings,
}

impl Dashboard {
    pub fn new(table: ExpressionTable, mapping: TreatmentMapping, settings: Settings) -> Self {
        let unmapped = mapping.unmapped(table.treatments());
        if !unmapped.is_empty() {
            warn!(
                "{} treatment codes have no treatment type and will be grouped as Unknown: {}",
                unmapped.len(),
                unmapped.join(", ")
            );
        }
        info!(
            "Dashboard ready: {} genes, {} treatments, top_k = {}",
            table.len(),
            table.n_treatments(),
            settings.top_k
        );
        Self {
            table,
            mapping,
            settings,
        }
    }

    pub fn table(&self) -> &ExpressionTable {
        &self.table
    }

    /// Gene count, treatment codes grouped by type, and unmapped codes.
    pub fn overview(&self) -> DatasetOverview {
        let mut treatment_types: Vec<TreatmentTypeCodes> = Vec::new();
        for code in self.table.treatments() {
            let ty = self.mapping.treatment_type(code);
            match treatment_types.iter_mut().find(|t| t.treatment_type == ty) {
                Some(entry) => entry.codes.push(code.clone()),
                None => treatment_types.push(TreatmentTypeCodes {
                    treatment_type: ty.to_string(),
                    codes: vec![code.clone()],
                }),
            }
        }

        DatasetOverview {
            genes: self.table.len(),
            treatments: self.table.treatments().to_vec(),
            treatment_types,
            unmapped: self
                .mapping
                .unmapped(self.table.treatments())
                .into_iter()
                .map(str::to_string)
                .collect(),
        }
    }

    /// Top correlated genes using the configured `top_k`.
    pub fn correlated(&self, gene: &str) -> Result<CorrelationResult, QueryError> {
        top_correlated(&self.table, gene, self.settings.top_k)
    }

    /// Raw row, normalized grouped profile and top correlations for `gene`.
    ///
    /// A row that can't be normalized yields [`Profile::Degenerate`]; only an
    /// unknown gene is an error.
    pub fn gene_report(&self, gene: &str) -> Result<GeneReport, QueryError> {
        debug!("Gene report for {gene}");
        let expression = self.table.get_row(gene)?;
        let profile = self.profile(&expression);
        let correlated = self.correlated(gene)?;

        Ok(GeneReport {
            gene: gene.to_string(),
            expression,
            profile,
            correlated,
        })
    }

    fn profile(&self, row: &GeneRow) -> Profile {
        match normalize_row(row) {
            Ok(normalized) => {
                let groups = group_by_treatment(&normalized, &self.mapping);
                let summaries = summarize_groups(&groups);
                Profile::Normalized {
                    groups: groups
                        .into_iter()
                        .zip(summaries)
                        .map(|(g, s)| ProfileGroup {
                            treatment_type: g.treatment_type,
                            measurements: g.measurements,
                            summary: s.summary,
                        })
                        .collect(),
                }
            }
            Err(e) => Profile::Degenerate {
                reason: degenerate_reason(e),
            },
        }
    }

    /// Compare a handful of genes.
    ///
    /// Empty entries are ignored. Whitespace-only entries are kept and end up
    /// in `validation.invalid` like any other unknown name. Unknown genes are reported in
    /// `validation.invalid` while the valid ones are still analyzed.
    pub fn group_report<S: AsRef<str>>(&self, genes: &[S]) -> Result<GroupReport, QueryError> {
        let requested: Vec<String> = genes
            .iter()
            .map(|g| g.as_ref())
            .filter(|g| !g.is_empty())
            .map(str::to_string)
            .collect();
        if requested.len() > self.settings.max_group_genes {
            return Err(QueryError::TooManyGenes {
                requested: requested.len(),
                limit: self.settings.max_group_genes,
            });
        }

        let validation = self.table.validate_genes(&requested);
        if !validation.all_valid() {
            warn!("Genes not found: {}", validation.invalid.join(", "));
        }

        let expression = validation
            .valid
            .iter()
            .map(|g| self.table.get_row(g))
            .collect::<Result<Vec<_>, _>>()?;

        let mut normalized = Vec::with_capacity(expression.len());
        let mut degenerate = Vec::new();
        for row in &expression {
            match normalize_row(row) {
                Ok(n) => normalized.push(n),
                Err(e) => degenerate.push(DegenerateGene {
                    gene: row.gene.clone(),
                    reason: degenerate_reason(e),
                }),
            }
        }

        let correlation = if validation.valid.len() > 1 {
            Some(correlation_matrix(&self.table, &validation.valid)?)
        } else {
            None
        };

        Ok(GroupReport {
            requested,
            validation,
            expression,
            normalized,
            degenerate,
            correlation,
        })
    }
}

fn degenerate_reason(err: QueryError) -> String {
    match err {
        QueryError::DegenerateRow { reason, .. } => reason,
        other => other.to_string(),
    }
}
