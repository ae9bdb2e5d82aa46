//! Plain-text rendering of query results.

use std::io::{self, Write};

use rusty_helix::analysis::{CorrelationMatrix, CorrelationResult};
use rusty_helix::dashboard::{DatasetOverview, GeneReport, GroupReport, Profile};
use rusty_helix::data::model::{GENE_AXIS, TREATMENT_AXIS};
use rusty_helix::data::{ExpressionTable, GeneRow};

/// Missing or undefined values print as `NA`, which the loader reads back.
fn fmt_value(v: f64) -> String {
    if v.is_nan() {
        "NA".to_string()
    } else {
        format!("{v:.4}")
    }
}

fn write_row(w: &mut impl Write, row: &GeneRow) -> io::Result<()> {
    for m in &row.measurements {
        writeln!(w, "  {:<10} {:>12}", m.treatment, fmt_value(m.value))?;
    }
    Ok(())
}

pub fn write_overview(w: &mut impl Write, overview: &DatasetOverview) -> io::Result<()> {
    writeln!(w, "{:<10} rows:    {}", GENE_AXIS, overview.genes)?;
    writeln!(w, "{:<10} columns: {}", TREATMENT_AXIS, overview.treatments.len())?;
    writeln!(w)?;
    for t in &overview.treatment_types {
        writeln!(w, "  {:<14} {}", t.treatment_type, t.codes.join(", "))?;
    }
    if !overview.unmapped.is_empty() {
        writeln!(w)?;
        writeln!(w, "Unmapped treatment codes: {}", overview.unmapped.join(", "))?;
    }
    Ok(())
}

pub fn write_correlated(w: &mut impl Write, result: &CorrelationResult) -> io::Result<()> {
    writeln!(w, "Top {} correlated genes with {}", result.len(), result.query)?;
    for (rank, c) in result.entries.iter().enumerate() {
        writeln!(w, "  {:>3}. {:<16} {:>8}", rank + 1, c.gene, fmt_value(c.coefficient))?;
    }
    Ok(())
}

pub fn write_gene_report(w: &mut impl Write, report: &GeneReport) -> io::Result<()> {
    writeln!(w, "Expression levels of {}", report.gene)?;
    write_row(w, &report.expression)?;
    writeln!(w)?;

    writeln!(w, "Normalized expression by treatment type")?;
    match &report.profile {
        Profile::Normalized { groups } => {
            for g in groups {
                writeln!(
                    w,
                    "  {:<14} mean {:>8}  sd {:>8}  (n = {})",
                    g.treatment_type,
                    fmt_value(g.summary.mean),
                    fmt_value(g.summary.std_dev),
                    g.summary.n
                )?;
                for m in &g.measurements {
                    writeln!(w, "    {:<10} {:>8}", m.treatment, fmt_value(m.value))?;
                }
            }
        }
        Profile::Degenerate { reason } => writeln!(w, "  not available: {reason}")?,
    }
    writeln!(w)?;

    write_correlated(w, &report.correlated)
}

fn write_matrix(w: &mut impl Write, matrix: &CorrelationMatrix) -> io::Result<()> {
    write!(w, "{:<12}", "")?;
    for g in matrix.genes() {
        write!(w, " {g:>10}")?;
    }
    writeln!(w)?;
    for (g, row) in matrix.genes().iter().zip(matrix.to_rows()) {
        write!(w, "{g:<12}")?;
        for v in row {
            write!(w, " {:>10}", fmt_value(v))?;
        }
        writeln!(w)?;
    }
    Ok(())
}

pub fn write_group_report(w: &mut impl Write, report: &GroupReport) -> io::Result<()> {
    if !report.validation.invalid.is_empty() {
        writeln!(
            w,
            "The following genes were not found: {}",
            report.validation.invalid.join(", ")
        )?;
        writeln!(w)?;
    }
    if report.expression.is_empty() {
        writeln!(w, "No valid genes to compare.")?;
        return Ok(());
    }

    for row in &report.expression {
        writeln!(w, "Expression levels of {}", row.gene)?;
        write_row(w, row)?;
        writeln!(w)?;
    }
    for d in &report.degenerate {
        writeln!(w, "Normalized profile of {} not available: {}", d.gene, d.reason)?;
    }

    if let Some(matrix) = &report.correlation {
        writeln!(w, "Correlation matrix")?;
        write_matrix(w, matrix)?;
    }
    Ok(())
}

/// Tab-separated dump in the same layout the loader reads.
pub fn write_table(w: &mut impl Write, table: &ExpressionTable, limit: Option<usize>) -> io::Result<()> {
    writeln!(w, "{GENE_AXIS}\t{}", table.treatments().join("\t"))?;
    for (gene, values) in table.rows().take(limit.unwrap_or(usize::MAX)) {
        let cells: Vec<String> = values
            .iter()
            .map(|&v| if v.is_nan() { "NA".to_string() } else { v.to_string() })
            .collect();
        writeln!(w, "{gene}\t{}", cells.join("\t"))?;
    }
    Ok(())
}
