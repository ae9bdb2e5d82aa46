//! Integration tests for rusty-helix
//!
//! These tests load tables from disk and run the query pipeline end to end.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use tempfile::tempdir;

use rusty_helix::analysis::{correlation_matrix, normalize_row, top_correlated};
use rusty_helix::config::Config;
use rusty_helix::dashboard::{Dashboard, Profile};
use rusty_helix::data::{group_by_treatment, loader, LoadError, QueryError, TreatmentMapping};

const SCREEN_TSV: &str = "Gene\tTT-235\tTT-236\tTT-241\tTT-242\tTT-243\tTT-244\n\
TP53\t10.0\t12.0\t40.0\t38.0\t11.0\t13.0\n\
CDKN1A\t5.0\t6.0\t20.0\t19.5\t5.5\t6.5\n\
PSMB5\t30.0\t31.0\t29.0\t30.5\t90.0\t88.0\n\
ACTB\t100.0\t100.0\t100.0\t100.0\t100.0\t100.0\n\
SILENT\t0\t0\t0\t0\t0\t0\n";

fn write_screen(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("screen.tsv");
    fs::write(&path, SCREEN_TSV).unwrap();
    path
}

/// A and C identical, B reversed
#[test]
fn test_abc_scenario_from_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("abc.txt");
    fs::write(
        &path,
        "Gene\tT1\tT2\tT3\tT4\nGeneA\t1\t2\t3\t4\nGeneB\t4\t3\t2\t1\nGeneC\t1\t2\t3\t4\n",
    )
    .unwrap();

    let table = loader::load_file(&path).unwrap();
    let result = top_correlated(&table, "GeneA", 5).unwrap();
    let genes: Vec<&str> = result.genes().collect();
    assert_eq!(genes, ["GeneC", "GeneB"]);
    assert!((result.entries[0].coefficient - 1.0).abs() < 1e-12);
    assert!((result.entries[1].coefficient + 1.0).abs() < 1e-12);

    let v = table.validate_genes(&["GeneA", "Ghost"]);
    assert_eq!(v.valid, ["GeneA"]);
    assert_eq!(v.invalid, ["Ghost"]);
}

#[test]
fn test_every_gene_row_is_complete() {
    let dir = tempdir().unwrap();
    let table = loader::load_file(&write_screen(dir.path())).unwrap();

    assert_eq!(table.len(), 5);
    for gene in table.genes() {
        assert!(table.contains(gene));
        let row = table.get_row(gene).unwrap();
        let codes: Vec<&str> = row.measurements.iter().map(|m| m.treatment.as_str()).collect();
        let header: Vec<&str> = table.treatments().iter().map(String::as_str).collect();
        assert_eq!(codes, header);
        assert!(row.measurements.iter().all(|m| !m.is_missing()));
    }
}

#[test]
fn test_grouped_normalized_profile() {
    let dir = tempdir().unwrap();
    let table = loader::load_file(&write_screen(dir.path())).unwrap();

    let row = table.get_row("TP53").unwrap();
    let normalized = normalize_row(&row).unwrap();
    let groups = group_by_treatment(&normalized, &TreatmentMapping::default());

    let types: Vec<&str> = groups.iter().map(|g| g.treatment_type.as_str()).collect();
    assert_eq!(types, ["DMSO", "Doxorubicin", "Bortezomib"]);
    assert_eq!(groups[1].measurements[0].value, 1.0);
    assert_eq!(groups[0].measurements[0].treatment, "TT-235");

    let silent = table.get_row("SILENT").unwrap();
    assert!(matches!(
        normalize_row(&silent),
        Err(QueryError::DegenerateRow { .. })
    ));
}

#[test]
fn test_dashboard_end_to_end() {
    let dir = tempdir().unwrap();
    let config_path = dir.path().join("rusty-helix.toml");
    fs::write(&config_path, "[analysis]\ntop_k = 2\nmax_group_genes = 3\n").unwrap();
    let config = Config::from_file(&config_path).unwrap();

    let table = loader::load_file(&write_screen(dir.path())).unwrap();
    let dashboard = Dashboard::new(table, config.treatment_mapping(), config.settings());

    let report = dashboard.gene_report("TP53").unwrap();
    assert_eq!(report.correlated.len(), 2);
    assert_eq!(report.correlated.entries[0].gene, "CDKN1A");
    assert!(matches!(report.profile, Profile::Normalized { .. }));

    // constant rows rank last with an undefined coefficient
    let all = top_correlated(dashboard.table(), "TP53", 10).unwrap();
    assert_eq!(all.len(), 4);
    assert!(all.entries[2].coefficient.is_nan());
    assert!(all.entries[3].coefficient.is_nan());

    let group = dashboard.group_report(&["TP53", "Ghost", "SILENT"]).unwrap();
    assert_eq!(group.validation.invalid, ["Ghost"]);
    assert_eq!(group.normalized.len(), 1);
    assert_eq!(group.degenerate[0].gene, "SILENT");
    assert!(group.correlation.is_some());

    assert!(matches!(
        dashboard.group_report(&["TP53", "CDKN1A", "PSMB5", "ACTB"]),
        Err(QueryError::TooManyGenes { requested: 4, limit: 3 })
    ));

    let json = serde_json::to_value(&group).unwrap();
    assert_eq!(json["validation"]["invalid"][0], "Ghost");
}

#[test]
fn test_correlation_matrix_from_file() {
    let dir = tempdir().unwrap();
    let table = loader::load_file(&write_screen(dir.path())).unwrap();
    let m = correlation_matrix(&table, &["TP53", "CDKN1A", "PSMB5"]).unwrap();
    let v = m.values();
    for i in 0..3 {
        assert_eq!(v[[i, i]], 1.0);
        for j in 0..3 {
            assert!((v[[i, j]] - v[[j, i]]).abs() < 1e-9);
        }
    }
    assert!(m.get("TP53", "CDKN1A").unwrap() > 0.99);
}

#[test]
fn test_load_errors() {
    let dir = tempdir().unwrap();

    let empty = dir.path().join("empty.tsv");
    fs::write(&empty, "").unwrap();
    assert!(matches!(loader::load_file(&empty), Err(LoadError::Empty(_))));

    let ragged = dir.path().join("ragged.tsv");
    fs::write(&ragged, "Gene\tT1\tT2\nA\t1\t2\nB\t1\t2\t3\n").unwrap();
    assert!(matches!(
        loader::load_file(&ragged),
        Err(LoadError::RaggedRow { line: 3, .. })
    ));

    let dup = dir.path().join("dup.tsv");
    fs::write(&dup, "Gene\tT1\nA\t1\nA\t2\n").unwrap();
    assert!(matches!(
        loader::load_file(&dup),
        Err(LoadError::DuplicateGene { .. })
    ));

    let missing = dir.path().join("missing.tsv");
    assert!(matches!(loader::load_file(&missing), Err(LoadError::Io { .. })));
}

fn write_parquet(path: &Path, schema: Schema, columns: Vec<ArrayRef>) {
    let schema = Arc::new(schema);
    let batch = RecordBatch::try_new(schema.clone(), columns).unwrap();
    let file = fs::File::create(path).unwrap();
    let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
    writer.write(&batch).unwrap();
    writer.close().unwrap();
}

#[test]
fn test_parquet_matches_tsv() {
    let dir = tempdir().unwrap();
    let tsv = loader::load_file(&write_screen(dir.path())).unwrap();

    let mut fields = vec![Field::new("Gene", DataType::Utf8, false)];
    fields.extend(
        tsv.treatments()
            .iter()
            .map(|t| Field::new(t.as_str(), DataType::Float64, true)),
    );
    let mut columns: Vec<ArrayRef> = vec![Arc::new(StringArray::from(
        tsv.genes().iter().map(String::as_str).collect::<Vec<_>>(),
    ))];
    for col in tsv.values().columns() {
        columns.push(Arc::new(Float64Array::from(col.to_vec())));
    }

    let path = dir.path().join("screen.parquet");
    write_parquet(&path, Schema::new(fields), columns);

    let pq = loader::load_file(&path).unwrap();
    assert_eq!(pq.genes(), tsv.genes());
    assert_eq!(pq.treatments(), tsv.treatments());
    assert_eq!(pq.values(), tsv.values());
}

#[test]
fn test_parquet_nulls_and_integers() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("mixed.parquet");
    write_parquet(
        &path,
        Schema::new(vec![
            Field::new("Gene", DataType::Utf8, false),
            Field::new("T1", DataType::Int64, true),
            Field::new("T2", DataType::Float64, true),
        ]),
        vec![
            Arc::new(StringArray::from(vec!["A", "B"])),
            Arc::new(Int64Array::from(vec![Some(3), None])),
            Arc::new(Float64Array::from(vec![Some(1.5), Some(2.5)])),
        ],
    );

    let table = loader::load_file(&path).unwrap();
    assert_eq!(table.get_row("A").unwrap().measurements[0].value, 3.0);
    assert!(table.get_row("B").unwrap().measurements[0].is_missing());
}

#[test]
fn test_parquet_rejects_non_string_gene_column() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bad.parquet");
    write_parquet(
        &path,
        Schema::new(vec![
            Field::new("id", DataType::Int64, false),
            Field::new("T1", DataType::Float64, false),
        ]),
        vec![
            Arc::new(Int64Array::from(vec![1, 2])),
            Arc::new(Float64Array::from(vec![1.0, 2.0])),
        ],
    );
    assert!(matches!(loader::load_file(&path), Err(LoadError::Schema(_))));
}
