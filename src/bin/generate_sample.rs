//! Writes a synthetic expression dataset over the default treatment codes:
//! `sample_expression.tsv` and the same table as `sample_expression.parquet`.
//!
//! Genes fall into co-regulated modules, each responding to a different set
//! of compounds, so correlation queries return meaningful neighbours.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Float64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

use rusty_helix::data::{loader, TreatmentMapping};

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

/// (module name, compounds that induce it, fold change)
const MODULES: &[(&str, &[&str], f64)] = &[
    ("DNA_DAMAGE", &["Doxorubicin", "Daunorubicin"], 4.0),
    ("PROTEASOME", &["Bortezomib"], 6.0),
    ("MITOSIS", &["BI 2536", "PHA-767491"], 0.25),
    ("EGFR", &["WZ8040"], 0.4),
    ("HOUSEKEEPING", &[], 1.0),
];

const GENES_PER_MODULE: usize = 40;

fn write_tsv(path: &Path, codes: &[&str], genes: &[String], rows: &[Vec<f64>]) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut w = BufWriter::new(file);
    writeln!(w, "Gene\t{}", codes.join("\t"))?;
    for (gene, row) in genes.iter().zip(rows) {
        let cells: Vec<String> = row.iter().map(|v| format!("{v:.4}")).collect();
        writeln!(w, "{gene}\t{}", cells.join("\t"))?;
    }
    w.flush()?;
    Ok(())
}

fn write_parquet(path: &Path, codes: &[&str], genes: &[String], rows: &[Vec<f64>]) -> Result<()> {
    let mut fields = vec![Field::new("Gene", DataType::Utf8, false)];
    fields.extend(codes.iter().map(|c| Field::new(*c, DataType::Float64, true)));
    let schema = Arc::new(Schema::new(fields));

    let mut columns: Vec<ArrayRef> = vec![Arc::new(StringArray::from(
        genes.iter().map(String::as_str).collect::<Vec<_>>(),
    ))];
    for col in 0..codes.len() {
        let values: Vec<f64> = rows.iter().map(|r| r[col]).collect();
        columns.push(Arc::new(Float64Array::from(values)));
    }

    let batch = RecordBatch::try_new(schema.clone(), columns).context("building record batch")?;
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = ArrowWriter::try_new(file, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();

    let mut rng = SimpleRng::new(42);
    let mapping = TreatmentMapping::default();
    let codes = mapping.codes();

    let mut genes = Vec::new();
    let mut rows = Vec::new();

    for &(module, compounds, fold) in MODULES {
        for i in 0..GENES_PER_MODULE {
            let baseline = 50.0 + rng.next_f64() * 950.0;
            // each gene follows its module with its own strength
            let strength = 0.6 + rng.next_f64() * 0.4;
            let row: Vec<f64> = codes
                .iter()
                .map(|code| {
                    let induced = compounds.contains(&mapping.treatment_type(code));
                    let effect = if induced { fold.powf(strength) } else { 1.0 };
                    (baseline * effect * rng.gauss(1.0, 0.05)).max(0.0)
                })
                .collect();
            genes.push(format!("{module}_{:03}", i + 1));
            rows.push(row);
        }
    }

    let tsv_path = Path::new("sample_expression.tsv");
    let parquet_path = Path::new("sample_expression.parquet");
    write_tsv(tsv_path, &codes, &genes, &rows)?;
    write_parquet(parquet_path, &codes, &genes, &rows)?;

    // Both outputs must load back as identical tables.
    let from_tsv = loader::load_file(tsv_path)?;
    let from_parquet = loader::load_file(parquet_path)?;
    anyhow::ensure!(
        from_tsv.genes() == from_parquet.genes() && from_tsv.treatments() == from_parquet.treatments(),
        "TSV and Parquet outputs disagree"
    );

    println!(
        "Wrote {} genes x {} treatments to {} and {}",
        genes.len(),
        codes.len(),
        tsv_path.display(),
        parquet_path.display()
    );
    Ok(())
}
