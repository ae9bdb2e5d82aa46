use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use serde::Serialize;

use rusty_helix::config::Config;
use rusty_helix::dashboard::Dashboard;
use rusty_helix::data::loader;

mod output;

/// Dataset file name used when neither `--data` nor the config names one.
pub const DEFAULT_DATA_PATH: &str = "Anticancer_Drug_Treatment_DATA.txt";

/// Config file picked up from the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_PATH: &str = "rusty-helix.toml";

/// rusty-helix - explore gene expression across drug treatments
#[derive(Parser)]
#[command(name = "rusty-helix")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Verbosity level (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// TOML configuration file
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Expression table (.tsv, .txt, .csv or .parquet)
    #[arg(short, long, value_name = "FILE", global = true)]
    data: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    /// Default `env_logger` filter for the `-v` count. `RUST_LOG` still wins.
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Show dataset dimensions and treatment types
    Info,

    /// Expression profile and top correlated genes for one gene
    Gene {
        /// Gene identifier (case-sensitive)
        gene: String,

        /// Number of correlated genes to list
        #[arg(short = 'k', long)]
        top: Option<usize>,
    },

    /// Genes most correlated with one gene
    Correlated {
        /// Gene identifier (case-sensitive)
        gene: String,

        /// Number of correlated genes to list
        #[arg(short = 'k', long)]
        top: Option<usize>,
    },

    /// Compare a small group of genes
    Group {
        /// Gene identifiers; unknown ones are reported and skipped
        #[arg(required = true, num_args = 1..)]
        genes: Vec<String>,
    },

    /// Dump the raw table as TSV
    Table {
        /// Only print the first N genes
        #[arg(short, long)]
        limit: Option<usize>,
    },
}

fn load_config(explicit: Option<&Path>) -> Result<Config> {
    match explicit {
        Some(path) => Config::from_file(path),
        None => {
            let fallback = Path::new(DEFAULT_CONFIG_PATH);
            if fallback.exists() {
                info!("Using config file {}", fallback.display());
                Config::from_file(fallback)
            } else {
                Ok(Config::default())
            }
        }
    }
}

fn print_json<T: Serialize>(out: &mut impl Write, value: &T) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, value).context("Failed to serialize JSON")?;
    writeln!(out)?;
    Ok(())
}

/// Execute the parsed command line.
pub fn run(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref())?;

    let data_path = cli
        .data
        .clone()
        .or_else(|| config.data.path.clone())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_PATH));

    let mut settings = config.settings();
    if let Commands::Gene { top: Some(k), .. } | Commands::Correlated { top: Some(k), .. } =
        &cli.command
    {
        settings.top_k = *k;
    }

    let table = loader::load_file(&data_path).with_context(|| {
        format!("Failed to load expression table {}", data_path.display())
    })?;
    let dashboard = Dashboard::new(table, config.treatment_mapping(), settings);

    let stdout = io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Commands::Info => {
            let overview = dashboard.overview();
            if cli.json {
                print_json(&mut out, &overview)?;
            } else {
                output::write_overview(&mut out, &overview)?;
            }
        }

        Commands::Gene { gene, .. } => {
            let report = dashboard.gene_report(&gene)?;
            if cli.json {
                print_json(&mut out, &report)?;
            } else {
                output::write_gene_report(&mut out, &report)?;
            }
        }

        Commands::Correlated { gene, .. } => {
            let result = dashboard.correlated(&gene)?;
            if cli.json {
                print_json(&mut out, &result)?;
            } else {
                output::write_correlated(&mut out, &result)?;
            }
        }

        Commands::Group { genes } => {
            let report = dashboard.group_report(&genes)?;
            if cli.json {
                print_json(&mut out, &report)?;
            } else {
                output::write_group_report(&mut out, &report)?;
            }
        }

        Commands::Table { limit } => {
            output::write_table(&mut out, dashboard.table(), limit)?;
        }
    }

    Ok(())
}
