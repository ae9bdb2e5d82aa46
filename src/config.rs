//! TOML configuration file support.
//!
//! Every setting is optional; command-line flags take precedence.
//!
//! ```toml
//! # rusty-helix.toml
//! [data]
//! path = "Anticancer_Drug_Treatment_DATA.txt"
//!
//! [analysis]
//! top_k = 10
//! max_group_genes = 5
//!
//! # Replaces the built-in mapping when non-empty
//! [treatments]
//! "TT-235" = "DMSO"
//! "TT-241" = "Doxorubicin"
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::dashboard::Settings;
use crate::data::TreatmentMapping;

/// Root configuration structure for rusty-helix.toml files.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Input dataset settings.
    #[serde(default)]
    pub data: DataConfig,

    /// Query settings.
    #[serde(default)]
    pub analysis: AnalysisConfig,

    /// Treatment code → treatment type overrides.
    #[serde(default)]
    pub treatments: BTreeMap<String, String>,
}

/// Where the expression table lives.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DataConfig {
    /// Path to the .tsv / .csv / .parquet table.
    pub path: Option<PathBuf>,
}

/// Limits applied to queries.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnalysisConfig {
    /// Number of correlated genes to report.
    pub top_k: Option<usize>,

    /// Maximum number of genes compared in one group query.
    pub max_group_genes: Option<usize>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse TOML configuration")
    }

    /// The configured mapping, or the built-in one when `[treatments]` is empty.
    pub fn treatment_mapping(&self) -> TreatmentMapping {
        if self.treatments.is_empty() {
            TreatmentMapping::default()
        } else {
            TreatmentMapping::from(self.treatments.clone())
        }
    }

    /// Query settings with defaults filled in.
    pub fn settings(&self) -> Settings {
        let defaults = Settings::default();
        Settings {
            top_k: self.analysis.top_k.unwrap_or(defaults.top_k),
            max_group_genes: self
                .analysis
                .max_group_genes
                .unwrap_or(defaults.max_group_genes),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::UNKNOWN_TREATMENT;

    #[test]
    fn test_parse_config() {
        let toml = r#"
            [data]
            path = "expr.tsv"

            [analysis]
            top_k = 25
            max_group_genes = 8

            [treatments]
            "TT-1" = "Vehicle"
            "TT-2" = "Drug"
        "#;

        let config = Config::from_str(toml).unwrap();
        assert_eq!(config.data.path, Some(PathBuf::from("expr.tsv")));
        assert_eq!(
            config.settings(),
            Settings {
                top_k: 25,
                max_group_genes: 8
            }
        );

        let mapping = config.treatment_mapping();
        assert_eq!(mapping.len(), 2);
        assert_eq!(mapping.treatment_type("TT-2"), "Drug");
        assert_eq!(mapping.treatment_type("TT-235"), UNKNOWN_TREATMENT);
    }

    #[test]
    fn test_partial_config() {
        let toml = r#"
            [analysis]
            top_k = 3
        "#;

        let config = Config::from_str(toml).unwrap();
        assert_eq!(config.settings().top_k, 3);
        assert_eq!(config.settings().max_group_genes, Settings::default().max_group_genes);
        assert_eq!(config.data.path, None);
    }

    #[test]
    fn test_empty_config() {
        let config = Config::from_str("").unwrap();
        assert_eq!(config.settings(), Settings::default());
        assert_eq!(config.treatment_mapping(), TreatmentMapping::default());
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(Config::from_str("[analysis]\ntopk = 3\n").is_err());
    }
}
