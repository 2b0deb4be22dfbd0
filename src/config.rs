//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.mitoenrich.toml` files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::genes::MITOCHONDRIAL_ALIASES;

/// Name of the configuration file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = ".mitoenrich.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// External service endpoints.
    #[serde(default)]
    pub services: ServicesConfig,

    /// Enrichment settings.
    #[serde(default)]
    pub enrichment: EnrichmentConfig,

    /// Identifier normalization settings.
    #[serde(default)]
    pub normalization: NormalizationConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,

    /// Number of enrichment libraries queried at once.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            concurrency: default_concurrency(),
        }
    }
}

fn default_concurrency() -> usize {
    1
}

/// External service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServicesConfig {
    /// MyGene.info API base URL.
    #[serde(default = "default_mygene_url")]
    pub mygene_url: String,

    /// Enrichr host; the organism picks the Enrichr flavor below it.
    #[serde(default = "default_enrichr_url")]
    pub enrichr_url: String,

    /// g:Profiler base URL.
    #[serde(default = "default_gprofiler_url")]
    pub gprofiler_url: String,

    /// Request timeout in seconds, applied to every call.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for ServicesConfig {
    fn default() -> Self {
        Self {
            mygene_url: default_mygene_url(),
            enrichr_url: default_enrichr_url(),
            gprofiler_url: default_gprofiler_url(),
            timeout_seconds: default_timeout(),
        }
    }
}

fn default_mygene_url() -> String {
    "https://mygene.info/v3".to_string()
}

fn default_enrichr_url() -> String {
    "https://maayanlab.cloud".to_string()
}

fn default_gprofiler_url() -> String {
    "https://biit.cs.ut.ee/gprofiler".to_string()
}

fn default_timeout() -> u64 {
    60
}

/// Enrichment settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichmentConfig {
    /// Enrichr libraries, queried and reported in this order.
    #[serde(default = "default_libraries")]
    pub libraries: Vec<String>,

    /// Species for the ID mapping and Enrichr queries.
    #[serde(default = "default_species")]
    pub species: String,

    /// g:Profiler organism code.
    #[serde(default = "default_gprofiler_organism")]
    pub gprofiler_organism: String,

    /// Significance cutoff passed to every source (1.0 keeps everything).
    #[serde(default = "default_cutoff")]
    pub cutoff: f64,

    /// Rows kept per source in the summary.
    #[serde(default = "default_top_n")]
    pub top_n: usize,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            libraries: default_libraries(),
            species: default_species(),
            gprofiler_organism: default_gprofiler_organism(),
            cutoff: default_cutoff(),
            top_n: default_top_n(),
        }
    }
}

fn default_libraries() -> Vec<String> {
    vec![
        "GO_Biological_Process_2023",
        "GO_Molecular_Function_2023",
        "GO_Cellular_Component_2023",
        "KEGG_2021_Human",
        "Reactome_2022",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_species() -> String {
    "human".to_string()
}

fn default_gprofiler_organism() -> String {
    "hsapiens".to_string()
}

fn default_cutoff() -> f64 {
    1.0
}

fn default_top_n() -> usize {
    10
}

/// Identifier normalization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizationConfig {
    /// Alias -> canonical symbol. Replaces the built-in table when set.
    #[serde(default = "default_aliases")]
    pub aliases: BTreeMap<String, String>,
}

impl Default for NormalizationConfig {
    fn default() -> Self {
        Self {
            aliases: default_aliases(),
        }
    }
}

fn default_aliases() -> BTreeMap<String, String> {
    MITOCHONDRIAL_ALIASES
        .iter()
        .map(|(alias, canonical)| (alias.to_string(), canonical.to_string()))
        .collect()
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(DEFAULT_CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    /// This method only overrides config when CLI provides explicit values.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(timeout) = args.timeout {
            self.services.timeout_seconds = timeout;
        }

        if let Some(concurrency) = args.concurrency {
            self.general.concurrency = concurrency;
        }

        if let Some(top_n) = args.top_n {
            self.enrichment.top_n = top_n;
        }

        if let Some(ref libraries) = args.libraries {
            self.enrichment.libraries = libraries
                .iter()
                .map(|lib| lib.trim())
                .filter(|lib| !lib.is_empty())
                .map(String::from)
                .collect();
        }

        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
