//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use std::path::PathBuf;

/// MitoEnrich - gene list normalization, ID mapping and enrichment
///
/// Reads a list of gene symbols, fixes common mitochondrial aliases
/// (ND1 -> MT-ND1, CO1 -> MT-CO1, ...), maps them with MyGene.info and
/// runs enrichment against Enrichr libraries and g:Profiler. Every
/// table is written as TSV under the output prefix.
///
/// Examples:
///   mitoenrich -i genes.txt -o results/cox_nd1_atp6
///   mitoenrich -i genes.txt -o out/run --libraries KEGG_2021_Human,Reactome_2022
///   mitoenrich -i genes.txt -o out/run --concurrency 5 --timeout 30
///   mitoenrich --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Path to the gene list
    ///
    /// One or more symbols per line, separated by commas or whitespace.
    /// Blank lines and lines starting with '#' are ignored.
    #[arg(short, long, value_name = "FILE", required_unless_present = "init_config")]
    pub input: Option<PathBuf>,

    /// Output prefix, e.g. results/analysis_cox_nd1_atp6
    ///
    /// Files are written as <PREFIX>_genes_clean.tsv, <PREFIX>_mapping.tsv, ...
    #[arg(short, long, value_name = "PREFIX", required_unless_present = "init_config")]
    pub output: Option<String>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .mitoenrich.toml in the current directory
    #[arg(short, long, value_name = "FILE", env = "MITOENRICH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Request timeout in seconds for every external service call
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Number of Enrichr libraries queried at once
    #[arg(long, value_name = "NUM")]
    pub concurrency: Option<usize>,

    /// Rows kept per source in the summary table
    #[arg(long, value_name = "COUNT")]
    pub top_n: Option<usize>,

    /// Enrichr libraries to query (comma-separated)
    ///
    /// Example: --libraries KEGG_2021_Human,Reactome_2022
    #[arg(long, value_name = "LIBS", value_delimiter = ',')]
    pub libraries: Option<Vec<String>>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .mitoenrich.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Input path, empty if not set (should be validated first).
    pub fn input_path(&self) -> PathBuf {
        self.input.clone().unwrap_or_default()
    }

    /// Output prefix, empty if not set (should be validated first).
    pub fn output_prefix(&self) -> &str {
        self.output.as_deref().unwrap_or("")
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if self.output_prefix().trim().is_empty() {
            return Err("Output prefix must not be empty".to_string());
        }

        if self.output_prefix().ends_with('/') {
            return Err("Output prefix must name a file prefix, not a directory".to_string());
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        if let Some(concurrency) = self.concurrency {
            if concurrency == 0 {
                return Err("Concurrency must be at least 1".to_string());
            }
        }

        if let Some(top_n) = self.top_n {
            if top_n == 0 {
                return Err("Top-N must be at least 1".to_string());
            }
        }

        if let Some(ref libraries) = self.libraries {
            if libraries.iter().all(|lib| lib.trim().is_empty()) {
                return Err("At least one Enrichr library is required".to_string());
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    ///
    /// `--quiet` wins over a verbose flag or config setting.
    pub fn log_level(&self, config_verbose: bool) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose || config_verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
