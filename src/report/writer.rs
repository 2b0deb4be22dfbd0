//! Tab-separated output tables.
//!
//! Every table is written with a header row taken from the row type's
//! field names, so column order follows the struct definition.

use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Output file names derived from the user's prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    prefix: String,
}

impl OutputPaths {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    fn file(&self, suffix: &str) -> PathBuf {
        PathBuf::from(format!("{}_{}.tsv", self.prefix, suffix))
    }

    pub fn genes_clean(&self) -> PathBuf {
        self.file("genes_clean")
    }

    pub fn mapping(&self) -> PathBuf {
        self.file("mapping")
    }

    pub fn enrichr(&self, library: &str) -> PathBuf {
        self.file(&format!("enrichr_{}", file_safe(library)))
    }

    pub fn gprofiler(&self) -> PathBuf {
        self.file("gprofiler")
    }

    pub fn summary(&self) -> PathBuf {
        self.file("resumen")
    }

    /// Create the directory the prefix points into, if any.
    pub fn ensure_parent_dir(&self) -> Result<()> {
        let parent = self.genes_clean().parent().map(Path::to_path_buf);
        match parent {
            Some(dir) if !dir.as_os_str().is_empty() => fs::create_dir_all(&dir)
                .with_context(|| format!("Failed to create output directory {}", dir.display())),
            _ => Ok(()),
        }
    }
}

/// Replace characters that do not belong in a file name.
fn file_safe(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Write rows as TSV with a header line.
pub fn write_tsv<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;

    for row in rows {
        writer
            .serialize(row)
            .with_context(|| format!("Failed to write row to {}", path.display()))?;
    }

    writer
        .flush()
        .with_context(|| format!("Failed to write {}", path.display()))?;

    debug!("Wrote {} rows to {}", rows.len(), path.display());
    Ok(())
}

/// Read a TSV table written by [`write_tsv`].
#[cfg(test)]
pub fn read_tsv<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .from_path(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;

    reader
        .deserialize()
        .collect::<Result<Vec<T>, csv::Error>>()
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Header line of a TSV file, split into column names.
#[cfg(test)]
pub fn read_header(path: &Path) -> Result<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .from_path(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;

    let headers = reader
        .headers()
        .with_context(|| format!("Failed to read header of {}", path.display()))?;
    Ok(headers.iter().map(String::from).collect())
}
