//! Gene list file reader.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Problems with the identifier file. All of them end the run.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("Input file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Cannot read input file {}: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Input file contains no valid gene identifiers: {}", .0.display())]
    Empty(PathBuf),
}

/// Split gene list content into identifier tokens.
///
/// Blank lines and lines starting with `#` are skipped. Other lines are
/// split on commas and whitespace. Order is kept and duplicates are not
/// removed.
pub fn parse_gene_list(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .flat_map(|line| line.split(|c: char| c == ',' || c.is_whitespace()))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(String::from)
        .collect()
}

/// Read and tokenize a gene list file.
pub fn read_gene_list(path: &Path) -> Result<Vec<String>, InputError> {
    let content = fs::read_to_string(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => InputError::NotFound(path.to_path_buf()),
        _ => InputError::Unreadable {
            path: path.to_path_buf(),
            source: e,
        },
    })?;

    let genes = parse_gene_list(&content);
    debug!("Read {} identifiers from {}", genes.len(), path.display());

    if genes.is_empty() {
        return Err(InputError::Empty(path.to_path_buf()));
    }

    Ok(genes)
}
