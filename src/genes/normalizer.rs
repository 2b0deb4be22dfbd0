//! Heuristic normalization of mitochondrial gene symbols.

use crate::models::GeneIdentifier;
use std::collections::{BTreeMap, HashMap, HashSet};

/// Bare mitochondrial symbols and their canonical HGNC names.
pub const MITOCHONDRIAL_ALIASES: &[(&str, &str)] = &[
    ("ND1", "MT-ND1"),
    ("ND2", "MT-ND2"),
    ("ND3", "MT-ND3"),
    ("ND4", "MT-ND4"),
    ("ND4L", "MT-ND4L"),
    ("ND5", "MT-ND5"),
    ("ND6", "MT-ND6"),
    ("CYB", "MT-CYB"),
    ("CO1", "MT-CO1"),
    ("CO2", "MT-CO2"),
    ("CO3", "MT-CO3"),
    ("ATP6", "MT-ATP6"),
    ("ATP8", "MT-ATP8"),
    ("RNR1", "MT-RNR1"),
    ("RNR2", "MT-RNR2"),
];

/// Alias lookup keyed by uppercased alias.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasTable {
    aliases: HashMap<String, String>,
}

impl AliasTable {
    /// The built-in mitochondrial table.
    pub fn mitochondrial() -> Self {
        Self::from_pairs(MITOCHONDRIAL_ALIASES.iter().copied())
    }

    /// Build a table from alias/canonical pairs. Aliases are uppercased.
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let aliases = pairs
            .into_iter()
            .map(|(alias, canonical)| (alias.trim().to_uppercase(), canonical.to_string()))
            .collect();
        Self { aliases }
    }

    /// Canonical symbol for an already-uppercased alias.
    pub fn lookup(&self, upper: &str) -> Option<&str> {
        self.aliases.get(upper).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }
}

impl Default for AliasTable {
    fn default() -> Self {
        Self::mitochondrial()
    }
}

impl From<&BTreeMap<String, String>> for AliasTable {
    fn from(map: &BTreeMap<String, String>) -> Self {
        Self::from_pairs(map.iter().map(|(k, v)| (k.as_str(), v.as_str())))
    }
}

/// Rewrites identifiers through an alias table.
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    table: AliasTable,
}

impl Normalizer {
    pub fn new(table: AliasTable) -> Self {
        Self { table }
    }

    /// Normalize one identifier.
    ///
    /// Lookup is case-insensitive. Identifiers missing from the table are
    /// returned as given, without uppercasing.
    pub fn normalize_one(&self, raw: &str) -> String {
        match self.table.lookup(&raw.to_uppercase()) {
            Some(canonical) => canonical.to_string(),
            None => raw.to_string(),
        }
    }

    /// Normalize a list, keeping length and order.
    pub fn normalize(&self, identifiers: &[String]) -> Vec<String> {
        identifiers.iter().map(|id| self.normalize_one(id)).collect()
    }

    /// Pair every raw token with its normalized form.
    pub fn identify(&self, raw: Vec<String>) -> Vec<GeneIdentifier> {
        let normalized = self.normalize(&raw);
        raw.into_iter()
            .zip(normalized)
            .map(|(raw, normalized)| GeneIdentifier { raw, normalized })
            .collect()
    }
}

/// Normalized symbols with duplicates dropped, first appearance wins.
pub fn unique_symbols(identifiers: &[GeneIdentifier]) -> Vec<String> {
    let mut seen = HashSet::new();
    identifiers
        .iter()
        .filter(|id| seen.insert(id.normalized.as_str()))
        .map(|id| id.normalized.clone())
        .collect()
}
