//! Gene identifier resolution against the metadata service.

use super::text_value;
use crate::models::MappingRecord;
use crate::services::{GeneMetadataService, MetadataQuery, MAX_QUERY_TERMS};
use serde_json::Value;
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// Maps normalized symbols to Entrez/Ensembl identifiers.
pub struct IdentifierResolver {
    service: Box<dyn GeneMetadataService>,
    query: MetadataQuery,
}

impl IdentifierResolver {
    pub fn new(service: Box<dyn GeneMetadataService>, species: &str) -> Self {
        Self {
            service,
            query: MetadataQuery::for_species(species),
        }
    }

    /// Resolve symbols into mapping records.
    ///
    /// Symbols are sent in batches of at most [`MAX_QUERY_TERMS`]. Any
    /// failed batch is logged and yields an empty table.
    pub async fn resolve(&self, symbols: &[String]) -> Vec<MappingRecord> {
        if symbols.is_empty() {
            return Vec::new();
        }

        let mut hits = Vec::with_capacity(symbols.len());
        for (i, batch) in symbols.chunks(MAX_QUERY_TERMS).enumerate() {
            debug!("Gene ID mapping batch {} ({} symbols)", i + 1, batch.len());
            match self.service.query_many(batch, &self.query).await {
                Ok(batch_hits) => hits.extend(batch_hits),
                Err(e) => {
                    warn!("Gene ID mapping failed, continuing without it: {}", e);
                    return Vec::new();
                }
            }
        }

        if hits.is_empty() {
            warn!("Gene ID mapping returned no rows");
            return Vec::new();
        }

        let records = flatten_hits(&hits);
        let found = records.iter().filter(|r| r.is_found()).count();
        info!("Mapped {}/{} symbols", found, symbols.len());
        records
    }
}

/// Flatten service hits into records, dropping exact duplicates.
pub fn flatten_hits(hits: &[Value]) -> Vec<MappingRecord> {
    let mut seen = HashSet::new();
    let mut records = Vec::with_capacity(hits.len());

    for hit in hits {
        let Some(record) = hit_to_record(hit) else {
            debug!("Skipping hit without a query: {}", hit);
            continue;
        };
        if seen.insert(record.clone()) {
            records.push(record);
        }
    }

    records
}

fn hit_to_record(hit: &Value) -> Option<MappingRecord> {
    let query_in = text_value(hit.get("query")?)?;

    Some(MappingRecord {
        symbol: hit.get("symbol").and_then(text_value),
        name: hit.get("name").and_then(text_value),
        entrezgene: hit.get("entrezgene").and_then(text_value),
        ensembl_gene: hit.get("ensembl").and_then(ensembl_gene),
        taxid: hit
            .get("taxid")
            .and_then(Value::as_u64)
            .and_then(|id| u32::try_from(id).ok()),
        notfound: hit.get("notfound").and_then(Value::as_bool),
        ..MappingRecord::new(query_in)
    })
}

/// `ensembl` is either one `{gene: ...}` object or a list of them.
fn ensembl_gene(ensembl: &Value) -> Option<String> {
    match ensembl {
        Value::Object(obj) => obj.get("gene").and_then(text_value),
        Value::Array(entries) => entries.first().and_then(ensembl_gene),
        _ => None,
    }
}
