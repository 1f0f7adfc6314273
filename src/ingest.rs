//! Per-document ingestion pipeline.
//!
//! One document flows read → chunk → attach source metadata → embed (or
//! cache hit) → embedded chunks. The engine owns the surrounding batch
//! loop and the store insert; this module stays free of store state so the
//! pipeline can be exercised on its own.

use std::path::Path;

use anyhow::Result;
use uuid::Uuid;

use crate::cache::{self, VectorCache};
use crate::chunk::{chunk_pages, ChunkParams};
use crate::embedding::Embedder;
use crate::models::{Chunk, EmbeddedChunk};
use crate::reader;

/// Result of loading a single document within a batch.
#[derive(Debug)]
pub enum LoadOutcome {
    Loaded { chunks: usize },
    Failed { error: String },
}

/// Per-document entry of a batch report, in input order.
#[derive(Debug)]
pub struct LoadReport {
    pub source_file: String,
    pub outcome: LoadOutcome,
}

/// Aggregate result of a batch load.
///
/// One entry per input document; failures never remove or mask sibling
/// successes.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub documents: Vec<LoadReport>,
    pub total_chunks: usize,
}

impl BatchReport {
    pub fn loaded(&self) -> usize {
        self.documents
            .iter()
            .filter(|d| matches!(d.outcome, LoadOutcome::Loaded { .. }))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.documents.len() - self.loaded()
    }

    /// Console summary in the `load documents` report format.
    pub fn print_summary(&self) {
        println!("load documents");
        for doc in &self.documents {
            match &doc.outcome {
                LoadOutcome::Loaded { chunks } => {
                    println!("  {}: {} chunks", doc.source_file, chunks);
                }
                LoadOutcome::Failed { error } => {
                    println!("  {}: failed — {}", doc.source_file, error);
                }
            }
        }
        println!("  total chunks: {}", self.total_chunks);
    }
}

/// Run the ingestion pipeline for one document.
///
/// Consults the vector cache first; on a miss the document is chunked and
/// embedded, and the cache repopulated (non-fatally) for the next run.
/// Any failure — unreadable file, chunk-parameter error, embedding
/// backend error — surfaces to the caller for per-document reporting.
pub async fn ingest_file(
    path: &Path,
    params: &ChunkParams,
    embedder: &dyn Embedder,
    cache: Option<&VectorCache>,
) -> Result<Vec<EmbeddedChunk>> {
    let name = reader::display_name(path);
    let pages = reader::read_pages(path)?;
    let hash = cache::content_hash(&pages);

    if let Some(cache) = cache {
        if let Some(chunks) = cache.lookup(path, embedder.model_name(), &hash) {
            return Ok(chunks);
        }
    }

    let texts = chunk_pages(&pages, params)?;
    let vectors = embedder.embed_batch(&texts).await?;

    let embedded: Vec<EmbeddedChunk> = texts
        .into_iter()
        .zip(vectors)
        .map(|(text, vector)| EmbeddedChunk {
            chunk: Chunk {
                id: Uuid::new_v4().to_string(),
                source_file: name.clone(),
                text,
            },
            vector,
        })
        .collect();

    if let Some(cache) = cache {
        if let Err(e) = cache.store(path, embedder.model_name(), &hash, &embedded) {
            eprintln!("Warning: failed to write vector cache for {}: {}", name, e);
        }
    }

    Ok(embedded)
}
