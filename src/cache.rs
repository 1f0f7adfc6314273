//! Embedded-chunk disk cache.
//!
//! Re-embedding a document on every run is the slowest part of startup, so
//! each successfully embedded document is persisted under
//! `<root>/vectors/<stem>_<hash8>.json` and reused on the next load. A
//! cached record is only honored when both the embedding model and the
//! document's content hash still match; anything else is a miss and the
//! document is re-embedded.
//!
//! Cache failures are never fatal: an unreadable or stale record degrades
//! to re-embedding, a failed write only costs the next run.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::models::EmbeddedChunk;

#[derive(Debug, Serialize, Deserialize)]
struct CacheRecord {
    model: String,
    content_hash: String,
    chunks: Vec<EmbeddedChunk>,
}

#[derive(Debug, Clone)]
pub struct VectorCache {
    dir: PathBuf,
}

impl VectorCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Cache file for a source path: file stem plus a short path hash, so
    /// same-named documents in different directories never collide.
    fn cache_path(&self, source: &Path) -> PathBuf {
        let mut hasher = Sha256::new();
        hasher.update(source.display().to_string().as_bytes());
        let hash = format!("{:x}", hasher.finalize());

        let stem = source
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "doc".to_string());

        self.dir.join(format!("{}_{}.json", stem, &hash[..8]))
    }

    /// Return the cached chunks for `source`, or `None` when absent or
    /// stale (different model or content).
    pub fn lookup(
        &self,
        source: &Path,
        model: &str,
        content_hash: &str,
    ) -> Option<Vec<EmbeddedChunk>> {
        let content = std::fs::read_to_string(self.cache_path(source)).ok()?;
        let record: CacheRecord = serde_json::from_str(&content).ok()?;

        if record.model == model && record.content_hash == content_hash {
            Some(record.chunks)
        } else {
            None
        }
    }

    pub fn store(
        &self,
        source: &Path,
        model: &str,
        content_hash: &str,
        chunks: &[EmbeddedChunk],
    ) -> Result<()> {
        let record = CacheRecord {
            model: model.to_string(),
            content_hash: content_hash.to_string(),
            chunks: chunks.to_vec(),
        };
        let path = self.cache_path(source);
        let content = serde_json::to_string(&record)?;
        std::fs::write(&path, content)
            .with_context(|| format!("Failed to write vector cache: {}", path.display()))?;
        Ok(())
    }
}

/// Hash a document's extracted pages for cache staleness detection.
pub fn content_hash(pages: &[String]) -> String {
    let mut hasher = Sha256::new();
    for page in pages {
        hasher.update(page.as_bytes());
        hasher.update([0u8]);
    }
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Chunk;

    fn chunks() -> Vec<EmbeddedChunk> {
        vec![EmbeddedChunk {
            chunk: Chunk {
                id: "c1".to_string(),
                source_file: "a.pdf".to_string(),
                text: "body".to_string(),
            },
            vector: vec![0.1, 0.2],
        }]
    }

    #[test]
    fn test_store_then_lookup() {
        let tmp = tempfile::tempdir().unwrap();
        let cache = VectorCache::new(tmp.path());
        let source = Path::new("/docs/a.pdf");

        cache.store(source, "model-x", "hash1", &chunks()).unwrap();

        let hit = cache.lookup(source, "model-x", "hash1").unwrap();
        assert_eq!(hit.len(), 1);
        assert_eq!(hit[0].chunk.text, "body");
    }

    #[test]
    fn test_stale_records_miss() {
        let tmp = tempfile::tempdir().unwrap();
        let cache = VectorCache::new(tmp.path());
        let source = Path::new("/docs/a.pdf");

        cache.store(source, "model-x", "hash1", &chunks()).unwrap();

        assert!(cache.lookup(source, "model-y", "hash1").is_none());
        assert!(cache.lookup(source, "model-x", "hash2").is_none());
    }

    #[test]
    fn test_absent_record_misses() {
        let tmp = tempfile::tempdir().unwrap();
        let cache = VectorCache::new(tmp.path());
        assert!(cache
            .lookup(Path::new("/docs/never.pdf"), "model-x", "h")
            .is_none());
    }

    #[test]
    fn test_same_stem_different_directories() {
        let tmp = tempfile::tempdir().unwrap();
        let cache = VectorCache::new(tmp.path());

        cache
            .store(Path::new("/one/a.pdf"), "m", "h1", &chunks())
            .unwrap();
        cache
            .store(Path::new("/two/a.pdf"), "m", "h2", &chunks())
            .unwrap();

        assert!(cache.lookup(Path::new("/one/a.pdf"), "m", "h1").is_some());
        assert!(cache.lookup(Path::new("/two/a.pdf"), "m", "h2").is_some());
    }

    #[test]
    fn test_content_hash_distinguishes_page_splits() {
        let a = content_hash(&["ab".to_string(), "c".to_string()]);
        let b = content_hash(&["a".to_string(), "bc".to_string()]);
        assert_ne!(a, b);
    }
}
