//! Storage-root layout.
//!
//! All durable state lives under one root directory:
//!
//! ```text
//! <root>/
//!   config.json     configuration surface
//!   sessions/       named conversation logs
//!   vectors/        embedded-chunk cache
//! ```
//!
//! The root is resolved once at startup (`--data-dir`, else `~/.docqa`)
//! and injected into every component that touches disk; no component
//! computes paths on its own.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct StoragePaths {
    root: PathBuf,
}

impl StoragePaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve the storage root from an optional override, falling back to
    /// `~/.docqa`.
    pub fn resolve(data_dir: Option<PathBuf>) -> Result<Self> {
        let root = match data_dir {
            Some(dir) => dir,
            None => dirs::home_dir()
                .context("Could not determine a home directory; pass --data-dir")?
                .join(".docqa"),
        };
        Ok(Self::new(root))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_file(&self) -> PathBuf {
        self.root.join("config.json")
    }

    pub fn sessions_dir(&self) -> PathBuf {
        self.root.join("sessions")
    }

    pub fn vectors_dir(&self) -> PathBuf {
        self.root.join("vectors")
    }

    /// Create the directory layout. Idempotent.
    pub fn ensure(&self) -> Result<()> {
        for dir in [&self.root, &self.sessions_dir(), &self.vectors_dir()] {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
        }
        Ok(())
    }
}
