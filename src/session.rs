//! Named conversation persistence.
//!
//! Each session is one JSON file under `<root>/sessions/`, holding the
//! session name, a save timestamp, and the full ordered turn sequence.
//! Saving rewrites the whole file; loading replaces the caller's
//! in-memory history wholesale. A failed save surfaces as an error while
//! the in-memory history stays with the caller, so nothing is lost.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::Turn;

#[derive(Debug, Serialize, Deserialize)]
struct SessionRecord {
    name: String,
    timestamp: DateTime<Utc>,
    messages: Vec<Turn>,
}

/// One row of the session inventory.
#[derive(Debug)]
pub struct SessionSummary {
    pub name: String,
    pub saved_at: DateTime<Utc>,
    pub message_count: usize,
}

#[derive(Debug, Clone)]
pub struct SessionStore {
    dir: PathBuf,
}

impl SessionStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn session_file(&self, name: &str) -> Result<PathBuf> {
        if name.is_empty() || name.contains(['/', '\\']) || name == "." || name == ".." {
            bail!("Invalid session name: '{}'", name);
        }
        Ok(self.dir.join(format!("{}.json", name)))
    }

    pub fn exists(&self, name: &str) -> bool {
        self.session_file(name)
            .map(|p| p.exists())
            .unwrap_or(false)
    }

    /// Persist a session under `name`, replacing any previous contents.
    pub fn save(&self, name: &str, turns: &[Turn]) -> Result<()> {
        let record = SessionRecord {
            name: name.to_string(),
            timestamp: Utc::now(),
            messages: turns.to_vec(),
        };
        let path = self.session_file(name)?;
        let content = serde_json::to_string_pretty(&record)?;
        std::fs::write(&path, content)
            .with_context(|| format!("Failed to save session '{}'", name))?;
        Ok(())
    }

    /// Load the ordered turn sequence saved under `name`.
    pub fn load(&self, name: &str) -> Result<Vec<Turn>> {
        let path = self.session_file(name)?;
        if !path.exists() {
            bail!("Session '{}' not found", name);
        }
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read session '{}'", name))?;
        let record: SessionRecord = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse session '{}'", name))?;
        Ok(record.messages)
    }

    /// Inventory of saved sessions, sorted by name.
    pub fn list(&self) -> Result<Vec<SessionSummary>> {
        let mut summaries = Vec::new();

        if !self.dir.exists() {
            return Ok(summaries);
        }

        for entry in std::fs::read_dir(&self.dir)
            .with_context(|| format!("Failed to list sessions in {}", self.dir.display()))?
        {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }

            // Skip files that are not session records rather than failing
            // the whole listing.
            let Ok(content) = std::fs::read_to_string(&path) else {
                continue;
            };
            let Ok(record) = serde_json::from_str::<SessionRecord>(&content) else {
                continue;
            };

            summaries.push(SessionSummary {
                name: record.name,
                saved_at: record.timestamp,
                message_count: record.messages.len(),
            });
        }

        summaries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(summaries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, SessionStore) {
        let tmp = tempfile::tempdir().unwrap();
        let store = SessionStore::new(tmp.path());
        (tmp, store)
    }

    #[test]
    fn test_save_load_roundtrip() {
        let (_tmp, store) = store();
        let turns = vec![Turn::user("Q"), Turn::assistant("A")];

        store.save("work", &turns).unwrap();
        let loaded = store.load("work").unwrap();

        assert_eq!(loaded, turns);
    }

    #[test]
    fn test_save_replaces_previous_contents() {
        let (_tmp, store) = store();
        store.save("work", &[Turn::user("old")]).unwrap();
        store
            .save("work", &[Turn::user("Q"), Turn::assistant("A")])
            .unwrap();

        assert_eq!(store.load("work").unwrap().len(), 2);
    }

    #[test]
    fn test_load_missing_session_fails() {
        let (_tmp, store) = store();
        assert!(store.load("nope").is_err());
        assert!(!store.exists("nope"));
    }

    #[test]
    fn test_invalid_names_rejected() {
        let (_tmp, store) = store();
        assert!(store.save("", &[]).is_err());
        assert!(store.save("../escape", &[]).is_err());
        assert!(store.save("a/b", &[]).is_err());
    }

    #[test]
    fn test_list_sorted_with_counts() {
        let (_tmp, store) = store();
        store.save("beta", &[Turn::user("1")]).unwrap();
        store
            .save("alpha", &[Turn::user("1"), Turn::assistant("2")])
            .unwrap();

        let sessions = store.list().unwrap();
        assert_eq!(sessions.len(), 2);
        assert_eq!(sessions[0].name, "alpha");
        assert_eq!(sessions[0].message_count, 2);
        assert_eq!(sessions[1].name, "beta");
        assert_eq!(sessions[1].message_count, 1);
    }

    #[test]
    fn test_list_empty_dir_missing() {
        let tmp = tempfile::tempdir().unwrap();
        let store = SessionStore::new(tmp.path().join("never-created"));
        assert!(store.list().unwrap().is_empty());
    }
}
