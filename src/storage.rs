// src/storage.rs
//
// Where finished reports go. The batch runner only sees `ReportStore`, so a
// blob container client can replace the directory store without touching
// the pipeline.

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;
use tracing::info;

pub trait ReportStore: Send + Sync {
    /// Store `bytes` under `name`, replacing any existing report.
    fn put(&self, name: &str, bytes: &[u8]) -> Result<()>;
}

pub struct DirectoryStore {
    root: PathBuf,
}

impl DirectoryStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ReportStore for DirectoryStore {
    fn put(&self, name: &str, bytes: &[u8]) -> Result<()> {
        fs::create_dir_all(&self.root)
            .with_context(|| format!("creating output dir {}", self.root.display()))?;

        let path = self.root.join(name);
        fs::write(&path, bytes).with_context(|| format!("writing report {}", path.display()))?;

        info!("Report saved: {} ({} bytes)", path.display(), bytes.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_creates_dir_and_overwrites() {
        let root = std::env::temp_dir().join(format!("traffic_store_{}", std::process::id()));
        let store = DirectoryStore::new(&root);

        store.put("a.csv", b"first").unwrap();
        store.put("a.csv", b"second").unwrap();
        assert_eq!(fs::read(root.join("a.csv")).unwrap(), b"second");

        fs::remove_dir_all(&root).unwrap();
    }
}
