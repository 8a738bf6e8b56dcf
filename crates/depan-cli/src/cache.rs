use crate::document::GraphDocument;
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Parsed graph documents keyed by canonical path.
///
/// Entries live until [`DocumentCache::invalidate`] or
/// [`DocumentCache::clear`]; a file edited on disk keeps returning the
/// cached copy until then.
#[derive(Debug, Default)]
pub struct DocumentCache {
    entries: HashMap<PathBuf, Arc<GraphDocument>>,
}

impl DocumentCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(&mut self, path: &Path) -> Result<Arc<GraphDocument>> {
        let key = path
            .canonicalize()
            .with_context(|| format!("Graph document not found: {}", path.display()))?;
        if let Some(document) = self.entries.get(&key) {
            tracing::debug!(path = %key.display(), "Graph document cache hit");
            return Ok(document.clone());
        }

        let text = std::fs::read_to_string(&key)
            .with_context(|| format!("Failed to read {}", key.display()))?;
        let document = Arc::new(
            GraphDocument::parse(&text).with_context(|| format!("Failed to load {}", key.display()))?,
        );
        tracing::info!(
            path = %key.display(),
            nodes = document.nodes.len(),
            edges = document.edges.len(),
            "Loaded graph document"
        );
        self.entries.insert(key, document.clone());
        Ok(document)
    }

    /// Forget `path`. Returns whether it was cached.
    pub fn invalidate(&mut self, path: &Path) -> bool {
        let key = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        self.entries.remove(&key).is_some()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const ONE_NODE: &str = r#"{"nodes": [{"id": 1, "name": "A"}]}"#;
    const TWO_NODES: &str = r#"{"nodes": [{"id": 1, "name": "A"}, {"id": 2, "name": "B"}]}"#;

    #[test]
    fn test_cached_until_invalidated() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("graph.json");
        std::fs::write(&path, ONE_NODE)?;

        let mut cache = DocumentCache::new();
        let first = cache.load(&path)?;
        std::fs::write(&path, TWO_NODES)?;
        let second = cache.load(&path)?;
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.nodes.len(), 1);

        assert!(cache.invalidate(&path));
        assert!(!cache.invalidate(&path));
        let third = cache.load(&path)?;
        assert_eq!(third.nodes.len(), 2);
        Ok(())
    }

    #[test]
    fn test_equivalent_paths_share_an_entry() -> Result<()> {
        let dir = tempdir()?;
        std::fs::create_dir(dir.path().join("sub"))?;
        let path = dir.path().join("graph.json");
        std::fs::write(&path, ONE_NODE)?;

        let mut cache = DocumentCache::new();
        cache.load(&path)?;
        cache.load(&dir.path().join("sub").join("..").join("graph.json"))?;
        assert_eq!(cache.len(), 1);
        Ok(())
    }

    #[test]
    fn test_missing_and_malformed_files_report_the_path() -> Result<()> {
        let dir = tempdir()?;
        let mut cache = DocumentCache::new();
        let missing = cache.load(&dir.path().join("absent.json")).unwrap_err();
        assert!(format!("{missing:#}").contains("absent.json"));

        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, "not json")?;
        let err = cache.load(&bad).unwrap_err();
        assert!(format!("{err:#}").contains("bad.json"));
        assert!(cache.is_empty());
        Ok(())
    }
}
