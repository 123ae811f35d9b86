//! Where the host screen gets its stories from.

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use super::Story;

/// Supplies presentable stories by strip index.
pub trait OverlayProvider {
    /// Number of highlights in the strip.
    fn len(&self) -> usize;

    /// The story at `index`, or None when there is nothing to present.
    fn story(&self, index: usize) -> Option<Story>;

    /// Record that the story at `index` was opened.
    fn mark_seen(&mut self, _index: usize) {}

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Errors that can occur while loading a story catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// IO error while reading the catalog file.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// The catalog is not valid JSON for the expected shape.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Two stories share an id.
    #[error("duplicate story id: {0}")]
    DuplicateId(String),
}

#[derive(Debug, Default, Deserialize, Serialize)]
struct CatalogFile {
    #[serde(default)]
    stories: Vec<Story>,
}

/// In-memory story list, usually loaded from a JSON file of the form
/// `{"stories": [...]}`.
#[derive(Debug, Clone, Default)]
pub struct StoryCatalog {
    stories: Vec<Story>,
}

impl StoryCatalog {
    pub fn new(stories: Vec<Story>) -> Self {
        Self { stories }
    }

    /// Parse a catalog from JSON text.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_json::from_str(json)?;
        {
            let mut seen_ids = HashSet::new();
            for story in &file.stories {
                if !seen_ids.insert(story.id.as_str()) {
                    return Err(CatalogError::DuplicateId(story.id.clone()));
                }
            }
        }
        Ok(Self::new(file.stories))
    }

    /// Load a catalog from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let catalog = Self::from_json(&content)?;
        debug!(path = %path.display(), stories = catalog.stories.len(), "loaded story catalog");
        Ok(catalog)
    }

    pub fn stories(&self) -> &[Story] {
        &self.stories
    }
}

impl OverlayProvider for StoryCatalog {
    fn len(&self) -> usize {
        self.stories.len()
    }

    fn story(&self, index: usize) -> Option<Story> {
        self.stories.get(index).cloned()
    }

    fn mark_seen(&mut self, index: usize) {
        if let Some(story) = self.stories.get_mut(index) {
            story.seen = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const CATALOG: &str = r#"{
        "stories": [
            {"id": "a", "display_name": "Alpha"},
            {"id": "b", "display_name": "Beta", "seen": true}
        ]
    }"#;

    #[test]
    fn test_from_json() {
        let catalog = StoryCatalog::from_json(CATALOG).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.story(1).unwrap().display_name, "Beta");
        assert!(catalog.story(2).is_none());
    }

    #[test]
    fn test_empty_object_is_empty_catalog() {
        let catalog = StoryCatalog::from_json("{}").unwrap();
        assert!(catalog.is_empty());
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let err = StoryCatalog::from_json(
            r#"{"stories": [{"id": "a", "display_name": "x"}, {"id": "a", "display_name": "y"}]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateId(id) if id == "a"));
    }

    #[test]
    fn test_invalid_json() {
        let err = StoryCatalog::from_json("not json").unwrap_err();
        assert!(matches!(err, CatalogError::Json(_)));
    }

    #[test]
    fn test_mark_seen() {
        let mut catalog = StoryCatalog::from_json(CATALOG).unwrap();
        assert!(!catalog.story(0).unwrap().seen);
        catalog.mark_seen(0);
        catalog.mark_seen(99);
        assert!(catalog.story(0).unwrap().seen);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(CATALOG.as_bytes()).unwrap();
        let catalog = StoryCatalog::load(file.path()).unwrap();
        assert_eq!(catalog.stories().len(), 2);
    }

    #[test]
    fn test_load_missing_file() {
        let err = StoryCatalog::load("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, CatalogError::Io(_)));
    }
}
