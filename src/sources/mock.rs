//! Mock source for testing purposes.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::models::Paper;
use crate::sources::{Source, SourceError, ARCHIVE_FILE_NAME};

/// A mock source for testing that returns a predefined paper and archive.
#[derive(Debug, Default)]
pub struct MockSource {
    paper: Mutex<Option<Paper>>,
    archive: Mutex<Option<Vec<u8>>>,
}

impl MockSource {
    /// Create a new mock source that knows no papers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the paper every lookup resolves to.
    pub fn set_paper(&self, paper: Paper) {
        let mut guard = self.paper.lock().unwrap();
        *guard = Some(paper);
    }

    /// Set the raw archive bytes served for the paper.
    pub fn set_archive(&self, archive: Vec<u8>) {
        let mut guard = self.archive.lock().unwrap();
        *guard = Some(archive);
    }
}

#[async_trait]
impl Source for MockSource {
    fn id(&self) -> &str {
        "mock"
    }

    fn name(&self) -> &str {
        "Mock Source"
    }

    async fn lookup(&self, query: &str) -> Result<Paper, SourceError> {
        let guard = self.paper.lock().unwrap();
        guard
            .clone()
            .ok_or_else(|| SourceError::NotFound(query.to_string()))
    }

    async fn download_source(
        &self,
        paper: &Paper,
        dest_dir: &Path,
    ) -> Result<PathBuf, SourceError> {
        let archive = self
            .archive
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| SourceError::SourcesUnavailable(paper.paper_id.clone()))?;

        let path = dest_dir.join(ARCHIVE_FILE_NAME);
        std::fs::write(&path, archive)?;
        Ok(path)
    }
}

/// Helper function to create a mock paper for testing.
pub fn make_paper(paper_id: &str, title: &str) -> Paper {
    Paper::new(
        paper_id.to_string(),
        title.to_string(),
        format!("http://example.com/{}", paper_id),
    )
}
