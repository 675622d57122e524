//! Paper model representing a record resolved from a preprint repository.

use serde::{Deserialize, Serialize};

/// A paper record resolved from a lookup query
///
/// Only the fields the conversion needs are kept: the identifier used to fetch
/// the sources and the title used to name the delivered PDF.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paper {
    /// Repository identifier (e.g. "1802.08395v2")
    pub paper_id: String,

    /// Paper title, whitespace-normalized
    pub title: String,

    /// Authors (semicolon-separated)
    pub authors: String,

    /// Abstract page URL
    pub url: String,

    /// URL of the raw LaTeX source archive
    pub source_url: Option<String>,
}

impl Paper {
    /// Create a new paper with required fields
    pub fn new(paper_id: String, title: String, url: String) -> Self {
        Self {
            paper_id,
            title: normalize_whitespace(&title),
            authors: String::new(),
            url,
            source_url: None,
        }
    }

    /// Returns the author names as a vector
    pub fn author_list(&self) -> Vec<&str> {
        self.authors
            .split(';')
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// File name for the delivered PDF, derived from the title.
    ///
    /// Path separators and control characters are replaced so the title can
    /// never point outside the destination directory.
    pub fn pdf_file_name(&self) -> String {
        let stem: String = self
            .title
            .chars()
            .map(|c| match c {
                '/' | '\\' | '\0' => '_',
                c if c.is_control() => ' ',
                c => c,
            })
            .collect();
        let stem = normalize_whitespace(&stem);
        let stem = stem.trim_matches('.');

        if stem.is_empty() {
            format!("{}.pdf", self.paper_id.replace('/', "_"))
        } else {
            format!("{}.pdf", stem)
        }
    }
}

/// Collapse runs of whitespace (arXiv wraps long titles over several lines)
fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Builder for constructing Paper objects
#[derive(Debug, Clone)]
pub struct PaperBuilder {
    paper: Paper,
}

impl PaperBuilder {
    /// Create a new builder with required fields
    pub fn new(
        paper_id: impl Into<String>,
        title: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            paper: Paper::new(paper_id.into(), title.into(), url.into()),
        }
    }

    /// Set authors
    pub fn authors(mut self, authors: impl Into<String>) -> Self {
        self.paper.authors = authors.into();
        self
    }

    /// Set source archive URL
    pub fn source_url(mut self, url: impl Into<String>) -> Self {
        self.paper.source_url = Some(url.into());
        self
    }

    /// Build the Paper
    pub fn build(self) -> Paper {
        self.paper
    }
}
