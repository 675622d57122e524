//! Line-oriented LaTeX source edits.
//!
//! Nothing here parses LaTeX: every edit is a substring or regex match on a
//! single line, so constructs split across lines are left alone.
//!
//! - [`find_main_file`]: locate the one top-level `.tex` file declaring a class
//! - [`rewrite_geometry`]: install the e-reader geometry in the main file
//! - [`make_single_column`]: strip forced `\twocolumn` from style files

mod columns;
mod rewrite;

pub use columns::{make_single_column, strip_twocolumn};
pub use rewrite::{rewrite_geometry, rewrite_lines, RewriteReport};

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Marker identifying the main file and its class line
pub const DOCUMENT_CLASS: &str = "\\documentclass";

/// Marker of the line opening the document body
pub const BEGIN_DOCUMENT: &str = "\\begin{document}";

/// Structural problems with the extracted sources
#[derive(Debug, Error)]
pub enum LatexError {
    #[error("No main .tex file (containing \\documentclass) found in {}", .0.display())]
    NoMainFile(PathBuf),

    #[error("Multiple main .tex files found: {}", display_paths(.0))]
    MultipleMainFiles(Vec<PathBuf>),

    #[error("No \\documentclass line in the main file")]
    NoDocumentClass,

    #[error("No \\begin{{document}} line in the main file")]
    NoDocumentBody,

    #[error("Expected one \\begin{{document}} line in the main file, found {0}")]
    MultipleDocumentBodies(usize),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Find the single top-level `.tex` file containing [`DOCUMENT_CLASS`].
pub fn find_main_file(work_dir: &Path) -> Result<PathBuf, LatexError> {
    let mut candidates = files_with_extension(work_dir, "tex")?;
    candidates.sort();

    let mut main_files = Vec::new();
    for path in candidates {
        let (text, _) = read_source(&path)?;
        if text.contains(DOCUMENT_CLASS) {
            main_files.push(path);
        }
    }

    match main_files.len() {
        0 => Err(LatexError::NoMainFile(work_dir.to_path_buf())),
        1 => Ok(main_files.remove(0)),
        _ => Err(LatexError::MultipleMainFiles(main_files)),
    }
}

/// Top-level regular files in `dir` with the given extension
pub(crate) fn files_with_extension(dir: &Path, ext: &str) -> std::io::Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|e| e == ext) {
            out.push(path);
        }
    }
    Ok(out)
}

/// Encoding a source file was read with, so it can be written back unchanged
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TextEncoding {
    Utf8,
    /// Fallback for older submissions; maps every byte to one char
    Latin1,
}

pub(crate) fn read_source(path: &Path) -> std::io::Result<(String, TextEncoding)> {
    let bytes = fs::read(path)?;
    match String::from_utf8(bytes) {
        Ok(text) => Ok((text, TextEncoding::Utf8)),
        Err(err) => {
            let text = err.into_bytes().iter().map(|&b| b as char).collect();
            Ok((text, TextEncoding::Latin1))
        }
    }
}

pub(crate) fn write_source(path: &Path, text: &str, encoding: TextEncoding) -> std::io::Result<()> {
    match encoding {
        TextEncoding::Utf8 => fs::write(path, text),
        TextEncoding::Latin1 => {
            let bytes: Vec<u8> = text
                .chars()
                .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
                .collect();
            fs::write(path, bytes)
        }
    }
}
