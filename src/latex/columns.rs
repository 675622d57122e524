//! Single-column normalization of style files.

use std::path::{Path, PathBuf};

use super::{files_with_extension, read_source, write_source, LatexError};

const TWOCOLUMN: &str = "\\twocolumn";

/// Remove bare `\twocolumn` lines from every top-level `.sty` in `work_dir`.
///
/// Returns the style files that were changed.
pub fn make_single_column(work_dir: &Path) -> Result<Vec<PathBuf>, LatexError> {
    let mut changed = Vec::new();

    for path in files_with_extension(work_dir, "sty")? {
        let (source, encoding) = read_source(&path)?;
        let stripped = strip_twocolumn(&source);
        if stripped.len() != source.len() {
            write_source(&path, &stripped, encoding)?;
            tracing::debug!("Removed \\twocolumn from {}", path.display());
            changed.push(path);
        }
    }

    Ok(changed)
}

/// Drop lines whose trimmed content is exactly `\twocolumn`.
///
/// Every other line is kept byte for byte, including its line ending.
pub fn strip_twocolumn(source: &str) -> String {
    source
        .split_inclusive('\n')
        .filter(|line| line.trim() != TWOCOLUMN)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_strip_bare_twocolumn() {
        let source = "\\ProvidesPackage{conf}\n  \\twocolumn  \r\n\\twocolumn\n\\relax\n";
        assert_eq!(strip_twocolumn(source), "\\ProvidesPackage{conf}\n\\relax\n");
    }

    #[test]
    fn test_strip_keeps_lookalikes() {
        let source = "\\twocolumnsomething\n\\twocolumn[\\section*{Title}]\n\\onecolumn\n\\twocolumn";
        assert_eq!(
            strip_twocolumn(source),
            "\\twocolumnsomething\n\\twocolumn[\\section*{Title}]\n\\onecolumn\n"
        );
    }

    #[test]
    fn test_make_single_column() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("conf.sty"), "\\relax\n\\twocolumn\n").unwrap();
        fs::write(dir.path().join("other.sty"), "\\relax\n").unwrap();
        fs::write(dir.path().join("paper.tex"), "\\twocolumn\n").unwrap();

        let changed = make_single_column(dir.path()).unwrap();

        assert_eq!(changed, vec![dir.path().join("conf.sty")]);
        assert_eq!(
            fs::read_to_string(dir.path().join("conf.sty")).unwrap(),
            "\\relax\n"
        );
        assert_eq!(
            fs::read_to_string(dir.path().join("paper.tex")).unwrap(),
            "\\twocolumn\n"
        );
    }
}
