//! Source archive extraction.
//!
//! arXiv serves sources as a gzip stream that wraps either a tar archive
//! (multi-file submissions) or a single bare `.tex` file.

use flate2::read::GzDecoder;
use std::fs;
use std::io::Read;
use std::path::Path;
use tar::Archive;
use thiserror::Error;

/// Magic bytes at the start of every gzip stream
pub const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Name given to the main file of a single-file submission
pub const SINGLE_FILE_NAME: &str = "main.tex";

/// Errors that can occur while extracting a source archive
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("Not a gzip archive: {0}")]
    NotGzip(String),

    #[error("Archive extraction failed: {0}")]
    Extract(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// What the gzip stream contained
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    /// A tar archive, unpacked in place
    Tarball,
    /// A single file, written as [`SINGLE_FILE_NAME`]
    SingleFile,
}

/// Whether `bytes` starts like a gzip stream
pub fn is_gzip(bytes: &[u8]) -> bool {
    bytes.starts_with(&GZIP_MAGIC)
}

/// Extract `archive_path` fully into `dest_dir`.
pub fn extract_source_archive(
    archive_path: &Path,
    dest_dir: &Path,
) -> Result<ArchiveKind, ArchiveError> {
    let compressed = fs::read(archive_path)?;
    if !is_gzip(&compressed) {
        return Err(ArchiveError::NotGzip(archive_path.display().to_string()));
    }

    let mut payload = Vec::new();
    GzDecoder::new(compressed.as_slice())
        .read_to_end(&mut payload)
        .map_err(|e| ArchiveError::Extract(format!("gzip: {}", e)))?;

    if is_tarball(&payload) {
        // unpack() routes every entry through unpack_in, which refuses paths
        // escaping dest_dir
        Archive::new(payload.as_slice())
            .unpack(dest_dir)
            .map_err(|e| ArchiveError::Extract(format!("tar: {}", e)))?;
        tracing::debug!("Unpacked tarball into {}", dest_dir.display());
        Ok(ArchiveKind::Tarball)
    } else {
        let target = dest_dir.join(SINGLE_FILE_NAME);
        fs::write(&target, &payload)?;
        tracing::debug!("Single-file submission written to {}", target.display());
        Ok(ArchiveKind::SingleFile)
    }
}

/// Whether `payload` opens with a valid tar header.
///
/// Checksums are verified, so v7 archives without the `ustar` magic are
/// recognized while a bare `.tex` file is not.
fn is_tarball(payload: &[u8]) -> bool {
    let mut archive = Archive::new(payload);
    let first = archive.entries().map(|mut entries| entries.next());
    matches!(first, Ok(Some(Ok(_))))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;
    use tempfile::tempdir;

    /// Build a gzipped tarball from (path, contents) pairs
    pub(crate) fn make_tarball(files: &[(&str, &str)]) -> Vec<u8> {
        let mut builder = tar::Builder::new(Vec::new());
        for (path, contents) in files {
            let mut header = tar::Header::new_gnu();
            header.set_size(contents.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder
                .append_data(&mut header, path, contents.as_bytes())
                .unwrap();
        }
        let tar_bytes = builder.into_inner().unwrap();
        gzip(&tar_bytes)
    }

    fn gzip(bytes: &[u8]) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(bytes).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn test_extract_tarball() {
        let dir = tempdir().unwrap();
        let archive = dir.path().join("src.tar.gz");
        fs::write(
            &archive,
            make_tarball(&[
                ("paper.tex", "\\documentclass{article}\n"),
                ("figs/plot.txt", "data"),
            ]),
        )
        .unwrap();

        let kind = extract_source_archive(&archive, dir.path()).unwrap();
        assert_eq!(kind, ArchiveKind::Tarball);
        assert!(dir.path().join("paper.tex").is_file());
        assert_eq!(
            fs::read_to_string(dir.path().join("figs/plot.txt")).unwrap(),
            "data"
        );
    }

    #[test]
    fn test_extract_v7_tarball() {
        let mut builder = tar::Builder::new(Vec::new());
        for (path, contents) in [("paper.tex", "\\documentclass{article}\n"), ("fig.txt", "data")] {
            let mut header = tar::Header::new_old();
            header.set_size(contents.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder
                .append_data(&mut header, path, contents.as_bytes())
                .unwrap();
        }
        let tar_bytes = builder.into_inner().unwrap();
        assert_ne!(&tar_bytes[257..262], b"ustar");

        let dir = tempdir().unwrap();
        let archive = dir.path().join("src.tar.gz");
        fs::write(&archive, gzip(&tar_bytes)).unwrap();

        let kind = extract_source_archive(&archive, dir.path()).unwrap();
        assert_eq!(kind, ArchiveKind::Tarball);
        assert!(dir.path().join("paper.tex").is_file());
        assert!(dir.path().join("fig.txt").is_file());
        assert!(!dir.path().join(SINGLE_FILE_NAME).exists());
    }

    #[test]
    fn test_extract_long_single_file() {
        // Longer than a tar block, so the header parse sees a full block of text
        let source = format!("\\documentclass{{article}}\n{}", "Body text.\n".repeat(100));
        let dir = tempdir().unwrap();
        let archive = dir.path().join("src.tar.gz");
        fs::write(&archive, gzip(source.as_bytes())).unwrap();

        let kind = extract_source_archive(&archive, dir.path()).unwrap();
        assert_eq!(kind, ArchiveKind::SingleFile);
        assert_eq!(
            fs::read_to_string(dir.path().join(SINGLE_FILE_NAME)).unwrap(),
            source
        );
    }

    #[test]
    fn test_extract_single_file() {
        let dir = tempdir().unwrap();
        let archive = dir.path().join("src.tar.gz");
        fs::write(&archive, gzip(b"\\documentclass{article}\n")).unwrap();

        let kind = extract_source_archive(&archive, dir.path()).unwrap();
        assert_eq!(kind, ArchiveKind::SingleFile);
        assert_eq!(
            fs::read_to_string(dir.path().join(SINGLE_FILE_NAME)).unwrap(),
            "\\documentclass{article}\n"
        );
    }

    #[test]
    fn test_rejects_non_gzip() {
        let dir = tempdir().unwrap();
        let archive = dir.path().join("src.tar.gz");
        fs::write(&archive, b"%PDF-1.5\n").unwrap();

        let result = extract_source_archive(&archive, dir.path());
        assert!(matches!(result, Err(ArchiveError::NotGzip(_))));
    }

    #[test]
    fn test_is_gzip() {
        assert!(is_gzip(&gzip(b"x")));
        assert!(!is_gzip(b"%PDF"));
        assert!(!is_gzip(b""));
    }
}
