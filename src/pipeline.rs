//! The conversion pipeline.
//!
//! Fetch → rewrite geometry → single-column → compile → (rotate) → deliver.
//! Stages run strictly in order and the first error aborts the run. Nothing is
//! cleaned up: the work directory stays behind for inspection.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

use crate::delivery::{deliver_to, Delivered, Destination, DeliveryError};
use crate::latex::{find_main_file, make_single_column, rewrite_geometry, LatexError, RewriteReport};
use crate::models::{GeometrySettings, Paper};
use crate::sources::{Source, SourceError};
use crate::tools::{compile, rotate_pdf, CompiledPdf, Rotation, ToolError, Toolchain};
use crate::utils::{extract_source_archive, ArchiveError};

/// Prefix of every work directory
pub const WORK_DIR_PREFIX: &str = "arxiv2kindle_";

/// Any error that aborts a conversion
#[derive(Debug, Error)]
pub enum ConvertError {
    /// A required external tool is missing or failed
    #[error(transparent)]
    Tool(#[from] ToolError),

    /// Lookup or download failed
    #[error(transparent)]
    Source(#[from] SourceError),

    /// The source archive could not be unpacked
    #[error(transparent)]
    Archive(#[from] ArchiveError),

    /// The sources do not have the expected structure
    #[error(transparent)]
    Latex(#[from] LatexError),

    /// The PDF could not be placed at its destination
    #[error(transparent)]
    Delivery(#[from] DeliveryError),

    #[error("Failed to create work directory: {0}")]
    WorkDir(#[source] std::io::Error),
}

/// Everything a single run needs to know
#[derive(Debug, Clone)]
pub struct ConvertRequest {
    /// Identifier, URL or search query
    pub query: String,
    pub dest: Destination,
    pub geometry: GeometrySettings,
}

/// Extracted sources of a resolved paper
#[derive(Debug, Clone)]
pub struct FetchedSource {
    pub paper: Paper,
    pub work_dir: PathBuf,
    pub main_file: PathBuf,
}

/// Outcome of a successful run
#[derive(Debug, Clone)]
pub struct Conversion {
    pub paper: Paper,
    pub work_dir: PathBuf,
    pub pages: usize,
    pub delivered: Delivered,
}

/// Runs conversions against one source with one toolchain
#[derive(Debug, Clone)]
pub struct Converter {
    source: Arc<dyn Source>,
    toolchain: Toolchain,
}

impl Converter {
    pub fn new(source: Arc<dyn Source>, toolchain: Toolchain) -> Self {
        Self { source, toolchain }
    }

    /// Run a full conversion, streaming to the process's stdout if asked.
    pub async fn run(&self, request: &ConvertRequest) -> Result<Conversion, ConvertError> {
        self.run_to(request, &mut std::io::stdout()).await
    }

    /// Run a full conversion with `out` standing in for stdout.
    pub async fn run_to<W: Write>(
        &self,
        request: &ConvertRequest,
        out: &mut W,
    ) -> Result<Conversion, ConvertError> {
        self.toolchain.check(request.geometry.is_landscape())?;

        let fetched = self.fetch(&request.query).await?;
        self.prepare(&fetched.main_file, &fetched.work_dir, &request.geometry)?;
        let pdf = self.build(&fetched.main_file, request.geometry.is_landscape())?;

        tracing::info!("Delivering to {}...", request.dest);
        let delivered = deliver_to(&pdf.path, &fetched.paper, &request.dest, out)?;
        if let Delivered::File(path) = &delivered {
            tracing::info!("Saved {}", path.display());
        }

        Ok(Conversion {
            paper: fetched.paper,
            work_dir: fetched.work_dir,
            pages: pdf.pages,
            delivered,
        })
    }

    /// Resolve `query`, download its sources into a fresh work directory,
    /// extract them and locate the main file.
    pub async fn fetch(&self, query: &str) -> Result<FetchedSource, ConvertError> {
        let paper = self.source.lookup(query).await?;
        tracing::info!("Converting paper: [{}] {}", paper.paper_id, paper.title);

        let work_dir = tempfile::Builder::new()
            .prefix(WORK_DIR_PREFIX)
            .tempdir()
            .map_err(ConvertError::WorkDir)?
            .keep();
        tracing::debug!("Work directory: {}", work_dir.display());

        tracing::info!("Downloading the source...");
        let archive = self.source.download_source(&paper, &work_dir).await?;

        tracing::info!("Extracting the source...");
        let kind = extract_source_archive(&archive, &work_dir)?;
        tracing::debug!("Archive kind: {:?}", kind);

        let main_file = find_main_file(&work_dir)?;
        tracing::info!(
            "Found the main tex file: {}",
            main_file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default()
        );

        Ok(FetchedSource {
            paper,
            work_dir,
            main_file,
        })
    }

    /// Rewrite the main file and normalize style files for the new geometry.
    pub fn prepare(
        &self,
        main_file: &Path,
        work_dir: &Path,
        geometry: &GeometrySettings,
    ) -> Result<RewriteReport, ConvertError> {
        tracing::info!("Rewriting page geometry ({})...", geometry.to_option_string());
        let report = rewrite_geometry(main_file, geometry)?;
        tracing::debug!(
            "Rewrite: {} figures resized, {} lines made sloppy, {} lines dropped",
            report.figures,
            report.sloppy_lines,
            report.dropped_lines
        );

        let changed = make_single_column(work_dir)?;
        if !changed.is_empty() {
            tracing::info!("Forced single column in {} style file(s)", changed.len());
        }

        Ok(report)
    }

    /// Compile the main file and, for landscape output, rotate the result.
    pub fn build(&self, main_file: &Path, landscape: bool) -> Result<CompiledPdf, ConvertError> {
        let pdf = compile(main_file, &self.toolchain)?;
        if landscape {
            rotate_pdf(&pdf.path, Rotation::East, &self.toolchain)?;
        }
        Ok(pdf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::mock::make_paper;
    use crate::sources::MockSource;
    use crate::utils::make_tarball;

    fn converter(source: MockSource) -> Converter {
        Converter::new(Arc::new(source), Toolchain::default())
    }

    #[tokio::test]
    async fn test_fetch() {
        let source = MockSource::new();
        source.set_paper(make_paper("1802.08395", "Fetched Paper"));
        source.set_archive(make_tarball(&[
            ("main.tex", "\\documentclass{article}\n\\begin{document}\n\\input{body}\n\\end{document}\n"),
            ("body.tex", "Body\n"),
            ("style.sty", "\\twocolumn\n"),
        ]));

        let fetched = converter(source).fetch("1802.08395").await.unwrap();

        assert_eq!(fetched.paper.title, "Fetched Paper");
        assert_eq!(fetched.main_file, fetched.work_dir.join("main.tex"));
        assert!(fetched
            .work_dir
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with(WORK_DIR_PREFIX));
        assert!(fetched.work_dir.join("src.tar.gz").is_file());

        std::fs::remove_dir_all(&fetched.work_dir).unwrap();
    }

    #[tokio::test]
    async fn test_fetch_not_found() {
        let result = converter(MockSource::new()).fetch("nothing").await;
        assert!(matches!(
            result,
            Err(ConvertError::Source(SourceError::NotFound(_)))
        ));
    }

    #[tokio::test]
    async fn test_fetch_sources_unavailable() {
        let source = MockSource::new();
        source.set_paper(make_paper("1802.08395", "PDF only"));

        let result = converter(source).fetch("1802.08395").await;
        assert!(matches!(
            result,
            Err(ConvertError::Source(SourceError::SourcesUnavailable(_)))
        ));
    }

    #[tokio::test]
    async fn test_fetch_multiple_main_files() {
        let source = MockSource::new();
        source.set_paper(make_paper("1802.08395", "Two mains"));
        source.set_archive(make_tarball(&[
            ("a.tex", "\\documentclass{article}\n"),
            ("b.tex", "\\documentclass{article}\n"),
        ]));

        let result = converter(source).fetch("1802.08395").await;
        assert!(matches!(
            result,
            Err(ConvertError::Latex(LatexError::MultipleMainFiles(_)))
        ));
    }

    #[test]
    fn test_prepare() {
        let dir = tempfile::tempdir().unwrap();
        let main = dir.path().join("main.tex");
        std::fs::write(
            &main,
            "\\documentclass[twocolumn]{article}\n\\begin{document}\n\\includegraphics{fig}\n\\end{document}\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("conf.sty"), "\\twocolumn\n\\relax\n").unwrap();

        let report = converter(MockSource::new())
            .prepare(&main, dir.path(), &GeometrySettings::default())
            .unwrap();

        assert_eq!(report.figures, 1);
        let rewritten = std::fs::read_to_string(&main).unwrap();
        assert!(rewritten.starts_with("\\documentclass[]{article}\n"));
        assert!(rewritten.contains("\\includegraphics[scale=0.5]{fig}"));
        assert_eq!(
            std::fs::read_to_string(dir.path().join("conf.sty")).unwrap(),
            "\\relax\n"
        );
    }
}
