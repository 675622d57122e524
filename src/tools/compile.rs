//! Typesetting engine driver.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use super::{ToolError, Toolchain};

/// A compiled PDF that exists and parses
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledPdf {
    pub path: PathBuf,
    pub pages: usize,
}

/// Run the engine `toolchain.passes` times against `main_file`.
///
/// Every pass runs regardless of the previous one's exit status: references
/// and citations only settle after several passes, and a failing pass may
/// still leave a usable PDF. A non-zero status is only logged. The result is
/// judged by the output file alone.
pub fn compile(main_file: &Path, toolchain: &Toolchain) -> Result<CompiledPdf, ToolError> {
    let work_dir = main_file.parent().unwrap_or_else(|| Path::new("."));
    let file_name = main_file.file_name().unwrap_or(main_file.as_os_str());

    for pass in 1..=toolchain.passes {
        tracing::info!("Compiling (pass {}/{})...", pass, toolchain.passes);

        let status = Command::new(&toolchain.latex)
            .arg("-interaction=nonstopmode")
            .arg(file_name)
            .current_dir(work_dir)
            .stdin(Stdio::null())
            .stdout(toolchain.child_stdout())
            .stderr(toolchain.child_stderr())
            .status()
            .map_err(|source| ToolError::Spawn {
                tool: toolchain.latex.clone(),
                source,
            })?;

        if !status.success() {
            tracing::warn!("{} pass {} exited with {}", toolchain.latex, pass, status);
        }
    }

    let path = main_file.with_extension("pdf");
    let pages = count_pages(&path)?;
    tracing::info!("Compiled {} ({} pages)", path.display(), pages);

    Ok(CompiledPdf { path, pages })
}

/// Number of pages in a PDF, or an error if it is missing or corrupt
pub fn count_pages(path: &Path) -> Result<usize, ToolError> {
    if !path.is_file() {
        return Err(ToolError::MissingOutput(path.to_path_buf()));
    }

    let document = lopdf::Document::load(path).map_err(|e| ToolError::UnreadableOutput {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    Ok(document.get_pages().len())
}
