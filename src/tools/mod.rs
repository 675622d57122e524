//! External tools: the typesetting engine and the PDF rotator.
//!
//! Both are plain blocking child processes. Neither gets a timeout, so a hung
//! tool hangs the run.

mod compile;
mod rotate;

pub use compile::{compile, CompiledPdf};
pub use rotate::{rotate_pdf, Rotation};

use std::path::PathBuf;
use std::process::{Command, Stdio};
use thiserror::Error;

use crate::config::ToolsConfig;

/// Errors raised by external tools
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("no {tool} found{hint}")]
    MissingTool { tool: String, hint: &'static str },

    #[error("Failed to run {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Compilation produced no PDF (expected {})", .0.display())]
    MissingOutput(PathBuf),

    #[error("Compiled PDF {} is unreadable: {reason}", .path.display())]
    UnreadableOutput { path: PathBuf, reason: String },

    #[error("{tool} exited with {status}")]
    Failed { tool: String, status: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// The external programs a conversion shells out to
#[derive(Debug, Clone)]
pub struct Toolchain {
    /// Typesetting engine, invoked as `<latex> -interaction=nonstopmode <file>`
    pub latex: String,
    /// PDF rotator, invoked with pdftk's `rotate ... output ...` syntax
    pub rotator: String,
    /// Number of engine passes
    pub passes: u32,
    /// Forward tool output to stderr (otherwise discarded)
    pub echo_output: bool,
}

impl Toolchain {
    pub fn from_config(config: &ToolsConfig) -> Self {
        Self {
            latex: config.latex.clone(),
            rotator: config.rotator.clone(),
            passes: config.compile_passes,
            echo_output: true,
        }
    }

    /// Verify the engine (and, for landscape, the rotator) can be run.
    pub fn check(&self, landscape: bool) -> Result<(), ToolError> {
        if !is_command_available(&self.latex) {
            return Err(ToolError::MissingTool {
                tool: self.latex.clone(),
                hint: "",
            });
        }
        if landscape && !is_command_available(&self.rotator) {
            return Err(ToolError::MissingTool {
                tool: self.rotator.clone(),
                hint: " (required for landscape mode)",
            });
        }
        Ok(())
    }

    /// Where child stdout goes: stdout itself may carry the PDF
    pub(crate) fn child_stdout(&self) -> Stdio {
        if self.echo_output {
            Stdio::from(std::io::stderr())
        } else {
            Stdio::null()
        }
    }

    pub(crate) fn child_stderr(&self) -> Stdio {
        if self.echo_output {
            Stdio::inherit()
        } else {
            Stdio::null()
        }
    }
}

impl Default for Toolchain {
    fn default() -> Self {
        Self::from_config(&ToolsConfig::default())
    }
}

/// Check if an external binary is available in PATH
pub fn is_command_available(name: &str) -> bool {
    Command::new(name)
        .arg("--version")
        .stdin(Stdio::null())
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}
