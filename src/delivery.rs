//! Placing the finished PDF at its destination.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::models::Paper;

/// Destination argument meaning "stream the PDF to stdout"
pub const STDOUT_SENTINEL: &str = "-";

/// Errors that can occur while delivering the PDF
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("Failed to move {} to {}: {source}", .from.display(), .to.display())]
    Move {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write PDF to stdout: {0}")]
    Stdout(#[source] std::io::Error),
}

/// Where the finished PDF goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    /// Write the bytes to standard output
    Stdout,
    /// A directory (PDF named after the paper) or an explicit file path.
    ///
    /// Which of the two is decided at delivery time.
    Path(PathBuf),
}

impl Destination {
    /// Interpret the `dest` command-line argument
    pub fn from_arg(arg: &str) -> Self {
        if arg == STDOUT_SENTINEL {
            Destination::Stdout
        } else {
            Destination::Path(PathBuf::from(arg))
        }
    }
}

impl std::str::FromStr for Destination {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_arg(s))
    }
}

impl std::fmt::Display for Destination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Destination::Stdout => write!(f, "stdout"),
            Destination::Path(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Where the PDF ended up
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivered {
    File(PathBuf),
    Stdout { bytes: usize },
}

/// Deliver `pdf` to `dest`, streaming to the process's stdout when asked.
pub fn deliver(pdf: &Path, paper: &Paper, dest: &Destination) -> Result<Delivered, DeliveryError> {
    let stdout = std::io::stdout();
    let mut lock = stdout.lock();
    deliver_to(pdf, paper, dest, &mut lock)
}

/// Deliver `pdf` to `dest`, using `out` as the stdout sink.
pub fn deliver_to<W: Write>(
    pdf: &Path,
    paper: &Paper,
    dest: &Destination,
    out: &mut W,
) -> Result<Delivered, DeliveryError> {
    match dest {
        Destination::Stdout => {
            let bytes = fs::read(pdf).map_err(|source| DeliveryError::Read {
                path: pdf.to_path_buf(),
                source,
            })?;
            out.write_all(&bytes).map_err(DeliveryError::Stdout)?;
            out.flush().map_err(DeliveryError::Stdout)?;
            Ok(Delivered::Stdout { bytes: bytes.len() })
        }
        Destination::Path(path) if path.is_dir() => {
            let target = path.join(paper.pdf_file_name());
            move_file(pdf, &target)?;
            Ok(Delivered::File(target))
        }
        Destination::Path(path) => {
            move_file(pdf, path)?;
            Ok(Delivered::File(path.clone()))
        }
    }
}

/// Rename, falling back to copy + remove when `from` and `to` sit on
/// different filesystems (the work directory is usually under /tmp).
fn move_file(from: &Path, to: &Path) -> Result<(), DeliveryError> {
    let move_err = |source: std::io::Error| DeliveryError::Move {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        source,
    };

    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(err) if from.is_file() => {
            tracing::debug!("rename failed ({}), copying instead", err);
            fs::copy(from, to).map_err(move_err)?;
            fs::remove_file(from).map_err(move_err)?;
            Ok(())
        }
        Err(err) => Err(move_err(err)),
    }
}
