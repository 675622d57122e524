//! # arxiv2kindle
//!
//! Convert arXiv papers into PDFs sized for small e-reader screens.
//!
//! The paper's LaTeX sources are downloaded, the page geometry is rewritten
//! for a small page, two-column layouts are forced to a single column and the
//! result is recompiled. Landscape output is additionally rotated.
//!
//! ## Architecture
//!
//! - [`models`]: Paper records and page geometry
//! - [`sources`]: Where papers and their sources come from (arXiv, mock)
//! - [`latex`]: Main-file discovery and source rewriting
//! - [`tools`]: The typesetting engine and the PDF rotator
//! - [`delivery`]: Placing the finished PDF
//! - [`pipeline`]: The stages wired together
//! - [`utils`]: HTTP client and archive extraction
//! - [`config`]: Configuration management

pub mod config;
pub mod delivery;
pub mod latex;
pub mod models;
pub mod pipeline;
pub mod sources;
pub mod tools;
pub mod utils;

// Re-export commonly used types
pub use delivery::Destination;
pub use models::{GeometrySettings, Orientation, Paper};
pub use pipeline::{ConvertError, ConvertRequest, Conversion, Converter};
pub use sources::{ArxivSource, Source};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
