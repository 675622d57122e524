//! Utility modules supporting the conversion.
//!
//! - [`HttpClient`]: shared reqwest client with timeouts and a crate user agent
//! - [`extract_source_archive`]: unpack a gzipped source tarball (or single file)
//! - [`is_gzip`]: cheap check used to tell source archives from PDF fallbacks

mod archive;
mod http;

pub use archive::{
    extract_source_archive, is_gzip, ArchiveError, ArchiveKind, GZIP_MAGIC, SINGLE_FILE_NAME,
};
pub use http::{HttpClient, DEFAULT_TIMEOUT_SECS};

#[cfg(test)]
pub(crate) use archive::tests::make_tarball;
