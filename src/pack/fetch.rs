//! Reading pack bytes from a URL or a local file.
use std::path::Path;

use crate::error::PackError;

/// Largest pack accepted from the network.
pub const MAX_DOWNLOAD_BYTES: u64 = 64 * 1024 * 1024;

/// Return `true` if `source` looks like an `http(s)` URL.
#[must_use]
pub fn is_url(source: &str) -> bool {
    source.starts_with("https://") || source.starts_with("http://")
}

/// Download `url` into memory.
///
/// # Errors
///
/// Returns [`PackError::Download`] for transport failures, non-success
/// statuses and bodies larger than [`MAX_DOWNLOAD_BYTES`].
pub fn fetch_bytes(url: &str) -> Result<Vec<u8>, PackError> {
    let download_error = |e: ureq::Error| PackError::Download {
        url: url.to_string(),
        message: e.to_string(),
    };
    let mut response = ureq::get(url).call().map_err(download_error)?;
    response
        .body_mut()
        .with_config()
        .limit(MAX_DOWNLOAD_BYTES)
        .read_to_vec()
        .map_err(download_error)
}

/// Read pack bytes from a URL or a local path.
///
/// # Errors
///
/// Returns [`PackError::Download`] for URLs, or [`PackError::Io`] for files.
pub fn read_source(source: &str) -> Result<Vec<u8>, PackError> {
    if is_url(source) {
        fetch_bytes(source)
    } else {
        let path = Path::new(source);
        std::fs::read(path).map_err(|e| PackError::Io {
            path: path.to_path_buf(),
            source: e,
        })
    }
}
