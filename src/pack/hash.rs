//! SHA-256 checksums for config packs.
use std::fmt::Write as _;

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use sha2::{Digest, Sha256};

use crate::error::PackError;

/// Text encoding of a digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HashEncoding {
    /// Unpadded URL-safe base64 (43 characters).
    #[default]
    Base64Url,
    /// Lower-case hex (64 characters).
    Hex,
}

/// SHA-256 of `bytes` in the given encoding.
///
/// # Examples
///
/// ```
/// use config_rocket::pack::hash::{HashEncoding, hash_bytes};
///
/// assert_eq!(
///     hash_bytes(b"hello world", HashEncoding::Hex),
///     "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
/// );
/// ```
#[must_use]
pub fn hash_bytes(bytes: &[u8], encoding: HashEncoding) -> String {
    let digest = Sha256::digest(bytes);
    match encoding {
        HashEncoding::Base64Url => URL_SAFE_NO_PAD.encode(digest),
        HashEncoding::Hex => {
            let mut hex = String::with_capacity(64);
            for b in &digest {
                // write! to a String is infallible.
                write!(hex, "{b:02x}").unwrap_or(());
            }
            hex
        }
    }
}

/// Check `bytes` against `expected`, given in either encoding.
///
/// A 64-character hex string is compared as hex (case-insensitive);
/// anything else is compared as base64url.
///
/// # Errors
///
/// Returns [`PackError::ChecksumMismatch`] with the actual digest in the
/// caller's encoding.
pub fn verify_checksum(bytes: &[u8], expected: &str) -> Result<(), PackError> {
    let expected = expected.trim();
    let is_hex = expected.len() == 64 && expected.bytes().all(|b| b.is_ascii_hexdigit());
    let (actual, matches) = if is_hex {
        let actual = hash_bytes(bytes, HashEncoding::Hex);
        let matches = actual.eq_ignore_ascii_case(expected);
        (actual, matches)
    } else {
        let actual = hash_bytes(bytes, HashEncoding::Base64Url);
        let matches = actual == expected.trim_end_matches('=');
        (actual, matches)
    };
    if matches {
        Ok(())
    } else {
        Err(PackError::ChecksumMismatch {
            expected: expected.to_string(),
            actual,
        })
    }
}
