//! Config packs: bundling, checksums, download and the unpack driver.
//!
//! [`selection`] zips arbitrary files for the standalone `zip` command.
pub mod archive;
pub mod bundle;
pub mod fetch;
pub mod hash;
pub mod selection;
pub mod unpack;

pub use archive::{
    MANIFEST_FILE, config_pack_has_parameters, extract_manifest, is_config_pack, unzip_entries,
    zip_entries,
};
pub use bundle::{BundleOptions, BundleReport, bundle};
pub use fetch::{fetch_bytes, read_source};
pub use hash::{HashEncoding, hash_bytes, verify_checksum};
pub use selection::{ArchiveReport, archive_files, select_files};
pub use unpack::{NonAssemblyBehavior, UnpackOptions, UnpackOutcome, unpack, unpack_scoped};
