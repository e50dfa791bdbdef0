//! DSF specific items
//!
//! A DSF file is a fixed header, a `fmt ` chunk and a `data` chunk, optionally followed by an
//! ID3v2 tag. The header holds the total file size and a pointer to the tag (0 when there is none).

mod write;

pub use write::{DsfAdapter, DsfUpdate};

// DSF file structure constants
pub(crate) const DSF_MAGIC: &[u8; 4] = b"DSD ";
pub(crate) const FMT_MAGIC: &[u8; 4] = b"fmt ";
pub(crate) const DATA_MAGIC: &[u8; 4] = b"data";

pub(crate) const HEADER_SIZE: u64 = 28;
pub(crate) const FMT_CHUNK_SIZE: u64 = 52;

/// Offset of the total file size in the header
pub(crate) const FILE_SIZE_OFFSET: u64 = 12;
/// Offset of the metadata pointer in the header
pub(crate) const METADATA_POINTER_OFFSET: u64 = 20;
