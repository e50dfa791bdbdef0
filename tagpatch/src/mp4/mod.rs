//! MP4 specific items
//!
//! The `ilst` atom lives at `moov.udta.meta.ilst`, so resizing it changes the size of every
//! atom above it. When `moov` comes before the media data, the chunk offsets in every
//! `stco`/`co64` atom move along with it.

mod atom_info;
mod write;

pub use write::{Mp4Adapter, Mp4Update};
