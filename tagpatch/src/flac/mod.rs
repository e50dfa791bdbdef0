//! FLAC specific items
//!
//! Every metadata block is a zone. FLAC has no size fields outside of the blocks themselves,
//! the only state shared between blocks is the "last block" bit, which is recomputed from
//! whichever block ends up last.

mod block;
mod write;

pub use write::{FlacAdapter, FlacUpdate};
