//! WAV and AIFF specific items
//!
//! Both formats are a single container chunk (`RIFF`/`FORM`) holding a list of chunks, so
//! every tag chunk is a zone and the container size is the only dependent reference.

mod aiff;
pub(crate) mod chunk;
mod info;
mod wav;

pub use aiff::{AiffAdapter, AiffTextChunks};
pub use info::RiffInfoList;
pub use wav::{WavAdapter, WavUpdate};
