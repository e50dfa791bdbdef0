#![allow(missing_docs)]

mod aiff;
mod asf;
mod dsf;
mod engine;
mod flac;
mod mp4;
mod ogg;
pub(crate) mod util;
mod wav;
