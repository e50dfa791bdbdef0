//! Rewrite the metadata regions of audio files in place.
//!
//! Tags rarely keep their size when they are edited, and most containers store sizes, counts,
//! and offsets that depend on them. tagpatch rewrites only the regions that change ("zones"),
//! moves the bytes that follow them, and then fixes up every field that depends on them
//! ("dependent references"), leaving the rest of the file byte-for-byte intact.
//!
//! # Supported Formats
//!
//! | Format     | Adapter                                         | Regions                                        |
//! |------------|-------------------------------------------------|------------------------------------------------|
//! | AIFF/AIFC  | [`AiffAdapter`](iff::AiffAdapter)               | `NAME`, `AUTH`, `(c) `, `ANNO`, `ID3 `         |
//! | ASF/WMA    | [`AsfAdapter`](asf::AsfAdapter)                 | (Extended) Content Description                 |
//! | DSF        | [`DsfAdapter`](dsf::DsfAdapter)                 | ID3v2                                          |
//! | FLAC       | [`FlacAdapter`](flac::FlacAdapter)              | `VORBIS_COMMENT`, `PICTURE`, `PADDING`, ID3v2  |
//! | MP4        | [`Mp4Adapter`](mp4::Mp4Adapter)                 | `ilst`                                         |
//! | OGG        | [`write_comment_packet`](ogg::write_comment_packet) | Comment header (Vorbis, Opus, Speex)       |
//! | WAV        | [`WavAdapter`](iff::WavAdapter)                 | `LIST INFO`, `ID3 `, `bext`                    |
//!
//! Encoding the tags themselves is left to the caller. Adapters take already encoded tags
//! (such as an ID3v2 tag), or build the few containers that are plain lists of strings.
//!
//! # Examples
//!
//! ## Using an adapter
//!
//! ```rust,no_run
//! # fn main() -> tagpatch::error::Result<()> {
//! use tagpatch::config::{ParseOptions, WriteOptions};
//! use tagpatch::iff::{RiffInfoList, WavAdapter, WavUpdate};
//! use tagpatch::rewrite::write_path_with;
//!
//! let mut info = RiffInfoList::new();
//! info.insert(String::from("INAM"), String::from("Foo title"));
//!
//! let update = WavUpdate {
//! 	info: Some(info),
//! 	// Remove the bext chunk
//! 	bext: Some(Vec::new()),
//! 	..WavUpdate::default()
//! };
//!
//! let summary = write_path_with(
//! 	"test.wav",
//! 	&mut WavAdapter::new(),
//! 	&update,
//! 	ParseOptions::new(),
//! 	WriteOptions::new(),
//! )?;
//! println!("The file changed by {} bytes", summary.total_delta());
//! # Ok(())
//! # }
//! ```
//!
//! ## Using the engine directly
//!
//! A format without an adapter can describe its layout to a [`Session`](rewrite::Session):
//!
//! ```rust
//! # fn main() -> tagpatch::error::Result<()> {
//! use tagpatch::config::WriteOptions;
//! use tagpatch::rewrite::{Endianness, FieldWidth, ZoneFlag, ZoneGenerators, begin_rewrite};
//! use std::io::Cursor;
//!
//! // A 4 byte big endian length, followed by a payload
//! let mut file = Cursor::new(vec![0, 0, 0, 3, b'f', b'o', b'o']);
//!
//! let mut session = begin_rewrite(&mut file);
//! session
//! 	.add_zone("payload", 4, 3, Vec::new(), ZoneFlag::None)
//! 	.add_size_ref(0, FieldWidth::U32, Endianness::Big, ["payload"]);
//!
//! let mut generators = ZoneGenerators::new();
//! generators.insert("payload", |_zone, _original| Ok(b"foobar".to_vec()));
//!
//! session.commit(&mut generators, WriteOptions::new())?;
//! assert_eq!(file.into_inner(), b"\0\0\0\x06foobar");
//! # Ok(())
//! # }
//! ```
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub mod config;
pub mod error;
pub mod file;
pub(crate) mod macros;
pub mod rewrite;
mod util;

pub mod asf;
pub mod dsf;
pub mod flac;
pub mod iff;
pub mod mp4;
pub mod ogg;

pub use util::io;
