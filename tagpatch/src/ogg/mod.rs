//! OGG framing
//!
//! The comment header of an OGG Vorbis, Opus, or Speex stream is not a contiguous region of
//! the file. It is a packet spread over as many physical pages as it needs, and those pages
//! share their last page with the next header packet (Vorbis' setup header).
//!
//! [`write_comment_packet`] treats every page after the identification page, up to the end of the
//! last header page, as a single zone. The header packets are reassembled from the original
//! pages, the comment packet replaced, and the result re-paginated. Once the zone is patched,
//! the remaining pages of the stream are renumbered.

pub(crate) mod constants;
mod comments;
mod write;

use crate::error::Result;
use crate::file::FileType;
use crate::macros::decode_err;
use constants::{OPUSHEAD, OPUSTAGS, SPEEXHEADER, VORBIS_COMMENT_HEAD, VORBIS_IDENT_HEAD};

pub(crate) use comments::existing_vendor;
pub use comments::VorbisComments;
pub use write::{read_comments, write_comment_packet, write_comments};

/// The codecs carried in OGG that have a comment header
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[allow(missing_docs)]
#[non_exhaustive]
pub enum OggFormat {
	Vorbis,
	Opus,
	Speex,
}

impl OggFormat {
	/// The number of header packets at the start of the stream, including the identification header
	pub fn header_packet_count(self) -> usize {
		match self {
			OggFormat::Vorbis => 3,
			OggFormat::Opus | OggFormat::Speex => 2,
		}
	}

	/// The signature at the start of the identification packet
	pub fn ident_signature(self) -> &'static [u8] {
		match self {
			OggFormat::Vorbis => VORBIS_IDENT_HEAD,
			OggFormat::Opus => OPUSHEAD,
			OggFormat::Speex => SPEEXHEADER,
		}
	}

	/// The signature at the start of the comment packet, if the codec has one
	pub fn comment_signature(self) -> Option<&'static [u8]> {
		match self {
			OggFormat::Vorbis => Some(VORBIS_COMMENT_HEAD),
			OggFormat::Opus => Some(OPUSTAGS),
			OggFormat::Speex => None,
		}
	}

	/// The name of the zone holding the header pages
	pub fn zone_name(self) -> &'static str {
		match self {
			OggFormat::Vorbis => "VORBISTAG",
			OggFormat::Opus => "OPUSTAGS",
			OggFormat::Speex => "SPEEXTAG",
		}
	}

	/// The equivalent [`FileType`]
	pub fn file_type(self) -> FileType {
		match self {
			OggFormat::Vorbis => FileType::Vorbis,
			OggFormat::Opus => FileType::Opus,
			OggFormat::Speex => FileType::Speex,
		}
	}

	/// The `OggFormat` of a [`FileType`], if it is an OGG format
	///
	/// # Examples
	///
	/// ```rust
	/// use tagpatch::file::FileType;
	/// use tagpatch::ogg::OggFormat;
	///
	/// assert_eq!(OggFormat::from_file_type(FileType::Opus), Some(OggFormat::Opus));
	/// assert_eq!(OggFormat::from_file_type(FileType::Flac), None);
	/// ```
	pub fn from_file_type(file_type: FileType) -> Option<Self> {
		match file_type {
			FileType::Vorbis => Some(OggFormat::Vorbis),
			FileType::Opus => Some(OggFormat::Opus),
			FileType::Speex => Some(OggFormat::Speex),
			_ => None,
		}
	}
}

pub(crate) fn verify_signature(content: &[u8], sig: &[u8]) -> Result<()> {
	let sig_len = sig.len();

	if content.len() < sig_len || &content[..sig_len] != sig {
		decode_err!(@BAIL "OGG: Packet missing magic signature");
	}

	Ok(())
}
