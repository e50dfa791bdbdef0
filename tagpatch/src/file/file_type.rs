use crate::asf::HEADER_OBJECT_GUID;

use std::ffi::OsStr;
use std::path::Path;

/// List of common audio extensions
///
/// This contains a bunch of common extensions for all supported [`FileType`]s, and can be used a filter
/// when scanning directories.
///
/// NOTE: This is **not** an exhaustive list, but it should work fine in most cases.
pub const EXTENSIONS: &[&str] = &[
	// Also update `FileType::from_ext()` below
	"aiff", "aif", "afc", "aifc", "wav", "wave", "opus", "flac", "ogg", "mp4", "m4a", "m4b", "m4p",
	"m4r", "m4v", "3gp", "spx", "wma", "asf", "dsf",
];

/// The type of file being patched
#[derive(PartialEq, Eq, Copy, Clone, Debug)]
#[allow(missing_docs)]
#[non_exhaustive]
pub enum FileType {
	Aiff,
	Asf,
	Dsf,
	Flac,
	Mp4,
	Opus,
	Vorbis,
	Speex,
	Wav,
}

impl FileType {
	/// Whether the format splits its tag across physical Ogg pages
	///
	/// Files of these types are patched through [`ogg::write_comment_packet`](crate::ogg::write_comment_packet)
	/// rather than a plain [`FormatAdapter`](crate::rewrite::FormatAdapter).
	///
	/// # Examples
	///
	/// ```rust
	/// use tagpatch::file::FileType;
	///
	/// assert!(FileType::Opus.is_paged());
	/// assert!(!FileType::Flac.is_paged());
	/// ```
	pub fn is_paged(&self) -> bool {
		matches!(self, FileType::Opus | FileType::Vorbis | FileType::Speex)
	}

	/// Attempts to extract a [`FileType`] from an extension
	///
	/// # Examples
	///
	/// ```rust
	/// use tagpatch::file::FileType;
	///
	/// let extension = "wav";
	/// assert_eq!(FileType::from_ext(extension), Some(FileType::Wav));
	/// ```
	pub fn from_ext<E>(ext: E) -> Option<Self>
	where
		E: AsRef<OsStr>,
	{
		let ext = ext.as_ref().to_str()?.to_ascii_lowercase();

		// Also update `EXTENSIONS` above
		match ext.as_str() {
			"aiff" | "aif" | "afc" | "aifc" => Some(Self::Aiff),
			"wav" | "wave" => Some(Self::Wav),
			"opus" => Some(Self::Opus),
			"flac" => Some(Self::Flac),
			"ogg" => Some(Self::Vorbis),
			"mp4" | "m4a" | "m4b" | "m4p" | "m4r" | "m4v" | "3gp" => Some(Self::Mp4),
			"spx" => Some(Self::Speex),
			"wma" | "asf" => Some(Self::Asf),
			"dsf" => Some(Self::Dsf),
			_ => None,
		}
	}

	/// Attempts to determine a [`FileType`] from a path
	///
	/// # Examples
	///
	/// ```rust
	/// use std::path::Path;
	/// use tagpatch::file::FileType;
	///
	/// let path = Path::new("path/to/my.flac");
	/// assert_eq!(FileType::from_path(path), Some(FileType::Flac));
	/// ```
	pub fn from_path<P>(path: P) -> Option<Self>
	where
		P: AsRef<Path>,
	{
		let ext = path.as_ref().extension();
		ext.and_then(Self::from_ext)
	}

	/// Attempts to extract a [`FileType`] from a buffer
	///
	/// NOTE: This **will not** search past tags or junk at the start of the buffer. A FLAC
	/// stream preceded by an ID3v2 tag is not recognized here, even though
	/// [`FlacAdapter`](crate::flac::FlacAdapter) is able to patch it.
	///
	/// # Examples
	///
	/// ```rust
	/// use tagpatch::file::FileType;
	///
	/// let mut buf = [0; 12];
	/// buf[..4].copy_from_slice(b"RIFF");
	/// buf[8..].copy_from_slice(b"WAVE");
	///
	/// assert_eq!(FileType::from_buffer(&buf), Some(FileType::Wav));
	/// ```
	pub fn from_buffer(buf: &[u8]) -> Option<Self> {
		if buf.is_empty() {
			return None;
		}

		// Safe to index, since we return early on an empty buffer
		match buf[0] {
			b'F' if buf.len() >= 12 && &buf[..4] == b"FORM" => {
				let id = &buf[8..12];

				if id == b"AIFF" || id == b"AIFC" {
					return Some(Self::Aiff);
				}

				None
			},
			b'O' if buf.len() >= 36 && &buf[..4] == b"OggS" => {
				if &buf[29..35] == b"vorbis" {
					return Some(Self::Vorbis);
				} else if &buf[28..36] == b"OpusHead" {
					return Some(Self::Opus);
				} else if &buf[28..36] == b"Speex   " {
					return Some(Self::Speex);
				}

				None
			},
			b'f' if buf.starts_with(b"fLaC") => Some(Self::Flac),
			b'R' if buf.len() >= 12 && &buf[..4] == b"RIFF" => {
				if &buf[8..12] == b"WAVE" {
					return Some(Self::Wav);
				}

				None
			},
			b'D' if buf.starts_with(b"DSD ") => Some(Self::Dsf),
			_ if buf.starts_with(&HEADER_OBJECT_GUID) => Some(Self::Asf),
			_ if buf.len() >= 8 && &buf[4..8] == b"ftyp" => Some(Self::Mp4),
			_ => None,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::FileType;

	#[test_log::test]
	fn from_buffer_magic() {
		let mut ogg = [0; 36];
		ogg[..4].copy_from_slice(b"OggS");
		ogg[28..36].copy_from_slice(b"OpusHead");
		assert_eq!(FileType::from_buffer(&ogg), Some(FileType::Opus));

		ogg[28..36].copy_from_slice(b"\x01vorbis\0");
		assert_eq!(FileType::from_buffer(&ogg), Some(FileType::Vorbis));

		assert_eq!(
			FileType::from_buffer(b"FORM\0\0\0\x04AIFC"),
			Some(FileType::Aiff)
		);
		assert_eq!(FileType::from_buffer(b"fLaC"), Some(FileType::Flac));
		assert_eq!(FileType::from_buffer(b"DSD \x1C\0\0\0"), Some(FileType::Dsf));
		assert_eq!(
			FileType::from_buffer(b"\0\0\0\x18ftypM4A "),
			Some(FileType::Mp4)
		);
		assert_eq!(
			FileType::from_buffer(&crate::asf::HEADER_OBJECT_GUID),
			Some(FileType::Asf)
		);

		assert_eq!(FileType::from_buffer(b"RIFF\0\0\0\0AVI "), None);
		assert_eq!(FileType::from_buffer(b""), None);
	}

	#[test_log::test]
	fn from_ext() {
		assert_eq!(FileType::from_ext("WMA"), Some(FileType::Asf));
		assert_eq!(FileType::from_ext("spx"), Some(FileType::Speex));
		assert_eq!(FileType::from_ext("mp3"), None);
	}
}
