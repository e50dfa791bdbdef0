use std::error::Error;
use std::fmt;

/// Alias for `Result<T, PageError>`
pub type Result<T> = std::result::Result<T, PageError>;

/// Errors that can occur while performing `Page` operations
#[derive(Debug)]
#[non_exhaustive]
pub enum PageError {
	/// The reader contains a page with a nonzero version
	InvalidVersion,
	/// The reader contains a page with a segment count < 1
	BadSegmentCount,
	/// The reader contains a page without a magic signature (OggS)
	MissingMagic,
	/// The provided content does not fit in a single page
	TooMuchData,
	/// The reader ran out of pages before the expected number of packets was read
	NotEnoughData,
	/// A page's stored checksum does not match its content
	ChecksumMismatch {
		/// The checksum stored in the page header
		stored: u32,
		/// The checksum computed over the page
		computed: u32,
	},
	/// Any std::io::Error
	Io(std::io::Error),
}

impl fmt::Display for PageError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			PageError::InvalidVersion => {
				write!(f, "Invalid stream structure version (Should always be 0)")
			},
			PageError::BadSegmentCount => write!(f, "Page has a segment count < 1"),
			PageError::MissingMagic => write!(f, "Page is missing a magic signature"),
			PageError::TooMuchData => write!(f, "Too much data was provided for a single page"),
			PageError::NotEnoughData => {
				write!(f, "Too little data is available for the expected read")
			},
			PageError::ChecksumMismatch { stored, computed } => write!(
				f,
				"Page checksum mismatch (stored: {stored:#010X}, computed: {computed:#010X})"
			),
			PageError::Io(err) => write!(f, "{}", err),
		}
	}
}

impl Error for PageError {
	fn source(&self) -> Option<&(dyn Error + 'static)> {
		match *self {
			PageError::Io(ref e) => Some(e),
			_ => None,
		}
	}
}

impl From<std::io::Error> for PageError {
	fn from(err: std::io::Error) -> PageError {
		PageError::Io(err)
	}
}
