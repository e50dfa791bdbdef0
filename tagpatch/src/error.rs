//! Contains the errors that can arise within tagpatch
//!
//! The primary error is [`TagPatchError`]. The type of error is determined by [`ErrorKind`],
//! which can be extended at any time.

use crate::file::FileType;

use std::collections::TryReserveError;
use std::fmt::{Debug, Display, Formatter};

use ogg_pager::PageError;

/// Alias for `Result<T, TagPatchError>`
pub type Result<T> = std::result::Result<T, TagPatchError>;

/// The types of errors that can occur
#[derive(Debug)]
#[non_exhaustive]
pub enum ErrorKind {
	// Rewrite session errors
	/// A registered zone or reference does not fit the file, zones overlap, or a reference
	/// names a zone that was never registered
	///
	/// This is always detected before the file is modified.
	StructuralInconsistency(StructuralError),
	/// The file is laid out in a way that cannot be patched safely
	UnsupportedLayout(&'static str),
	/// A dependent reference's corrected value does not fit in its field
	FieldOverflow {
		/// The position of the field in the original file
		position: u64,
		/// The value that failed to fit
		value: i128,
	},

	// File data related errors
	/// Unable to guess the format
	UnknownFormat,
	/// Attempting to read/write an abnormally large amount of data
	TooMuchData,
	/// Expected the data to be a different size than provided
	///
	/// This occurs when the size of an item is written as one value, but that size is either too
	/// big or small to be valid within the bounds of that item.
	SizeMismatch,
	/// Errors that occur while decoding a file
	FileDecoding(FileDecodingError),
	/// Errors that occur while encoding a file
	FileEncoding(FileEncodingError),

	// Conversions for external errors
	/// Errors that arise while parsing OGG pages
	OggPage(PageError),
	/// Unable to convert bytes to a String
	StringFromUtf8(std::string::FromUtf8Error),
	/// Represents all cases of [`std::io::Error`].
	Io(std::io::Error),
	/// Failure to allocate enough memory
	Alloc(TryReserveError),
	/// This should **never** be encountered
	Infallible(std::convert::Infallible),
}

/// Describes which part of a rewrite session is inconsistent with the file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuralError {
	description: &'static str,
	offset: u64,
}

impl StructuralError {
	/// Create a new `StructuralError`, pointing at `offset` in the original file
	#[must_use]
	pub const fn new(description: &'static str, offset: u64) -> Self {
		Self {
			description,
			offset,
		}
	}

	/// Returns the error description
	pub fn description(&self) -> &str {
		self.description
	}

	/// Returns the offending offset in the original file
	pub fn offset(&self) -> u64 {
		self.offset
	}
}

impl Display for StructuralError {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		write!(f, "{} (at offset {})", self.description, self.offset)
	}
}

/// An error that arises while decoding a file
pub struct FileDecodingError {
	format: Option<FileType>,
	description: &'static str,
}

impl FileDecodingError {
	/// Create a `FileDecodingError` from a [`FileType`] and description
	#[must_use]
	pub const fn new(format: FileType, description: &'static str) -> Self {
		Self {
			format: Some(format),
			description,
		}
	}

	/// Create a `FileDecodingError` without binding it to a [`FileType`]
	pub fn from_description(description: &'static str) -> Self {
		Self {
			format: None,
			description,
		}
	}

	/// Returns the associated [`FileType`], if one exists
	pub fn format(&self) -> Option<FileType> {
		self.format
	}

	/// Returns the error description
	pub fn description(&self) -> &str {
		self.description
	}
}

impl Debug for FileDecodingError {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		if let Some(format) = self.format {
			write!(f, "{:?}: {:?}", format, self.description)
		} else {
			write!(f, "{:?}", self.description)
		}
	}
}

impl Display for FileDecodingError {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		if let Some(format) = self.format {
			write!(f, "{:?}: {}", format, self.description)
		} else {
			write!(f, "{}", self.description)
		}
	}
}

/// An error that arises while encoding a file
pub struct FileEncodingError {
	format: Option<FileType>,
	description: &'static str,
}

impl FileEncodingError {
	/// Create a `FileEncodingError` from a [`FileType`] and description
	///
	/// # Examples
	///
	/// ```rust
	/// use tagpatch::error::FileEncodingError;
	/// use tagpatch::file::FileType;
	///
	/// // This error is bounded to `FileType::Flac`, which will be displayed when the error is formatted
	/// let flac_error = FileEncodingError::new(FileType::Flac, "Something went wrong in the FLAC file!");
	/// assert_eq!(flac_error.format(), Some(FileType::Flac));
	/// ```
	#[must_use]
	pub const fn new(format: FileType, description: &'static str) -> Self {
		Self {
			format: Some(format),
			description,
		}
	}

	/// Create a `FileEncodingError` without binding it to a [`FileType`]
	pub fn from_description(description: &'static str) -> Self {
		Self {
			format: None,
			description,
		}
	}

	/// Returns the associated [`FileType`], if one exists
	pub fn format(&self) -> Option<FileType> {
		self.format
	}

	/// Returns the error description
	pub fn description(&self) -> &str {
		self.description
	}
}

impl Debug for FileEncodingError {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		if let Some(format) = self.format {
			write!(f, "{:?}: {:?}", format, self.description)
		} else {
			write!(f, "{:?}", self.description)
		}
	}
}

impl Display for FileEncodingError {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		if let Some(format) = self.format {
			write!(f, "{:?}: {}", format, self.description)
		} else {
			write!(f, "{}", self.description)
		}
	}
}

/// Errors that could occur within tagpatch
pub struct TagPatchError {
	pub(crate) kind: ErrorKind,
}

impl TagPatchError {
	/// Create a `TagPatchError` from an [`ErrorKind`]
	///
	/// # Examples
	///
	/// ```rust
	/// use tagpatch::error::{ErrorKind, TagPatchError};
	///
	/// let unknown_format = TagPatchError::new(ErrorKind::UnknownFormat);
	/// ```
	#[must_use]
	pub const fn new(kind: ErrorKind) -> Self {
		Self { kind }
	}

	/// Returns the [`ErrorKind`]
	///
	/// # Examples
	///
	/// ```rust
	/// use tagpatch::error::{ErrorKind, TagPatchError};
	///
	/// let unsupported = TagPatchError::new(ErrorKind::UnsupportedLayout("interleaved streams"));
	/// if let ErrorKind::UnsupportedLayout(reason) = unsupported.kind() {
	/// 	println!("Can't patch this file: {reason}");
	/// }
	/// ```
	pub fn kind(&self) -> &ErrorKind {
		&self.kind
	}
}

impl std::error::Error for TagPatchError {
	fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
		match self.kind {
			ErrorKind::OggPage(ref err) => Some(err),
			ErrorKind::Io(ref err) => Some(err),
			_ => None,
		}
	}
}

impl Debug for TagPatchError {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		write!(f, "{:?}", self.kind)
	}
}

impl From<StructuralError> for TagPatchError {
	fn from(input: StructuralError) -> Self {
		Self {
			kind: ErrorKind::StructuralInconsistency(input),
		}
	}
}

impl From<FileDecodingError> for TagPatchError {
	fn from(input: FileDecodingError) -> Self {
		Self {
			kind: ErrorKind::FileDecoding(input),
		}
	}
}

impl From<FileEncodingError> for TagPatchError {
	fn from(input: FileEncodingError) -> Self {
		Self {
			kind: ErrorKind::FileEncoding(input),
		}
	}
}

impl From<PageError> for TagPatchError {
	fn from(input: PageError) -> Self {
		Self {
			kind: ErrorKind::OggPage(input),
		}
	}
}

impl From<std::io::Error> for TagPatchError {
	fn from(input: std::io::Error) -> Self {
		Self {
			kind: ErrorKind::Io(input),
		}
	}
}

impl From<std::string::FromUtf8Error> for TagPatchError {
	fn from(input: std::string::FromUtf8Error) -> Self {
		Self {
			kind: ErrorKind::StringFromUtf8(input),
		}
	}
}

impl From<TryReserveError> for TagPatchError {
	fn from(input: TryReserveError) -> Self {
		Self {
			kind: ErrorKind::Alloc(input),
		}
	}
}

impl From<std::convert::Infallible> for TagPatchError {
	fn from(input: std::convert::Infallible) -> Self {
		Self {
			kind: ErrorKind::Infallible(input),
		}
	}
}

impl From<tempfile::PersistError> for TagPatchError {
	fn from(input: tempfile::PersistError) -> Self {
		Self {
			kind: ErrorKind::Io(input.error),
		}
	}
}

impl Display for TagPatchError {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self.kind {
			// Conversions
			ErrorKind::OggPage(ref err) => write!(f, "{err}"),
			ErrorKind::StringFromUtf8(ref err) => write!(f, "{err}"),
			ErrorKind::Io(ref err) => write!(f, "{err}"),
			ErrorKind::Alloc(ref err) => write!(f, "{err}"),

			ErrorKind::StructuralInconsistency(ref err) => {
				write!(f, "Structural inconsistency: {err}")
			},
			ErrorKind::UnsupportedLayout(message) => write!(f, "Unsupported layout: {message}"),
			ErrorKind::FieldOverflow { position, value } => write!(
				f,
				"Dependent field at offset {position} cannot hold the corrected value {value}"
			),

			ErrorKind::UnknownFormat => {
				write!(f, "No format could be determined from the provided file")
			},

			// Files
			ErrorKind::TooMuchData => write!(
				f,
				"Attempted to read/write an abnormally large amount of data"
			),
			ErrorKind::SizeMismatch => write!(
				f,
				"Encountered an invalid item size, either too big or too small to be valid"
			),
			ErrorKind::FileDecoding(ref file_decode_err) => write!(f, "{file_decode_err}"),
			ErrorKind::FileEncoding(ref file_encode_err) => write!(f, "{file_encode_err}"),

			ErrorKind::Infallible(_) => write!(f, "A expected condition was not upheld"),
		}
	}
}
