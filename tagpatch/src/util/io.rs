//! Various traits for reading and writing to file-like objects

use crate::config::global_options;
use crate::error::{Result, TagPatchError};

use std::collections::VecDeque;
use std::fs::File;
use std::io::{Cursor, Read, Seek, SeekFrom, Write};

/// Provides a method to truncate an object to the specified length
///
/// This is one component of the [`FileLike`] trait, which is used to provide implementors access to
/// rewrite sessions such as [`begin_rewrite`](crate::rewrite::begin_rewrite).
///
/// Take great care in implementing this for downstream types, as tagpatch will assume that the
/// container has the new length specified. If this assumption were to be broken, files **will** become corrupted.
///
/// # Examples
///
/// ```rust
/// use tagpatch::io::Truncate;
///
/// let mut data = vec![1, 2, 3, 4, 5];
/// data.truncate(3);
///
/// assert_eq!(data, vec![1, 2, 3]);
/// ```
pub trait Truncate {
	/// The error type of the truncation operation
	type Error: Into<TagPatchError>;

	/// Truncate a storage object to the specified length
	///
	/// # Errors
	///
	/// Errors depend on the object being truncated, which may not always be fallible.
	fn truncate(&mut self, new_len: u64) -> std::result::Result<(), Self::Error>;
}

impl Truncate for File {
	type Error = std::io::Error;

	fn truncate(&mut self, new_len: u64) -> std::result::Result<(), Self::Error> {
		self.set_len(new_len)
	}
}

impl Truncate for Vec<u8> {
	type Error = std::convert::Infallible;

	fn truncate(&mut self, new_len: u64) -> std::result::Result<(), Self::Error> {
		self.truncate(new_len as usize);
		Ok(())
	}
}

impl Truncate for VecDeque<u8> {
	type Error = std::convert::Infallible;

	fn truncate(&mut self, new_len: u64) -> std::result::Result<(), Self::Error> {
		self.truncate(new_len as usize);
		Ok(())
	}
}

impl<T> Truncate for Cursor<T>
where
	T: Truncate,
{
	type Error = <T as Truncate>::Error;

	fn truncate(&mut self, new_len: u64) -> std::result::Result<(), Self::Error> {
		self.get_mut().truncate(new_len)
	}
}

impl<T> Truncate for Box<T>
where
	T: Truncate,
{
	type Error = <T as Truncate>::Error;

	fn truncate(&mut self, new_len: u64) -> std::result::Result<(), Self::Error> {
		self.as_mut().truncate(new_len)
	}
}

impl<T> Truncate for &mut T
where
	T: Truncate,
{
	type Error = <T as Truncate>::Error;

	fn truncate(&mut self, new_len: u64) -> std::result::Result<(), Self::Error> {
		(**self).truncate(new_len)
	}
}

/// Provides a method to get the length of a storage object
///
/// This is one component of the [`FileLike`] trait, which is used to provide implementors access to
/// rewrite sessions such as [`begin_rewrite`](crate::rewrite::begin_rewrite).
///
/// Take great care in implementing this for downstream types, as tagpatch will assume that the
/// container has the exact length specified. If this assumption were to be broken, files **may** become corrupted.
///
/// # Examples
///
/// ```rust
/// use tagpatch::io::Length;
///
/// let data = vec![1, 2, 3, 4, 5];
/// assert_eq!(data.len(), 5);
/// ```
pub trait Length {
	/// The error type of the length operation
	type Error: Into<TagPatchError>;

	/// Get the length of a storage object
	///
	/// # Errors
	///
	/// Errors depend on the object being read, which may not always be fallible.
	fn len(&self) -> std::result::Result<u64, Self::Error>;
}

impl Length for File {
	type Error = std::io::Error;

	fn len(&self) -> std::result::Result<u64, Self::Error> {
		self.metadata().map(|m| m.len())
	}
}

impl Length for Vec<u8> {
	type Error = std::convert::Infallible;

	fn len(&self) -> std::result::Result<u64, Self::Error> {
		Ok(self.len() as u64)
	}
}

impl Length for VecDeque<u8> {
	type Error = std::convert::Infallible;

	fn len(&self) -> std::result::Result<u64, Self::Error> {
		Ok(self.len() as u64)
	}
}

impl<T> Length for Cursor<T>
where
	T: Length,
{
	type Error = <T as Length>::Error;

	fn len(&self) -> std::result::Result<u64, Self::Error> {
		Length::len(self.get_ref())
	}
}

impl<T> Length for Box<T>
where
	T: Length,
{
	type Error = <T as Length>::Error;

	fn len(&self) -> std::result::Result<u64, Self::Error> {
		Length::len(self.as_ref())
	}
}

impl<T> Length for &T
where
	T: Length,
{
	type Error = <T as Length>::Error;

	fn len(&self) -> std::result::Result<u64, Self::Error> {
		Length::len(*self)
	}
}

impl<T> Length for &mut T
where
	T: Length,
{
	type Error = <T as Length>::Error;

	fn len(&self) -> std::result::Result<u64, Self::Error> {
		Length::len(*self)
	}
}

/// Provides a set of methods to read and write to a file-like object
///
/// This is a combination of the [`Read`], [`Write`], [`Seek`], [`Truncate`], and [`Length`] traits.
/// It is used to provide implementors access to rewrite sessions such as
/// [`begin_rewrite`](crate::rewrite::begin_rewrite).
///
/// Take great care in implementing this for downstream types, as tagpatch will assume that the
/// trait implementations are correct. If this assumption were to be broken, files **may** become corrupted.
pub trait FileLike: Read + Write + Seek + Truncate + Length
where
	<Self as Truncate>::Error: Into<TagPatchError>,
	<Self as Length>::Error: Into<TagPatchError>,
{
}

impl<T> FileLike for T
where
	T: Read + Write + Seek + Truncate + Length,
	<T as Truncate>::Error: Into<TagPatchError>,
	<T as Length>::Error: Into<TagPatchError>,
{
}

/// Moves every byte from `from` to the end of `file` by `delta` bytes
///
/// Growing leaves `delta` stale bytes at `from`, which the caller is expected to overwrite.
/// Shrinking overwrites the `-delta` bytes preceding `from`, and truncates the file.
///
/// At most [`GlobalOptions::shift_buffer_size`](crate::config::GlobalOptions::shift_buffer_size)
/// bytes are held in memory at once.
pub(crate) fn shift_tail<F>(file: &mut F, from: u64, delta: i64) -> Result<()>
where
	F: FileLike,
	TagPatchError: From<<F as Truncate>::Error>,
	TagPatchError: From<<F as Length>::Error>,
{
	if delta == 0 {
		return Ok(());
	}

	let len = file.len()?;
	let distance = delta.unsigned_abs();
	if from > len || (delta < 0 && distance > from) {
		return Err(std::io::Error::from(std::io::ErrorKind::UnexpectedEof).into());
	}

	let buffer_size = unsafe { global_options().shift_buffer_size }.max(1) as u64;
	let mut buf = vec![0; buffer_size.min(len - from).max(1) as usize];

	if delta > 0 {
		// Copy from the end backwards, so the destination never overwrites unread bytes
		let mut end = len;
		while end > from {
			let chunk = (end - from).min(buffer_size);
			let start = end - chunk;
			let chunk_buf = &mut buf[..chunk as usize];

			file.seek(SeekFrom::Start(start))?;
			file.read_exact(chunk_buf)?;
			file.seek(SeekFrom::Start(start + distance))?;
			file.write_all(chunk_buf)?;

			end = start;
		}

		// Nothing was moved when appending, the file still needs to reach its new length
		if from == len {
			file.seek(SeekFrom::Start(len))?;
			std::io::copy(&mut std::io::repeat(0).take(distance), file)?;
		}

		return Ok(());
	}

	let mut read_pos = from;
	while read_pos < len {
		let chunk = (len - read_pos).min(buffer_size);
		let chunk_buf = &mut buf[..chunk as usize];

		file.seek(SeekFrom::Start(read_pos))?;
		file.read_exact(chunk_buf)?;
		file.seek(SeekFrom::Start(read_pos - distance))?;
		file.write_all(chunk_buf)?;

		read_pos += chunk;
	}

	file.truncate(len - distance)?;
	Ok(())
}
