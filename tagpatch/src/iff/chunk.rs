use crate::config::ParsingMode;
use crate::error::Result;
use crate::macros::{err, parse_mode_choice};
use crate::rewrite::Zone;
use crate::util::alloc::VecFallibleCapacity;

use std::io::{Read, Seek, SeekFrom};
use std::marker::PhantomData;

use byteorder::{ByteOrder, ReadBytesExt, WriteBytesExt};

pub(crate) const CHUNK_HEADER_SIZE: u64 = 8;

/// Walks the chunks of a RIFF/AIFF container
pub(crate) struct Chunks<B>
where
	B: ByteOrder,
{
	pub fourcc: [u8; 4],
	pub size: u32,
	/// The offset of the current chunk's header
	pub offset: u64,
	padded: bool,
	remaining_size: u64,
	parse_mode: ParsingMode,
	_phantom: PhantomData<B>,
}

impl<B: ByteOrder> Chunks<B> {
	#[must_use]
	pub const fn new(container_size: u64, parse_mode: ParsingMode) -> Self {
		Self {
			fourcc: [0; 4],
			size: 0,
			offset: 0,
			padded: false,
			remaining_size: container_size,
			parse_mode,
			_phantom: PhantomData,
		}
	}

	pub fn next<R>(&mut self, data: &mut R) -> Result<bool>
	where
		R: Read + Seek,
	{
		if self.remaining_size < CHUNK_HEADER_SIZE {
			return Ok(false);
		}

		self.offset = data.stream_position()?;
		data.read_exact(&mut self.fourcc)?;
		self.size = data.read_u32::<B>()?;

		self.remaining_size -= CHUNK_HEADER_SIZE;

		if u64::from(self.size) > self.remaining_size {
			let parse_mode = self.parse_mode;
			parse_mode_choice!(
				parse_mode,
				STRICT: err!(SizeMismatch),
				RELAXED: {
					log::warn!(
						"Chunk {:?} overruns its container, ignoring the remaining chunks",
						self.fourcc
					);
					return Ok(false);
				},
				DEFAULT: {
					log::warn!(
						"Chunk {:?} overruns its container, assuming it runs to the end",
						self.fourcc
					);
					self.size = self.remaining_size as u32;
				}
			);
		}

		// Chunks are expected to start on even boundaries, and are padded
		// with a 0 if necessary. The final chunk may be missing its padding.
		self.padded = self.size % 2 != 0 && self.remaining_size > u64::from(self.size);

		Ok(true)
	}

	/// The size of the current chunk, including its header and padding
	pub fn total_size(&self) -> u64 {
		CHUNK_HEADER_SIZE + u64::from(self.size) + u64::from(self.padded)
	}

	pub fn skip<R>(&mut self, data: &mut R) -> Result<()>
	where
		R: Read + Seek,
	{
		data.seek(SeekFrom::Current(i64::from(self.size)))?;

		self.remaining_size = self.remaining_size.saturating_sub(u64::from(self.size));
		self.correct_position(data)?;

		Ok(())
	}

	fn correct_position<R>(&mut self, data: &mut R) -> Result<()>
	where
		R: Read + Seek,
	{
		if self.padded {
			data.seek(SeekFrom::Current(1))?;
			self.remaining_size = self.remaining_size.saturating_sub(1);
		}

		Ok(())
	}
}

/// Create a chunk, with its header and padding
pub(crate) fn create_chunk<B>(fourcc: [u8; 4], content: &[u8]) -> Result<Vec<u8>>
where
	B: ByteOrder,
{
	let Ok(size) = u32::try_from(content.len()) else {
		err!(TooMuchData);
	};

	let mut chunk = Vec::try_with_capacity_stable(content.len() + 9)?;
	chunk.extend_from_slice(&fourcc);
	chunk.write_u32::<B>(size)?;
	chunk.extend_from_slice(content);

	if size % 2 != 0 {
		chunk.push(0);
	}

	Ok(chunk)
}

/// The end of a container whose final chunk is missing its pad byte
///
/// Appending a chunk there would place it on an odd offset, so the first appended chunk has to
/// restore the padding. If the final chunk is itself a zone, it carries the pad byte instead.
#[derive(Default, Debug, Clone)]
pub(crate) struct UnpaddedTail {
	end: Option<u64>,
	last_zone: Option<&'static str>,
	placeholders: Vec<&'static str>,
}

impl UnpaddedTail {
	pub(crate) fn new(stream_end: u64) -> Self {
		Self {
			end: (stream_end % 2 != 0).then_some(stream_end),
			..Self::default()
		}
	}

	/// Record a zone registered at `offset`
	pub(crate) fn push(&mut self, name: &'static str, offset: u64, size: u64) {
		let Some(end) = self.end else {
			return;
		};

		if size == 0 && offset == end {
			self.placeholders.push(name);
		} else if size > 0 && offset + size == end {
			self.last_zone = Some(name);
		}
	}

	/// Add the missing pad byte to `content` if `zone` is the one to carry it
	///
	/// `has_content` reports whether the zone named by its argument will be written with
	/// any content.
	pub(crate) fn pad<F>(
		&self,
		zone: &Zone,
		original: &[u8],
		content: Option<Vec<u8>>,
		has_content: F,
	) -> Result<Option<Vec<u8>>>
	where
		F: Fn(&str) -> bool,
	{
		let Some(end) = self.end else {
			return Ok(content);
		};

		if !self.placeholders.iter().any(|name| has_content(name)) {
			return Ok(content);
		}

		if let Some(last_zone) = self.last_zone {
			// Regenerated chunks are always padded (or gone), only a kept one needs the byte
			if zone.name() != last_zone || zone.end() != end || content.is_some() {
				return Ok(content);
			}

			log::debug!("Padding the final chunk before appending new chunks");
			let mut padded = Vec::try_with_capacity_stable(original.len() + 1)?;
			padded.extend_from_slice(original);
			padded.push(0);
			return Ok(Some(padded));
		}

		let Some(content) = content else {
			return Ok(None);
		};

		let first_appended = self.placeholders.iter().find(|name| has_content(name));
		let carries_pad = zone.is_placeholder()
			&& zone.offset() == end
			&& first_appended.is_some_and(|name| *name == zone.name());
		if !carries_pad {
			return Ok(Some(content));
		}

		log::debug!("Restoring the final chunk's pad byte before `{}`", zone.name());
		let mut padded = Vec::try_with_capacity_stable(content.len() + 1)?;
		padded.push(0);
		padded.extend(content);
		Ok(Some(padded))
	}
}
