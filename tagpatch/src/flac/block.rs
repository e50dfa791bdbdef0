use crate::error::Result;
use crate::macros::{decode_err, err};
use crate::util::alloc::VecFallibleCapacity;

use std::io::{Read, Seek};

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};

pub(super) const BLOCK_ID_STREAMINFO: u8 = 0;
pub(super) const BLOCK_ID_PADDING: u8 = 1;
pub(super) const BLOCK_ID_APPLICATION: u8 = 2;
pub(super) const BLOCK_ID_SEEKTABLE: u8 = 3;
pub(super) const BLOCK_ID_VORBIS_COMMENTS: u8 = 4;
pub(super) const BLOCK_ID_CUESHEET: u8 = 5;
pub(super) const BLOCK_ID_PICTURE: u8 = 6;

pub(super) const BLOCK_HEADER_SIZE: u64 = 4;
const LAST_BLOCK_FLAG: u8 = 0x80;
const MAX_BLOCK_SIZE: usize = 0xFF_FFFF;

pub(super) struct BlockHeader {
	pub(super) ty: u8,
	pub(super) last: bool,
	pub(super) size: u32,
	pub(super) start: u64,
}

impl BlockHeader {
	pub(super) fn read<R>(data: &mut R) -> Result<Self>
	where
		R: Read + Seek,
	{
		let start = data.stream_position()?;

		let byte = data.read_u8()?;
		let last = (byte & LAST_BLOCK_FLAG) != 0;
		let ty = byte & !LAST_BLOCK_FLAG;

		if ty == 127 {
			decode_err!(@BAIL Flac, "Encountered an invalid block type (127)");
		}

		let size = data.read_u24::<BigEndian>()?;
		log::trace!("Reading FLAC block, type: {ty}, size: {size}");

		Ok(Self {
			ty,
			last,
			size,
			start,
		})
	}

	pub(super) fn total_size(&self) -> u64 {
		BLOCK_HEADER_SIZE + u64::from(self.size)
	}

	pub(super) fn end(&self) -> u64 {
		self.start + self.total_size()
	}
}

/// The zone name used for a block type
pub(super) fn block_name(ty: u8) -> &'static str {
	match ty {
		BLOCK_ID_STREAMINFO => "STREAMINFO",
		BLOCK_ID_PADDING => "PADDING",
		BLOCK_ID_APPLICATION => "APPLICATION",
		BLOCK_ID_SEEKTABLE => "SEEKTABLE",
		BLOCK_ID_VORBIS_COMMENTS => "VORBIS_COMMENT",
		BLOCK_ID_CUESHEET => "CUESHEET",
		BLOCK_ID_PICTURE => "PICTURE",
		_ => "RESERVED",
	}
}

/// Encode a block, with its header
pub(super) fn encode_block(ty: u8, last: bool, content: &[u8]) -> Result<Vec<u8>> {
	if content.len() > MAX_BLOCK_SIZE {
		err!(TooMuchData);
	}

	let mut block = Vec::try_with_capacity_stable(content.len() + BLOCK_HEADER_SIZE as usize)?;
	block.push(if last { ty | LAST_BLOCK_FLAG } else { ty });
	block.write_u24::<BigEndian>(content.len() as u32)?;
	block.extend_from_slice(content);

	Ok(block)
}

/// Flip the last block bit of an already encoded block
pub(super) fn with_last_flag(mut block: Vec<u8>, last: bool) -> Vec<u8> {
	if let Some(byte) = block.first_mut() {
		if last {
			*byte |= LAST_BLOCK_FLAG;
		} else {
			*byte &= !LAST_BLOCK_FLAG;
		}
	}

	block
}
