use crate::error::Result;
use crate::macros::err;
use crate::util::alloc::VecFallibleCapacity;

use std::io::Read;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

/// GUID (16) + size (8)
pub(super) const OBJECT_HEADER_SIZE: u64 = 24;
/// Object header + object count (4) + reserved (2)
pub(super) const HEADER_OBJECT_SIZE: u64 = OBJECT_HEADER_SIZE + 6;

/// Offset of the object count in the Header Object
pub(super) const OBJECT_COUNT_OFFSET: u64 = OBJECT_HEADER_SIZE;
/// Offset of the file size in the File Properties Object (object header + file ID)
pub(super) const FILE_SIZE_OFFSET: u64 = OBJECT_HEADER_SIZE + 16;

/// `75B22633-668E-11CF-A6D9-00AA0062CE6C`
pub(super) const CONTENT_DESCRIPTION_GUID: [u8; 16] = [
	0x33, 0x26, 0xB2, 0x75, 0x8E, 0x66, 0xCF, 0x11, 0xA6, 0xD9, 0x00, 0xAA, 0x00, 0x62, 0xCE, 0x6C,
];
/// `D2D0A440-E307-11D2-97F0-00A0C95EA850`
pub(super) const EXTENDED_CONTENT_DESCRIPTION_GUID: [u8; 16] = [
	0x40, 0xA4, 0xD0, 0xD2, 0x07, 0xE3, 0xD2, 0x11, 0x97, 0xF0, 0x00, 0xA0, 0xC9, 0x5E, 0xA8, 0x50,
];
/// `8CABDCA1-A947-11CF-8EE4-00C00C205365`
pub(super) const FILE_PROPERTIES_GUID: [u8; 16] = [
	0xA1, 0xDC, 0xAB, 0x8C, 0x47, 0xA9, 0xCF, 0x11, 0x8E, 0xE4, 0x00, 0xC0, 0x0C, 0x20, 0x53, 0x65,
];

pub(super) struct ObjectHeader {
	pub(super) guid: [u8; 16],
	pub(super) size: u64,
}

impl ObjectHeader {
	pub(super) fn read<R>(data: &mut R) -> Result<Self>
	where
		R: Read,
	{
		let mut guid = [0; 16];
		data.read_exact(&mut guid)?;

		let size = data.read_u64::<LittleEndian>()?;
		if size < OBJECT_HEADER_SIZE {
			err!(SizeMismatch);
		}

		Ok(Self { guid, size })
	}
}

/// Create an object, with its header
pub(super) fn create_object(guid: [u8; 16], body: &[u8]) -> Result<Vec<u8>> {
	let size = OBJECT_HEADER_SIZE + body.len() as u64;

	let mut object = Vec::try_with_capacity_stable(size as usize)?;
	object.extend_from_slice(&guid);
	object.write_u64::<LittleEndian>(size)?;
	object.extend_from_slice(body);

	Ok(object)
}
