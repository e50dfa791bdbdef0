use crate::config::ParsingMode;
use crate::error::Result;
use crate::macros::{decode_err, err, parse_mode_choice};
use crate::rewrite::FieldWidth;
use crate::util::alloc::VecFallibleCapacity;

use std::io::{Read, Seek, SeekFrom};

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};

pub(super) const FOURCC_LEN: u64 = 4;
pub(super) const IDENTIFIER_LEN: u64 = 4;
pub(super) const ATOM_HEADER_LEN: u64 = FOURCC_LEN + IDENTIFIER_LEN;
pub(super) const EXTENDED_ATOM_HEADER_LEN: u64 = ATOM_HEADER_LEN + 8;
pub(super) const HDLR_SIZE: u64 = ATOM_HEADER_LEN + 25;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct AtomInfo {
	pub(super) start: u64,
	pub(super) len: u64,
	pub(super) extended: bool,
	/// The size field is 0, the atom runs to the end of the file
	pub(super) open_ended: bool,
	pub(super) fourcc: [u8; 4],
}

// ISO/IEC 14496-12 permits any characters to be used in atom identifiers. This doesn't
// leave us any room for error detection.
//
// TagLib has decided on a character set to consider valid, so we will do the same:
// <https://github.com/taglib/taglib/issues/1077#issuecomment-1440385838>
fn is_valid_identifier_byte(b: u8) -> bool {
	(b' '..=b'~').contains(&b) || b == b'\xA9'
}

impl AtomInfo {
	/// Read the atom header at the current position
	///
	/// `parent_end` is the end of the enclosing atom (or the file). Returns `None` when the
	/// atom cannot be read, and the parsing mode allows it to be ignored.
	pub(super) fn read<R>(data: &mut R, parent_end: u64, parse_mode: ParsingMode) -> Result<Option<Self>>
	where
		R: Read + Seek,
	{
		let start = data.stream_position()?;

		let len_raw = u64::from(data.read_u32::<BigEndian>()?);

		let mut fourcc = [0; IDENTIFIER_LEN as usize];
		data.read_exact(&mut fourcc)?;

		if !fourcc.iter().copied().all(is_valid_identifier_byte) {
			parse_mode_choice!(
				parse_mode,
				STRICT: decode_err!(@BAIL Mp4, "Encountered an atom with invalid characters"),
				DEFAULT: {
					log::warn!("Encountered an atom with invalid characters, stopping");
					return Ok(None);
				}
			);
		}

		let (len, extended, open_ended) = match len_raw {
			// The atom extends to the end of its parent
			0 => (parent_end.saturating_sub(start), false, true),
			// There's an extended length
			1 => (data.read_u64::<BigEndian>()?, true, false),
			_ => (len_raw, false, false),
		};

		let header_len = if extended {
			EXTENDED_ATOM_HEADER_LEN
		} else {
			ATOM_HEADER_LEN
		};

		if len < header_len {
			decode_err!(@BAIL Mp4, "Found an atom with an invalid length");
		}

		if start.checked_add(len).is_none_or(|end| end > parent_end) {
			log::warn!("Encountered an atom with an invalid length, stopping");

			// As with all formats, there's a good chance certain software won't know how to actually use padding.
			// If the file ends with an incorrectly sized padding atom, we can just ignore it.
			let skippable = (parse_mode != ParsingMode::Strict && fourcc == *b"free")
				|| parse_mode == ParsingMode::Relaxed;
			if skippable {
				return Ok(None);
			}

			err!(SizeMismatch);
		}

		Ok(Some(Self {
			start,
			len,
			extended,
			open_ended,
			fourcc,
		}))
	}

	pub(super) fn header_size(&self) -> u64 {
		if !self.extended {
			return ATOM_HEADER_LEN;
		}

		EXTENDED_ATOM_HEADER_LEN
	}

	pub(super) fn content_start(&self) -> u64 {
		self.start + self.header_size()
	}

	pub(super) fn end(&self) -> u64 {
		self.start + self.len
	}

	/// The position and width of the size field, if there is one to update
	pub(super) fn size_field(&self) -> Option<(u64, FieldWidth)> {
		if self.open_ended {
			return None;
		}

		if self.extended {
			return Some((self.start + ATOM_HEADER_LEN, FieldWidth::U64));
		}

		Some((self.start, FieldWidth::U32))
	}
}

/// Read every child of `parent`, skipping `skip` bytes after its header first
pub(super) fn read_children<R>(
	data: &mut R,
	parent: &AtomInfo,
	skip: u64,
	parse_mode: ParsingMode,
) -> Result<Vec<AtomInfo>>
where
	R: Read + Seek,
{
	let end = parent.end();

	let mut children = Vec::new();
	let mut pos = parent.content_start() + skip;
	while pos + ATOM_HEADER_LEN <= end {
		data.seek(SeekFrom::Start(pos))?;

		let Some(atom) = AtomInfo::read(data, end, parse_mode)? else {
			break;
		};

		pos = atom.end();
		children.push(atom);
	}

	Ok(children)
}

/// Create an atom, using an extended size if necessary
pub(super) fn create_atom(fourcc: [u8; 4], content: &[u8]) -> Result<Vec<u8>> {
	let len = content.len() as u64;

	let mut atom = Vec::try_with_capacity_stable(content.len() + EXTENDED_ATOM_HEADER_LEN as usize)?;
	match u32::try_from(len + ATOM_HEADER_LEN) {
		Ok(size) => {
			atom.write_u32::<BigEndian>(size)?;
			atom.extend_from_slice(&fourcc);
		},
		Err(_) => {
			atom.write_u32::<BigEndian>(1)?;
			atom.extend_from_slice(&fourcc);
			atom.write_u64::<BigEndian>(len + EXTENDED_ATOM_HEADER_LEN)?;
		},
	}

	atom.extend_from_slice(content);
	Ok(atom)
}

/// Create a `meta` atom holding `ilst_atom`
pub(super) fn create_meta(ilst_atom: &[u8]) -> Result<Vec<u8>> {
	let mut content = Vec::try_with_capacity_stable((4 + HDLR_SIZE) as usize + ilst_atom.len())?;

	// Version (1) + flags (3)
	content.write_u32::<BigEndian>(0)?;

	// hdlr atom
	content.write_u32::<BigEndian>(HDLR_SIZE as u32)?;
	content.extend_from_slice(b"hdlr");
	content.write_u64::<BigEndian>(0)?;
	content.extend_from_slice(b"mdirappl");
	content.extend_from_slice(&[0; 9]);

	content.extend_from_slice(ilst_atom);
	create_atom(*b"meta", &content)
}

#[cfg(test)]
mod tests {
	use super::{ATOM_HEADER_LEN, AtomInfo, HDLR_SIZE, create_atom, create_meta, read_children};
	use crate::config::ParsingMode;
	use crate::rewrite::FieldWidth;

	use std::io::Cursor;

	#[test_log::test]
	fn meta_layout() {
		let ilst = create_atom(*b"ilst", &[]).unwrap();
		let meta = create_meta(&ilst).unwrap();
		// Header, version and flags, `hdlr`, empty `ilst`
		assert_eq!(meta.len() as u64, ATOM_HEADER_LEN + 4 + HDLR_SIZE + 8);

		let mut reader = Cursor::new(&meta);
		let atom = AtomInfo::read(&mut reader, meta.len() as u64, ParsingMode::Strict)
			.unwrap()
			.unwrap();
		assert_eq!(&atom.fourcc, b"meta");
		assert_eq!(atom.size_field(), Some((0, FieldWidth::U32)));

		let children = read_children(&mut reader, &atom, 4, ParsingMode::Strict).unwrap();
		let fourccs = children.iter().map(|c| c.fourcc).collect::<Vec<_>>();
		assert_eq!(fourccs, [*b"hdlr", *b"ilst"]);
	}

	#[test_log::test]
	fn invalid_length() {
		let mut data = create_atom(*b"free", &[0; 8]).unwrap();
		data.extend(create_atom(*b"udta", &[0; 8]).unwrap());
		data[3] = 100;

		let len = data.len() as u64;
		let read = |mode| AtomInfo::read(&mut Cursor::new(&data), len, mode);

		assert!(read(ParsingMode::Strict).is_err());
		assert!(read(ParsingMode::BestAttempt).unwrap().is_none());
	}

	#[test_log::test]
	fn extended_length_overflow() {
		let mut moov = create_atom(*b"moov", &[0; 16]).unwrap();
		moov[0..4].copy_from_slice(&1u32.to_be_bytes());
		moov[8..16].copy_from_slice(&u64::MAX.to_be_bytes());

		let mut data = create_atom(*b"free", &[]).unwrap();
		data.extend(moov);

		let len = data.len() as u64;
		let read = |mode| {
			let mut reader = Cursor::new(&data);
			reader.set_position(8);
			AtomInfo::read(&mut reader, len, mode)
		};

		assert!(read(ParsingMode::Strict).is_err());
		assert!(read(ParsingMode::Relaxed).unwrap().is_none());
	}
}
