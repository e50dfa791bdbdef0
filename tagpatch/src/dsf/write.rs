use super::{
	DATA_MAGIC, DSF_MAGIC, FILE_SIZE_OFFSET, FMT_CHUNK_SIZE, FMT_MAGIC, HEADER_SIZE,
	METADATA_POINTER_OFFSET,
};
use crate::config::{ParseOptions, ParsingMode, WriteOptions};
use crate::error::{Result, TagPatchError};
use crate::file::FileType;
use crate::macros::{decode_err, err, parse_mode_choice};
use crate::rewrite::{Endianness, FieldWidth, FormatAdapter, IndexBase, Session, Zone, ZoneFlag};
use crate::util::io::{FileLike, Length, Truncate};

use std::io::{Read, Seek, SeekFrom};

use byteorder::{LittleEndian, ReadBytesExt};

const ID3V2_ZONE: &str = "ID3v2";

/// A new ID3v2 tag for a DSF file
#[derive(Default, Clone, Debug, PartialEq, Eq)]
pub struct DsfUpdate {
	/// The already encoded ID3v2 tag
	///
	/// `None` keeps the existing tag, an empty tag removes it.
	pub id3v2: Option<Vec<u8>>,
}

/// Rewrites the trailing ID3v2 tag of a DSF file
///
/// The total file size and metadata pointer in the header are kept in sync. Removing the tag
/// sets the pointer to 0.
#[derive(Default, Debug, Clone, Copy)]
pub struct DsfAdapter;

impl DsfAdapter {
	/// Create a new `DsfAdapter`
	pub fn new() -> Self {
		Self
	}
}

/// Read DSF header (28 bytes, little-endian), returning the metadata pointer
fn read_header<R: Read>(reader: &mut R) -> Result<u64> {
	// Magic number (4 bytes): "DSD "
	let mut magic = [0u8; 4];
	reader.read_exact(&mut magic)?;
	if &magic != DSF_MAGIC {
		err!(UnknownFormat);
	}

	// Chunk size (8 bytes): should be 28
	let chunk_size = reader.read_u64::<LittleEndian>()?;
	if chunk_size != HEADER_SIZE {
		decode_err!(@BAIL Dsf, "Invalid DSF header chunk size");
	}

	// File size (8 bytes), only ever adjusted
	let _file_size = reader.read_u64::<LittleEndian>()?;

	// Metadata pointer (8 bytes) - 0 if no metadata
	let metadata_pointer = reader.read_u64::<LittleEndian>()?;

	Ok(metadata_pointer)
}

/// Skip the `fmt ` and `data` chunks, returning the end of the audio data
fn skip_chunks<R: Read + Seek>(reader: &mut R) -> Result<u64> {
	let mut magic = [0u8; 4];
	reader.read_exact(&mut magic)?;
	if &magic != FMT_MAGIC {
		decode_err!(@BAIL Dsf, "Expected fmt chunk");
	}

	let chunk_size = reader.read_u64::<LittleEndian>()?;
	if chunk_size != FMT_CHUNK_SIZE {
		decode_err!(@BAIL Dsf, "Invalid fmt chunk size");
	}

	reader.seek(SeekFrom::Start(HEADER_SIZE + FMT_CHUNK_SIZE))?;

	reader.read_exact(&mut magic)?;
	if &magic != DATA_MAGIC {
		decode_err!(@BAIL Dsf, "Expected data chunk");
	}

	// Includes the chunk header
	let chunk_size = reader.read_u64::<LittleEndian>()?;
	Ok(HEADER_SIZE + FMT_CHUNK_SIZE + chunk_size)
}

impl FormatAdapter for DsfAdapter {
	type Update = DsfUpdate;

	const FILE_TYPE: FileType = FileType::Dsf;

	fn prepare<F>(&mut self, session: &mut Session<'_, F>, parse_options: ParseOptions) -> Result<()>
	where
		F: FileLike,
		TagPatchError: From<<F as Truncate>::Error>,
		TagPatchError: From<<F as Length>::Error>,
	{
		let file_len = session.file_len()?;
		let parse_mode = parse_options.parsing_mode;

		let (metadata_pointer, audio_end) = {
			let mut reader = session.reader();
			reader.rewind()?;

			let metadata_pointer = read_header(&mut reader)?;
			let audio_end = skip_chunks(&mut reader)?;

			(metadata_pointer, audio_end)
		};

		if audio_end > file_len {
			parse_mode_choice!(
				parse_mode,
				STRICT: decode_err!(@BAIL Dsf, "Data chunk extends past the end of the file"),
				DEFAULT: log::warn!("Data chunk extends past the end of the file")
			);
		}

		let (offset, size) = match metadata_pointer {
			0 => (file_len, 0),
			pointer if pointer > file_len => {
				decode_err!(@BAIL Dsf, "Metadata pointer is past the end of the file")
			},
			pointer => {
				if pointer < audio_end && parse_mode == ParsingMode::Strict {
					decode_err!(@BAIL Dsf, "Metadata pointer is inside the data chunk");
				}

				(pointer, file_len - pointer)
			},
		};

		log::debug!("ID3v2 zone at {offset}, size: {size}");

		session
			.add_zone(ID3V2_ZONE, offset, size, Vec::new(), ZoneFlag::None)
			.add_size_ref(FILE_SIZE_OFFSET, FieldWidth::U64, Endianness::Little, [
				ID3V2_ZONE,
			])
			.add_index_ref(
				METADATA_POINTER_OFFSET,
				FieldWidth::U64,
				Endianness::Little,
				IndexBase::Absolute,
				Some(0),
				ID3V2_ZONE,
			);

		Ok(())
	}

	fn generate(
		&self,
		zone: &Zone,
		_original: &[u8],
		update: &Self::Update,
		_write_options: WriteOptions,
	) -> Result<Option<Vec<u8>>> {
		if zone.name() != ID3V2_ZONE {
			return Ok(None);
		}

		Ok(update.id3v2.clone())
	}
}
