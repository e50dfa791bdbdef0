use super::block::{
	BLOCK_HEADER_SIZE, BLOCK_ID_PADDING, BLOCK_ID_PICTURE, BLOCK_ID_STREAMINFO,
	BLOCK_ID_VORBIS_COMMENTS, BlockHeader, block_name, encode_block, with_last_flag,
};
use crate::config::{ParseOptions, WriteOptions};
use crate::error::{Result, TagPatchError};
use crate::file::FileType;
use crate::macros::{decode_err, try_vec};
use crate::ogg::{VorbisComments, existing_vendor};
use crate::rewrite::{FormatAdapter, Session, Zone, ZoneFlag};
use crate::util::io::{FileLike, Length, Truncate};

use std::borrow::Cow;
use std::io::{Read, Seek, SeekFrom};

const ID3V2_ZONE: &str = "ID3v2";
const ID3V2_HEADER_SIZE: u64 = 10;

/// New metadata for a FLAC file
#[derive(Default, Clone, Debug, PartialEq, Eq)]
pub struct FlacUpdate {
	/// The new `VORBIS_COMMENT` block
	///
	/// `None` keeps the existing block, a set with no (non-empty) items removes it.
	/// Without a vendor, the vendor of the existing block is kept.
	pub vorbis_comments: Option<VorbisComments>,
	/// The new `PICTURE` blocks, already encoded (without their block headers)
	///
	/// `None` keeps the existing blocks, otherwise all existing pictures are replaced.
	pub pictures: Option<Vec<Vec<u8>>>,
	/// Strip an ID3v2 tag from the start of the file
	///
	/// ID3v2 is not a part of FLAC, it can only be removed.
	pub remove_id3v2: bool,
}

impl FlacUpdate {
	fn replaces_blocks(&self) -> bool {
		self.vorbis_comments.is_some() || self.pictures.is_some()
	}
}

#[derive(Debug, Clone, Copy)]
struct RegisteredBlock {
	ty: u8,
	offset: u64,
	existing: bool,
	first_of_kind: bool,
}

/// Rewrites the metadata blocks of a FLAC file
///
/// `VORBIS_COMMENT` and `PICTURE` blocks are replaced, every other block passes through
/// untouched (apart from the last block bit). When neither exists, they are added after the
/// last metadata block, followed by a `PADDING` block if the file has none and
/// [`WriteOptions::preferred_padding`] is set.
#[derive(Default, Debug, Clone)]
pub struct FlacAdapter {
	blocks: Vec<RegisteredBlock>,
}

impl FlacAdapter {
	/// Create a new `FlacAdapter`
	pub fn new() -> Self {
		Self::default()
	}

	fn emits(block: &RegisteredBlock, update: &FlacUpdate, write_options: WriteOptions) -> bool {
		match block.ty {
			BLOCK_ID_VORBIS_COMMENTS => match &update.vorbis_comments {
				Some(comments) => {
					block.first_of_kind && comments.items().any(|(_, value)| !value.is_empty())
				},
				None => block.existing,
			},
			BLOCK_ID_PICTURE => match &update.pictures {
				Some(pictures) => block.first_of_kind && pictures.iter().any(|p| !p.is_empty()),
				None => block.existing,
			},
			BLOCK_ID_PADDING if !block.existing => {
				update.replaces_blocks() && write_options.preferred_padding.is_some()
			},
			_ => true,
		}
	}

	fn create_comments(comments: &VorbisComments, original: &[u8]) -> Result<Vec<u8>> {
		let vendor = match comments.vendor() {
			Some(vendor) => Cow::Borrowed(vendor),
			// Retain the original vendor string
			None if original.len() > BLOCK_HEADER_SIZE as usize => {
				existing_vendor(&original[BLOCK_HEADER_SIZE as usize..])?
			},
			None => Cow::Borrowed(""),
		};

		comments.to_packet(&vendor, &[], false)
	}

	fn create_pictures(pictures: &[Vec<u8>], last: bool) -> Result<Vec<u8>> {
		let pictures = pictures.iter().filter(|p| !p.is_empty()).collect::<Vec<_>>();

		let mut blocks = Vec::new();
		for (index, picture) in pictures.iter().enumerate() {
			let is_last = last && index == pictures.len() - 1;
			blocks.extend(encode_block(BLOCK_ID_PICTURE, is_last, picture)?);
		}

		Ok(blocks)
	}
}

/// Skip an ID3v2 tag at the start of the stream, returning its size
fn skip_id3v2<R>(data: &mut R) -> Result<u64>
where
	R: Read + Seek,
{
	let mut header = [0; ID3V2_HEADER_SIZE as usize];
	if data.read_exact(&mut header).is_err() || &header[..3] != b"ID3" {
		data.rewind()?;
		return Ok(0);
	}

	let size = header[6..]
		.iter()
		.fold(0u64, |size, byte| (size << 7) | u64::from(byte & 0x7F));

	let mut total_size = ID3V2_HEADER_SIZE + size;

	// Footer flag
	if header[5] & 0x10 != 0 {
		total_size += ID3V2_HEADER_SIZE;
	}

	log::warn!("Encountered an ID3v2 tag, size: {total_size}");

	data.seek(SeekFrom::Start(total_size))?;
	Ok(total_size)
}

/// Find the stream marker, allowing up to `max_junk_bytes` of junk before it
fn find_stream_marker<R>(data: &mut R, max_junk_bytes: usize) -> Result<u64>
where
	R: Read + Seek,
{
	let start = data.stream_position()?;

	let mut window = try_vec![0; max_junk_bytes + 4];
	let mut read = 0;
	while read < window.len() {
		match data.read(&mut window[read..])? {
			0 => break,
			n => read += n,
		}
	}

	let Some(position) = window[..read]
		.windows(4)
		.position(|window| window == b"fLaC")
	else {
		decode_err!(@BAIL Flac, "File missing \"fLaC\" stream marker");
	};

	if position > 0 {
		log::warn!("Skipping {position} bytes of junk before the stream marker");
	}

	let marker_end = start + position as u64 + 4;
	data.seek(SeekFrom::Start(marker_end))?;
	Ok(marker_end)
}

impl FormatAdapter for FlacAdapter {
	type Update = FlacUpdate;

	const FILE_TYPE: FileType = FileType::Flac;

	fn prepare<F>(&mut self, session: &mut Session<'_, F>, parse_options: ParseOptions) -> Result<()>
	where
		F: FileLike,
		TagPatchError: From<<F as Truncate>::Error>,
		TagPatchError: From<<F as Length>::Error>,
	{
		let (id3v2_size, headers) = {
			let mut reader = session.reader();
			reader.rewind()?;

			let id3v2_size = skip_id3v2(&mut reader)?;
			find_stream_marker(&mut reader, parse_options.max_junk_bytes)?;

			let mut headers = Vec::new();
			loop {
				let header = BlockHeader::read(&mut reader)?;
				if headers.is_empty() && header.ty != BLOCK_ID_STREAMINFO {
					decode_err!(@BAIL Flac, "File missing mandatory STREAMINFO block");
				}

				reader.seek(SeekFrom::Start(header.end()))?;

				let last = header.last;
				headers.push(header);

				if last {
					break;
				}
			}

			(id3v2_size, headers)
		};

		log::debug!("Found {} FLAC metadata blocks", headers.len());

		if id3v2_size > 0 {
			session.add_zone(ID3V2_ZONE, 0, id3v2_size, Vec::new(), ZoneFlag::None);
		}

		let mut blocks = Vec::with_capacity(headers.len() + 3);
		let mut metadata_end = 0;
		for header in &headers {
			let first_of_kind = !blocks
				.iter()
				.any(|block: &RegisteredBlock| block.ty == header.ty);

			let flag = match header.ty {
				BLOCK_ID_PICTURE if first_of_kind => ZoneFlag::FirstPicture,
				_ if header.last => ZoneFlag::LastMetadataBlock,
				_ => ZoneFlag::None,
			};

			session.add_zone(
				block_name(header.ty),
				header.start,
				header.total_size(),
				Vec::new(),
				flag,
			);

			blocks.push(RegisteredBlock {
				ty: header.ty,
				offset: header.start,
				existing: true,
				first_of_kind,
			});
			metadata_end = header.end();
		}

		for ty in [BLOCK_ID_VORBIS_COMMENTS, BLOCK_ID_PICTURE, BLOCK_ID_PADDING] {
			if blocks.iter().any(|block| block.ty == ty) {
				continue;
			}

			let flag = if ty == BLOCK_ID_PICTURE {
				ZoneFlag::FirstPicture
			} else {
				ZoneFlag::None
			};

			session.add_zone(block_name(ty), metadata_end, 0, Vec::new(), flag);
			blocks.push(RegisteredBlock {
				ty,
				offset: metadata_end,
				existing: false,
				first_of_kind: true,
			});
		}

		self.blocks = blocks;
		Ok(())
	}

	fn generate(
		&self,
		zone: &Zone,
		original: &[u8],
		update: &Self::Update,
		write_options: WriteOptions,
	) -> Result<Option<Vec<u8>>> {
		if zone.name() == ID3V2_ZONE {
			return Ok(update.remove_id3v2.then(Vec::new));
		}

		let Some(index) = self
			.blocks
			.iter()
			.position(|b| b.offset == zone.offset() && block_name(b.ty) == zone.name())
		else {
			return Ok(None);
		};
		let block = &self.blocks[index];

		if !Self::emits(block, update, write_options) {
			// Placeholders that stay empty are left alone
			return Ok(block.existing.then(Vec::new));
		}

		let last = self
			.blocks
			.iter()
			.rposition(|b| Self::emits(b, update, write_options))
			== Some(index);

		match block.ty {
			BLOCK_ID_VORBIS_COMMENTS => {
				if let Some(comments) = &update.vorbis_comments {
					let content = Self::create_comments(comments, original)?;
					return encode_block(BLOCK_ID_VORBIS_COMMENTS, last, &content).map(Some);
				}
			},
			BLOCK_ID_PICTURE => {
				if let Some(pictures) = &update.pictures {
					return Self::create_pictures(pictures, last).map(Some);
				}
			},
			BLOCK_ID_PADDING if !block.existing => {
				let size = write_options.preferred_padding.unwrap_or_default();
				log::debug!("File is missing a PADDING block, adding one of {size} bytes");

				let padding = try_vec![0; size as usize];
				return encode_block(BLOCK_ID_PADDING, last, &padding).map(Some);
			},
			_ => {},
		}

		// Passed through, only the last block bit may need to change
		if (zone.flag() == ZoneFlag::LastMetadataBlock) == last {
			return Ok(None);
		}

		log::trace!(
			"Updating the last block bit of {} to {last}",
			zone.name()
		);
		Ok(Some(with_last_flag(original.to_vec(), last)))
	}
}
