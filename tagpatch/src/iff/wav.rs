use super::chunk::{Chunks, UnpaddedTail, create_chunk};
use super::info::RiffInfoList;
use crate::config::{ParseOptions, WriteOptions};
use crate::error::{Result, TagPatchError};
use crate::file::FileType;
use crate::macros::{decode_err, err, parse_mode_choice};
use crate::rewrite::{Endianness, FieldWidth, FormatAdapter, Session, Zone, ZoneFlag};
use crate::util::io::{FileLike, Length, Truncate};

use std::io::{Read, Seek, SeekFrom};

use byteorder::{ByteOrder, LittleEndian};

const LIST_ZONE: &str = "LIST";
const ID3_ZONE: &str = "ID3 ";
const BEXT_ZONE: &str = "bext";

/// New tags for a WAV file
///
/// Every field follows the same rules:
///
/// * `None` keeps the existing chunk (or its absence)
/// * An empty value removes the chunk
/// * Anything else replaces or creates the chunk
#[derive(Default, Clone, Debug, PartialEq, Eq)]
pub struct WavUpdate {
	/// The `LIST` chunk of type `INFO`
	pub info: Option<RiffInfoList>,
	/// The content of the `ID3 ` chunk, an already encoded ID3v2 tag
	pub id3v2: Option<Vec<u8>>,
	/// The content of the `bext` (Broadcast Wave) chunk
	pub bext: Option<Vec<u8>>,
}

/// Rewrites the tag chunks of a RIFF WAVE file
///
/// Only the first `LIST INFO`, `ID3 ` and `bext` chunks are handled. Missing chunks are
/// appended to the end of the RIFF stream.
#[derive(Debug, Clone)]
pub struct WavAdapter {
	id3_fourcc: [u8; 4],
	tail: UnpaddedTail,
}

impl Default for WavAdapter {
	fn default() -> Self {
		Self {
			id3_fourcc: *b"ID3 ",
			tail: UnpaddedTail::default(),
		}
	}
}

impl WavAdapter {
	/// Create a new `WavAdapter`
	pub fn new() -> Self {
		Self::default()
	}
}

#[derive(Default)]
struct FoundChunks {
	info: Option<(u64, u64)>,
	id3v2: Option<(u64, u64)>,
	bext: Option<(u64, u64)>,
}

pub(super) fn verify_wav<R>(data: &mut R) -> Result<u32>
where
	R: Read,
{
	let mut id = [0; 12];
	data.read_exact(&mut id)?;

	if &id[..4] != b"RIFF" {
		decode_err!(@BAIL Wav, "WAV file doesn't contain a RIFF chunk");
	}

	if &id[8..] != b"WAVE" {
		decode_err!(@BAIL Wav, "Found RIFF file, format is not WAVE");
	}

	Ok(LittleEndian::read_u32(&id[4..8]))
}

impl FormatAdapter for WavAdapter {
	type Update = WavUpdate;

	const FILE_TYPE: FileType = FileType::Wav;

	fn prepare<F>(&mut self, session: &mut Session<'_, F>, parse_options: ParseOptions) -> Result<()>
	where
		F: FileLike,
		TagPatchError: From<<F as Truncate>::Error>,
		TagPatchError: From<<F as Length>::Error>,
	{
		let file_len = session.file_len()?;
		let parse_mode = parse_options.parsing_mode;

		let (stream_end, found) = {
			let mut reader = session.reader();
			reader.rewind()?;

			let riff_size = verify_wav(&mut reader)?;

			let mut stream_end = 8 + u64::from(riff_size);
			if stream_end > file_len {
				parse_mode_choice!(
					parse_mode,
					STRICT: err!(SizeMismatch),
					DEFAULT: {
						log::warn!("RIFF size exceeds the file length, assuming the stream ends at EOF");
						stream_end = file_len;
					}
				);
			}

			let mut chunks = Chunks::<LittleEndian>::new(stream_end.saturating_sub(12), parse_mode);
			let mut found = FoundChunks::default();

			while chunks.next(&mut reader)? {
				let range = (chunks.offset, chunks.total_size());

				match &chunks.fourcc {
					b"LIST" if found.info.is_none() && chunks.size >= 4 => {
						let mut list_type = [0; 4];
						reader.read_exact(&mut list_type)?;
						reader.seek(SeekFrom::Current(-4))?;

						if &list_type == b"INFO" {
							found.info = Some(range);
						}
					},
					b"ID3 " | b"id3 " if found.id3v2.is_none() => {
						self.id3_fourcc = chunks.fourcc;
						found.id3v2 = Some(range);
					},
					b"bext" if found.bext.is_none() => found.bext = Some(range),
					_ => {},
				}

				chunks.skip(&mut reader)?;
			}

			(stream_end, found)
		};

		log::debug!("RIFF stream ends at {stream_end}");

		self.tail = UnpaddedTail::new(stream_end);
		for (name, range) in [
			(LIST_ZONE, found.info),
			(ID3_ZONE, found.id3v2),
			(BEXT_ZONE, found.bext),
		] {
			let (offset, size) = range.unwrap_or((stream_end, 0));
			self.tail.push(name, offset, size);
			session.add_zone(name, offset, size, Vec::new(), ZoneFlag::None);
		}

		session.add_size_ref(4, FieldWidth::U32, Endianness::Little, [
			LIST_ZONE, ID3_ZONE, BEXT_ZONE,
		]);

		Ok(())
	}

	fn generate(
		&self,
		zone: &Zone,
		original: &[u8],
		update: &Self::Update,
		_write_options: WriteOptions,
	) -> Result<Option<Vec<u8>>> {
		let content = self.chunk_for(zone, update)?;
		self.tail
			.pad(zone, original, content, |name| match name {
				LIST_ZONE => update.info.as_ref().is_some_and(RiffInfoList::has_values),
				ID3_ZONE => update.id3v2.as_ref().is_some_and(|tag| !tag.is_empty()),
				BEXT_ZONE => update.bext.as_ref().is_some_and(|bext| !bext.is_empty()),
				_ => false,
			})
	}
}

impl WavAdapter {
	fn chunk_for(&self, zone: &Zone, update: &WavUpdate) -> Result<Option<Vec<u8>>> {
		match zone.name() {
			LIST_ZONE => update.info.as_ref().map(RiffInfoList::to_chunk).transpose(),
			ID3_ZONE => update
				.id3v2
				.as_deref()
				.map(|tag| chunk_or_empty(self.id3_fourcc, tag))
				.transpose(),
			BEXT_ZONE => update
				.bext
				.as_deref()
				.map(|bext| chunk_or_empty(*b"bext", bext))
				.transpose(),
			_ => Ok(None),
		}
	}
}

fn chunk_or_empty(fourcc: [u8; 4], content: &[u8]) -> Result<Vec<u8>> {
	if content.is_empty() {
		return Ok(Vec::new());
	}

	create_chunk::<LittleEndian>(fourcc, content)
}
