use super::chunk::{Chunks, UnpaddedTail, create_chunk};
use crate::config::{ParseOptions, WriteOptions};
use crate::error::{Result, TagPatchError};
use crate::file::FileType;
use crate::macros::{decode_err, err, parse_mode_choice};
use crate::rewrite::{Endianness, FieldWidth, FormatAdapter, Session, Zone, ZoneFlag};
use crate::util::io::{FileLike, Length, Truncate};

use std::io::{Read, Seek};

use byteorder::{BigEndian, ByteOrder};

const ID3_ZONE: &str = "ID3 ";
const NAME_ZONE: &str = "NAME";
const AUTH_ZONE: &str = "AUTH";
const COPYRIGHT_ZONE: &str = "(c) ";
const ANNO_ZONE: &str = "ANNO";

/// New text chunks for an AIFF file
///
/// `None` keeps the existing chunk(s), an empty value removes them.
///
/// ## Annotations
///
/// An AIFF file may contain any number of `ANNO` chunks. When `annotations` is provided, all of
/// them are replaced with one chunk per (non-empty) string.
#[derive(Default, Clone, Debug, PartialEq, Eq)]
pub struct AiffTextChunks {
	/// The name of the piece (`NAME`)
	pub name: Option<String>,
	/// The author of the piece (`AUTH`)
	pub author: Option<String>,
	/// A copyright notice (`(c) `)
	pub copyright: Option<String>,
	/// Basic comments (`ANNO`)
	pub annotations: Option<Vec<String>>,
	/// The content of the `ID3 ` chunk, an already encoded ID3v2 tag
	pub id3v2: Option<Vec<u8>>,
}

/// Rewrites the text and ID3v2 chunks of an AIFF/AIFC file
///
/// Missing text chunks are inserted after the `COMM` chunk, a missing `ID3 ` chunk is appended
/// to the end of the `FORM` chunk.
#[derive(Default, Debug, Clone)]
pub struct AiffAdapter {
	// Every ANNO zone shares a name, the first one holds all of the annotations
	first_annotation: Option<u64>,
	id3_fourcc: Option<[u8; 4]>,
	tail: UnpaddedTail,
}

impl AiffAdapter {
	/// Create a new `AiffAdapter`
	pub fn new() -> Self {
		Self::default()
	}
}

pub(super) fn verify_aiff<R>(data: &mut R) -> Result<u32>
where
	R: Read,
{
	let mut id = [0; 12];
	data.read_exact(&mut id)?;

	if &id[..4] != b"FORM" {
		decode_err!(@BAIL Aiff, "File does not contain a \"FORM\" chunk");
	}

	if !matches!(&id[8..], b"AIFF" | b"AIFC") {
		decode_err!(@BAIL Aiff, "Found FORM file, format is not AIFF or AIFC");
	}

	Ok(BigEndian::read_u32(&id[4..8]))
}

#[derive(Default)]
struct FoundChunks {
	comm_end: Option<u64>,
	id3v2: Option<(u64, u64)>,
	name: Option<(u64, u64)>,
	author: Option<(u64, u64)>,
	copyright: Option<(u64, u64)>,
	annotations: Vec<(u64, u64)>,
}

impl FormatAdapter for AiffAdapter {
	type Update = AiffTextChunks;

	const FILE_TYPE: FileType = FileType::Aiff;

	fn prepare<F>(&mut self, session: &mut Session<'_, F>, parse_options: ParseOptions) -> Result<()>
	where
		F: FileLike,
		TagPatchError: From<<F as Truncate>::Error>,
		TagPatchError: From<<F as Length>::Error>,
	{
		let file_len = session.file_len()?;
		let parse_mode = parse_options.parsing_mode;

		let (stream_end, mut found) = {
			let mut reader = session.reader();
			reader.rewind()?;

			let form_size = verify_aiff(&mut reader)?;

			let mut stream_end = 8 + u64::from(form_size);
			if stream_end > file_len {
				parse_mode_choice!(
					parse_mode,
					STRICT: err!(SizeMismatch),
					DEFAULT: {
						log::warn!("FORM size exceeds the file length, assuming the stream ends at EOF");
						stream_end = file_len;
					}
				);
			}

			let mut chunks = Chunks::<BigEndian>::new(stream_end.saturating_sub(12), parse_mode);
			let mut found = FoundChunks::default();

			while chunks.next(&mut reader)? {
				let range = (chunks.offset, chunks.total_size());

				match &chunks.fourcc {
					b"COMM" if found.comm_end.is_none() => {
						found.comm_end = Some(chunks.offset + chunks.total_size());
					},
					b"ID3 " | b"id3 " if found.id3v2.is_none() => {
						self.id3_fourcc = Some(chunks.fourcc);
						found.id3v2 = Some(range);
					},
					b"NAME" if found.name.is_none() => found.name = Some(range),
					b"AUTH" if found.author.is_none() => found.author = Some(range),
					b"(c) " if found.copyright.is_none() => found.copyright = Some(range),
					b"ANNO" => found.annotations.push(range),
					_ => {},
				}

				chunks.skip(&mut reader)?;
			}

			(stream_end, found)
		};

		let text_insertion_point = match found.comm_end {
			Some(comm_end) => comm_end,
			None => {
				parse_mode_choice!(
					parse_mode,
					STRICT: decode_err!(@BAIL Aiff, "File does not contain a \"COMM\" chunk"),
					DEFAULT: {
						log::warn!("No COMM chunk found, text chunks will be appended");
						stream_end
					}
				)
			},
		};

		self.tail = UnpaddedTail::new(stream_end);
		for (name, range) in [
			(NAME_ZONE, found.name),
			(AUTH_ZONE, found.author),
			(COPYRIGHT_ZONE, found.copyright),
		] {
			let (offset, size) = range.unwrap_or((text_insertion_point, 0));
			self.tail.push(name, offset, size);
			session.add_zone(name, offset, size, Vec::new(), ZoneFlag::None);
		}

		if found.annotations.is_empty() {
			found.annotations.push((text_insertion_point, 0));
		}

		self.first_annotation = found.annotations.first().map(|(offset, _)| *offset);
		for (offset, size) in found.annotations {
			self.tail.push(ANNO_ZONE, offset, size);
			session.add_zone(ANNO_ZONE, offset, size, Vec::new(), ZoneFlag::None);
		}

		let (offset, size) = found.id3v2.unwrap_or((stream_end, 0));
		self.tail.push(ID3_ZONE, offset, size);
		session.add_zone(ID3_ZONE, offset, size, Vec::new(), ZoneFlag::None);

		session.add_size_ref(4, FieldWidth::U32, Endianness::Big, [
			ID3_ZONE,
			NAME_ZONE,
			AUTH_ZONE,
			COPYRIGHT_ZONE,
			ANNO_ZONE,
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
		let content = self.chunks_for(zone, update)?;

		let written = |value: Option<&String>| value.is_some_and(|value| !value.is_empty());
		self.tail.pad(zone, original, content, |name| match name {
			NAME_ZONE => written(update.name.as_ref()),
			AUTH_ZONE => written(update.author.as_ref()),
			COPYRIGHT_ZONE => written(update.copyright.as_ref()),
			ANNO_ZONE => update
				.annotations
				.as_ref()
				.is_some_and(|annotations| annotations.iter().any(|a| !a.is_empty())),
			ID3_ZONE => update.id3v2.as_ref().is_some_and(|tag| !tag.is_empty()),
			_ => false,
		})
	}
}

impl AiffAdapter {
	fn chunks_for(&self, zone: &Zone, update: &AiffTextChunks) -> Result<Option<Vec<u8>>> {
		let text = |fourcc: [u8; 4], value: Option<&str>| {
			value.map(|value| text_chunk(fourcc, value)).transpose()
		};

		match zone.name() {
			NAME_ZONE => text(*b"NAME", update.name.as_deref()),
			AUTH_ZONE => text(*b"AUTH", update.author.as_deref()),
			COPYRIGHT_ZONE => text(*b"(c) ", update.copyright.as_deref()),
			ANNO_ZONE => {
				let Some(annotations) = &update.annotations else {
					return Ok(None);
				};

				if Some(zone.offset()) != self.first_annotation {
					return Ok(Some(Vec::new()));
				}

				let mut content = Vec::new();
				for annotation in annotations {
					content.extend(text_chunk(*b"ANNO", annotation)?);
				}

				log::debug!(
					"Created AIFF annotations, size: {} bytes",
					content.len()
				);
				Ok(Some(content))
			},
			ID3_ZONE => {
				let Some(tag) = &update.id3v2 else {
					return Ok(None);
				};

				if tag.is_empty() {
					return Ok(Some(Vec::new()));
				}

				let fourcc = self.id3_fourcc.unwrap_or(*b"ID3 ");
				create_chunk::<BigEndian>(fourcc, tag).map(Some)
			},
			_ => Ok(None),
		}
	}
}

// AIFF only needs a terminator if the string is on an odd boundary,
// unlike RIFF, which makes use of both C-strings and even boundaries
fn text_chunk(fourcc: [u8; 4], value: &str) -> Result<Vec<u8>> {
	if value.is_empty() {
		return Ok(Vec::new());
	}

	create_chunk::<BigEndian>(fourcc, value.as_bytes())
}
