use super::HEADER_OBJECT_GUID;
use super::description::{ContentDescription, ExtendedContentDescription};
use super::object::{
	CONTENT_DESCRIPTION_GUID, EXTENDED_CONTENT_DESCRIPTION_GUID, FILE_PROPERTIES_GUID,
	FILE_SIZE_OFFSET, HEADER_OBJECT_SIZE, OBJECT_COUNT_OFFSET, OBJECT_HEADER_SIZE, ObjectHeader,
};
use crate::config::{ParseOptions, WriteOptions};
use crate::error::{Result, TagPatchError};
use crate::file::FileType;
use crate::macros::{decode_err, err, parse_mode_choice};
use crate::rewrite::{Endianness, FieldWidth, FormatAdapter, Session, Zone, ZoneFlag};
use crate::util::io::{FileLike, Length, Truncate};

use std::io::{Seek, SeekFrom};

use byteorder::{LittleEndian, ReadBytesExt};

const CONTENT_DESCRIPTION_ZONE: &str = "ContentDescription";
const EXTENDED_CONTENT_DESCRIPTION_ZONE: &str = "ExtendedContentDescription";

/// New description objects for an ASF file
///
/// `None` keeps the existing object (or its absence).
#[derive(Default, Clone, Debug, PartialEq, Eq)]
pub struct AsfUpdate {
	/// The Content Description Object
	pub content_description: Option<ContentDescription>,
	/// The Extended Content Description Object
	pub extended_content_description: Option<ExtendedContentDescription>,
}

/// Rewrites the description objects in the header of an ASF file
///
/// Missing objects are appended to the end of the Header Object. The header's size and
/// object count are updated, as is the file size in the File Properties Object.
#[derive(Default, Debug, Clone, Copy)]
pub struct AsfAdapter;

impl AsfAdapter {
	/// Create a new `AsfAdapter`
	pub fn new() -> Self {
		Self
	}
}

#[derive(Default)]
struct FoundObjects {
	content_description: Option<(u64, u64)>,
	extended_content_description: Option<(u64, u64)>,
	file_properties: Option<u64>,
}

impl FormatAdapter for AsfAdapter {
	type Update = AsfUpdate;

	const FILE_TYPE: FileType = FileType::Asf;

	fn prepare<F>(&mut self, session: &mut Session<'_, F>, parse_options: ParseOptions) -> Result<()>
	where
		F: FileLike,
		TagPatchError: From<<F as Truncate>::Error>,
		TagPatchError: From<<F as Length>::Error>,
	{
		let file_len = session.file_len()?;
		let parse_mode = parse_options.parsing_mode;

		let (header_end, found) = {
			let mut reader = session.reader();
			reader.rewind()?;

			let header = ObjectHeader::read(&mut reader)?;
			if header.guid != HEADER_OBJECT_GUID {
				err!(UnknownFormat);
			}

			let object_count = reader.read_u32::<LittleEndian>()?;

			let mut header_end = header.size;
			if header_end > file_len {
				parse_mode_choice!(
					parse_mode,
					STRICT: decode_err!(@BAIL Asf, "Header Object extends past the end of the file"),
					DEFAULT: {
						log::warn!("Header Object extends past the end of the file");
						header_end = file_len;
					}
				);
			}

			let mut found = FoundObjects::default();
			let mut objects_read = 0;

			let mut pos = HEADER_OBJECT_SIZE;
			while pos + OBJECT_HEADER_SIZE <= header_end {
				reader.seek(SeekFrom::Start(pos))?;
				let object = ObjectHeader::read(&mut reader)?;

				let object_end = pos.checked_add(object.size);
				if object_end.is_none_or(|end| end > header_end) {
					parse_mode_choice!(
						parse_mode,
						STRICT: decode_err!(@BAIL Asf, "Object extends past the end of the Header Object"),
						DEFAULT: {
							log::warn!("Object extends past the end of the Header Object, stopping");
							break;
						}
					);
				}

				let range = Some((pos, object.size));
				match object.guid {
					CONTENT_DESCRIPTION_GUID if found.content_description.is_none() => {
						found.content_description = range;
					},
					EXTENDED_CONTENT_DESCRIPTION_GUID
						if found.extended_content_description.is_none() =>
					{
						found.extended_content_description = range;
					},
					FILE_PROPERTIES_GUID if found.file_properties.is_none() => {
						found.file_properties = Some(pos);
					},
					_ => {},
				}

				objects_read += 1;
				pos += object.size;
			}

			if objects_read != object_count {
				log::warn!(
					"Header Object claims {object_count} objects, found {objects_read}"
				);
			}

			(header_end, found)
		};

		for (name, range) in [
			(CONTENT_DESCRIPTION_ZONE, found.content_description),
			(
				EXTENDED_CONTENT_DESCRIPTION_ZONE,
				found.extended_content_description,
			),
		] {
			let (offset, size) = range.unwrap_or((header_end, 0));
			session.add_zone(name, offset, size, Vec::new(), ZoneFlag::None);
		}

		let targets = [CONTENT_DESCRIPTION_ZONE, EXTENDED_CONTENT_DESCRIPTION_ZONE];

		session
			.add_size_ref(16, FieldWidth::U64, Endianness::Little, targets)
			.add_counter_ref(
				OBJECT_COUNT_OFFSET,
				FieldWidth::U32,
				Endianness::Little,
				targets,
			);

		match found.file_properties {
			Some(file_properties) => {
				session.add_size_ref(
					file_properties + FILE_SIZE_OFFSET,
					FieldWidth::U64,
					Endianness::Little,
					targets,
				);
			},
			None => log::warn!("No File Properties Object found, not updating the file size"),
		}

		Ok(())
	}

	fn generate(
		&self,
		zone: &Zone,
		_original: &[u8],
		update: &Self::Update,
		_write_options: WriteOptions,
	) -> Result<Option<Vec<u8>>> {
		match zone.name() {
			CONTENT_DESCRIPTION_ZONE => update
				.content_description
				.as_ref()
				.map(ContentDescription::to_object)
				.transpose(),
			EXTENDED_CONTENT_DESCRIPTION_ZONE => update
				.extended_content_description
				.as_ref()
				.map(ExtendedContentDescription::to_object)
				.transpose(),
			_ => Ok(None),
		}
	}
}
