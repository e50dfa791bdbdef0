use super::atom_info::{AtomInfo, create_atom, create_meta, read_children};
use crate::config::{ParseOptions, ParsingMode, WriteOptions};
use crate::error::{Result, TagPatchError};
use crate::file::FileType;
use crate::macros::{decode_err, encode_err, err};
use crate::rewrite::{Endianness, FieldWidth, FormatAdapter, IndexBase, Session, Zone, ZoneFlag};
use crate::util::alloc::VecFallibleCapacity;
use crate::util::io::{FileLike, Length, Truncate};

use std::io::{Read, Seek, SeekFrom};

use byteorder::{BigEndian, ReadBytesExt};

const ILST_ZONE: &str = "ilst";

/// A new `ilst` atom for an MP4 file
#[derive(Default, Clone, Debug, PartialEq, Eq)]
pub struct Mp4Update {
	/// The content of the `ilst` atom, the already encoded item atoms
	///
	/// `None` keeps the existing atom, an empty list removes it.
	pub ilst: Option<Vec<u8>>,
}

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
enum MissingParents {
	#[default]
	None,
	Meta,
	UdtaAndMeta,
}

/// Rewrites the `moov.udta.meta.ilst` atom of an MP4 file
///
/// Missing parent atoms are created along with the `ilst`. The sizes of `moov`, `udta` and
/// `meta` are updated, as is every chunk offset that points into an `mdat` atom following the
/// `ilst`. The media data itself is never read.
#[derive(Default, Debug, Clone)]
pub struct Mp4Adapter {
	missing_parents: MissingParents,
	mdat_zones: Vec<String>,
}

impl Mp4Adapter {
	/// Create a new `Mp4Adapter`
	pub fn new() -> Self {
		Self::default()
	}
}

/// A single `stco`/`co64` entry
struct ChunkOffset {
	position: u64,
	width: FieldWidth,
	value: u64,
}

struct Layout {
	moov: AtomInfo,
	udta: Option<AtomInfo>,
	meta: Option<AtomInfo>,
	ilst: Option<AtomInfo>,
	mdats: Vec<AtomInfo>,
	chunk_offsets: Vec<ChunkOffset>,
}

fn read_layout<R>(data: &mut R, file_len: u64, parse_mode: ParsingMode) -> Result<Layout>
where
	R: Read + Seek,
{
	let mut moov = None;
	let mut mdats = Vec::new();

	let mut pos = 0;
	while pos < file_len {
		data.seek(SeekFrom::Start(pos))?;
		let Some(atom) = AtomInfo::read(data, file_len, parse_mode)? else {
			break;
		};

		if pos == 0 && atom.fourcc != *b"ftyp" {
			err!(UnknownFormat);
		}

		match &atom.fourcc {
			b"moov" if moov.is_none() => moov = Some(atom),
			b"mdat" => mdats.push(atom),
			_ => {},
		}

		pos = atom.end();
	}

	let Some(moov) = moov else {
		return Err(encode_err!(Mp4, "Could not find \"moov\" atom in target file"));
	};

	log::trace!(
		"Found `moov` atom, offset: {}, size: {}",
		moov.start,
		moov.len
	);

	let mut udta = None;
	let mut chunk_offsets = Vec::new();
	for child in read_children(data, &moov, 0, parse_mode)? {
		match &child.fourcc {
			b"udta" if udta.is_none() => udta = Some(child),
			b"trak" => read_chunk_offsets(data, &child, parse_mode, &mut chunk_offsets)?,
			_ => {},
		}
	}

	let meta = match &udta {
		Some(udta) => read_children(data, udta, 0, parse_mode)?
			.into_iter()
			.find(|atom| atom.fourcc == *b"meta"),
		None => None,
	};

	let ilst = match &meta {
		// `meta` is a full atom
		Some(meta) => read_children(data, meta, 4, parse_mode)?
			.into_iter()
			.find(|atom| atom.fourcc == *b"ilst"),
		None => None,
	};

	Ok(Layout {
		moov,
		udta,
		meta,
		ilst,
		mdats,
		chunk_offsets,
	})
}

fn read_chunk_offsets<R>(
	data: &mut R,
	parent: &AtomInfo,
	parse_mode: ParsingMode,
	offsets: &mut Vec<ChunkOffset>,
) -> Result<()>
where
	R: Read + Seek,
{
	for child in read_children(data, parent, 0, parse_mode)? {
		let width = match &child.fourcc {
			b"mdia" | b"minf" | b"stbl" => {
				read_chunk_offsets(data, &child, parse_mode, offsets)?;
				continue;
			},
			b"stco" => FieldWidth::U32,
			b"co64" => FieldWidth::U64,
			_ => continue,
		};

		log::trace!("Found `{}` atom", String::from_utf8_lossy(&child.fourcc));

		// Skip version (1) + flags (3)
		data.seek(SeekFrom::Start(child.content_start() + 4))?;
		let count = data.read_u32::<BigEndian>()?;

		let entries_start = child.content_start() + 8;
		let entries_len = u64::from(count) * u64::from(width.bytes());
		if entries_start + entries_len > child.end() {
			decode_err!(@BAIL Mp4, "Chunk offset table is larger than its atom");
		}

		offsets.try_reserve(count as usize)?;
		for index in 0..u64::from(count) {
			let value = match width {
				FieldWidth::U64 => data.read_u64::<BigEndian>()?,
				_ => u64::from(data.read_u32::<BigEndian>()?),
			};

			offsets.push(ChunkOffset {
				position: entries_start + index * u64::from(width.bytes()),
				width,
				value,
			});
		}
	}

	Ok(())
}

impl FormatAdapter for Mp4Adapter {
	type Update = Mp4Update;

	const FILE_TYPE: FileType = FileType::Mp4;

	fn prepare<F>(&mut self, session: &mut Session<'_, F>, parse_options: ParseOptions) -> Result<()>
	where
		F: FileLike,
		TagPatchError: From<<F as Truncate>::Error>,
		TagPatchError: From<<F as Length>::Error>,
	{
		let file_len = session.file_len()?;

		let layout = {
			let mut reader = session.reader();
			reader.rewind()?;
			read_layout(&mut reader, file_len, parse_options.parsing_mode)?
		};

		let mut mdat_zones = Vec::try_with_capacity_stable(layout.mdats.len())?;
		for (index, mdat) in layout.mdats.iter().enumerate() {
			let name = format!("mdat#{index}");
			session.add_zone(name.clone(), mdat.start, mdat.len, Vec::new(), ZoneFlag::None);
			mdat_zones.push(name);
		}

		let (ilst_offset, ilst_size, missing_parents) = match (&layout.ilst, &layout.meta, &layout.udta) {
			(Some(ilst), ..) => (ilst.start, ilst.len, MissingParents::None),
			(None, Some(meta), _) => (meta.end(), 0, MissingParents::None),
			(None, None, Some(udta)) => (udta.end(), 0, MissingParents::Meta),
			(None, None, None) => (layout.moov.end(), 0, MissingParents::UdtaAndMeta),
		};

		log::debug!("`ilst` zone at {ilst_offset}, size: {ilst_size}, missing parents: {missing_parents:?}");
		session.add_zone(ILST_ZONE, ilst_offset, ilst_size, Vec::new(), ZoneFlag::None);

		for atom in [Some(&layout.moov), layout.udta.as_ref(), layout.meta.as_ref()]
			.into_iter()
			.flatten()
		{
			match atom.size_field() {
				Some((position, width)) => {
					session.add_size_ref(position, width, Endianness::Big, [ILST_ZONE]);
				},
				None => log::warn!(
					"`{}` atom runs to the end of the file, not updating its size",
					String::from_utf8_lossy(&atom.fourcc)
				),
			}
		}

		for offset in layout.chunk_offsets {
			let Some(index) = layout
				.mdats
				.iter()
				.position(|mdat| (mdat.content_start()..mdat.end()).contains(&offset.value))
			else {
				log::warn!(
					"Chunk offset {} at {} does not point into an `mdat` atom, leaving it",
					offset.value,
					offset.position
				);
				continue;
			};

			session.add_index_ref(
				offset.position,
				offset.width,
				Endianness::Big,
				IndexBase::Absolute,
				None,
				mdat_zones[index].clone(),
			);
		}

		self.missing_parents = missing_parents;
		self.mdat_zones = mdat_zones;
		Ok(())
	}

	fn generate(
		&self,
		zone: &Zone,
		_original: &[u8],
		update: &Self::Update,
		_write_options: WriteOptions,
	) -> Result<Option<Vec<u8>>> {
		if zone.name() != ILST_ZONE {
			return Ok(None);
		}

		let Some(items) = &update.ilst else {
			return Ok(None);
		};

		if items.is_empty() {
			log::debug!("Removing `ilst` atom");
			return Ok(Some(Vec::new()));
		}

		let ilst = create_atom(*b"ilst", items)?;
		let atom = match self.missing_parents {
			MissingParents::None => ilst,
			MissingParents::Meta => create_meta(&ilst)?,
			MissingParents::UdtaAndMeta => create_atom(*b"udta", &create_meta(&ilst)?)?,
		};

		Ok(Some(atom))
	}

	fn kept_zones(&self) -> &[String] {
		&self.mdat_zones
	}
}
