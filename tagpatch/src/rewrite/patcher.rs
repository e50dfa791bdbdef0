use super::generator::ZoneGenerators;
use super::zone::Zone;
use crate::error::{Result, TagPatchError};
use crate::macros::try_vec;
use crate::util::alloc::declared_size;
use crate::util::io::{FileLike, Length, Truncate, shift_tail};

use std::io::{Read, Seek, SeekFrom};

/// A zone paired with the content that will replace it
pub(crate) struct ZonePatch {
	pub(crate) zone: Zone,
	/// `None` if the zone is left untouched
	pub(crate) content: Option<Vec<u8>>,
}

impl ZonePatch {
	pub(crate) fn new_size(&self) -> u64 {
		match &self.content {
			Some(content) => content.len() as u64,
			None => self.zone.size,
		}
	}

	pub(crate) fn delta(&self) -> i64 {
		self.new_size() as i64 - self.zone.size as i64
	}
}

/// The outcome of patching a single zone
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ZoneDelta {
	pub(crate) name: String,
	pub(crate) original_offset: u64,
	pub(crate) new_offset: u64,
	pub(crate) original_size: u64,
	pub(crate) new_size: u64,
}

impl ZoneDelta {
	/// The zone's name
	pub fn name(&self) -> &str {
		&self.name
	}

	/// Offset of the zone in the original file
	pub fn original_offset(&self) -> u64 {
		self.original_offset
	}

	/// Offset of the zone in the patched file
	pub fn new_offset(&self) -> u64 {
		self.new_offset
	}

	/// Size of the zone in the original file
	pub fn original_size(&self) -> u64 {
		self.original_size
	}

	/// Size of the zone in the patched file
	pub fn new_size(&self) -> u64 {
		self.new_size
	}

	/// The change in size
	pub fn delta(&self) -> i64 {
		self.new_size as i64 - self.original_size as i64
	}
}

/// Runs every generator against the zones' original bytes
///
/// Nothing is written here, so every generator observes the file exactly as it was when
/// the session began, regardless of which zones precede it.
pub(crate) fn generate<R>(
	reader: &mut R,
	zones: Vec<Zone>,
	generators: &mut ZoneGenerators<'_>,
) -> Result<Vec<ZonePatch>>
where
	R: Read + Seek,
{
	let mut patches = Vec::with_capacity(zones.len());
	for zone in zones {
		if !generators.handles(&zone) {
			patches.push(ZonePatch {
				zone,
				content: None,
			});
			continue;
		}

		let mut original = try_vec![0; declared_size(zone.size)?];
		reader.seek(SeekFrom::Start(zone.offset))?;
		reader.read_exact(&mut original)?;

		let mut content = generators.generate(&zone, &original)?;
		if let Some(content) = &mut content {
			// A zone can never shrink below its core signature
			if content.is_empty() && !zone.core_signature.is_empty() {
				log::debug!("Zone `{}` emptied, keeping its core signature", zone.name);
				content.extend_from_slice(&zone.core_signature);
			}
		}

		patches.push(ZonePatch { zone, content });
	}

	Ok(patches)
}

/// Applies every patch in offset order, one shift per zone
pub(crate) fn patch<F>(file: &mut F, patches: &[ZonePatch]) -> Result<Vec<ZoneDelta>>
where
	F: FileLike,
	TagPatchError: From<<F as Truncate>::Error>,
	TagPatchError: From<<F as Length>::Error>,
{
	let mut deltas = Vec::with_capacity(patches.len());

	let mut cumulative_delta = 0i64;
	for patch in patches {
		let zone = &patch.zone;
		let Some(effective_offset) = zone.offset.checked_add_signed(cumulative_delta) else {
			return Err(std::io::Error::from(std::io::ErrorKind::InvalidInput).into());
		};

		let delta = patch.delta();
		if let Some(content) = &patch.content {
			log::trace!(
				"Patching zone `{}` at {} (original offset: {}, delta: {})",
				zone.name,
				effective_offset,
				zone.offset,
				delta
			);

			shift_tail(file, effective_offset + zone.size, delta)?;

			file.seek(SeekFrom::Start(effective_offset))?;
			file.write_all(content)?;
		}

		deltas.push(ZoneDelta {
			name: zone.name.clone(),
			original_offset: zone.offset,
			new_offset: effective_offset,
			original_size: zone.size,
			new_size: patch.new_size(),
		});

		cumulative_delta += delta;
	}

	Ok(deltas)
}
