use crate::error::Result;
use crate::macros::structural_err;

/// Format specific metadata carried with a [`Zone`]
///
/// The engine never interprets this, it is only handed back to the zone's generator.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[non_exhaustive]
pub enum ZoneFlag {
	/// No extra information
	#[default]
	None,
	/// The zone ends with the final physical page of its logical stream (Ogg)
	LastPhysicalPage,
	/// The zone holds the metadata block carrying the "last block" bit (FLAC)
	LastMetadataBlock,
	/// The zone is the first picture block, and is responsible for writing all pictures (FLAC)
	FirstPicture,
}

/// A named byte range in the original file holding one logical unit of rewritable data
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Zone {
	pub(crate) name: String,
	pub(crate) offset: u64,
	pub(crate) size: u64,
	pub(crate) core_signature: Vec<u8>,
	pub(crate) flag: ZoneFlag,
}

impl Zone {
	/// Create a new `Zone`
	///
	/// A `size` of 0 creates a placeholder for content that does not exist yet.
	///
	/// # Examples
	///
	/// ```rust
	/// use tagpatch::rewrite::{Zone, ZoneFlag};
	///
	/// let bext = Zone::new("bext", 36, 610, Vec::new(), ZoneFlag::None);
	/// assert_eq!(bext.end(), 646);
	/// ```
	pub fn new(
		name: impl Into<String>,
		offset: u64,
		size: u64,
		core_signature: Vec<u8>,
		flag: ZoneFlag,
	) -> Self {
		Self {
			name: name.into(),
			offset,
			size,
			core_signature,
			flag,
		}
	}

	/// The zone's logical name
	pub fn name(&self) -> &str {
		&self.name
	}

	/// Offset of the zone in the original file
	pub fn offset(&self) -> u64 {
		self.offset
	}

	/// Size of the zone in the original file
	pub fn size(&self) -> u64 {
		self.size
	}

	/// The offset immediately after the zone in the original file
	pub fn end(&self) -> u64 {
		self.offset + self.size
	}

	/// The bytes this zone will always retain, even when emptied
	pub fn core_signature(&self) -> &[u8] {
		&self.core_signature
	}

	/// The flag provided by the format adapter
	pub fn flag(&self) -> ZoneFlag {
		self.flag
	}

	/// Whether the zone does not exist in the original file
	pub fn is_placeholder(&self) -> bool {
		self.size == 0
	}
}

/// An ordered collection of zones for a single rewrite session
///
/// Zones may be registered in any order, they are sorted by offset when the registry is
/// validated. Placeholders sharing an offset keep their registration order.
#[derive(Clone, Debug, Default)]
pub struct ZoneRegistry {
	zones: Vec<Zone>,
}

impl ZoneRegistry {
	/// Create an empty `ZoneRegistry`
	pub fn new() -> Self {
		Self::default()
	}

	/// Register a zone
	pub fn push(&mut self, zone: Zone) {
		log::trace!(
			"Registering zone `{}` (offset: {}, size: {})",
			zone.name,
			zone.offset,
			zone.size
		);
		self.zones.push(zone);
	}

	/// The number of registered zones
	pub fn len(&self) -> usize {
		self.zones.len()
	}

	/// Whether no zones have been registered
	pub fn is_empty(&self) -> bool {
		self.zones.is_empty()
	}

	/// Whether any zone named `name` is registered
	pub fn contains(&self, name: &str) -> bool {
		self.zones.iter().any(|zone| zone.name == name)
	}

	/// Iterate the zones in registration order
	pub fn iter(&self) -> impl Iterator<Item = &Zone> {
		self.zones.iter()
	}

	/// Sorts the zones by offset, and verifies they describe a valid layout of a `file_len` byte file
	///
	/// # Errors
	///
	/// * A zone extends past the end of the file
	/// * Two zones overlap
	pub(crate) fn into_ordered(mut self, file_len: u64) -> Result<Vec<Zone>> {
		// Stable, so equal keys keep their registration order
		self.zones.sort_by_key(|zone| (zone.offset, zone.size));

		let mut previous_end = 0;
		for zone in &self.zones {
			let Some(end) = zone.offset.checked_add(zone.size) else {
				structural_err!("Zone size overflows", zone.offset);
			};

			if end > file_len {
				structural_err!("Zone extends past the end of the file", zone.offset);
			}

			if zone.offset < previous_end {
				structural_err!("Zones overlap", zone.offset);
			}

			previous_end = end;
		}

		Ok(self.zones)
	}
}
