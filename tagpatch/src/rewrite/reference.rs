use super::zone::Zone;
use crate::error::Result;
use crate::macros::structural_err;

use std::io::{Read, Write};

use byteorder::{BigEndian, LittleEndian, ReadBytesExt, WriteBytesExt};

/// The byte width of a dependent field
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum FieldWidth {
	U16,
	U24,
	U32,
	U64,
}

impl FieldWidth {
	/// The number of bytes the field occupies
	pub fn bytes(self) -> u8 {
		match self {
			FieldWidth::U16 => 2,
			FieldWidth::U24 => 3,
			FieldWidth::U32 => 4,
			FieldWidth::U64 => 8,
		}
	}

	/// The largest value the field can hold
	pub fn max(self) -> u64 {
		match self {
			FieldWidth::U16 => u64::from(u16::MAX),
			FieldWidth::U24 => 0x00FF_FFFF,
			FieldWidth::U32 => u64::from(u32::MAX),
			FieldWidth::U64 => u64::MAX,
		}
	}
}

/// The byte order of a dependent field
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum Endianness {
	Little,
	Big,
}

/// What an [`ReferenceKind::Index`] value is measured from
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum IndexBase {
	/// The start of the file
	Absolute,
	/// A position in the original file, which is itself subject to shifting
	Relative(u64),
}

/// How a dependent field relates to its target zones
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ReferenceKind {
	/// A container size, absorbs the byte delta of every target zone
	Size,
	/// An item count, absorbs the creation and removal of target zones
	Counter,
	/// An offset pointing into (or at) the first target zone
	Index {
		/// What the offset is measured from
		base: IndexBase,
		/// The value the format uses to mark the target as missing, if any
		absent: Option<u64>,
	},
}

/// A fixed-width field, outside of any zone, whose value depends on one or more zones
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DependentReference {
	pub(crate) kind: ReferenceKind,
	pub(crate) position: u64,
	pub(crate) width: FieldWidth,
	pub(crate) endianness: Endianness,
	pub(crate) targets: Vec<String>,
}

impl DependentReference {
	/// Create a new `DependentReference`
	///
	/// # Examples
	///
	/// ```rust
	/// use tagpatch::rewrite::{DependentReference, Endianness, FieldWidth, ReferenceKind};
	///
	/// // The RIFF size of a WAV file, covering its INFO list
	/// let riff_size = DependentReference::new(
	/// 	ReferenceKind::Size,
	/// 	4,
	/// 	FieldWidth::U32,
	/// 	Endianness::Little,
	/// 	["LIST"],
	/// );
	/// ```
	pub fn new<I, S>(
		kind: ReferenceKind,
		position: u64,
		width: FieldWidth,
		endianness: Endianness,
		targets: I,
	) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self {
			kind,
			position,
			width,
			endianness,
			targets: targets.into_iter().map(Into::into).collect(),
		}
	}

	/// The kind of reference
	pub fn kind(&self) -> ReferenceKind {
		self.kind
	}

	/// Position of the field in the original file
	pub fn position(&self) -> u64 {
		self.position
	}

	/// The width of the field
	pub fn width(&self) -> FieldWidth {
		self.width
	}

	/// The byte order of the field
	pub fn endianness(&self) -> Endianness {
		self.endianness
	}

	/// The names of the zones the field depends on
	pub fn targets(&self) -> &[String] {
		&self.targets
	}

	/// The offset immediately after the field in the original file
	pub fn end(&self) -> u64 {
		self.position + u64::from(self.width.bytes())
	}

	pub(crate) fn targets_zone(&self, zone: &Zone) -> bool {
		self.targets.iter().any(|target| *target == zone.name)
	}

	pub(crate) fn read_value<R>(&self, reader: &mut R) -> Result<u64>
	where
		R: Read,
	{
		let width = usize::from(self.width.bytes());
		let value = match self.endianness {
			Endianness::Little => reader.read_uint::<LittleEndian>(width)?,
			Endianness::Big => reader.read_uint::<BigEndian>(width)?,
		};

		Ok(value)
	}

	pub(crate) fn write_value<W>(&self, writer: &mut W, value: u64) -> Result<()>
	where
		W: Write,
	{
		let width = usize::from(self.width.bytes());
		match self.endianness {
			Endianness::Little => writer.write_uint::<LittleEndian>(value, width)?,
			Endianness::Big => writer.write_uint::<BigEndian>(value, width)?,
		}

		Ok(())
	}
}

/// The set of dependent references registered for a single rewrite session
#[derive(Clone, Debug, Default)]
pub struct ReferenceSet {
	references: Vec<DependentReference>,
}

impl ReferenceSet {
	/// Create an empty `ReferenceSet`
	pub fn new() -> Self {
		Self::default()
	}

	/// Register a reference
	pub fn push(&mut self, reference: DependentReference) {
		log::trace!(
			"Registering {:?} reference at {} (targets: {:?})",
			reference.kind,
			reference.position,
			reference.targets
		);
		self.references.push(reference);
	}

	/// The number of registered references
	pub fn len(&self) -> usize {
		self.references.len()
	}

	/// Whether no references have been registered
	pub fn is_empty(&self) -> bool {
		self.references.is_empty()
	}

	/// Iterate the references in registration order
	pub fn iter(&self) -> impl Iterator<Item = &DependentReference> {
		self.references.iter()
	}

	/// Sorts the references by position, and verifies them against the (ordered) zones
	///
	/// # Errors
	///
	/// * A field extends past the end of the file
	/// * A field overlaps a non-empty zone, or another field
	/// * A target names no registered zone
	pub(crate) fn into_ordered(
		mut self,
		zones: &[Zone],
		file_len: u64,
	) -> Result<Vec<DependentReference>> {
		self.references.sort_by_key(|reference| reference.position);

		let mut previous_end = 0;
		for reference in &self.references {
			if reference.end() > file_len {
				structural_err!(
					"Reference extends past the end of the file",
					reference.position
				);
			}

			if reference.position < previous_end {
				structural_err!("References overlap", reference.position);
			}
			previous_end = reference.end();

			let overlaps_zone = zones.iter().any(|zone| {
				zone.size > 0 && zone.offset < reference.end() && reference.position < zone.end()
			});
			if overlaps_zone {
				structural_err!("Reference overlaps a zone", reference.position);
			}

			if reference.targets.is_empty() {
				structural_err!("Reference has no target zones", reference.position);
			}

			for target in &reference.targets {
				if !zones.iter().any(|zone| zone.name == *target) {
					log::error!("Reference target `{target}` was never registered");
					structural_err!("Reference targets an unknown zone", reference.position);
				}
			}
		}

		Ok(self.references)
	}
}
