use super::generator::ZoneGenerators;
use super::patcher::{self, ZoneDelta, ZonePatch};
use super::reference::{
	DependentReference, Endianness, FieldWidth, IndexBase, ReferenceKind, ReferenceSet,
};
use super::resolver::{self, ResolvedReference};
use super::zone::{Zone, ZoneFlag, ZoneRegistry};
use crate::config::{CommitStrategy, WriteOptions};
use crate::error::{Result, TagPatchError};
use crate::macros::{err, try_vec};
use crate::util::alloc::{VecFallibleCapacity, declared_size};
use crate::util::io::{FileLike, Length, Truncate};

use std::fs::File;
use std::io::{Cursor, Read, Seek, SeekFrom};
use std::path::Path;

/// Begin a rewrite session on `file`
///
/// The file is not read or modified until zones are registered and the session is committed.
///
/// # Examples
///
/// ```rust
/// use std::io::Cursor;
/// use tagpatch::config::WriteOptions;
/// use tagpatch::rewrite::{Endianness, FieldWidth, ZoneFlag, ZoneGenerators, begin_rewrite};
///
/// # fn main() -> tagpatch::error::Result<()> {
/// // A 4 byte big endian size, followed by a 4 byte payload
/// let mut file = Cursor::new(b"\0\0\0\x04AAAA".to_vec());
///
/// let mut session = begin_rewrite(&mut file);
/// session
/// 	.add_zone("payload", 4, 4, Vec::new(), ZoneFlag::None)
/// 	.add_size_ref(0, FieldWidth::U32, Endianness::Big, ["payload"]);
///
/// let mut generators = ZoneGenerators::new();
/// generators.insert("payload", |_zone, _original| Ok(b"BBBBBB".to_vec()));
///
/// let summary = session.commit(&mut generators, WriteOptions::default())?;
/// assert_eq!(summary.final_len(), 10);
/// assert_eq!(file.get_ref(), b"\0\0\0\x06BBBBBB");
/// # Ok(()) }
/// ```
pub fn begin_rewrite<F>(file: &mut F) -> Session<'_, F>
where
	F: FileLike,
	TagPatchError: From<<F as Truncate>::Error>,
	TagPatchError: From<<F as Length>::Error>,
{
	log::debug!("Beginning rewrite session");
	Session {
		file,
		zones: ZoneRegistry::new(),
		references: ReferenceSet::new(),
	}
}

/// A single rewrite of a single file
///
/// A session owns exclusive access to its file. Zones and references are registered against
/// the **original** file layout, and are consumed by [`Session::commit`].
pub struct Session<'a, F> {
	file: &'a mut F,
	zones: ZoneRegistry,
	references: ReferenceSet,
}

impl<F> Session<'_, F>
where
	F: FileLike,
	TagPatchError: From<<F as Truncate>::Error>,
	TagPatchError: From<<F as Length>::Error>,
{
	/// Register a zone
	///
	/// See [`Zone::new`]
	pub fn add_zone(
		&mut self,
		name: impl Into<String>,
		offset: u64,
		size: u64,
		core_signature: impl Into<Vec<u8>>,
		flag: ZoneFlag,
	) -> &mut Self {
		self.zones
			.push(Zone::new(name, offset, size, core_signature.into(), flag));
		self
	}

	/// Register a container size field, covering every zone named in `targets`
	pub fn add_size_ref<I, S>(
		&mut self,
		position: u64,
		width: FieldWidth,
		endianness: Endianness,
		targets: I,
	) -> &mut Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.add_reference(DependentReference::new(
			ReferenceKind::Size,
			position,
			width,
			endianness,
			targets,
		))
	}

	/// Register an item count, tracking the creation and removal of every zone named in `targets`
	pub fn add_counter_ref<I, S>(
		&mut self,
		position: u64,
		width: FieldWidth,
		endianness: Endianness,
		targets: I,
	) -> &mut Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.add_reference(DependentReference::new(
			ReferenceKind::Counter,
			position,
			width,
			endianness,
			targets,
		))
	}

	/// Register an offset into the zone named `target`
	///
	/// If `absent` is provided, it is written when the target ends up empty, and a stored
	/// value equal to it means the target did not exist in the original file.
	pub fn add_index_ref(
		&mut self,
		position: u64,
		width: FieldWidth,
		endianness: Endianness,
		base: IndexBase,
		absent: Option<u64>,
		target: impl Into<String>,
	) -> &mut Self {
		self.add_reference(DependentReference::new(
			ReferenceKind::Index { base, absent },
			position,
			width,
			endianness,
			[target],
		))
	}

	/// Register a prebuilt reference
	pub fn add_reference(&mut self, reference: DependentReference) -> &mut Self {
		self.references.push(reference);
		self
	}

	/// The zones registered so far
	pub fn zones(&self) -> &ZoneRegistry {
		&self.zones
	}

	/// The references registered so far
	pub fn references(&self) -> &ReferenceSet {
		&self.references
	}

	/// Read access to the original file, for use while registering zones
	pub fn reader(&mut self) -> impl Read + Seek + '_ {
		&mut *self.file
	}

	/// The length of the original file
	///
	/// # Errors
	///
	/// The file's length could not be determined
	pub fn file_len(&mut self) -> Result<u64> {
		Ok(self.file.len()?)
	}

	/// Copy `len` bytes of the original file, starting at `offset`
	///
	/// Generators only see their own zone. Anything else they depend on must be read
	/// with this before committing.
	///
	/// # Errors
	///
	/// * The range is not within the file
	/// * `len` exceeds the allocation limit
	pub fn snapshot(&mut self, offset: u64, len: u64) -> Result<Vec<u8>> {
		let mut content = try_vec![0; declared_size(len)?];
		self.file.seek(SeekFrom::Start(offset))?;
		self.file.read_exact(&mut content)?;
		Ok(content)
	}

	/// Generate, patch, and resolve every zone and reference
	///
	/// The commit happens in phases:
	///
	/// 1. The zones and references are validated against the original file
	/// 2. Every generator is run against its zone's original bytes
	/// 3. Every reference's new value is computed
	/// 4. Each zone is shifted into place, in offset order
	/// 5. Each reference is overwritten at its shifted position
	///
	/// Nothing is written before phase 4. With [`CommitStrategy::Buffered`], phases 4 and 5 happen
	/// on an in-memory copy, which only replaces the file's contents once complete.
	///
	/// # Errors
	///
	/// * [`ErrorKind::StructuralInconsistency`](crate::error::ErrorKind::StructuralInconsistency) - A zone or
	///   reference does not fit the file
	/// * [`ErrorKind::FieldOverflow`](crate::error::ErrorKind::FieldOverflow) - A reference can't hold its
	///   new value
	/// * Any error returned by a generator
	/// * [`std::io::Error`]
	pub fn commit(
		self,
		generators: &mut ZoneGenerators<'_>,
		write_options: WriteOptions,
	) -> Result<CommitSummary> {
		let Session {
			file,
			zones,
			references,
		} = self;

		let original_len = file.len()?;
		log::debug!(
			"Committing rewrite session: {} zones, {} references, original length: {}",
			zones.len(),
			references.len(),
			original_len
		);

		let zones = zones.into_ordered(original_len)?;
		let references = references.into_ordered(&zones, original_len)?;

		let patches = patcher::generate(file, zones, generators)?;

		let mut original_values = Vec::try_with_capacity_stable(references.len())?;
		for reference in &references {
			file.seek(SeekFrom::Start(reference.position))?;
			original_values.push(reference.read_value(file)?);
		}

		let resolved = resolver::resolve(references, &original_values, &patches)?;

		let total_delta = patches.iter().map(ZonePatch::delta).sum::<i64>();
		let Some(final_len) = original_len.checked_add_signed(total_delta) else {
			err!(SizeMismatch);
		};

		let deltas = match write_options.commit_strategy {
			CommitStrategy::Buffered => {
				let mut staged =
					Cursor::new(Vec::try_with_capacity_stable(declared_size(
						original_len.max(final_len),
					)?)?);

				file.rewind()?;
				file.read_to_end(staged.get_mut())?;

				let deltas = apply(&mut staged, &patches, &resolved, final_len)?;

				file.rewind()?;
				file.truncate(0)?;
				file.write_all(staged.get_ref())?;

				deltas
			},
			CommitStrategy::InPlace => apply(file, &patches, &resolved, final_len)?,
		};

		file.flush()?;

		let summary = CommitSummary {
			original_len,
			final_len,
			zones_patched: patches.iter().filter(|p| p.content.is_some()).count(),
			references_resolved: resolved.len(),
			deltas,
		};

		log::debug!(
			"Rewrite committed: {} -> {} bytes, {} zones patched, {} references resolved",
			summary.original_len,
			summary.final_len,
			summary.zones_patched,
			summary.references_resolved
		);

		Ok(summary)
	}
}

fn apply<F>(
	file: &mut F,
	patches: &[ZonePatch],
	resolved: &[ResolvedReference],
	final_len: u64,
) -> Result<Vec<ZoneDelta>>
where
	F: FileLike,
	TagPatchError: From<<F as Truncate>::Error>,
	TagPatchError: From<<F as Length>::Error>,
{
	let deltas = patcher::patch(file, patches)?;

	for resolved in resolved {
		file.seek(SeekFrom::Start(resolved.position))?;
		resolved.reference.write_value(file, resolved.value)?;
	}

	if file.len()? != final_len {
		log::error!("Patched length does not match the expected length of {final_len}");
		err!(SizeMismatch);
	}

	Ok(deltas)
}

/// A report of a committed rewrite session
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommitSummary {
	pub(crate) original_len: u64,
	pub(crate) final_len: u64,
	pub(crate) zones_patched: usize,
	pub(crate) references_resolved: usize,
	pub(crate) deltas: Vec<ZoneDelta>,
}

impl CommitSummary {
	/// The length of the file before the commit
	pub fn original_len(&self) -> u64 {
		self.original_len
	}

	/// The length of the file after the commit
	pub fn final_len(&self) -> u64 {
		self.final_len
	}

	/// The number of zones that had new content written
	pub fn zones_patched(&self) -> usize {
		self.zones_patched
	}

	/// The number of references rewritten
	pub fn references_resolved(&self) -> usize {
		self.references_resolved
	}

	/// Every zone, in offset order, with its new position and size
	pub fn deltas(&self) -> &[ZoneDelta] {
		&self.deltas
	}

	/// The total change in file length
	pub fn total_delta(&self) -> i64 {
		self.final_len as i64 - self.original_len as i64
	}
}

/// Rewrite the file at `path` through a staged copy
///
/// The file is copied into a temporary file in the same directory, `write` is run against
/// the copy, and the copy replaces the original only if `write` succeeds. The original is never
/// left partially written.
///
/// # Errors
///
/// * Any error returned by `write`
/// * The temporary file cannot be created or persisted
pub fn write_to_path<P, T, W>(path: P, write: W) -> Result<T>
where
	P: AsRef<Path>,
	W: FnOnce(&mut File) -> Result<T>,
{
	let path = path.as_ref();
	let parent = match path.parent() {
		Some(parent) if !parent.as_os_str().is_empty() => parent,
		_ => Path::new("."),
	};

	let mut original = File::open(path)?;
	let permissions = original.metadata()?.permissions();

	let mut staged = tempfile::NamedTempFile::new_in(parent)?;
	std::io::copy(&mut original, staged.as_file_mut())?;
	drop(original);

	staged.as_file_mut().rewind()?;
	let ret = write(staged.as_file_mut())?;

	staged.as_file().sync_all()?;
	std::fs::set_permissions(staged.path(), permissions)?;

	log::debug!("Replacing {} with its staged copy", path.display());
	staged.persist(path)?;

	Ok(ret)
}

/// Run a rewrite session against the file at `path`, replacing it atomically
///
/// `prepare` registers the zones and references, just as it would with [`begin_rewrite`]. The
/// session always commits [`CommitStrategy::InPlace`] onto the staged copy, see [`write_to_path`].
///
/// # Errors
///
/// See [`Session::commit`] and [`write_to_path`]
///
/// # Examples
///
/// ```rust,no_run
/// use tagpatch::config::WriteOptions;
/// use tagpatch::rewrite::{ZoneFlag, ZoneGenerators, commit_to_path};
///
/// # fn main() -> tagpatch::error::Result<()> {
/// let mut generators = ZoneGenerators::new();
/// generators.insert("trailer", |_zone, _original| Ok(Vec::new()));
///
/// commit_to_path(
/// 	"song.bin",
/// 	|session| {
/// 		let len = session.file_len()?;
/// 		session.add_zone("trailer", len - 128, 128, Vec::new(), ZoneFlag::None);
/// 		Ok(())
/// 	},
/// 	&mut generators,
/// 	WriteOptions::default(),
/// )?;
/// # Ok(()) }
/// ```
pub fn commit_to_path<P, Prep>(
	path: P,
	prepare: Prep,
	generators: &mut ZoneGenerators<'_>,
	write_options: WriteOptions,
) -> Result<CommitSummary>
where
	P: AsRef<Path>,
	Prep: FnOnce(&mut Session<'_, File>) -> Result<()>,
{
	write_to_path(path, |file| {
		let mut session = begin_rewrite(file);
		prepare(&mut session)?;
		session.commit(
			generators,
			write_options.commit_strategy(CommitStrategy::InPlace),
		)
	})
}
