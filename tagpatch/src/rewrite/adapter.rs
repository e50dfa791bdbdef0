use super::generator::ZoneGenerators;
use super::session::{CommitSummary, Session, begin_rewrite, write_to_path};
use super::zone::Zone;
use crate::config::{CommitStrategy, ParseOptions, WriteOptions};
use crate::error::{Result, TagPatchError};
use crate::file::FileType;
use crate::util::io::{FileLike, Length, Truncate};

use std::path::Path;

/// A format that can describe its rewritable regions to a [`Session`]
///
/// An adapter works in two steps:
///
/// 1. [`FormatAdapter::prepare`] reads the file once, registering a zone for every rewritable
///    region (including placeholders for regions that could be added), and a reference for every
///    field that depends on them.
/// 2. [`FormatAdapter::generate`] produces the new content of each zone from the caller's update.
///    It only sees the zone's original bytes, and never touches the file.
pub trait FormatAdapter {
	/// The new tag data supplied by the caller
	type Update;

	/// The type of file this adapter handles
	const FILE_TYPE: FileType;

	/// Register the zones and references of the file
	///
	/// # Errors
	///
	/// The file is not a valid instance of the format, or cannot be patched safely
	fn prepare<F>(&mut self, session: &mut Session<'_, F>, parse_options: ParseOptions) -> Result<()>
	where
		F: FileLike,
		TagPatchError: From<<F as Truncate>::Error>,
		TagPatchError: From<<F as Length>::Error>;

	/// Create the new content of `zone`
	///
	/// Returning `None` keeps the zone's original bytes.
	///
	/// # Errors
	///
	/// The update cannot be encoded for this format
	fn generate(
		&self,
		zone: &Zone,
		original: &[u8],
		update: &Self::Update,
		write_options: WriteOptions,
	) -> Result<Option<Vec<u8>>>;

	/// Names of zones that are never regenerated
	///
	/// These zones are not read at all while committing.
	fn kept_zones(&self) -> &[String] {
		&[]
	}
}

/// Prepare and commit a rewrite of `file` with `adapter`
///
/// # Errors
///
/// See [`FormatAdapter::prepare`] and [`Session::commit`]
pub fn write_with<F, A>(
	file: &mut F,
	adapter: &mut A,
	update: &A::Update,
	parse_options: ParseOptions,
	write_options: WriteOptions,
) -> Result<CommitSummary>
where
	F: FileLike,
	TagPatchError: From<<F as Truncate>::Error>,
	TagPatchError: From<<F as Length>::Error>,
	A: FormatAdapter,
{
	log::debug!("Writing {:?} file", A::FILE_TYPE);

	let mut session = begin_rewrite(file);
	adapter.prepare(&mut session, parse_options)?;

	let adapter = &*adapter;
	let mut generators = ZoneGenerators::new();
	for name in adapter.kept_zones() {
		generators.keep(name.clone());
	}
	generators.fallback(|zone, original| adapter.generate(zone, original, update, write_options));

	session.commit(&mut generators, write_options)
}

/// Same as [`write_with`], but atomically replaces the file at `path`
///
/// # Errors
///
/// See [`write_with`] and [`write_to_path`]
pub fn write_path_with<P, A>(
	path: P,
	adapter: &mut A,
	update: &A::Update,
	parse_options: ParseOptions,
	write_options: WriteOptions,
) -> Result<CommitSummary>
where
	P: AsRef<Path>,
	A: FormatAdapter,
{
	write_to_path(path, |file| {
		write_with(
			file,
			adapter,
			update,
			parse_options,
			write_options.commit_strategy(CommitStrategy::InPlace),
		)
	})
}
