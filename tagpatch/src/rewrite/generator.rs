use super::zone::Zone;
use crate::error::Result;

use std::collections::{HashMap, HashSet};

type Generator<'a> = Box<dyn FnMut(&Zone, &[u8]) -> Result<Vec<u8>> + 'a>;
type FallbackGenerator<'a> = Box<dyn FnMut(&Zone, &[u8]) -> Result<Option<Vec<u8>>> + 'a>;

/// Content generators for the zones of a rewrite session
///
/// A generator receives the zone and its **original** bytes, and returns the zone's new content.
/// Generators are all run before the file is modified, and must not touch the file themselves.
///
/// Zones are matched by name. A zone without a named generator is handed to the fallback (if any),
/// and a zone that neither handles keeps its original bytes.
///
/// # Examples
///
/// ```rust
/// use tagpatch::rewrite::ZoneGenerators;
///
/// let mut generators = ZoneGenerators::new();
/// generators
/// 	.insert("bext", |_zone, _original| Ok(Vec::new()))
/// 	.insert("LIST", |_zone, original| Ok(original.to_vec()));
/// ```
#[derive(Default)]
pub struct ZoneGenerators<'a> {
	by_name: HashMap<String, Generator<'a>>,
	kept: HashSet<String>,
	fallback: Option<FallbackGenerator<'a>>,
}

impl<'a> ZoneGenerators<'a> {
	/// Create an empty set of generators
	pub fn new() -> Self {
		Self::default()
	}

	/// Set the generator for every zone named `name`
	pub fn insert<G>(&mut self, name: impl Into<String>, generator: G) -> &mut Self
	where
		G: FnMut(&Zone, &[u8]) -> Result<Vec<u8>> + 'a,
	{
		self.by_name.insert(name.into(), Box::new(generator));
		self
	}

	/// Set the generator for zones that have no named generator
	///
	/// Returning `None` keeps the zone's original bytes.
	pub fn fallback<G>(&mut self, generator: G) -> &mut Self
	where
		G: FnMut(&Zone, &[u8]) -> Result<Option<Vec<u8>>> + 'a,
	{
		self.fallback = Some(Box::new(generator));
		self
	}

	/// Keep every zone named `name` as-is, without reading it
	///
	/// This is useful for large zones that only exist to be the target of a reference,
	/// such as media data.
	pub fn keep(&mut self, name: impl Into<String>) -> &mut Self {
		self.kept.insert(name.into());
		self
	}

	/// Whether the zone's original bytes are needed to generate its content
	pub(crate) fn handles(&self, zone: &Zone) -> bool {
		if self.by_name.contains_key(&zone.name) {
			return true;
		}

		!self.kept.contains(&zone.name) && self.fallback.is_some()
	}

	/// Generates new content for `zone`, `None` meaning the zone is unchanged
	pub(crate) fn generate(&mut self, zone: &Zone, original: &[u8]) -> Result<Option<Vec<u8>>> {
		if let Some(generator) = self.by_name.get_mut(&zone.name) {
			return generator(zone, original).map(Some);
		}

		if self.kept.contains(&zone.name) {
			return Ok(None);
		}

		match &mut self.fallback {
			Some(fallback) => fallback(zone, original),
			None => Ok(None),
		}
	}
}

impl std::fmt::Debug for ZoneGenerators<'_> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ZoneGenerators")
			.field("by_name", &self.by_name.keys().collect::<Vec<_>>())
			.field("kept", &self.kept)
			.field("fallback", &self.fallback.is_some())
			.finish()
	}
}
