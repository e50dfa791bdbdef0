use super::patcher::ZonePatch;
use super::reference::{DependentReference, IndexBase, ReferenceKind};
use crate::error::{ErrorKind, Result, TagPatchError};

/// A dependent reference with its final position and value
#[derive(Debug)]
pub(crate) struct ResolvedReference {
	pub(crate) reference: DependentReference,
	pub(crate) position: u64,
	pub(crate) value: u64,
}

/// Computes the corrected value of every reference
///
/// This only depends on the zone sizes, so it runs before anything is written. A field that
/// cannot hold its new value is reported without the file being touched.
pub(crate) fn resolve(
	references: Vec<DependentReference>,
	original_values: &[u64],
	patches: &[ZonePatch],
) -> Result<Vec<ResolvedReference>> {
	let mut resolved = Vec::with_capacity(references.len());
	for (reference, original) in references.into_iter().zip(original_values.iter().copied()) {
		let value = resolve_value(&reference, original, patches)?;
		let position = reference.position.saturating_add_signed(shift(patches, reference.position));

		log::trace!(
			"Resolved {:?} reference at {} (now {}): {} -> {}",
			reference.kind,
			reference.position,
			position,
			original,
			value
		);

		resolved.push(ResolvedReference {
			reference,
			position,
			value,
		});
	}

	Ok(resolved)
}

/// The cumulative delta of every zone that ends at or before `position`
fn shift(patches: &[ZonePatch], position: u64) -> i64 {
	patches
		.iter()
		.filter(|patch| patch.zone.end() <= position)
		.map(ZonePatch::delta)
		.sum()
}

/// The cumulative delta of every zone patched before `patches[index]`
fn shift_before(patches: &[ZonePatch], index: usize) -> i64 {
	patches[..index].iter().map(ZonePatch::delta).sum()
}

fn resolve_value(reference: &DependentReference, original: u64, patches: &[ZonePatch]) -> Result<u64> {
	let targets = patches
		.iter()
		.enumerate()
		.filter(|(_, patch)| reference.targets_zone(&patch.zone));

	let original = i128::from(original);
	let value = match reference.kind {
		ReferenceKind::Size => {
			original + targets.map(|(_, patch)| i128::from(patch.delta())).sum::<i128>()
		},
		ReferenceKind::Counter => {
			let existence_change = targets
				.map(|(_, patch)| {
					match (patch.zone.size == 0, patch.new_size() == 0) {
						(true, false) => 1,
						(false, true) => -1,
						_ => 0,
					}
				})
				.sum::<i128>();

			original + existence_change
		},
		ReferenceKind::Index { base, absent } => {
			let targets = targets.collect::<Vec<_>>();

			// Validation guarantees at least one target
			let (first_index, first) = targets[0];
			let all_empty = targets.iter().all(|(_, patch)| patch.new_size() == 0);

			let (base_position, base_shift) = match base {
				IndexBase::Absolute => (0, 0),
				IndexBase::Relative(position) => (
					i128::from(position),
					i128::from(shift(patches, position)),
				),
			};

			let target_shift = i128::from(shift_before(patches, first_index));
			match absent {
				Some(absent) if all_empty => i128::from(absent),
				// The target did not exist, point at wherever it was created
				Some(absent) if original == i128::from(absent) => {
					let effective_offset = i128::from(first.zone.offset) + target_shift;
					effective_offset - (base_position + base_shift)
				},
				_ => original + target_shift - base_shift,
			}
		},
	};

	match u64::try_from(value) {
		Ok(value) if value <= reference.width.max() => Ok(value),
		_ => Err(TagPatchError::new(ErrorKind::FieldOverflow {
			position: reference.position,
			value,
		})),
	}
}
