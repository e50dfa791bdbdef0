use crate::util::{read_file, temp_file};

use tagpatch::config::{CommitStrategy, WriteOptions};
use tagpatch::error::ErrorKind;
use tagpatch::rewrite::{
	Endianness, FieldWidth, IndexBase, Session, ZoneFlag, ZoneGenerators, begin_rewrite,
};

use std::io::Cursor;

fn pattern(len: usize) -> Vec<u8> {
	(0..len).map(|i| (i % 251) as u8).collect()
}

fn commit<P>(original: &[u8], strategy: CommitStrategy, prepare: P) -> Vec<u8>
where
	P: FnOnce(&mut Session<'_, Cursor<Vec<u8>>>),
{
	let mut file = Cursor::new(original.to_vec());

	let mut session = begin_rewrite(&mut file);
	prepare(&mut session);

	let mut generators = ZoneGenerators::new();
	generators
		.insert("A", |_, _| Ok(vec![0xAA; 80]))
		.insert("B", |_, _| Ok(vec![0xBB; 10]));

	session
		.commit(&mut generators, WriteOptions::new().commit_strategy(strategy))
		.unwrap();

	file.into_inner()
}

fn two_zone_file() -> Vec<u8> {
	let mut original = pattern(1000);
	original[600..604].copy_from_slice(&20u32.to_le_bytes());
	original
}

fn two_zone_expected(original: &[u8]) -> Vec<u8> {
	let mut expected = original[..100].to_vec();
	expected.extend([0xAA; 80]);
	expected.extend(&original[150..500]);
	expected.extend([0xBB; 10]);
	expected.extend(&original[520..600]);
	expected.extend(10u32.to_le_bytes());
	expected.extend(&original[604..]);
	expected
}

#[test_log::test]
fn two_zones_and_a_size() {
	let original = two_zone_file();

	for strategy in [CommitStrategy::Buffered, CommitStrategy::InPlace] {
		let written = commit(&original, strategy, |session| {
			session
				.add_zone("A", 100, 50, Vec::new(), ZoneFlag::None)
				.add_zone("B", 500, 20, Vec::new(), ZoneFlag::None)
				.add_size_ref(600, FieldWidth::U32, Endianness::Little, ["B"]);
		});

		assert_eq!(written.len(), 1020);

		// The field follows both zones, so it moved by +30 - 10
		assert_eq!(&written[620..624], &10u32.to_le_bytes());
		assert_eq!(written, two_zone_expected(&original));
	}
}

#[test_log::test]
fn registration_order_is_irrelevant() {
	let original = two_zone_file();

	let written = commit(&original, CommitStrategy::Buffered, |session| {
		session
			.add_size_ref(600, FieldWidth::U32, Endianness::Little, ["B"])
			.add_zone("B", 500, 20, Vec::new(), ZoneFlag::None)
			.add_zone("A", 100, 50, Vec::new(), ZoneFlag::None);
	});

	assert_eq!(written, two_zone_expected(&original));
}

#[test_log::test]
fn identity_generators_are_a_no_op() {
	let mut original = pattern(4096);
	original[0..4].copy_from_slice(&100u32.to_be_bytes());
	original[8..16].copy_from_slice(&2000u64.to_le_bytes());

	for strategy in [CommitStrategy::Buffered, CommitStrategy::InPlace] {
		let mut file = Cursor::new(original.clone());

		let mut session = begin_rewrite(&mut file);
		session
			.add_zone("head", 100, 100, Vec::new(), ZoneFlag::None)
			.add_zone("tail", 2000, 96, Vec::new(), ZoneFlag::None)
			.add_size_ref(0, FieldWidth::U32, Endianness::Big, ["head"])
			.add_index_ref(
				8,
				FieldWidth::U64,
				Endianness::Little,
				IndexBase::Absolute,
				None,
				"tail",
			);

		let mut generators = ZoneGenerators::new();
		generators.fallback(|_, original| Ok(Some(original.to_vec())));

		let summary = session
			.commit(&mut generators, WriteOptions::new().commit_strategy(strategy))
			.unwrap();
		assert_eq!(summary.total_delta(), 0);
		assert_eq!(summary.zones_patched(), 2);

		assert_eq!(file.into_inner(), original);
	}
}

#[test_log::test]
fn emptied_zone_keeps_core_signature() {
	let mut original = b"HEAD".to_vec();
	original.extend(28u32.to_le_bytes());
	original.extend(b"TAG!");
	original.extend([0x77; 24]);
	original.extend(b"TAIL");

	let mut file = Cursor::new(original);

	let mut session = begin_rewrite(&mut file);
	session
		.add_zone("tag", 8, 28, *b"TAG!", ZoneFlag::None)
		.add_size_ref(4, FieldWidth::U32, Endianness::Little, ["tag"]);

	let mut generators = ZoneGenerators::new();
	generators.insert("tag", |_, _| Ok(Vec::new()));
	session.commit(&mut generators, WriteOptions::new()).unwrap();

	let mut expected = b"HEAD".to_vec();
	expected.extend(4u32.to_le_bytes());
	expected.extend(b"TAG!");
	expected.extend(b"TAIL");

	assert_eq!(file.into_inner(), expected);
}

#[test_log::test]
fn index_follows_relocated_zone() {
	let mut original = pattern(512);
	original[0..4].copy_from_slice(&400u32.to_be_bytes());

	let mut file = Cursor::new(original.clone());

	let mut session = begin_rewrite(&mut file);
	session
		.add_zone("grows", 64, 16, Vec::new(), ZoneFlag::None)
		.add_zone("target", 400, 112, Vec::new(), ZoneFlag::None)
		.add_index_ref(
			0,
			FieldWidth::U32,
			Endianness::Big,
			IndexBase::Absolute,
			None,
			"target",
		);

	let mut generators = ZoneGenerators::new();
	generators.insert("grows", |_, _| Ok(vec![0; 48])).keep("target");
	session.commit(&mut generators, WriteOptions::new()).unwrap();

	let written = file.into_inner();
	let index = u32::from_be_bytes(written[0..4].try_into().unwrap()) as usize;
	assert_eq!(index, 432);
	assert_eq!(&written[index..], &original[400..]);
}

#[test_log::test]
fn invalid_sessions_leave_file_untouched() {
	let original = pattern(256);

	for strategy in [CommitStrategy::Buffered, CommitStrategy::InPlace] {
		// Overlapping zones
		let mut file = Cursor::new(original.clone());
		let mut session = begin_rewrite(&mut file);
		session
			.add_zone("A", 10, 20, Vec::new(), ZoneFlag::None)
			.add_zone("B", 20, 20, Vec::new(), ZoneFlag::None);

		let mut generators = ZoneGenerators::new();
		generators.fallback(|_, _| Ok(Some(Vec::new())));

		let err = session
			.commit(&mut generators, WriteOptions::new().commit_strategy(strategy))
			.unwrap_err();
		assert!(matches!(err.kind(), ErrorKind::StructuralInconsistency(_)));
		assert_eq!(file.into_inner(), original);

		// Zone past the end of the file
		let mut file = Cursor::new(original.clone());
		let mut session = begin_rewrite(&mut file);
		session.add_zone("A", 250, 20, Vec::new(), ZoneFlag::None);

		let err = session
			.commit(&mut generators, WriteOptions::new().commit_strategy(strategy))
			.unwrap_err();
		assert!(matches!(err.kind(), ErrorKind::StructuralInconsistency(_)));
		assert_eq!(file.into_inner(), original);

		// A two byte field can't hold the new size
		let mut file = Cursor::new(original.clone());
		let mut session = begin_rewrite(&mut file);
		session
			.add_zone("A", 100, 20, Vec::new(), ZoneFlag::None)
			.add_size_ref(0, FieldWidth::U16, Endianness::Little, ["A"]);

		let mut generators = ZoneGenerators::new();
		generators.insert("A", |_, _| Ok(vec![0; 70_000]));

		let err = session
			.commit(&mut generators, WriteOptions::new().commit_strategy(strategy))
			.unwrap_err();
		assert!(matches!(err.kind(), ErrorKind::FieldOverflow { .. }));
		assert_eq!(file.into_inner(), original);
	}
}

#[test_log::test]
fn real_file_matches_buffer() {
	let original = two_zone_file();

	let mut file = temp_file(&original);
	{
		let mut session = begin_rewrite(&mut file);
		session
			.add_zone("A", 100, 50, Vec::new(), ZoneFlag::None)
			.add_zone("B", 500, 20, Vec::new(), ZoneFlag::None)
			.add_size_ref(600, FieldWidth::U32, Endianness::Little, ["B"]);

		let mut generators = ZoneGenerators::new();
		generators
			.insert("A", |_, _| Ok(vec![0xAA; 80]))
			.insert("B", |_, _| Ok(vec![0xBB; 10]));

		session
			.commit(
				&mut generators,
				WriteOptions::new().commit_strategy(CommitStrategy::InPlace),
			)
			.unwrap();
	}

	assert_eq!(read_file(&mut file), two_zone_expected(&original));
}
