use crate::util::{id3v2, rewrite};

use tagpatch::config::{CommitStrategy, ParseOptions, WriteOptions};
use tagpatch::flac::{FlacAdapter, FlacUpdate};
use tagpatch::ogg::VorbisComments;
use tagpatch::rewrite::write_with;

use std::io::Cursor;

const STREAMINFO: u8 = 0;
const PADDING: u8 = 1;
const SEEKTABLE: u8 = 3;
const VORBIS_COMMENT: u8 = 4;
const PICTURE: u8 = 6;

fn block(ty: u8, last: bool, content: &[u8]) -> Vec<u8> {
	let mut block = vec![ty | if last { 0x80 } else { 0 }];
	block.extend(&(content.len() as u32).to_be_bytes()[1..]);
	block.extend(content);
	block
}

fn comment_block(vendor: &str, items: &[(&str, &str)]) -> Vec<u8> {
	let mut content = (vendor.len() as u32).to_le_bytes().to_vec();
	content.extend(vendor.as_bytes());
	content.extend((items.len() as u32).to_le_bytes());
	for (key, value) in items {
		let item = format!("{key}={value}");
		content.extend((item.len() as u32).to_le_bytes());
		content.extend(item.as_bytes());
	}

	content
}

fn flac(blocks: &[Vec<u8>]) -> Vec<u8> {
	let mut file = b"fLaC".to_vec();
	file.extend(blocks.concat());

	// Frames
	file.extend([0xFF, 0xF8, 0x69, 0x08, 0x00, 0x12]);
	file.extend([0xAA; 100]);
	file
}

#[test_log::test]
fn no_op() {
	let original = flac(&[
		block(STREAMINFO, false, &[1; 34]),
		block(VORBIS_COMMENT, false, &comment_block("vendor", &[("TITLE", "Foo")])),
		block(PICTURE, false, &[6; 40]),
		block(PICTURE, false, &[7; 40]),
		block(PADDING, true, &[0; 100]),
	]);

	assert_eq!(rewrite::<FlacAdapter>(&original, &FlacUpdate::default()), original);
}

#[test_log::test]
fn replace_tags() {
	let original = flac(&[
		block(STREAMINFO, false, &[1; 34]),
		block(VORBIS_COMMENT, false, &comment_block("vendor", &[("TITLE", "Foo")])),
		block(PICTURE, false, &[6; 40]),
		block(SEEKTABLE, false, &[3; 18]),
		block(PICTURE, false, &[7; 40]),
		block(PADDING, true, &[0; 100]),
	]);

	let mut comments = VorbisComments::new();
	comments.push(String::from("TITLE"), String::from("Foo title"));
	comments.push(String::from("ARTIST"), String::from("Bar artist"));

	let update = FlacUpdate {
		vorbis_comments: Some(comments),
		pictures: Some(vec![vec![8; 12], Vec::new(), vec![9; 1000]]),
		remove_id3v2: false,
	};

	// Existing padding is kept as-is, the vendor string is retained
	assert_eq!(
		rewrite::<FlacAdapter>(&original, &update),
		flac(&[
			block(STREAMINFO, false, &[1; 34]),
			block(
				VORBIS_COMMENT,
				false,
				&comment_block("vendor", &[("TITLE", "Foo title"), ("ARTIST", "Bar artist")])
			),
			block(PICTURE, false, &[8; 12]),
			block(PICTURE, false, &[9; 1000]),
			block(SEEKTABLE, false, &[3; 18]),
			block(PADDING, true, &[0; 100]),
		])
	);
}

#[test_log::test]
fn add_to_bare_stream() {
	let original = flac(&[block(STREAMINFO, true, &[1; 34])]);

	let mut comments = VorbisComments::new();
	comments.set_vendor(String::from("tagpatch"));
	comments.push(String::from("TITLE"), String::from("Foo title"));

	let update = FlacUpdate {
		vorbis_comments: Some(comments),
		..FlacUpdate::default()
	};

	let expected = flac(&[
		block(STREAMINFO, false, &[1; 34]),
		block(VORBIS_COMMENT, false, &comment_block("tagpatch", &[("TITLE", "Foo title")])),
		block(PADDING, true, &[0; 1024]),
	]);
	assert_eq!(rewrite::<FlacAdapter>(&original, &update), expected);

	// No padding requested
	let mut file = Cursor::new(original);
	write_with(
		&mut file,
		&mut FlacAdapter::new(),
		&update,
		ParseOptions::new(),
		WriteOptions::new()
			.preferred_padding(0)
			.commit_strategy(CommitStrategy::InPlace),
	)
	.unwrap();

	assert_eq!(
		file.into_inner(),
		flac(&[
			block(STREAMINFO, false, &[1; 34]),
			block(VORBIS_COMMENT, true, &comment_block("tagpatch", &[("TITLE", "Foo title")])),
		])
	);
}

#[test_log::test]
fn remove_tags() {
	let mut original = id3v2(64);
	original.extend(flac(&[
		block(STREAMINFO, false, &[1; 34]),
		block(SEEKTABLE, false, &[3; 18]),
		block(VORBIS_COMMENT, false, &comment_block("vendor", &[("TITLE", "Foo")])),
		block(PICTURE, true, &[6; 40]),
	]));

	let update = FlacUpdate {
		vorbis_comments: Some(VorbisComments::new()),
		pictures: Some(Vec::new()),
		remove_id3v2: true,
	};

	// The removed blocks are replaced with padding
	assert_eq!(
		rewrite::<FlacAdapter>(&original, &update),
		flac(&[
			block(STREAMINFO, false, &[1; 34]),
			block(SEEKTABLE, false, &[3; 18]),
			block(PADDING, true, &[0; 1024]),
		])
	);
}
