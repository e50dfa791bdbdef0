use crate::util::{chunk_le, id3v2, rewrite, rewrite_err};

use tagpatch::config::{ParseOptions, WriteOptions};
use tagpatch::error::ErrorKind;
use tagpatch::iff::{RiffInfoList, WavAdapter, WavUpdate};
use tagpatch::rewrite::write_path_with;

use std::io::Write as _;

fn wav(chunks: &[Vec<u8>]) -> Vec<u8> {
	let body = chunks.concat();

	let mut file = b"RIFF".to_vec();
	file.extend((body.len() as u32 + 4).to_le_bytes());
	file.extend(b"WAVE");
	file.extend(body);
	file
}

fn fmt() -> Vec<u8> {
	chunk_le(b"fmt ", &[1; 16])
}

fn data() -> Vec<u8> {
	chunk_le(b"data", &[0x55; 9])
}

fn info_list(items: &[(&str, &str)]) -> RiffInfoList {
	let mut info = RiffInfoList::new();
	for (key, value) in items {
		info.insert((*key).to_string(), (*value).to_string());
	}

	info
}

fn info_chunk(items: &[(&str, &str)]) -> Vec<u8> {
	let mut content = b"INFO".to_vec();
	for (key, value) in items {
		let mut value = value.as_bytes().to_vec();
		value.push(0);

		content.extend(chunk_le(key.as_bytes().try_into().unwrap(), &value));
	}

	chunk_le(b"LIST", &content)
}

#[test_log::test]
fn no_op() {
	let original = wav(&[
		fmt(),
		info_chunk(&[("INAM", "Foo title")]),
		data(),
		chunk_le(b"ID3 ", &id3v2(25)),
		chunk_le(b"bext", &[0xBE; 602]),
	]);

	assert_eq!(rewrite::<WavAdapter>(&original, &WavUpdate::default()), original);
}

#[test_log::test]
fn add_tags() {
	let original = wav(&[fmt(), data()]);

	let tag = id3v2(33);
	let update = WavUpdate {
		info: Some(info_list(&[("INAM", "Foo title"), ("IART", "Bar artist")])),
		id3v2: Some(tag.clone()),
		bext: Some(vec![0xBE; 12]),
	};

	let written = rewrite::<WavAdapter>(&original, &update);
	let expected = wav(&[
		fmt(),
		data(),
		info_chunk(&[("INAM", "Foo title"), ("IART", "Bar artist")]),
		chunk_le(b"ID3 ", &tag),
		chunk_le(b"bext", &[0xBE; 12]),
	]);
	assert_eq!(written, expected);

	// Nothing moves once the chunks exist
	assert_eq!(rewrite::<WavAdapter>(&written, &update), written);
}

#[test_log::test]
fn remove_tags() {
	let original = wav(&[
		fmt(),
		info_chunk(&[("INAM", "Foo title")]),
		data(),
		chunk_le(b"ID3 ", &id3v2(25)),
		chunk_le(b"bext", &[0xBE; 602]),
	]);

	let update = WavUpdate {
		info: Some(RiffInfoList::new()),
		id3v2: Some(Vec::new()),
		bext: None,
	};

	let written = rewrite::<WavAdapter>(&original, &update);
	assert_eq!(
		written,
		wav(&[fmt(), data(), chunk_le(b"bext", &[0xBE; 602])])
	);
}

#[test_log::test]
fn grow_and_shrink() {
	let original = wav(&[
		fmt(),
		info_chunk(&[("INAM", "Foo title")]),
		data(),
		chunk_le(b"ID3 ", &id3v2(1000)),
	]);

	let items = [
		("INAM", "A much longer title than before"),
		("ICMT", "Baz comment"),
	];
	let tag = id3v2(11);
	let update = WavUpdate {
		info: Some(info_list(&items)),
		id3v2: Some(tag.clone()),
		bext: None,
	};

	let written = rewrite::<WavAdapter>(&original, &update);
	assert_eq!(
		written,
		wav(&[fmt(), info_chunk(&items), data(), chunk_le(b"ID3 ", &tag)])
	);
}

#[test_log::test]
fn trailing_data_untouched() {
	let mut original = wav(&[fmt(), data()]);
	let trailer = b"not a part of the RIFF stream".to_vec();
	original.extend(&trailer);

	let update = WavUpdate {
		info: Some(info_list(&[("INAM", "Foo title")])),
		..WavUpdate::default()
	};

	let mut expected = wav(&[fmt(), data(), info_chunk(&[("INAM", "Foo title")])]);
	expected.extend(&trailer);

	assert_eq!(rewrite::<WavAdapter>(&original, &update), expected);
}

#[test_log::test]
fn not_wav() {
	let mut original = wav(&[fmt(), data()]);
	original[8..12].copy_from_slice(b"AVI ");

	let err = rewrite_err::<WavAdapter>(&original, &WavUpdate::default());
	assert!(matches!(err.kind(), ErrorKind::FileDecoding(_)));
}

#[test_log::test]
fn write_to_path() {
	let original = wav(&[fmt(), data()]);

	let mut file = tempfile::NamedTempFile::new().unwrap();
	file.write_all(&original).unwrap();
	file.flush().unwrap();

	let update = WavUpdate {
		bext: Some(vec![0xBE; 4]),
		..WavUpdate::default()
	};

	let summary = write_path_with(
		file.path(),
		&mut WavAdapter::new(),
		&update,
		ParseOptions::new(),
		WriteOptions::new(),
	)
	.unwrap();
	assert_eq!(summary.total_delta(), 12);

	let written = std::fs::read(file.path()).unwrap();
	assert_eq!(written, wav(&[fmt(), data(), chunk_le(b"bext", &[0xBE; 4])]));
}

#[test_log::test]
fn appending_after_unpadded_chunk() {
	// The final `data` chunk is missing its pad byte
	let mut unpadded_data = data();
	unpadded_data.pop();
	let original = wav(&[fmt(), unpadded_data]);

	let update = WavUpdate {
		bext: Some(vec![0xBE; 10]),
		..WavUpdate::default()
	};

	let written = rewrite::<WavAdapter>(&original, &update);
	assert_eq!(written, wav(&[fmt(), data(), chunk_le(b"bext", &[0xBE; 10])]));

	// The restored pad byte stays behind
	let update = WavUpdate {
		bext: Some(Vec::new()),
		..WavUpdate::default()
	};
	assert_eq!(rewrite::<WavAdapter>(&written, &update), wav(&[fmt(), data()]));
}

#[test_log::test]
fn unpadded_tag_chunk_is_padded() {
	let tag = id3v2(25);
	let mut unpadded_id3 = chunk_le(b"ID3 ", &tag);
	unpadded_id3.pop();
	let original = wav(&[fmt(), data(), unpadded_id3]);

	// The kept ID3 chunk takes the pad byte
	let update = WavUpdate {
		bext: Some(vec![0xBE; 10]),
		..WavUpdate::default()
	};
	assert_eq!(
		rewrite::<WavAdapter>(&original, &update),
		wav(&[
			fmt(),
			data(),
			chunk_le(b"ID3 ", &tag),
			chunk_le(b"bext", &[0xBE; 10])
		])
	);

	// A replaced ID3 chunk is already padded
	let new_tag = id3v2(31);
	let update = WavUpdate {
		id3v2: Some(new_tag.clone()),
		bext: Some(vec![0xBE; 10]),
		..WavUpdate::default()
	};
	assert_eq!(
		rewrite::<WavAdapter>(&original, &update),
		wav(&[
			fmt(),
			data(),
			chunk_le(b"ID3 ", &new_tag),
			chunk_le(b"bext", &[0xBE; 10])
		])
	);
}
