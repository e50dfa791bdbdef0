use crate::util::{chunk_be, id3v2, rewrite};

use tagpatch::iff::{AiffAdapter, AiffTextChunks};

fn aiff(form_type: &[u8; 4], chunks: &[Vec<u8>]) -> Vec<u8> {
	let body = chunks.concat();

	let mut file = b"FORM".to_vec();
	file.extend((body.len() as u32 + 4).to_be_bytes());
	file.extend(form_type);
	file.extend(body);
	file
}

fn comm() -> Vec<u8> {
	chunk_be(b"COMM", &[2; 18])
}

fn ssnd() -> Vec<u8> {
	chunk_be(b"SSND", &[0x55; 31])
}

#[test_log::test]
fn no_op() {
	let original = aiff(b"AIFF", &[
		comm(),
		chunk_be(b"NAME", b"Foo title"),
		chunk_be(b"ANNO", b"One"),
		ssnd(),
		chunk_be(b"ANNO", b"Two"),
		chunk_be(b"ID3 ", &id3v2(40)),
	]);

	assert_eq!(
		rewrite::<AiffAdapter>(&original, &AiffTextChunks::default()),
		original
	);
}

#[test_log::test]
fn add_and_remove() {
	let original = aiff(b"AIFC", &[
		comm(),
		chunk_be(b"NAME", b"Foo title"),
		ssnd(),
	]);

	let tag = id3v2(64);
	let update = AiffTextChunks {
		name: Some(String::new()),
		author: Some(String::from("Bar artist")),
		copyright: Some(String::from("(c) 2024")),
		id3v2: Some(tag.clone()),
		..AiffTextChunks::default()
	};

	let written = rewrite::<AiffAdapter>(&original, &update);
	assert_eq!(
		written,
		aiff(b"AIFC", &[
			comm(),
			chunk_be(b"AUTH", b"Bar artist"),
			chunk_be(b"(c) ", b"(c) 2024"),
			ssnd(),
			chunk_be(b"ID3 ", &tag),
		])
	);

	// Strip everything back out
	let update = AiffTextChunks {
		author: Some(String::new()),
		copyright: Some(String::new()),
		annotations: Some(Vec::new()),
		id3v2: Some(Vec::new()),
		..AiffTextChunks::default()
	};

	assert_eq!(
		rewrite::<AiffAdapter>(&written, &update),
		aiff(b"AIFC", &[comm(), ssnd()])
	);
}

#[test_log::test]
fn grow_id3_in_place() {
	let original = aiff(b"AIFF", &[comm(), chunk_be(b"ID3 ", &id3v2(20)), ssnd()]);

	let tag = id3v2(2049);
	let update = AiffTextChunks {
		id3v2: Some(tag.clone()),
		..AiffTextChunks::default()
	};

	assert_eq!(
		rewrite::<AiffAdapter>(&original, &update),
		aiff(b"AIFF", &[comm(), chunk_be(b"ID3 ", &tag), ssnd()])
	);
}

#[test_log::test]
fn appending_after_unpadded_chunk() {
	// The final `SSND` chunk is missing its pad byte
	let mut unpadded_ssnd = ssnd();
	unpadded_ssnd.pop();
	let original = aiff(b"AIFF", &[comm(), unpadded_ssnd]);

	let tag = id3v2(20);
	let update = AiffTextChunks {
		author: Some(String::from("Bar")),
		id3v2: Some(tag.clone()),
		..AiffTextChunks::default()
	};

	assert_eq!(
		rewrite::<AiffAdapter>(&original, &update),
		aiff(b"AIFF", &[
			comm(),
			chunk_be(b"AUTH", b"Bar"),
			ssnd(),
			chunk_be(b"ID3 ", &tag),
		])
	);
}
