use tagpatch::config::{CommitStrategy, ParseOptions, WriteOptions};
use tagpatch::error::ErrorKind;
use tagpatch::ogg::{OggFormat, VorbisComments, read_comments, write_comment_packet, write_comments};

use std::io::Cursor;

use ogg_pager::{
	CONTAINS_FIRST_PAGE_OF_BITSTREAM, CONTAINS_LAST_PAGE_OF_BITSTREAM, Packets, Page, paginate,
};

const SERIAL: u32 = 0x1234_5678;
const AUDIO_PAGES: u32 = 4;

fn comment_packet(signature: &[u8], vendor: &str, items: &[(&str, &str)], framing: bool) -> Vec<u8> {
	let mut packet = signature.to_vec();
	packet.extend((vendor.len() as u32).to_le_bytes());
	packet.extend(vendor.as_bytes());
	packet.extend((items.len() as u32).to_le_bytes());
	for (key, value) in items {
		let item = format!("{key}={value}");
		packet.extend((item.len() as u32).to_le_bytes());
		packet.extend(item.as_bytes());
	}

	if framing {
		packet.push(1);
	}

	packet
}

/// An identification page, the rest of the header packets, then a few audio pages
fn stream(ident: &[u8], headers: &[&[u8]]) -> Vec<u8> {
	let mut ident = Page::new(CONTAINS_FIRST_PAGE_OF_BITSTREAM, 0, SERIAL, 0, ident.to_vec()).unwrap();
	ident.gen_crc();

	let mut stream = ident.as_bytes();

	let mut sequence_number = 1;
	for mut page in paginate(headers.iter().copied(), SERIAL, 0, 0).unwrap() {
		page.header_mut().sequence_number = sequence_number;
		page.gen_crc();

		stream.extend(page.as_bytes());
		sequence_number += 1;
	}

	for i in 0..AUDIO_PAGES {
		let flags = if i == AUDIO_PAGES - 1 {
			CONTAINS_LAST_PAGE_OF_BITSTREAM
		} else {
			0
		};

		let mut page = Page::new(
			flags,
			u64::from(i + 1) * 960,
			SERIAL,
			sequence_number,
			vec![i as u8; 300],
		)
		.unwrap();
		page.gen_crc();

		stream.extend(page.as_bytes());
		sequence_number += 1;
	}

	stream
}

fn read_pages(stream: &[u8]) -> Vec<Page> {
	let mut reader = Cursor::new(stream);

	let mut pages = Vec::new();
	while reader.position() < stream.len() as u64 {
		let page = Page::read(&mut reader).unwrap();
		page.verify_crc().unwrap();
		pages.push(page);
	}

	pages
}

fn write(stream: &[u8], format: OggFormat, comments: &VorbisComments) -> Vec<u8> {
	let mut outputs = Vec::new();
	for strategy in [CommitStrategy::Buffered, CommitStrategy::InPlace] {
		let mut file = Cursor::new(stream.to_vec());
		let summary = write_comments(
			&mut file,
			format,
			comments,
			WriteOptions::new().commit_strategy(strategy),
		)
		.unwrap();

		let output = file.into_inner();
		assert_eq!(summary.final_len(), output.len() as u64);
		outputs.push(output);
	}

	assert_eq!(outputs[0], outputs[1]);
	outputs.remove(0)
}

fn opus_head() -> Vec<u8> {
	let mut head = b"OpusHead".to_vec();
	head.extend([1, 2, 0x38, 0x01, 0x80, 0xBB, 0, 0, 0, 0, 0]);
	head
}

#[test_log::test]
fn comment_header_shrinks_by_a_page() {
	let large_title = "a".repeat(70000);
	let packet = comment_packet(b"OpusTags", "vendor", &[("TITLE", &large_title)], false);
	let original = stream(&opus_head(), &[&packet]);

	let original_pages = read_pages(&original);
	assert_eq!(original_pages.len(), 1 + 2 + AUDIO_PAGES as usize);

	let mut comments = VorbisComments::new();
	comments.push(String::from("TITLE"), String::from("Foo title"));

	let written = write(&original, OggFormat::Opus, &comments);
	let pages = read_pages(&written);

	// One less page
	assert_eq!(pages.len(), original_pages.len() - 1);

	// Identification page untouched
	assert_eq!(pages[0].as_bytes(), original_pages[0].as_bytes());

	// Every later page moved back a sequence number, nothing else changed
	for (page, original) in pages[2..].iter().zip(&original_pages[3..]) {
		assert_eq!(
			page.header().sequence_number,
			original.header().sequence_number - 1
		);
		assert_eq!(page.header().abgp, original.header().abgp);
		assert_eq!(
			page.header().header_type_flag(),
			original.header().header_type_flag()
		);
		assert_eq!(page.content(), original.content());
	}

	// The length changed by a page header, plus the difference in content
	let header_len = |page: &Page| page.header().len() as i64;
	let content_len = |page: &Page| page.content().len() as i64;

	let old = &original_pages[1..3];
	let new = &pages[1];
	let expected_delta = (header_len(new) - old.iter().map(header_len).sum::<i64>())
		+ (content_len(new) - old.iter().map(content_len).sum::<i64>());
	assert_eq!(written.len() as i64 - original.len() as i64, expected_delta);

	// The vendor was kept
	let read = read_comments(&mut Cursor::new(&written), OggFormat::Opus, ParseOptions::new()).unwrap();
	assert_eq!(read.vendor(), Some("vendor"));
	assert_eq!(read.get("TITLE"), Some("Foo title"));
}

#[test_log::test]
fn vorbis_setup_header_preserved() {
	let mut ident = b"\x01vorbis".to_vec();
	ident.extend([0; 23]);

	let mut setup = b"\x05vorbis".to_vec();
	setup.extend((0..2000).map(|i| (i % 251) as u8));

	let comments = comment_packet(b"\x03vorbis", "Xiph.Org libVorbis", &[], true);
	let original = stream(&ident, &[&comments, &setup]);

	let mut new_comments = VorbisComments::new();
	new_comments.set_vendor(String::from("tagpatch"));
	for i in 0..300 {
		new_comments.push(format!("COMMENT{i}"), "Foo comment ".repeat(i % 20 + 1));
	}

	let written = write(&original, OggFormat::Vorbis, &new_comments);
	let pages = read_pages(&written);

	let packets = Packets::read_count(&mut Cursor::new(&written), 3).unwrap();
	assert_eq!(packets.get(0), Some(ident.as_slice()));
	assert_eq!(packets.get(2), Some(setup.as_slice()));

	for (idx, page) in pages.iter().enumerate() {
		assert_eq!(page.header().sequence_number, idx as u32);
		assert_eq!(page.header().stream_serial, SERIAL);
	}

	let read = read_comments(&mut Cursor::new(&written), OggFormat::Vorbis, ParseOptions::new()).unwrap();
	assert_eq!(read, new_comments);

	// Writing the same comments again is a no-op
	assert_eq!(write(&written, OggFormat::Vorbis, &new_comments), written);
}

#[test_log::test]
fn comment_packet_needs_signature() {
	let packet = comment_packet(b"OpusTags", "vendor", &[], false);
	let original = stream(&opus_head(), &[&packet]);

	let mut file = Cursor::new(original.clone());
	let result = write_comment_packet(
		&mut file,
		OggFormat::Opus,
		comment_packet(b"OpusTugs", "vendor", &[], false),
		WriteOptions::new(),
	);

	assert!(matches!(result.unwrap_err().kind(), ErrorKind::FileEncoding(_)));
	assert_eq!(file.into_inner(), original);
}
