use crate::util::{rewrite, rewrite_err};

use tagpatch::asf::{
	AsfAdapter, AsfUpdate, ContentDescription, ExtendedContentDescription, HEADER_OBJECT_GUID,
};
use tagpatch::error::ErrorKind;

const CONTENT_DESCRIPTION: [u8; 16] = [
	0x33, 0x26, 0xB2, 0x75, 0x8E, 0x66, 0xCF, 0x11, 0xA6, 0xD9, 0x00, 0xAA, 0x00, 0x62, 0xCE, 0x6C,
];
const EXTENDED_CONTENT_DESCRIPTION: [u8; 16] = [
	0x40, 0xA4, 0xD0, 0xD2, 0x07, 0xE3, 0xD2, 0x11, 0x97, 0xF0, 0x00, 0xA0, 0xC9, 0x5E, 0xA8, 0x50,
];
const FILE_PROPERTIES: [u8; 16] = [
	0xA1, 0xDC, 0xAB, 0x8C, 0x47, 0xA9, 0xCF, 0x11, 0x8E, 0xE4, 0x00, 0xC0, 0x0C, 0x20, 0x53, 0x65,
];

fn object(guid: [u8; 16], body: &[u8]) -> Vec<u8> {
	let mut object = guid.to_vec();
	object.extend((body.len() as u64 + 24).to_le_bytes());
	object.extend(body);
	object
}

fn utf16(value: &str) -> Vec<u8> {
	let mut encoded = value
		.encode_utf16()
		.flat_map(u16::to_le_bytes)
		.collect::<Vec<u8>>();
	encoded.extend([0, 0]);
	encoded
}

fn extended_description(name: &str, value: &str) -> Vec<u8> {
	let (name, value) = (utf16(name), utf16(value));

	let mut body = 1u16.to_le_bytes().to_vec();
	body.extend((name.len() as u16).to_le_bytes());
	body.extend(name);
	body.extend(0u16.to_le_bytes());
	body.extend((value.len() as u16).to_le_bytes());
	body.extend(value);

	object(EXTENDED_CONTENT_DESCRIPTION, &body)
}

fn asf(children: &[Vec<u8>]) -> Vec<u8> {
	let body = children.concat();

	let mut file = HEADER_OBJECT_GUID.to_vec();
	file.extend((body.len() as u64 + 30).to_le_bytes());
	file.extend((children.len() as u32).to_le_bytes());
	file.extend([1, 2]);
	file.extend(body);

	// Data Object stand in
	file.extend([0xDD; 256]);

	let file_len = file.len() as u64;
	if let Some(pos) = file.windows(16).position(|window| window == FILE_PROPERTIES) {
		file[pos + 40..pos + 48].copy_from_slice(&file_len.to_le_bytes());
	}

	file
}

struct Header {
	size: u64,
	object_count: u32,
	children: Vec<[u8; 16]>,
	file_size: u64,
}

fn read_header(file: &[u8]) -> Header {
	let size = u64::from_le_bytes(file[16..24].try_into().unwrap());
	let object_count = u32::from_le_bytes(file[24..28].try_into().unwrap());

	let mut children = Vec::new();
	let mut file_size = 0;

	let mut pos = 30;
	while pos < size as usize {
		let guid: [u8; 16] = file[pos..pos + 16].try_into().unwrap();
		let len = u64::from_le_bytes(file[pos + 16..pos + 24].try_into().unwrap()) as usize;

		if guid == FILE_PROPERTIES {
			file_size = u64::from_le_bytes(file[pos + 40..pos + 48].try_into().unwrap());
		}

		children.push(guid);
		pos += len;
	}

	assert_eq!(pos as u64, size);
	Header {
		size,
		object_count,
		children,
		file_size,
	}
}

fn file_properties() -> Vec<u8> {
	object(FILE_PROPERTIES, &[0; 80])
}

#[test_log::test]
fn no_op() {
	let original = asf(&[file_properties(), extended_description("A", "B")]);
	assert_eq!(rewrite::<AsfAdapter>(&original, &AsfUpdate::default()), original);
}

#[test_log::test]
fn object_count_follows_objects() {
	let original = asf(&[file_properties(), extended_description("WM/Year", "2024")]);

	// One object created, one erased
	let update = AsfUpdate {
		content_description: Some(ContentDescription {
			title: String::from("Foo title"),
			..ContentDescription::default()
		}),
		extended_content_description: Some(ExtendedContentDescription::new()),
	};

	let written = rewrite::<AsfAdapter>(&original, &update);
	let header = read_header(&written);
	assert_eq!(header.object_count, 2);
	assert_eq!(header.children, [FILE_PROPERTIES, CONTENT_DESCRIPTION]);
	assert_eq!(header.file_size, written.len() as u64);
	assert_eq!(&written[header.size as usize..], &[0xDD; 256]);

	// Bring the extended description back
	let mut extended = ExtendedContentDescription::new();
	extended.push(String::from("WM/Year"), String::from("2024"));

	let update = AsfUpdate {
		content_description: Some(ContentDescription::default()),
		extended_content_description: Some(extended),
	};

	assert_eq!(rewrite::<AsfAdapter>(&written, &update), original);
}

#[test_log::test]
fn grow_description() {
	let original = asf(&[file_properties()]);

	let mut extended = ExtendedContentDescription::new();
	for i in 0..100 {
		extended.push(format!("Name {i}"), "Value".repeat(i));
	}

	let update = AsfUpdate {
		extended_content_description: Some(extended),
		..AsfUpdate::default()
	};

	let written = rewrite::<AsfAdapter>(&original, &update);
	let header = read_header(&written);
	assert_eq!(header.object_count, 2);
	assert_eq!(header.children, [FILE_PROPERTIES, EXTENDED_CONTENT_DESCRIPTION]);
	assert_eq!(header.file_size, written.len() as u64);
	assert_eq!(&written[header.size as usize..], &[0xDD; 256]);
}

#[test_log::test]
fn oversized_object() {
	let mut unknown = object([0x11; 16], &[0; 8]);
	unknown[16..24].copy_from_slice(&u64::MAX.to_le_bytes());

	let original = asf(&[file_properties(), unknown]);

	let err = rewrite_err::<AsfAdapter>(&original, &AsfUpdate::default());
	assert!(matches!(err.kind(), ErrorKind::FileDecoding(_)));
}
