use crate::util::{id3v2, rewrite, rewrite_err};

use tagpatch::dsf::{DsfAdapter, DsfUpdate};
use tagpatch::error::ErrorKind;

const AUDIO_END: u64 = 28 + 52 + 12 + 4096;

fn dsf(tag: &[u8], pointer: u64) -> Vec<u8> {
	let mut file = b"DSD ".to_vec();
	file.extend(28u64.to_le_bytes());
	file.extend((AUDIO_END + tag.len() as u64).to_le_bytes());
	file.extend(pointer.to_le_bytes());

	file.extend(b"fmt ");
	file.extend(52u64.to_le_bytes());
	file.extend([0x01; 40]);

	file.extend(b"data");
	file.extend(4108u64.to_le_bytes());
	file.extend([0x69; 4096]);

	file.extend(tag);
	file
}

fn header_fields(file: &[u8]) -> (u64, u64) {
	let file_size = u64::from_le_bytes(file[12..20].try_into().unwrap());
	let pointer = u64::from_le_bytes(file[20..28].try_into().unwrap());

	(file_size, pointer)
}

#[test_log::test]
fn pointer_tracks_tag() {
	let original = dsf(&[], 0);

	let tag = id3v2(500);
	let update = DsfUpdate {
		id3v2: Some(tag.clone()),
	};

	let tagged = rewrite::<DsfAdapter>(&original, &update);
	assert_eq!(tagged, dsf(&tag, AUDIO_END));
	assert_eq!(header_fields(&tagged), (tagged.len() as u64, AUDIO_END));

	// Shrink
	let tag = id3v2(20);
	let update = DsfUpdate {
		id3v2: Some(tag.clone()),
	};

	let shrunk = rewrite::<DsfAdapter>(&tagged, &update);
	assert_eq!(shrunk, dsf(&tag, AUDIO_END));

	// And remove
	let update = DsfUpdate {
		id3v2: Some(Vec::new()),
	};

	let removed = rewrite::<DsfAdapter>(&shrunk, &update);
	assert_eq!(removed, original);
	assert_eq!(header_fields(&removed), (AUDIO_END, 0));
}

#[test_log::test]
fn no_op() {
	let original = dsf(&id3v2(64), AUDIO_END);
	assert_eq!(rewrite::<DsfAdapter>(&original, &DsfUpdate::default()), original);
}

#[test_log::test]
fn pointer_into_audio() {
	let original = dsf(&id3v2(64), AUDIO_END - 100);

	let update = DsfUpdate {
		id3v2: Some(Vec::new()),
	};

	let err = rewrite_err::<DsfAdapter>(&original, &update);
	assert!(matches!(err.kind(), ErrorKind::FileDecoding(_)));
}
