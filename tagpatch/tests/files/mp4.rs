use crate::util::{rewrite, rewrite_err};

use tagpatch::error::ErrorKind;
use tagpatch::mp4::{Mp4Adapter, Mp4Update};

const MDAT_CONTENT_LEN: usize = 64;

fn atom(fourcc: &[u8; 4], content: &[u8]) -> Vec<u8> {
	let mut atom = (content.len() as u32 + 8).to_be_bytes().to_vec();
	atom.extend(fourcc);
	atom.extend(content);
	atom
}

fn nested(path: &[&[u8; 4]], content: &[u8]) -> Vec<u8> {
	path.iter()
		.rev()
		.fold(content.to_vec(), |content, fourcc| atom(fourcc, &content))
}

fn chunk_offsets(co64: bool, offsets: &[u64]) -> Vec<u8> {
	let mut table = vec![0; 4];
	table.extend((offsets.len() as u32).to_be_bytes());
	for offset in offsets {
		if co64 {
			table.extend(offset.to_be_bytes());
		} else {
			table.extend((*offset as u32).to_be_bytes());
		}
	}

	let fourcc = if co64 { b"co64" } else { b"stco" };
	nested(&[b"trak", b"mdia", b"minf", b"stbl", fourcc], &table)
}

fn meta(ilst: Option<&[u8]>) -> Vec<u8> {
	let mut hdlr = vec![0; 8];
	hdlr.extend(b"mdirappl");
	hdlr.extend([0; 9]);

	let mut content = vec![0; 4];
	content.extend(atom(b"hdlr", &hdlr));
	if let Some(items) = ilst {
		content.extend(atom(b"ilst", items));
	}

	atom(b"meta", &content)
}

fn title(title: &str) -> Vec<u8> {
	let mut data = vec![0, 0, 0, 1, 0, 0, 0, 0];
	data.extend(title.as_bytes());

	atom(b"\xa9nam", &atom(b"data", &data))
}

/// An `ftyp`, `moov`, `mdat` file with one `stco` and one `co64` table pointing into the `mdat`
fn mp4(ilst: Option<&[u8]>) -> Vec<u8> {
	let ftyp = atom(b"ftyp", b"M4A \0\0\0\0M4A mp42isom");

	let moov = |mdat_content_start: u64| {
		let mut children = chunk_offsets(false, &[mdat_content_start]);
		children.extend(chunk_offsets(true, &[
			mdat_content_start + 16,
			mdat_content_start + 32,
		]));
		children.extend(atom(b"udta", &meta(ilst)));

		atom(b"moov", &children)
	};

	// The table entries are fixed width, the layout doesn't depend on their values
	let mdat_content_start = (ftyp.len() + moov(0).len() + 8) as u64;

	let mut file = ftyp;
	file.extend(moov(mdat_content_start));
	file.extend(atom(b"mdat", &[0xAB; MDAT_CONTENT_LEN]));
	file
}

#[test_log::test]
fn no_op() {
	let original = mp4(Some(&title("Foo title")));
	assert_eq!(rewrite::<Mp4Adapter>(&original, &Mp4Update::default()), original);
}

#[test_log::test]
fn grow_and_shrink() {
	let original = mp4(Some(&title("Foo")));

	let mut items = title("A much longer title than before");
	items.extend(atom(b"\xa9ART", &atom(b"data", b"\0\0\0\x01\0\0\0\0Bar artist")));

	let update = Mp4Update {
		ilst: Some(items.clone()),
	};
	let grown = rewrite::<Mp4Adapter>(&original, &update);
	assert_eq!(grown, mp4(Some(&items)));

	let update = Mp4Update {
		ilst: Some(title("Foo")),
	};
	assert_eq!(rewrite::<Mp4Adapter>(&grown, &update), original);
}

#[test_log::test]
fn remove_ilst() {
	let original = mp4(Some(&title("Foo title")));

	let update = Mp4Update {
		ilst: Some(Vec::new()),
	};

	// The (now empty) `meta` atom stays
	let removed = rewrite::<Mp4Adapter>(&original, &update);
	assert_eq!(removed, mp4(None));

	// Then add it back, under the existing `meta`
	let update = Mp4Update {
		ilst: Some(title("Foo title")),
	};
	assert_eq!(rewrite::<Mp4Adapter>(&removed, &update), original);
}

#[test_log::test]
fn not_mp4() {
	let mut original = mp4(None);
	original[4..8].copy_from_slice(b"free");

	let err = rewrite_err::<Mp4Adapter>(&original, &Mp4Update::default());
	assert!(matches!(err.kind(), ErrorKind::UnknownFormat));
}
