use tagpatch::config::{CommitStrategy, ParseOptions, ParsingMode, WriteOptions};
use tagpatch::error::TagPatchError;
use tagpatch::rewrite::{FormatAdapter, write_with};

use std::fs::File;
use std::io::{Cursor, Read as _, Seek as _, Write as _};

/// Create a new temporary file holding `content`
pub fn temp_file(content: &[u8]) -> File {
	let mut file = tempfile::tempfile().unwrap();
	file.write_all(content).unwrap();
	file.rewind().unwrap();

	file
}

/// Read the entire contents of `file` from the start
pub fn read_file(file: &mut File) -> Vec<u8> {
	let mut content = Vec::new();
	file.rewind().unwrap();
	file.read_to_end(&mut content).unwrap();

	content
}

fn strict() -> ParseOptions {
	ParseOptions::new().parsing_mode(ParsingMode::Strict)
}

/// Rewrite `original` with a fresh `A`, through every commit strategy and a real file
///
/// Every run must produce the same bytes, and the reported length must match the real one.
pub fn rewrite<A>(original: &[u8], update: &A::Update) -> Vec<u8>
where
	A: FormatAdapter + Default,
{
	let mut outputs = Vec::new();
	for strategy in [CommitStrategy::Buffered, CommitStrategy::InPlace] {
		let mut file = Cursor::new(original.to_vec());
		let summary = write_with(
			&mut file,
			&mut A::default(),
			update,
			strict(),
			WriteOptions::new().commit_strategy(strategy),
		)
		.unwrap();

		let output = file.into_inner();
		assert_eq!(summary.original_len(), original.len() as u64);
		assert_eq!(summary.final_len(), output.len() as u64);
		assert_eq!(
			output.len() as i64,
			original.len() as i64 + summary.total_delta()
		);

		outputs.push(output);
	}

	let mut file = temp_file(original);
	write_with(
		&mut file,
		&mut A::default(),
		update,
		strict(),
		WriteOptions::new().commit_strategy(CommitStrategy::InPlace),
	)
	.unwrap();
	outputs.push(read_file(&mut file));

	let output = outputs.pop().unwrap();
	for other in outputs {
		assert_eq!(other, output);
	}

	output
}

/// Verify that a rewrite of `original` fails, leaving it untouched with every commit strategy
pub fn rewrite_err<A>(original: &[u8], update: &A::Update) -> TagPatchError
where
	A: FormatAdapter + Default,
{
	let mut errors = Vec::new();
	for strategy in [CommitStrategy::Buffered, CommitStrategy::InPlace] {
		let mut file = Cursor::new(original.to_vec());
		let result = write_with(
			&mut file,
			&mut A::default(),
			update,
			strict(),
			WriteOptions::new().commit_strategy(strategy),
		);

		assert_eq!(file.into_inner(), original);
		errors.push(result.unwrap_err());
	}

	errors.pop().unwrap()
}

/// Build a RIFF/FORM style chunk, padded to an even length
pub fn chunk_le(fourcc: &[u8; 4], content: &[u8]) -> Vec<u8> {
	let mut chunk = fourcc.to_vec();
	chunk.extend((content.len() as u32).to_le_bytes());
	chunk.extend(content);
	if content.len() % 2 != 0 {
		chunk.push(0);
	}

	chunk
}

/// Same as [`chunk_le`], with a big endian size
pub fn chunk_be(fourcc: &[u8; 4], content: &[u8]) -> Vec<u8> {
	let mut chunk = chunk_le(fourcc, content);
	chunk[4..8].copy_from_slice(&(content.len() as u32).to_be_bytes());

	chunk
}

/// A stand in for an ID3v2 tag
pub fn id3v2(len: usize) -> Vec<u8> {
	let mut tag = b"ID3\x04\0\0".to_vec();
	tag.extend([0, 0, 0, 0]);
	tag.resize(len.max(10), 0x33);

	let size = (tag.len() - 10) as u32;
	tag[6..10].copy_from_slice(&[
		((size >> 21) & 0x7F) as u8,
		((size >> 14) & 0x7F) as u8,
		((size >> 7) & 0x7F) as u8,
		(size & 0x7F) as u8,
	]);

	tag
}
