use super::object::{CONTENT_DESCRIPTION_GUID, EXTENDED_CONTENT_DESCRIPTION_GUID, create_object};
use crate::error::Result;
use crate::macros::err;

use byteorder::{LittleEndian, WriteBytesExt};

// Descriptor value types
const UNICODE_STRING: u16 = 0;

/// A null terminated UTF-16LE string, or nothing if `value` is empty
fn utf16_string(value: &str) -> Vec<u8> {
	if value.is_empty() {
		return Vec::new();
	}

	let mut encoded = value
		.encode_utf16()
		.flat_map(u16::to_le_bytes)
		.collect::<Vec<u8>>();
	encoded.extend([0, 0]);
	encoded
}

fn string_len(encoded: &[u8]) -> Result<u16> {
	let Ok(len) = u16::try_from(encoded.len()) else {
		err!(TooMuchData);
	};

	Ok(len)
}

/// The fields of an ASF Content Description Object
///
/// Empty fields are written with a length of 0. If every field is empty, the object is removed.
#[derive(Default, Clone, Debug, PartialEq, Eq)]
pub struct ContentDescription {
	/// The title
	pub title: String,
	/// The author
	pub author: String,
	/// A copyright notice
	pub copyright: String,
	/// A description
	pub description: String,
	/// A rating
	pub rating: String,
}

impl ContentDescription {
	fn fields(&self) -> [&str; 5] {
		[
			&self.title,
			&self.author,
			&self.copyright,
			&self.description,
			&self.rating,
		]
	}

	/// Create the object, or nothing if every field is empty
	pub(super) fn to_object(&self) -> Result<Vec<u8>> {
		if self.fields().iter().all(|field| field.is_empty()) {
			log::debug!("Content Description is empty, removing it");
			return Ok(Vec::new());
		}

		let strings = self.fields().map(utf16_string);

		let mut body = Vec::new();
		for string in &strings {
			body.write_u16::<LittleEndian>(string_len(string)?)?;
		}

		for string in strings {
			body.extend(string);
		}

		create_object(CONTENT_DESCRIPTION_GUID, &body)
	}
}

/// An ASF Extended Content Description Object, restricted to string descriptors
///
/// # Examples
///
/// ```rust
/// use tagpatch::asf::ExtendedContentDescription;
///
/// let mut description = ExtendedContentDescription::new();
/// description.push(String::from("WM/AlbumTitle"), String::from("Foo album"));
/// assert_eq!(description.len(), 1);
/// ```
#[derive(Default, Clone, Debug, PartialEq, Eq)]
pub struct ExtendedContentDescription {
	descriptors: Vec<(String, String)>,
}

impl ExtendedContentDescription {
	/// Create an empty description
	pub fn new() -> Self {
		Self::default()
	}

	/// Append a descriptor
	///
	/// Descriptors with an empty name or value are not written.
	pub fn push(&mut self, name: String, value: String) {
		self.descriptors.push((name, value));
	}

	/// The number of descriptors
	pub fn len(&self) -> usize {
		self.descriptors.len()
	}

	/// Whether there are no descriptors
	pub fn is_empty(&self) -> bool {
		self.descriptors.is_empty()
	}

	/// Create the object, or nothing if there are no descriptors to write
	pub(super) fn to_object(&self) -> Result<Vec<u8>> {
		let mut body = Vec::new();
		body.write_u16::<LittleEndian>(0)?;

		let mut count = 0u16;
		for (name, value) in &self.descriptors {
			if name.is_empty() || value.is_empty() {
				continue;
			}

			let Some(new_count) = count.checked_add(1) else {
				err!(TooMuchData);
			};
			count = new_count;

			let name = utf16_string(name);
			body.write_u16::<LittleEndian>(string_len(&name)?)?;
			body.extend(name);

			let value = utf16_string(value);
			body.write_u16::<LittleEndian>(UNICODE_STRING)?;
			body.write_u16::<LittleEndian>(string_len(&value)?)?;
			body.extend(value);
		}

		if count == 0 {
			log::debug!("Extended Content Description is empty, removing it");
			return Ok(Vec::new());
		}

		body[..2].copy_from_slice(&count.to_le_bytes());
		create_object(EXTENDED_CONTENT_DESCRIPTION_GUID, &body)
	}
}
