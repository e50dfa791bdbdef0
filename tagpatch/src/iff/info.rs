use super::chunk::create_chunk;
use crate::error::Result;
use crate::macros::err;

use byteorder::LittleEndian;

/// A RIFF INFO LIST
///
/// ## Item storage
///
/// Items are stored in order, keyed by their 4 character identifier (such as `INAM`).
/// Keys must be made up of uppercase ASCII letters and digits.
///
/// # Examples
///
/// ```rust
/// use tagpatch::iff::RiffInfoList;
///
/// let mut info = RiffInfoList::new();
/// info.insert(String::from("INAM"), String::from("Foo title"));
/// info.insert(String::from("IART"), String::from("Bar artist"));
///
/// // Replaces the existing title
/// info.insert(String::from("INAM"), String::from("Baz title"));
/// assert_eq!(info.get("INAM"), Some("Baz title"));
///
/// // Not a valid key
/// info.insert(String::from("name"), String::from("Qux"));
/// assert_eq!(info.len(), 2);
/// ```
#[derive(Default, Clone, Debug, PartialEq, Eq)]
pub struct RiffInfoList {
	pub(crate) items: Vec<(String, String)>,
}

impl RiffInfoList {
	/// Create an empty list
	pub fn new() -> Self {
		Self::default()
	}

	/// Get an item by key
	pub fn get(&self, key: &str) -> Option<&str> {
		self.items
			.iter()
			.find(|(k, _)| k == key)
			.map(|(_, v)| v.as_str())
	}

	/// Insert an item
	///
	/// NOTE: This will do nothing if `key` is invalid
	///
	/// This will case-insensitively replace any item with the same key
	pub fn insert(&mut self, key: String, value: String) {
		if !verify_key(&key) {
			log::warn!("Ignoring RIFF INFO item with an invalid key: {key:?}");
			return;
		}

		self.items.retain(|(k, _)| !k.eq_ignore_ascii_case(&key));
		self.items.push((key, value))
	}

	/// The number of items
	pub fn len(&self) -> usize {
		self.items.len()
	}

	/// Whether the list has no items
	pub fn is_empty(&self) -> bool {
		self.items.is_empty()
	}

	/// Whether any item has a value, and would be written
	pub(crate) fn has_values(&self) -> bool {
		self.items.iter().any(|(_, v)| !v.is_empty())
	}

	/// Create the `LIST` chunk, or nothing if there are no items to write
	pub(crate) fn to_chunk(&self) -> Result<Vec<u8>> {
		let mut content = b"INFO".to_vec();

		for (k, v) in &self.items {
			if v.is_empty() {
				continue;
			}

			let val_b = v.as_bytes();
			// Account for null terminator
			let len = val_b.len() + 1;

			// Each value has to be null terminated and have an even length
			let terminator: &[u8] = if len % 2 == 0 { &[0] } else { &[0, 0] };

			let Ok(len) = u32::try_from(len) else {
				err!(TooMuchData);
			};

			content.extend(k.as_bytes());
			content.extend(len.to_le_bytes());
			content.extend(val_b);
			content.extend(terminator);
		}

		if content.len() == 4 {
			log::debug!("No items to write, removing RIFF INFO list");
			return Ok(Vec::new());
		}

		log::debug!("Created RIFF INFO list, size: {} bytes", content.len());
		create_chunk::<LittleEndian>(*b"LIST", &content)
	}
}

fn verify_key(key: &str) -> bool {
	key.len() == 4
		&& key
			.chars()
			.all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
}
