use crate::config::{ParseOptions, ParsingMode};
use crate::error::Result;
use crate::macros::{decode_err, err, parse_mode_choice, try_vec};

use std::borrow::Cow;
use std::io::{Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

/// A set of Vorbis comments, used by OGG streams and FLAC's `VORBIS_COMMENT` block
///
/// This is only a container for the encoded items, no meaning is attached to any key.
///
/// # Examples
///
/// ```rust
/// use tagpatch::ogg::VorbisComments;
///
/// let mut comments = VorbisComments::new();
/// comments.push(String::from("TITLE"), String::from("Foo title"));
/// comments.push(String::from("ARTIST"), String::from("Bar artist"));
///
/// // Invalid keys are ignored
/// comments.push(String::from("NOT=VALID"), String::from("Baz"));
/// assert_eq!(comments.items().count(), 2);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VorbisComments {
	pub(crate) vendor: Option<String>,
	pub(crate) items: Vec<(String, String)>,
}

impl VorbisComments {
	/// Create an empty set of comments
	///
	/// With no vendor set, writing will keep the vendor string already in the file.
	pub fn new() -> Self {
		Self::default()
	}

	/// The vendor string, if one was set
	pub fn vendor(&self) -> Option<&str> {
		self.vendor.as_deref()
	}

	/// Replace the vendor string
	pub fn set_vendor(&mut self, vendor: String) {
		self.vendor = Some(vendor);
	}

	/// Appends an item
	///
	/// NOTE: This will do nothing if the key is invalid. This specification is available [here](https://xiph.org/vorbis/doc/v-comment.html#vectorformat).
	pub fn push(&mut self, key: String, value: String) {
		if !verify_key(&key) {
			log::warn!("Ignoring comment with an invalid key: {key:?}");
			return;
		}

		self.items.push((key, value))
	}

	/// Iterate the items in order
	pub fn items(&self) -> impl Iterator<Item = (&str, &str)> {
		self.items.iter().map(|(k, v)| (k.as_str(), v.as_str()))
	}

	/// Get the first value of `key`, ignoring case
	pub fn get(&self, key: &str) -> Option<&str> {
		self.items
			.iter()
			.find(|(k, _)| k.eq_ignore_ascii_case(key))
			.map(|(_, v)| v.as_str())
	}

	/// Whether there are no items
	pub fn is_empty(&self) -> bool {
		self.items.is_empty()
	}

	/// Parse a comment block, with any signature already stripped
	///
	/// # Errors
	///
	/// * The block is too short for its declared lengths
	/// * [`ParsingMode::Strict`]: The vendor string or an item is not valid UTF-8, or an item has no separator
	pub fn parse(mut data: &[u8], parse_options: ParseOptions) -> Result<Self> {
		let parse_mode = parse_options.parsing_mode;

		let vendor_len = data.read_u32::<LittleEndian>()?;
		if vendor_len as usize > data.len() {
			err!(SizeMismatch);
		}

		let mut vendor_bytes = try_vec![0; vendor_len as usize];
		data.read_exact(&mut vendor_bytes)?;

		let vendor = match String::from_utf8(vendor_bytes) {
			Ok(vendor) => vendor,
			Err(e) => {
				if parse_mode == ParsingMode::Strict {
					return Err(e.into());
				}

				log::warn!("Vendor string is not valid UTF-8, replacing invalid characters");
				String::from_utf8_lossy(e.as_bytes()).into_owned()
			},
		};

		let number_of_items = data.read_u32::<LittleEndian>()?;
		// Every item needs at least its 4 byte length
		if number_of_items as usize > data.len() >> 2 {
			err!(TooMuchData);
		}

		let mut comments = Self {
			vendor: Some(vendor),
			items: Vec::with_capacity(number_of_items as usize),
		};

		for _ in 0..number_of_items {
			let comment_len = data.read_u32::<LittleEndian>()?;
			if comment_len as usize > data.len() {
				err!(SizeMismatch);
			}

			let (comment, remaining) = data.split_at(comment_len as usize);
			data = remaining;

			let Some(separator) = comment.iter().position(|b| *b == b'=') else {
				parse_mode_choice!(
					parse_mode,
					STRICT: decode_err!(@BAIL "Vorbis comments: Item missing '='"),
					DEFAULT: {
						log::warn!("Skipping Vorbis comment without a separator");
						continue;
					}
				);
			};

			let (key, value) = (&comment[..separator], &comment[separator + 1..]);
			match (std::str::from_utf8(key), std::str::from_utf8(value)) {
				(Ok(key), Ok(value)) if verify_key(key) => {
					comments.items.push((key.to_owned(), value.to_owned()));
				},
				_ => {
					parse_mode_choice!(
						parse_mode,
						STRICT: decode_err!(@BAIL "Vorbis comments: Encountered an invalid item"),
						DEFAULT: log::warn!("Skipping invalid Vorbis comment")
					);
				},
			}
		}

		Ok(comments)
	}

	/// Encode the comments, with `signature` in front and an optional framing bit
	pub(crate) fn to_packet(
		&self,
		vendor: &str,
		signature: &[u8],
		add_framing_bit: bool,
	) -> Result<Vec<u8>> {
		let mut packet = Vec::new();
		packet.write_all(signature)?;

		let Ok(vendor_len) = u32::try_from(vendor.len()) else {
			err!(TooMuchData);
		};
		packet.write_u32::<LittleEndian>(vendor_len)?;
		packet.write_all(vendor.as_bytes())?;

		let count_pos = packet.len();
		packet.write_u32::<LittleEndian>(0)?;

		let mut count = 0u32;
		for (key, value) in &self.items {
			if value.is_empty() {
				continue;
			}

			let Ok(bytes_len) = u32::try_from(key.len() + 1 + value.len()) else {
				err!(TooMuchData);
			};

			count += 1;

			packet.write_u32::<LittleEndian>(bytes_len)?;
			packet.write_all(key.as_bytes())?;
			packet.push(b'=');
			packet.write_all(value.as_bytes())?;
		}

		packet[count_pos..count_pos + 4].copy_from_slice(&count.to_le_bytes());

		if add_framing_bit {
			// OGG Vorbis makes use of a "framing bit" to
			// separate the header packets
			//
			// https://xiph.org/vorbis/doc/Vorbis_I_spec.html#x1-590004
			packet.push(1);
		}

		Ok(packet)
	}
}

/// The vendor string of an encoded comment block, without its signature
pub(crate) fn existing_vendor(mut comment_block: &[u8]) -> Result<Cow<'static, str>> {
	let vendor_len = comment_block.read_u32::<LittleEndian>()? as usize;
	if vendor_len > comment_block.len() {
		err!(SizeMismatch);
	}

	match std::str::from_utf8(&comment_block[..vendor_len]) {
		Ok(vendor) => Ok(Cow::Owned(vendor.to_owned())),
		Err(_) => {
			log::warn!("Vendor string is not valid UTF-8, not re-using");
			Ok(Cow::Borrowed(""))
		},
	}
}

fn verify_key(key: &str) -> bool {
	if key.is_empty() {
		return false;
	}

	key.bytes()
		.all(|byte| (0x20..=0x7D).contains(&byte) && byte != 0x3D)
}
