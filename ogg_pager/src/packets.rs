use crate::Page;
use crate::error::{PageError, Result};
use crate::paginate::paginate;

use std::fmt::{Debug, Formatter};
use std::io::{Read, Seek, Write};

/// A container for packets in an OGG file
///
/// Packets are reassembled from whole pages. A packet that is still open after the last page
/// (its final lacing value was 255) is kept separately, see [`Packets::has_partial`].
#[derive(Default)]
pub struct Packets {
	content: Vec<u8>,
	packet_sizes: Vec<u64>,
	partial_size: u64,
	partial: bool,
}

impl Packets {
	/// Read as many packets as possible from a reader
	///
	/// # Errors
	///
	/// A page has a bad length
	///
	/// # Examples
	///
	/// ```rust
	/// use ogg_pager::{Packets, paginate};
	/// use std::io::Cursor;
	///
	/// # fn main() -> Result<(), ogg_pager::PageError> {
	/// let mut stream = Vec::new();
	/// for mut page in paginate([&b"first"[..], &b"second"[..]], 1, 0, 0)? {
	/// 	page.gen_crc();
	/// 	stream.extend(page.as_bytes());
	/// }
	///
	/// let packets = Packets::read(&mut Cursor::new(stream))?;
	/// assert_eq!(packets.len(), 2);
	/// # Ok(()) }
	/// ```
	pub fn read<R>(data: &mut R) -> Result<Self>
	where
		R: Read + Seek,
	{
		Self::read_count(data, -1)
	}

	/// Read a specific number of packets from a reader
	///
	/// A special value of `-1` will read as many packets as possible,
	/// in which case [`Packets::read`] should be used.
	///
	/// Pages are always consumed whole. Any packets that complete on the final page past `count`
	/// are discarded.
	///
	/// NOTE: Any value 0 or below will return an empty [`Packets`]
	///
	/// # Errors
	///
	/// * Unable to read the specified number of packets
	/// * A page has a bad length
	pub fn read_count<R>(data: &mut R, count: isize) -> Result<Self>
	where
		R: Read + Seek,
	{
		let mut packets = Self::default();

		if count == 0 || count < -1 {
			return Ok(packets);
		}

		loop {
			let Ok(page) = Page::read(data) else {
				break;
			};

			packets.push_page(&page);

			if count != -1 && packets.len() >= count as usize {
				break;
			}
		}

		if count != -1 {
			if packets.len() < count as usize {
				return Err(PageError::NotEnoughData);
			}

			packets.truncate(count as usize);
		}

		Ok(packets)
	}

	/// Reassemble packets from a list of pages
	///
	/// # Examples
	///
	/// ```rust
	/// use ogg_pager::{Packets, paginate};
	///
	/// # fn main() -> Result<(), ogg_pager::PageError> {
	/// let pages = paginate([&[1; 70_000][..], &[2; 10][..]], 1, 0, 0)?;
	/// assert_eq!(pages.len(), 2);
	///
	/// let packets = Packets::from_pages(&pages);
	/// assert_eq!(packets.len(), 2);
	/// assert_eq!(packets.get(1), Some(&[2; 10][..]));
	/// # Ok(()) }
	/// ```
	pub fn from_pages<'a, I>(pages: I) -> Self
	where
		I: IntoIterator<Item = &'a Page>,
	{
		let mut packets = Self::default();
		for page in pages {
			packets.push_page(page);
		}

		packets
	}

	fn push_page(&mut self, page: &Page) {
		for &segment in page.header().segments() {
			self.partial_size += u64::from(segment);
			self.partial = true;

			if segment < 255 {
				self.packet_sizes.push(self.partial_size);
				self.partial_size = 0;
				self.partial = false;
			}
		}

		self.content.extend_from_slice(page.content());
	}

	fn truncate(&mut self, count: usize) {
		if count >= self.packet_sizes.len() && !self.partial {
			return;
		}

		let kept_size: u64 = self.packet_sizes.iter().take(count).sum();
		self.content.truncate(kept_size as usize);
		self.packet_sizes.truncate(count);
		self.partial_size = 0;
		self.partial = false;
	}

	/// Whether the last page ended in the middle of a packet
	pub fn has_partial(&self) -> bool {
		self.partial
	}

	/// Returns the number of complete packets
	pub fn len(&self) -> usize {
		self.packet_sizes.len()
	}

	/// Returns true if there are no complete packets
	pub fn is_empty(&self) -> bool {
		self.packet_sizes.is_empty()
	}

	fn packet_start(&self, idx: usize) -> usize {
		self.packet_sizes[..idx].iter().sum::<u64>() as usize
	}

	/// Gets the packet at a specified index, returning its contents
	///
	/// NOTES:
	///
	/// * This is zero-indexed
	/// * If the index is out of bounds, it will return [`None`]
	pub fn get(&self, idx: usize) -> Option<&[u8]> {
		let packet_size = *self.packet_sizes.get(idx)? as usize;
		let start_pos = self.packet_start(idx);

		Some(&self.content[start_pos..start_pos + packet_size])
	}

	/// Sets the packet content, if it exists
	///
	/// NOTES:
	///
	/// * This is zero-indexed
	/// * If the index is out of bounds, it will return `false`
	///
	/// # Examples
	///
	/// ```rust
	/// use ogg_pager::{Packets, paginate};
	///
	/// # fn main() -> Result<(), ogg_pager::PageError> {
	/// let pages = paginate([&[1; 10][..], &[2; 10][..]], 1, 0, 0)?;
	/// let mut packets = Packets::from_pages(&pages);
	///
	/// let new_content = [0; 100];
	///
	/// assert!(packets.set(0, new_content));
	/// assert_eq!(packets.get(0), Some(new_content.as_slice()));
	/// assert_eq!(packets.get(1), Some(&[2; 10][..]));
	///
	/// // We cannot index out of bounds
	/// assert!(!packets.set(1000000, new_content));
	/// # Ok(()) }
	/// ```
	pub fn set(&mut self, idx: usize, content: impl Into<Vec<u8>>) -> bool {
		if idx >= self.packet_sizes.len() {
			return false;
		}

		let start_pos = self.packet_start(idx);

		let content = content.into();
		let content_size = content.len();

		let end_pos = start_pos + self.packet_sizes[idx] as usize;
		self.content.splice(start_pos..end_pos, content);

		self.packet_sizes[idx] = content_size as u64;

		true
	}

	/// Returns an iterator over the packets
	pub fn iter(&self) -> PacketsIter<'_> {
		<&Self as IntoIterator>::into_iter(self)
	}

	/// Convert the packets into a stream of pages
	///
	/// See [paginate()] for more information.
	///
	/// # Errors
	///
	/// See [`paginate()`]
	pub fn paginate(&self, stream_serial: u32, abgp: u64, flags: u8) -> Result<Vec<Page>> {
		paginate(self.iter(), stream_serial, abgp, flags)
	}

	/// Write packets to a writer
	///
	/// This will paginate and write all of the packets to a writer, returning the number of
	/// pages written.
	///
	/// # Errors
	///
	/// * Unable to write, see [`std::io::Error`]
	pub fn write_to<W>(
		&self,
		writer: &mut W,
		stream_serial: u32,
		abgp: u64,
		flags: u8,
	) -> Result<usize>
	where
		W: Write,
	{
		let paginated = self.paginate(stream_serial, abgp, flags)?;
		let num_pages = paginated.len();

		for mut page in paginated {
			page.gen_crc();
			writer.write_all(&page.as_bytes())?;
		}

		Ok(num_pages)
	}
}

/// An iterator over packets
///
/// This is created by calling `into_iter` on [`Packets`]
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct PacketsIter<'a> {
	content: &'a [u8],
	packet_sizes: &'a [u64],
}

impl<'a> Iterator for PacketsIter<'a> {
	type Item = &'a [u8];

	fn next(&mut self) -> Option<Self::Item> {
		let (&packet_size, remaining_sizes) = self.packet_sizes.split_first()?;
		self.packet_sizes = remaining_sizes;

		let (ret, remaining) = self.content.split_at(packet_size as usize);
		self.content = remaining;

		Some(ret)
	}
}

impl<'a> IntoIterator for &'a Packets {
	type Item = &'a [u8];
	type IntoIter = PacketsIter<'a>;

	fn into_iter(self) -> Self::IntoIter {
		PacketsIter {
			content: &self.content,
			packet_sizes: &self.packet_sizes,
		}
	}
}

impl Debug for Packets {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Packets")
			.field("total_bytes", &self.content.len())
			.field("count", &self.packet_sizes.len())
			.field("partial", &self.partial)
			.finish()
	}
}
