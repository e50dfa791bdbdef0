//! A simple OGG page reader and re-paginator

mod crc;
mod error;
mod header;
mod packets;
mod paginate;

use std::io::{Read, Seek};

pub use crc::crc32;
pub use error::{PageError, Result};
pub use header::{PAGE_HEADER_SIZE, PageHeader};
pub use packets::{Packets, PacketsIter};
pub use paginate::paginate;

/// The packet on this page continues a packet from the previous page
pub const CONTINUED_PACKET: u8 = 0x01;
/// The page is the first page of the logical bitstream
pub const CONTAINS_FIRST_PAGE_OF_BITSTREAM: u8 = 0x02;
/// The page is the last page of the logical bitstream
pub const CONTAINS_LAST_PAGE_OF_BITSTREAM: u8 = 0x04;

/// The maximum number of segments a page can hold
pub const MAX_SEGMENT_COUNT: usize = 255;
/// The maximum page content size
pub const MAX_CONTENT_SIZE: usize = MAX_SEGMENT_COUNT * 255;

/// An OGG page
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Page {
	content: Vec<u8>,
	header: PageHeader,
	/// The position in the stream the page ended
	pub end: u64,
}

impl Page {
	/// Create a new `Page` holding a single, complete packet
	///
	/// This will have the following defaults:
	///
	/// * `checksum` = 0
	/// * `start` = 0
	/// * `end` = total page size
	///
	/// # Errors
	///
	/// See [`segment_table`]
	///
	/// # Example
	///
	/// ```rust
	/// use ogg_pager::{CONTAINS_FIRST_PAGE_OF_BITSTREAM, Page};
	///
	/// # fn main() -> ogg_pager::Result<()> {
	/// let ident_header_packet = b"\x01vorbis".to_vec();
	/// let stream_serial_number = 2784419176;
	///
	/// let mut page = Page::new(
	/// 	CONTAINS_FIRST_PAGE_OF_BITSTREAM,
	/// 	0,
	/// 	stream_serial_number,
	/// 	0,
	/// 	ident_header_packet,
	/// )?;
	/// page.gen_crc();
	/// # Ok(()) }
	/// ```
	pub fn new(
		header_type_flag: u8,
		abgp: u64,
		stream_serial: u32,
		sequence_number: u32,
		content: Vec<u8>,
	) -> Result<Self> {
		let mut header = PageHeader::new(header_type_flag, abgp, stream_serial, sequence_number);
		header.segments = segment_table(content.len())?;

		let end = (header.len() + content.len()) as u64;

		Ok(Self {
			content,
			header,
			end,
		})
	}

	/// Convert the Page to Vec<u8> for writing
	///
	/// NOTE: This will write the checksum as is. It is likely [Page::gen_crc] will have
	/// to be used prior.
	pub fn as_bytes(&self) -> Vec<u8> {
		let mut bytes = self.header.as_bytes();
		bytes.extend(&self.content);

		bytes
	}

	/// Attempts to get a Page from a reader
	///
	/// # Errors
	///
	/// * [`std::io::Error`]
	/// * [`PageError`]
	pub fn read<V>(data: &mut V) -> Result<Self>
	where
		V: Read + Seek,
	{
		let header = PageHeader::read(data)?;

		let mut content = vec![0; header.content_size()];
		data.read_exact(&mut content)?;

		let end = data.stream_position()?;

		Ok(Page {
			content,
			header,
			end,
		})
	}

	/// Generates the CRC checksum of the page
	///
	/// The checksum covers the entire page, with the checksum field zeroed.
	pub fn gen_crc(&mut self) {
		self.header.checksum = 0;
		self.header.checksum = crc::crc32(&self.as_bytes());
	}

	/// Verify the stored checksum against the page content
	///
	/// # Errors
	///
	/// [`PageError::ChecksumMismatch`]
	pub fn verify_crc(&self) -> Result<()> {
		let mut copy = self.header.clone();
		copy.checksum = 0;

		let mut bytes = copy.as_bytes();
		bytes.extend(&self.content);

		let computed = crc::crc32(&bytes);
		if computed != self.header.checksum {
			return Err(PageError::ChecksumMismatch {
				stored: self.header.checksum,
				computed,
			});
		}

		Ok(())
	}

	/// Returns a reference to the page's header
	pub fn header(&self) -> &PageHeader {
		&self.header
	}

	/// Returns a mutable reference to the page's header
	pub fn header_mut(&mut self) -> &mut PageHeader {
		&mut self.header
	}

	/// Returns the page's content
	pub fn content(&self) -> &[u8] {
		self.content.as_slice()
	}

	/// Consumes the page and returns its content
	pub fn take_content(self) -> Vec<u8> {
		self.content
	}

	/// The total encoded size of the page
	pub fn len(&self) -> usize {
		self.header.len() + self.content.len()
	}
}

/// Creates a segment table for a single packet of `length` bytes
///
/// The table always ends with a lacing value < 255, which terminates the packet.
///
/// # Errors
///
/// `length` > [`MAX_CONTENT_SIZE`] - 1, since the terminating lacing value wouldn't fit
pub fn segment_table(length: usize) -> Result<Vec<u8>> {
	let needed = (length / 255) + 1;

	if needed > MAX_SEGMENT_COUNT {
		return Err(PageError::TooMuchData);
	}

	let mut segments = vec![255; needed - 1];
	segments.push((length % 255) as u8);

	Ok(segments)
}
